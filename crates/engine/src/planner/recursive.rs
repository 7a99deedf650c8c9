// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Recursive common table expressions.
//!
//! The fixed point is evaluated depth first:
//!
//! ```text
//! table spool
//! └─ project (drop depth)
//!    └─ stack spool ◄──────────────────────────────┐
//!       └─ concatenation                           │
//!          ├─ compute depth = 0                    │
//!          │  └─ anchor                            │
//!          └─ assert depth <= max recursion        │
//!             └─ project                           │
//!                └─ compute columns, depth + 1     │
//!                   └─ filter                      │
//!                      └─ nested loop              │
//!                         ├─ stack consumer ───────┘
//!                         └─ adaptive index spool
//!                            └─ source
//! ```
//!
//! Every row the stack spool emits is pushed onto its work table; the
//! consumer pops the most recent one and the recursive member expands it.
//! The whole union is cached by an eager table spool so every reference
//! to the CTE replays the same rows.

use quarry_core::{ColumnDef, Expression, JoinType, Schema, expression::BinaryOp};
use quarry_type::{
	error::diagnostic::{
		plan::{
			recursive_aggregate, recursive_distinct, recursive_missing_reference, recursive_multiple_references,
			recursive_order_by, recursive_outer_join, recursive_top, recursive_type_mismatch,
		},
		runtime::max_recursion_message,
	},
	return_error,
};
use tracing::debug;

use crate::vm::volcano::{
	build::{ComputedColumn, ProjectColumn},
	query::{ExecutionPlan, NodeId},
	spool::adaptive::AdaptiveSpoolPolicy,
};

/// Error number raised once the recursion limit is exceeded.
pub const MAX_RECURSION_EXCEEDED: u32 = 530;

const DEPTH: &str = "$depth";
const NEXT_DEPTH: &str = "$next_depth";

/// Source the recursive member joins the previous level with.
///
/// `seek_input` returns the source rows for the key bound to `parameter`;
/// `full_input` returns all of them. Each previous level row binds its
/// `cte_column` to `parameter` and is joined with the rows whose
/// `source_column` equals it.
#[derive(Clone, Debug)]
pub struct RecursiveJoin {
	pub seek_input: NodeId,
	pub full_input: NodeId,
	pub join_type: JoinType,
	pub cte_column: String,
	pub source_column: String,
	pub parameter: String,
}

/// The evaluated CTE. Each reference to its name reads the cached rows
/// through its own consumer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecursiveCte {
	pub spool: NodeId,
}

impl RecursiveCte {
	pub fn reference(&self, plan: &mut ExecutionPlan) -> crate::Result<NodeId> {
		plan.spool_consumer(self.spool)
	}
}

/// Assembles a recursive CTE from its anchor and a description of its
/// recursive member. The member's columns are expressions over the CTE
/// columns (qualified with the CTE name) followed by the joined source's
/// columns.
#[derive(Clone, Debug)]
pub struct RecursiveCteBuilder {
	name: String,
	anchor: NodeId,
	columns: Vec<Expression>,
	join: Option<RecursiveJoin>,
	filter: Option<Expression>,
	self_references: usize,
	top: bool,
	distinct: bool,
	group_by: bool,
	order_by: bool,
	max_recursion: u32,
	policy: AdaptiveSpoolPolicy,
}

impl RecursiveCteBuilder {
	pub fn new(name: impl Into<String>, anchor: NodeId) -> Self {
		Self {
			name: name.into(),
			anchor,
			columns: vec![],
			join: None,
			filter: None,
			self_references: 1,
			top: false,
			distinct: false,
			group_by: false,
			order_by: false,
			max_recursion: 100,
			policy: AdaptiveSpoolPolicy::default(),
		}
	}

	/// Select list of the recursive member, matched to the anchor's columns
	/// by position.
	pub fn columns(mut self, columns: Vec<Expression>) -> Self {
		self.columns = columns;
		self
	}

	pub fn join(mut self, join: RecursiveJoin) -> Self {
		self.join = Some(join);
		self
	}

	pub fn filter(mut self, predicate: Expression) -> Self {
		self.filter = Some(predicate);
		self
	}

	/// Number of times the recursive member names the CTE.
	pub fn self_references(mut self, count: usize) -> Self {
		self.self_references = count;
		self
	}

	pub fn with_top(mut self) -> Self {
		self.top = true;
		self
	}

	pub fn with_distinct(mut self) -> Self {
		self.distinct = true;
		self
	}

	pub fn with_group_by(mut self) -> Self {
		self.group_by = true;
		self
	}

	pub fn with_order_by(mut self) -> Self {
		self.order_by = true;
		self
	}

	/// `OPTION (MAXRECURSION n)`; 0 lifts the limit.
	pub fn max_recursion(mut self, max: u32) -> Self {
		self.max_recursion = max;
		self
	}

	pub fn policy(mut self, policy: AdaptiveSpoolPolicy) -> Self {
		self.policy = policy;
		self
	}

	fn validate(&self) -> crate::Result<()> {
		let name = self.name.as_str();
		match self.self_references {
			0 => return_error!(recursive_missing_reference(name)),
			1 => {}
			_ => return_error!(recursive_multiple_references(name)),
		}
		if self.top {
			return_error!(recursive_top(name));
		}
		if self.distinct {
			return_error!(recursive_distinct(name));
		}
		if self.group_by || self.columns.iter().any(Expression::contains_aggregate) {
			return_error!(recursive_aggregate(name));
		}
		if let Some(join) = &self.join {
			if join.join_type != JoinType::Inner {
				return_error!(recursive_outer_join(name));
			}
		}
		if self.order_by {
			return_error!(recursive_order_by());
		}
		Ok(())
	}

	pub fn build(self, plan: &mut ExecutionPlan) -> crate::Result<RecursiveCte> {
		self.validate()?;
		let anchor_schema = plan.schema(self.anchor)?.clone();

		let anchor = plan.compute(self.anchor, vec![ComputedColumn::new(DEPTH, Expression::constant(0))])?;

		let mut columns: Vec<ColumnDef> = anchor_schema
			.columns()
			.iter()
			.map(|column| {
				let mut column = column.clone();
				column.qualifier = Some(self.name.clone());
				column
			})
			.collect();
		columns.push(ColumnDef::new(DEPTH, quarry_core::Type::Int).not_null());
		let stack = plan.stack_spool(Schema::new(columns))?;

		let consumer = plan.spool_consumer(stack)?;
		let mut level = consumer;
		if let Some(join) = &self.join {
			let spool = plan.adaptive_index_spool(
				join.seek_input,
				join.full_input,
				&join.source_column,
				&join.parameter,
				self.policy,
			)?;
			let cte_column = format!("{}.{}", self.name, join.cte_column);
			level = plan.nested_loop(level, spool, JoinType::Inner, &[(&cte_column, &join.parameter)], None)?;
		}
		if let Some(filter) = &self.filter {
			level = plan.filter(level, filter)?;
		}

		let mut computed: Vec<ComputedColumn> = self
			.columns
			.iter()
			.enumerate()
			.map(|(i, expression)| ComputedColumn::new(format!("$r{}", i), expression.clone()))
			.collect();
		computed.push(ComputedColumn::new(
			NEXT_DEPTH,
			Expression::binary(BinaryOp::Add, Expression::column(DEPTH), Expression::constant(1)),
		));
		let level = plan.compute(level, computed)?;
		let mut projection: Vec<ProjectColumn> =
			(0..self.columns.len()).map(|i| ProjectColumn::new(format!("$r{}", i))).collect();
		projection.push(ProjectColumn::new(NEXT_DEPTH));
		let mut recursive = plan.project(level, projection)?;

		let recursive_schema = plan.schema(recursive)?;
		if recursive_schema.len() != anchor_schema.len() + 1 {
			return_error!(quarry_type::error::diagnostic::query::column_count_mismatch(
				anchor_schema.len(),
				recursive_schema.len() - 1
			));
		}
		for (anchor_column, column) in anchor_schema.columns().iter().zip(recursive_schema.columns()) {
			if anchor_column.ty != column.ty {
				return_error!(recursive_type_mismatch(&self.name, &anchor_column.name));
			}
		}

		if self.max_recursion > 0 {
			let within = Expression::binary(
				BinaryOp::LessOrEqual,
				Expression::column(NEXT_DEPTH),
				Expression::constant(self.max_recursion as i32),
			);
			recursive = plan.assert(
				recursive,
				&within,
				MAX_RECURSION_EXCEEDED,
				&max_recursion_message(self.max_recursion),
			)?;
		}

		let union = plan.concatenate(&[anchor, recursive])?;
		plan.set_stack_spool_input(stack, union)?;

		let visible: Vec<ProjectColumn> = anchor_schema
			.columns()
			.iter()
			.map(|column| ProjectColumn::new(format!("{}.{}", self.name, column.name)))
			.collect();
		let result = plan.project(stack, visible)?;
		let spool = plan.table_spool(result)?;
		debug!(cte = %self.name, spool = %spool, max_recursion = self.max_recursion, "recursive cte planned");
		Ok(RecursiveCte {
			spool,
		})
	}
}
