// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_core::{JoinType, Row, Value};
use quarry_type::{error::diagnostic::internal::not_initialized, return_error};
use tracing::instrument;

use crate::{
	context::ExecutionContext,
	expression::CompiledExpr,
	vm::volcano::query::{ExecutionPlan, NodeId, QueryNode},
};

/// A left column whose value is bound to a parameter before the right side
/// runs for that row.
#[derive(Clone, Debug)]
pub(crate) struct OuterReference {
	pub ordinal: usize,
	pub parameter: String,
}

struct State {
	current: Option<Row>,
	matched: bool,
	right_nulls: Row,
	// parameter values from before the first left row, put back once the
	// left input is exhausted
	saved: Option<Vec<(String, Option<Value>)>>,
}

/// Runs the right input once per left row.
pub(crate) struct NestedLoopNode {
	left: NodeId,
	right: NodeId,
	join_type: JoinType,
	outer_references: Vec<OuterReference>,
	predicate: Option<CompiledExpr>,
	right_width: usize,
	state: Option<State>,
}

impl NestedLoopNode {
	pub(crate) fn new(
		left: NodeId,
		right: NodeId,
		join_type: JoinType,
		outer_references: Vec<OuterReference>,
		predicate: Option<CompiledExpr>,
		right_width: usize,
	) -> Self {
		Self {
			left,
			right,
			join_type,
			outer_references,
			predicate,
			right_width,
			state: None,
		}
	}
}

impl QueryNode for NestedLoopNode {
	#[instrument(level = "trace", skip_all, name = "volcano::nested_loop::initialize")]
	fn initialize(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<()> {
		plan.execute(self.left, ctx)?;
		self.state = Some(State {
			current: None,
			matched: false,
			right_nulls: Row::nulls(self.right_width),
			saved: None,
		});
		Ok(())
	}

	#[instrument(level = "trace", skip_all, name = "volcano::nested_loop::next")]
	fn next(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<Option<Row>> {
		let Some(state) = &mut self.state else {
			return_error!(not_initialized("nested loop"));
		};
		loop {
			let Some(left) = state.current.clone() else {
				let Some(left) = plan.next(self.left, ctx)? else {
					for (name, previous) in state.saved.take().unwrap_or_default() {
						ctx.restore(&name, previous);
					}
					return Ok(None);
				};
				let mut replaced = Vec::with_capacity(self.outer_references.len());
				for reference in &self.outer_references {
					let value = left.get(reference.ordinal).cloned().unwrap_or(Value::Null);
					replaced.push((reference.parameter.clone(), ctx.bind(&reference.parameter, value)));
				}
				if state.saved.is_none() {
					state.saved = Some(replaced);
				}
				plan.execute(self.right, ctx)?;
				state.current = Some(left);
				state.matched = false;
				continue;
			};

			let Some(right) = plan.next(self.right, ctx)? else {
				state.current = None;
				match self.join_type {
					JoinType::LeftOuter if !state.matched => return Ok(Some(left.concat(&state.right_nulls))),
					JoinType::LeftAntiSemi => return Ok(Some(left)),
					_ => continue,
				}
			};

			let combined = left.concat(&right);
			if let Some(predicate) = &self.predicate {
				if !predicate.test(&combined, ctx)? {
					continue;
				}
			}
			match self.join_type {
				JoinType::LeftSemi => {
					state.current = None;
					return Ok(Some(left));
				}
				JoinType::LeftAntiSemi => {
					state.current = None;
				}
				_ => {
					state.matched = true;
					return Ok(Some(combined));
				}
			}
		}
	}
}
