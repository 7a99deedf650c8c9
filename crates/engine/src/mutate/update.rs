// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_core::{DmlRequest, Expression, Row};
use quarry_type::{
	error::diagnostic::mutate::{missing_key, null_key},
	return_error,
};
use tracing::instrument;

use crate::{
	context::{DmlOperation, ExecutionContext},
	expression::{Clause, CompiledExpr},
	mutate::{batch_size, check_filter, confirm, dispatch},
	vm::volcano::{
		query::{ExecutionPlan, NodeId},
		spool::drain,
	},
};

/// `UPDATE alias SET column = expression, ... FROM <input>`.
///
/// The input yields the target records; the assignments are evaluated over
/// its rows and the records are addressed by the primary key of `alias`.
pub struct UpdateRoot {
	source: String,
	entity: String,
	key: String,
	key_ordinal: usize,
	columns: Vec<String>,
	assignments: Vec<CompiledExpr>,
	filtered: bool,
	input: NodeId,
}

impl UpdateRoot {
	#[allow(clippy::too_many_arguments)]
	pub fn new(
		plan: &mut ExecutionPlan,
		source: impl Into<String>,
		entity: impl Into<String>,
		alias: &str,
		input: NodeId,
		assignments: Vec<(String, Expression)>,
		filtered: bool,
	) -> crate::Result<Self> {
		let entity = entity.into();
		let schema = plan.schema_arc(input)?;
		let Some(key) = schema.primary_key(alias).map(str::to_string) else {
			return_error!(missing_key(&entity));
		};
		let key_ordinal = schema.resolve(&format!("{}.{}", alias, key))?;

		let mut columns = Vec::with_capacity(assignments.len());
		let mut compiled = Vec::with_capacity(assignments.len());
		for (column, expression) in assignments {
			compiled.push(plan.compiler.compile(&expression, &schema, Clause::Select)?);
			columns.push(column);
		}

		Ok(Self {
			source: source.into(),
			entity,
			key,
			key_ordinal,
			columns,
			assignments: compiled,
			filtered,
			input,
		})
	}

	pub fn entity(&self) -> &str {
		&self.entity
	}

	#[instrument(level = "debug", skip_all, name = "mutate::update::execute", fields(entity = %self.entity))]
	pub fn execute(&self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<usize> {
		check_filter(DmlOperation::Update, self.filtered, ctx)?;
		let source = ctx.sources.get(&self.source)?;

		let mut changes = Vec::new();
		for row in drain(plan, self.input, ctx)? {
			let key = row[self.key_ordinal].clone();
			if key.is_null() {
				return_error!(null_key(&self.entity));
			}
			let mut values = Vec::with_capacity(self.assignments.len() + 1);
			values.push(key);
			for assignment in &self.assignments {
				values.push(assignment.evaluate(&row, ctx)?);
			}
			changes.push(Row::new(values));
		}
		confirm(DmlOperation::Update, &self.entity, changes.len(), ctx)?;

		let size = batch_size(source.as_ref(), ctx);
		let requests = changes
			.chunks(size)
			.map(|chunk| DmlRequest::Update {
				entity: self.entity.clone(),
				key: self.key.clone(),
				columns: self.columns.clone(),
				rows: chunk.to_vec(),
			})
			.collect();

		let written = dispatch(&source, requests, ctx)?;
		ctx.rowcount = written as i64;
		Ok(written)
	}
}
