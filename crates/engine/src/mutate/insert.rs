// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_core::DmlRequest;
use quarry_type::{error::diagnostic::query::column_count_mismatch, return_error};
use tracing::instrument;

use crate::{
	context::{DmlOperation, ExecutionContext},
	mutate::{batch_size, confirm, dispatch},
	vm::volcano::{
		query::{ExecutionPlan, NodeId},
		spool::drain,
	},
};

/// `INSERT INTO entity (columns) <input>`.
#[derive(Clone, Debug)]
pub struct InsertRoot {
	source: String,
	entity: String,
	columns: Vec<String>,
	input: NodeId,
}

impl InsertRoot {
	pub fn new(
		plan: &ExecutionPlan,
		source: impl Into<String>,
		entity: impl Into<String>,
		columns: Vec<String>,
		input: NodeId,
	) -> crate::Result<Self> {
		let width = plan.schema(input)?.len();
		if width != columns.len() {
			return_error!(column_count_mismatch(columns.len(), width));
		}
		Ok(Self {
			source: source.into(),
			entity: entity.into(),
			columns,
			input,
		})
	}

	pub fn entity(&self) -> &str {
		&self.entity
	}

	/// Inserts every row of the input, returning the number of records
	/// created.
	#[instrument(level = "debug", skip_all, name = "mutate::insert::execute", fields(entity = %self.entity))]
	pub fn execute(&self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<usize> {
		let source = ctx.sources.get(&self.source)?;
		let rows = drain(plan, self.input, ctx)?;
		confirm(DmlOperation::Insert, &self.entity, rows.len(), ctx)?;

		let size = batch_size(source.as_ref(), ctx);
		let requests = rows
			.chunks(size)
			.map(|chunk| DmlRequest::Insert {
				entity: self.entity.clone(),
				columns: self.columns.clone(),
				rows: chunk.to_vec(),
			})
			.collect();

		let written = dispatch(&source, requests, ctx)?;
		ctx.rowcount = written as i64;
		Ok(written)
	}
}
