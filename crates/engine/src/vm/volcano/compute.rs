// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_core::Row;
use quarry_type::{error::diagnostic::internal::not_initialized, return_error};
use tracing::instrument;

use crate::{
	context::ExecutionContext,
	expression::CompiledExpr,
	vm::volcano::query::{ExecutionPlan, NodeId, QueryNode},
};

/// Appends computed columns to every input row.
pub(crate) struct ComputeNode {
	input: NodeId,
	expressions: Vec<CompiledExpr>,
	initialized: bool,
}

impl ComputeNode {
	pub(crate) fn new(input: NodeId, expressions: Vec<CompiledExpr>) -> Self {
		Self {
			input,
			expressions,
			initialized: false,
		}
	}
}

impl QueryNode for ComputeNode {
	#[instrument(level = "trace", skip_all, name = "volcano::compute::initialize")]
	fn initialize(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<()> {
		plan.execute(self.input, ctx)?;
		self.initialized = true;
		Ok(())
	}

	#[instrument(level = "trace", skip_all, name = "volcano::compute::next")]
	fn next(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<Option<Row>> {
		if !self.initialized {
			return_error!(not_initialized("compute scalar"));
		}
		let Some(row) = plan.next(self.input, ctx)? else {
			return Ok(None);
		};
		let computed = self.expressions.iter().map(|e| e.evaluate(&row, ctx)).collect::<crate::Result<Vec<_>>>()?;
		Ok(Some(row.extend(computed)))
	}
}
