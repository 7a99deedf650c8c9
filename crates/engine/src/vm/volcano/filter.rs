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

pub(crate) struct FilterNode {
	input: NodeId,
	predicate: CompiledExpr,
	initialized: bool,
}

impl FilterNode {
	pub(crate) fn new(input: NodeId, predicate: CompiledExpr) -> Self {
		Self {
			input,
			predicate,
			initialized: false,
		}
	}
}

impl QueryNode for FilterNode {
	#[instrument(level = "trace", skip_all, name = "volcano::filter::initialize")]
	fn initialize(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<()> {
		plan.execute(self.input, ctx)?;
		self.initialized = true;
		Ok(())
	}

	#[instrument(level = "trace", skip_all, name = "volcano::filter::next")]
	fn next(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<Option<Row>> {
		if !self.initialized {
			return_error!(not_initialized("filter"));
		}
		while let Some(row) = plan.next(self.input, ctx)? {
			if self.predicate.test(&row, ctx)? {
				return Ok(Some(row));
			}
		}
		Ok(None)
	}
}
