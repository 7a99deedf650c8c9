// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_core::Row;
use quarry_type::{error::diagnostic::{internal::not_initialized, runtime::assertion_failed}, return_error};
use tracing::instrument;

use crate::{
	context::ExecutionContext,
	expression::CompiledExpr,
	vm::volcano::query::{ExecutionPlan, NodeId, QueryNode},
};

/// Passes rows through until one makes the predicate false, then fails the
/// statement with the configured error number and message.
pub(crate) struct AssertNode {
	input: NodeId,
	predicate: CompiledExpr,
	number: u32,
	message: String,
	initialized: bool,
}

impl AssertNode {
	pub(crate) fn new(input: NodeId, predicate: CompiledExpr, number: u32, message: impl Into<String>) -> Self {
		Self {
			input,
			predicate,
			number,
			message: message.into(),
			initialized: false,
		}
	}
}

impl QueryNode for AssertNode {
	#[instrument(level = "trace", skip_all, name = "volcano::assert::initialize")]
	fn initialize(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<()> {
		plan.execute(self.input, ctx)?;
		self.initialized = true;
		Ok(())
	}

	#[instrument(level = "trace", skip_all, name = "volcano::assert::next")]
	fn next(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<Option<Row>> {
		if !self.initialized {
			return_error!(not_initialized("assert"));
		}
		let Some(row) = plan.next(self.input, ctx)? else {
			return Ok(None);
		};
		if self.predicate.evaluate(&row, ctx)?.as_bool() == Some(false) {
			self.initialized = false;
			return_error!(assertion_failed(self.number, &self.message));
		}
		Ok(Some(row))
	}
}
