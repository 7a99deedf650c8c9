// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_core::Row;
use quarry_type::{
	error::diagnostic::internal::{internal, not_initialized},
	return_error,
};
use tracing::instrument;

use crate::{
	context::ExecutionContext,
	vm::volcano::query::{ExecutionPlan, NodeId, QueryNode},
};

/// Lazy spool feeding the recursion of a recursive query: every row passing
/// through is pushed onto a work table that stack consumers pop from.
///
/// The consumers live inside the spool's own input, so the spool is added to
/// the plan first and given its input once that has been built.
pub(crate) struct StackSpoolNode {
	id: NodeId,
	input: Option<NodeId>,
	initialized: bool,
}

impl StackSpoolNode {
	pub(crate) fn new(id: NodeId) -> Self {
		Self {
			id,
			input: None,
			initialized: false,
		}
	}

	pub(crate) fn input(&self) -> Option<NodeId> {
		self.input
	}

	pub(crate) fn set_input(&mut self, input: NodeId) {
		self.input = Some(input);
	}
}

impl QueryNode for StackSpoolNode {
	#[instrument(level = "trace", skip_all, name = "volcano::stack_spool::initialize")]
	fn initialize(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<()> {
		let Some(input) = self.input else {
			return_error!(internal(format!("stack spool {} has no input", self.id)));
		};
		ctx.work_tables.insert((plan.id(), self.id), Vec::new());
		plan.execute(input, ctx)?;
		self.initialized = true;
		Ok(())
	}

	#[instrument(level = "trace", skip_all, name = "volcano::stack_spool::next")]
	fn next(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<Option<Row>> {
		let (true, Some(input)) = (self.initialized, self.input) else {
			return_error!(not_initialized("stack spool"));
		};
		ctx.cancel.check()?;
		let row = plan.next(input, ctx)?;
		if let Some(row) = &row {
			ctx.work_tables.entry((plan.id(), self.id)).or_default().push(row.clone());
		}
		Ok(row)
	}
}
