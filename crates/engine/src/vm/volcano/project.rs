// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_core::Row;
use quarry_type::{error::diagnostic::internal::not_initialized, return_error};
use tracing::instrument;

use crate::{
	context::ExecutionContext,
	vm::volcano::query::{ExecutionPlan, NodeId, QueryNode},
};

/// Selects, reorders and renames input columns.
pub(crate) struct ProjectNode {
	input: NodeId,
	ordinals: Vec<usize>,
	initialized: bool,
}

impl ProjectNode {
	pub(crate) fn new(input: NodeId, ordinals: Vec<usize>) -> Self {
		Self {
			input,
			ordinals,
			initialized: false,
		}
	}
}

impl QueryNode for ProjectNode {
	#[instrument(level = "trace", skip_all, name = "volcano::project::initialize")]
	fn initialize(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<()> {
		plan.execute(self.input, ctx)?;
		self.initialized = true;
		Ok(())
	}

	#[instrument(level = "trace", skip_all, name = "volcano::project::next")]
	fn next(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<Option<Row>> {
		if !self.initialized {
			return_error!(not_initialized("project"));
		}
		Ok(plan.next(self.input, ctx)?.map(|row| row.project(&self.ordinals)))
	}
}
