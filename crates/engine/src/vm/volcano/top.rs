// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_core::Row;
use quarry_type::{error::diagnostic::internal::not_initialized, return_error};
use tracing::instrument;

use crate::{
	context::ExecutionContext,
	vm::volcano::query::{ExecutionPlan, NodeId, QueryNode},
};

/// TOP n, optionally after skipping `offset` rows. Stops pulling its input
/// once the limit is reached.
pub(crate) struct TopNode {
	input: NodeId,
	count: u64,
	offset: u64,
	emitted: Option<u64>,
}

impl TopNode {
	pub(crate) fn new(input: NodeId, count: u64, offset: u64) -> Self {
		Self {
			input,
			count,
			offset,
			emitted: None,
		}
	}
}

impl QueryNode for TopNode {
	#[instrument(level = "trace", skip_all, name = "volcano::top::initialize")]
	fn initialize(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<()> {
		plan.execute(self.input, ctx)?;
		for _ in 0..self.offset {
			if plan.next(self.input, ctx)?.is_none() {
				break;
			}
		}
		self.emitted = Some(0);
		Ok(())
	}

	#[instrument(level = "trace", skip_all, name = "volcano::top::next")]
	fn next(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<Option<Row>> {
		let Some(emitted) = &mut self.emitted else {
			return_error!(not_initialized("top"));
		};
		if *emitted >= self.count {
			return Ok(None);
		}
		let row = plan.next(self.input, ctx)?;
		if row.is_some() {
			*emitted += 1;
		}
		Ok(row)
	}
}
