// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use quarry_core::Row;
use quarry_type::{error::diagnostic::internal::not_initialized, return_error};
use tracing::instrument;

use crate::{
	context::ExecutionContext,
	vm::volcano::query::{ExecutionPlan, NodeId, QueryNode},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ConsumerMode {
	/// Replays the cache of a table spool.
	Replay,
	/// Pops the most recent row of a stack spool's work table.
	Pop,
}

/// Reads the rows of a spool producer elsewhere in the plan.
pub(crate) struct SpoolConsumerNode {
	producer: NodeId,
	mode: ConsumerMode,
	replay: Option<(Arc<Vec<Row>>, usize)>,
	initialized: bool,
}

impl SpoolConsumerNode {
	pub(crate) fn new(producer: NodeId, mode: ConsumerMode) -> Self {
		Self {
			producer,
			mode,
			replay: None,
			initialized: false,
		}
	}
}

impl QueryNode for SpoolConsumerNode {
	#[instrument(level = "trace", skip_all, name = "volcano::spool_consumer::initialize")]
	fn initialize(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<()> {
		if self.mode == ConsumerMode::Replay {
			self.replay = Some((plan.spool_rows(self.producer, ctx)?, 0));
		}
		self.initialized = true;
		Ok(())
	}

	#[instrument(level = "trace", skip_all, name = "volcano::spool_consumer::next")]
	fn next(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<Option<Row>> {
		if !self.initialized {
			return_error!(not_initialized("spool consumer"));
		}
		match (&mut self.replay, self.mode) {
			(Some((rows, position)), ConsumerMode::Replay) => {
				let row = rows.get(*position).cloned();
				*position += 1;
				Ok(row)
			}
			(_, ConsumerMode::Pop) => {
				Ok(ctx.work_tables.get_mut(&(plan.id(), self.producer)).and_then(Vec::pop))
			}
			(None, ConsumerMode::Replay) => return_error!(not_initialized("spool consumer")),
		}
	}
}
