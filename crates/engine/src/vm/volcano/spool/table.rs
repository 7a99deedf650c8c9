// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use quarry_core::Row;
use quarry_type::{error::diagnostic::internal::not_initialized, return_error};
use tracing::{debug, instrument};

use crate::{
	context::ExecutionContext,
	vm::volcano::{
		query::{ExecutionPlan, NodeId, QueryNode},
		spool::drain,
	},
};

/// Eager spool: runs its input once per statement execution and replays the
/// cached rows on every later execution, including the ones started through
/// spool consumers.
pub(crate) struct TableSpoolNode {
	input: NodeId,
	cache: Option<(u64, Arc<Vec<Row>>)>,
	replay: Option<(Arc<Vec<Row>>, usize)>,
}

impl TableSpoolNode {
	pub(crate) fn new(input: NodeId) -> Self {
		Self {
			input,
			cache: None,
			replay: None,
		}
	}

	pub(crate) fn materialize(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<Arc<Vec<Row>>> {
		if let Some((execution, rows)) = &self.cache {
			if *execution == ctx.execution_id() {
				return Ok(rows.clone());
			}
		}
		let rows = Arc::new(drain(plan, self.input, ctx)?);
		debug!(input = %self.input, rows = rows.len(), "table spool materialized");
		self.cache = Some((ctx.execution_id(), rows.clone()));
		Ok(rows)
	}
}

impl QueryNode for TableSpoolNode {
	#[instrument(level = "trace", skip_all, name = "volcano::table_spool::initialize")]
	fn initialize(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<()> {
		let rows = self.materialize(plan, ctx)?;
		self.replay = Some((rows, 0));
		Ok(())
	}

	#[instrument(level = "trace", skip_all, name = "volcano::table_spool::next")]
	fn next(&mut self, _plan: &ExecutionPlan, _ctx: &mut ExecutionContext) -> crate::Result<Option<Row>> {
		let Some((rows, position)) = &mut self.replay else {
			return_error!(not_initialized("table spool"));
		};
		let row = rows.get(*position).cloned();
		*position += 1;
		Ok(row)
	}
}
