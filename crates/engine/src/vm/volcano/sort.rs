// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{cmp::Ordering, collections::VecDeque};

use quarry_core::{
	Row,
	sort::{ResolvedSortKey, compare_by},
};
use quarry_type::{error::diagnostic::internal::not_initialized, return_error};
use tracing::instrument;

use crate::{
	context::ExecutionContext,
	vm::volcano::query::{ExecutionPlan, NodeId, QueryNode},
};

struct State {
	sorted: VecDeque<Row>,
	/// First row of the next run, already pulled from the input.
	pending: Option<Row>,
	exhausted: bool,
}

/// Stable, collation aware sort. When the input is already ordered on the
/// first `presorted` keys only the runs of equal leading keys are buffered.
pub(crate) struct SortNode {
	input: NodeId,
	keys: Vec<ResolvedSortKey>,
	presorted: usize,
	state: Option<State>,
}

impl SortNode {
	pub(crate) fn new(input: NodeId, keys: Vec<ResolvedSortKey>, presorted: usize) -> Self {
		let presorted = presorted.min(keys.len());
		Self {
			input,
			keys,
			presorted,
			state: None,
		}
	}
}

impl QueryNode for SortNode {
	#[instrument(level = "trace", skip_all, name = "volcano::sort::initialize")]
	fn initialize(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<()> {
		plan.execute(self.input, ctx)?;
		self.state = Some(State {
			sorted: VecDeque::new(),
			pending: None,
			exhausted: false,
		});
		Ok(())
	}

	#[instrument(level = "trace", skip_all, name = "volcano::sort::next")]
	fn next(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<Option<Row>> {
		let Some(state) = &mut self.state else {
			return_error!(not_initialized("sort"));
		};
		if let Some(row) = state.sorted.pop_front() {
			return Ok(Some(row));
		}
		if state.exhausted {
			return Ok(None);
		}

		let leading = &self.keys[..self.presorted];
		let mut run: Vec<Row> = Vec::new();
		if let Some(first) = state.pending.take() {
			run.push(first);
		}
		loop {
			ctx.cancel.check()?;
			let Some(row) = plan.next(self.input, ctx)? else {
				state.exhausted = true;
				break;
			};
			let same_run = match run.first() {
				Some(first) => compare_by(first.values(), row.values(), leading) == Ordering::Equal,
				None => true,
			};
			if same_run {
				run.push(row);
			} else {
				state.pending = Some(row);
				break;
			}
		}

		run.sort_by(|l, r| compare_by(l.values(), r.values(), &self.keys));
		state.sorted = run.into();
		Ok(state.sorted.pop_front())
	}
}
