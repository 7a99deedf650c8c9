// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_core::Row;
use quarry_type::{error::diagnostic::internal::not_initialized, return_error};
use tracing::{instrument, warn};

use crate::{
	context::ExecutionContext,
	vm::volcano::query::{ExecutionPlan, NodeId, QueryNode},
};

struct State {
	active: NodeId,
	emitted: bool,
}

/// Runs the primary input and switches to the secondary one when the primary
/// turns out to be incompatible with the data source. Once a row has been
/// emitted the switch is no longer possible and the error propagates.
pub(crate) struct TryCatchNode {
	primary: NodeId,
	secondary: NodeId,
	state: Option<State>,
}

impl TryCatchNode {
	pub(crate) fn new(primary: NodeId, secondary: NodeId) -> Self {
		Self {
			primary,
			secondary,
			state: None,
		}
	}

	pub(crate) fn catch_source(&self) -> NodeId {
		self.secondary
	}

	fn fall_back(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext, err: &crate::Error) -> crate::Result<()> {
		warn!(primary = %self.primary, secondary = %self.secondary, error = %err, "falling back to the secondary source");
		plan.execute(self.secondary, ctx)?;
		self.state = Some(State {
			active: self.secondary,
			emitted: false,
		});
		Ok(())
	}
}

impl QueryNode for TryCatchNode {
	#[instrument(level = "trace", skip_all, name = "volcano::try_catch::initialize")]
	fn initialize(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<()> {
		match plan.execute(self.primary, ctx) {
			Ok(()) => {
				self.state = Some(State {
					active: self.primary,
					emitted: false,
				});
				Ok(())
			}
			Err(err) if err.is_incompatible() => self.fall_back(plan, ctx, &err),
			Err(err) => Err(err),
		}
	}

	#[instrument(level = "trace", skip_all, name = "volcano::try_catch::next")]
	fn next(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<Option<Row>> {
		let Some(state) = &mut self.state else {
			return_error!(not_initialized("try catch"));
		};
		match plan.next(state.active, ctx) {
			Ok(row) => {
				state.emitted |= row.is_some();
				Ok(row)
			}
			Err(err) if err.is_incompatible() && state.active == self.primary && !state.emitted => {
				self.fall_back(plan, ctx, &err)?;
				self.next(plan, ctx)
			}
			Err(err) => Err(err),
		}
	}
}
