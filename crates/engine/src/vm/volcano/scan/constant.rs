// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use quarry_core::Row;
use quarry_type::{error::diagnostic::internal::not_initialized, return_error};
use tracing::instrument;

use crate::{
	context::ExecutionContext,
	vm::volcano::query::{ExecutionPlan, QueryNode},
};

/// Literal rows: VALUES lists, the anchor seed of recursive queries.
pub(crate) struct ConstantScanNode {
	rows: Arc<Vec<Row>>,
	position: Option<usize>,
}

impl ConstantScanNode {
	pub(crate) fn new(rows: Vec<Row>) -> Self {
		Self {
			rows: Arc::new(rows),
			position: None,
		}
	}
}

impl QueryNode for ConstantScanNode {
	#[instrument(level = "trace", skip_all, name = "volcano::constant_scan::initialize")]
	fn initialize(&mut self, _plan: &ExecutionPlan, _ctx: &mut ExecutionContext) -> crate::Result<()> {
		self.position = Some(0);
		Ok(())
	}

	#[instrument(level = "trace", skip_all, name = "volcano::constant_scan::next")]
	fn next(&mut self, _plan: &ExecutionPlan, _ctx: &mut ExecutionContext) -> crate::Result<Option<Row>> {
		let Some(position) = &mut self.position else {
			return_error!(not_initialized("constant scan"));
		};
		let row = self.rows.get(*position).cloned();
		if row.is_some() {
			*position += 1;
		}
		Ok(row)
	}
}
