// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::HashSet;

use quarry_core::{Collation, Row};
use quarry_type::{KeyValue, error::diagnostic::internal::not_initialized, return_error};
use tracing::instrument;

use crate::{
	context::ExecutionContext,
	vm::volcano::query::{ExecutionPlan, NodeId, QueryNode},
};

/// Drops rows whose key columns equal those of an earlier row. The first
/// row of every key wins.
pub(crate) struct DistinctNode {
	input: NodeId,
	columns: Vec<usize>,
	collations: Vec<Collation>,
	seen: Option<HashSet<Vec<KeyValue>>>,
}

impl DistinctNode {
	pub(crate) fn new(input: NodeId, columns: Vec<usize>, collations: Vec<Collation>) -> Self {
		Self {
			input,
			columns,
			collations,
			seen: None,
		}
	}
}

impl QueryNode for DistinctNode {
	#[instrument(level = "trace", skip_all, name = "volcano::distinct::initialize")]
	fn initialize(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<()> {
		plan.execute(self.input, ctx)?;
		self.seen = Some(HashSet::new());
		Ok(())
	}

	#[instrument(level = "trace", skip_all, name = "volcano::distinct::next")]
	fn next(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<Option<Row>> {
		let Some(seen) = &mut self.seen else {
			return_error!(not_initialized("distinct"));
		};
		while let Some(row) = plan.next(self.input, ctx)? {
			let key = KeyValue::row(row.project(&self.columns).values(), &self.collations);
			if seen.insert(key) {
				return Ok(Some(row));
			}
		}
		Ok(None)
	}
}
