// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{collections::HashMap, sync::Arc};

use quarry_core::{Collation, Row, Type};
use quarry_type::{KeyValue, error::diagnostic::internal::not_initialized, return_error, value::convert::try_cast};
use tracing::instrument;

use crate::{
	context::ExecutionContext,
	vm::volcano::{
		query::{ExecutionPlan, NodeId, QueryNode},
		spool::drain,
	},
};

/// Keyed memo: the seek value is read from a parameter on every execution.
/// Unseen keys run the input and keep the rows whose key column equals the
/// seek value; seen keys replay. A NULL seek value matches nothing.
pub(crate) struct IndexSpoolNode {
	input: NodeId,
	key: usize,
	key_type: Type,
	collation: Collation,
	seek: String,
	memo: HashMap<KeyValue, Arc<Vec<Row>>>,
	execution: u64,
	replay: Option<(Arc<Vec<Row>>, usize)>,
}

impl IndexSpoolNode {
	pub(crate) fn new(input: NodeId, key: usize, key_type: Type, collation: Collation, seek: impl Into<String>) -> Self {
		Self {
			input,
			key,
			key_type,
			collation,
			seek: seek.into(),
			memo: HashMap::new(),
			execution: 0,
			replay: None,
		}
	}
}

impl QueryNode for IndexSpoolNode {
	#[instrument(level = "trace", skip_all, name = "volcano::index_spool::initialize")]
	fn initialize(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<()> {
		if self.execution != ctx.execution_id() {
			self.memo.clear();
			self.execution = ctx.execution_id();
		}
		let seek = try_cast(ctx.param(&self.seek)?, &self.key_type)?;
		let seek = KeyValue::new(&seek, &self.collation);
		let rows = if seek.is_null() {
			Arc::new(Vec::new())
		} else if let Some(rows) = self.memo.get(&seek) {
			rows.clone()
		} else {
			let rows: Vec<Row> = drain(plan, self.input, ctx)?
				.into_iter()
				.filter(|row| row.get(self.key).is_some_and(|v| KeyValue::new(v, &self.collation) == seek))
				.collect();
			let rows = Arc::new(rows);
			self.memo.insert(seek, rows.clone());
			rows
		};
		self.replay = Some((rows, 0));
		Ok(())
	}

	#[instrument(level = "trace", skip_all, name = "volcano::index_spool::next")]
	fn next(&mut self, _plan: &ExecutionPlan, _ctx: &mut ExecutionContext) -> crate::Result<Option<Row>> {
		let Some((rows, position)) = &mut self.replay else {
			return_error!(not_initialized("index spool"));
		};
		let row = rows.get(*position).cloned();
		*position += 1;
		Ok(row)
	}
}
