// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{collections::HashMap, sync::Arc};

use quarry_core::{Collation, Row, Type};
use quarry_type::{KeyValue, error::diagnostic::internal::not_initialized, return_error, value::convert::try_cast};
use tracing::{debug, instrument};

use crate::{
	context::ExecutionContext,
	vm::volcano::{
		query::{ExecutionPlan, NodeId, QueryNode},
		spool::drain,
	},
};

/// When an adaptive index spool stops fetching per key and fetches the whole
/// source instead.
///
/// A per-key fetch costs at least one remote request; a full fetch costs one
/// request per page of the entity. The spool keeps fetching per key until it
/// has issued as many requests as the full fetch would take, then switches.
/// Without a record count estimate it switches after `default_threshold`
/// distinct keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdaptiveSpoolPolicy {
	pub default_threshold: usize,
}

impl Default for AdaptiveSpoolPolicy {
	fn default() -> Self {
		Self {
			default_threshold: 8,
		}
	}
}

impl AdaptiveSpoolPolicy {
	pub fn new(default_threshold: usize) -> Self {
		Self {
			default_threshold,
		}
	}

	/// Number of per-key fetches after which the spool switches.
	pub fn threshold(&self, estimate: Option<u64>, page_size: usize) -> usize {
		match estimate {
			Some(records) => records.div_ceil(page_size.max(1) as u64).max(1) as usize,
			None => self.default_threshold.max(1),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
	Unspooled,
	Spooled,
}

/// Entity whose record count drives the switch.
#[derive(Clone, Debug)]
pub(crate) struct Estimate {
	pub source: String,
	pub entity: String,
}

/// Index spool that starts by re-fetching per key through `seek_source`
/// and, once that becomes more expensive than a single full fetch, loads
/// `full_source` once and serves every later key from its index.
pub(crate) struct AdaptiveIndexSpoolNode {
	seek_source: NodeId,
	full_source: NodeId,
	key: usize,
	key_type: Type,
	collation: Collation,
	seek: String,
	estimate: Option<Estimate>,
	policy: AdaptiveSpoolPolicy,
	mode: Mode,
	fetches: usize,
	threshold: usize,
	memo: HashMap<KeyValue, Arc<Vec<Row>>>,
	execution: u64,
	replay: Option<(Arc<Vec<Row>>, usize)>,
}

impl AdaptiveIndexSpoolNode {
	#[allow(clippy::too_many_arguments)]
	pub(crate) fn new(
		seek_source: NodeId,
		full_source: NodeId,
		key: usize,
		key_type: Type,
		collation: Collation,
		seek: impl Into<String>,
		estimate: Option<Estimate>,
		policy: AdaptiveSpoolPolicy,
	) -> Self {
		Self {
			seek_source,
			full_source,
			key,
			key_type,
			collation,
			seek: seek.into(),
			estimate,
			policy,
			mode: Mode::Unspooled,
			fetches: 0,
			threshold: policy.default_threshold,
			memo: HashMap::new(),
			execution: 0,
			replay: None,
		}
	}

	fn reset(&mut self, ctx: &ExecutionContext) -> crate::Result<()> {
		self.memo.clear();
		self.mode = Mode::Unspooled;
		self.fetches = 0;
		self.execution = ctx.execution_id();
		self.threshold = match &self.estimate {
			Some(estimate) => {
				let source = ctx.sources.get(&estimate.source)?;
				let records = source.estimate_record_count(&estimate.entity)?;
				self.policy.threshold(records, source.capabilities().page_size)
			}
			None => self.policy.threshold(None, 1),
		};
		Ok(())
	}

	fn key_of(&self, row: &Row) -> KeyValue {
		row.get(self.key).map(|v| KeyValue::new(v, &self.collation)).unwrap_or(KeyValue::Null)
	}

	fn spool(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<()> {
		debug!(fetches = self.fetches, threshold = self.threshold, "adaptive index spool switching to a full fetch");
		let mut index: HashMap<KeyValue, Vec<Row>> = HashMap::new();
		for row in drain(plan, self.full_source, ctx)? {
			let key = self.key_of(&row);
			if !key.is_null() {
				index.entry(key).or_default().push(row);
			}
		}
		self.memo = index.into_iter().map(|(key, rows)| (key, Arc::new(rows))).collect();
		self.mode = Mode::Spooled;
		Ok(())
	}
}

impl QueryNode for AdaptiveIndexSpoolNode {
	#[instrument(level = "trace", skip_all, name = "volcano::adaptive_index_spool::initialize")]
	fn initialize(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<()> {
		if self.execution != ctx.execution_id() {
			self.reset(ctx)?;
		}
		let seek = try_cast(ctx.param(&self.seek)?, &self.key_type)?;
		let seek = KeyValue::new(&seek, &self.collation);
		let rows = if seek.is_null() {
			Arc::new(Vec::new())
		} else if let Some(rows) = self.memo.get(&seek) {
			rows.clone()
		} else {
			if self.mode == Mode::Unspooled && self.fetches >= self.threshold {
				self.spool(plan, ctx)?;
			}
			match self.mode {
				Mode::Spooled => self.memo.get(&seek).cloned().unwrap_or_default(),
				Mode::Unspooled => {
					self.fetches += 1;
					let rows: Vec<Row> = drain(plan, self.seek_source, ctx)?
						.into_iter()
						.filter(|row| self.key_of(row) == seek)
						.collect();
					let rows = Arc::new(rows);
					self.memo.insert(seek, rows.clone());
					rows
				}
			}
		};
		self.replay = Some((rows, 0));
		Ok(())
	}

	#[instrument(level = "trace", skip_all, name = "volcano::adaptive_index_spool::next")]
	fn next(&mut self, _plan: &ExecutionPlan, _ctx: &mut ExecutionContext) -> crate::Result<Option<Row>> {
		let Some((rows, position)) = &mut self.replay else {
			return_error!(not_initialized("adaptive index spool"));
		};
		let row = rows.get(*position).cloned();
		*position += 1;
		Ok(row)
	}
}
