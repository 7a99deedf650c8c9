// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{collections::VecDeque, sync::Arc};

use quarry_core::{ConditionValue, DataSource, RemoteQuery, Row};
use quarry_type::{
	error::diagnostic::{
		internal::not_initialized,
		remote::{incompatible_query, unexpected_shape},
	},
	return_error,
};
use tracing::{instrument, trace};

use crate::{
	context::ExecutionContext,
	vm::volcano::query::{ExecutionPlan, QueryNode},
};

struct State {
	source: Arc<dyn DataSource>,
	query: RemoteQuery,
	buffer: VecDeque<Row>,
	cookie: Option<String>,
	exhausted: bool,
}

/// Streams the pages of a declarative query against a remote data source.
/// Parameter references in the filter are bound when the scan starts, so a
/// scan under a nested loop re-runs with the current outer values.
pub(crate) struct RemoteScanNode {
	source: String,
	query: RemoteQuery,
	width: usize,
	state: Option<State>,
}

impl RemoteScanNode {
	pub(crate) fn new(source: impl Into<String>, query: RemoteQuery, width: usize) -> Self {
		Self {
			source: source.into(),
			query,
			width,
			state: None,
		}
	}

	/// Data source and entity the scan reads.
	pub(crate) fn target(&self) -> (&str, &str) {
		(&self.source, &self.query.entity)
	}

	fn bind(&self, source: &dyn DataSource, ctx: &ExecutionContext) -> crate::Result<RemoteQuery> {
		let capabilities = source.capabilities();
		let mut query = self.query.clone();
		for condition in &mut query.filter {
			if condition.compares_columns() && !capabilities.column_comparison {
				return_error!(incompatible_query(
					source.name(),
					&format!("comparing column '{}' with another column", condition.column)
				));
			}
			if let Some(ConditionValue::Parameter(name)) = &condition.value {
				condition.value = Some(ConditionValue::Literal(ctx.param(name)?.clone()));
			}
		}
		Ok(query)
	}
}

impl QueryNode for RemoteScanNode {
	#[instrument(level = "trace", skip_all, name = "volcano::remote_scan::initialize")]
	fn initialize(&mut self, _plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<()> {
		let source = ctx.sources.get(&self.source)?;
		let query = self.bind(source.as_ref(), ctx)?;
		self.state = Some(State {
			source,
			query,
			buffer: VecDeque::new(),
			cookie: None,
			exhausted: false,
		});
		Ok(())
	}

	#[instrument(level = "trace", skip_all, name = "volcano::remote_scan::next")]
	fn next(&mut self, _plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<Option<Row>> {
		let Some(state) = &mut self.state else {
			return_error!(not_initialized("remote scan"));
		};
		loop {
			if let Some(row) = state.buffer.pop_front() {
				return Ok(Some(row));
			}
			if state.exhausted {
				return Ok(None);
			}
			ctx.cancel.check()?;
			let page = state.source.fetch(&state.query, state.cookie.as_deref())?;
			trace!(entity = %state.query.entity, rows = page.rows.len(), "fetched page");
			if let Some(row) = page.rows.iter().find(|row| row.len() != self.width) {
				return_error!(unexpected_shape(state.source.name(), self.width, row.len()));
			}
			state.exhausted = page.next.is_none();
			state.cookie = page.next;
			state.buffer.extend(page.rows);
		}
	}
}
