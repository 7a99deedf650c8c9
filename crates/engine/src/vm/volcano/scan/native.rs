// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::VecDeque;

use quarry_core::Row;
use quarry_type::{
	error::diagnostic::{
		internal::not_initialized,
		remote::{native_query_unavailable, unexpected_shape},
	},
	return_error,
};
use tracing::instrument;

use crate::{
	context::ExecutionContext,
	vm::volcano::query::{ExecutionPlan, QueryNode},
};

/// Hands the statement text to the data source's native SQL endpoint.
pub(crate) struct NativeQueryNode {
	source: String,
	sql: String,
	width: usize,
	rows: Option<VecDeque<Row>>,
}

impl NativeQueryNode {
	pub(crate) fn new(source: impl Into<String>, sql: impl Into<String>, width: usize) -> Self {
		Self {
			source: source.into(),
			sql: sql.into(),
			width,
			rows: None,
		}
	}
}

impl QueryNode for NativeQueryNode {
	#[instrument(level = "trace", skip_all, name = "volcano::native_query::initialize")]
	fn initialize(&mut self, _plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<()> {
		let source = ctx.sources.get(&self.source)?;
		if !ctx.options.use_native_query_endpoint || !source.capabilities().native_query {
			return_error!(native_query_unavailable(source.name()));
		}
		ctx.cancel.check()?;
		let rows = source.execute_native(&self.sql, &ctx.params())?;
		if let Some(row) = rows.iter().find(|row| row.len() != self.width) {
			return_error!(unexpected_shape(source.name(), self.width, row.len()));
		}
		self.rows = Some(rows.into());
		Ok(())
	}

	#[instrument(level = "trace", skip_all, name = "volcano::native_query::next")]
	fn next(&mut self, _plan: &ExecutionPlan, _ctx: &mut ExecutionContext) -> crate::Result<Option<Row>> {
		match &mut self.rows {
			Some(rows) => Ok(rows.pop_front()),
			None => return_error!(not_initialized("native query")),
		}
	}
}
