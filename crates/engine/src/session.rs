// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_core::{CancellationToken, DataSources, ExecutionOptions, Params, Value};
use tracing::{debug, instrument};

use crate::{
	context::{DmlConfirmation, ExecutionContext},
	reader::DataReader,
	statement::Batch,
};

/// A connection-like handle running batches against a set of data sources.
///
/// Variables are scoped to a batch; cursors live until they are
/// deallocated or the session is dropped.
pub struct Session {
	ctx: ExecutionContext,
}

impl Session {
	pub fn new(sources: DataSources) -> Self {
		Self {
			ctx: ExecutionContext::new(sources),
		}
	}

	pub fn with_options(mut self, options: ExecutionOptions) -> Self {
		self.ctx.options = options;
		self
	}

	pub fn with_confirm(mut self, confirm: impl Fn(&DmlConfirmation) -> bool + Send + Sync + 'static) -> Self {
		self.ctx = self.ctx.with_confirm(confirm);
		self
	}

	pub fn options(&self) -> &ExecutionOptions {
		&self.ctx.options
	}

	pub fn options_mut(&mut self) -> &mut ExecutionOptions {
		&mut self.ctx.options
	}

	/// Token cancelling whatever the session currently runs.
	pub fn cancellation(&self) -> CancellationToken {
		self.ctx.cancel.clone()
	}

	pub fn context(&self) -> &ExecutionContext {
		&self.ctx
	}

	/// Starts the batch and positions the reader on its first result set.
	#[instrument(level = "debug", skip_all, name = "session::execute_reader", fields(statements = batch.len()))]
	pub fn execute_reader<'a>(
		&'a mut self,
		batch: &'a Batch,
		params: impl Into<Params>,
	) -> crate::Result<DataReader<'a>> {
		self.ctx.set_params(params.into());
		self.ctx.rowcount = 0;
		debug!(statements = batch.len(), "executing batch");
		DataReader::open(&mut self.ctx, batch.statements())
	}

	/// First column of the first row of the first result set, or NULL.
	pub fn execute_scalar(&mut self, batch: &Batch, params: impl Into<Params>) -> crate::Result<Value> {
		let mut reader = self.execute_reader(batch, params)?;
		let value = if reader.read()? {
			reader.value(0)?.clone()
		} else {
			Value::Null
		};
		reader.close()?;
		Ok(value)
	}

	/// Runs the whole batch, discarding result sets, and returns the number
	/// of records changed or `-1` when no DML ran.
	pub fn execute_non_query(&mut self, batch: &Batch, params: impl Into<Params>) -> crate::Result<i64> {
		self.execute_reader(batch, params)?.close()
	}
}
