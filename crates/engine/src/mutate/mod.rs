// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! DML roots. Each one drains its input plan, asks for confirmation when
//! the change is larger than the configured threshold and sends the change
//! to the data source in batches.
//!
//! The first rejected batch aborts the statement: no further batch is sent.
//! Batches already applied stay applied and the error carries a note with
//! the number of records written.

use std::sync::{
	Arc,
	atomic::{AtomicBool, Ordering},
};

use quarry_core::{DataSource, DmlRequest, Error};
use quarry_type::{
	error::diagnostic::{
		internal::internal,
		mutate::{blocked_without_filter, not_confirmed, partial_write_note},
	},
	return_error,
};
use rayon::{ThreadPoolBuilder, prelude::*};
use tracing::debug;

use crate::context::{DmlConfirmation, DmlOperation, ExecutionContext};

mod delete;
mod insert;
mod update;

pub use delete::DeleteRoot;
pub use insert::InsertRoot;
pub use update::UpdateRoot;

/// Fails when the options forbid the unfiltered statement.
pub(crate) fn check_filter(operation: DmlOperation, filtered: bool, ctx: &ExecutionContext) -> crate::Result<()> {
	let blocked = match operation {
		DmlOperation::Insert => false,
		DmlOperation::Update => ctx.options.block_update_without_where,
		DmlOperation::Delete => ctx.options.block_delete_without_where,
	};
	if blocked && !filtered {
		return_error!(blocked_without_filter(&operation.to_string()));
	}
	Ok(())
}

/// Asks the confirmation callback when `count` exceeds the operation's
/// threshold.
pub(crate) fn confirm(operation: DmlOperation, entity: &str, count: usize, ctx: &ExecutionContext) -> crate::Result<()> {
	let threshold = match operation {
		DmlOperation::Insert => ctx.options.insert_confirm_threshold,
		DmlOperation::Update => ctx.options.update_confirm_threshold,
		DmlOperation::Delete => ctx.options.delete_confirm_threshold,
	};
	if count <= threshold {
		return Ok(());
	}
	let confirmation = DmlConfirmation {
		operation,
		entity: entity.to_string(),
		count,
	};
	if !ctx.confirm(&confirmation) {
		return_error!(not_confirmed(&operation.to_string(), count));
	}
	Ok(())
}

/// Records per request: the smaller of the configured and the data source
/// batch size.
pub(crate) fn batch_size(source: &dyn DataSource, ctx: &ExecutionContext) -> usize {
	ctx.options.batch_size.min(source.capabilities().batch_size).max(1)
}

/// Sends `requests` with at most `max_degree_of_parallelism` of them in
/// flight, returning the number of affected records.
pub(crate) fn dispatch(
	source: &Arc<dyn DataSource>,
	requests: Vec<DmlRequest>,
	ctx: &ExecutionContext,
) -> crate::Result<usize> {
	if requests.is_empty() {
		return Ok(0);
	}
	let parallelism = ctx.options.max_degree_of_parallelism.min(source.capabilities().max_parallelism).max(1);
	debug!(
		source = source.name(),
		entity = requests[0].entity(),
		batches = requests.len(),
		parallelism,
		"dispatching dml batches"
	);

	let results: Vec<crate::Result<usize>> = if parallelism == 1 || requests.len() == 1 {
		let mut results = Vec::with_capacity(requests.len());
		for request in &requests {
			let result = ctx.cancel.check().and_then(|_| source.execute(request));
			let failed = result.is_err();
			results.push(result);
			if failed {
				break;
			}
		}
		results
	} else {
		let pool = ThreadPoolBuilder::new()
			.num_threads(parallelism)
			.build()
			.map_err(|err| quarry_type::error!(internal(format!("cannot start dml workers: {}", err))))?;
		let cancel = ctx.cancel.clone();
		let failed = AtomicBool::new(false);
		pool.install(|| {
			requests
				.par_iter()
				.filter_map(|request| {
					if failed.load(Ordering::Acquire) {
						return None;
					}
					let result = cancel.check().and_then(|_| source.execute(request));
					if result.is_err() {
						failed.store(true, Ordering::Release);
					}
					Some(result)
				})
				.collect()
		})
	};

	let written: usize = results.iter().filter_map(|r| r.as_ref().ok()).sum();
	match results.into_iter().find_map(Result::err) {
		Some(err) if written > 0 => Err(Error(err.diagnostic().with_note(partial_write_note(written)))),
		Some(err) => Err(err),
		None => Ok(written),
	}
}
