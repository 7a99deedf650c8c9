// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_core::{DmlRequest, RemoteCondition};
use quarry_type::{
	error::diagnostic::mutate::{missing_key, null_key},
	return_error,
};
use tracing::{debug, instrument};

use crate::{
	context::{DmlOperation, ExecutionContext},
	mutate::{batch_size, check_filter, confirm, dispatch},
	vm::volcano::{
		query::{ExecutionPlan, NodeId},
		spool::drain,
	},
};

/// `DELETE alias FROM <input>`.
pub struct DeleteRoot {
	source: String,
	entity: String,
	key: String,
	key_ordinal: usize,
	filtered: bool,
	bulk_filter: Option<Vec<RemoteCondition>>,
	input: NodeId,
}

impl DeleteRoot {
	pub fn new(
		plan: &ExecutionPlan,
		source: impl Into<String>,
		entity: impl Into<String>,
		alias: &str,
		input: NodeId,
		filtered: bool,
	) -> crate::Result<Self> {
		let entity = entity.into();
		let schema = plan.schema(input)?;
		let Some(key) = schema.primary_key(alias).map(str::to_string) else {
			return_error!(missing_key(&entity));
		};
		let key_ordinal = schema.resolve(&format!("{}.{}", alias, key))?;
		Ok(Self {
			source: source.into(),
			entity,
			key,
			key_ordinal,
			filtered,
			bulk_filter: None,
			input,
		})
	}

	/// Remote conditions selecting exactly the input records. When the
	/// options and the data source allow it the delete runs as one bulk job.
	pub fn with_bulk_filter(mut self, filter: Vec<RemoteCondition>) -> Self {
		self.bulk_filter = Some(filter);
		self
	}

	pub fn entity(&self) -> &str {
		&self.entity
	}

	#[instrument(level = "debug", skip_all, name = "mutate::delete::execute", fields(entity = %self.entity))]
	pub fn execute(&self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<usize> {
		check_filter(DmlOperation::Delete, self.filtered, ctx)?;
		let source = ctx.sources.get(&self.source)?;

		let mut keys = Vec::new();
		for row in drain(plan, self.input, ctx)? {
			let key = row[self.key_ordinal].clone();
			if key.is_null() {
				return_error!(null_key(&self.entity));
			}
			keys.push(key);
		}
		confirm(DmlOperation::Delete, &self.entity, keys.len(), ctx)?;

		let bulk = ctx.options.use_bulk_delete && source.capabilities().bulk_delete;
		let requests = match &self.bulk_filter {
			Some(filter) if bulk => {
				debug!(entity = %self.entity, records = keys.len(), "deleting in bulk");
				vec![DmlRequest::BulkDelete {
					entity: self.entity.clone(),
					filter: filter.clone(),
				}]
			}
			_ => {
				let size = batch_size(source.as_ref(), ctx);
				keys.chunks(size)
					.map(|chunk| DmlRequest::Delete {
						entity: self.entity.clone(),
						key: self.key.clone(),
						keys: chunk.to_vec(),
					})
					.collect()
			}
		};

		let written = dispatch(&source, requests, ctx)?;
		ctx.rowcount = written as i64;
		Ok(written)
	}
}
