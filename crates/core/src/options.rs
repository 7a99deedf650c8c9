// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_type::{Collation, Result};
use serde::{Deserialize, Serialize};

/// Settings a statement executes with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionOptions {
	/// Reject UPDATE statements without a WHERE clause.
	pub block_update_without_where: bool,
	/// Reject DELETE statements without a WHERE clause.
	pub block_delete_without_where: bool,
	/// Records per DML request; the data source's own limit applies when
	/// lower.
	pub batch_size: usize,
	/// DML requests in flight at once; the data source's own limit applies
	/// when lower.
	pub max_degree_of_parallelism: usize,
	pub use_bulk_delete: bool,
	/// Prefer the store's native query endpoint over declarative queries.
	pub use_native_query_endpoint: bool,
	/// Ask for confirmation when an INSERT affects more records than this.
	pub insert_confirm_threshold: usize,
	pub update_confirm_threshold: usize,
	pub delete_confirm_threshold: usize,
	pub quoted_identifiers: bool,
	pub user_id: Option<String>,
	pub default_collation: String,
	/// Default recursion limit of recursive common table expressions; 0
	/// means unlimited.
	pub max_recursion: u32,
}

impl Default for ExecutionOptions {
	fn default() -> Self {
		Self {
			block_update_without_where: true,
			block_delete_without_where: true,
			batch_size: 100,
			max_degree_of_parallelism: 10,
			use_bulk_delete: false,
			use_native_query_endpoint: false,
			insert_confirm_threshold: 1,
			update_confirm_threshold: 1,
			delete_confirm_threshold: 1,
			quoted_identifiers: true,
			user_id: None,
			default_collation: quarry_type::DEFAULT_COLLATION.to_string(),
			max_recursion: 100,
		}
	}
}

impl ExecutionOptions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Loads options from JSON; absent fields keep their defaults.
	pub fn from_json(json: &str) -> serde_json::Result<Self> {
		serde_json::from_str(json)
	}

	pub fn to_json(&self) -> serde_json::Result<String> {
		serde_json::to_string_pretty(self)
	}

	pub fn collation(&self) -> Result<Collation> {
		Ok(Collation::parse(&self.default_collation)?)
	}

	pub fn block_update_without_where(mut self, block: bool) -> Self {
		self.block_update_without_where = block;
		self
	}

	pub fn block_delete_without_where(mut self, block: bool) -> Self {
		self.block_delete_without_where = block;
		self
	}

	pub fn batch_size(mut self, size: usize) -> Self {
		self.batch_size = size.max(1);
		self
	}

	pub fn max_degree_of_parallelism(mut self, dop: usize) -> Self {
		self.max_degree_of_parallelism = dop.max(1);
		self
	}

	pub fn use_bulk_delete(mut self, enabled: bool) -> Self {
		self.use_bulk_delete = enabled;
		self
	}

	pub fn use_native_query_endpoint(mut self, enabled: bool) -> Self {
		self.use_native_query_endpoint = enabled;
		self
	}

	pub fn insert_confirm_threshold(mut self, threshold: usize) -> Self {
		self.insert_confirm_threshold = threshold;
		self
	}

	pub fn update_confirm_threshold(mut self, threshold: usize) -> Self {
		self.update_confirm_threshold = threshold;
		self
	}

	pub fn delete_confirm_threshold(mut self, threshold: usize) -> Self {
		self.delete_confirm_threshold = threshold;
		self
	}

	pub fn quoted_identifiers(mut self, enabled: bool) -> Self {
		self.quoted_identifiers = enabled;
		self
	}

	pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
		self.user_id = Some(user_id.into());
		self
	}

	pub fn default_collation(mut self, collation: impl Into<String>) -> Self {
		self.default_collation = collation.into();
		self
	}

	pub fn max_recursion(mut self, max: u32) -> Self {
		self.max_recursion = max;
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_from_json_keeps_defaults() {
		let options = ExecutionOptions::from_json(r#"{ "batch_size": 25, "use_bulk_delete": true }"#).unwrap();
		assert_eq!(options.batch_size, 25);
		assert!(options.use_bulk_delete);
		assert_eq!(options.max_recursion, 100);
		assert!(options.block_delete_without_where);
	}

	#[test]
	fn test_json_round_trip() {
		let options = ExecutionOptions::new().max_recursion(0).user_id("alice");
		let json = options.to_json().unwrap();
		assert_eq!(ExecutionOptions::from_json(&json).unwrap(), options);
	}

	#[test]
	fn test_invalid_default_collation() {
		let options = ExecutionOptions::new().default_collation("Klingon_CI_AS");
		assert_eq!(options.collation().unwrap_err().number(), 448);
	}

	#[test]
	fn test_builder_clamps_to_one() {
		let options = ExecutionOptions::new().batch_size(0).max_degree_of_parallelism(0);
		assert_eq!(options.batch_size, 1);
		assert_eq!(options.max_degree_of_parallelism, 1);
	}
}
