// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Boundary to the remote record store.
//!
//! The store answers declarative, capability-limited queries: a single
//! entity, a column list, simple conditions, an optional order and row
//! limit. Everything beyond that is evaluated by the engine.

use std::{
	collections::HashMap,
	fmt::{Debug, Formatter},
	sync::Arc,
};

use quarry_type::{
	Params, Result, Value,
	error::diagnostic::remote::{data_source_not_found, native_query_unavailable},
	return_error,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{JoinType, row::Row, sort::SortKey};

/// What a data source can evaluate remotely and how it wants to be called.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
	/// Join types the store evaluates natively.
	pub joins: Vec<JoinType>,
	/// Whether a condition may compare two columns of the entity.
	pub column_comparison: bool,
	/// Largest number of records per DML request.
	pub batch_size: usize,
	/// Largest number of DML requests in flight at once.
	pub max_parallelism: usize,
	pub bulk_delete: bool,
	/// Whether [`DataSource::execute_native`] is available.
	pub native_query: bool,
	/// Number of records returned per fetched page.
	pub page_size: usize,
}

impl Default for Capabilities {
	fn default() -> Self {
		Self {
			joins: vec![JoinType::Inner, JoinType::LeftOuter],
			column_comparison: false,
			batch_size: 1000,
			max_parallelism: 4,
			bulk_delete: false,
			native_query: false,
			page_size: 5000,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionOperator {
	Equal,
	NotEqual,
	Less,
	LessOrEqual,
	Greater,
	GreaterOrEqual,
	Null,
	NotNull,
	Like,
	NotLike,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionValue {
	Literal(Value),
	/// Bound from the execution context right before the request is sent.
	Parameter(String),
	/// Another column of the same entity.
	Column(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteCondition {
	pub column: String,
	pub op: ConditionOperator,
	/// Absent for `Null` and `NotNull`.
	pub value: Option<ConditionValue>,
}

impl RemoteCondition {
	pub fn new(column: impl Into<String>, op: ConditionOperator, value: ConditionValue) -> Self {
		Self {
			column: column.into(),
			op,
			value: Some(value),
		}
	}

	pub fn equal(column: impl Into<String>, value: Value) -> Self {
		Self::new(column, ConditionOperator::Equal, ConditionValue::Literal(value))
	}

	pub fn is_null(column: impl Into<String>) -> Self {
		Self {
			column: column.into(),
			op: ConditionOperator::Null,
			value: None,
		}
	}

	pub fn compares_columns(&self) -> bool {
		matches!(self.value, Some(ConditionValue::Column(_)))
	}
}

/// A declarative query against a single entity. All conditions must hold.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteQuery {
	pub entity: String,
	pub alias: Option<String>,
	pub columns: Vec<String>,
	pub filter: Vec<RemoteCondition>,
	pub order: Vec<SortKey>,
	pub top: Option<usize>,
	pub distinct: bool,
}

impl RemoteQuery {
	pub fn new(entity: impl Into<String>, columns: Vec<String>) -> Self {
		Self {
			entity: entity.into(),
			alias: None,
			columns,
			filter: vec![],
			order: vec![],
			top: None,
			distinct: false,
		}
	}

	pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
		self.alias = Some(alias.into());
		self
	}

	pub fn with_condition(mut self, condition: RemoteCondition) -> Self {
		self.filter.push(condition);
		self
	}

	pub fn with_order(mut self, key: SortKey) -> Self {
		self.order.push(key);
		self
	}

	pub fn with_top(mut self, top: usize) -> Self {
		self.top = Some(top);
		self
	}

	pub fn with_distinct(mut self) -> Self {
		self.distinct = true;
		self
	}
}

/// One page of a fetch. `next` is the paging cookie of the following page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
	pub rows: Vec<Row>,
	pub next: Option<String>,
}

/// A single batch of record changes sent to the store.
#[derive(Clone, Debug, PartialEq)]
pub enum DmlRequest {
	Insert {
		entity: String,
		columns: Vec<String>,
		rows: Vec<Row>,
	},
	/// Sets `columns` on each record identified by its key value; every row
	/// holds the key followed by the new values.
	Update {
		entity: String,
		key: String,
		columns: Vec<String>,
		rows: Vec<Row>,
	},
	Delete {
		entity: String,
		key: String,
		keys: Vec<Value>,
	},
	/// Deletes every record matching the filter in one asynchronous job.
	BulkDelete {
		entity: String,
		filter: Vec<RemoteCondition>,
	},
}

impl DmlRequest {
	pub fn entity(&self) -> &str {
		match self {
			DmlRequest::Insert {
				entity,
				..
			}
			| DmlRequest::Update {
				entity,
				..
			}
			| DmlRequest::Delete {
				entity,
				..
			}
			| DmlRequest::BulkDelete {
				entity,
				..
			} => entity,
		}
	}

	/// Number of records addressed by the request; unknown for bulk deletes.
	pub fn len(&self) -> Option<usize> {
		match self {
			DmlRequest::Insert {
				rows,
				..
			}
			| DmlRequest::Update {
				rows,
				..
			} => Some(rows.len()),
			DmlRequest::Delete {
				keys,
				..
			} => Some(keys.len()),
			DmlRequest::BulkDelete {
				..
			} => None,
		}
	}
}

/// A named remote record store.
pub trait DataSource: Send + Sync {
	fn name(&self) -> &str;

	fn capabilities(&self) -> Capabilities;

	/// Approximate number of records of an entity, if the store knows it.
	fn estimate_record_count(&self, entity: &str) -> Result<Option<u64>>;

	/// Fetches one page of the query. `cookie` is `None` for the first page.
	fn fetch(&self, query: &RemoteQuery, cookie: Option<&str>) -> Result<Page>;

	/// Runs a SQL statement on the store's native query endpoint.
	fn execute_native(&self, _sql: &str, _params: &Params) -> Result<Vec<Row>> {
		return_error!(native_query_unavailable(self.name()))
	}

	/// Applies a batch of changes, returning the number of affected records.
	fn execute(&self, request: &DmlRequest) -> Result<usize>;
}

/// Registry of the data sources a session can reach, by case-insensitive
/// name.
#[derive(Clone, Default)]
pub struct DataSources {
	sources: HashMap<String, Arc<dyn DataSource>>,
}

impl DataSources {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, source: Arc<dyn DataSource>) {
		debug!(source = source.name(), "registered data source");
		self.sources.insert(source.name().to_lowercase(), source);
	}

	pub fn with(mut self, source: Arc<dyn DataSource>) -> Self {
		self.register(source);
		self
	}

	pub fn get(&self, name: &str) -> Result<Arc<dyn DataSource>> {
		match self.sources.get(&name.to_lowercase()) {
			Some(source) => Ok(source.clone()),
			None => return_error!(data_source_not_found(name)),
		}
	}

	pub fn names(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self.sources.values().map(|s| s.name()).collect();
		names.sort();
		names
	}
}

impl Debug for DataSources {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DataSources").field("sources", &self.names()).finish()
	}
}
