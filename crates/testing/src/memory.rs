// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	cmp::Ordering,
	collections::{HashMap, HashSet},
	sync::Arc,
};

use parking_lot::{Mutex, RwLock};
use quarry_core::{
	Capabilities, Collation, ConditionOperator, ConditionValue, DataSource, DmlRequest, JoinType, Page, Params,
	RemoteCondition, RemoteQuery, Result, Row, Value,
};
use quarry_type::{
	KeyValue,
	error::diagnostic::remote::{incompatible_query, native_query_unavailable, request_failed},
	return_error,
};
use tracing::trace;

/// Answers `execute_native` calls.
pub type NativeHandler = Arc<dyn Fn(&str, &Params) -> Result<Vec<Row>> + Send + Sync>;

#[derive(Clone, Debug, PartialEq)]
enum Estimate {
	/// The current number of records.
	Actual,
	Fixed(Option<u64>),
}

/// Records of one entity, stored in column order.
#[derive(Clone, Debug)]
pub struct Entity {
	columns: Vec<String>,
	key: Option<String>,
	rows: Vec<Vec<Value>>,
	estimate: Estimate,
	collation: Collation,
}

impl Entity {
	pub fn new(columns: &[&str]) -> Self {
		Self {
			columns: columns.iter().map(|c| c.to_string()).collect(),
			key: None,
			rows: vec![],
			estimate: Estimate::Actual,
			collation: Collation::default(),
		}
	}

	pub fn with_key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());
		self
	}

	pub fn with_rows(mut self, rows: Vec<Vec<Value>>) -> Self {
		self.rows.extend(rows);
		self
	}

	/// Overrides the record count estimate; `None` means unknown.
	pub fn with_estimate(mut self, estimate: Option<u64>) -> Self {
		self.estimate = Estimate::Fixed(estimate);
		self
	}

	pub fn with_collation(mut self, collation: Collation) -> Self {
		self.collation = collation;
		self
	}

	pub fn key(&self) -> Option<&str> {
		self.key.as_deref()
	}

	pub fn rows(&self) -> &[Vec<Value>] {
		&self.rows
	}

	fn ordinal(&self, column: &str) -> Option<usize> {
		let column = column.rsplit_once('.').map_or(column, |(_, name)| name);
		self.columns.iter().position(|c| c.eq_ignore_ascii_case(column))
	}

	fn resolve(&self, source: &str, column: &str) -> Result<usize> {
		match self.ordinal(column) {
			Some(ordinal) => Ok(ordinal),
			None => return_error!(request_failed(source, &format!("unknown column '{}'", column))),
		}
	}

	fn matches(&self, source: &str, record: &[Value], filter: &[RemoteCondition]) -> Result<bool> {
		for condition in filter {
			let left = &record[self.resolve(source, &condition.column)?];
			let right = match &condition.value {
				None => None,
				Some(ConditionValue::Literal(value)) => Some(value),
				Some(ConditionValue::Column(column)) => Some(&record[self.resolve(source, column)?]),
				Some(ConditionValue::Parameter(name)) => {
					return_error!(request_failed(source, &format!("parameter '{}' was not bound", name)))
				}
			};
			if !self.test(condition.op, left, right) {
				return Ok(false);
			}
		}
		Ok(true)
	}

	fn test(&self, op: ConditionOperator, left: &Value, right: Option<&Value>) -> bool {
		let right = match (op, right) {
			(ConditionOperator::Null, _) => return left.is_null(),
			(ConditionOperator::NotNull, _) => return !left.is_null(),
			(_, None) => return false,
			(_, Some(right)) => right,
		};
		if left.is_null() || right.is_null() {
			return false;
		}
		let ordering = left.compare(right, &self.collation);
		match op {
			ConditionOperator::Equal => left.sql_equals(right, &self.collation) == Some(true),
			ConditionOperator::NotEqual => left.sql_equals(right, &self.collation) == Some(false),
			ConditionOperator::Less => ordering == Ordering::Less,
			ConditionOperator::LessOrEqual => ordering != Ordering::Greater,
			ConditionOperator::Greater => ordering == Ordering::Greater,
			ConditionOperator::GreaterOrEqual => ordering != Ordering::Less,
			ConditionOperator::Like | ConditionOperator::NotLike => {
				let (Some(value), Some(pattern)) = (left.as_str(), right.as_str()) else {
					return false;
				};
				let value: Vec<char> = self.collation.key(value).chars().collect();
				let pattern: Vec<char> = self.collation.key(pattern).chars().collect();
				like(&value, &pattern) == (op == ConditionOperator::Like)
			}
			ConditionOperator::Null | ConditionOperator::NotNull => false,
		}
	}
}

/// `%` and `_` wildcards only.
fn like(value: &[char], pattern: &[char]) -> bool {
	match pattern.split_first() {
		None => value.is_empty(),
		Some(('%', rest)) => (0..=value.len()).any(|i| like(&value[i..], rest)),
		Some(('_', rest)) => !value.is_empty() && like(&value[1..], rest),
		Some((c, rest)) => value.first() == Some(c) && like(&value[1..], rest),
	}
}

/// An in-memory record store for tests.
///
/// Queries are answered page by page with the offset of the next page as
/// the paging cookie. Every fetch and DML request is recorded so tests can
/// assert on what reached the store.
pub struct MemoryDataSource {
	name: String,
	capabilities: Capabilities,
	entities: RwLock<HashMap<String, Entity>>,
	native: Option<NativeHandler>,
	incompatible: Mutex<Option<String>>,
	/// Number of further DML requests that succeed before every request
	/// fails.
	dml_budget: Mutex<Option<usize>>,
	fetches: Mutex<Vec<RemoteQuery>>,
	requests: Mutex<Vec<DmlRequest>>,
}

impl MemoryDataSource {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			capabilities: Capabilities::default(),
			entities: RwLock::new(HashMap::new()),
			native: None,
			incompatible: Mutex::new(None),
			dml_budget: Mutex::new(None),
			fetches: Mutex::new(vec![]),
			requests: Mutex::new(vec![]),
		}
	}

	pub fn with_entity(self, name: impl Into<String>, entity: Entity) -> Self {
		self.entities.write().insert(name.into().to_lowercase(), entity);
		self
	}

	pub fn with_page_size(mut self, page_size: usize) -> Self {
		self.capabilities.page_size = page_size.max(1);
		self
	}

	pub fn with_batch_size(mut self, batch_size: usize) -> Self {
		self.capabilities.batch_size = batch_size;
		self
	}

	pub fn with_max_parallelism(mut self, max_parallelism: usize) -> Self {
		self.capabilities.max_parallelism = max_parallelism;
		self
	}

	pub fn with_bulk_delete(mut self) -> Self {
		self.capabilities.bulk_delete = true;
		self
	}

	pub fn with_column_comparison(mut self) -> Self {
		self.capabilities.column_comparison = true;
		self
	}

	pub fn with_joins(mut self, joins: Vec<JoinType>) -> Self {
		self.capabilities.joins = joins;
		self
	}

	pub fn with_native(mut self, handler: impl Fn(&str, &Params) -> Result<Vec<Row>> + Send + Sync + 'static) -> Self {
		self.capabilities.native_query = true;
		self.native = Some(Arc::new(handler));
		self
	}

	/// Makes every following fetch fail as incompatible with `reason`, or
	/// accepts queries again with `None`.
	pub fn set_incompatible(&self, reason: Option<&str>) {
		*self.incompatible.lock() = reason.map(str::to_string);
	}

	/// Lets `count` more DML requests succeed; the ones after fail.
	pub fn fail_dml_after(&self, count: usize) {
		*self.dml_budget.lock() = Some(count);
	}

	/// Queries fetched so far, one entry per page.
	pub fn fetches(&self) -> Vec<RemoteQuery> {
		self.fetches.lock().clone()
	}

	pub fn fetch_count(&self, entity: &str) -> usize {
		self.fetches.lock().iter().filter(|q| q.entity.eq_ignore_ascii_case(entity)).count()
	}

	/// DML requests received so far, rejected ones included.
	pub fn requests(&self) -> Vec<DmlRequest> {
		self.requests.lock().clone()
	}

	pub fn reset_counters(&self) {
		self.fetches.lock().clear();
		self.requests.lock().clear();
	}

	/// Current records of an entity.
	pub fn records(&self, entity: &str) -> Vec<Vec<Value>> {
		self.entities.read().get(&entity.to_lowercase()).map(|e| e.rows.clone()).unwrap_or_default()
	}

	fn take_budget(&self) -> Result<()> {
		let mut budget = self.dml_budget.lock();
		match budget.as_mut() {
			Some(0) => return_error!(request_failed(&self.name, "the store rejected the request")),
			Some(remaining) => *remaining -= 1,
			None => {}
		}
		Ok(())
	}
}

impl DataSource for MemoryDataSource {
	fn name(&self) -> &str {
		&self.name
	}

	fn capabilities(&self) -> Capabilities {
		self.capabilities.clone()
	}

	fn estimate_record_count(&self, entity: &str) -> Result<Option<u64>> {
		let entities = self.entities.read();
		let Some(entity) = entities.get(&entity.to_lowercase()) else {
			return Ok(None);
		};
		Ok(match entity.estimate {
			Estimate::Actual => Some(entity.rows.len() as u64),
			Estimate::Fixed(estimate) => estimate,
		})
	}

	fn fetch(&self, query: &RemoteQuery, cookie: Option<&str>) -> Result<Page> {
		if let Some(reason) = self.incompatible.lock().as_deref() {
			return_error!(incompatible_query(&self.name, reason));
		}
		self.fetches.lock().push(query.clone());

		let entities = self.entities.read();
		let Some(entity) = entities.get(&query.entity.to_lowercase()) else {
			return_error!(request_failed(&self.name, &format!("unknown entity '{}'", query.entity)));
		};

		let projection =
			query.columns.iter().map(|c| entity.resolve(&self.name, c)).collect::<Result<Vec<_>>>()?;
		let order = query
			.order
			.iter()
			.map(|key| Ok((entity.resolve(&self.name, &key.column)?, key.direction)))
			.collect::<Result<Vec<_>>>()?;

		let mut records = Vec::new();
		for record in &entity.rows {
			if entity.matches(&self.name, record, &query.filter)? {
				records.push(record);
			}
		}
		records.sort_by(|a, b| {
			order.iter()
				.map(|(ordinal, direction)| {
					direction.apply(a[*ordinal].compare(&b[*ordinal], &entity.collation))
				})
				.find(|o| *o != Ordering::Equal)
				.unwrap_or(Ordering::Equal)
		});

		let mut rows: Vec<Row> =
			records.iter().map(|record| projection.iter().map(|&i| record[i].clone()).collect()).collect();
		if query.distinct {
			let collations = vec![entity.collation.clone(); projection.len()];
			let mut seen = HashSet::new();
			rows.retain(|row| seen.insert(KeyValue::row(row.values(), &collations)));
		}
		if let Some(top) = query.top {
			rows.truncate(top);
		}

		let offset = match cookie {
			None => 0,
			Some(cookie) => match cookie.parse::<usize>() {
				Ok(offset) => offset,
				Err(_) => return_error!(request_failed(&self.name, &format!("invalid paging cookie '{}'", cookie))),
			},
		};
		let end = (offset + self.capabilities.page_size).min(rows.len());
		let next = (end < rows.len()).then(|| end.to_string());
		trace!(entity = %query.entity, offset, end, "serving page");
		Ok(Page {
			rows: rows.get(offset..end).map(<[Row]>::to_vec).unwrap_or_default(),
			next,
		})
	}

	fn execute_native(&self, sql: &str, params: &Params) -> Result<Vec<Row>> {
		match &self.native {
			Some(handler) => handler(sql, params),
			None => return_error!(native_query_unavailable(&self.name)),
		}
	}

	fn execute(&self, request: &DmlRequest) -> Result<usize> {
		self.requests.lock().push(request.clone());
		self.take_budget()?;

		let mut entities = self.entities.write();
		let Some(entity) = entities.get_mut(&request.entity().to_lowercase()) else {
			return_error!(request_failed(&self.name, &format!("unknown entity '{}'", request.entity())));
		};

		match request {
			DmlRequest::Insert {
				columns,
				rows,
				..
			} => {
				let ordinals =
					columns.iter().map(|c| entity.resolve(&self.name, c)).collect::<Result<Vec<_>>>()?;
				for row in rows {
					let mut record = vec![Value::Null; entity.columns.len()];
					for (ordinal, value) in ordinals.iter().zip(row.iter()) {
						record[*ordinal] = value.clone();
					}
					entity.rows.push(record);
				}
				Ok(rows.len())
			}
			DmlRequest::Update {
				key,
				columns,
				rows,
				..
			} => {
				let key = entity.resolve(&self.name, key)?;
				let ordinals =
					columns.iter().map(|c| entity.resolve(&self.name, c)).collect::<Result<Vec<_>>>()?;
				let mut updated = 0;
				for change in rows {
					let collation = entity.collation.clone();
					let matching =
						entity.rows.iter_mut().filter(|r| r[key].sql_equals(&change[0], &collation) == Some(true));
					for record in matching {
						for (ordinal, value) in ordinals.iter().zip(change.iter().skip(1)) {
							record[*ordinal] = value.clone();
						}
						updated += 1;
					}
				}
				Ok(updated)
			}
			DmlRequest::Delete {
				key,
				keys,
				..
			} => {
				let key = entity.resolve(&self.name, key)?;
				let collation = entity.collation.clone();
				let before = entity.rows.len();
				entity.rows.retain(|r| !keys.iter().any(|k| r[key].sql_equals(k, &collation) == Some(true)));
				Ok(before - entity.rows.len())
			}
			DmlRequest::BulkDelete {
				filter,
				..
			} => {
				let mut keep = Vec::with_capacity(entity.rows.len());
				for record in &entity.rows {
					keep.push(!entity.matches(&self.name, record, filter)?);
				}
				let before = entity.rows.len();
				let mut keep = keep.into_iter();
				entity.rows.retain(|_| keep.next().unwrap_or(true));
				Ok(before - entity.rows.len())
			}
		}
	}
}
