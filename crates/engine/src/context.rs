// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	collections::HashMap,
	fmt::{Display, Formatter},
	sync::{
		Arc,
		atomic::{AtomicU64, Ordering},
	},
};

use quarry_core::{CancellationToken, DataSources, ExecutionOptions, Row};
use quarry_type::{
	Params, Type, Value,
	error::diagnostic::query::{parameter_not_bound, variable_already_declared, variable_not_declared},
	params::normalize_name,
	return_error,
	value::convert::cast,
};

use crate::{
	cursor::{CursorState, Cursors},
	vm::volcano::query::NodeId,
};

static EXECUTION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DmlOperation {
	Insert,
	Update,
	Delete,
}

impl Display for DmlOperation {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			DmlOperation::Insert => "INSERT",
			DmlOperation::Update => "UPDATE",
			DmlOperation::Delete => "DELETE",
		})
	}
}

/// Details handed to the confirmation callback before a DML statement
/// changes more records than its configured threshold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DmlConfirmation {
	pub operation: DmlOperation,
	pub entity: String,
	pub count: usize,
}

/// Returns `true` to let the statement proceed.
pub type ConfirmDml = Arc<dyn Fn(&DmlConfirmation) -> bool + Send + Sync>;

/// Declared `@variables` of a batch and their current values.
#[derive(Clone, Debug, Default)]
pub struct Variables {
	values: HashMap<String, (Type, Value)>,
}

impl Variables {
	pub fn declare(&mut self, name: &str, ty: Type) -> crate::Result<()> {
		let key = normalize_name(name);
		if self.values.contains_key(&key) {
			return_error!(variable_already_declared(name));
		}
		self.values.insert(key, (ty, Value::Null));
		Ok(())
	}

	/// Assigns a value, converting it to the declared type.
	pub fn set(&mut self, name: &str, value: &Value) -> crate::Result<()> {
		let Some((ty, slot)) = self.values.get_mut(&normalize_name(name)) else {
			return_error!(variable_not_declared(name));
		};
		*slot = cast(value, ty)?;
		Ok(())
	}

	pub fn get(&self, name: &str) -> crate::Result<&Value> {
		match self.values.get(&normalize_name(name)) {
			Some((_, value)) => Ok(value),
			None => return_error!(variable_not_declared(name)),
		}
	}

	pub fn type_of(&self, name: &str) -> Option<Type> {
		self.values.get(&normalize_name(name)).map(|(ty, _)| *ty)
	}

	pub fn is_declared(&self, name: &str) -> bool {
		self.values.contains_key(&normalize_name(name))
	}

	/// Declared variables and their types, in no particular order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, Type)> {
		self.values.iter().map(|(name, (ty, _))| (name.as_str(), *ty))
	}

	pub fn clear(&mut self) {
		self.values.clear();
	}
}

/// Per statement execution state shared by every operator of a plan.
pub struct ExecutionContext {
	execution_id: u64,
	pub options: ExecutionOptions,
	pub sources: DataSources,
	pub cancel: CancellationToken,
	pub variables: Variables,
	params: HashMap<String, Value>,
	/// Rows pushed by stack spools, keyed by plan and producer node.
	pub(crate) work_tables: HashMap<(u64, NodeId), Vec<Row>>,
	pub(crate) cursors: Cursors,
	pub(crate) rowcount: i64,
	pub(crate) fetch_status: i32,
	confirm: Option<ConfirmDml>,
}

impl ExecutionContext {
	pub fn new(sources: DataSources) -> Self {
		Self {
			execution_id: EXECUTION_ID.fetch_add(1, Ordering::Relaxed),
			options: ExecutionOptions::default(),
			sources,
			cancel: CancellationToken::new(),
			variables: Variables::default(),
			params: HashMap::new(),
			work_tables: HashMap::new(),
			cursors: Cursors::default(),
			rowcount: 0,
			fetch_status: -1,
			confirm: None,
		}
	}

	pub fn with_options(mut self, options: ExecutionOptions) -> Self {
		self.options = options;
		self
	}

	pub fn with_params(mut self, params: impl Into<Params>) -> Self {
		self.set_params(params.into());
		self
	}

	pub fn with_confirm(mut self, confirm: impl Fn(&DmlConfirmation) -> bool + Send + Sync + 'static) -> Self {
		self.confirm = Some(Arc::new(confirm));
		self
	}

	pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
		self.cancel = token;
		self
	}

	/// Identifier of the running statement execution. Operator caches are
	/// tagged with it and rebuilt once it changes.
	pub fn execution_id(&self) -> u64 {
		self.execution_id
	}

	/// Starts a new statement execution, invalidating operator caches.
	pub fn begin_execution(&mut self) -> u64 {
		self.execution_id = EXECUTION_ID.fetch_add(1, Ordering::Relaxed);
		self.work_tables.clear();
		self.execution_id
	}

	pub fn set_params(&mut self, params: Params) {
		self.params = params.into_named().into_iter().map(|(name, value)| (normalize_name(&name), value)).collect();
	}

	/// Binds a parameter and returns the value it replaced. Nested loops bind
	/// outer references this way.
	pub fn bind(&mut self, name: &str, value: Value) -> Option<Value> {
		self.params.insert(normalize_name(name), value)
	}

	/// Puts back what [`bind`](Self::bind) replaced; `None` unbinds.
	pub fn restore(&mut self, name: &str, previous: Option<Value>) {
		match previous {
			Some(value) => {
				self.params.insert(normalize_name(name), value);
			}
			None => {
				self.params.remove(&normalize_name(name));
			}
		}
	}

	pub fn param(&self, name: &str) -> crate::Result<&Value> {
		match self.params.get(&normalize_name(name)) {
			Some(value) => Ok(value),
			None => return_error!(parameter_not_bound(name)),
		}
	}

	pub fn params(&self) -> Params {
		Params::Named(self.params.clone())
	}

	/// `@@ROWCOUNT`
	pub fn rowcount(&self) -> i64 {
		self.rowcount
	}

	/// `@@FETCH_STATUS`
	pub fn fetch_status(&self) -> i32 {
		self.fetch_status
	}

	/// `CURSOR_STATUS`: `None` once the cursor is deallocated or was never
	/// declared.
	pub fn cursor_state(&self, name: &str) -> Option<CursorState> {
		self.cursors.state(name)
	}

	/// Asks the confirmation callback, if any, whether the DML may proceed.
	pub(crate) fn confirm(&self, confirmation: &DmlConfirmation) -> bool {
		match &self.confirm {
			Some(confirm) => confirm(confirmation),
			None => true,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_variables_convert_to_declared_type() {
		let mut variables = Variables::default();
		variables.declare("@count", Type::BigInt).unwrap();
		variables.set("@COUNT", &Value::Int(3)).unwrap();
		assert_eq!(variables.get("@count").unwrap(), &Value::BigInt(3));
	}

	#[test]
	fn test_variables_must_be_declared_once() {
		let mut variables = Variables::default();
		assert_eq!(variables.set("@x", &Value::Int(1)).unwrap_err().number(), 137);
		variables.declare("@x", Type::Int).unwrap();
		assert_eq!(variables.declare("@X", Type::Int).unwrap_err().number(), 134);
	}

	#[test]
	fn test_params_are_case_insensitive() {
		let ctx = ExecutionContext::new(DataSources::new()).with_params(quarry_type::params! { Id: 7 });
		assert_eq!(ctx.param("@id").unwrap(), &Value::Int(7));
		assert_eq!(ctx.param("@other").unwrap_err().number(), 137);
	}

	#[test]
	fn test_restore_puts_back_replaced_binding() {
		let mut ctx = ExecutionContext::new(DataSources::new()).with_params(quarry_type::params! { id: 1 });
		let previous = ctx.bind("@id", Value::Int(2));
		assert_eq!(previous, Some(Value::Int(1)));
		let unbound = ctx.bind("@other", Value::Int(3));
		assert_eq!(ctx.param("@id").unwrap(), &Value::Int(2));

		ctx.restore("@id", previous);
		ctx.restore("@other", unbound);
		assert_eq!(ctx.param("@id").unwrap(), &Value::Int(1));
		assert_eq!(ctx.param("@other").unwrap_err().number(), 137);
	}

	#[test]
	fn test_begin_execution_changes_id() {
		let mut ctx = ExecutionContext::new(DataSources::new());
		let first = ctx.execution_id();
		assert_ne!(ctx.begin_execution(), first);
	}
}
