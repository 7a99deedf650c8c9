// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Expressions are compiled once per (expression, input schema, scope,
//! clause) into closures that evaluate a row at a time.

use std::{collections::HashMap, fmt::Debug, sync::Arc};

use indexmap::IndexMap;
use quarry_core::{Expression, Row, Schema};
use quarry_type::{
	Collation, Type, Value, error::diagnostic::collation::collation_conflict, params::normalize_name, return_error,
};
use xxhash_rust::xxh3::Xxh3;

use crate::context::ExecutionContext;

pub(crate) mod aggregate;
mod compile;
mod function;
pub(crate) mod like;

pub(crate) use compile::{CompileContext, compile_expression, require_boolean};

/// Runtime input of a compiled expression.
pub struct EvalContext<'a> {
	pub row: &'a Row,
	pub ctx: &'a ExecutionContext,
}

type EvalFn = dyn Fn(&EvalContext<'_>) -> crate::Result<Value> + Send + Sync;

/// How strongly a collation is attached to an expression. Stronger labels
/// win when two operands meet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Coercibility {
	/// Literals, variables and parameters.
	Default,
	/// Column references.
	Implicit,
	/// A COLLATE clause.
	Explicit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollationLabel {
	pub collation: Collation,
	pub coercibility: Coercibility,
}

impl CollationLabel {
	pub fn new(collation: Collation, coercibility: Coercibility) -> Self {
		Self {
			collation,
			coercibility,
		}
	}

	/// Collation of an operation combining two character operands. Two
	/// different collations of the same strength cannot be combined.
	pub fn derive(left: &CollationLabel, right: &CollationLabel, operation: &str) -> crate::Result<CollationLabel> {
		if left.coercibility != right.coercibility {
			return Ok(if left.coercibility > right.coercibility {
				left.clone()
			} else {
				right.clone()
			});
		}
		if left.collation.name().eq_ignore_ascii_case(right.collation.name())
			|| left.coercibility == Coercibility::Default
		{
			return Ok(left.clone());
		}
		return_error!(collation_conflict(left.collation.name(), right.collation.name(), operation))
	}
}

/// Clause an expression appears in; filters reject aggregate and window
/// functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Clause {
	Select,
	Filter,
}

#[derive(Clone)]
pub struct CompiledExpr {
	eval: Arc<EvalFn>,
	ty: Type,
	label: CollationLabel,
	constant: Option<Value>,
}

impl CompiledExpr {
	pub fn new(
		ty: Type,
		label: CollationLabel,
		eval: impl Fn(&EvalContext<'_>) -> crate::Result<Value> + Send + Sync + 'static,
	) -> Self {
		Self {
			eval: Arc::new(eval),
			ty,
			label,
			constant: None,
		}
	}

	pub fn constant(value: Value, label: CollationLabel) -> Self {
		let ty = quarry_type::GetType::get_type(&value);
		let captured = value.clone();
		Self {
			eval: Arc::new(move |_| Ok(captured.clone())),
			ty,
			label,
			constant: Some(value),
		}
	}

	pub fn evaluate(&self, row: &Row, ctx: &ExecutionContext) -> crate::Result<Value> {
		(self.eval)(&EvalContext {
			row,
			ctx,
		})
	}

	pub(crate) fn eval(&self, ec: &EvalContext<'_>) -> crate::Result<Value> {
		(self.eval)(ec)
	}

	/// Whether a predicate holds; unknown counts as false.
	pub fn test(&self, row: &Row, ctx: &ExecutionContext) -> crate::Result<bool> {
		Ok(self.evaluate(row, ctx)?.as_bool() == Some(true))
	}

	pub fn ty(&self) -> Type {
		self.ty
	}

	pub fn label(&self) -> &CollationLabel {
		&self.label
	}

	pub fn collation(&self) -> &Collation {
		&self.label.collation
	}

	/// The value of a constant expression.
	pub fn constant_value(&self) -> Option<&Value> {
		self.constant.as_ref()
	}
}

impl Debug for CompiledExpr {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CompiledExpr").field("ty", &self.ty).field("collation", &self.label).finish()
	}
}

/// Names and types visible to expressions besides the input columns.
#[derive(Clone, Debug, Default)]
pub struct Scope {
	variables: IndexMap<String, Type>,
	parameters: IndexMap<String, Type>,
	collation: Collation,
}

impl Scope {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_collation(mut self, collation: Collation) -> Self {
		self.collation = collation;
		self
	}

	pub fn declare_variable(&mut self, name: &str, ty: Type) {
		self.variables.insert(normalize_name(name), ty);
	}

	pub fn declare_parameter(&mut self, name: &str, ty: Type) {
		self.parameters.insert(normalize_name(name), ty);
	}

	pub fn variable(&self, name: &str) -> Option<Type> {
		self.variables.get(&normalize_name(name)).copied()
	}

	pub fn parameter(&self, name: &str) -> Option<Type> {
		self.parameters.get(&normalize_name(name)).copied()
	}

	pub fn variables(&self) -> impl Iterator<Item = (&str, Type)> {
		self.variables.iter().map(|(name, ty)| (name.as_str(), *ty))
	}

	pub fn collation(&self) -> &Collation {
		&self.collation
	}

	fn fingerprint(&self) -> u64 {
		let mut hasher = Xxh3::new();
		for (prefix, map) in [(b'v', &self.variables), (b'p', &self.parameters)] {
			for (name, ty) in map {
				hasher.update(&[prefix]);
				hasher.update(name.as_bytes());
				hasher.update(ty.to_string().as_bytes());
			}
		}
		hasher.update(self.collation.name().as_bytes());
		hasher.digest()
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CompileKey {
	expression: Expression,
	schema: u64,
	scope: u64,
	clause: Clause,
}

/// Compiles expressions against operator schemas, reusing earlier results
/// for identical inputs.
#[derive(Default)]
pub struct ExpressionCompiler {
	scope: Scope,
	cache: HashMap<CompileKey, CompiledExpr>,
}

impl ExpressionCompiler {
	pub fn new(scope: Scope) -> Self {
		Self {
			scope,
			cache: HashMap::new(),
		}
	}

	pub fn scope(&self) -> &Scope {
		&self.scope
	}

	pub fn scope_mut(&mut self) -> &mut Scope {
		&mut self.scope
	}

	pub fn compile(&mut self, expression: &Expression, schema: &Schema, clause: Clause) -> crate::Result<CompiledExpr> {
		let key = CompileKey {
			expression: expression.clone(),
			schema: schema.fingerprint(),
			scope: self.scope.fingerprint(),
			clause,
		};
		if let Some(compiled) = self.cache.get(&key) {
			return Ok(compiled.clone());
		}
		let compiled = compile_expression(
			&CompileContext {
				schema,
				scope: &self.scope,
				clause,
			},
			expression,
		)?;
		self.cache.insert(key, compiled.clone());
		Ok(compiled)
	}

	/// Number of distinct compilations performed so far.
	pub fn cached(&self) -> usize {
		self.cache.len()
	}
}
