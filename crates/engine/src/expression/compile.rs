// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{cmp::Ordering, sync::Arc};

use quarry_core::{
	Expression, Schema,
	expression::{BinaryOp, UnaryOp},
};
use quarry_type::{
	ArithmeticOp, Collation, GetType, Type, Value, err,
	error::diagnostic::{
		cast::{invalid_operand_for_operator, unsupported_conversion},
		internal::internal,
		plan::{aggregate_not_allowed, aggregate_outside_grouping, window_function_not_allowed},
		query::{non_boolean_predicate, variable_not_declared},
	},
	return_error,
	value::{
		arith::{apply, negate},
		convert::{cast, try_cast},
	},
};

use super::{
	Clause, CollationLabel, Coercibility, CompiledExpr, Scope, function::compile_call, like::LikePattern,
};

pub(crate) struct CompileContext<'a> {
	pub schema: &'a Schema,
	pub scope: &'a Scope,
	pub clause: Clause,
}

impl CompileContext<'_> {
	/// Label of literals, variables and parameters.
	pub(crate) fn coercible(&self) -> CollationLabel {
		CollationLabel::new(self.scope.collation().clone(), Coercibility::Default)
	}
}

pub(crate) fn compile_expression(cx: &CompileContext, expr: &Expression) -> crate::Result<CompiledExpr> {
	match expr {
		Expression::Constant(value) => Ok(CompiledExpr::constant(value.clone(), cx.coercible())),
		Expression::Column(name) => {
			let ordinal = cx.schema.resolve(name)?;
			let column = &cx.schema.columns()[ordinal];
			let label = if column.ty.is_character() {
				CollationLabel::new(column.collation().clone(), Coercibility::Implicit)
			} else {
				cx.coercible()
			};
			Ok(CompiledExpr::new(column.ty, label, move |ec| {
				Ok(ec.row.get(ordinal).cloned().unwrap_or(Value::Null))
			}))
		}
		Expression::Variable(name) => {
			let Some(ty) = cx.scope.variable(name) else {
				return_error!(variable_not_declared(name));
			};
			let name = name.clone();
			Ok(CompiledExpr::new(ty, cx.coercible(), move |ec| Ok(ec.ctx.variables.get(&name)?.clone())))
		}
		Expression::Parameter(name) => {
			// parameters of unknown type compare by their runtime value
			let ty = cx.scope.parameter(name).unwrap_or(Type::Variant);
			let name = name.clone();
			Ok(CompiledExpr::new(ty, cx.coercible(), move |ec| Ok(ec.ctx.param(&name)?.clone())))
		}
		Expression::Unary {
			op,
			operand,
		} => unary(*op, compile_expression(cx, operand)?),
		Expression::Binary {
			op,
			left,
			right,
		} => {
			let left = compile_expression(cx, left)?;
			let right = compile_expression(cx, right)?;
			binary(cx, *op, left, right)
		}
		Expression::IsNull {
			operand,
			negated,
		} => {
			let operand = compile_expression(cx, operand)?;
			let negated = *negated;
			Ok(CompiledExpr::new(Type::Bit, cx.coercible(), move |ec| {
				Ok(Value::Boolean(operand.eval(ec)?.is_null() != negated))
			}))
		}
		Expression::InList {
			operand,
			list,
			negated,
		} => in_list(cx, operand, list, *negated),
		Expression::Between {
			operand,
			low,
			high,
			negated,
		} => {
			let lower = Expression::binary(BinaryOp::GreaterOrEqual, (**operand).clone(), (**low).clone());
			let upper = Expression::binary(BinaryOp::LessOrEqual, (**operand).clone(), (**high).clone());
			let range = Expression::and(lower, upper);
			compile_expression(
				cx,
				&if *negated {
					Expression::not(range)
				} else {
					range
				},
			)
		}
		Expression::Like {
			operand,
			pattern,
			escape,
			negated,
		} => like(cx, operand, pattern, escape.as_deref(), *negated),
		Expression::Case {
			operand,
			branches,
			otherwise,
		} => case(cx, operand.as_deref(), branches, otherwise.as_deref()),
		Expression::Cast {
			operand,
			ty,
			try_cast: lenient,
		} => {
			let inner = compile_expression(cx, operand)?;
			let from = inner.ty();
			if !from.is_explicitly_convertible_to(ty) {
				return_error!(unsupported_conversion(&from, ty));
			}
			let label = if ty.is_character() && from.is_character() {
				inner.label().clone()
			} else {
				cx.coercible()
			};
			let target = *ty;
			let lenient = *lenient;
			Ok(CompiledExpr::new(target, label, move |ec| {
				let value = inner.eval(ec)?;
				if lenient {
					try_cast(&value, &target)
				} else {
					cast(&value, &target)
				}
			}))
		}
		Expression::Collate {
			operand,
			collation,
		} => {
			let collation = Collation::parse(collation)?;
			let inner = compile_expression(cx, operand)?;
			let ty = inner.ty();
			if !(ty.is_character() || matches!(ty, Type::Null | Type::Variant)) {
				return_error!(invalid_operand_for_operator(&ty, "COLLATE"));
			}
			Ok(CompiledExpr::new(ty, CollationLabel::new(collation, Coercibility::Explicit), move |ec| {
				inner.eval(ec)
			}))
		}
		Expression::Call {
			function,
			arguments,
		} => compile_call(cx, function, arguments),
		Expression::Aggregate(_) => match cx.clause {
			Clause::Filter => err!(aggregate_not_allowed()),
			Clause::Select => err!(aggregate_outside_grouping()),
		},
		Expression::Window(_) => match cx.clause {
			Clause::Filter => err!(window_function_not_allowed()),
			Clause::Select => err!(internal("window functions are evaluated by the window operator")),
		},
	}
}

pub(crate) fn require_boolean(expr: &CompiledExpr) -> crate::Result<()> {
	match expr.ty() {
		Type::Bit | Type::Null | Type::Variant => Ok(()),
		other => err!(non_boolean_predicate(&other)),
	}
}

/// Character form of a value; NULL stays `None`.
pub(crate) fn text(value: &Value) -> crate::Result<Option<String>> {
	match value.unwrap_variant() {
		Value::Null => Ok(None),
		Value::VarChar(s) | Value::NVarChar(s) => Ok(Some(s.clone())),
		other => Ok(cast(other, &Type::NVarChar)?.as_str().map(str::to_string)),
	}
}

/// The conversion applied to an operand before it meets a value of type
/// `common`.
fn conversion(from: Type, common: Type) -> Option<Type> {
	(from != common && from != Type::Null && common != Type::Variant).then_some(common)
}

fn convert(value: Value, target: Option<Type>) -> crate::Result<Value> {
	match target {
		Some(ty) if !value.is_null() => cast(&value, &ty),
		_ => Ok(value),
	}
}

fn operation_name(op: BinaryOp) -> &'static str {
	match op {
		BinaryOp::Equal => "equal to",
		BinaryOp::NotEqual => "not equal to",
		BinaryOp::Less => "less than",
		BinaryOp::LessOrEqual => "less than or equal to",
		BinaryOp::Greater => "greater than",
		BinaryOp::GreaterOrEqual => "greater than or equal to",
		BinaryOp::Add => "add",
		_ => "operator",
	}
}

fn arithmetic_op(op: BinaryOp) -> Option<ArithmeticOp> {
	Some(match op {
		BinaryOp::Add => ArithmeticOp::Add,
		BinaryOp::Subtract => ArithmeticOp::Subtract,
		BinaryOp::Multiply => ArithmeticOp::Multiply,
		BinaryOp::Divide => ArithmeticOp::Divide,
		BinaryOp::Modulo => ArithmeticOp::Modulo,
		_ => return None,
	})
}

/// Collation two operands are compared or combined under.
fn combined_label(
	cx: &CompileContext,
	left: &CompiledExpr,
	right: &CompiledExpr,
	operation: &str,
) -> crate::Result<CollationLabel> {
	match (left.ty().is_character(), right.ty().is_character()) {
		(true, true) => CollationLabel::derive(left.label(), right.label(), operation),
		(true, false) => Ok(left.label().clone()),
		(false, true) => Ok(right.label().clone()),
		(false, false) => Ok(cx.coercible()),
	}
}

fn unary(op: UnaryOp, operand: CompiledExpr) -> crate::Result<CompiledExpr> {
	let ty = operand.ty();
	match op {
		UnaryOp::Not => {
			require_boolean(&operand)?;
			let label = operand.label().clone();
			Ok(CompiledExpr::new(Type::Bit, label, move |ec| {
				Ok(match operand.eval(ec)?.as_bool() {
					Some(b) => Value::Boolean(!b),
					None => Value::Null,
				})
			}))
		}
		UnaryOp::Negate | UnaryOp::Plus => {
			if !(ty.is_numeric() || matches!(ty, Type::Null | Type::Variant)) {
				return_error!(invalid_operand_for_operator(&ty, "negate"));
			}
			let label = operand.label().clone();
			if op == UnaryOp::Plus {
				return Ok(operand);
			}
			let result = match ty {
				Type::Null => Type::Int,
				Type::TinyInt => Type::SmallInt,
				other => other,
			};
			Ok(CompiledExpr::new(result, label, move |ec| negate(&operand.eval(ec)?)))
		}
	}
}

pub(crate) fn binary(
	cx: &CompileContext,
	op: BinaryOp,
	left: CompiledExpr,
	right: CompiledExpr,
) -> crate::Result<CompiledExpr> {
	if let Some(arithmetic) = arithmetic_op(op) {
		if left.ty() == Type::Variant || right.ty() == Type::Variant {
			// operand types are only known per row
			return Ok(CompiledExpr::new(Type::Variant, cx.coercible(), move |ec| {
				let l = left.eval(ec)?;
				let r = right.eval(ec)?;
				if l.is_null() || r.is_null() {
					return Ok(Value::Null);
				}
				let result = Type::arithmetic(arithmetic, &l.get_type(), &r.get_type())?;
				apply(arithmetic, &l, &r, &result)
			}));
		}
		let result = Type::arithmetic(arithmetic, &left.ty(), &right.ty())?;
		let label = if result.is_character() {
			combined_label(cx, &left, &right, operation_name(op))?
		} else {
			cx.coercible()
		};
		return Ok(CompiledExpr::new(result, label, move |ec| {
			let l = left.eval(ec)?;
			if l.is_null() {
				return Ok(Value::Null);
			}
			let r = right.eval(ec)?;
			apply(arithmetic, &l, &r, &result)
		}));
	}

	if op.is_logical() {
		require_boolean(&left)?;
		require_boolean(&right)?;
		let label = cx.coercible();
		return Ok(CompiledExpr::new(Type::Bit, label, move |ec| {
			let l = left.eval(ec)?.as_bool();
			let value = match (op, l) {
				(BinaryOp::And, Some(false)) => Some(false),
				(BinaryOp::Or, Some(true)) => Some(true),
				_ => {
					let r = right.eval(ec)?.as_bool();
					match (op, l, r) {
						(BinaryOp::And, _, Some(false)) => Some(false),
						(BinaryOp::And, Some(true), Some(true)) => Some(true),
						(BinaryOp::Or, _, Some(true)) => Some(true),
						(BinaryOp::Or, Some(false), Some(false)) => Some(false),
						_ => None,
					}
				}
			};
			Ok(value.map(Value::Boolean).unwrap_or(Value::Null))
		}));
	}

	let comparison = Comparison::new(cx, &left, &right, operation_name(op))?;
	Ok(CompiledExpr::new(Type::Bit, cx.coercible(), move |ec| {
		let l = left.eval(ec)?;
		if l.is_null() {
			return Ok(Value::Null);
		}
		let r = right.eval(ec)?;
		Ok(match comparison.compare(l, r)? {
			None => Value::Null,
			Some(ordering) => Value::Boolean(match op {
				BinaryOp::Equal => ordering == Ordering::Equal,
				BinaryOp::NotEqual => ordering != Ordering::Equal,
				BinaryOp::Less => ordering == Ordering::Less,
				BinaryOp::LessOrEqual => ordering != Ordering::Greater,
				BinaryOp::Greater => ordering == Ordering::Greater,
				_ => ordering != Ordering::Less,
			}),
		})
	}))
}

/// Implicit conversions and collation of a comparison between two operand
/// types.
#[derive(Clone)]
struct Comparison {
	left: Option<Type>,
	right: Option<Type>,
	collation: Collation,
}

impl Comparison {
	fn new(cx: &CompileContext, left: &CompiledExpr, right: &CompiledExpr, operation: &str) -> crate::Result<Self> {
		let common = Type::common(&left.ty(), &right.ty())?;
		let collation = combined_label(cx, left, right, operation)?.collation;
		Ok(Self {
			left: conversion(left.ty(), common),
			right: conversion(right.ty(), common),
			collation,
		})
	}

	/// Ordering of two values; `None` when either is NULL.
	fn compare(&self, left: Value, right: Value) -> crate::Result<Option<Ordering>> {
		if left.is_null() || right.is_null() {
			return Ok(None);
		}
		let left = convert(left, self.left)?;
		let right = convert(right, self.right)?;
		Ok(Some(left.compare(&right, &self.collation)))
	}
}

fn in_list(cx: &CompileContext, operand: &Expression, list: &[Expression], negated: bool) -> crate::Result<CompiledExpr> {
	let operand = compile_expression(cx, operand)?;
	let items = list
		.iter()
		.map(|item| {
			let item = compile_expression(cx, item)?;
			let comparison = Comparison::new(cx, &operand, &item, "equal to")?;
			Ok((item, comparison))
		})
		.collect::<crate::Result<Vec<_>>>()?;

	Ok(CompiledExpr::new(Type::Bit, cx.coercible(), move |ec| {
		let value = operand.eval(ec)?;
		if value.is_null() {
			return Ok(Value::Null);
		}
		let mut unknown = false;
		for (item, comparison) in &items {
			match comparison.compare(value.clone(), item.eval(ec)?)? {
				Some(Ordering::Equal) => return Ok(Value::Boolean(!negated)),
				Some(_) => {}
				None => unknown = true,
			}
		}
		Ok(if unknown {
			Value::Null
		} else {
			Value::Boolean(negated)
		})
	}))
}

fn like(
	cx: &CompileContext,
	operand: &Expression,
	pattern: &Expression,
	escape: Option<&Expression>,
	negated: bool,
) -> crate::Result<CompiledExpr> {
	let operand = compile_expression(cx, operand)?;
	let pattern = compile_expression(cx, pattern)?;
	let escape = escape.map(|e| compile_expression(cx, e)).transpose()?;
	let collation = combined_label(cx, &operand, &pattern, "like")?.collation;

	let prepared = match (pattern.constant_value(), &escape) {
		(Some(value), None) => text(value)?.map(|p| Arc::new(LikePattern::new(&p, None, &collation))),
		_ => None,
	};

	Ok(CompiledExpr::new(Type::Bit, cx.coercible(), move |ec| {
		let Some(value) = text(&operand.eval(ec)?)? else {
			return Ok(Value::Null);
		};
		let matched = match &prepared {
			Some(prepared) => prepared.matches(&value),
			None => {
				let Some(pattern) = text(&pattern.eval(ec)?)? else {
					return Ok(Value::Null);
				};
				let escape = match &escape {
					Some(escape) => match text(&escape.eval(ec)?)? {
						Some(e) => e.chars().next(),
						None => return Ok(Value::Null),
					},
					None => None,
				};
				LikePattern::new(&pattern, escape, &collation).matches(&value)
			}
		};
		Ok(Value::Boolean(matched != negated))
	}))
}

fn case(
	cx: &CompileContext,
	operand: Option<&Expression>,
	branches: &[(Expression, Expression)],
	otherwise: Option<&Expression>,
) -> crate::Result<CompiledExpr> {
	let mut arms = Vec::with_capacity(branches.len());
	for (when, then) in branches {
		let condition = match operand {
			Some(operand) => compile_expression(cx, &Expression::equal(operand.clone(), when.clone()))?,
			None => compile_expression(cx, when)?,
		};
		require_boolean(&condition)?;
		arms.push((condition, compile_expression(cx, then)?));
	}
	let otherwise = otherwise.map(|e| compile_expression(cx, e)).transpose()?;

	let mut ty = Type::Null;
	let mut label: Option<CollationLabel> = None;
	for result in arms.iter().map(|(_, then)| then).chain(otherwise.iter()) {
		ty = Type::common(&ty, &result.ty())?;
		if result.ty().is_character() {
			label = Some(match label {
				Some(current) => {
					CollationLabel::derive(&current, result.label(), "CASE").unwrap_or(current)
				}
				None => result.label().clone(),
			});
		}
	}
	let label = label.unwrap_or_else(|| cx.coercible());

	Ok(CompiledExpr::new(ty, label, move |ec| {
		for (condition, then) in &arms {
			if condition.eval(ec)?.as_bool() == Some(true) {
				return cast(&then.eval(ec)?, &ty);
			}
		}
		match &otherwise {
			Some(otherwise) => cast(&otherwise.eval(ec)?, &ty),
			None => Ok(Value::Null),
		}
	}))
}

#[cfg(test)]
mod tests {
	use quarry_core::{
		ColumnDef, DataSources, Row,
		expression::{AggregateCall, AggregateFunction, WindowCall, WindowFunction},
		row,
	};

	use super::*;
	use crate::{context::ExecutionContext, expression::ExpressionCompiler};

	fn schema() -> Schema {
		Schema::new(vec![
			ColumnDef::new("id", Type::Int),
			ColumnDef::new("name", Type::NVarChar),
			ColumnDef::new("price", Type::decimal(10, 2)),
			ColumnDef::new("code", Type::VarChar).with_collation(Collation::parse("Latin1_General_CS_AS").unwrap()),
		])
	}

	fn eval(expr: Expression, row: &Row) -> crate::Result<Value> {
		let mut compiler = ExpressionCompiler::default();
		let compiled = compiler.compile(&expr, &schema(), Clause::Select)?;
		compiled.evaluate(row, &ExecutionContext::new(DataSources::new()))
	}

	fn sample() -> Row {
		row![7, "Widget", Value::Decimal(quarry_type::Decimal::parse("12.50").unwrap()), Value::varchar("AbC")]
	}

	#[test]
	fn test_integer_division_truncates() {
		let expr = Expression::binary(BinaryOp::Divide, Expression::column("id"), Expression::constant(2));
		assert_eq!(eval(expr, &sample()).unwrap(), Value::Int(3));
	}

	#[test]
	fn test_divide_by_zero() {
		let expr = Expression::binary(BinaryOp::Divide, Expression::column("id"), Expression::constant(0));
		assert_eq!(eval(expr, &sample()).unwrap_err().number(), 8134);
	}

	#[test]
	fn test_comparison_widens_operands() {
		let expr = Expression::binary(BinaryOp::Greater, Expression::column("price"), Expression::constant(12));
		assert_eq!(eval(expr, &sample()).unwrap(), Value::Boolean(true));
	}

	#[test]
	fn test_null_comparison_is_unknown() {
		let expr = Expression::equal(Expression::null(), Expression::null());
		assert_eq!(eval(expr, &sample()).unwrap(), Value::Null);
	}

	#[test]
	fn test_three_valued_logic() {
		let unknown = Expression::equal(Expression::column("id"), Expression::null());
		let and = Expression::and(unknown.clone(), Expression::constant(false));
		assert_eq!(eval(and, &sample()).unwrap(), Value::Boolean(false));
		let or = Expression::or(unknown.clone(), Expression::constant(true));
		assert_eq!(eval(or, &sample()).unwrap(), Value::Boolean(true));
		assert_eq!(eval(Expression::not(unknown), &sample()).unwrap(), Value::Null);
	}

	#[test]
	fn test_column_collation_drives_comparison() {
		let expr = Expression::equal(Expression::column("code"), Expression::constant(Value::varchar("abc")));
		assert_eq!(eval(expr, &sample()).unwrap(), Value::Boolean(false));
		let expr = Expression::equal(Expression::column("name"), Expression::constant("WIDGET"));
		assert_eq!(eval(expr, &sample()).unwrap(), Value::Boolean(true));
	}

	#[test]
	fn test_explicit_collation_wins() {
		let expr = Expression::equal(
			Expression::collate(Expression::column("code"), "Latin1_General_CI_AS"),
			Expression::constant(Value::varchar("abc")),
		);
		assert_eq!(eval(expr, &sample()).unwrap(), Value::Boolean(true));
	}

	#[test]
	fn test_implicit_collation_conflict() {
		let expr = Expression::equal(Expression::column("code"), Expression::column("name"));
		assert_eq!(eval(expr, &sample()).unwrap_err().number(), 468);
	}

	#[test]
	fn test_not_in_with_null_is_unknown() {
		let expr = Expression::InList {
			operand: Box::new(Expression::column("id")),
			list: vec![Expression::constant(1), Expression::null()],
			negated: true,
		};
		assert_eq!(eval(expr, &sample()).unwrap(), Value::Null);
		let expr = Expression::InList {
			operand: Box::new(Expression::column("id")),
			list: vec![Expression::constant(1), Expression::constant(7)],
			negated: false,
		};
		assert_eq!(eval(expr, &sample()).unwrap(), Value::Boolean(true));
	}

	#[test]
	fn test_between() {
		let expr = Expression::Between {
			operand: Box::new(Expression::column("id")),
			low: Box::new(Expression::constant(1)),
			high: Box::new(Expression::constant(7)),
			negated: false,
		};
		assert_eq!(eval(expr, &sample()).unwrap(), Value::Boolean(true));
	}

	#[test]
	fn test_like() {
		let expr = Expression::like(Expression::column("name"), Expression::constant("wid%"));
		assert_eq!(eval(expr, &sample()).unwrap(), Value::Boolean(true));
	}

	#[test]
	fn test_simple_case() {
		let expr = Expression::Case {
			operand: Some(Box::new(Expression::column("id"))),
			branches: vec![
				(Expression::constant(1), Expression::constant("one")),
				(Expression::constant(7), Expression::constant("seven")),
			],
			otherwise: Some(Box::new(Expression::constant("other"))),
		};
		assert_eq!(eval(expr, &sample()).unwrap(), Value::nvarchar("seven"));
	}

	#[test]
	fn test_cast_and_try_cast() {
		let expr = Expression::cast(Expression::constant("42"), Type::Int);
		assert_eq!(eval(expr, &sample()).unwrap(), Value::Int(42));
		let expr = Expression::Cast {
			operand: Box::new(Expression::constant("forty two")),
			ty: Type::Int,
			try_cast: true,
		};
		assert_eq!(eval(expr, &sample()).unwrap(), Value::Null);
		let expr = Expression::cast(Expression::constant("forty two"), Type::Int);
		assert_eq!(eval(expr, &sample()).unwrap_err().number(), 245);
	}

	#[test]
	fn test_undeclared_variable() {
		assert_eq!(eval(Expression::variable("@missing"), &sample()).unwrap_err().number(), 137);
	}

	#[test]
	fn test_aggregate_and_window_rejected_in_filter() {
		let mut compiler = ExpressionCompiler::default();
		let sum = Expression::aggregate(AggregateCall::new(AggregateFunction::Sum, Expression::column("id")));
		let predicate = Expression::binary(BinaryOp::Greater, sum, Expression::constant(1));
		let err = compiler.compile(&predicate, &schema(), Clause::Filter).unwrap_err();
		assert_eq!(err.number(), 147);

		let rank = Expression::window(WindowCall::new(WindowFunction::RowNumber));
		let predicate = Expression::equal(rank, Expression::constant(1));
		let err = compiler.compile(&predicate, &schema(), Clause::Filter).unwrap_err();
		assert_eq!(err.number(), 4108);
	}

	#[test]
	fn test_non_boolean_predicate() {
		let expr = Expression::and(Expression::column("id"), Expression::constant(true));
		assert_eq!(eval(expr, &sample()).unwrap_err().number(), 4145);
	}

	#[test]
	fn test_compilations_are_cached() {
		let mut compiler = ExpressionCompiler::default();
		let expr = Expression::binary(BinaryOp::Add, Expression::column("id"), Expression::constant(1));
		compiler.compile(&expr, &schema(), Clause::Select).unwrap();
		compiler.compile(&expr, &schema(), Clause::Select).unwrap();
		assert_eq!(compiler.cached(), 1);
		compiler.compile(&expr, &schema(), Clause::Filter).unwrap();
		assert_eq!(compiler.cached(), 2);
	}
}
