// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{cmp::Ordering, collections::HashSet};

use quarry_core::{
	Schema,
	expression::{AggregateCall, AggregateFunction},
};
use quarry_type::{
	ArithmeticOp, Collation, KeyValue, Type, Value,
	error::diagnostic::cast::invalid_operand_for_operator,
	return_error,
	value::{
		arith::apply,
		convert::{cast, integer_value},
	},
};

use super::{Clause, CompiledExpr, ExpressionCompiler, compile::text};
use crate::context::ExecutionContext;

/// An aggregate call compiled against the schema of its input.
#[derive(Clone, Debug)]
pub(crate) struct CompiledAggregate {
	function: AggregateFunction,
	argument: Option<CompiledExpr>,
	distinct: bool,
	separator: String,
	ty: Type,
}

impl CompiledAggregate {
	pub(crate) fn compile(
		compiler: &mut ExpressionCompiler,
		call: &AggregateCall,
		schema: &Schema,
	) -> crate::Result<Self> {
		let argument =
			call.argument.as_deref().map(|arg| compiler.compile(arg, schema, Clause::Select)).transpose()?;
		let ty = result_type(call.function, argument.as_ref().map(CompiledExpr::ty))?;
		Ok(Self {
			function: call.function,
			argument,
			distinct: call.distinct,
			separator: call.separator.clone().unwrap_or_else(|| ",".to_string()),
			ty,
		})
	}

	pub(crate) fn ty(&self) -> Type {
		self.ty
	}

	pub(crate) fn accumulator(&self) -> Accumulator {
		let collation = self.argument.as_ref().map(|a| a.collation().clone()).unwrap_or_default();
		let argument = self.argument.as_ref().map(CompiledExpr::ty).unwrap_or(Type::Null);
		Accumulator::new(self.function, self.distinct, self.ty, argument, collation, self.separator.clone())
	}

	/// The argument value for one input row; `None` for `COUNT(*)`.
	pub(crate) fn argument(&self, row: &quarry_core::Row, ctx: &ExecutionContext) -> crate::Result<Option<Value>> {
		self.argument.as_ref().map(|arg| arg.evaluate(row, ctx)).transpose()
	}
}

/// Result type of an aggregate over an argument of type `argument`.
pub(crate) fn result_type(function: AggregateFunction, argument: Option<Type>) -> crate::Result<Type> {
	let argument = argument.unwrap_or(Type::Int);
	Ok(match function {
		AggregateFunction::Count => Type::Int,
		AggregateFunction::CountBig => Type::BigInt,
		AggregateFunction::Min | AggregateFunction::Max => argument,
		AggregateFunction::StringAgg => match argument {
			Type::VarChar => Type::VarChar,
			_ => Type::NVarChar,
		},
		AggregateFunction::Sum | AggregateFunction::Avg => match argument {
			Type::Null | Type::TinyInt | Type::SmallInt | Type::Int => Type::Int,
			Type::BigInt => Type::BigInt,
			Type::Decimal {
				scale,
				..
			} if function == AggregateFunction::Avg => Type::decimal(38, scale.max(6)),
			Type::Decimal {
				scale,
				..
			} => Type::decimal(38, scale),
			Type::Real | Type::Float => Type::Float,
			other => return_error!(invalid_operand_for_operator(&other, &function.name().to_lowercase())),
		},
	})
}

/// Type the running sum of AVG is kept in.
fn sum_type(result: Type) -> Type {
	match result {
		Type::Int | Type::BigInt => Type::BigInt,
		Type::Decimal {
			..
		} => Type::decimal(38, 10),
		other => other,
	}
}

#[derive(Clone, Debug)]
enum State {
	Count(i64),
	Extreme(Option<Value>),
	Sum(Option<Value>),
	Avg {
		sum: Option<Value>,
		count: i64,
	},
	StringAgg(Option<String>),
}

/// Running state of one aggregate over one group.
#[derive(Clone, Debug)]
pub(crate) struct Accumulator {
	function: AggregateFunction,
	seen: Option<HashSet<KeyValue>>,
	ty: Type,
	sum_ty: Type,
	collation: Collation,
	separator: String,
	state: State,
}

impl Accumulator {
	pub(crate) fn new(
		function: AggregateFunction,
		distinct: bool,
		ty: Type,
		argument: Type,
		collation: Collation,
		separator: String,
	) -> Self {
		let state = match function {
			AggregateFunction::Count | AggregateFunction::CountBig => State::Count(0),
			AggregateFunction::Min | AggregateFunction::Max => State::Extreme(None),
			AggregateFunction::Sum => State::Sum(None),
			AggregateFunction::Avg => State::Avg {
				sum: None,
				count: 0,
			},
			AggregateFunction::StringAgg => State::StringAgg(None),
		};
		let sum_ty = match (ty, argument) {
			(
				Type::Decimal {
					..
				},
				Type::Decimal {
					scale,
					..
				},
			) => Type::decimal(38, scale),
			(ty, _) => sum_type(ty),
		};
		Self {
			function,
			seen: distinct.then(HashSet::new),
			ty,
			sum_ty,
			collation,
			separator,
			state,
		}
	}

	/// Adds one input row; `None` stands for the row itself (`COUNT(*)`).
	/// NULL arguments are ignored.
	pub(crate) fn update(&mut self, value: Option<&Value>) -> crate::Result<()> {
		let Some(value) = value else {
			if let State::Count(n) = &mut self.state {
				*n += 1;
			}
			return Ok(());
		};
		if value.is_null() {
			return Ok(());
		}
		if let Some(seen) = &mut self.seen {
			if !seen.insert(KeyValue::new(value, &self.collation)) {
				return Ok(());
			}
		}
		match &mut self.state {
			State::Count(n) => *n += 1,
			State::Extreme(current) => {
				let wanted = if self.function == AggregateFunction::Min {
					Ordering::Less
				} else {
					Ordering::Greater
				};
				let replace = match current {
					Some(current) => value.compare(current, &self.collation) == wanted,
					None => true,
				};
				if replace {
					*current = Some(value.clone());
				}
			}
			State::Sum(sum) => {
				*sum = Some(match sum.take() {
					Some(acc) => apply(ArithmeticOp::Add, &acc, value, &self.ty)?,
					None => cast(value, &self.ty)?,
				});
			}
			State::Avg {
				sum,
				count,
			} => {
				*sum = Some(match sum.take() {
					Some(acc) => apply(ArithmeticOp::Add, &acc, value, &self.sum_ty)?,
					None => cast(value, &self.sum_ty)?,
				});
				*count += 1;
			}
			State::StringAgg(acc) => {
				if let Some(text) = text(value)? {
					match acc {
						Some(acc) => {
							acc.push_str(&self.separator);
							acc.push_str(&text);
						}
						None => *acc = Some(text),
					}
				}
			}
		}
		Ok(())
	}

	pub(crate) fn result(&self) -> crate::Result<Value> {
		match &self.state {
			State::Count(n) => integer_value(*n as i128, &self.ty),
			State::Extreme(value) | State::Sum(value) => Ok(value.clone().unwrap_or(Value::Null)),
			State::Avg {
				sum,
				count,
			} => {
				let Some(sum) = sum else {
					return Ok(Value::Null);
				};
				let count = Value::BigInt(*count);
				match self.ty {
					Type::Decimal {
						..
					} => apply(ArithmeticOp::Divide, sum, &count, &self.ty),
					_ => cast(&apply(ArithmeticOp::Divide, sum, &count, &self.sum_ty)?, &self.ty),
				}
			}
			State::StringAgg(acc) => Ok(match acc {
				Some(text) if self.ty == Type::VarChar => Value::VarChar(text.clone()),
				Some(text) => Value::NVarChar(text.clone()),
				None => Value::Null,
			}),
		}
	}
}
