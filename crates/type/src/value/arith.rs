// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use chrono::TimeDelta;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::{
	Error,
	error::diagnostic::{
		cast::invalid_operand_for_operator,
		number::{arithmetic_overflow, divide_by_zero},
	},
	return_error,
	value::{
		Decimal, GetType, Type, Value,
		convert::{cast, integer_value, ordered_f32, ordered_f64, to_exact},
		decimal::{divide, remainder},
	},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithmeticOp {
	Add,
	Subtract,
	Multiply,
	Divide,
	Modulo,
}

impl ArithmeticOp {
	pub fn name(&self) -> &'static str {
		match self {
			ArithmeticOp::Add => "add",
			ArithmeticOp::Subtract => "subtract",
			ArithmeticOp::Multiply => "multiply",
			ArithmeticOp::Divide => "divide",
			ArithmeticOp::Modulo => "modulo",
		}
	}
}

impl Display for ArithmeticOp {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			ArithmeticOp::Add => "+",
			ArithmeticOp::Subtract => "-",
			ArithmeticOp::Multiply => "*",
			ArithmeticOp::Divide => "/",
			ArithmeticOp::Modulo => "%",
		})
	}
}

/// Applies `op` to two values, producing a value of `result`, which the
/// caller obtained from [`Type::arithmetic`] for the operand types.
pub fn apply(op: ArithmeticOp, left: &Value, right: &Value, result: &Type) -> crate::Result<Value> {
	if left.is_null() || right.is_null() {
		return Ok(Value::Null);
	}
	let left = left.unwrap_variant();
	let right = right.unwrap_variant();

	match result {
		Type::TinyInt | Type::SmallInt | Type::Int | Type::BigInt => integer(op, left, right, result),
		Type::Decimal {
			precision,
			scale,
		} => {
			let l = to_exact(left)?;
			let r = to_exact(right)?;
			let value = match op {
				ArithmeticOp::Add => l + r,
				ArithmeticOp::Subtract => l - r,
				ArithmeticOp::Multiply => l * r,
				ArithmeticOp::Divide => {
					if r.is_zero() {
						return_error!(divide_by_zero());
					}
					divide(&l, &r, *scale as i64)
				}
				ArithmeticOp::Modulo => {
					if r.is_zero() {
						return_error!(divide_by_zero());
					}
					remainder(&l, &r)
				}
			};
			Ok(Value::Decimal(Decimal::new(&value, *precision, *scale)?))
		}
		Type::Real | Type::Float => {
			let l = float_operand(left, result)?;
			let r = float_operand(right, result)?;
			let value = match op {
				ArithmeticOp::Add => l + r,
				ArithmeticOp::Subtract => l - r,
				ArithmeticOp::Multiply => l * r,
				ArithmeticOp::Divide => {
					if r == 0.0 {
						return_error!(divide_by_zero());
					}
					l / r
				}
				ArithmeticOp::Modulo => return_error!(invalid_operand_for_operator(result, op.name())),
			};
			if *result == Type::Real {
				Ok(Value::Real(ordered_f32(value as f32)?))
			} else {
				Ok(Value::Float(ordered_f64(value)?))
			}
		}
		Type::VarChar | Type::NVarChar => {
			let l = cast(left, result)?;
			let r = cast(right, result)?;
			let text = format!("{}{}", l.as_str().unwrap_or_default(), r.as_str().unwrap_or_default());
			Ok(match result {
				Type::NVarChar => Value::NVarChar(text),
				_ => Value::VarChar(text),
			})
		}
		Type::DateTime => datetime(op, left, right),
		other => return_error!(invalid_operand_for_operator(other, op.name())),
	}
}

/// Unary minus.
pub fn negate(value: &Value) -> crate::Result<Value> {
	let ty = value.get_type();
	let zero = match ty {
		Type::Null => return Ok(Value::Null),
		// tinyint is unsigned, its negation is a smallint
		Type::TinyInt => return integer_value(-(value.as_i128().unwrap_or_default()), &Type::SmallInt),
		Type::Decimal {
			..
		}
		| Type::SmallInt
		| Type::Int
		| Type::BigInt
		| Type::Real
		| Type::Float => Value::Int(0),
		other => return_error!(invalid_operand_for_operator(&other, "negate")),
	};
	apply(ArithmeticOp::Subtract, &zero, value, &ty)
}

fn integer(op: ArithmeticOp, left: &Value, right: &Value, result: &Type) -> crate::Result<Value> {
	let l = integer_operand(left, result)?;
	let r = integer_operand(right, result)?;
	let value = match op {
		ArithmeticOp::Add => l.checked_add(r),
		ArithmeticOp::Subtract => l.checked_sub(r),
		ArithmeticOp::Multiply => l.checked_mul(r),
		ArithmeticOp::Divide => {
			if r == 0 {
				return_error!(divide_by_zero());
			}
			l.checked_div(r)
		}
		ArithmeticOp::Modulo => {
			if r == 0 {
				return_error!(divide_by_zero());
			}
			l.checked_rem(r)
		}
	};
	match value {
		Some(v) => integer_value(v, result),
		None => Err(Error(arithmetic_overflow(result))),
	}
}

fn integer_operand(value: &Value, result: &Type) -> crate::Result<i128> {
	match value {
		Value::VarChar(_) | Value::NVarChar(_) => {
			cast(value, result)?.as_i128().ok_or_else(|| Error(arithmetic_overflow(result)))
		}
		other => other.as_i128().ok_or_else(|| Error(invalid_operand_for_operator(&other.get_type(), "arithmetic"))),
	}
}

fn float_operand(value: &Value, result: &Type) -> crate::Result<f64> {
	match value {
		Value::VarChar(_) | Value::NVarChar(_) => Ok(cast(value, &Type::Float)?.as_f64().unwrap_or_default()),
		other => other.as_f64().ok_or_else(|| Error(invalid_operand_for_operator(result, "arithmetic"))),
	}
}

/// datetime +/- number adds days; datetime - datetime is the elapsed time
/// since the base date.
fn datetime(op: ArithmeticOp, left: &Value, right: &Value) -> crate::Result<Value> {
	let base = crate::value::convert::base_date();
	let days = |value: &Value| -> crate::Result<f64> {
		match value {
			Value::DateTime(dt) => Ok((*dt - base).num_milliseconds() as f64 / 86_400_000.0),
			other => Ok(float_operand(other, &Type::Float)?),
		}
	};
	let l = days(left)?;
	let r = days(right)?;
	let total = match op {
		ArithmeticOp::Add => l + r,
		ArithmeticOp::Subtract => l - r,
		other => return_error!(invalid_operand_for_operator(&Type::DateTime, other.name())),
	};
	TimeDelta::try_milliseconds((total * 86_400_000.0).round() as i64)
		.and_then(|delta| base.checked_add_signed(delta))
		.map(Value::DateTime)
		.ok_or_else(|| Error(arithmetic_overflow(&Type::DateTime)))
}

#[cfg(test)]
mod tests {
	use std::str::FromStr;

	use bigdecimal::BigDecimal;

	use super::*;

	fn eval(op: ArithmeticOp, left: Value, right: Value) -> crate::Result<Value> {
		let ty = Type::arithmetic(op, &left.get_type(), &right.get_type())?;
		apply(op, &left, &right, &ty)
	}

	#[test]
	fn test_integer_division_truncates() {
		assert_eq!(eval(ArithmeticOp::Divide, Value::Int(7), Value::Int(2)).unwrap(), Value::Int(3));
		assert_eq!(eval(ArithmeticOp::Divide, Value::Int(-7), Value::Int(2)).unwrap(), Value::Int(-3));
	}

	#[test]
	fn test_integer_by_decimal_yields_decimal() {
		let d = Value::Decimal(Decimal::from_exact(&BigDecimal::from_str("2.0").unwrap()).unwrap());
		let result = eval(ArithmeticOp::Divide, Value::Int(7), d).unwrap();
		assert_eq!(result.get_type(), Type::decimal(17, 6));
		assert_eq!(result.to_string(), "3.500000");
	}

	#[test]
	fn test_divide_by_zero() {
		assert_eq!(eval(ArithmeticOp::Divide, Value::Int(1), Value::Int(0)).unwrap_err().number(), 8134);
		assert_eq!(eval(ArithmeticOp::Modulo, Value::BigInt(1), Value::Int(0)).unwrap_err().number(), 8134);
		assert_eq!(eval(ArithmeticOp::Divide, Value::float(1.0), Value::float(0.0)).unwrap_err().number(), 8134);
	}

	#[test]
	fn test_overflow() {
		let err = eval(ArithmeticOp::Add, Value::Int(i32::MAX), Value::Int(1)).unwrap_err();
		assert_eq!(err.number(), 8115);
		assert_eq!(
			eval(ArithmeticOp::Add, Value::BigInt(i32::MAX as i64), Value::Int(1)).unwrap(),
			Value::BigInt(i32::MAX as i64 + 1)
		);
	}

	#[test]
	fn test_null_propagates() {
		assert_eq!(eval(ArithmeticOp::Add, Value::Null, Value::Int(1)).unwrap(), Value::Null);
	}

	#[test]
	fn test_string_concatenation() {
		assert_eq!(
			eval(ArithmeticOp::Add, Value::varchar("ab"), Value::nvarchar("cd")).unwrap(),
			Value::nvarchar("abcd")
		);
	}

	#[test]
	fn test_numeric_string_converts() {
		assert_eq!(eval(ArithmeticOp::Add, Value::varchar("40"), Value::Int(2)).unwrap(), Value::Int(42));
		assert_eq!(eval(ArithmeticOp::Add, Value::varchar("x"), Value::Int(2)).unwrap_err().number(), 245);
	}

	#[test]
	fn test_negate() {
		assert_eq!(negate(&Value::Int(5)).unwrap(), Value::Int(-5));
		assert_eq!(negate(&Value::Int(i32::MIN)).unwrap_err().number(), 8115);
	}
}
