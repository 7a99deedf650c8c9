// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{
	error::diagnostic::cast::{invalid_operand_for_operator, operand_type_clash},
	return_error,
	value::arith::ArithmeticOp,
};

pub const MAX_DECIMAL_PRECISION: u8 = 38;

/// Concrete SQL data type of a value or an expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
	/// Type of an untyped NULL literal; converts to every other type.
	Null,
	Bit,
	TinyInt,
	SmallInt,
	Int,
	BigInt,
	Decimal {
		precision: u8,
		scale: u8,
	},
	Real,
	Float,
	Date,
	Time,
	DateTime,
	DateTimeOffset,
	VarChar,
	NVarChar,
	VarBinary,
	UniqueIdentifier,
	/// sql_variant: carries the concrete type of each stored value.
	Variant,
}

/// Groups of concrete types whose values are mutually comparable.
///
/// The declaration order is the cross family ordering used when values of
/// different families are sorted together.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Family {
	Boolean,
	UniqueIdentifier,
	Binary,
	WideCharacter,
	NarrowCharacter,
	ExactNumeric,
	ApproximateNumeric,
	DateTime,
}

pub trait GetType {
	fn get_type(&self) -> Type;
}

impl Type {
	pub fn decimal(precision: u8, scale: u8) -> Type {
		Type::Decimal {
			precision,
			scale,
		}
	}

	pub fn family(&self) -> Option<Family> {
		match self {
			Type::Null | Type::Variant => None,
			Type::Bit => Some(Family::Boolean),
			Type::TinyInt | Type::SmallInt | Type::Int | Type::BigInt | Type::Decimal {
				..
			} => Some(Family::ExactNumeric),
			Type::Real | Type::Float => Some(Family::ApproximateNumeric),
			Type::Date | Type::Time | Type::DateTime | Type::DateTimeOffset => Some(Family::DateTime),
			Type::VarChar => Some(Family::NarrowCharacter),
			Type::NVarChar => Some(Family::WideCharacter),
			Type::VarBinary => Some(Family::Binary),
			Type::UniqueIdentifier => Some(Family::UniqueIdentifier),
		}
	}

	/// SQL Server data type precedence; the operand with the lower value is
	/// converted to the type of the other operand.
	pub fn precedence(&self) -> u8 {
		match self {
			Type::Null => 0,
			Type::VarBinary => 1,
			Type::VarChar => 2,
			Type::NVarChar => 3,
			Type::UniqueIdentifier => 4,
			Type::Bit => 5,
			Type::TinyInt => 6,
			Type::SmallInt => 7,
			Type::Int => 8,
			Type::BigInt => 9,
			Type::Decimal {
				..
			} => 10,
			Type::Real => 11,
			Type::Float => 12,
			Type::Time => 13,
			Type::Date => 14,
			Type::DateTime => 15,
			Type::DateTimeOffset => 16,
			Type::Variant => 17,
		}
	}

	pub fn is_integer(&self) -> bool {
		matches!(self, Type::TinyInt | Type::SmallInt | Type::Int | Type::BigInt)
	}

	pub fn is_numeric(&self) -> bool {
		matches!(self.family(), Some(Family::ExactNumeric) | Some(Family::ApproximateNumeric))
	}

	pub fn is_character(&self) -> bool {
		matches!(self, Type::VarChar | Type::NVarChar)
	}

	pub fn is_temporal(&self) -> bool {
		matches!(self.family(), Some(Family::DateTime))
	}

	/// Precision and scale an exact numeric type occupies when widened to
	/// decimal.
	pub fn decimal_shape(&self) -> Option<(u8, u8)> {
		match self {
			Type::Bit => Some((1, 0)),
			Type::TinyInt => Some((3, 0)),
			Type::SmallInt => Some((5, 0)),
			Type::Int => Some((10, 0)),
			Type::BigInt => Some((19, 0)),
			Type::Decimal {
				precision,
				scale,
			} => Some((*precision, *scale)),
			_ => None,
		}
	}

	pub fn is_implicitly_convertible_to(&self, target: &Type) -> bool {
		if self == target || *self == Type::Null || *target == Type::Variant {
			return true;
		}
		match (self, target) {
			(Type::Variant, _) => true,
			(s, t) if s.is_numeric() || *s == Type::Bit => {
				t.is_numeric() || *t == Type::Bit || t.is_character() || *t == Type::DateTime || *t == Type::VarBinary
			}
			(s, t) if s.is_character() => *t != Type::VarBinary,
			(Type::VarBinary, t) => t.is_integer() || *t == Type::Bit || *t == Type::UniqueIdentifier,
			(Type::UniqueIdentifier, t) => t.is_character() || *t == Type::VarBinary,
			(Type::Date, t) => matches!(t, Type::DateTime | Type::DateTimeOffset) || t.is_character(),
			(Type::Time, t) => matches!(t, Type::DateTime | Type::DateTimeOffset) || t.is_character(),
			(Type::DateTime, t) => {
				matches!(t, Type::Date | Type::Time | Type::DateTimeOffset) || t.is_character()
			}
			(Type::DateTimeOffset, t) => matches!(t, Type::Date | Type::Time | Type::DateTime) || t.is_character(),
			_ => false,
		}
	}

	pub fn is_explicitly_convertible_to(&self, target: &Type) -> bool {
		if self.is_implicitly_convertible_to(target) {
			return true;
		}
		match (self, target) {
			(s, Type::VarBinary) if s.is_character() => true,
			(Type::DateTime, t) => t.is_numeric(),
			_ => false,
		}
	}

	/// The type both operands are converted to before a comparison, a CASE
	/// branch merge or a UNION column merge.
	pub fn common(left: &Type, right: &Type) -> crate::Result<Type> {
		match (left, right) {
			(Type::Null, other) | (other, Type::Null) => return Ok(*other),
			(l, r) if l == r => return Ok(*l),
			(Type::Variant, _) | (_, Type::Variant) => return Ok(Type::Variant),
			_ => {}
		}

		if let (Some((lp, ls)), Some((rp, rs))) = (left.decimal_shape(), right.decimal_shape()) {
			let either_decimal = matches!(left, Type::Decimal { .. }) || matches!(right, Type::Decimal { .. });
			if either_decimal {
				let scale = ls.max(rs) as u32;
				let integral = (lp - ls).max(rp - rs) as u32;
				return Ok(capped_decimal(integral + scale, scale));
			}
		}

		let (lower, higher) = if left.precedence() <= right.precedence() {
			(left, right)
		} else {
			(right, left)
		};

		if !lower.is_implicitly_convertible_to(higher) {
			return_error!(operand_type_clash(left, right));
		}
		Ok(*higher)
	}

	/// Result type of a binary arithmetic operator.
	pub fn arithmetic(op: ArithmeticOp, left: &Type, right: &Type) -> crate::Result<Type> {
		match (left, right) {
			(Type::Null, Type::Null) => return Ok(Type::Int),
			(Type::Null, other) | (other, Type::Null) => return Ok(*other),
			_ => {}
		}

		for ty in [left, right] {
			if matches!(ty, Type::VarBinary | Type::UniqueIdentifier | Type::Variant)
				|| matches!(ty, Type::Date | Type::Time | Type::DateTimeOffset)
			{
				return_error!(invalid_operand_for_operator(ty, op.name()));
			}
		}

		if *left == Type::Bit && *right == Type::Bit {
			return_error!(invalid_operand_for_operator(left, op.name()));
		}

		if left.is_character() && right.is_character() {
			if op != ArithmeticOp::Add {
				return_error!(invalid_operand_for_operator(left, op.name()));
			}
			return Ok(if *left == Type::NVarChar || *right == Type::NVarChar {
				Type::NVarChar
			} else {
				Type::VarChar
			});
		}

		if *left == Type::DateTime || *right == Type::DateTime {
			if !matches!(op, ArithmeticOp::Add | ArithmeticOp::Subtract) {
				return_error!(invalid_operand_for_operator(&Type::DateTime, op.name()));
			}
			let other = if *left == Type::DateTime {
				right
			} else {
				left
			};
			if *other != Type::DateTime && !other.is_numeric() && *other != Type::Bit {
				return_error!(operand_type_clash(left, right));
			}
			return Ok(Type::DateTime);
		}

		// character operands convert to the numeric side
		let left = if left.is_character() {
			right
		} else {
			left
		};
		let right = if right.is_character() {
			left
		} else {
			right
		};

		if matches!(left, Type::Real | Type::Float) || matches!(right, Type::Real | Type::Float) {
			if op == ArithmeticOp::Modulo {
				return_error!(invalid_operand_for_operator(&Type::Float, op.name()));
			}
			return Ok(if *left == Type::Float || *right == Type::Float {
				Type::Float
			} else {
				Type::Real
			});
		}

		let either_decimal = matches!(left, Type::Decimal { .. }) || matches!(right, Type::Decimal { .. });
		match (left.decimal_shape(), right.decimal_shape()) {
			(Some((p1, s1)), Some((p2, s2))) if either_decimal => {
				Ok(decimal_arithmetic(op, p1 as u32, s1 as u32, p2 as u32, s2 as u32))
			}
			_ => {
				let higher = if left.precedence() >= right.precedence() {
					left
				} else {
					right
				};
				// bit widens to int in arithmetic
				Ok(if *higher == Type::Bit {
					Type::Int
				} else {
					*higher
				})
			}
		}
	}
}

fn decimal_arithmetic(op: ArithmeticOp, p1: u32, s1: u32, p2: u32, s2: u32) -> Type {
	match op {
		ArithmeticOp::Add | ArithmeticOp::Subtract => {
			let scale = s1.max(s2);
			capped_decimal(scale + (p1 - s1).max(p2 - s2) + 1, scale)
		}
		ArithmeticOp::Multiply => capped_decimal(p1 + p2 + 1, s1 + s2),
		ArithmeticOp::Divide => {
			let scale = 6.max(s1 + p2 + 1);
			capped_decimal(p1 - s1 + s2 + scale, scale)
		}
		ArithmeticOp::Modulo => {
			let scale = s1.max(s2);
			capped_decimal((p1 - s1).min(p2 - s2) + scale, scale)
		}
	}
}

/// Applies the precision cap of 38, keeping the integral digits and giving
/// up scale down to a minimum of 6.
pub(crate) fn capped_decimal(precision: u32, scale: u32) -> Type {
	let max = MAX_DECIMAL_PRECISION as u32;
	if precision <= max {
		return Type::decimal(precision.max(1) as u8, scale as u8);
	}
	let integral = precision - scale;
	let scale = if integral < 32 {
		scale.min(max - integral)
	} else {
		scale.min(6)
	};
	Type::decimal(MAX_DECIMAL_PRECISION, scale as u8)
}

impl Display for Type {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Type::Null => f.write_str("NULL"),
			Type::Bit => f.write_str("bit"),
			Type::TinyInt => f.write_str("tinyint"),
			Type::SmallInt => f.write_str("smallint"),
			Type::Int => f.write_str("int"),
			Type::BigInt => f.write_str("bigint"),
			Type::Decimal {
				precision,
				scale,
			} => write!(f, "decimal({},{})", precision, scale),
			Type::Real => f.write_str("real"),
			Type::Float => f.write_str("float"),
			Type::Date => f.write_str("date"),
			Type::Time => f.write_str("time"),
			Type::DateTime => f.write_str("datetime"),
			Type::DateTimeOffset => f.write_str("datetimeoffset"),
			Type::VarChar => f.write_str("varchar"),
			Type::NVarChar => f.write_str("nvarchar"),
			Type::VarBinary => f.write_str("varbinary"),
			Type::UniqueIdentifier => f.write_str("uniqueidentifier"),
			Type::Variant => f.write_str("sql_variant"),
		}
	}
}
