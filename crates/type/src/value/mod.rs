// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod arith;
mod compare;
pub mod convert;
pub mod decimal;
mod from;
mod into;
mod key;
mod ordered_f32;
mod ordered_f64;
mod r#type;

pub use arith::ArithmeticOp;
pub use decimal::Decimal;
pub use from::FromValue;
pub use into::IntoValue;
pub use key::KeyValue;
pub use ordered_f32::OrderedF32;
pub use ordered_f64::OrderedF64;
pub use r#type::{Family, GetType, MAX_DECIMAL_PRECISION, Type};

/// A SQL value, represented as a native Rust type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
	Null,
	/// bit
	Boolean(bool),
	TinyInt(u8),
	SmallInt(i16),
	Int(i32),
	BigInt(i64),
	Decimal(Decimal),
	/// 4-byte floating point
	Real(OrderedF32),
	/// 8-byte floating point
	Float(OrderedF64),
	Date(NaiveDate),
	Time(NaiveTime),
	DateTime(NaiveDateTime),
	DateTimeOffset(DateTime<FixedOffset>),
	/// Narrow character data
	VarChar(String),
	/// Wide character data
	NVarChar(String),
	VarBinary(Vec<u8>),
	UniqueIdentifier(Uuid),
	/// sql_variant; the boxed value keeps its concrete type.
	Variant(Box<Value>),
}

impl Value {
	pub fn null() -> Self {
		Value::Null
	}

	pub fn bool(v: impl Into<bool>) -> Self {
		Value::Boolean(v.into())
	}

	pub fn int(v: impl Into<i32>) -> Self {
		Value::Int(v.into())
	}

	pub fn bigint(v: impl Into<i64>) -> Self {
		Value::BigInt(v.into())
	}

	/// A float value; NaN has no SQL representation and becomes NULL.
	pub fn float(v: impl Into<f64>) -> Self {
		OrderedF64::try_from(v.into()).map(Value::Float).unwrap_or(Value::Null)
	}

	pub fn real(v: impl Into<f32>) -> Self {
		OrderedF32::try_from(v.into()).map(Value::Real).unwrap_or(Value::Null)
	}

	pub fn varchar(v: impl Into<String>) -> Self {
		Value::VarChar(v.into())
	}

	pub fn nvarchar(v: impl Into<String>) -> Self {
		Value::NVarChar(v.into())
	}

	pub fn variant(v: Value) -> Self {
		match v {
			Value::Null => Value::Null,
			Value::Variant(_) => v,
			other => Value::Variant(Box::new(other)),
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	/// The value with any variant wrapper removed.
	pub fn unwrap_variant(&self) -> &Value {
		match self {
			Value::Variant(inner) => inner.unwrap_variant(),
			other => other,
		}
	}

	pub fn family(&self) -> Option<Family> {
		self.unwrap_variant().get_type().family()
	}

	/// Truth value of a bit, NULL being unknown.
	pub fn as_bool(&self) -> Option<bool> {
		match self.unwrap_variant() {
			Value::Boolean(b) => Some(*b),
			_ => None,
		}
	}

	/// Integral value of an exact numeric or bit.
	pub fn as_i128(&self) -> Option<i128> {
		match self.unwrap_variant() {
			Value::Boolean(b) => Some(*b as i128),
			Value::TinyInt(v) => Some(*v as i128),
			Value::SmallInt(v) => Some(*v as i128),
			Value::Int(v) => Some(*v as i128),
			Value::BigInt(v) => Some(*v as i128),
			Value::Decimal(d) => d.trunc_i128(),
			_ => None,
		}
	}

	pub fn as_f64(&self) -> Option<f64> {
		match self.unwrap_variant() {
			Value::Real(v) => Some(v.value() as f64),
			Value::Float(v) => Some(v.value()),
			Value::Decimal(d) => d.to_f64(),
			other => other.as_i128().map(|v| v as f64),
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self.unwrap_variant() {
			Value::VarChar(s) | Value::NVarChar(s) => Some(s.as_str()),
			_ => None,
		}
	}
}

impl GetType for Value {
	fn get_type(&self) -> Type {
		match self {
			Value::Null => Type::Null,
			Value::Boolean(_) => Type::Bit,
			Value::TinyInt(_) => Type::TinyInt,
			Value::SmallInt(_) => Type::SmallInt,
			Value::Int(_) => Type::Int,
			Value::BigInt(_) => Type::BigInt,
			Value::Decimal(d) => Type::decimal(d.precision(), d.scale()),
			Value::Real(_) => Type::Real,
			Value::Float(_) => Type::Float,
			Value::Date(_) => Type::Date,
			Value::Time(_) => Type::Time,
			Value::DateTime(_) => Type::DateTime,
			Value::DateTimeOffset(_) => Type::DateTimeOffset,
			Value::VarChar(_) => Type::VarChar,
			Value::NVarChar(_) => Type::NVarChar,
			Value::VarBinary(_) => Type::VarBinary,
			Value::UniqueIdentifier(_) => Type::UniqueIdentifier,
			Value::Variant(_) => Type::Variant,
		}
	}
}

impl Display for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Value::Null => f.write_str("NULL"),
			Value::Boolean(b) => f.write_str(if *b {
				"1"
			} else {
				"0"
			}),
			Value::TinyInt(v) => Display::fmt(v, f),
			Value::SmallInt(v) => Display::fmt(v, f),
			Value::Int(v) => Display::fmt(v, f),
			Value::BigInt(v) => Display::fmt(v, f),
			Value::Decimal(v) => Display::fmt(v, f),
			Value::Real(v) => Display::fmt(v, f),
			Value::Float(v) => Display::fmt(v, f),
			Value::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
			Value::Time(v) => write!(f, "{}", v.format("%H:%M:%S%.f")),
			Value::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.3f")),
			Value::DateTimeOffset(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.f %:z")),
			Value::VarChar(v) | Value::NVarChar(v) => f.write_str(v),
			Value::VarBinary(v) => {
				f.write_str("0x")?;
				for byte in v {
					write!(f, "{:02X}", byte)?;
				}
				Ok(())
			}
			Value::UniqueIdentifier(v) => write!(f, "{}", v.hyphenated().to_string().to_uppercase()),
			Value::Variant(v) => Display::fmt(v, f),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_nan_float_is_null() {
		assert_eq!(Value::float(f64::NAN), Value::Null);
	}

	#[test]
	fn test_variant_keeps_concrete_type() {
		let value = Value::variant(Value::Int(7));
		assert_eq!(value.get_type(), Type::Variant);
		assert_eq!(value.unwrap_variant().get_type(), Type::Int);
		assert_eq!(value.family(), Some(Family::ExactNumeric));
	}

	#[test]
	fn test_display() {
		assert_eq!(Value::VarBinary(vec![0x0a, 0xff]).to_string(), "0x0AFF");
		assert_eq!(Value::Boolean(true).to_string(), "1");
		assert_eq!(
			Value::DateTime(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap().and_hms_opt(13, 5, 0).unwrap())
				.to_string(),
			"2024-02-29 13:05:00.000"
		);
	}
}
