// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use crate::{
	Error,
	error::diagnostic::cast::conversion_failed,
	value::{GetType, Type, Value, convert::cast},
};

/// Typed extraction of a non-null value, converting with CAST semantics
/// first.
pub trait FromValue: Sized {
	fn from_value(value: &Value) -> crate::Result<Self>;
}

impl FromValue for Value {
	fn from_value(value: &Value) -> crate::Result<Self> {
		Ok(value.clone())
	}
}

fn mismatch(value: &Value, target: Type) -> Error {
	Error(conversion_failed(&value.to_string(), &value.get_type(), &target))
}

macro_rules! impl_from_value {
	($($t:ty => $ty:expr, $variant:ident),* $(,)?) => {
		$(
			impl FromValue for $t {
				fn from_value(value: &Value) -> crate::Result<Self> {
					match cast(value, &$ty)? {
						Value::$variant(v) => Ok(v.into()),
						_ => Err(mismatch(value, $ty)),
					}
				}
			}
		)*
	};
}

impl_from_value!(
	bool => Type::Bit, Boolean,
	u8 => Type::TinyInt, TinyInt,
	i16 => Type::SmallInt, SmallInt,
	i32 => Type::Int, Int,
	i64 => Type::BigInt, BigInt,
	f64 => Type::Float, Float,
	f32 => Type::Real, Real,
	NaiveDate => Type::Date, Date,
	NaiveTime => Type::Time, Time,
	NaiveDateTime => Type::DateTime, DateTime,
	DateTime<FixedOffset> => Type::DateTimeOffset, DateTimeOffset,
	String => Type::NVarChar, NVarChar,
	Vec<u8> => Type::VarBinary, VarBinary,
	Uuid => Type::UniqueIdentifier, UniqueIdentifier,
);

impl FromValue for BigDecimal {
	fn from_value(value: &Value) -> crate::Result<Self> {
		crate::value::convert::to_exact(value)
	}
}

/// `None` for NULL, the converted value otherwise.
impl<T: FromValue> FromValue for Option<T> {
	fn from_value(value: &Value) -> crate::Result<Self> {
		if value.is_null() {
			return Ok(None);
		}
		T::from_value(value).map(Some)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_widening_extraction() {
		assert_eq!(i64::from_value(&Value::Int(7)).unwrap(), 7);
		assert_eq!(String::from_value(&Value::Int(7)).unwrap(), "7");
		assert_eq!(f64::from_value(&Value::varchar("2.5")).unwrap(), 2.5);
	}

	#[test]
	fn test_failed_extraction() {
		assert_eq!(i32::from_value(&Value::varchar("seven")).unwrap_err().number(), 245);
	}

	#[test]
	fn test_optional_extraction() {
		assert_eq!(Option::<i32>::from_value(&Value::Null).unwrap(), None);
		assert_eq!(Option::<i64>::from_value(&Value::Int(3)).unwrap(), Some(3));
	}
}
