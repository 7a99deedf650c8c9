// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use crate::value::{Decimal, Value};

pub trait IntoValue {
	fn into_value(self) -> Value;
}

impl IntoValue for Value {
	fn into_value(self) -> Value {
		self
	}
}

impl<T: IntoValue> IntoValue for Option<T> {
	fn into_value(self) -> Value {
		match self {
			Some(v) => v.into_value(),
			None => Value::Null,
		}
	}
}

macro_rules! impl_into_value {
	($($t:ty => $variant:ident),* $(,)?) => {
		$(
			impl IntoValue for $t {
				fn into_value(self) -> Value {
					Value::$variant(self.into())
				}
			}
		)*
	};
}

impl_into_value!(
	bool => Boolean,
	u8 => TinyInt,
	i16 => SmallInt,
	i32 => Int,
	i64 => BigInt,
	NaiveDate => Date,
	NaiveTime => Time,
	NaiveDateTime => DateTime,
	DateTime<FixedOffset> => DateTimeOffset,
	Vec<u8> => VarBinary,
	Uuid => UniqueIdentifier,
);

impl IntoValue for f64 {
	fn into_value(self) -> Value {
		Value::float(self)
	}
}

impl IntoValue for f32 {
	fn into_value(self) -> Value {
		Value::real(self)
	}
}

/// Rust strings are Unicode, so they map to the wide character type.
impl IntoValue for &str {
	fn into_value(self) -> Value {
		Value::NVarChar(self.to_string())
	}
}

impl IntoValue for String {
	fn into_value(self) -> Value {
		Value::NVarChar(self)
	}
}

impl IntoValue for BigDecimal {
	fn into_value(self) -> Value {
		Decimal::from_exact(&self).map(Value::Decimal).unwrap_or(Value::Null)
	}
}

impl IntoValue for Decimal {
	fn into_value(self) -> Value {
		Value::Decimal(self)
	}
}
