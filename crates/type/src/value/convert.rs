// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

//! Explicit and implicit conversion between SQL types.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, Utc};
use num_bigint::BigInt;
use uuid::Uuid;

use crate::{
	Error,
	error::{
		ErrorKind,
		diagnostic::{
			cast::{conversion_failed, unsupported_conversion},
			number::arithmetic_overflow,
		},
	},
	return_error,
	value::{Decimal, GetType, OrderedF32, OrderedF64, Type, Value},
};

const DATETIME_FORMATS: &[&str] = &[
	"%Y-%m-%d %H:%M:%S%.f",
	"%Y-%m-%dT%H:%M:%S%.f",
	"%Y-%m-%d %H:%M",
	"%Y%m%d %H:%M:%S%.f",
	"%Y/%m/%d %H:%M:%S%.f",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d", "%m/%d/%Y"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Base date of the datetime type; numbers convert to days after it.
pub fn base_date() -> NaiveDateTime {
	NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or_default().and_time(NaiveTime::MIN)
}

/// CAST / CONVERT semantics.
pub fn cast(value: &Value, target: &Type) -> crate::Result<Value> {
	if value.is_null() || *target == Type::Null {
		return Ok(Value::Null);
	}
	if *target == Type::Variant {
		return Ok(Value::variant(value.clone()));
	}
	if let Value::Variant(inner) = value {
		return cast(inner, target);
	}

	let source = value.get_type();
	if source == *target {
		return Ok(value.clone());
	}
	if !source.is_explicitly_convertible_to(target) {
		return_error!(unsupported_conversion(&source, target));
	}

	match target {
		Type::Null | Type::Variant => Ok(value.clone()),
		Type::Bit => to_bit(value),
		Type::TinyInt | Type::SmallInt | Type::Int | Type::BigInt => to_integer(value, target),
		Type::Decimal {
			precision,
			scale,
		} => {
			let exact = to_exact(value)?;
			Ok(Value::Decimal(Decimal::new(&exact, *precision, *scale)?))
		}
		Type::Real => {
			let v = to_f64(value)?;
			if v.abs() > f32::MAX as f64 {
				return_error!(arithmetic_overflow(target));
			}
			ordered_f32(v as f32).map(Value::Real)
		}
		Type::Float => ordered_f64(to_f64(value)?).map(Value::Float),
		Type::VarChar => Ok(Value::VarChar(to_text(value))),
		Type::NVarChar => Ok(Value::NVarChar(to_text(value))),
		Type::VarBinary => to_binary(value),
		Type::UniqueIdentifier => to_uuid(value),
		Type::Date => to_datetime(value).map(|dt| Value::Date(dt.date())),
		Type::Time => to_datetime(value).map(|dt| Value::Time(dt.time())),
		Type::DateTime => to_datetime(value).map(Value::DateTime),
		Type::DateTimeOffset => to_datetimeoffset(value).map(Value::DateTimeOffset),
	}
}

/// TRY_CAST: a conversion failure yields NULL instead of an error.
/// Conversions that are never allowed still fail.
pub fn try_cast(value: &Value, target: &Type) -> crate::Result<Value> {
	match cast(value, target) {
		Ok(v) => Ok(v),
		Err(err) if err.kind() == ErrorKind::Execution => Ok(Value::Null),
		Err(err) => Err(err),
	}
}

fn failed(value: &Value, target: &Type) -> Error {
	Error(conversion_failed(&to_text(value), &value.get_type(), target))
}

fn to_bit(value: &Value) -> crate::Result<Value> {
	match value {
		Value::VarChar(s) | Value::NVarChar(s) => {
			let s = s.trim();
			if s.eq_ignore_ascii_case("true") {
				return Ok(Value::Boolean(true));
			}
			if s.eq_ignore_ascii_case("false") {
				return Ok(Value::Boolean(false));
			}
			let parsed = BigDecimal::from_str(s).map_err(|_| failed(value, &Type::Bit))?;
			Ok(Value::Boolean(parsed != BigDecimal::from(0)))
		}
		other => match other.as_f64() {
			Some(v) => Ok(Value::Boolean(v != 0.0)),
			None => Err(failed(value, &Type::Bit)),
		},
	}
}

fn to_integer(value: &Value, target: &Type) -> crate::Result<Value> {
	let v: i128 = match value {
		Value::VarChar(s) | Value::NVarChar(s) => {
			s.trim().parse::<i128>().map_err(|_| failed(value, target))?
		}
		Value::Real(f) => truncate_float(f.value() as f64, target)?,
		Value::Float(f) => truncate_float(f.value(), target)?,
		Value::DateTime(dt) => {
			// rounds to the nearest day like SQL Server
			let days = (*dt - base_date()).num_milliseconds() as f64 / 86_400_000.0;
			days.round() as i128
		}
		Value::VarBinary(bytes) => {
			let width = integer_width(target);
			let start = bytes.len().saturating_sub(width);
			let mut v: i128 = 0;
			for byte in &bytes[start..] {
				v = (v << 8) | *byte as i128;
			}
			// shorter input is zero padded on the left
			let v = if bytes.len() >= width && *target != Type::TinyInt {
				sign_extend(v, width)
			} else {
				v
			};
			return integer_value(v, target);
		}
		other => other.as_i128().ok_or_else(|| failed(value, target))?,
	};
	integer_value(v, target)
}

fn truncate_float(v: f64, target: &Type) -> crate::Result<i128> {
	let truncated = v.trunc();
	if truncated.abs() > i64::MAX as f64 {
		return_error!(arithmetic_overflow(target));
	}
	Ok(truncated as i128)
}

fn integer_width(target: &Type) -> usize {
	match target {
		Type::TinyInt => 1,
		Type::SmallInt => 2,
		Type::Int => 4,
		_ => 8,
	}
}

fn sign_extend(v: i128, width: usize) -> i128 {
	let bits = (width * 8) as u32;
	let shift = 128 - bits;
	(v << shift) >> shift
}

/// Narrows to the concrete integer type, failing with an overflow.
pub fn integer_value(v: i128, target: &Type) -> crate::Result<Value> {
	let overflow = || Error(arithmetic_overflow(target));
	Ok(match target {
		Type::TinyInt => Value::TinyInt(u8::try_from(v).map_err(|_| overflow())?),
		Type::SmallInt => Value::SmallInt(i16::try_from(v).map_err(|_| overflow())?),
		Type::Int => Value::Int(i32::try_from(v).map_err(|_| overflow())?),
		_ => Value::BigInt(i64::try_from(v).map_err(|_| overflow())?),
	})
}

/// Exact decimal representation of a numeric, bit or numeric text value.
pub fn to_exact(value: &Value) -> crate::Result<BigDecimal> {
	let target = Type::decimal(38, 0);
	match value.unwrap_variant() {
		Value::Decimal(d) => Ok(d.value().clone()),
		Value::Real(f) => BigDecimal::from_str(&f.value().to_string()).map_err(|_| failed(value, &target)),
		Value::Float(f) => BigDecimal::from_str(&f.value().to_string()).map_err(|_| failed(value, &target)),
		Value::VarChar(s) | Value::NVarChar(s) => {
			BigDecimal::from_str(s.trim()).map_err(|_| failed(value, &target))
		}
		Value::DateTime(dt) => {
			let millis = (*dt - base_date()).num_milliseconds();
			Ok(crate::value::decimal::divide(&BigDecimal::from(millis), &BigDecimal::from(86_400_000), 9))
		}
		other => other.as_i128().map(|v| BigDecimal::new(BigInt::from(v), 0)).ok_or_else(|| failed(value, &target)),
	}
}

fn to_f64(value: &Value) -> crate::Result<f64> {
	match value {
		Value::VarChar(s) | Value::NVarChar(s) => s.trim().parse::<f64>().map_err(|_| failed(value, &Type::Float)),
		Value::DateTime(dt) => Ok((*dt - base_date()).num_milliseconds() as f64 / 86_400_000.0),
		other => other.as_f64().ok_or_else(|| failed(value, &Type::Float)),
	}
}

fn to_text(value: &Value) -> String {
	match value {
		Value::VarBinary(bytes) => String::from_utf8_lossy(bytes).into_owned(),
		other => other.to_string(),
	}
}

fn to_binary(value: &Value) -> crate::Result<Value> {
	Ok(Value::VarBinary(match value {
		Value::VarChar(s) | Value::NVarChar(s) => s.as_bytes().to_vec(),
		Value::Boolean(b) => vec![*b as u8],
		Value::TinyInt(v) => v.to_be_bytes().to_vec(),
		Value::SmallInt(v) => v.to_be_bytes().to_vec(),
		Value::Int(v) => v.to_be_bytes().to_vec(),
		Value::BigInt(v) => v.to_be_bytes().to_vec(),
		Value::UniqueIdentifier(u) => u.to_bytes_le().to_vec(),
		_ => return Err(failed(value, &Type::VarBinary)),
	}))
}

fn to_uuid(value: &Value) -> crate::Result<Value> {
	match value {
		Value::VarChar(s) | Value::NVarChar(s) => Uuid::parse_str(s.trim().trim_start_matches('{').trim_end_matches('}'))
			.map(Value::UniqueIdentifier)
			.map_err(|_| failed(value, &Type::UniqueIdentifier)),
		Value::VarBinary(bytes) if bytes.len() >= 16 => {
			let mut raw = [0u8; 16];
			raw.copy_from_slice(&bytes[..16]);
			Ok(Value::UniqueIdentifier(Uuid::from_bytes_le(raw)))
		}
		_ => Err(failed(value, &Type::UniqueIdentifier)),
	}
}

/// Parses the datetime text forms accepted by CAST.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
	let text = text.trim();
	for format in DATETIME_FORMATS {
		if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
			return Some(dt);
		}
	}
	for format in DATE_FORMATS {
		if let Ok(date) = NaiveDate::parse_from_str(text, format) {
			return Some(date.and_time(NaiveTime::MIN));
		}
	}
	for format in TIME_FORMATS {
		if let Ok(time) = NaiveTime::parse_from_str(text, format) {
			return Some(base_date().date().and_time(time));
		}
	}
	None
}

fn to_datetime(value: &Value) -> crate::Result<NaiveDateTime> {
	let target = Type::DateTime;
	match value {
		Value::DateTime(dt) => Ok(*dt),
		Value::Date(d) => Ok(d.and_time(NaiveTime::MIN)),
		Value::Time(t) => Ok(base_date().date().and_time(*t)),
		Value::DateTimeOffset(dt) => Ok(dt.naive_local()),
		Value::VarChar(s) | Value::NVarChar(s) => {
			if let Ok(dt) = DateTime::parse_from_rfc3339(s.trim()) {
				return Ok(dt.naive_local());
			}
			parse_datetime(s).ok_or_else(|| failed(value, &target))
		}
		other => {
			let days = other.as_f64().ok_or_else(|| failed(value, &target))?;
			let millis = (days * 86_400_000.0).round();
			if millis.abs() > i64::MAX as f64 {
				return_error!(arithmetic_overflow(&target));
			}
			TimeDelta::try_milliseconds(millis as i64)
				.and_then(|delta| base_date().checked_add_signed(delta))
				.ok_or_else(|| Error(arithmetic_overflow(&target)))
		}
	}
}

fn to_datetimeoffset(value: &Value) -> crate::Result<DateTime<FixedOffset>> {
	match value {
		Value::VarChar(s) | Value::NVarChar(s) => {
			let s = s.trim();
			if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
				return Ok(dt);
			}
			if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f %:z") {
				return Ok(dt);
			}
			let naive = parse_datetime(s).ok_or_else(|| failed(value, &Type::DateTimeOffset))?;
			Ok(DateTime::from_naive_utc_and_offset(naive, Utc.fix()))
		}
		other => {
			let naive = to_datetime(other)?;
			Ok(DateTime::from_naive_utc_and_offset(naive, Utc.fix()))
		}
	}
}

/// Floats that are NaN or infinite have no SQL representation.
pub fn ordered_f64(v: f64) -> crate::Result<OrderedF64> {
	if v.is_infinite() {
		return_error!(arithmetic_overflow(&Type::Float));
	}
	OrderedF64::try_from(v).map_err(|_| Error(crate::error::diagnostic::number::invalid_floating_point()))
}

pub fn ordered_f32(v: f32) -> crate::Result<OrderedF32> {
	if v.is_infinite() {
		return_error!(arithmetic_overflow(&Type::Real));
	}
	OrderedF32::try_from(v).map_err(|_| Error(crate::error::diagnostic::number::invalid_floating_point()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_string_to_int() {
		assert_eq!(cast(&Value::varchar(" 42 "), &Type::Int).unwrap(), Value::Int(42));
		let err = cast(&Value::varchar("abc"), &Type::Int).unwrap_err();
		assert_eq!(err.number(), 245);
	}

	#[test]
	fn test_try_cast_yields_null() {
		assert_eq!(try_cast(&Value::varchar("abc"), &Type::Int).unwrap(), Value::Null);
	}

	#[test]
	fn test_unsupported_conversion() {
		let date = Value::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
		let err = cast(&date, &Type::Int).unwrap_err();
		assert_eq!(err.number(), 529);
		assert!(try_cast(&date, &Type::Int).is_err());
	}

	#[test]
	fn test_integer_narrowing_overflow() {
		let err = cast(&Value::Int(300), &Type::TinyInt).unwrap_err();
		assert_eq!(err.number(), 8115);
	}

	#[test]
	fn test_decimal_to_int_truncates() {
		let value = cast(&Value::varchar("-7.9"), &Type::decimal(5, 1)).unwrap();
		assert_eq!(cast(&value, &Type::Int).unwrap(), Value::Int(-7));
	}

	#[test]
	fn test_string_to_datetime() {
		let value = cast(&Value::varchar("2024-03-01 10:15:30"), &Type::DateTime).unwrap();
		assert_eq!(value.to_string(), "2024-03-01 10:15:30.000");
		let value = cast(&Value::varchar("20240301"), &Type::Date).unwrap();
		assert_eq!(value.to_string(), "2024-03-01");
	}

	#[test]
	fn test_int_to_datetime_counts_days() {
		let value = cast(&Value::Int(1), &Type::DateTime).unwrap();
		assert_eq!(value.to_string(), "1900-01-02 00:00:00.000");
	}

	#[test]
	fn test_uuid_round_trip_through_text() {
		let id = Uuid::new_v4();
		let text = cast(&Value::UniqueIdentifier(id), &Type::NVarChar).unwrap();
		assert_eq!(cast(&text, &Type::UniqueIdentifier).unwrap(), Value::UniqueIdentifier(id));
	}
}
