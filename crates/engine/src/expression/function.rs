// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Built-in scalar functions.

use bigdecimal::RoundingMode;
use chrono::{
	Datelike, Duration, FixedOffset, Local, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc,
};
use num_traits::{Signed, ToPrimitive, Zero};
use quarry_core::{Expression, expression::BinaryOp};
use quarry_type::{
	Collation, Decimal, Type, Value, err,
	error::diagnostic::{
		number::{arithmetic_overflow, invalid_floating_point},
		query::{function_argument_count, invalid_argument_type, invalid_datepart, unknown_function},
		runtime::{date_out_of_range, invalid_length},
	},
	return_error,
	value::{
		arith::negate,
		convert::{cast, integer_value, ordered_f64, to_exact},
	},
};
use uuid::Uuid;

use super::{
	CompiledExpr,
	compile::{CompileContext, binary, compile_expression, text},
};

pub(crate) fn compile_call(cx: &CompileContext, name: &str, args: &[Expression]) -> crate::Result<CompiledExpr> {
	let upper = name.to_ascii_uppercase();
	match upper.as_str() {
		"@@ROWCOUNT" => {
			arity(&upper, args, 0, 0)?;
			Ok(CompiledExpr::new(Type::Int, cx.coercible(), |ec| {
				integer_value(ec.ctx.rowcount() as i128, &Type::Int)
			}))
		}
		"@@FETCH_STATUS" => {
			arity(&upper, args, 0, 0)?;
			Ok(CompiledExpr::new(Type::Int, cx.coercible(), |ec| Ok(Value::Int(ec.ctx.fetch_status()))))
		}
		"GETDATE" | "CURRENT_TIMESTAMP" | "SYSDATETIME" => {
			arity(&upper, args, 0, 0)?;
			Ok(CompiledExpr::new(Type::DateTime, cx.coercible(), |_| Ok(Value::DateTime(Local::now().naive_local()))))
		}
		"GETUTCDATE" | "SYSUTCDATETIME" => {
			arity(&upper, args, 0, 0)?;
			Ok(CompiledExpr::new(Type::DateTime, cx.coercible(), |_| Ok(Value::DateTime(Utc::now().naive_utc()))))
		}
		"NEWID" => {
			arity(&upper, args, 0, 0)?;
			Ok(CompiledExpr::new(Type::UniqueIdentifier, cx.coercible(), |_| {
				Ok(Value::UniqueIdentifier(Uuid::new_v4()))
			}))
		}
		"DATEADD" => {
			arity(&upper, args, 3, 3)?;
			date_add(cx, datepart(&upper, &args[0])?, &args[1], &args[2])
		}
		"DATEDIFF" => {
			arity(&upper, args, 3, 3)?;
			date_diff(cx, datepart(&upper, &args[0])?, &args[1], &args[2])
		}
		"DATEPART" => {
			arity(&upper, args, 2, 2)?;
			date_part(cx, &upper, datepart(&upper, &args[0])?, &args[1])
		}
		"YEAR" | "MONTH" | "DAY" => {
			arity(&upper, args, 1, 1)?;
			let part = match upper.as_str() {
				"YEAR" => DatePart::Year,
				"MONTH" => DatePart::Month,
				_ => DatePart::Day,
			};
			date_part(cx, &upper, part, &args[0])
		}
		"IIF" => {
			arity(&upper, args, 3, 3)?;
			compile_expression(
				cx,
				&Expression::Case {
					operand: None,
					branches: vec![(args[0].clone(), args[1].clone())],
					otherwise: Some(Box::new(args[2].clone())),
				},
			)
		}
		"NULLIF" => {
			arity(&upper, args, 2, 2)?;
			let first = compile_expression(cx, &args[0])?;
			let equal = binary(cx, BinaryOp::Equal, first.clone(), compile_expression(cx, &args[1])?)?;
			Ok(CompiledExpr::new(first.ty(), first.label().clone(), move |ec| {
				if equal.eval(ec)?.as_bool() == Some(true) {
					return Ok(Value::Null);
				}
				first.eval(ec)
			}))
		}
		"COALESCE" => {
			if args.len() < 2 {
				return_error!(function_argument_count(&upper, "at least 2"));
			}
			compile_expression(
				cx,
				&Expression::Case {
					operand: None,
					branches: args
						.iter()
						.map(|arg| {
							(
								Expression::IsNull {
									operand: Box::new(arg.clone()),
									negated: true,
								},
								arg.clone(),
							)
						})
						.collect(),
					otherwise: None,
				},
			)
		}
		_ => {
			let compiled = args.iter().map(|arg| compile_expression(cx, arg)).collect::<crate::Result<Vec<_>>>()?;
			scalar(cx, &upper, compiled)
		}
	}
}

fn arity(name: &str, args: &[Expression], min: usize, max: usize) -> crate::Result<()> {
	if args.len() < min || args.len() > max {
		let expected = if min == max {
			min.to_string()
		} else {
			format!("{} to {}", min, max)
		};
		return_error!(function_argument_count(name, &expected));
	}
	Ok(())
}

fn require(name: &str, position: usize, arg: &CompiledExpr, accepts: impl Fn(&Type) -> bool) -> crate::Result<()> {
	let ty = arg.ty();
	if matches!(ty, Type::Null | Type::Variant) || accepts(&ty) {
		return Ok(());
	}
	err!(invalid_argument_type(name, position, &ty))
}

/// Character type a string function returns for an argument of type `ty`.
fn string_type(ty: Type) -> Type {
	match ty {
		Type::VarChar => Type::VarChar,
		_ => Type::NVarChar,
	}
}

fn string_value(ty: Type, value: String) -> Value {
	match ty {
		Type::VarChar => Value::VarChar(value),
		_ => Value::NVarChar(value),
	}
}

fn integer_arg(value: &Value) -> crate::Result<Option<i64>> {
	if value.is_null() {
		return Ok(None);
	}
	Ok(cast(value, &Type::BigInt)?.as_i128().map(|v| v as i64))
}

fn scalar(cx: &CompileContext, name: &str, args: Vec<CompiledExpr>) -> crate::Result<CompiledExpr> {
	let count = |min: usize, max: usize| -> crate::Result<()> {
		if args.len() < min || args.len() > max {
			let expected = if min == max {
				min.to_string()
			} else {
				format!("{} to {}", min, max)
			};
			return_error!(function_argument_count(name, &expected));
		}
		Ok(())
	};

	match name {
		"UPPER" | "LOWER" | "LTRIM" | "RTRIM" | "TRIM" => {
			count(1, 1)?;
			let arg = args.into_iter().next().ok_or_else(missing)?;
			let ty = string_type(arg.ty());
			let label = arg.label().clone();
			let op = name.to_string();
			Ok(CompiledExpr::new(ty, label, move |ec| {
				let Some(s) = text(&arg.eval(ec)?)? else {
					return Ok(Value::Null);
				};
				let result = match op.as_str() {
					"UPPER" => s.to_uppercase(),
					"LOWER" => s.to_lowercase(),
					"LTRIM" => s.trim_start_matches(' ').to_string(),
					"RTRIM" => s.trim_end_matches(' ').to_string(),
					_ => s.trim_matches(' ').to_string(),
				};
				Ok(string_value(ty, result))
			}))
		}
		"LEN" => {
			count(1, 1)?;
			let arg = args.into_iter().next().ok_or_else(missing)?;
			Ok(CompiledExpr::new(Type::Int, cx.coercible(), move |ec| {
				Ok(match text(&arg.eval(ec)?)? {
					Some(s) => Value::Int(s.trim_end_matches(' ').chars().count() as i32),
					None => Value::Null,
				})
			}))
		}
		"LEFT" | "RIGHT" => {
			count(2, 2)?;
			let mut args = args.into_iter();
			let (source, length) = (args.next().ok_or_else(missing)?, args.next().ok_or_else(missing)?);
			require(name, 2, &length, Type::is_numeric)?;
			let ty = string_type(source.ty());
			let label = source.label().clone();
			let left = name == "LEFT";
			let function = name.to_string();
			Ok(CompiledExpr::new(ty, label, move |ec| {
				let Some(s) = text(&source.eval(ec)?)? else {
					return Ok(Value::Null);
				};
				let Some(n) = integer_arg(&length.eval(ec)?)? else {
					return Ok(Value::Null);
				};
				if n < 0 {
					return_error!(invalid_length(&function));
				}
				let chars: Vec<char> = s.chars().collect();
				let n = (n as usize).min(chars.len());
				let slice = if left {
					&chars[..n]
				} else {
					&chars[chars.len() - n..]
				};
				Ok(string_value(ty, slice.iter().collect()))
			}))
		}
		"SUBSTRING" => {
			count(3, 3)?;
			let mut args = args.into_iter();
			let source = args.next().ok_or_else(missing)?;
			let start = args.next().ok_or_else(missing)?;
			let length = args.next().ok_or_else(missing)?;
			require(name, 2, &start, Type::is_numeric)?;
			require(name, 3, &length, Type::is_numeric)?;
			let ty = string_type(source.ty());
			let label = source.label().clone();
			Ok(CompiledExpr::new(ty, label, move |ec| {
				let Some(s) = text(&source.eval(ec)?)? else {
					return Ok(Value::Null);
				};
				let (Some(start), Some(length)) = (integer_arg(&start.eval(ec)?)?, integer_arg(&length.eval(ec)?)?)
				else {
					return Ok(Value::Null);
				};
				if length < 0 {
					return_error!(invalid_length("SUBSTRING"));
				}
				// characters at 1-based positions [start, start + length)
				let first = start.max(1);
				let end = start.saturating_add(length);
				if end <= first {
					return Ok(string_value(ty, String::new()));
				}
				let result = s.chars().skip((first - 1) as usize).take((end - first) as usize).collect();
				Ok(string_value(ty, result))
			}))
		}
		"REPLACE" => {
			count(3, 3)?;
			let mut args = args.into_iter();
			let source = args.next().ok_or_else(missing)?;
			let find = args.next().ok_or_else(missing)?;
			let replacement = args.next().ok_or_else(missing)?;
			let ty = string_type(source.ty());
			let label = source.label().clone();
			let collation = label.collation.clone();
			Ok(CompiledExpr::new(ty, label, move |ec| {
				let (Some(s), Some(f), Some(r)) =
					(text(&source.eval(ec)?)?, text(&find.eval(ec)?)?, text(&replacement.eval(ec)?)?)
				else {
					return Ok(Value::Null);
				};
				Ok(string_value(ty, replace(&s, &f, &r, &collation)))
			}))
		}
		"CHARINDEX" => {
			count(2, 3)?;
			let mut args = args.into_iter();
			let find = args.next().ok_or_else(missing)?;
			let source = args.next().ok_or_else(missing)?;
			let start = args.next();
			let collation = if source.ty().is_character() {
				source.collation().clone()
			} else {
				find.collation().clone()
			};
			Ok(CompiledExpr::new(Type::Int, cx.coercible(), move |ec| {
				let (Some(f), Some(s)) = (text(&find.eval(ec)?)?, text(&source.eval(ec)?)?) else {
					return Ok(Value::Null);
				};
				let start = match &start {
					Some(start) => match integer_arg(&start.eval(ec)?)? {
						Some(v) => v.max(1) as usize,
						None => return Ok(Value::Null),
					},
					None => 1,
				};
				Ok(Value::Int(char_index(&f, &s, start, &collation) as i32))
			}))
		}
		"CONCAT" => {
			if args.len() < 2 {
				return_error!(function_argument_count(name, "at least 2"));
			}
			let ty = if args.iter().any(|a| a.ty() == Type::NVarChar) {
				Type::NVarChar
			} else {
				Type::VarChar
			};
			Ok(CompiledExpr::new(ty, cx.coercible(), move |ec| {
				let mut result = String::new();
				for arg in &args {
					if let Some(s) = text(&arg.eval(ec)?)? {
						result.push_str(&s);
					}
				}
				Ok(string_value(ty, result))
			}))
		}
		"ISNULL" => {
			count(2, 2)?;
			let mut args = args.into_iter();
			let check = args.next().ok_or_else(missing)?;
			let replacement = args.next().ok_or_else(missing)?;
			let ty = if check.ty() == Type::Null {
				replacement.ty()
			} else {
				check.ty()
			};
			let label = check.label().clone();
			Ok(CompiledExpr::new(ty, label, move |ec| {
				let value = check.eval(ec)?;
				if !value.is_null() {
					return Ok(value);
				}
				cast(&replacement.eval(ec)?, &ty)
			}))
		}
		"ABS" | "SIGN" | "FLOOR" | "CEILING" => {
			count(1, 1)?;
			let arg = args.into_iter().next().ok_or_else(missing)?;
			require(name, 1, &arg, Type::is_numeric)?;
			let ty = match (name, arg.ty()) {
				(_, Type::Null) => Type::Int,
				("FLOOR" | "CEILING", Type::Decimal {
					precision,
					..
				}) => Type::decimal(precision, 0),
				(_, ty) => ty,
			};
			let op = name.to_string();
			Ok(CompiledExpr::new(ty, cx.coercible(), move |ec| {
				let value = arg.eval(ec)?;
				if value.is_null() {
					return Ok(Value::Null);
				}
				match op.as_str() {
					"ABS" => abs(&value),
					"SIGN" => sign(&value, &ty),
					"FLOOR" => round_with(&value, 0, RoundingMode::Floor, &ty),
					_ => round_with(&value, 0, RoundingMode::Ceiling, &ty),
				}
			}))
		}
		"ROUND" => {
			count(2, 3)?;
			let mut args = args.into_iter();
			let arg = args.next().ok_or_else(missing)?;
			let places = args.next().ok_or_else(missing)?;
			let function = args.next();
			require(name, 1, &arg, Type::is_numeric)?;
			require(name, 2, &places, Type::is_numeric)?;
			let ty = match arg.ty() {
				Type::Null => Type::Int,
				ty => ty,
			};
			Ok(CompiledExpr::new(ty, cx.coercible(), move |ec| {
				let value = arg.eval(ec)?;
				let Some(places) = integer_arg(&places.eval(ec)?)? else {
					return Ok(Value::Null);
				};
				if value.is_null() {
					return Ok(Value::Null);
				}
				let truncate = match &function {
					Some(f) => integer_arg(&f.eval(ec)?)?.unwrap_or(0) != 0,
					None => false,
				};
				let mode = if truncate {
					RoundingMode::Down
				} else {
					RoundingMode::HalfUp
				};
				round_with(&value, places, mode, &ty)
			}))
		}
		"POWER" | "SQRT" => {
			count(if name == "POWER" { 2 } else { 1 }, if name == "POWER" { 2 } else { 1 })?;
			for (i, arg) in args.iter().enumerate() {
				require(name, i + 1, arg, Type::is_numeric)?;
			}
			let ty = if name == "SQRT" {
				Type::Float
			} else {
				match args[0].ty() {
					Type::Null => Type::Float,
					Type::Real => Type::Float,
					Type::Decimal {
						scale,
						..
					} => Type::decimal(38, scale),
					ty => ty,
				}
			};
			let sqrt = name == "SQRT";
			Ok(CompiledExpr::new(ty, cx.coercible(), move |ec| {
				let mut values = Vec::with_capacity(args.len());
				for arg in &args {
					let value = arg.eval(ec)?;
					match float_arg(&value)? {
						Some(v) => values.push(v),
						None => return Ok(Value::Null),
					}
				}
				let result = if sqrt {
					values[0].sqrt()
				} else {
					values[0].powf(values[1])
				};
				if !result.is_finite() {
					return_error!(invalid_floating_point());
				}
				if ty.is_integer() {
					return integer_value(result.trunc() as i128, &ty);
				}
				cast(&Value::Float(ordered_f64(result)?), &ty)
			}))
		}
		_ => err!(unknown_function(name)),
	}
}

fn missing() -> quarry_type::Error {
	quarry_type::error!(quarry_type::error::diagnostic::internal::internal("function argument missing"))
}

fn float_arg(value: &Value) -> crate::Result<Option<f64>> {
	if value.is_null() {
		return Ok(None);
	}
	Ok(cast(value, &Type::Float)?.as_f64())
}

fn abs(value: &Value) -> crate::Result<Value> {
	let negative = match value.unwrap_variant() {
		Value::Decimal(d) => d.value().is_negative(),
		other => other.as_f64().is_some_and(|v| v < 0.0),
	};
	if negative {
		negate(value)
	} else {
		Ok(value.clone())
	}
}

fn sign(value: &Value, ty: &Type) -> crate::Result<Value> {
	let sign = match value.unwrap_variant() {
		Value::Decimal(d) if d.value().is_zero() => 0,
		Value::Decimal(d) if d.value().is_negative() => -1,
		Value::Decimal(_) => 1,
		other => match other.as_f64() {
			Some(v) if v > 0.0 => 1,
			Some(v) if v < 0.0 => -1,
			_ => 0,
		},
	};
	match ty {
		Type::Real | Type::Float => cast(&Value::Float(ordered_f64(sign as f64)?), ty),
		Type::Decimal {
			..
		} => cast(&Value::Int(sign), ty),
		_ => integer_value(sign as i128, ty),
	}
}

/// Rounds to `places` decimal places (negative rounds left of the point),
/// keeping the result in type `ty`.
fn round_with(value: &Value, places: i64, mode: RoundingMode, ty: &Type) -> crate::Result<Value> {
	match ty {
		Type::Real | Type::Float => {
			let Some(v) = float_arg(value)? else {
				return Ok(Value::Null);
			};
			let factor = 10f64.powi(places as i32);
			let scaled = v * factor;
			let rounded = match mode {
				RoundingMode::Down => scaled.trunc(),
				RoundingMode::Floor => scaled.floor(),
				RoundingMode::Ceiling => scaled.ceil(),
				_ => scaled.round(),
			} / factor;
			cast(&Value::Float(ordered_f64(rounded)?), ty)
		}
		_ => {
			let exact = to_exact(value)?;
			let rounded = exact.with_scale_round(places, mode);
			match ty {
				Type::Decimal {
					precision,
					scale,
				} => {
					let rescaled = rounded.with_scale(*scale as i64);
					Ok(Value::Decimal(Decimal::new(&rescaled, *precision, *scale)?))
				}
				_ => {
					let integral = rounded.with_scale(0);
					let Some(v) = integral.to_i128() else {
						return_error!(arithmetic_overflow(ty));
					};
					integer_value(v, ty)
				}
			}
		}
	}
}

/// Whether `find` occurs in `source` at character offset `at`.
fn matches_at(source: &[char], find: &[char], at: usize, collation: &Collation) -> bool {
	if at + find.len() > source.len() {
		return false;
	}
	let window: String = source[at..at + find.len()].iter().collect();
	let needle: String = find.iter().collect();
	// trailing spaces are significant inside a search
	if window.ends_with(' ') || needle.ends_with(' ') {
		return window == needle;
	}
	collation.equals(&window, &needle)
}

fn char_index(find: &str, source: &str, start: usize, collation: &Collation) -> usize {
	let source: Vec<char> = source.chars().collect();
	let find: Vec<char> = find.chars().collect();
	if find.is_empty() {
		return 0;
	}
	(start - 1..source.len()).find(|&at| matches_at(&source, &find, at, collation)).map_or(0, |at| at + 1)
}

fn replace(source: &str, find: &str, replacement: &str, collation: &Collation) -> String {
	let find: Vec<char> = find.chars().collect();
	if find.is_empty() {
		return source.to_string();
	}
	let chars: Vec<char> = source.chars().collect();
	let mut result = String::with_capacity(source.len());
	let mut at = 0;
	while at < chars.len() {
		if matches_at(&chars, &find, at, collation) {
			result.push_str(replacement);
			at += find.len();
		} else {
			result.push(chars[at]);
			at += 1;
		}
	}
	result
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DatePart {
	Year,
	Quarter,
	Month,
	DayOfYear,
	Day,
	Week,
	Weekday,
	Hour,
	Minute,
	Second,
	Millisecond,
	Microsecond,
	Nanosecond,
}

impl DatePart {
	fn parse(name: &str) -> Option<DatePart> {
		Some(match name.to_ascii_lowercase().as_str() {
			"year" | "yy" | "yyyy" => DatePart::Year,
			"quarter" | "qq" | "q" => DatePart::Quarter,
			"month" | "mm" | "m" => DatePart::Month,
			"dayofyear" | "dy" | "y" => DatePart::DayOfYear,
			"day" | "dd" | "d" => DatePart::Day,
			"week" | "wk" | "ww" => DatePart::Week,
			"weekday" | "dw" | "w" => DatePart::Weekday,
			"hour" | "hh" => DatePart::Hour,
			"minute" | "mi" | "n" => DatePart::Minute,
			"second" | "ss" | "s" => DatePart::Second,
			"millisecond" | "ms" => DatePart::Millisecond,
			"microsecond" | "mcs" => DatePart::Microsecond,
			"nanosecond" | "ns" => DatePart::Nanosecond,
			_ => return None,
		})
	}

	fn is_time(&self) -> bool {
		matches!(
			self,
			DatePart::Hour | DatePart::Minute | DatePart::Second | DatePart::Millisecond | DatePart::Microsecond | DatePart::Nanosecond
		)
	}
}

/// The datepart argument is written as a bare identifier, which arrives as a
/// column reference, or as a string literal.
fn datepart(function: &str, arg: &Expression) -> crate::Result<DatePart> {
	let name = match arg {
		Expression::Column(name) => name.clone(),
		Expression::Constant(value) => value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string()),
		other => format!("{:?}", other),
	};
	match DatePart::parse(name.trim_matches(|c| c == '[' || c == ']')) {
		Some(part) => Ok(part),
		None => err!(invalid_datepart(function, &name)),
	}
}

/// Result type of DATEADD for a date argument of type `ty`.
fn temporal_type(ty: Type) -> Type {
	match ty {
		Type::Date | Type::Time | Type::DateTime | Type::DateTimeOffset => ty,
		_ => Type::DateTime,
	}
}

fn temporal(value: &Value) -> crate::Result<Option<NaiveDateTime>> {
	Ok(match value.unwrap_variant() {
		Value::Null => None,
		Value::Date(d) => Some(d.and_time(NaiveTime::MIN)),
		Value::Time(t) => Some(quarry_type::value::convert::base_date().date().and_time(*t)),
		Value::DateTime(dt) => Some(*dt),
		Value::DateTimeOffset(dt) => Some(dt.naive_local()),
		other => match cast(other, &Type::DateTime)? {
			Value::DateTime(dt) => Some(dt),
			_ => None,
		},
	})
}

fn require_temporal(function: &str, position: usize, arg: &CompiledExpr) -> crate::Result<()> {
	require(function, position, arg, |ty| ty.is_temporal() || ty.is_character())
}

fn date_add(cx: &CompileContext, part: DatePart, amount: &Expression, date: &Expression) -> crate::Result<CompiledExpr> {
	let amount = compile_expression(cx, amount)?;
	let date = compile_expression(cx, date)?;
	require("DATEADD", 2, &amount, Type::is_numeric)?;
	require_temporal("DATEADD", 3, &date)?;
	let ty = temporal_type(date.ty());
	if (ty == Type::Date && part.is_time()) || (ty == Type::Time && !part.is_time()) {
		return_error!(invalid_datepart("DATEADD", &format!("{:?}", part).to_lowercase()));
	}
	Ok(CompiledExpr::new(ty, cx.coercible(), move |ec| {
		let original = date.eval(ec)?;
		let (Some(n), Some(start)) = (integer_arg(&amount.eval(ec)?)?, temporal(&original)?) else {
			return Ok(Value::Null);
		};
		let Some(shifted) = shift(start, part, n) else {
			return_error!(date_out_of_range("DATEADD"));
		};
		Ok(match ty {
			Type::Date => Value::Date(shifted.date()),
			Type::Time => Value::Time(shifted.time()),
			Type::DateTimeOffset => {
				let offset = match original.unwrap_variant() {
					Value::DateTimeOffset(dt) => *dt.offset(),
					_ => FixedOffset::east_opt(0).ok_or_else(missing)?,
				};
				match offset.from_local_datetime(&shifted).single() {
					Some(dt) => Value::DateTimeOffset(dt),
					None => return_error!(date_out_of_range("DATEADD")),
				}
			}
			_ => Value::DateTime(shifted),
		})
	}))
}

fn add_months(start: NaiveDateTime, months: i64) -> Option<NaiveDateTime> {
	let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
	if months >= 0 {
		start.checked_add_months(magnitude)
	} else {
		start.checked_sub_months(magnitude)
	}
}

fn shift(start: NaiveDateTime, part: DatePart, n: i64) -> Option<NaiveDateTime> {
	let result = match part {
		DatePart::Year => add_months(start, n.checked_mul(12)?)?,
		DatePart::Quarter => add_months(start, n.checked_mul(3)?)?,
		DatePart::Month => add_months(start, n)?,
		DatePart::DayOfYear | DatePart::Day | DatePart::Weekday => start.checked_add_signed(Duration::try_days(n)?)?,
		DatePart::Week => start.checked_add_signed(Duration::try_weeks(n)?)?,
		DatePart::Hour => start.checked_add_signed(Duration::try_hours(n)?)?,
		DatePart::Minute => start.checked_add_signed(Duration::try_minutes(n)?)?,
		DatePart::Second => start.checked_add_signed(Duration::try_seconds(n)?)?,
		DatePart::Millisecond => start.checked_add_signed(Duration::try_milliseconds(n)?)?,
		DatePart::Microsecond => start.checked_add_signed(Duration::microseconds(n))?,
		DatePart::Nanosecond => start.checked_add_signed(Duration::nanoseconds(n))?,
	};
	(1..=9999).contains(&result.year()).then_some(result)
}

fn date_diff(cx: &CompileContext, part: DatePart, start: &Expression, end: &Expression) -> crate::Result<CompiledExpr> {
	let start = compile_expression(cx, start)?;
	let end = compile_expression(cx, end)?;
	require_temporal("DATEDIFF", 2, &start)?;
	require_temporal("DATEDIFF", 3, &end)?;
	Ok(CompiledExpr::new(Type::Int, cx.coercible(), move |ec| {
		let (Some(start), Some(end)) = (temporal(&start.eval(ec)?)?, temporal(&end.eval(ec)?)?) else {
			return Ok(Value::Null);
		};
		integer_value(boundaries(part, start, end), &Type::Int)
	}))
}

fn week_index(date: NaiveDate) -> i64 {
	// weeks start on Sunday; day 1 of the common era is a Monday
	(date.num_days_from_ce() as i64).div_euclid(7)
}

/// Number of `part` boundaries crossed between `start` and `end`.
fn boundaries(part: DatePart, start: NaiveDateTime, end: NaiveDateTime) -> i128 {
	let months = |dt: NaiveDateTime| dt.year() as i128 * 12 + dt.month0() as i128;
	let ticks = |dt: NaiveDateTime, unit: i128| -> i128 {
		let nanos = dt.and_utc().timestamp() as i128 * 1_000_000_000 + dt.and_utc().timestamp_subsec_nanos() as i128;
		nanos.div_euclid(unit)
	};
	match part {
		DatePart::Year => (end.year() - start.year()) as i128,
		DatePart::Quarter => months(end) / 3 - months(start) / 3,
		DatePart::Month => months(end) - months(start),
		DatePart::DayOfYear | DatePart::Day | DatePart::Weekday => {
			(end.date().num_days_from_ce() - start.date().num_days_from_ce()) as i128
		}
		DatePart::Week => (week_index(end.date()) - week_index(start.date())) as i128,
		DatePart::Hour => ticks(end, 3_600_000_000_000) - ticks(start, 3_600_000_000_000),
		DatePart::Minute => ticks(end, 60_000_000_000) - ticks(start, 60_000_000_000),
		DatePart::Second => ticks(end, 1_000_000_000) - ticks(start, 1_000_000_000),
		DatePart::Millisecond => ticks(end, 1_000_000) - ticks(start, 1_000_000),
		DatePart::Microsecond => ticks(end, 1_000) - ticks(start, 1_000),
		DatePart::Nanosecond => ticks(end, 1) - ticks(start, 1),
	}
}

fn date_part(cx: &CompileContext, function: &str, part: DatePart, date: &Expression) -> crate::Result<CompiledExpr> {
	let date = compile_expression(cx, date)?;
	require_temporal(function, 1, &date)?;
	Ok(CompiledExpr::new(Type::Int, cx.coercible(), move |ec| {
		let Some(dt) = temporal(&date.eval(ec)?)? else {
			return Ok(Value::Null);
		};
		let value = match part {
			DatePart::Year => dt.year(),
			DatePart::Quarter => dt.month0() as i32 / 3 + 1,
			DatePart::Month => dt.month() as i32,
			DatePart::DayOfYear => dt.ordinal() as i32,
			DatePart::Day => dt.day() as i32,
			DatePart::Week => {
				let first = dt.date().with_ordinal(1).unwrap_or(dt.date());
				(dt.ordinal0() as i32 + first.weekday().num_days_from_sunday() as i32) / 7 + 1
			}
			DatePart::Weekday => dt.weekday().num_days_from_sunday() as i32 + 1,
			DatePart::Hour => dt.hour() as i32,
			DatePart::Minute => dt.minute() as i32,
			DatePart::Second => dt.second() as i32,
			DatePart::Millisecond => (dt.nanosecond() / 1_000_000) as i32,
			DatePart::Microsecond => (dt.nanosecond() / 1_000) as i32,
			DatePart::Nanosecond => dt.nanosecond() as i32,
		};
		Ok(Value::Int(value))
	}))
}
