// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{Display, Formatter},
	str::FromStr,
};

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};
use num_traits::{Signed, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

use crate::{
	error::diagnostic::number::arithmetic_overflow,
	return_error,
	value::{Type, r#type::MAX_DECIMAL_PRECISION},
};

/// Exact numeric value together with the precision and scale of its type.
///
/// The stored value always has exactly `scale` fractional digits and at most
/// `precision` digits in total.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Decimal {
	value: BigDecimal,
	precision: u8,
	scale: u8,
}

impl Decimal {
	/// Rounds `value` half away from zero to `scale` digits and checks that it
	/// fits `precision`.
	pub fn new(value: &BigDecimal, precision: u8, scale: u8) -> crate::Result<Self> {
		let rounded = rescale(value, scale as i64);
		if digit_count(&rounded) > precision as u64 {
			return_error!(arithmetic_overflow(&Type::decimal(precision, scale)));
		}
		Ok(Self {
			value: rounded,
			precision,
			scale,
		})
	}

	/// Infers the smallest precision and scale that hold `value` exactly.
	pub fn from_exact(value: &BigDecimal) -> crate::Result<Self> {
		let (_, exponent) = value.as_bigint_and_exponent();
		let scale = exponent.clamp(0, MAX_DECIMAL_PRECISION as i64) as u8;
		let rescaled = rescale(value, scale as i64);
		let digits = digit_count(&rescaled).max(scale as u64).max(1);
		if digits > MAX_DECIMAL_PRECISION as u64 {
			return_error!(arithmetic_overflow(&Type::decimal(MAX_DECIMAL_PRECISION, scale)));
		}
		Ok(Self {
			value: rescaled,
			precision: digits as u8,
			scale,
		})
	}

	pub fn from_i64(value: i64) -> Self {
		Self {
			value: BigDecimal::from(value),
			precision: 19,
			scale: 0,
		}
	}

	pub fn parse(text: &str) -> Option<Self> {
		let value = BigDecimal::from_str(text.trim()).ok()?;
		Self::from_exact(&value).ok()
	}

	pub fn value(&self) -> &BigDecimal {
		&self.value
	}

	pub fn precision(&self) -> u8 {
		self.precision
	}

	pub fn scale(&self) -> u8 {
		self.scale
	}

	pub fn is_zero(&self) -> bool {
		self.value.is_zero()
	}

	pub fn to_f64(&self) -> Option<f64> {
		self.value.to_f64()
	}

	/// Integer part, truncated toward zero.
	pub fn trunc_i128(&self) -> Option<i128> {
		truncate(&self.value).to_i128()
	}
}

impl Display for Decimal {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(&format_fixed(&self.value, self.scale as i64))
	}
}

/// Rounds half away from zero to the given number of fractional digits.
pub fn rescale(value: &BigDecimal, scale: i64) -> BigDecimal {
	let (digits, exponent) = value.as_bigint_and_exponent();
	if exponent <= scale {
		let factor = pow10((scale - exponent) as u32);
		return BigDecimal::new(digits * factor, scale);
	}
	let divisor = pow10((exponent - scale) as u32);
	let quotient = &digits / &divisor;
	let remainder = &digits % &divisor;
	let quotient = if remainder.abs() * 2 >= divisor {
		if digits.sign() == Sign::Minus {
			quotient - 1
		} else {
			quotient + 1
		}
	} else {
		quotient
	};
	BigDecimal::new(quotient, scale)
}

/// Quotient truncated toward zero at `scale` fractional digits. The caller
/// guarantees a non-zero divisor.
pub fn divide(dividend: &BigDecimal, divisor: &BigDecimal, scale: i64) -> BigDecimal {
	let (a, ea) = dividend.as_bigint_and_exponent();
	let (b, eb) = divisor.as_bigint_and_exponent();
	let shift = scale + eb - ea;
	let (numerator, denominator) = if shift >= 0 {
		(a * pow10(shift as u32), b)
	} else {
		(a, b * pow10((-shift) as u32))
	};
	BigDecimal::new(numerator / denominator, scale)
}

/// Remainder whose sign follows the dividend.
pub fn remainder(dividend: &BigDecimal, divisor: &BigDecimal) -> BigDecimal {
	let (_, ea) = dividend.as_bigint_and_exponent();
	let (_, eb) = divisor.as_bigint_and_exponent();
	let scale = ea.max(eb);
	let (a, _) = rescale(dividend, scale).as_bigint_and_exponent();
	let (b, _) = rescale(divisor, scale).as_bigint_and_exponent();
	BigDecimal::new(a % b, scale)
}

pub fn truncate(value: &BigDecimal) -> BigInt {
	let (digits, exponent) = value.as_bigint_and_exponent();
	if exponent <= 0 {
		digits * pow10((-exponent) as u32)
	} else {
		digits / pow10(exponent as u32)
	}
}

pub fn is_integral(value: &BigDecimal) -> bool {
	let (digits, exponent) = value.as_bigint_and_exponent();
	exponent <= 0 || (digits % pow10(exponent as u32)).is_zero()
}

fn pow10(exponent: u32) -> BigInt {
	BigInt::from(10u8).pow(exponent)
}

fn digit_count(value: &BigDecimal) -> u64 {
	let (digits, _) = value.as_bigint_and_exponent();
	if digits.is_zero() {
		return 1;
	}
	digits.magnitude().to_string().len() as u64
}

/// Renders with exactly `scale` fractional digits, never in exponent form.
pub fn format_fixed(value: &BigDecimal, scale: i64) -> String {
	let rescaled = rescale(value, scale.max(0));
	let (digits, exponent) = rescaled.as_bigint_and_exponent();
	let negative = digits.sign() == Sign::Minus;
	let mut text = digits.magnitude().to_string();
	let exponent = exponent.max(0) as usize;
	if exponent > 0 {
		if text.len() <= exponent {
			text = format!("{}{}", "0".repeat(exponent + 1 - text.len()), text);
		}
		text.insert(text.len() - exponent, '.');
	}
	if negative {
		text.insert(0, '-');
	}
	text
}
