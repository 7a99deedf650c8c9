// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

//! String comparison rules of SQL collations.
//!
//! A collation folds strings into comparison keys according to its case,
//! accent, kana and width sensitivity. Trailing spaces never take part in a
//! comparison.

use std::{
	cmp::Ordering,
	fmt::{Display, Formatter},
	str::FromStr,
	sync::LazyLock,
};

use serde::{Deserialize, Serialize};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

mod locale;
mod parse;

pub use parse::{CollationError, CollationErrorReason};

pub const DEFAULT_COLLATION: &str = "SQL_Latin1_General_CP1_CI_AS";

static DEFAULT: LazyLock<Collation> = LazyLock::new(|| Collation {
	name: DEFAULT_COLLATION.to_string(),
	locale: "Latin1_General".to_string(),
	version: None,
	case_sensitive: false,
	accent_sensitive: true,
	kana_sensitive: false,
	width_sensitive: false,
	supplementary: false,
	utf8: false,
	binary: None,
	dotted_i: false,
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOrder {
	/// First character by code point, the rest by UTF-16 code unit bytes.
	Bin,
	/// Code point order.
	Bin2,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Collation {
	name: String,
	locale: String,
	version: Option<u32>,
	case_sensitive: bool,
	accent_sensitive: bool,
	kana_sensitive: bool,
	width_sensitive: bool,
	supplementary: bool,
	utf8: bool,
	binary: Option<BinaryOrder>,
	dotted_i: bool,
}

impl Default for Collation {
	fn default() -> Self {
		DEFAULT.clone()
	}
}

impl Collation {
	pub fn parse(name: &str) -> Result<Collation, CollationError> {
		parse::parse(name)
	}

	/// Shared instance of the server default collation.
	pub fn default_ref() -> &'static Collation {
		&DEFAULT
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn locale(&self) -> &str {
		&self.locale
	}

	pub fn is_case_sensitive(&self) -> bool {
		self.case_sensitive
	}

	pub fn is_accent_sensitive(&self) -> bool {
		self.accent_sensitive
	}

	pub fn binary(&self) -> Option<BinaryOrder> {
		self.binary
	}

	/// Comparison key: two strings compare equal under this collation exactly
	/// when their keys are equal.
	pub fn key(&self, value: &str) -> String {
		let base = self.base(value);
		if self.binary.is_some() {
			return base;
		}
		let base = if self.accent_sensitive {
			base
		} else {
			strip_accents(&base)
		};
		if self.case_sensitive {
			base
		} else {
			self.fold_case(&base)
		}
	}

	pub fn compare(&self, left: &str, right: &str) -> Ordering {
		if let Some(order) = self.binary {
			let left = left.trim_end_matches(' ');
			let right = right.trim_end_matches(' ');
			return match order {
				BinaryOrder::Bin2 => left.chars().cmp(right.chars()),
				BinaryOrder::Bin => compare_bin(left, right),
			};
		}

		let left = self.base(left);
		let right = self.base(right);
		let left_plain = strip_accents(&left);
		let right_plain = strip_accents(&right);

		let primary = self.fold_case(&left_plain).cmp(&self.fold_case(&right_plain));
		if primary != Ordering::Equal {
			return primary;
		}
		if self.accent_sensitive {
			let accent = self.fold_case(&left).cmp(&self.fold_case(&right));
			if accent != Ordering::Equal {
				return accent;
			}
		}
		if self.case_sensitive {
			return if self.accent_sensitive {
				case_order(&left, &right)
			} else {
				case_order(&left_plain, &right_plain)
			};
		}
		Ordering::Equal
	}

	pub fn equals(&self, left: &str, right: &str) -> bool {
		self.compare(left, right) == Ordering::Equal
	}

	/// Canonical composition with trailing spaces removed and the width and
	/// kana foldings the collation ignores applied.
	fn base(&self, value: &str) -> String {
		let trimmed = value.trim_end_matches(' ');
		if self.binary.is_some() {
			return trimmed.to_string();
		}
		trimmed.nfc()
			.map(|c| {
				let c = if self.width_sensitive {
					c
				} else {
					narrow(c)
				};
				if self.kana_sensitive {
					c
				} else {
					hiragana(c)
				}
			})
			.collect()
	}

	fn fold_case(&self, value: &str) -> String {
		if !self.dotted_i {
			return value.to_lowercase();
		}
		let mut folded = String::with_capacity(value.len());
		for c in value.chars() {
			match c {
				'I' => folded.push('ı'),
				'İ' => folded.push('i'),
				other => folded.extend(other.to_lowercase()),
			}
		}
		folded
	}
}

impl FromStr for Collation {
	type Err = CollationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Collation::parse(s)
	}
}

impl Display for Collation {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.name)
	}
}

fn strip_accents(value: &str) -> String {
	value.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect()
}

/// Full width forms fold to their ASCII counterparts.
fn narrow(c: char) -> char {
	match c as u32 {
		0xFF01..=0xFF5E => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
		0x3000 => ' ',
		_ => c,
	}
}

/// Katakana folds to hiragana.
fn hiragana(c: char) -> char {
	match c as u32 {
		0x30A1..=0x30F6 => char::from_u32(c as u32 - 0x60).unwrap_or(c),
		_ => c,
	}
}

/// Tie break between strings equal but for case: lowercase sorts first.
fn case_order(left: &str, right: &str) -> Ordering {
	for (l, r) in left.chars().zip(right.chars()) {
		if l != r {
			return match (l.is_lowercase(), r.is_lowercase()) {
				(true, false) => Ordering::Less,
				(false, true) => Ordering::Greater,
				_ => l.cmp(&r),
			};
		}
	}
	left.chars().count().cmp(&right.chars().count())
}

fn compare_bin(left: &str, right: &str) -> Ordering {
	let mut l = left.chars();
	let mut r = right.chars();
	match l.next().cmp(&r.next()) {
		Ordering::Equal => {}
		other => return other,
	}
	let l_bytes = l.as_str().encode_utf16().flat_map(u16::to_le_bytes);
	let r_bytes = r.as_str().encode_utf16().flat_map(u16::to_le_bytes);
	l_bytes.cmp(r_bytes)
}

#[cfg(test)]
mod tests {
	use super::*;

	const WORDS: [&str; 4] = ["hello", "Héllo", "héllo", "Hello"];

	fn keys(name: &str) -> Vec<String> {
		let collation = Collation::parse(name).unwrap();
		WORDS.iter().map(|w| collation.key(w)).collect()
	}

	#[test]
	fn test_ci_ai_folds_everything() {
		let keys = keys("Latin1_General_CI_AI");
		assert!(keys.iter().all(|k| *k == keys[0]));
	}

	#[test]
	fn test_cs_as_keeps_everything_apart() {
		let keys = keys("Latin1_General_CS_AS");
		for i in 0..keys.len() {
			for j in (i + 1)..keys.len() {
				assert_ne!(keys[i], keys[j], "{} vs {}", WORDS[i], WORDS[j]);
			}
		}
	}

	#[test]
	fn test_cs_ai_folds_accents_only() {
		let keys = keys("Latin1_General_CS_AI");
		// hello = héllo, Héllo = Hello
		assert_eq!(keys[0], keys[2]);
		assert_eq!(keys[1], keys[3]);
		assert_ne!(keys[0], keys[3]);
	}

	#[test]
	fn test_ci_as_folds_case_only() {
		let keys = keys("Latin1_General_CI_AS");
		// hello = Hello, Héllo = héllo
		assert_eq!(keys[0], keys[3]);
		assert_eq!(keys[1], keys[2]);
		assert_ne!(keys[0], keys[1]);
	}

	#[test]
	fn test_compare_agrees_with_keys() {
		for name in ["Latin1_General_CI_AI", "Latin1_General_CS_AS", "Latin1_General_CS_AI", "Latin1_General_CI_AS"] {
			let collation = Collation::parse(name).unwrap();
			for a in WORDS {
				for b in WORDS {
					assert_eq!(collation.equals(a, b), collation.key(a) == collation.key(b), "{} {} {}", name, a, b);
				}
			}
		}
	}

	#[test]
	fn test_lowercase_sorts_before_uppercase() {
		let collation = Collation::parse("Latin1_General_CS_AS").unwrap();
		assert_eq!(collation.compare("abc", "Abc"), Ordering::Less);
		assert_eq!(collation.compare("Abc", "abd"), Ordering::Less);
	}

	#[test]
	fn test_trailing_spaces_ignored() {
		let collation = Collation::parse("Latin1_General_BIN2").unwrap();
		assert_eq!(collation.compare("abc  ", "abc"), Ordering::Equal);
		assert_eq!(collation.compare("B", "a"), Ordering::Less);
	}

	#[test]
	fn test_turkish_dotless_i() {
		let turkish = Collation::parse("Turkish_CI_AS").unwrap();
		assert!(turkish.equals("I", "ı"));
		assert!(!turkish.equals("I", "i"));
		let latin = Collation::parse("Latin1_General_CI_AS").unwrap();
		assert!(latin.equals("I", "i"));
	}

	#[test]
	fn test_width_insensitive_by_default() {
		let collation = Collation::parse("Japanese_CI_AS").unwrap();
		assert!(collation.equals("ＡＢＣ", "abc"));
		let collation = Collation::parse("Japanese_CI_AS_WS").unwrap();
		assert!(!collation.equals("ＡＢＣ", "abc"));
	}

	#[test]
	fn test_default_collation_is_case_insensitive() {
		assert!(Collation::default().equals("ABC", "abc"));
		assert_eq!(Collation::default().name(), DEFAULT_COLLATION);
	}
}
