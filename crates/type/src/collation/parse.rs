// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use thiserror::Error;

use crate::{
	collation::{BinaryOrder, Collation, locale},
	error::{Diagnostic, IntoDiagnostic, diagnostic::collation::invalid_collation},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid collation '{name}': {reason}")]
pub struct CollationError {
	pub name: String,
	pub reason: CollationErrorReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollationErrorReason {
	#[error("the collation name is empty")]
	Empty,
	#[error("'{0}' is not a recognized locale")]
	UnknownLocale(String),
	#[error("'{0}' is not a recognized collation flag")]
	UnknownFlag(String),
	#[error("both case (CI/CS) and accent (AI/AS) sensitivity must be specified")]
	MissingSensitivity,
	#[error("flag '{0}' is specified more than once")]
	DuplicateFlag(String),
	#[error("flags '{0}' and '{1}' contradict each other")]
	ConflictingFlags(String, String),
	#[error("binary collations cannot specify '{0}'")]
	BinaryWithSensitivity(String),
}

impl IntoDiagnostic for CollationError {
	fn into_diagnostic(self) -> Diagnostic {
		invalid_collation(&self.name, &self.reason.to_string())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
	CaseInsensitive,
	CaseSensitive,
	AccentInsensitive,
	AccentSensitive,
	KanaSensitive,
	WidthSensitive,
	Supplementary,
	Utf8,
	Bin,
	Bin2,
	Version(u32),
	CodePage,
	Preferred,
}

fn token(text: &str) -> Option<Token> {
	let upper = text.to_ascii_uppercase();
	Some(match upper.as_str() {
		"CI" => Token::CaseInsensitive,
		"CS" => Token::CaseSensitive,
		"AI" => Token::AccentInsensitive,
		"AS" => Token::AccentSensitive,
		"KS" => Token::KanaSensitive,
		"WS" => Token::WidthSensitive,
		"SC" => Token::Supplementary,
		"UTF8" => Token::Utf8,
		"BIN" => Token::Bin,
		"BIN2" => Token::Bin2,
		"PREF" => Token::Preferred,
		_ if !upper.is_empty() && upper.bytes().all(|b| b.is_ascii_digit()) => Token::Version(upper.parse().ok()?),
		_ if upper.len() > 2 && upper.starts_with("CP") && upper[2..].bytes().all(|b| b.is_ascii_digit()) => {
			Token::CodePage
		}
		_ => return None,
	})
}

pub(crate) fn parse(name: &str) -> Result<Collation, CollationError> {
	let fail = |reason| CollationError {
		name: name.to_string(),
		reason,
	};

	let trimmed = name.trim();
	if trimmed.is_empty() {
		return Err(fail(CollationErrorReason::Empty));
	}

	let mut parts: Vec<&str> = trimmed.split('_').collect();
	if parts.len() > 1 && parts[0].eq_ignore_ascii_case("SQL") {
		parts.remove(0);
	}

	let split = parts.iter().position(|p| token(p).is_some()).unwrap_or(parts.len());
	let locale_name = parts[..split].join("_");
	let locale = locale::lookup(&locale_name).ok_or_else(|| fail(CollationErrorReason::UnknownLocale(locale_name.clone())))?;

	let mut seen: Vec<(Token, &str)> = Vec::new();
	for part in &parts[split..] {
		let Some(token) = token(part) else {
			return Err(fail(CollationErrorReason::UnknownFlag(part.to_string())));
		};
		if seen.iter().any(|(t, _)| *t == token) {
			return Err(fail(CollationErrorReason::DuplicateFlag(part.to_string())));
		}
		seen.push((token, part));
	}

	let find = |wanted: Token| seen.iter().find(|(t, _)| *t == wanted).map(|(_, text)| *text);

	for (a, b) in [
		(Token::CaseInsensitive, Token::CaseSensitive),
		(Token::AccentInsensitive, Token::AccentSensitive),
		(Token::Bin, Token::Bin2),
	] {
		if let (Some(x), Some(y)) = (find(a), find(b)) {
			return Err(fail(CollationErrorReason::ConflictingFlags(x.to_string(), y.to_string())));
		}
	}

	let binary = match (find(Token::Bin), find(Token::Bin2)) {
		(Some(_), _) => Some(BinaryOrder::Bin),
		(_, Some(_)) => Some(BinaryOrder::Bin2),
		_ => None,
	};

	let case = find(Token::CaseInsensitive).or(find(Token::CaseSensitive));
	let accent = find(Token::AccentInsensitive).or(find(Token::AccentSensitive));

	if binary.is_some() {
		for wanted in [
			Token::CaseInsensitive,
			Token::CaseSensitive,
			Token::AccentInsensitive,
			Token::AccentSensitive,
			Token::KanaSensitive,
			Token::WidthSensitive,
		] {
			if let Some(text) = find(wanted) {
				return Err(fail(CollationErrorReason::BinaryWithSensitivity(text.to_string())));
			}
		}
	} else if case.is_none() || accent.is_none() {
		return Err(fail(CollationErrorReason::MissingSensitivity));
	}

	let version = seen.iter().find_map(|(t, _)| match t {
		Token::Version(v) => Some(*v),
		_ => None,
	});

	Ok(Collation {
		name: trimmed.to_string(),
		locale: locale.to_string(),
		version,
		case_sensitive: binary.is_some() || find(Token::CaseSensitive).is_some(),
		accent_sensitive: binary.is_some() || find(Token::AccentSensitive).is_some(),
		kana_sensitive: binary.is_some() || find(Token::KanaSensitive).is_some(),
		width_sensitive: binary.is_some() || find(Token::WidthSensitive).is_some(),
		supplementary: find(Token::Supplementary).is_some(),
		utf8: find(Token::Utf8).is_some(),
		binary,
		dotted_i: locale::has_dotted_i(locale),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn reason(name: &str) -> CollationErrorReason {
		parse(name).unwrap_err().reason
	}

	#[test]
	fn test_parse_common_names() {
		let c = parse("Latin1_General_CI_AS").unwrap();
		assert!(!c.case_sensitive && c.accent_sensitive);
		assert_eq!(c.locale, "Latin1_General");

		let c = parse("SQL_Latin1_General_CP1_CS_AS").unwrap();
		assert!(c.case_sensitive && c.accent_sensitive);

		let c = parse("Latin1_General_100_CI_AI_SC_UTF8").unwrap();
		assert_eq!(c.version, Some(100));
		assert!(c.supplementary && c.utf8);

		let c = parse("Japanese_XJIS_140_CS_AS_KS_WS").unwrap();
		assert!(c.kana_sensitive && c.width_sensitive);

		let c = parse("Latin1_General_BIN2").unwrap();
		assert_eq!(c.binary, Some(BinaryOrder::Bin2));
	}

	#[test]
	fn test_missing_sensitivity() {
		assert_eq!(reason("Latin1_General_CI"), CollationErrorReason::MissingSensitivity);
		assert_eq!(reason("Latin1_General"), CollationErrorReason::MissingSensitivity);
	}

	#[test]
	fn test_conflicting_and_duplicate_flags() {
		assert_eq!(
			reason("Latin1_General_CI_CS_AS"),
			CollationErrorReason::ConflictingFlags("CI".to_string(), "CS".to_string())
		);
		assert_eq!(reason("Latin1_General_CI_AS_CI"), CollationErrorReason::DuplicateFlag("CI".to_string()));
	}

	#[test]
	fn test_binary_with_sensitivity() {
		assert_eq!(
			reason("Latin1_General_BIN_CS"),
			CollationErrorReason::BinaryWithSensitivity("CS".to_string())
		);
	}

	#[test]
	fn test_unknown_locale() {
		assert_eq!(reason("Klingon_CI_AS"), CollationErrorReason::UnknownLocale("Klingon".to_string()));
		assert_eq!(reason(""), CollationErrorReason::Empty);
	}

	#[test]
	fn test_error_number() {
		let err: crate::Error = parse("Klingon_CI_AS").unwrap_err().into();
		assert_eq!(err.number(), 448);
	}
}
