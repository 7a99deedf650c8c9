// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! LIKE pattern matching under a collation.

use std::cmp::Ordering;

use quarry_type::Collation;

#[derive(Clone, Debug, PartialEq)]
enum Token {
	Literal(String),
	/// `_`
	AnyOne,
	/// `%`
	AnySequence,
	/// `[abc]`, `[a-f]`, `[^abc]`
	Set {
		negated: bool,
		items: Vec<SetItem>,
	},
}

#[derive(Clone, Debug, PartialEq)]
enum SetItem {
	Char(String),
	Range(char, char),
}

#[derive(Clone, Debug)]
pub(crate) struct LikePattern {
	tokens: Vec<Token>,
	collation: Collation,
}

/// Folded form of a single character; whitespace is kept as is since the
/// collation key drops trailing spaces.
fn fold(collation: &Collation, c: char) -> String {
	if c.is_whitespace() {
		c.to_string()
	} else {
		collation.key(&c.to_string())
	}
}

impl LikePattern {
	pub(crate) fn new(pattern: &str, escape: Option<char>, collation: &Collation) -> Self {
		let mut tokens = Vec::new();
		let chars: Vec<char> = pattern.chars().collect();
		let mut i = 0;
		while i < chars.len() {
			let c = chars[i];
			if Some(c) == escape && i + 1 < chars.len() {
				tokens.push(Token::Literal(fold(collation, chars[i + 1])));
				i += 2;
				continue;
			}
			match c {
				'%' => {
					if tokens.last() != Some(&Token::AnySequence) {
						tokens.push(Token::AnySequence);
					}
				}
				'_' => tokens.push(Token::AnyOne),
				'[' => {
					if let Some(end) = chars[i + 1..].iter().position(|&c| c == ']').map(|p| p + i + 1) {
						tokens.push(parse_set(&chars[i + 1..end], collation));
						i = end + 1;
						continue;
					}
					tokens.push(Token::Literal(fold(collation, c)));
				}
				other => tokens.push(Token::Literal(fold(collation, other))),
			}
			i += 1;
		}
		Self {
			tokens,
			collation: collation.clone(),
		}
	}

	pub(crate) fn matches(&self, value: &str) -> bool {
		let value = value.trim_end_matches(' ');
		let folded: Vec<(char, String)> = value.chars().map(|c| (c, fold(&self.collation, c))).collect();
		self.match_from(0, &folded, 0)
	}

	fn match_from(&self, token: usize, value: &[(char, String)], pos: usize) -> bool {
		let Some(current) = self.tokens.get(token) else {
			return pos == value.len() || value[pos..].iter().all(|(c, _)| *c == ' ');
		};
		match current {
			Token::AnySequence => (pos..=value.len()).any(|start| self.match_from(token + 1, value, start)),
			Token::AnyOne => pos < value.len() && self.match_from(token + 1, value, pos + 1),
			Token::Literal(expected) => {
				pos < value.len() && value[pos].1 == *expected && self.match_from(token + 1, value, pos + 1)
			}
			Token::Set {
				negated,
				items,
			} => {
				if pos >= value.len() {
					return false;
				}
				let (c, folded) = &value[pos];
				let found = items.iter().any(|item| match item {
					SetItem::Char(expected) => folded == expected,
					SetItem::Range(low, high) => {
						let text = c.to_string();
						self.collation.compare(&text, &low.to_string()) != Ordering::Less
							&& self.collation.compare(&text, &high.to_string()) != Ordering::Greater
					}
				});
				found != *negated && self.match_from(token + 1, value, pos + 1)
			}
		}
	}
}

fn parse_set(body: &[char], collation: &Collation) -> Token {
	let (negated, body) = match body.first() {
		Some('^') if body.len() > 1 => (true, &body[1..]),
		_ => (false, body),
	};
	let mut items = Vec::new();
	let mut i = 0;
	while i < body.len() {
		if i + 2 < body.len() && body[i + 1] == '-' {
			items.push(SetItem::Range(body[i], body[i + 2]));
			i += 3;
		} else {
			items.push(SetItem::Char(fold(collation, body[i])));
			i += 1;
		}
	}
	Token::Set {
		negated,
		items,
	}
}
