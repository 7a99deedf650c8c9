// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{Display, Formatter},
	ops::Index,
	sync::Arc,
};

use quarry_type::Value;

/// An immutable row of values, addressed by ordinal.
///
/// Rows are shared between operators (spool caches, join buffers, the
/// reader) so cloning only bumps a reference count.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Row(Arc<[Value]>);

impl Row {
	pub fn new(values: Vec<Value>) -> Self {
		Self(values.into())
	}

	pub fn empty() -> Self {
		Self(Arc::from(Vec::new()))
	}

	/// A row of `len` NULLs, used to pad the unmatched side of outer joins.
	pub fn nulls(len: usize) -> Self {
		Self::new(vec![Value::Null; len])
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn get(&self, ordinal: usize) -> Option<&Value> {
		self.0.get(ordinal)
	}

	pub fn values(&self) -> &[Value] {
		&self.0
	}

	pub fn iter(&self) -> impl Iterator<Item = &Value> {
		self.0.iter()
	}

	/// The values of `self` followed by those of `other`.
	pub fn concat(&self, other: &Row) -> Row {
		let mut values = Vec::with_capacity(self.len() + other.len());
		values.extend_from_slice(&self.0);
		values.extend_from_slice(&other.0);
		Row::new(values)
	}

	/// The row with `extra` values appended.
	pub fn extend(&self, extra: impl IntoIterator<Item = Value>) -> Row {
		let mut values = self.0.to_vec();
		values.extend(extra);
		Row::new(values)
	}

	/// A row made of the values at `ordinals`, in that order.
	pub fn project(&self, ordinals: &[usize]) -> Row {
		ordinals.iter().map(|&i| self.0.get(i).cloned().unwrap_or(Value::Null)).collect()
	}

	pub fn to_vec(&self) -> Vec<Value> {
		self.0.to_vec()
	}
}

impl Index<usize> for Row {
	type Output = Value;

	fn index(&self, index: usize) -> &Self::Output {
		&self.0[index]
	}
}

impl From<Vec<Value>> for Row {
	fn from(values: Vec<Value>) -> Self {
		Row::new(values)
	}
}

impl FromIterator<Value> for Row {
	fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
		Row::new(iter.into_iter().collect())
	}
}

impl Display for Row {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str("(")?;
		for (i, value) in self.0.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			Display::fmt(value, f)?;
		}
		f.write_str(")")
	}
}

/// Builds a [`Row`] from values convertible with
/// [`IntoValue`](quarry_type::IntoValue).
#[macro_export]
macro_rules! row {
	() => {
		$crate::row::Row::empty()
	};
	($($value:expr),+ $(,)?) => {
		$crate::row::Row::new(vec![$($crate::IntoValue::into_value($value)),+])
	};
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_row_macro() {
		let row = row![1, "a", Value::Null];
		assert_eq!(row.len(), 3);
		assert_eq!(row[0], Value::Int(1));
		assert_eq!(row[1], Value::nvarchar("a"));
		assert!(row[2].is_null());
	}

	#[test]
	fn test_concat_and_project() {
		let left = row![1, 2];
		let right = row![3];
		let both = left.concat(&right);
		assert_eq!(both, row![1, 2, 3]);
		assert_eq!(both.project(&[2, 0]), row![3, 1]);
	}

	#[test]
	fn test_clone_shares_values() {
		let row = row!["shared"];
		let copy = row.clone();
		assert!(std::ptr::eq(row.values(), copy.values()));
	}

	#[test]
	fn test_display() {
		assert_eq!(row![1, Value::Null, "x"].to_string(), "(1, NULL, x)");
	}
}
