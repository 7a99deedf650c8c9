// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	cmp::Ordering,
	fmt::{Display, Formatter},
};

use quarry_type::{Collation, Value};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
	Asc,
	Desc,
}

impl SortDirection {
	pub fn apply(&self, ordering: Ordering) -> Ordering {
		match self {
			SortDirection::Asc => ordering,
			SortDirection::Desc => ordering.reverse(),
		}
	}
}

/// A column the rows are ordered by. The column is named the way the
/// producing schema resolves it (`column` or `alias.column`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
	pub column: String,
	pub direction: SortDirection,
}

impl SortKey {
	pub fn asc(column: impl Into<String>) -> Self {
		Self {
			column: column.into(),
			direction: SortDirection::Asc,
		}
	}

	pub fn desc(column: impl Into<String>) -> Self {
		Self {
			column: column.into(),
			direction: SortDirection::Desc,
		}
	}
}

impl Display for SortKey {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self.direction {
			SortDirection::Asc => write!(f, "{} ASC", self.column),
			SortDirection::Desc => write!(f, "{} DESC", self.column),
		}
	}
}

/// A sort key resolved against a schema: ordinal, direction and the
/// collation string values are compared with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedSortKey {
	pub ordinal: usize,
	pub direction: SortDirection,
	pub collation: Collation,
}

/// Compares two value slices key by key.
pub fn compare_by(left: &[Value], right: &[Value], keys: &[ResolvedSortKey]) -> Ordering {
	for key in keys {
		let l = left.get(key.ordinal).unwrap_or(&Value::Null);
		let r = right.get(key.ordinal).unwrap_or(&Value::Null);
		let ordering = key.direction.apply(l.compare(r, &key.collation));
		if ordering != Ordering::Equal {
			return ordering;
		}
	}
	Ordering::Equal
}
