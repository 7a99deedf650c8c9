// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Test support: an in-memory [`DataSource`](quarry_core::DataSource) that
//! answers declarative queries, applies DML and records every request it
//! receives.

mod memory;

pub use memory::{Entity, MemoryDataSource, NativeHandler};

use quarry_core::{Row, Value};

/// Builds a row from anything convertible into values.
#[macro_export]
macro_rules! row {
	($($value:expr),* $(,)?) => {
		::quarry_core::Row::new(vec![$(::quarry_core::IntoValue::into_value($value)),*])
	};
}

pub fn rows(values: Vec<Vec<Value>>) -> Vec<Row> {
	values.into_iter().map(Row::new).collect()
}
