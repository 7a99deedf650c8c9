// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! End to end tests driving execution plans against in-memory data
//! sources.

use std::sync::Arc;

use quarry_core::{ColumnDef, DataSources, FromValue, Row, Schema, Type, Value};
use quarry_engine::ExecutionContext;
use quarry_testing::MemoryDataSource;

mod dml;
mod fallback;
mod join;
mod ordering;
mod recursive;
mod session;
mod spool;
mod window;

pub fn context(sources: Vec<Arc<MemoryDataSource>>) -> ExecutionContext {
	let mut registry = DataSources::new();
	for source in sources {
		registry.register(source);
	}
	ExecutionContext::new(registry)
}

pub fn int_schema(names: &[&str]) -> Schema {
	Schema::new(names.iter().map(|name| ColumnDef::new(*name, Type::Int)).collect())
}

pub fn int_rows(rows: &[&[i32]]) -> Vec<Vec<Value>> {
	rows.iter().map(|row| row.iter().map(|v| Value::Int(*v)).collect()).collect()
}

/// Column `ordinal` of every row as `i64`, `None` for NULL.
pub fn column(rows: &[Row], ordinal: usize) -> Vec<Option<i64>> {
	rows.iter().map(|row| Option::<i64>::from_value(&row[ordinal]).unwrap()).collect()
}
