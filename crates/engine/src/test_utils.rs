// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_core::{ColumnDef, DataSources, Schema, Type, Value};

use crate::context::ExecutionContext;

pub(crate) fn context() -> ExecutionContext {
	ExecutionContext::new(DataSources::new())
}

/// Schema of nullable `Int` columns.
pub(crate) fn int_schema(names: &[&str]) -> Schema {
	Schema::new(names.iter().map(|name| ColumnDef::new(*name, Type::Int)).collect())
}

pub(crate) fn ints(values: &[i32]) -> Vec<Value> {
	values.iter().map(|v| Value::Int(*v)).collect()
}
