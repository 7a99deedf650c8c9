// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Data model shared between plan construction and execution: rows and the
//! schemas describing them, the expression tree, sort keys, the remote data
//! source boundary and the options a statement executes with.

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub mod cancel;
pub mod expression;
pub mod join;
pub mod options;
pub mod row;
pub mod schema;
pub mod sort;
pub mod source;

pub use cancel::CancellationToken;
pub use expression::Expression;
pub use join::JoinType;
pub use options::ExecutionOptions;
pub use quarry_type::{
	Collation, Diagnostic, Error, ErrorKind, FromValue, GetType, IntoValue, Params, Result, Type, Value,
	error::diagnostic,
};
pub use row::Row;
pub use schema::{ColumnDef, Schema};
pub use sort::{SortDirection, SortKey};
pub use source::{
	Capabilities, ConditionOperator, ConditionValue, DataSource, DataSources, DmlRequest, Page, RemoteCondition,
	RemoteQuery,
};
