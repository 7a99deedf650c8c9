// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Execution engine: compiles expressions, builds operator trees and runs
//! them pull-based against remote data sources.

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub use quarry_core::{Error, Result};

pub mod context;
pub mod cursor;
pub mod expression;
pub mod mutate;
pub mod planner;
pub mod reader;
pub mod session;
pub mod statement;
pub mod vm;

#[cfg(test)]
pub(crate) mod test_utils;

pub use context::{ConfirmDml, DmlConfirmation, DmlOperation, ExecutionContext, Variables};
pub use cursor::{CursorKind, CursorState, FetchDirection};
pub use mutate::{DeleteRoot, InsertRoot, UpdateRoot};
pub use expression::{Clause, CompiledExpr, Scope};
pub use planner::recursive::{RecursiveCte, RecursiveCteBuilder, RecursiveJoin};
pub use reader::DataReader;
pub use session::Session;
pub use statement::{Batch, Statement};
pub use vm::volcano::{
	aggregate::AggregateSpec,
	build::{ComputedColumn, ProjectColumn},
	query::{ExecutionPlan, NodeId},
	spool::adaptive::AdaptiveSpoolPolicy,
	window::WindowSpec,
};
