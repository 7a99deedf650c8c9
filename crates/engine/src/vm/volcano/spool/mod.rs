// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Operators that cache rows: eager replay, the work table of recursive
//! queries and keyed memoization.

use quarry_core::Row;

use crate::{
	context::ExecutionContext,
	vm::volcano::query::{ExecutionPlan, NodeId},
};

pub mod adaptive;
pub(crate) mod consumer;
pub(crate) mod index;
pub(crate) mod stack;
pub(crate) mod table;

/// Executes `input` and buffers all of its rows, polling for cancellation.
pub(crate) fn drain(plan: &ExecutionPlan, input: NodeId, ctx: &mut ExecutionContext) -> crate::Result<Vec<Row>> {
	plan.execute(input, ctx)?;
	let mut rows = Vec::new();
	loop {
		ctx.cancel.check()?;
		match plan.next(input, ctx)? {
			Some(row) => rows.push(row),
			None => return Ok(rows),
		}
	}
}
