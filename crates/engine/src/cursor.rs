// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Named cursors of a batch.
//!
//! The remote store has no server side cursors, so `OPEN` runs the cursor
//! query to completion and fetches walk the buffered rows.

use std::{
	collections::HashMap,
	fmt::{Display, Formatter},
	rc::Rc,
};

use quarry_core::{Row, Schema};
use quarry_type::{
	error::diagnostic::cursor::{
		already_exists, already_open, fetch_into_mismatch, fetch_type_not_allowed, not_found, not_open,
	},
	return_error,
};
use tracing::debug;

use crate::{
	context::ExecutionContext,
	vm::volcano::query::{ExecutionPlan, NodeId},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CursorKind {
	/// Only `FETCH NEXT` is allowed.
	#[default]
	ForwardOnly,
	/// Scrollable snapshot taken at `OPEN`.
	Static,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CursorState {
	Declared,
	Open,
	Closed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchDirection {
	Next,
	Prior,
	First,
	Last,
	Absolute(i64),
	Relative(i64),
}

impl Display for FetchDirection {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			FetchDirection::Next => "NEXT",
			FetchDirection::Prior => "PRIOR",
			FetchDirection::First => "FIRST",
			FetchDirection::Last => "LAST",
			FetchDirection::Absolute(_) => "ABSOLUTE",
			FetchDirection::Relative(_) => "RELATIVE",
		})
	}
}

struct Cursor {
	kind: CursorKind,
	plan: Rc<ExecutionPlan>,
	root: NodeId,
	state: CursorState,
	rows: Vec<Row>,
	/// 0 is before the first row, `rows.len() + 1` after the last.
	position: usize,
}

impl Cursor {
	fn seek(&mut self, direction: FetchDirection) -> crate::Result<Option<Row>> {
		if self.kind == CursorKind::ForwardOnly && direction != FetchDirection::Next {
			return_error!(fetch_type_not_allowed(&direction.to_string()));
		}
		let len = self.rows.len() as i64;
		let current = self.position as i64;
		let target = match direction {
			FetchDirection::Next => current + 1,
			FetchDirection::Prior => current - 1,
			FetchDirection::First => 1,
			FetchDirection::Last => len,
			FetchDirection::Absolute(n) if n < 0 => len + 1 + n,
			FetchDirection::Absolute(n) => n,
			FetchDirection::Relative(n) => current + n,
		};
		self.position = target.clamp(0, len + 1) as usize;
		if self.position == 0 || self.position > self.rows.len() {
			return Ok(None);
		}
		Ok(Some(self.rows[self.position - 1].clone()))
	}
}

/// Cursors declared in a batch, by case-insensitive name.
#[derive(Default)]
pub(crate) struct Cursors {
	cursors: HashMap<String, Cursor>,
}

impl Cursors {
	pub(crate) fn declare(
		&mut self,
		name: &str,
		kind: CursorKind,
		plan: Rc<ExecutionPlan>,
		root: NodeId,
	) -> crate::Result<()> {
		let key = name.to_lowercase();
		if self.cursors.contains_key(&key) {
			return_error!(already_exists(name));
		}
		self.cursors.insert(
			key,
			Cursor {
				kind,
				plan,
				root,
				state: CursorState::Declared,
				rows: vec![],
				position: 0,
			},
		);
		Ok(())
	}

	pub(crate) fn state(&self, name: &str) -> Option<CursorState> {
		self.cursors.get(&name.to_lowercase()).map(|c| c.state)
	}

	pub(crate) fn schema(&self, name: &str) -> crate::Result<Schema> {
		let cursor = self.get(name)?;
		Ok(cursor.plan.schema(cursor.root)?.clone())
	}

	fn get(&self, name: &str) -> crate::Result<&Cursor> {
		match self.cursors.get(&name.to_lowercase()) {
			Some(cursor) => Ok(cursor),
			None => return_error!(not_found(name)),
		}
	}

	fn get_mut(&mut self, name: &str) -> crate::Result<&mut Cursor> {
		match self.cursors.get_mut(&name.to_lowercase()) {
			Some(cursor) => Ok(cursor),
			None => return_error!(not_found(name)),
		}
	}

	fn open_mut(&mut self, name: &str) -> crate::Result<&mut Cursor> {
		let cursor = self.get_mut(name)?;
		if cursor.state != CursorState::Open {
			return_error!(not_open(name));
		}
		Ok(cursor)
	}
}

/// `OPEN name`
pub(crate) fn open(ctx: &mut ExecutionContext, name: &str) -> crate::Result<()> {
	let (plan, root) = {
		let cursor = ctx.cursors.get(name)?;
		if cursor.state == CursorState::Open {
			return_error!(already_open(name));
		}
		(cursor.plan.clone(), cursor.root)
	};

	ctx.begin_execution();
	let rows = plan.collect(root, ctx)?;
	debug!(cursor = name, rows = rows.len(), "cursor opened");

	let cursor = ctx.cursors.get_mut(name)?;
	cursor.rows = rows;
	cursor.position = 0;
	cursor.state = CursorState::Open;
	ctx.rowcount = cursor.rows.len() as i64;
	Ok(())
}

/// `FETCH direction FROM name`, updating `@@FETCH_STATUS`.
pub(crate) fn fetch(ctx: &mut ExecutionContext, name: &str, direction: FetchDirection) -> crate::Result<Option<Row>> {
	let row = ctx.cursors.open_mut(name)?.seek(direction)?;
	ctx.fetch_status = if row.is_some() {
		0
	} else {
		-1
	};
	ctx.rowcount = row.is_some() as i64;
	Ok(row)
}

/// `FETCH direction FROM name INTO @a, @b, ...`. Variables keep their values
/// when the fetch moves past either end.
pub(crate) fn fetch_into(
	ctx: &mut ExecutionContext,
	name: &str,
	direction: FetchDirection,
	variables: &[String],
) -> crate::Result<()> {
	let width = ctx.cursors.schema(name)?.len();
	if width != variables.len() {
		return_error!(fetch_into_mismatch(width, variables.len()));
	}
	if let Some(row) = fetch(ctx, name, direction)? {
		for (variable, value) in variables.iter().zip(row.iter()) {
			ctx.variables.set(variable, value)?;
		}
	}
	Ok(())
}

/// `CLOSE name`; the cursor can be opened again.
pub(crate) fn close(ctx: &mut ExecutionContext, name: &str) -> crate::Result<()> {
	let cursor = ctx.cursors.open_mut(name)?;
	cursor.rows = vec![];
	cursor.position = 0;
	cursor.state = CursorState::Closed;
	Ok(())
}

/// `DEALLOCATE name`
pub(crate) fn deallocate(ctx: &mut ExecutionContext, name: &str) -> crate::Result<()> {
	if ctx.cursors.cursors.remove(&name.to_lowercase()).is_none() {
		return_error!(not_found(name));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use quarry_core::Type;

	use super::*;
	use crate::test_utils::{context, int_schema, ints};

	fn declare(ctx: &mut ExecutionContext, name: &str, kind: CursorKind) {
		let mut plan = ExecutionPlan::new();
		let root = plan.constant_scan(int_schema(&["n"]), vec![ints(&[1]), ints(&[2]), ints(&[3])]).unwrap();
		ctx.cursors.declare(name, kind, Rc::new(plan), root).unwrap();
	}

	fn first(row: Option<Row>) -> Option<i32> {
		row.map(|r| match r[0] {
			quarry_core::Value::Int(v) => v,
			ref other => panic!("unexpected {:?}", other),
		})
	}

	#[test]
	fn test_forward_only_fetch() {
		let mut ctx = context();
		declare(&mut ctx, "c", CursorKind::ForwardOnly);
		open(&mut ctx, "c").unwrap();
		assert_eq!(first(fetch(&mut ctx, "c", FetchDirection::Next).unwrap()), Some(1));
		assert_eq!(ctx.fetch_status(), 0);
		assert_eq!(fetch(&mut ctx, "c", FetchDirection::Prior).unwrap_err().number(), 16911);
		fetch(&mut ctx, "c", FetchDirection::Next).unwrap();
		fetch(&mut ctx, "c", FetchDirection::Next).unwrap();
		assert_eq!(fetch(&mut ctx, "c", FetchDirection::Next).unwrap(), None);
		assert_eq!(ctx.fetch_status(), -1);
	}

	#[test]
	fn test_static_scrolling() {
		let mut ctx = context();
		declare(&mut ctx, "c", CursorKind::Static);
		open(&mut ctx, "c").unwrap();
		assert_eq!(first(fetch(&mut ctx, "c", FetchDirection::Last).unwrap()), Some(3));
		assert_eq!(first(fetch(&mut ctx, "c", FetchDirection::Prior).unwrap()), Some(2));
		assert_eq!(first(fetch(&mut ctx, "c", FetchDirection::Absolute(-3)).unwrap()), Some(1));
		assert_eq!(first(fetch(&mut ctx, "c", FetchDirection::Relative(5)).unwrap()), None);
		assert_eq!(first(fetch(&mut ctx, "c", FetchDirection::Prior).unwrap()), Some(3));
		assert_eq!(first(fetch(&mut ctx, "c", FetchDirection::First).unwrap()), Some(1));
	}

	#[test]
	fn test_lifecycle_errors() {
		let mut ctx = context();
		declare(&mut ctx, "c", CursorKind::ForwardOnly);

		let plan = ExecutionPlan::new();
		assert_eq!(
			ctx.cursors.declare("C", CursorKind::Static, Rc::new(plan), NodeId(0)).unwrap_err().number(),
			16915
		);
		assert_eq!(fetch(&mut ctx, "c", FetchDirection::Next).unwrap_err().number(), 16917);
		open(&mut ctx, "c").unwrap();
		assert_eq!(open(&mut ctx, "c").unwrap_err().number(), 16905);
		close(&mut ctx, "c").unwrap();
		assert_eq!(ctx.cursors.state("c"), Some(CursorState::Closed));
		assert_eq!(close(&mut ctx, "c").unwrap_err().number(), 16917);
		open(&mut ctx, "c").unwrap();
		deallocate(&mut ctx, "c").unwrap();
		assert_eq!(deallocate(&mut ctx, "c").unwrap_err().number(), 16916);
		assert_eq!(open(&mut ctx, "missing").unwrap_err().number(), 16916);
	}

	#[test]
	fn test_fetch_into_variables() {
		let mut ctx = context();
		declare(&mut ctx, "c", CursorKind::ForwardOnly);
		ctx.variables.declare("@n", Type::BigInt).unwrap();
		ctx.variables.declare("@m", Type::BigInt).unwrap();
		open(&mut ctx, "c").unwrap();

		let both = vec!["@n".to_string(), "@m".to_string()];
		assert_eq!(fetch_into(&mut ctx, "c", FetchDirection::Next, &both).unwrap_err().number(), 16924);

		let one = vec!["@n".to_string()];
		fetch_into(&mut ctx, "c", FetchDirection::Next, &one).unwrap();
		fetch_into(&mut ctx, "c", FetchDirection::Next, &one).unwrap();
		assert_eq!(ctx.variables.get("@n").unwrap(), &quarry_core::Value::BigInt(2));
	}
}
