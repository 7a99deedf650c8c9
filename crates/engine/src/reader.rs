// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{collections::VecDeque, slice::Iter};

use quarry_core::{ColumnDef, FromValue, Row, Schema, Type, Value};
use quarry_type::{
	error::diagnostic::runtime::{no_current_row, ordinal_out_of_range},
	return_error,
};
use tracing::instrument;

use crate::{
	context::ExecutionContext,
	statement::{Completion, Statement},
	vm::volcano::query::{ExecutionPlan, NodeId},
};

enum ResultSet<'a> {
	Streaming {
		plan: &'a ExecutionPlan,
		root: NodeId,
		schema: &'a Schema,
	},
	Buffered {
		schema: Schema,
		rows: VecDeque<Row>,
	},
}

impl ResultSet<'_> {
	fn schema(&self) -> &Schema {
		match self {
			ResultSet::Streaming {
				schema,
				..
			} => schema,
			ResultSet::Buffered {
				schema,
				..
			} => schema,
		}
	}
}

/// Forward-only reader over the result sets of a batch.
///
/// Statements run lazily: the reader executes the batch up to the next
/// statement that returns rows, and query rows are pulled from the plan one
/// `read` at a time. Dropping the reader ends the batch and discards its
/// variables.
pub struct DataReader<'a> {
	ctx: &'a mut ExecutionContext,
	pending: Iter<'a, Statement>,
	current: Option<ResultSet<'a>>,
	row: Option<Row>,
	records_affected: i64,
}

impl<'a> DataReader<'a> {
	pub(crate) fn open(ctx: &'a mut ExecutionContext, statements: &'a [Statement]) -> crate::Result<Self> {
		let mut reader = Self {
			ctx,
			pending: statements.iter(),
			current: None,
			row: None,
			records_affected: -1,
		};
		reader.advance()?;
		Ok(reader)
	}

	/// Runs statements until one produces a result set.
	fn advance(&mut self) -> crate::Result<bool> {
		self.current = None;
		self.row = None;
		for statement in self.pending.by_ref() {
			if let Statement::Query {
				plan,
				root,
			} = statement
			{
				self.ctx.begin_execution();
				plan.execute(*root, self.ctx)?;
				self.current = Some(ResultSet::Streaming {
					plan,
					root: *root,
					schema: plan.schema(*root)?,
				});
				return Ok(true);
			}
			match statement.run(self.ctx)? {
				Completion::None => {}
				Completion::Affected(count) => {
					self.records_affected = self.records_affected.max(0) + count as i64;
				}
				Completion::Rows {
					schema,
					rows,
				} => {
					self.current = Some(ResultSet::Buffered {
						schema,
						rows: rows.into(),
					});
					return Ok(true);
				}
			}
		}
		Ok(false)
	}

	/// Moves to the next row of the current result set.
	#[instrument(level = "trace", skip_all, name = "reader::read")]
	pub fn read(&mut self) -> crate::Result<bool> {
		self.ctx.cancel.check()?;
		self.row = match &mut self.current {
			None => None,
			Some(ResultSet::Streaming {
				plan,
				root,
				..
			}) => plan.next(*root, self.ctx)?,
			Some(ResultSet::Buffered {
				rows,
				..
			}) => rows.pop_front(),
		};
		Ok(self.row.is_some())
	}

	/// Skips the rest of the current result set and moves to the next one.
	pub fn next_result(&mut self) -> crate::Result<bool> {
		self.advance()
	}

	/// Runs the remaining statements, returning the records affected.
	pub fn close(mut self) -> crate::Result<i64> {
		while self.advance()? {}
		Ok(self.records_affected)
	}

	/// Records changed by the DML statements run so far, `-1` if none ran.
	pub fn records_affected(&self) -> i64 {
		self.records_affected
	}

	pub fn has_result(&self) -> bool {
		self.current.is_some()
	}

	pub fn schema(&self) -> Option<&Schema> {
		self.current.as_ref().map(ResultSet::schema)
	}

	pub fn field_count(&self) -> usize {
		self.schema().map_or(0, Schema::len)
	}

	pub fn column(&self, ordinal: usize) -> crate::Result<&ColumnDef> {
		let count = self.field_count();
		match self.schema().and_then(|s| s.column(ordinal)) {
			Some(column) => Ok(column),
			None => return_error!(ordinal_out_of_range(ordinal, count)),
		}
	}

	pub fn name(&self, ordinal: usize) -> crate::Result<&str> {
		Ok(&self.column(ordinal)?.name)
	}

	pub fn field_type(&self, ordinal: usize) -> crate::Result<Type> {
		Ok(self.column(ordinal)?.ty)
	}

	/// Ordinal of a column by case-insensitive name.
	pub fn ordinal(&self, name: &str) -> crate::Result<usize> {
		match self.schema() {
			Some(schema) => schema.resolve(name),
			None => return_error!(no_current_row()),
		}
	}

	pub fn value(&self, ordinal: usize) -> crate::Result<&Value> {
		let Some(row) = &self.row else {
			return_error!(no_current_row());
		};
		match row.get(ordinal) {
			Some(value) => Ok(value),
			None => return_error!(ordinal_out_of_range(ordinal, row.len())),
		}
	}

	pub fn is_null(&self, ordinal: usize) -> crate::Result<bool> {
		Ok(self.value(ordinal)?.is_null())
	}

	pub fn get<T: FromValue>(&self, ordinal: usize) -> crate::Result<T> {
		T::from_value(self.value(ordinal)?)
	}

	pub fn get_by_name<T: FromValue>(&self, name: &str) -> crate::Result<T> {
		self.get(self.ordinal(name)?)
	}
}

impl Drop for DataReader<'_> {
	// the batch ends with its reader; variables go with it
	fn drop(&mut self) {
		self.ctx.variables.clear();
	}
}
