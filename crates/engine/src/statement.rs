// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Statements of a batch. Queries stream their rows through the
//! [`DataReader`](crate::DataReader); every other statement runs to
//! completion when the reader reaches it.

use std::rc::Rc;

use quarry_core::{Expression, Row, Schema, Type};
use tracing::{debug, instrument};

use crate::{
	context::ExecutionContext,
	cursor::{self, CursorKind, FetchDirection},
	expression::{Clause, ExpressionCompiler, Scope},
	mutate::{DeleteRoot, InsertRoot, UpdateRoot},
	vm::volcano::query::{ExecutionPlan, NodeId},
};

pub enum Statement {
	Query {
		plan: ExecutionPlan,
		root: NodeId,
	},
	Insert {
		plan: ExecutionPlan,
		root: InsertRoot,
	},
	Update {
		plan: ExecutionPlan,
		root: UpdateRoot,
	},
	Delete {
		plan: ExecutionPlan,
		root: DeleteRoot,
	},
	/// `DECLARE @name type [= value]`
	Declare {
		name: String,
		ty: Type,
		value: Option<Expression>,
	},
	/// `SET @name = value`
	Set {
		name: String,
		value: Expression,
	},
	DeclareCursor {
		name: String,
		kind: CursorKind,
		plan: Rc<ExecutionPlan>,
		root: NodeId,
	},
	OpenCursor(String),
	/// Without `into` the fetched row is returned as a result set.
	Fetch {
		cursor: String,
		direction: FetchDirection,
		into: Vec<String>,
	},
	CloseCursor(String),
	DeallocateCursor(String),
}

impl Statement {
	pub fn query(plan: ExecutionPlan, root: NodeId) -> Self {
		Statement::Query {
			plan,
			root,
		}
	}

	pub fn declare(name: impl Into<String>, ty: Type, value: Option<Expression>) -> Self {
		Statement::Declare {
			name: name.into(),
			ty,
			value,
		}
	}

	pub fn set(name: impl Into<String>, value: Expression) -> Self {
		Statement::Set {
			name: name.into(),
			value,
		}
	}

	pub fn declare_cursor(name: impl Into<String>, kind: CursorKind, plan: ExecutionPlan, root: NodeId) -> Self {
		Statement::DeclareCursor {
			name: name.into(),
			kind,
			plan: Rc::new(plan),
			root,
		}
	}

	pub fn fetch(cursor: impl Into<String>, direction: FetchDirection) -> Self {
		Statement::Fetch {
			cursor: cursor.into(),
			direction,
			into: vec![],
		}
	}

	pub fn fetch_into(cursor: impl Into<String>, direction: FetchDirection, into: Vec<String>) -> Self {
		Statement::Fetch {
			cursor: cursor.into(),
			direction,
			into,
		}
	}

	pub(crate) fn name(&self) -> &'static str {
		match self {
			Statement::Query {
				..
			} => "SELECT",
			Statement::Insert {
				..
			} => "INSERT",
			Statement::Update {
				..
			} => "UPDATE",
			Statement::Delete {
				..
			} => "DELETE",
			Statement::Declare {
				..
			}
			| Statement::DeclareCursor {
				..
			} => "DECLARE",
			Statement::Set {
				..
			} => "SET",
			Statement::OpenCursor(_) => "OPEN",
			Statement::Fetch {
				..
			} => "FETCH",
			Statement::CloseCursor(_) => "CLOSE",
			Statement::DeallocateCursor(_) => "DEALLOCATE",
		}
	}

	/// Runs a statement that is not a streaming query.
	#[instrument(level = "debug", skip_all, name = "statement::run", fields(statement = self.name()))]
	pub(crate) fn run(&self, ctx: &mut ExecutionContext) -> crate::Result<Completion> {
		ctx.begin_execution();
		match self {
			Statement::Query {
				plan,
				root,
			} => {
				let rows = plan.collect(*root, ctx)?;
				Ok(Completion::rows(plan.schema(*root)?.clone(), rows))
			}
			Statement::Insert {
				plan,
				root,
			} => Ok(Completion::affected(root.execute(plan, ctx)?)),
			Statement::Update {
				plan,
				root,
			} => Ok(Completion::affected(root.execute(plan, ctx)?)),
			Statement::Delete {
				plan,
				root,
			} => Ok(Completion::affected(root.execute(plan, ctx)?)),
			Statement::Declare {
				name,
				ty,
				value,
			} => {
				let value = value.as_ref().map(|v| evaluate(v, ctx)).transpose()?;
				ctx.variables.declare(name, *ty)?;
				if let Some(value) = value {
					ctx.variables.set(name, &value)?;
				}
				Ok(Completion::None)
			}
			Statement::Set {
				name,
				value,
			} => {
				let value = evaluate(value, ctx)?;
				ctx.variables.set(name, &value)?;
				Ok(Completion::None)
			}
			Statement::DeclareCursor {
				name,
				kind,
				plan,
				root,
			} => {
				ctx.cursors.declare(name, *kind, plan.clone(), *root)?;
				debug!(cursor = %name, kind = ?kind, "cursor declared");
				Ok(Completion::None)
			}
			Statement::OpenCursor(name) => {
				cursor::open(ctx, name)?;
				Ok(Completion::None)
			}
			Statement::Fetch {
				cursor: name,
				direction,
				into,
			} => {
				if !into.is_empty() {
					cursor::fetch_into(ctx, name, *direction, into)?;
					return Ok(Completion::None);
				}
				let schema = ctx.cursors.schema(name)?;
				let row = cursor::fetch(ctx, name, *direction)?;
				Ok(Completion::rows(schema, row.into_iter().collect()))
			}
			Statement::CloseCursor(name) => {
				cursor::close(ctx, name)?;
				Ok(Completion::None)
			}
			Statement::DeallocateCursor(name) => {
				cursor::deallocate(ctx, name)?;
				Ok(Completion::None)
			}
		}
	}
}

/// Outcome of a statement that ran to completion.
#[derive(Debug)]
pub(crate) enum Completion {
	None,
	Affected(usize),
	Rows {
		schema: Schema,
		rows: Vec<Row>,
	},
}

impl Completion {
	fn affected(count: usize) -> Self {
		Completion::Affected(count)
	}

	fn rows(schema: Schema, rows: Vec<Row>) -> Self {
		Completion::Rows {
			schema,
			rows,
		}
	}
}

/// Evaluates a row independent expression over the declared variables.
fn evaluate(expression: &Expression, ctx: &ExecutionContext) -> crate::Result<quarry_core::Value> {
	let mut scope = Scope::new().with_collation(ctx.options.collation()?);
	for (name, ty) in ctx.variables.iter() {
		scope.declare_variable(name, ty);
	}
	let compiled = ExpressionCompiler::new(scope).compile(expression, &Schema::empty(), Clause::Select)?;
	compiled.evaluate(&Row::empty(), ctx)
}

/// Statements executed in order by one
/// [`Session::execute_reader`](crate::Session::execute_reader) call.
#[derive(Default)]
pub struct Batch {
	statements: Vec<Statement>,
}

impl Batch {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, statement: Statement) -> Self {
		self.push(statement);
		self
	}

	pub fn push(&mut self, statement: Statement) {
		self.statements.push(statement);
	}

	pub fn statements(&self) -> &[Statement] {
		&self.statements
	}

	pub fn len(&self) -> usize {
		self.statements.len()
	}

	pub fn is_empty(&self) -> bool {
		self.statements.is_empty()
	}
}

impl From<Statement> for Batch {
	fn from(statement: Statement) -> Self {
		Batch::new().with(statement)
	}
}

impl From<Vec<Statement>> for Batch {
	fn from(statements: Vec<Statement>) -> Self {
		Self {
			statements,
		}
	}
}
