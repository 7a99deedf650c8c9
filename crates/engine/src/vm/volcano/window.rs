// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::cmp::Ordering;

use indexmap::IndexMap;
use quarry_core::{
	Row, Schema, SortDirection, Type, Value,
	expression::{FrameBound, WindowCall, WindowFunction},
};
use quarry_type::{KeyValue, error::diagnostic::internal::not_initialized, return_error, value::convert::cast};
use tracing::instrument;

use crate::{
	context::ExecutionContext,
	expression::{
		Clause, CompiledExpr, ExpressionCompiler,
		aggregate::{Accumulator, CompiledAggregate},
	},
	vm::volcano::{
		query::{ExecutionPlan, NodeId, QueryNode},
		spool::drain,
	},
};

/// Named window function calls evaluated over the same input.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WindowSpec {
	pub columns: Vec<(String, WindowCall)>,
}

impl WindowSpec {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn column(mut self, name: impl Into<String>, call: WindowCall) -> Self {
		self.columns.push((name.into(), call));
		self
	}
}

/// Rows of the partition an aggregate or value function looks at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Frame {
	Rows {
		start: FrameBound,
		end: FrameBound,
	},
	/// From the partition start up to the last peer of the current row.
	Range,
	Partition,
}

impl Frame {
	fn grows(&self) -> bool {
		match self {
			Frame::Rows {
				start,
				..
			} => *start == FrameBound::UnboundedPreceding,
			Frame::Range | Frame::Partition => true,
		}
	}

	/// Inclusive bounds of the frame of the row at `position`, or `None` when
	/// it is empty. `last_peer` is the position of the last row ordered
	/// equal to it.
	fn bounds(&self, position: usize, last_peer: usize, len: usize) -> Option<(usize, usize)> {
		let (low, high) = match self {
			Frame::Partition => (0, len as i64 - 1),
			Frame::Range => (0, last_peer as i64),
			Frame::Rows {
				start,
				end,
			} => (offset(*start, position, len), offset(*end, position, len)),
		};
		let low = low.max(0);
		let high = high.min(len as i64 - 1);
		(low <= high).then_some((low as usize, high as usize))
	}
}

fn offset(bound: FrameBound, position: usize, len: usize) -> i64 {
	let position = position as i64;
	match bound {
		FrameBound::UnboundedPreceding => 0,
		FrameBound::Preceding(n) => position - n as i64,
		FrameBound::CurrentRow => position,
		FrameBound::Following(n) => position + n as i64,
		FrameBound::UnboundedFollowing => len as i64 - 1,
	}
}

enum Function {
	RowNumber,
	Rank,
	DenseRank,
	Aggregate(CompiledAggregate, Frame),
	Shift {
		value: CompiledExpr,
		offset: i64,
		default: Option<CompiledExpr>,
	},
	FirstValue(CompiledExpr, Frame),
	LastValue(CompiledExpr, Frame),
}

/// A window call compiled against the input schema.
pub(crate) struct CompiledWindow {
	partition_by: Vec<CompiledExpr>,
	order_by: Vec<(CompiledExpr, SortDirection)>,
	function: Function,
	ty: Type,
}

impl CompiledWindow {
	pub(crate) fn compile(compiler: &mut ExpressionCompiler, call: &WindowCall, schema: &Schema) -> crate::Result<Self> {
		let partition_by = call
			.partition_by
			.iter()
			.map(|expr| compiler.compile(expr, schema, Clause::Select))
			.collect::<crate::Result<Vec<_>>>()?;
		let order_by = call
			.order_by
			.iter()
			.map(|item| Ok((compiler.compile(&item.expression, schema, Clause::Select)?, item.direction)))
			.collect::<crate::Result<Vec<_>>>()?;

		let frame = match (call.frame, order_by.is_empty()) {
			(Some(frame), _) => Frame::Rows {
				start: frame.start,
				end: frame.end,
			},
			(None, false) => Frame::Range,
			(None, true) => Frame::Partition,
		};

		let (function, ty) = match &call.function {
			WindowFunction::RowNumber => (Function::RowNumber, Type::BigInt),
			WindowFunction::Rank => (Function::Rank, Type::BigInt),
			WindowFunction::DenseRank => (Function::DenseRank, Type::BigInt),
			WindowFunction::Aggregate(aggregate) => {
				let compiled = CompiledAggregate::compile(compiler, aggregate, schema)?;
				let ty = compiled.ty();
				(Function::Aggregate(compiled, frame), ty)
			}
			WindowFunction::Lag {
				value,
				offset,
				default,
			}
			| WindowFunction::Lead {
				value,
				offset,
				default,
			} => {
				let value = compiler.compile(value, schema, Clause::Select)?;
				let default =
					default.as_deref().map(|d| compiler.compile(d, schema, Clause::Select)).transpose()?;
				let offset = match &call.function {
					WindowFunction::Lag {
						..
					} => -(*offset as i64),
					_ => *offset as i64,
				};
				let ty = value.ty();
				(
					Function::Shift {
						value,
						offset,
						default,
					},
					ty,
				)
			}
			WindowFunction::FirstValue(value) => {
				let value = compiler.compile(value, schema, Clause::Select)?;
				let ty = value.ty();
				(Function::FirstValue(value, frame), ty)
			}
			WindowFunction::LastValue(value) => {
				let value = compiler.compile(value, schema, Clause::Select)?;
				let ty = value.ty();
				(Function::LastValue(value, frame), ty)
			}
		};

		Ok(Self {
			partition_by,
			order_by,
			function,
			ty,
		})
	}

	pub(crate) fn ty(&self) -> Type {
		self.ty
	}

	/// Collation of the result, for character results.
	pub(crate) fn collation(&self) -> Option<quarry_core::Collation> {
		match &self.function {
			Function::Shift {
				value,
				..
			}
			| Function::FirstValue(value, _)
			| Function::LastValue(value, _) => Some(value.collation().clone()),
			_ => None,
		}
	}

	fn compare(&self, left: &[Value], right: &[Value]) -> Ordering {
		for ((l, r), (expr, direction)) in left.iter().zip(right).zip(&self.order_by) {
			let ordering = direction.apply(l.compare(r, expr.collation()));
			if ordering != Ordering::Equal {
				return ordering;
			}
		}
		Ordering::Equal
	}

	/// Evaluates the call for every input row; the result is indexed like
	/// `rows`.
	fn evaluate(&self, rows: &[Row], ctx: &ExecutionContext) -> crate::Result<Vec<Value>> {
		let mut partitions: IndexMap<Vec<KeyValue>, Vec<usize>> = IndexMap::new();
		let mut order_values = Vec::with_capacity(rows.len());
		for (index, row) in rows.iter().enumerate() {
			let key = self
				.partition_by
				.iter()
				.map(|expr| Ok(KeyValue::new(&expr.evaluate(row, ctx)?, expr.collation())))
				.collect::<crate::Result<Vec<_>>>()?;
			partitions.entry(key).or_default().push(index);
			order_values.push(
				self.order_by.iter().map(|(expr, _)| expr.evaluate(row, ctx)).collect::<crate::Result<Vec<_>>>()?,
			);
		}

		let mut results = vec![Value::Null; rows.len()];
		for (_, mut members) in partitions {
			ctx.cancel.check()?;
			members.sort_by(|a, b| self.compare(&order_values[*a], &order_values[*b]));
			let peers = self.last_peers(&members, &order_values);
			let values = self.partition(&members, &peers, rows, ctx)?;
			for (index, value) in members.into_iter().zip(values) {
				results[index] = value;
			}
		}
		Ok(results)
	}

	/// For each position, the position of the last row ordered equal to it.
	fn last_peers(&self, members: &[usize], order_values: &[Vec<Value>]) -> Vec<usize> {
		let mut peers = vec![0; members.len()];
		let mut end = members.len();
		for position in (0..members.len()).rev() {
			if position + 1 < members.len()
				&& self.compare(&order_values[members[position]], &order_values[members[position + 1]])
					!= Ordering::Equal
			{
				end = position + 1;
			}
			peers[position] = end - 1;
		}
		peers
	}

	fn partition(
		&self,
		members: &[usize],
		peers: &[usize],
		rows: &[Row],
		ctx: &ExecutionContext,
	) -> crate::Result<Vec<Value>> {
		let len = members.len();
		let row = |position: usize| &rows[members[position]];
		match &self.function {
			Function::RowNumber => Ok((1..=len as i64).map(Value::BigInt).collect()),
			Function::Rank | Function::DenseRank => {
				let dense = matches!(self.function, Function::DenseRank);
				let mut result = Vec::with_capacity(len);
				let (mut rank, mut dense_rank) = (0i64, 0i64);
				for position in 0..len {
					if position == 0 || peers[position - 1] != peers[position] {
						rank = position as i64 + 1;
						dense_rank += 1;
					}
					result.push(Value::BigInt(if dense {
						dense_rank
					} else {
						rank
					}));
				}
				Ok(result)
			}
			Function::Aggregate(aggregate, frame) => {
				let arguments = (0..len)
					.map(|position| aggregate.argument(row(position), ctx))
					.collect::<crate::Result<Vec<_>>>()?;
				let feed = |accumulator: &mut Accumulator, position: usize| {
					accumulator.update(arguments[position].as_ref())
				};
				let mut result = Vec::with_capacity(len);
				if frame.grows() {
					let mut accumulator = aggregate.accumulator();
					let mut fed = 0;
					for position in 0..len {
						if let Some((_, high)) = frame.bounds(position, peers[position], len) {
							while fed <= high {
								feed(&mut accumulator, fed)?;
								fed += 1;
							}
						}
						result.push(accumulator.result()?);
					}
				} else {
					for position in 0..len {
						let mut accumulator = aggregate.accumulator();
						if let Some((low, high)) = frame.bounds(position, peers[position], len) {
							for member in low..=high {
								feed(&mut accumulator, member)?;
							}
						}
						result.push(accumulator.result()?);
					}
				}
				Ok(result)
			}
			Function::Shift {
				value,
				offset,
				default,
			} => (0..len)
				.map(|position| {
					let target = position as i64 + offset;
					if (0..len as i64).contains(&target) {
						return value.evaluate(row(target as usize), ctx);
					}
					match default {
						Some(default) => cast(&default.evaluate(row(position), ctx)?, &self.ty),
						None => Ok(Value::Null),
					}
				})
				.collect(),
			Function::FirstValue(value, frame) | Function::LastValue(value, frame) => {
				let first = matches!(self.function, Function::FirstValue(..));
				(0..len)
					.map(|position| match frame.bounds(position, peers[position], len) {
						Some((low, _)) if first => value.evaluate(row(low), ctx),
						Some((_, high)) => value.evaluate(row(high), ctx),
						None => Ok(Value::Null),
					})
					.collect()
			}
		}
	}
}

/// Materializes its input and appends one column per window call. Rows keep
/// their input order.
pub(crate) struct WindowNode {
	input: NodeId,
	windows: Vec<CompiledWindow>,
	output: Option<std::vec::IntoIter<Row>>,
}

impl WindowNode {
	pub(crate) fn new(input: NodeId, windows: Vec<CompiledWindow>) -> Self {
		Self {
			input,
			windows,
			output: None,
		}
	}
}

impl QueryNode for WindowNode {
	#[instrument(level = "trace", skip_all, name = "volcano::window::initialize")]
	fn initialize(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<()> {
		let rows = drain(plan, self.input, ctx)?;
		let columns =
			self.windows.iter().map(|window| window.evaluate(&rows, ctx)).collect::<crate::Result<Vec<_>>>()?;
		let output: Vec<Row> = rows
			.into_iter()
			.enumerate()
			.map(|(index, row)| row.extend(columns.iter().map(|column| column[index].clone())))
			.collect();
		self.output = Some(output.into_iter());
		Ok(())
	}

	#[instrument(level = "trace", skip_all, name = "volcano::window::next")]
	fn next(&mut self, _plan: &ExecutionPlan, _ctx: &mut ExecutionContext) -> crate::Result<Option<Row>> {
		match &mut self.output {
			Some(rows) => Ok(rows.next()),
			None => return_error!(not_initialized("window")),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_frame_bounds() {
		let running = Frame::Rows {
			start: FrameBound::UnboundedPreceding,
			end: FrameBound::CurrentRow,
		};
		assert_eq!(running.bounds(2, 2, 5), Some((0, 2)));

		let sliding = Frame::Rows {
			start: FrameBound::Preceding(1),
			end: FrameBound::Following(1),
		};
		assert_eq!(sliding.bounds(0, 0, 5), Some((0, 1)));
		assert_eq!(sliding.bounds(4, 4, 5), Some((3, 4)));

		let ahead = Frame::Rows {
			start: FrameBound::Following(2),
			end: FrameBound::Following(3),
		};
		assert_eq!(ahead.bounds(3, 3, 5), None);

		assert_eq!(Frame::Range.bounds(1, 3, 5), Some((0, 3)));
		assert_eq!(Frame::Partition.bounds(1, 1, 5), Some((0, 4)));
	}
}
