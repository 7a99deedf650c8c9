// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Scalar expression tree handed over by plan construction.
//!
//! Expressions are plain data; the engine compiles them against the schema
//! of the operator that evaluates them.

use std::fmt::{Display, Formatter};

use quarry_type::{IntoValue, Type, Value};

use crate::sort::SortDirection;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Expression {
	Constant(Value),
	/// A column of the input row, bare or `alias.column`.
	Column(String),
	/// A declared `@variable` of the batch.
	Variable(String),
	/// A statement parameter or an outer reference bound by a nested loop.
	Parameter(String),
	Unary {
		op: UnaryOp,
		operand: Box<Expression>,
	},
	Binary {
		op: BinaryOp,
		left: Box<Expression>,
		right: Box<Expression>,
	},
	IsNull {
		operand: Box<Expression>,
		negated: bool,
	},
	InList {
		operand: Box<Expression>,
		list: Vec<Expression>,
		negated: bool,
	},
	Between {
		operand: Box<Expression>,
		low: Box<Expression>,
		high: Box<Expression>,
		negated: bool,
	},
	Like {
		operand: Box<Expression>,
		pattern: Box<Expression>,
		escape: Option<Box<Expression>>,
		negated: bool,
	},
	/// Simple CASE when `operand` is set, searched CASE otherwise.
	Case {
		operand: Option<Box<Expression>>,
		branches: Vec<(Expression, Expression)>,
		otherwise: Option<Box<Expression>>,
	},
	/// CAST / CONVERT, or TRY_CAST when `try_cast` is set.
	Cast {
		operand: Box<Expression>,
		ty: Type,
		try_cast: bool,
	},
	Collate {
		operand: Box<Expression>,
		collation: String,
	},
	/// Scalar function call, including the `@@ROWCOUNT` style globals.
	Call {
		function: String,
		arguments: Vec<Expression>,
	},
	Aggregate(AggregateCall),
	Window(Box<WindowCall>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
	Negate,
	Plus,
	Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
	Add,
	Subtract,
	Multiply,
	Divide,
	Modulo,
	Equal,
	NotEqual,
	Less,
	LessOrEqual,
	Greater,
	GreaterOrEqual,
	And,
	Or,
}

impl BinaryOp {
	pub fn is_comparison(&self) -> bool {
		matches!(
			self,
			BinaryOp::Equal
				| BinaryOp::NotEqual
				| BinaryOp::Less | BinaryOp::LessOrEqual
				| BinaryOp::Greater | BinaryOp::GreaterOrEqual
		)
	}

	pub fn is_logical(&self) -> bool {
		matches!(self, BinaryOp::And | BinaryOp::Or)
	}
}

impl Display for BinaryOp {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			BinaryOp::Add => "+",
			BinaryOp::Subtract => "-",
			BinaryOp::Multiply => "*",
			BinaryOp::Divide => "/",
			BinaryOp::Modulo => "%",
			BinaryOp::Equal => "=",
			BinaryOp::NotEqual => "<>",
			BinaryOp::Less => "<",
			BinaryOp::LessOrEqual => "<=",
			BinaryOp::Greater => ">",
			BinaryOp::GreaterOrEqual => ">=",
			BinaryOp::And => "AND",
			BinaryOp::Or => "OR",
		})
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
	Count,
	CountBig,
	Min,
	Max,
	Avg,
	Sum,
	StringAgg,
}

impl AggregateFunction {
	pub fn name(&self) -> &'static str {
		match self {
			AggregateFunction::Count => "COUNT",
			AggregateFunction::CountBig => "COUNT_BIG",
			AggregateFunction::Min => "MIN",
			AggregateFunction::Max => "MAX",
			AggregateFunction::Avg => "AVG",
			AggregateFunction::Sum => "SUM",
			AggregateFunction::StringAgg => "STRING_AGG",
		}
	}
}

/// An aggregate function call. `argument` is `None` for `COUNT(*)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AggregateCall {
	pub function: AggregateFunction,
	pub argument: Option<Box<Expression>>,
	pub distinct: bool,
	/// STRING_AGG separator.
	pub separator: Option<String>,
}

impl AggregateCall {
	pub fn new(function: AggregateFunction, argument: Expression) -> Self {
		Self {
			function,
			argument: Some(Box::new(argument)),
			distinct: false,
			separator: None,
		}
	}

	pub fn count_star() -> Self {
		Self {
			function: AggregateFunction::Count,
			argument: None,
			distinct: false,
			separator: None,
		}
	}

	pub fn distinct(mut self) -> Self {
		self.distinct = true;
		self
	}

	pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
		self.separator = Some(separator.into());
		self
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum WindowFunction {
	RowNumber,
	Rank,
	DenseRank,
	Aggregate(AggregateCall),
	Lag {
		value: Box<Expression>,
		offset: u64,
		default: Option<Box<Expression>>,
	},
	Lead {
		value: Box<Expression>,
		offset: u64,
		default: Option<Box<Expression>>,
	},
	FirstValue(Box<Expression>),
	LastValue(Box<Expression>),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OrderByItem {
	pub expression: Expression,
	pub direction: SortDirection,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameBound {
	UnboundedPreceding,
	Preceding(u64),
	CurrentRow,
	Following(u64),
	UnboundedFollowing,
}

/// A ROWS frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowFrame {
	pub start: FrameBound,
	pub end: FrameBound,
}

impl WindowFrame {
	pub fn rows(start: FrameBound, end: FrameBound) -> Self {
		Self {
			start,
			end,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WindowCall {
	pub function: WindowFunction,
	pub partition_by: Vec<Expression>,
	pub order_by: Vec<OrderByItem>,
	pub frame: Option<WindowFrame>,
}

impl WindowCall {
	pub fn new(function: WindowFunction) -> Self {
		Self {
			function,
			partition_by: vec![],
			order_by: vec![],
			frame: None,
		}
	}

	pub fn partition_by(mut self, expression: Expression) -> Self {
		self.partition_by.push(expression);
		self
	}

	pub fn order_by(mut self, expression: Expression, direction: SortDirection) -> Self {
		self.order_by.push(OrderByItem {
			expression,
			direction,
		});
		self
	}

	pub fn frame(mut self, frame: WindowFrame) -> Self {
		self.frame = Some(frame);
		self
	}
}

impl Expression {
	pub fn constant(value: impl IntoValue) -> Self {
		Expression::Constant(value.into_value())
	}

	pub fn null() -> Self {
		Expression::Constant(Value::Null)
	}

	pub fn column(name: impl Into<String>) -> Self {
		Expression::Column(name.into())
	}

	pub fn variable(name: impl Into<String>) -> Self {
		Expression::Variable(name.into())
	}

	pub fn parameter(name: impl Into<String>) -> Self {
		Expression::Parameter(name.into())
	}

	pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
		Expression::Binary {
			op,
			left: Box::new(left),
			right: Box::new(right),
		}
	}

	pub fn equal(left: Expression, right: Expression) -> Self {
		Self::binary(BinaryOp::Equal, left, right)
	}

	pub fn and(left: Expression, right: Expression) -> Self {
		Self::binary(BinaryOp::And, left, right)
	}

	pub fn or(left: Expression, right: Expression) -> Self {
		Self::binary(BinaryOp::Or, left, right)
	}

	pub fn not(operand: Expression) -> Self {
		Expression::Unary {
			op: UnaryOp::Not,
			operand: Box::new(operand),
		}
	}

	pub fn negate(operand: Expression) -> Self {
		Expression::Unary {
			op: UnaryOp::Negate,
			operand: Box::new(operand),
		}
	}

	pub fn is_null(operand: Expression) -> Self {
		Expression::IsNull {
			operand: Box::new(operand),
			negated: false,
		}
	}

	pub fn cast(operand: Expression, ty: Type) -> Self {
		Expression::Cast {
			operand: Box::new(operand),
			ty,
			try_cast: false,
		}
	}

	pub fn collate(operand: Expression, collation: impl Into<String>) -> Self {
		Expression::Collate {
			operand: Box::new(operand),
			collation: collation.into(),
		}
	}

	pub fn call(function: impl Into<String>, arguments: Vec<Expression>) -> Self {
		Expression::Call {
			function: function.into(),
			arguments,
		}
	}

	pub fn like(operand: Expression, pattern: Expression) -> Self {
		Expression::Like {
			operand: Box::new(operand),
			pattern: Box::new(pattern),
			escape: None,
			negated: false,
		}
	}

	pub fn aggregate(call: AggregateCall) -> Self {
		Expression::Aggregate(call)
	}

	pub fn window(call: WindowCall) -> Self {
		Expression::Window(Box::new(call))
	}

	/// Direct children, in evaluation order.
	pub fn children(&self) -> Vec<&Expression> {
		match self {
			Expression::Constant(_)
			| Expression::Column(_)
			| Expression::Variable(_)
			| Expression::Parameter(_) => vec![],
			Expression::Unary {
				operand,
				..
			}
			| Expression::IsNull {
				operand,
				..
			}
			| Expression::Cast {
				operand,
				..
			}
			| Expression::Collate {
				operand,
				..
			} => vec![operand.as_ref()],
			Expression::Binary {
				left,
				right,
				..
			} => vec![left.as_ref(), right.as_ref()],
			Expression::InList {
				operand,
				list,
				..
			} => std::iter::once(operand.as_ref()).chain(list.iter()).collect(),
			Expression::Between {
				operand,
				low,
				high,
				..
			} => vec![operand.as_ref(), low.as_ref(), high.as_ref()],
			Expression::Like {
				operand,
				pattern,
				escape,
				..
			} => {
				let mut children = vec![operand.as_ref(), pattern.as_ref()];
				children.extend(escape.as_deref());
				children
			}
			Expression::Case {
				operand,
				branches,
				otherwise,
			} => {
				let mut children: Vec<&Expression> = operand.as_deref().into_iter().collect();
				for (when, then) in branches {
					children.push(when);
					children.push(then);
				}
				children.extend(otherwise.as_deref());
				children
			}
			Expression::Call {
				arguments,
				..
			} => arguments.iter().collect(),
			Expression::Aggregate(call) => call.argument.as_deref().into_iter().collect(),
			Expression::Window(call) => {
				let mut children: Vec<&Expression> = match &call.function {
					WindowFunction::RowNumber | WindowFunction::Rank | WindowFunction::DenseRank => {
						vec![]
					}
					WindowFunction::Aggregate(aggregate) => {
						aggregate.argument.as_deref().into_iter().collect()
					}
					WindowFunction::Lag {
						value,
						default,
						..
					}
					| WindowFunction::Lead {
						value,
						default,
						..
					} => std::iter::once(value.as_ref()).chain(default.as_deref()).collect(),
					WindowFunction::FirstValue(value) | WindowFunction::LastValue(value) => vec![value.as_ref()],
				};
				children.extend(call.partition_by.iter());
				children.extend(call.order_by.iter().map(|item| &item.expression));
				children
			}
		}
	}

	/// Whether the expression or any sub-expression satisfies `predicate`.
	pub fn any(&self, predicate: &impl Fn(&Expression) -> bool) -> bool {
		predicate(self) || self.children().into_iter().any(|child| child.any(predicate))
	}

	pub fn contains_aggregate(&self) -> bool {
		self.any(&|e| matches!(e, Expression::Aggregate(_)))
	}

	pub fn contains_window(&self) -> bool {
		self.any(&|e| matches!(e, Expression::Window(_)))
	}
}

impl From<Value> for Expression {
	fn from(value: Value) -> Self {
		Expression::Constant(value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_contains_aggregate() {
		let sum = Expression::aggregate(AggregateCall::new(AggregateFunction::Sum, Expression::column("x")));
		let predicate = Expression::binary(BinaryOp::Greater, sum, Expression::constant(1));
		assert!(predicate.contains_aggregate());
		assert!(!predicate.contains_window());
	}

	#[test]
	fn test_contains_window() {
		let rank = Expression::window(WindowCall::new(WindowFunction::RowNumber).order_by(
			Expression::column("x"),
			SortDirection::Asc,
		));
		let predicate = Expression::equal(rank, Expression::constant(1));
		assert!(predicate.contains_window());
		assert!(!predicate.contains_aggregate());
	}

	#[test]
	fn test_children_of_case() {
		let case = Expression::Case {
			operand: None,
			branches: vec![(Expression::column("a"), Expression::constant(1))],
			otherwise: Some(Box::new(Expression::constant(2))),
		};
		assert_eq!(case.children().len(), 3);
	}

	#[test]
	fn test_expressions_are_hashable() {
		use std::collections::HashSet;
		let mut set = HashSet::new();
		set.insert(Expression::column("a"));
		set.insert(Expression::column("a"));
		set.insert(Expression::constant("a"));
		assert_eq!(set.len(), 2);
	}
}
