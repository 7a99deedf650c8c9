// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{cmp::Ordering, collections::VecDeque};

use quarry_core::{Collation, JoinType, Row};
use quarry_type::{error::diagnostic::internal::not_initialized, return_error};
use tracing::instrument;

use crate::{
	context::ExecutionContext,
	vm::volcano::query::{ExecutionPlan, NodeId, QueryNode},
};

/// Equality keys of a merge join: ordinal on each side and the collation
/// the pair is compared with.
#[derive(Clone, Debug)]
pub(crate) struct MergeKey {
	pub left: usize,
	pub right: usize,
	pub collation: Collation,
}

struct State {
	left: Option<Row>,
	right: Option<Row>,
	/// Right rows sharing the key of the current left run.
	group: Vec<Row>,
	output: VecDeque<Row>,
	left_nulls: Row,
	right_nulls: Row,
}

/// Merges two inputs sorted ascending on the join keys. Rows with a NULL in
/// any key never match.
pub(crate) struct MergeJoinNode {
	left: NodeId,
	right: NodeId,
	join_type: JoinType,
	keys: Vec<MergeKey>,
	left_width: usize,
	right_width: usize,
	state: Option<State>,
}

impl MergeJoinNode {
	pub(crate) fn new(
		left: NodeId,
		right: NodeId,
		join_type: JoinType,
		keys: Vec<MergeKey>,
		left_width: usize,
		right_width: usize,
	) -> Self {
		Self {
			left,
			right,
			join_type,
			keys,
			left_width,
			right_width,
			state: None,
		}
	}

	fn compare(&self, left: &Row, right: &Row) -> Ordering {
		for key in &self.keys {
			let ordering = left.values()[key.left].compare(&right.values()[key.right], &key.collation);
			if ordering != Ordering::Equal {
				return ordering;
			}
		}
		Ordering::Equal
	}

	fn compare_right(&self, a: &Row, b: &Row) -> Ordering {
		for key in &self.keys {
			let ordering = a.values()[key.right].compare(&b.values()[key.right], &key.collation);
			if ordering != Ordering::Equal {
				return ordering;
			}
		}
		Ordering::Equal
	}

	fn left_null(&self, row: &Row) -> bool {
		self.keys.iter().any(|k| row.values()[k.left].is_null())
	}

	fn right_null(&self, row: &Row) -> bool {
		self.keys.iter().any(|k| row.values()[k.right].is_null())
	}

	fn keeps_left(&self) -> bool {
		matches!(self.join_type, JoinType::LeftOuter | JoinType::FullOuter)
	}

	fn keeps_right(&self) -> bool {
		matches!(self.join_type, JoinType::RightOuter | JoinType::FullOuter)
	}
}

impl QueryNode for MergeJoinNode {
	#[instrument(level = "trace", skip_all, name = "volcano::merge_join::initialize")]
	fn initialize(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<()> {
		plan.execute(self.left, ctx)?;
		plan.execute(self.right, ctx)?;
		let left = plan.next(self.left, ctx)?;
		let right = plan.next(self.right, ctx)?;
		self.state = Some(State {
			left,
			right,
			group: Vec::new(),
			output: VecDeque::new(),
			left_nulls: Row::nulls(self.left_width),
			right_nulls: Row::nulls(self.right_width),
		});
		Ok(())
	}

	#[instrument(level = "trace", skip_all, name = "volcano::merge_join::next")]
	fn next(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<Option<Row>> {
		let Some(mut state) = self.state.take() else {
			return_error!(not_initialized("merge join"));
		};
		let result = self.advance(&mut state, plan, ctx);
		self.state = Some(state);
		result
	}
}

impl MergeJoinNode {
	fn advance(
		&self,
		state: &mut State,
		plan: &ExecutionPlan,
		ctx: &mut ExecutionContext,
	) -> crate::Result<Option<Row>> {
		loop {
			if let Some(row) = state.output.pop_front() {
				return Ok(Some(row));
			}

			if let Some(first) = state.group.first() {
				match &state.left {
					Some(left) if !self.left_null(left) && self.compare(left, first) == Ordering::Equal => {
						for right in &state.group {
							state.output.push_back(left.concat(right));
						}
						state.left = plan.next(self.left, ctx)?;
					}
					_ => state.group.clear(),
				}
				continue;
			}

			match (&state.left, &state.right) {
				(None, None) => return Ok(None),
				(Some(left), None) => {
					if !self.keeps_left() {
						return Ok(None);
					}
					state.output.push_back(left.concat(&state.right_nulls));
					state.left = plan.next(self.left, ctx)?;
				}
				(None, Some(right)) => {
					if !self.keeps_right() {
						return Ok(None);
					}
					state.output.push_back(state.left_nulls.concat(right));
					state.right = plan.next(self.right, ctx)?;
				}
				(Some(left), Some(right)) => {
					let ordering = if self.left_null(left) {
						Ordering::Less
					} else if self.right_null(right) {
						Ordering::Greater
					} else {
						self.compare(left, right)
					};
					match ordering {
						Ordering::Less => {
							if self.keeps_left() {
								state.output.push_back(left.concat(&state.right_nulls));
							}
							state.left = plan.next(self.left, ctx)?;
						}
						Ordering::Greater => {
							if self.keeps_right() {
								state.output.push_back(state.left_nulls.concat(right));
							}
							state.right = plan.next(self.right, ctx)?;
						}
						Ordering::Equal => {
							let first = right.clone();
							state.group.push(first.clone());
							loop {
								state.right = plan.next(self.right, ctx)?;
								match &state.right {
									Some(next)
										if !self.right_null(next)
											&& self.compare_right(&first, next)
												== Ordering::Equal =>
									{
										state.group.push(next.clone())
									}
									_ => break,
								}
							}
						}
					}
				}
			}
		}
	}
}
