// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_core::{Row, Type};
use quarry_type::{error::diagnostic::internal::not_initialized, return_error, value::convert::cast};
use tracing::instrument;

use crate::{
	context::ExecutionContext,
	vm::volcano::query::{ExecutionPlan, NodeId, QueryNode},
};

/// One input of a concatenation and the output types its columns must be
/// converted to, when they differ.
pub(crate) struct ConcatInput {
	pub node: NodeId,
	pub conversions: Vec<Option<Type>>,
}

/// UNION ALL: emits every input in turn. Input `i + 1` is started only once
/// input `i` is exhausted.
pub(crate) struct ConcatNode {
	inputs: Vec<ConcatInput>,
	current: Option<usize>,
}

impl ConcatNode {
	pub(crate) fn new(inputs: Vec<ConcatInput>) -> Self {
		Self {
			inputs,
			current: None,
		}
	}
}

impl QueryNode for ConcatNode {
	#[instrument(level = "trace", skip_all, name = "volcano::concat::initialize")]
	fn initialize(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<()> {
		if let Some(first) = self.inputs.first() {
			plan.execute(first.node, ctx)?;
		}
		self.current = Some(0);
		Ok(())
	}

	#[instrument(level = "trace", skip_all, name = "volcano::concat::next")]
	fn next(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<Option<Row>> {
		let Some(current) = &mut self.current else {
			return_error!(not_initialized("concatenation"));
		};
		while let Some(input) = self.inputs.get(*current) {
			if let Some(row) = plan.next(input.node, ctx)? {
				if input.conversions.iter().all(Option::is_none) {
					return Ok(Some(row));
				}
				let values = row
					.iter()
					.zip(&input.conversions)
					.map(|(value, target)| match target {
						Some(ty) => cast(value, ty),
						None => Ok(value.clone()),
					})
					.collect::<crate::Result<Vec<_>>>()?;
				return Ok(Some(Row::new(values)));
			}
			*current += 1;
			if let Some(next) = self.inputs.get(*current) {
				plan.execute(next.node, ctx)?;
			}
		}
		Ok(None)
	}
}
