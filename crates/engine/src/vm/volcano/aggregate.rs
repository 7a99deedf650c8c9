// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use indexmap::IndexMap;
use quarry_core::{Collation, Row, expression::AggregateCall};
use quarry_type::{KeyValue, error::diagnostic::internal::not_initialized, return_error};
use tracing::{instrument, trace};

use crate::{
	context::ExecutionContext,
	expression::aggregate::{Accumulator, CompiledAggregate},
	vm::volcano::query::{ExecutionPlan, NodeId, QueryNode},
};

/// Grouping columns and named aggregate calls of a GROUP BY.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AggregateSpec {
	pub group_by: Vec<String>,
	pub aggregates: Vec<(String, AggregateCall)>,
}

impl AggregateSpec {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn group_by(mut self, column: impl Into<String>) -> Self {
		self.group_by.push(column.into());
		self
	}

	pub fn aggregate(mut self, name: impl Into<String>, call: AggregateCall) -> Self {
		self.aggregates.push((name.into(), call));
		self
	}
}

/// Hash aggregation. Emits one row per group, made of the group columns
/// followed by the aggregate results, in the order groups were first seen.
/// Without grouping columns exactly one row is produced, even for an empty
/// input.
pub(crate) struct AggregateNode {
	input: NodeId,
	keys: Vec<usize>,
	collations: Vec<Collation>,
	aggregates: Vec<CompiledAggregate>,
	output: Option<std::vec::IntoIter<Row>>,
}

impl AggregateNode {
	pub(crate) fn new(
		input: NodeId,
		keys: Vec<usize>,
		collations: Vec<Collation>,
		aggregates: Vec<CompiledAggregate>,
	) -> Self {
		Self {
			input,
			keys,
			collations,
			aggregates,
			output: None,
		}
	}

	fn accumulators(&self) -> Vec<Accumulator> {
		self.aggregates.iter().map(CompiledAggregate::accumulator).collect()
	}
}

impl QueryNode for AggregateNode {
	#[instrument(level = "trace", skip_all, name = "volcano::aggregate::initialize")]
	fn initialize(&mut self, plan: &ExecutionPlan, ctx: &mut ExecutionContext) -> crate::Result<()> {
		plan.execute(self.input, ctx)?;

		let mut groups: IndexMap<Vec<KeyValue>, (Row, Vec<Accumulator>)> = IndexMap::new();
		loop {
			ctx.cancel.check()?;
			let Some(row) = plan.next(self.input, ctx)? else {
				break;
			};
			let group = row.project(&self.keys);
			let key = KeyValue::row(group.values(), &self.collations);
			if !groups.contains_key(&key) {
				groups.insert(key.clone(), (group, self.accumulators()));
			}
			let Some((_, accumulators)) = groups.get_mut(&key) else {
				continue;
			};
			for (aggregate, accumulator) in self.aggregates.iter().zip(accumulators.iter_mut()) {
				let value = aggregate.argument(&row, ctx)?;
				accumulator.update(value.as_ref())?;
			}
		}

		if self.keys.is_empty() && groups.is_empty() {
			groups.insert(Vec::new(), (Row::empty(), self.accumulators()));
		}
		trace!(groups = groups.len(), "aggregate input consumed");

		let rows = groups
			.into_values()
			.map(|(group, accumulators)| {
				let results = accumulators.iter().map(Accumulator::result).collect::<crate::Result<Vec<_>>>()?;
				Ok(group.extend(results))
			})
			.collect::<crate::Result<Vec<_>>>()?;
		self.output = Some(rows.into_iter());
		Ok(())
	}

	#[instrument(level = "trace", skip_all, name = "volcano::aggregate::next")]
	fn next(&mut self, _plan: &ExecutionPlan, _ctx: &mut ExecutionContext) -> crate::Result<Option<Row>> {
		match &mut self.output {
			Some(rows) => Ok(rows.next()),
			None => return_error!(not_initialized("aggregate")),
		}
	}
}
