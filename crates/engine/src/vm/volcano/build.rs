// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Plan construction. Every builder method compiles what it needs against
//! the schemas of its inputs, so plan errors surface here rather than while
//! rows flow.

use quarry_core::{
	ColumnDef, Expression, JoinType, RemoteQuery, Row, Schema, SortKey, Type, Value, sort::ResolvedSortKey,
};
use quarry_type::{
	error::diagnostic::{
		internal::internal,
		plan::{top_requires_non_negative, unsupported_join},
		query::column_count_mismatch,
	},
	return_error,
	value::convert::cast,
};

use crate::{
	expression::{
		Clause, CollationLabel, Coercibility, aggregate::CompiledAggregate, require_boolean,
	},
	vm::volcano::{
		aggregate::{AggregateNode, AggregateSpec},
		assert::AssertNode,
		compute::ComputeNode,
		concat::{ConcatInput, ConcatNode},
		distinct::DistinctNode,
		filter::FilterNode,
		join::{
			merge::{MergeJoinNode, MergeKey},
			nested_loop::{NestedLoopNode, OuterReference},
		},
		project::ProjectNode,
		query::{ExecutionPlan, NodeId, QueryPlan},
		scan::{constant::ConstantScanNode, native::NativeQueryNode, remote::RemoteScanNode},
		sort::SortNode,
		spool::{
			adaptive::{AdaptiveIndexSpoolNode, AdaptiveSpoolPolicy, Estimate},
			consumer::{ConsumerMode, SpoolConsumerNode},
			index::IndexSpoolNode,
			stack::StackSpoolNode,
			table::TableSpoolNode,
		},
		top::TopNode,
		try_catch::TryCatchNode,
		window::{CompiledWindow, WindowNode, WindowSpec},
	},
};

/// A column computed from an expression over the input row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComputedColumn {
	pub name: String,
	pub expression: Expression,
}

impl ComputedColumn {
	pub fn new(name: impl Into<String>, expression: Expression) -> Self {
		Self {
			name: name.into(),
			expression,
		}
	}
}

/// An input column kept by a projection, optionally renamed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectColumn {
	pub column: String,
	pub alias: Option<String>,
}

impl ProjectColumn {
	pub fn new(column: impl Into<String>) -> Self {
		Self {
			column: column.into(),
			alias: None,
		}
	}

	pub fn aliased(column: impl Into<String>, alias: impl Into<String>) -> Self {
		Self {
			column: column.into(),
			alias: Some(alias.into()),
		}
	}
}

fn computed_column(name: &str, ty: Type, label: &CollationLabel) -> ColumnDef {
	let column = ColumnDef::new(name, ty).as_computed();
	if ty.is_character() {
		column.with_collation(label.collation.clone())
	} else {
		column
	}
}

impl ExecutionPlan {
	/// Literal rows, converted to the column types of `schema`.
	pub fn constant_scan(&mut self, schema: Schema, rows: Vec<Vec<Value>>) -> crate::Result<NodeId> {
		let rows = rows
			.into_iter()
			.map(|values| {
				if values.len() != schema.len() {
					return_error!(column_count_mismatch(schema.len(), values.len()));
				}
				let values = values
					.iter()
					.zip(schema.columns())
					.map(|(value, column)| cast(value, &column.ty))
					.collect::<crate::Result<Vec<_>>>()?;
				Ok(Row::new(values))
			})
			.collect::<crate::Result<Vec<_>>>()?;
		Ok(self.push(QueryPlan::ConstantScan(ConstantScanNode::new(rows)), schema))
	}

	/// Declarative query against `source`. `columns` describe the requested
	/// columns in order; they are qualified with the query alias, or the
	/// entity name, unless already qualified. `key` names the entity's
	/// primary key column.
	pub fn remote_scan(
		&mut self,
		source: &str,
		query: RemoteQuery,
		columns: Vec<ColumnDef>,
		key: Option<&str>,
	) -> crate::Result<NodeId> {
		if columns.len() != query.columns.len() {
			return_error!(column_count_mismatch(query.columns.len(), columns.len()));
		}
		let qualifier = query.alias.clone().unwrap_or_else(|| query.entity.clone());
		let columns = columns
			.into_iter()
			.map(|column| match column.qualifier {
				Some(_) => column,
				None => column.with_qualifier(qualifier.clone()),
			})
			.collect();
		let mut schema = Schema::new(columns);
		let sorted: Vec<SortKey> = query
			.order
			.iter()
			.map(|key| SortKey {
				column: format!("{}.{}", qualifier, key.column),
				direction: key.direction,
			})
			.collect();
		if sorted.iter().all(|key| schema.find(&key.column).is_some()) {
			schema = schema.with_sorted_by(sorted);
		}
		if let Some(key) = key {
			schema = schema.with_primary_key(&qualifier, key);
		}
		let width = schema.len();
		Ok(self.push(QueryPlan::RemoteScan(RemoteScanNode::new(source, query, width)), schema))
	}

	/// Statement text run on the data source's native SQL endpoint.
	pub fn native_query(&mut self, source: &str, sql: &str, columns: Vec<ColumnDef>) -> crate::Result<NodeId> {
		let width = columns.len();
		Ok(self.push(QueryPlan::NativeQuery(NativeQueryNode::new(source, sql, width)), Schema::new(columns)))
	}

	pub fn filter(&mut self, input: NodeId, predicate: &Expression) -> crate::Result<NodeId> {
		let schema = self.schema_arc(input)?;
		let predicate = self.compiler.compile(predicate, &schema, Clause::Filter)?;
		require_boolean(&predicate)?;
		Ok(self.push(QueryPlan::Filter(FilterNode::new(input, predicate)), (*schema).clone()))
	}

	/// Appends computed columns. Each expression sees the input columns only.
	pub fn compute(&mut self, input: NodeId, columns: Vec<ComputedColumn>) -> crate::Result<NodeId> {
		let input_schema = self.schema_arc(input)?;
		let mut schema = (*input_schema).clone();
		let mut expressions = Vec::with_capacity(columns.len());
		for column in &columns {
			let compiled = self.compiler.compile(&column.expression, &input_schema, Clause::Select)?;
			schema = schema.with_column(computed_column(&column.name, compiled.ty(), compiled.label()));
			expressions.push(compiled);
		}
		Ok(self.push(QueryPlan::Compute(ComputeNode::new(input, expressions)), schema))
	}

	pub fn project(&mut self, input: NodeId, columns: Vec<ProjectColumn>) -> crate::Result<NodeId> {
		let input_schema = self.schema_arc(input)?;
		let mut ordinals = Vec::with_capacity(columns.len());
		let mut defs = Vec::with_capacity(columns.len());
		for column in &columns {
			let ordinal = input_schema.resolve(&column.column)?;
			let mut def = input_schema.columns()[ordinal].clone();
			if let Some(alias) = &column.alias {
				def.name = alias.clone();
				def.qualifier = None;
			}
			ordinals.push(ordinal);
			defs.push(def);
		}
		let schema = input_schema.project(defs);
		Ok(self.push(QueryPlan::Project(ProjectNode::new(input, ordinals)), schema))
	}

	/// Sorts on `keys`; the input is known to be ordered on the first
	/// `presorted` of them already.
	pub fn sort(&mut self, input: NodeId, keys: Vec<SortKey>, presorted: usize) -> crate::Result<NodeId> {
		let schema = self.schema_arc(input)?;
		let resolved: Vec<ResolvedSortKey> = schema.resolve_sort_keys(&keys)?;
		let schema = (*schema).clone().with_sorted_by(keys);
		Ok(self.push(QueryPlan::Sort(SortNode::new(input, resolved, presorted)), schema))
	}

	pub fn top(&mut self, input: NodeId, count: i64, offset: i64) -> crate::Result<NodeId> {
		if count < 0 || offset < 0 {
			return_error!(top_requires_non_negative());
		}
		let schema = (*self.schema_arc(input)?).clone();
		Ok(self.push(QueryPlan::Top(TopNode::new(input, count as u64, offset as u64)), schema))
	}

	/// Equi-join of two inputs sorted ascending on the `(left, right)` key
	/// column pairs.
	pub fn merge_join(
		&mut self,
		left: NodeId,
		right: NodeId,
		join_type: JoinType,
		keys: &[(&str, &str)],
	) -> crate::Result<NodeId> {
		if !matches!(join_type, JoinType::Inner | JoinType::LeftOuter | JoinType::RightOuter | JoinType::FullOuter) {
			return_error!(unsupported_join("merge join", &join_type.to_string()));
		}
		let left_schema = self.schema_arc(left)?;
		let right_schema = self.schema_arc(right)?;
		let keys = keys
			.iter()
			.map(|(l, r)| {
				let left_ordinal = left_schema.resolve(l)?;
				let right_ordinal = right_schema.resolve(r)?;
				let left_column = &left_schema.columns()[left_ordinal];
				let right_column = &right_schema.columns()[right_ordinal];
				Type::common(&left_column.ty, &right_column.ty)?;
				let collation = CollationLabel::derive(
					&CollationLabel::new(left_column.collation().clone(), Coercibility::Implicit),
					&CollationLabel::new(right_column.collation().clone(), Coercibility::Implicit),
					"equal to",
				)?
				.collation;
				Ok(MergeKey {
					left: left_ordinal,
					right: right_ordinal,
					collation,
				})
			})
			.collect::<crate::Result<Vec<_>>>()?;

		let pads_left = matches!(join_type, JoinType::RightOuter | JoinType::FullOuter);
		let pads_right = matches!(join_type, JoinType::LeftOuter | JoinType::FullOuter);
		let mut schema = left_schema.join(&right_schema, pads_left, pads_right);
		if !pads_left {
			schema = schema.with_sorted_by(left_schema.sorted_by().to_vec());
		}
		let node = MergeJoinNode::new(left, right, join_type, keys, left_schema.len(), right_schema.len());
		Ok(self.push(QueryPlan::MergeJoin(node), schema))
	}

	/// Re-runs `right` for every left row. Each `(column, parameter)` outer
	/// reference binds a left column to a parameter the right side reads;
	/// the parameters are declared with the column types.
	pub fn nested_loop(
		&mut self,
		left: NodeId,
		right: NodeId,
		join_type: JoinType,
		outer_references: &[(&str, &str)],
		predicate: Option<&Expression>,
	) -> crate::Result<NodeId> {
		if !matches!(
			join_type,
			JoinType::Inner | JoinType::LeftOuter | JoinType::LeftSemi | JoinType::LeftAntiSemi
		) {
			return_error!(unsupported_join("nested loop", &join_type.to_string()));
		}
		let left_schema = self.schema_arc(left)?;
		let right_schema = self.schema_arc(right)?;

		let mut references = Vec::with_capacity(outer_references.len());
		for (column, parameter) in outer_references {
			let ordinal = left_schema.resolve(column)?;
			self.declare_parameter(parameter, left_schema.columns()[ordinal].ty);
			references.push(OuterReference {
				ordinal,
				parameter: parameter.to_string(),
			});
		}

		let joined = left_schema.join(&right_schema, false, join_type == JoinType::LeftOuter);
		let predicate = match predicate {
			Some(predicate) => {
				let compiled = self.compiler.compile(predicate, &joined, Clause::Filter)?;
				require_boolean(&compiled)?;
				Some(compiled)
			}
			None => None,
		};
		let schema = if join_type.emits_right() {
			joined.with_sorted_by(left_schema.sorted_by().to_vec())
		} else {
			(*left_schema).clone()
		};
		let node = NestedLoopNode::new(left, right, join_type, references, predicate, right_schema.len());
		Ok(self.push(QueryPlan::NestedLoop(node), schema))
	}

	pub fn table_spool(&mut self, input: NodeId) -> crate::Result<NodeId> {
		let schema = (*self.schema_arc(input)?).clone();
		Ok(self.push(QueryPlan::TableSpool(TableSpoolNode::new(input)), schema))
	}

	/// Adds a stack spool producing `schema`. Its input is attached with
	/// [`ExecutionPlan::set_stack_spool_input`] once built, since stack
	/// consumers of the spool sit inside that input.
	pub fn stack_spool(&mut self, schema: Schema) -> crate::Result<NodeId> {
		let id = self.next_id();
		Ok(self.push(QueryPlan::StackSpool(StackSpoolNode::new(id)), schema))
	}

	pub fn set_stack_spool_input(&mut self, spool: NodeId, input: NodeId) -> crate::Result<()> {
		let expected = self.schema(spool)?.len();
		let actual = self.schema(input)?.len();
		if expected != actual {
			return_error!(column_count_mismatch(expected, actual));
		}
		match self.node_mut(spool)? {
			QueryPlan::StackSpool(node) if node.input().is_none() => {
				node.set_input(input);
				Ok(())
			}
			QueryPlan::StackSpool(_) => return_error!(internal(format!("stack spool {} already has an input", spool))),
			other => return_error!(internal(format!("{} {} is not a stack spool", other.name(), spool))),
		}
	}

	/// Reads the rows of a table spool (replaying its cache) or a stack
	/// spool (popping its work table).
	pub fn spool_consumer(&mut self, producer: NodeId) -> crate::Result<NodeId> {
		let mode = match self.kind(producer)? {
			"table spool" => ConsumerMode::Replay,
			"stack spool" => ConsumerMode::Pop,
			other => return_error!(internal(format!("{} {} is not a spool", other, producer))),
		};
		let schema = (*self.schema_arc(producer)?).clone();
		Ok(self.push(QueryPlan::SpoolConsumer(SpoolConsumerNode::new(producer, mode)), schema))
	}

	/// Memoizes the rows of `input` whose `key` column equals the value of
	/// parameter `seek`.
	pub fn index_spool(&mut self, input: NodeId, key: &str, seek: &str) -> crate::Result<NodeId> {
		let schema = (*self.schema_arc(input)?).clone();
		let ordinal = schema.resolve(key)?;
		let column = &schema.columns()[ordinal];
		let node = IndexSpoolNode::new(input, ordinal, column.ty, column.collation().clone(), seek);
		Ok(self.push(QueryPlan::IndexSpool(node), schema))
	}

	/// Index spool that re-runs `seek_input` per key until a single run of
	/// `full_input` becomes cheaper. When `full_input` is a remote scan the
	/// data source's record count estimate of its entity drives the switch.
	pub fn adaptive_index_spool(
		&mut self,
		seek_input: NodeId,
		full_input: NodeId,
		key: &str,
		seek: &str,
		policy: AdaptiveSpoolPolicy,
	) -> crate::Result<NodeId> {
		let schema = (*self.schema_arc(seek_input)?).clone();
		let full_width = self.schema(full_input)?.len();
		if full_width != schema.len() {
			return_error!(column_count_mismatch(schema.len(), full_width));
		}
		let ordinal = schema.resolve(key)?;
		let column = &schema.columns()[ordinal];
		let estimate = self.inspect(full_input, |node| match node {
			QueryPlan::RemoteScan(scan) => {
				let (source, entity) = scan.target();
				Some(Estimate {
					source: source.to_string(),
					entity: entity.to_string(),
				})
			}
			_ => None,
		})?;
		let node = AdaptiveIndexSpoolNode::new(
			seek_input,
			full_input,
			ordinal,
			column.ty,
			column.collation().clone(),
			seek,
			estimate,
			policy,
		);
		Ok(self.push(QueryPlan::AdaptiveIndexSpool(node), schema))
	}

	/// Fails the statement with `number` and `message` on the first row for
	/// which `predicate` is false.
	pub fn assert(&mut self, input: NodeId, predicate: &Expression, number: u32, message: &str) -> crate::Result<NodeId> {
		let schema = self.schema_arc(input)?;
		let predicate = self.compiler.compile(predicate, &schema, Clause::Filter)?;
		require_boolean(&predicate)?;
		Ok(self.push(QueryPlan::Assert(AssertNode::new(input, predicate, number, message)), (*schema).clone()))
	}

	/// UNION ALL of `inputs`, matched by position. Column names come from
	/// the first input, types are the common type of each position.
	pub fn concatenate(&mut self, inputs: &[NodeId]) -> crate::Result<NodeId> {
		let Some(first) = inputs.first() else {
			return_error!(internal("concatenation without inputs"));
		};
		let first_schema = self.schema_arc(*first)?;
		let mut columns: Vec<ColumnDef> = first_schema.columns().to_vec();
		let mut schemas = Vec::with_capacity(inputs.len());
		for input in inputs {
			let schema = self.schema_arc(*input)?;
			if schema.len() != columns.len() {
				return_error!(column_count_mismatch(columns.len(), schema.len()));
			}
			for (column, other) in columns.iter_mut().zip(schema.columns()) {
				column.ty = Type::common(&column.ty, &other.ty)?;
				column.nullable |= other.nullable;
				if column.ty.is_character() && column.collation.is_none() {
					column.collation = Some(other.collation().clone());
				}
			}
			schemas.push(schema);
		}
		let inputs = inputs
			.iter()
			.zip(&schemas)
			.map(|(node, schema)| ConcatInput {
				node: *node,
				conversions: schema
					.columns()
					.iter()
					.zip(&columns)
					.map(|(from, to)| (from.ty != to.ty).then_some(to.ty))
					.collect(),
			})
			.collect();
		Ok(self.push(QueryPlan::Concatenate(ConcatNode::new(inputs)), Schema::new(columns)))
	}

	/// Groups on the requested columns and computes the aggregates.
	pub fn aggregate(&mut self, input: NodeId, spec: AggregateSpec) -> crate::Result<NodeId> {
		let input_schema = self.schema_arc(input)?;
		let mut keys = Vec::with_capacity(spec.group_by.len());
		let mut columns = Vec::new();
		for column in &spec.group_by {
			let ordinal = input_schema.resolve(column)?;
			keys.push(ordinal);
			columns.push(input_schema.columns()[ordinal].clone());
		}
		let collations = keys.iter().map(|k| input_schema.columns()[*k].collation().clone()).collect();

		let mut aggregates = Vec::with_capacity(spec.aggregates.len());
		for (name, call) in &spec.aggregates {
			let compiled = CompiledAggregate::compile(&mut self.compiler, call, &input_schema)?;
			let collation = match &call.argument {
				Some(argument) => self.compiler.compile(argument, &input_schema, Clause::Select)?.label().clone(),
				None => CollationLabel::new(Default::default(), Coercibility::Default),
			};
			columns.push(computed_column(name, compiled.ty(), &collation));
			aggregates.push(compiled);
		}
		let schema = Schema::new(columns);
		Ok(self.push(QueryPlan::Aggregate(AggregateNode::new(input, keys, collations, aggregates)), schema))
	}

	/// Keeps the first row of every distinct combination of `columns`; all
	/// columns when empty.
	pub fn distinct(&mut self, input: NodeId, columns: &[&str]) -> crate::Result<NodeId> {
		let schema = (*self.schema_arc(input)?).clone();
		let ordinals = if columns.is_empty() {
			(0..schema.len()).collect()
		} else {
			columns.iter().map(|c| schema.resolve(c)).collect::<crate::Result<Vec<_>>>()?
		};
		let collations = ordinals.iter().map(|o: &usize| schema.columns()[*o].collation().clone()).collect();
		Ok(self.push(QueryPlan::Distinct(DistinctNode::new(input, ordinals, collations)), schema))
	}

	/// Appends one column per window call.
	pub fn window(&mut self, input: NodeId, spec: WindowSpec) -> crate::Result<NodeId> {
		let input_schema = self.schema_arc(input)?;
		let mut schema = (*input_schema).clone();
		let mut windows = Vec::with_capacity(spec.columns.len());
		for (name, call) in &spec.columns {
			let compiled = CompiledWindow::compile(&mut self.compiler, call, &input_schema)?;
			let mut column = ColumnDef::new(name, compiled.ty()).as_computed();
			if let (true, Some(collation)) = (compiled.ty().is_character(), compiled.collation()) {
				column = column.with_collation(collation);
			}
			schema = schema.with_column(column);
			windows.push(compiled);
		}
		Ok(self.push(QueryPlan::Window(WindowNode::new(input, windows)), schema))
	}

	/// Runs `primary`, falling back to `secondary` when the data source
	/// rejects the primary as incompatible before any row was produced.
	pub fn try_catch(&mut self, primary: NodeId, secondary: NodeId) -> crate::Result<NodeId> {
		let schema = (*self.schema_arc(primary)?).clone();
		let secondary_width = self.schema(secondary)?.len();
		if secondary_width != schema.len() {
			return_error!(column_count_mismatch(schema.len(), secondary_width));
		}
		Ok(self.push(QueryPlan::TryCatch(TryCatchNode::new(primary, secondary)), schema))
	}
}

#[cfg(test)]
mod tests {
	use quarry_core::{Expression, expression::BinaryOp};

	use super::*;
	use crate::test_utils::{context, int_schema, ints};

	#[test]
	fn test_constant_scan_checks_width() {
		let mut plan = ExecutionPlan::new();
		let err = plan.constant_scan(int_schema(&["a", "b"]), vec![vec![Value::Int(1)]]).unwrap_err();
		assert_eq!(err.number(), 205);
	}

	#[test]
	fn test_filter_rejects_non_boolean() {
		let mut plan = ExecutionPlan::new();
		let scan = plan.constant_scan(int_schema(&["a"]), vec![]).unwrap();
		let err = plan.filter(scan, &Expression::column("a")).unwrap_err();
		assert_eq!(err.number(), 4145);
	}

	#[test]
	fn test_compute_appends_typed_columns() {
		let mut plan = ExecutionPlan::new();
		let scan = plan.constant_scan(int_schema(&["a"]), vec![ints(&[2]), ints(&[5])]).unwrap();
		let doubled = Expression::binary(BinaryOp::Multiply, Expression::column("a"), Expression::constant(2));
		let node = plan.compute(scan, vec![ComputedColumn::new("twice", doubled)]).unwrap();
		assert_eq!(plan.schema(node).unwrap().column(1).unwrap().ty, Type::Int);

		let mut ctx = context();
		let rows = plan.collect(node, &mut ctx).unwrap();
		assert_eq!(rows[1].values(), &[Value::Int(5), Value::Int(10)]);
	}

	#[test]
	fn test_project_renames() {
		let mut plan = ExecutionPlan::new();
		let scan = plan.constant_scan(int_schema(&["a", "b"]), vec![ints(&[1, 2])]).unwrap();
		let node = plan.project(scan, vec![ProjectColumn::aliased("b", "x"), ProjectColumn::new("a")]).unwrap();
		let schema = plan.schema(node).unwrap();
		assert_eq!(schema.resolve("x").unwrap(), 0);

		let mut ctx = context();
		assert_eq!(plan.collect(node, &mut ctx).unwrap()[0].values(), &[Value::Int(2), Value::Int(1)]);
	}

	#[test]
	fn test_top_with_offset() {
		let mut plan = ExecutionPlan::new();
		let rows = (1..=5).map(|i| ints(&[i])).collect();
		let scan = plan.constant_scan(int_schema(&["a"]), rows).unwrap();
		let node = plan.top(scan, 2, 1).unwrap();
		let mut ctx = context();
		let values: Vec<Value> = plan.collect(node, &mut ctx).unwrap().iter().map(|r| r.values()[0].clone()).collect();
		assert_eq!(values, vec![Value::Int(2), Value::Int(3)]);
		assert_eq!(plan.top(scan, -1, 0).unwrap_err().number(), 1060);
	}

	#[test]
	fn test_merge_join_rejects_semi_join() {
		let mut plan = ExecutionPlan::new();
		let left = plan.constant_scan(int_schema(&["a"]), vec![]).unwrap();
		let right = plan.constant_scan(int_schema(&["b"]), vec![]).unwrap();
		let err = plan.merge_join(left, right, JoinType::LeftSemi, &[("a", "b")]).unwrap_err();
		assert_eq!(err.number(), 8622);
	}

	#[test]
	fn test_concatenate_widens_types() {
		let mut plan = ExecutionPlan::new();
		let ints_scan = plan.constant_scan(int_schema(&["a"]), vec![ints(&[1])]).unwrap();
		let bigs = plan
			.constant_scan(Schema::new(vec![ColumnDef::new("b", Type::BigInt)]), vec![vec![Value::BigInt(7)]])
			.unwrap();
		let node = plan.concatenate(&[ints_scan, bigs]).unwrap();
		assert_eq!(plan.schema(node).unwrap().column(0).unwrap().ty, Type::BigInt);
		assert_eq!(plan.schema(node).unwrap().column(0).unwrap().name, "a");

		let mut ctx = context();
		let rows = plan.collect(node, &mut ctx).unwrap();
		assert_eq!(rows[0].values(), &[Value::BigInt(1)]);
		assert_eq!(rows[1].values(), &[Value::BigInt(7)]);

		let wide = plan.constant_scan(int_schema(&["x", "y"]), vec![]).unwrap();
		assert_eq!(plan.concatenate(&[ints_scan, wide]).unwrap_err().number(), 205);
	}

	#[test]
	fn test_distinct_keeps_first_row() {
		let mut plan = ExecutionPlan::new();
		let scan = plan
			.constant_scan(int_schema(&["k", "v"]), vec![ints(&[1, 10]), ints(&[2, 20]), ints(&[1, 30])])
			.unwrap();
		let node = plan.distinct(scan, &["k"]).unwrap();
		let mut ctx = context();
		let rows = plan.collect(node, &mut ctx).unwrap();
		assert_eq!(rows.len(), 2);
		assert_eq!(rows[0].values(), &[Value::Int(1), Value::Int(10)]);
	}

	#[test]
	fn test_assert_stops_at_first_violation() {
		let mut plan = ExecutionPlan::new();
		let scan = plan.constant_scan(int_schema(&["a"]), vec![ints(&[1]), ints(&[5]), ints(&[2])]).unwrap();
		let predicate = Expression::binary(BinaryOp::Less, Expression::column("a"), Expression::constant(3));
		let node = plan.assert(scan, &predicate, 530, "too deep").unwrap();

		let mut ctx = context();
		plan.execute(node, &mut ctx).unwrap();
		assert!(plan.next(node, &mut ctx).unwrap().is_some());
		let err = plan.next(node, &mut ctx).unwrap_err();
		assert_eq!(err.number(), 530);
		assert_eq!(err.message, "too deep");
	}

	#[test]
	fn test_spool_consumer_requires_spool() {
		let mut plan = ExecutionPlan::new();
		let scan = plan.constant_scan(int_schema(&["a"]), vec![]).unwrap();
		assert_eq!(plan.spool_consumer(scan).unwrap_err().number(), 50000);
	}
}
