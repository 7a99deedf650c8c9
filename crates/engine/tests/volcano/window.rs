// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_core::{
	ColumnDef, Expression, FromValue, Row, Schema, SortDirection, Type, Value,
	expression::{AggregateCall, AggregateFunction, FrameBound, WindowCall, WindowFrame, WindowFunction},
};
use quarry_engine::{AggregateSpec, ExecutionPlan, NodeId, WindowSpec};

use crate::{column, context};

fn sales(plan: &mut ExecutionPlan) -> NodeId {
	let schema = Schema::new(vec![
		ColumnDef::new("region", Type::NVarChar),
		ColumnDef::new("day", Type::Int),
		ColumnDef::new("amount", Type::Int),
		ColumnDef::new("rep", Type::NVarChar),
	]);
	let rows = [("east", 1, 10, "ann"), ("west", 1, 5, "bob"), ("east", 2, 20, "cy"), ("east", 3, 20, "ann"), ("west", 2, 7, "bob")]
		.iter()
		.map(|(region, day, amount, rep)| {
			vec![Value::nvarchar(*region), Value::Int(*day), Value::Int(*amount), Value::nvarchar(*rep)]
		})
		.collect();
	plan.constant_scan(schema, rows).unwrap()
}

fn by_region(function: WindowFunction, order: &str) -> WindowCall {
	WindowCall::new(function)
		.partition_by(Expression::column("region"))
		.order_by(Expression::column(order), SortDirection::Asc)
}

fn sum_amount() -> WindowFunction {
	WindowFunction::Aggregate(AggregateCall::new(AggregateFunction::Sum, Expression::column("amount")))
}

fn strings(rows: &[Row], ordinal: usize) -> Vec<String> {
	rows.iter().map(|row| String::from_value(&row[ordinal]).unwrap()).collect()
}

#[test]
fn test_running_total_keeps_input_order() {
	let mut plan = ExecutionPlan::new();
	let input = sales(&mut plan);
	let running = by_region(sum_amount(), "day")
		.frame(WindowFrame::rows(FrameBound::UnboundedPreceding, FrameBound::CurrentRow));
	let window = plan.window(input, WindowSpec::new().column("running", running)).unwrap();

	let rows = plan.collect(window, &mut context(vec![])).unwrap();
	assert_eq!(plan.schema(window).unwrap().len(), 5);
	assert_eq!(strings(&rows, 0), vec!["east", "west", "east", "east", "west"]);
	assert_eq!(column(&rows, 4), vec![Some(10), Some(5), Some(30), Some(50), Some(12)]);
}

#[test]
fn test_default_frame_includes_peers() {
	let mut plan = ExecutionPlan::new();
	let input = sales(&mut plan);
	let window = plan.window(input, WindowSpec::new().column("total", by_region(sum_amount(), "amount"))).unwrap();

	let rows = plan.collect(window, &mut context(vec![])).unwrap();
	assert_eq!(column(&rows, 4), vec![Some(10), Some(5), Some(50), Some(50), Some(12)]);
}

#[test]
fn test_ranking_functions() {
	let mut plan = ExecutionPlan::new();
	let input = sales(&mut plan);
	let spec = WindowSpec::new()
		.column("row_number", by_region(WindowFunction::RowNumber, "day"))
		.column("rank", by_region(WindowFunction::Rank, "amount"))
		.column("dense_rank", by_region(WindowFunction::DenseRank, "amount"));
	let window = plan.window(input, spec).unwrap();

	let rows = plan.collect(window, &mut context(vec![])).unwrap();
	assert_eq!(column(&rows, 4), vec![Some(1), Some(1), Some(2), Some(3), Some(2)]);
	assert_eq!(column(&rows, 5), vec![Some(1), Some(1), Some(2), Some(2), Some(2)]);
	assert_eq!(column(&rows, 6), vec![Some(1), Some(1), Some(2), Some(2), Some(2)]);
}

#[test]
fn test_lag_with_default() {
	let mut plan = ExecutionPlan::new();
	let input = sales(&mut plan);
	let lag = WindowFunction::Lag {
		value: Box::new(Expression::column("amount")),
		offset: 1,
		default: Some(Box::new(Expression::constant(0))),
	};
	let window = plan.window(input, WindowSpec::new().column("previous", by_region(lag, "day"))).unwrap();

	let rows = plan.collect(window, &mut context(vec![])).unwrap();
	assert_eq!(column(&rows, 4), vec![Some(0), Some(0), Some(10), Some(20), Some(5)]);
}

#[test]
fn test_group_by_with_string_agg() {
	let mut plan = ExecutionPlan::new();
	let input = sales(&mut plan);
	let spec = AggregateSpec::new()
		.group_by("region")
		.aggregate("total", AggregateCall::new(AggregateFunction::Sum, Expression::column("amount")))
		.aggregate("orders", AggregateCall::count_star())
		.aggregate("reps", AggregateCall::new(AggregateFunction::StringAgg, Expression::column("rep")).with_separator("|"))
		.aggregate("distinct_reps", AggregateCall::new(AggregateFunction::Count, Expression::column("rep")).distinct());
	let aggregate = plan.aggregate(input, spec).unwrap();

	let rows = plan.collect(aggregate, &mut context(vec![])).unwrap();
	assert_eq!(strings(&rows, 0), vec!["east", "west"]);
	assert_eq!(column(&rows, 1), vec![Some(50), Some(12)]);
	assert_eq!(column(&rows, 2), vec![Some(3), Some(2)]);
	assert_eq!(strings(&rows, 3), vec!["ann|cy|ann", "bob|bob"]);
	assert_eq!(column(&rows, 4), vec![Some(2), Some(1)]);
}

#[test]
fn test_scalar_aggregate_over_empty_input() {
	let mut plan = ExecutionPlan::new();
	let input = plan.constant_scan(Schema::new(vec![ColumnDef::new("amount", Type::Int)]), vec![]).unwrap();
	let spec = AggregateSpec::new()
		.aggregate("orders", AggregateCall::count_star())
		.aggregate("total", AggregateCall::new(AggregateFunction::Sum, Expression::column("amount")));
	let aggregate = plan.aggregate(input, spec).unwrap();

	let rows = plan.collect(aggregate, &mut context(vec![])).unwrap();
	assert_eq!(rows.len(), 1);
	assert_eq!(column(&rows, 0), vec![Some(0)]);
	assert_eq!(column(&rows, 1), vec![None]);
}
