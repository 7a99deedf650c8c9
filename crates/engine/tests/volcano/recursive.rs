// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use quarry_core::{
	ColumnDef, ConditionOperator, ConditionValue, Expression, JoinType, RemoteCondition, RemoteQuery, Schema, Type,
	Value, expression::BinaryOp,
};
use quarry_engine::{ExecutionPlan, RecursiveCte, RecursiveCteBuilder, RecursiveJoin};
use quarry_testing::{Entity, MemoryDataSource};

use crate::{column, context, int_rows, int_schema};

#[test]
fn test_factorial() {
	let mut plan = ExecutionPlan::new();
	let schema = Schema::new(vec![ColumnDef::new("n", Type::Int), ColumnDef::new("f", Type::BigInt)]);
	let anchor = plan.constant_scan(schema, vec![vec![Value::Int(1), Value::BigInt(1)]]).unwrap();
	let next = Expression::binary(BinaryOp::Add, Expression::column("fact.n"), Expression::constant(1));
	let columns = vec![
		next.clone(),
		Expression::cast(Expression::binary(BinaryOp::Multiply, Expression::column("fact.f"), next), Type::BigInt),
	];
	let cte = RecursiveCteBuilder::new("fact", anchor)
		.columns(columns)
		.filter(Expression::binary(BinaryOp::Less, Expression::column("fact.n"), Expression::constant(10)))
		.build(&mut plan)
		.unwrap();
	let reference = cte.reference(&mut plan).unwrap();

	let rows = plan.collect(reference, &mut context(vec![])).unwrap();
	assert_eq!(column(&rows, 0), (1..=10).map(Some).collect::<Vec<_>>());
	let mut factorial = 1i64;
	for (n, row) in (1..=10i64).zip(&rows) {
		factorial *= n;
		assert_eq!(row[1], Value::BigInt(factorial));
	}
}

fn employees(rows: Vec<Vec<Value>>) -> Arc<MemoryDataSource> {
	Arc::new(
		MemoryDataSource::new("hr")
			.with_entity("employees", Entity::new(&["id", "manager"]).with_key("id").with_rows(rows)),
	)
}

fn hierarchy(plan: &mut ExecutionPlan, max_recursion: u32) -> RecursiveCte {
	let columns = || vec![ColumnDef::new("id", Type::Int), ColumnDef::new("manager", Type::Int)];
	let query = || RemoteQuery::new("employees", vec!["id".to_string(), "manager".to_string()]);
	let seek_query = query().with_condition(RemoteCondition::new(
		"manager",
		ConditionOperator::Equal,
		ConditionValue::Parameter("@manager".to_string()),
	));
	let seek_input = plan.remote_scan("hr", seek_query, columns(), Some("id")).unwrap();
	let full_input = plan.remote_scan("hr", query(), columns(), Some("id")).unwrap();

	let anchor = plan.constant_scan(int_schema(&["id", "level"]), int_rows(&[&[1, 0]])).unwrap();
	RecursiveCteBuilder::new("org", anchor)
		.columns(vec![
			Expression::column("employees.id"),
			Expression::binary(BinaryOp::Add, Expression::column("org.level"), Expression::constant(1)),
		])
		.join(RecursiveJoin {
			seek_input,
			full_input,
			join_type: JoinType::Inner,
			cte_column: "id".to_string(),
			source_column: "manager".to_string(),
			parameter: "@manager".to_string(),
		})
		.max_recursion(max_recursion)
		.build(plan)
		.unwrap()
}

#[test]
fn test_hierarchy_walk() {
	let mut rows = int_rows(&[&[2, 1], &[3, 1], &[4, 2], &[5, 2], &[6, 3], &[7, 5]]);
	rows.insert(0, vec![Value::Int(1), Value::Null]);
	let source = employees(rows);

	let mut plan = ExecutionPlan::new();
	let reference = hierarchy(&mut plan, 100).reference(&mut plan).unwrap();
	let rows = plan.collect(reference, &mut context(vec![source])).unwrap();

	let mut levels: Vec<(Option<i64>, Option<i64>)> =
		column(&rows, 0).into_iter().zip(column(&rows, 1)).collect();
	levels.sort();
	let expected: Vec<(Option<i64>, Option<i64>)> =
		[(1, 0), (2, 1), (3, 1), (4, 2), (5, 2), (6, 2), (7, 3)].iter().map(|(i, l)| (Some(*i), Some(*l))).collect();
	assert_eq!(levels, expected);
}

#[test]
fn test_cycle_hits_max_recursion() {
	let source = employees(int_rows(&[&[1, 2], &[2, 1]]));
	let mut plan = ExecutionPlan::new();
	let reference = hierarchy(&mut plan, 5).reference(&mut plan).unwrap();
	let err = plan.collect(reference, &mut context(vec![source])).unwrap_err();
	assert_eq!(err.number(), quarry_engine::planner::recursive::MAX_RECURSION_EXCEEDED);
}

#[test]
fn test_references_share_one_evaluation() {
	let source = employees(int_rows(&[&[2, 1], &[3, 2]]));
	let mut plan = ExecutionPlan::new();
	let cte = hierarchy(&mut plan, 100);
	let single = cte.reference(&mut plan).unwrap();

	let mut ctx = context(vec![source.clone()]);
	assert_eq!(plan.collect(single, &mut ctx).unwrap().len(), 3);
	let fetched = source.fetches().len();

	source.reset_counters();
	let first = cte.reference(&mut plan).unwrap();
	let second = cte.reference(&mut plan).unwrap();
	let both = plan.concatenate(&[first, second]).unwrap();
	ctx.begin_execution();
	assert_eq!(plan.collect(both, &mut ctx).unwrap().len(), 6);
	assert_eq!(source.fetches().len(), fetched);
}
