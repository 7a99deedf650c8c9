// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use quarry_core::{
	ColumnDef, ConditionOperator, ConditionValue, Expression, JoinType, RemoteCondition, RemoteQuery, Row, SortKey,
	Type, Value, expression::BinaryOp,
};
use quarry_engine::ExecutionPlan;
use quarry_testing::{Entity, MemoryDataSource};
use quarry_type::params;

use crate::{column, context, int_rows, int_schema};

fn sorted(rows: &[Row]) -> Vec<Vec<Option<i64>>> {
	let width = rows.first().map(Row::len).unwrap_or(0);
	let mut result: Vec<Vec<Option<i64>>> =
		(0..rows.len()).map(|i| (0..width).map(|c| column(&rows[i..=i], c)[0]).collect()).collect();
	result.sort();
	result
}

fn merge(join_type: JoinType) -> Vec<Vec<Option<i64>>> {
	let mut plan = ExecutionPlan::new();
	let mut left_rows = int_rows(&[&[1, 10], &[2, 20], &[2, 21], &[4, 40]]);
	left_rows.insert(0, vec![Value::Null, Value::Int(99)]);
	let mut right_rows = int_rows(&[&[2, 200], &[3, 300], &[4, 400], &[4, 401]]);
	right_rows.insert(0, vec![Value::Null, Value::Int(0)]);

	let left = plan.constant_scan(int_schema(&["id", "name"]), left_rows).unwrap();
	let right = plan.constant_scan(int_schema(&["rid", "v"]), right_rows).unwrap();
	let left = plan.sort(left, vec![SortKey::asc("id")], 0).unwrap();
	let right = plan.sort(right, vec![SortKey::asc("rid")], 0).unwrap();
	let join = plan.merge_join(left, right, join_type, &[("id", "rid")]).unwrap();
	sorted(&plan.collect(join, &mut context(vec![])).unwrap())
}

const N: Option<i64> = None;

fn matched() -> Vec<Vec<Option<i64>>> {
	vec![
		vec![Some(2), Some(20), Some(2), Some(200)],
		vec![Some(2), Some(21), Some(2), Some(200)],
		vec![Some(4), Some(40), Some(4), Some(400)],
		vec![Some(4), Some(40), Some(4), Some(401)],
	]
}

fn with(mut rows: Vec<Vec<Option<i64>>>, extra: &[[Option<i64>; 4]]) -> Vec<Vec<Option<i64>>> {
	rows.extend(extra.iter().map(|row| row.to_vec()));
	rows.sort();
	rows
}

#[test]
fn test_merge_inner_join() {
	assert_eq!(merge(JoinType::Inner), matched());
}

#[test]
fn test_merge_left_join_keeps_null_keys() {
	let expected = with(matched(), &[[N, Some(99), N, N], [Some(1), Some(10), N, N]]);
	assert_eq!(merge(JoinType::LeftOuter), expected);
}

#[test]
fn test_merge_right_join() {
	let expected = with(matched(), &[[N, N, N, Some(0)], [N, N, Some(3), Some(300)]]);
	assert_eq!(merge(JoinType::RightOuter), expected);
}

#[test]
fn test_merge_full_join() {
	let expected = with(
		matched(),
		&[[N, Some(99), N, N], [Some(1), Some(10), N, N], [N, N, N, Some(0)], [N, N, Some(3), Some(300)]],
	);
	assert_eq!(merge(JoinType::FullOuter), expected);
}

#[test]
fn test_merge_join_rejects_semi_join() {
	let mut plan = ExecutionPlan::new();
	let left = plan.constant_scan(int_schema(&["a"]), vec![]).unwrap();
	let right = plan.constant_scan(int_schema(&["b"]), vec![]).unwrap();
	assert!(plan.merge_join(left, right, JoinType::LeftSemi, &[("a", "b")]).is_err());
}

fn orders() -> Arc<MemoryDataSource> {
	Arc::new(MemoryDataSource::new("crm").with_entity(
		"orders",
		Entity::new(&["customer_id", "amount"]).with_rows(int_rows(&[&[1, 5], &[1, 7], &[3, 9]])),
	))
}

fn orders_of(plan: &mut ExecutionPlan) -> quarry_engine::NodeId {
	let query = RemoteQuery::new("orders", vec!["customer_id".to_string(), "amount".to_string()]).with_condition(
		RemoteCondition::new("customer_id", ConditionOperator::Equal, ConditionValue::Parameter("@cid".to_string())),
	);
	plan.remote_scan(
		"crm",
		query,
		vec![ColumnDef::new("customer_id", Type::Int), ColumnDef::new("amount", Type::Int)],
		None,
	)
	.unwrap()
}

fn customers(plan: &mut ExecutionPlan) -> quarry_engine::NodeId {
	let mut rows = int_rows(&[&[1], &[2], &[3]]);
	rows.push(vec![Value::Null]);
	plan.constant_scan(int_schema(&["id"]), rows).unwrap()
}

#[test]
fn test_nested_loop_semi_join_emits_each_left_row_once() {
	let source = orders();
	let mut plan = ExecutionPlan::new();
	let left = customers(&mut plan);
	let right = orders_of(&mut plan);
	let join = plan.nested_loop(left, right, JoinType::LeftSemi, &[("id", "@cid")], None).unwrap();

	assert_eq!(plan.schema(join).unwrap().len(), 1);
	let rows = plan.collect(join, &mut context(vec![source])).unwrap();
	assert_eq!(column(&rows, 0), vec![Some(1), Some(3)]);
}

#[test]
fn test_nested_loop_anti_semi_join_keeps_null_rows() {
	let source = orders();
	let mut plan = ExecutionPlan::new();
	let left = customers(&mut plan);
	let right = orders_of(&mut plan);
	let join = plan.nested_loop(left, right, JoinType::LeftAntiSemi, &[("id", "@cid")], None).unwrap();

	let rows = plan.collect(join, &mut context(vec![source])).unwrap();
	assert_eq!(column(&rows, 0), vec![Some(2), None]);
}

#[test]
fn test_nested_loop_left_outer_with_residual_predicate() {
	let source = orders();
	let mut plan = ExecutionPlan::new();
	let left = customers(&mut plan);
	let right = orders_of(&mut plan);
	let predicate = Expression::binary(
		BinaryOp::Greater,
		Expression::column("orders.amount"),
		Expression::constant(6),
	);
	let join = plan.nested_loop(left, right, JoinType::LeftOuter, &[("id", "@cid")], Some(&predicate)).unwrap();

	let rows = plan.collect(join, &mut context(vec![source.clone()])).unwrap();
	assert_eq!(column(&rows, 0), vec![Some(1), Some(2), Some(3), None]);
	assert_eq!(column(&rows, 2), vec![Some(7), None, Some(9), None]);
	// one fetch per left row
	assert_eq!(source.fetch_count("orders"), 4);
}

#[test]
fn test_nested_loop_restores_outer_parameters() {
	let source = orders();
	let mut plan = ExecutionPlan::new();
	let left = customers(&mut plan);
	let right = orders_of(&mut plan);
	let join = plan.nested_loop(left, right, JoinType::LeftSemi, &[("id", "@cid")], None).unwrap();

	let mut ctx = context(vec![source.clone()]).with_params(params! { cid: 42 });
	assert_eq!(plan.collect(join, &mut ctx).unwrap().len(), 2);
	assert_eq!(ctx.param("@cid").unwrap(), &Value::Int(42));

	let mut ctx = context(vec![source]);
	plan.collect(join, &mut ctx).unwrap();
	assert_eq!(ctx.param("@cid").unwrap_err().number(), 137);
}
