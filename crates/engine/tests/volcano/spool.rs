// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use quarry_core::{ColumnDef, ConditionOperator, ConditionValue, JoinType, RemoteCondition, RemoteQuery, Type, Value};
use quarry_engine::{AdaptiveSpoolPolicy, ExecutionPlan};
use quarry_testing::{Entity, MemoryDataSource};

use crate::{column, context, int_rows, int_schema};

fn children(rows: usize, page_size: usize) -> Arc<MemoryDataSource> {
	let records = (1..=rows as i32).map(|id| vec![Value::Int(id), Value::Int(id % 5 + 1)]).collect();
	Arc::new(
		MemoryDataSource::new("crm")
			.with_page_size(page_size)
			.with_entity("child", Entity::new(&["id", "parent"]).with_key("id").with_rows(records)),
	)
}

fn child_columns() -> Vec<ColumnDef> {
	vec![ColumnDef::new("id", Type::Int), ColumnDef::new("parent", Type::Int)]
}

fn child_query() -> RemoteQuery {
	RemoteQuery::new("child", vec!["id".to_string(), "parent".to_string()])
}

#[test]
fn test_table_spool_replays_without_reexecuting() {
	let mut plan = ExecutionPlan::new();
	let scan = plan.constant_scan(int_schema(&["n"]), int_rows(&[&[3], &[1], &[2]])).unwrap();
	let spool = plan.table_spool(scan).unwrap();
	let first = plan.spool_consumer(spool).unwrap();
	let second = plan.spool_consumer(spool).unwrap();
	let both = plan.concatenate(&[first, second]).unwrap();

	let mut ctx = context(vec![]);
	let rows = plan.collect(both, &mut ctx).unwrap();
	assert_eq!(column(&rows, 0), vec![Some(3), Some(1), Some(2), Some(3), Some(1), Some(2)]);
	assert_eq!(plan.execution_count(scan).unwrap(), 1);

	ctx.begin_execution();
	plan.collect(both, &mut ctx).unwrap();
	assert_eq!(plan.execution_count(scan).unwrap(), 2);
}

#[test]
fn test_table_spool_fetches_remote_pages_once() {
	let source = children(12, 5);
	let mut plan = ExecutionPlan::new();
	let scan = plan.remote_scan("crm", child_query(), child_columns(), Some("id")).unwrap();
	let spool = plan.table_spool(scan).unwrap();
	let first = plan.spool_consumer(spool).unwrap();
	let second = plan.spool_consumer(spool).unwrap();
	let both = plan.concatenate(&[first, second]).unwrap();

	let mut ctx = context(vec![source.clone()]);
	assert_eq!(plan.collect(both, &mut ctx).unwrap().len(), 24);
	assert_eq!(source.fetch_count("child"), 3);
}

#[test]
fn test_index_spool_memoizes_per_key() {
	let source = children(10, 100);
	let mut plan = ExecutionPlan::new();
	let outer = plan.constant_scan(int_schema(&["k"]), int_rows(&[&[1], &[2], &[1], &[2], &[1]])).unwrap();
	let full = plan.remote_scan("crm", child_query(), child_columns(), Some("id")).unwrap();
	let spool = plan.index_spool(full, "parent", "@p").unwrap();
	let join = plan.nested_loop(outer, spool, JoinType::Inner, &[("k", "@p")], None).unwrap();

	let mut ctx = context(vec![source.clone()]);
	let rows = plan.collect(join, &mut ctx).unwrap();
	assert_eq!(rows.len(), 10);
	assert!(rows.iter().all(|row| row[0] == row[2]));
	assert_eq!(plan.execution_count(full).unwrap(), 2);
}

#[test]
fn test_adaptive_spool_switches_after_threshold() {
	// 10 records over pages of 5: two seeks cost as much as a full fetch
	let source = children(10, 5);
	let mut plan = ExecutionPlan::new();
	let outer = plan.constant_scan(int_schema(&["k"]), int_rows(&[&[1], &[2], &[3], &[4], &[5], &[6]])).unwrap();
	let seek_query = child_query().with_condition(RemoteCondition::new(
		"parent",
		ConditionOperator::Equal,
		ConditionValue::Parameter("@p".to_string()),
	));
	let seek = plan.remote_scan("crm", seek_query, child_columns(), Some("id")).unwrap();
	let full = plan.remote_scan("crm", child_query(), child_columns(), Some("id")).unwrap();
	let spool = plan.adaptive_index_spool(seek, full, "parent", "@p", AdaptiveSpoolPolicy::default()).unwrap();
	let join = plan.nested_loop(outer, spool, JoinType::Inner, &[("k", "@p")], None).unwrap();

	let mut ctx = context(vec![source.clone()]);
	let rows = plan.collect(join, &mut ctx).unwrap();
	assert_eq!(rows.len(), 10);
	assert_eq!(plan.execution_count(seek).unwrap(), 2);
	assert_eq!(plan.execution_count(full).unwrap(), 1);

	let mut parents = column(&rows, 0);
	parents.sort();
	assert_eq!(parents, vec![Some(1), Some(1), Some(2), Some(2), Some(3), Some(3), Some(4), Some(4), Some(5), Some(5)]);
}

#[test]
fn test_adaptive_spool_without_estimate_uses_default_threshold() {
	let source = Arc::new(MemoryDataSource::new("crm").with_entity(
		"child",
		Entity::new(&["id", "parent"]).with_estimate(None).with_rows(int_rows(&[&[1, 1], &[2, 2], &[3, 3]])),
	));
	let mut plan = ExecutionPlan::new();
	let keys: Vec<Vec<Value>> = (1..=4).map(|k| vec![Value::Int(k)]).collect();
	let outer = plan.constant_scan(int_schema(&["k"]), keys).unwrap();
	let seek_query = child_query().with_condition(RemoteCondition::new(
		"parent",
		ConditionOperator::Equal,
		ConditionValue::Parameter("@p".to_string()),
	));
	let seek = plan.remote_scan("crm", seek_query, child_columns(), None).unwrap();
	let full = plan.remote_scan("crm", child_query(), child_columns(), None).unwrap();
	let policy = AdaptiveSpoolPolicy::new(2);
	let spool = plan.adaptive_index_spool(seek, full, "parent", "@p", policy).unwrap();
	let join = plan.nested_loop(outer, spool, JoinType::Inner, &[("k", "@p")], None).unwrap();

	let mut ctx = context(vec![source]);
	assert_eq!(plan.collect(join, &mut ctx).unwrap().len(), 3);
	assert_eq!(plan.execution_count(seek).unwrap(), 2);
	assert_eq!(plan.execution_count(full).unwrap(), 1);
}
