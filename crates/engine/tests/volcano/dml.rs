// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use quarry_core::{
	ColumnDef, DmlRequest, ExecutionOptions, Expression, RemoteCondition, RemoteQuery, Type, Value,
	expression::BinaryOp,
};
use quarry_engine::{DeleteRoot, ExecutionPlan, InsertRoot, NodeId, UpdateRoot};
use quarry_testing::{Entity, MemoryDataSource};

use crate::{context, int_rows, int_schema};

fn contacts() -> Arc<MemoryDataSource> {
	Arc::new(MemoryDataSource::new("crm").with_entity(
		"contacts",
		Entity::new(&["id", "score"]).with_key("id").with_rows(int_rows(&[&[1, 10], &[2, 60], &[3, 80], &[4, 0]])),
	))
}

fn scan(plan: &mut ExecutionPlan) -> NodeId {
	let query = RemoteQuery::new("contacts", vec!["id".to_string(), "score".to_string()]).with_alias("c");
	let columns = vec![ColumnDef::new("id", Type::Int), ColumnDef::new("score", Type::Int)];
	plan.remote_scan("crm", query, columns, Some("id")).unwrap()
}

fn above_fifty(plan: &mut ExecutionPlan, input: NodeId) -> NodeId {
	let predicate = Expression::binary(BinaryOp::Greater, Expression::column("c.score"), Expression::constant(50));
	plan.filter(input, &predicate).unwrap()
}

fn scores(source: &MemoryDataSource) -> Vec<Value> {
	source.records("contacts").into_iter().map(|record| record[1].clone()).collect()
}

#[test]
fn test_insert_in_batches() {
	let source = contacts();
	let mut plan = ExecutionPlan::new();
	let rows = plan.constant_scan(int_schema(&["id", "score"]), int_rows(&[&[5, 1], &[6, 2], &[7, 3], &[8, 4], &[9, 5]])).unwrap();
	let insert = InsertRoot::new(&plan, "crm", "contacts", vec!["id".to_string(), "score".to_string()], rows).unwrap();

	let mut ctx = context(vec![source.clone()]).with_options(ExecutionOptions::new().batch_size(2));
	assert_eq!(insert.execute(&plan, &mut ctx).unwrap(), 5);
	assert_eq!(ctx.rowcount(), 5);
	assert_eq!(source.records("contacts").len(), 9);

	let requests = source.requests();
	assert_eq!(requests.len(), 3);
	let mut sizes: Vec<usize> = requests.iter().filter_map(DmlRequest::len).collect();
	sizes.sort();
	assert_eq!(sizes, vec![1, 2, 2]);
}

#[test]
fn test_insert_width_checked() {
	let mut plan = ExecutionPlan::new();
	let rows = plan.constant_scan(int_schema(&["id"]), vec![]).unwrap();
	let err = InsertRoot::new(&plan, "crm", "contacts", vec!["id".to_string(), "score".to_string()], rows).unwrap_err();
	assert_eq!(err.number(), 205);
}

#[test]
fn test_update_filtered_records() {
	let source = contacts();
	let mut plan = ExecutionPlan::new();
	let input = scan(&mut plan);
	let input = above_fifty(&mut plan, input);
	let bump = Expression::binary(BinaryOp::Add, Expression::column("c.score"), Expression::constant(1));
	let update = UpdateRoot::new(&mut plan, "crm", "contacts", "c", input, vec![("score".to_string(), bump)], true).unwrap();

	let mut ctx = context(vec![source.clone()]);
	assert_eq!(update.execute(&plan, &mut ctx).unwrap(), 2);
	assert_eq!(scores(&source), vec![Value::Int(10), Value::Int(61), Value::Int(81), Value::Int(0)]);
}

#[test]
fn test_update_without_filter_is_blocked() {
	let source = contacts();
	let mut plan = ExecutionPlan::new();
	let input = scan(&mut plan);
	let update =
		UpdateRoot::new(&mut plan, "crm", "contacts", "c", input, vec![("score".to_string(), Expression::constant(0))], false)
			.unwrap();

	let mut ctx = context(vec![source.clone()]);
	assert_eq!(update.execute(&plan, &mut ctx).unwrap_err().number(), 50010);
	assert!(source.requests().is_empty());

	let mut ctx = context(vec![source.clone()]).with_options(ExecutionOptions::new().block_update_without_where(false));
	assert_eq!(update.execute(&plan, &mut ctx).unwrap(), 4);
	assert!(scores(&source).iter().all(|score| *score == Value::Int(0)));
}

#[test]
fn test_update_requires_primary_key() {
	let mut plan = ExecutionPlan::new();
	let input = plan.constant_scan(int_schema(&["id"]), vec![]).unwrap();
	let err = UpdateRoot::new(&mut plan, "crm", "contacts", "c", input, vec![], true).err().unwrap();
	assert_eq!(err.number(), 50011);
}

#[test]
fn test_declined_confirmation_cancels_delete() {
	let source = contacts();
	let mut plan = ExecutionPlan::new();
	let input = scan(&mut plan);
	let delete = DeleteRoot::new(&plan, "crm", "contacts", "c", input, false).unwrap();

	let options = ExecutionOptions::new().block_delete_without_where(false).delete_confirm_threshold(2);
	let mut ctx =
		context(vec![source.clone()]).with_options(options).with_confirm(|confirmation| confirmation.count < 4);
	let err = delete.execute(&plan, &mut ctx).unwrap_err();
	assert_eq!(err.number(), 3980);
	assert!(err.is_cancelled());
	assert_eq!(source.records("contacts").len(), 4);
	assert!(source.requests().is_empty());
}

#[test]
fn test_delete_by_key() {
	let source = contacts();
	let mut plan = ExecutionPlan::new();
	let input = scan(&mut plan);
	let input = above_fifty(&mut plan, input);
	let delete = DeleteRoot::new(&plan, "crm", "contacts", "c", input, true).unwrap();

	let mut ctx = context(vec![source.clone()]);
	assert_eq!(delete.execute(&plan, &mut ctx).unwrap(), 2);
	assert_eq!(source.records("contacts"), int_rows(&[&[1, 10], &[4, 0]]));
	assert!(matches!(source.requests()[0], DmlRequest::Delete { .. }));
}

#[test]
fn test_bulk_delete_when_enabled() {
	let source = Arc::new(MemoryDataSource::new("crm").with_bulk_delete().with_entity(
		"contacts",
		Entity::new(&["id", "score"]).with_key("id").with_rows(int_rows(&[&[1, 0], &[2, 60], &[3, 0]])),
	));
	let mut plan = ExecutionPlan::new();
	let query = RemoteQuery::new("contacts", vec!["id".to_string(), "score".to_string()])
		.with_alias("c")
		.with_condition(RemoteCondition::equal("score", Value::Int(0)));
	let columns = vec![ColumnDef::new("id", Type::Int), ColumnDef::new("score", Type::Int)];
	let input = plan.remote_scan("crm", query, columns, Some("id")).unwrap();
	let delete = DeleteRoot::new(&plan, "crm", "contacts", "c", input, true)
		.unwrap()
		.with_bulk_filter(vec![RemoteCondition::equal("score", Value::Int(0))]);

	let mut ctx = context(vec![source.clone()]).with_options(ExecutionOptions::new().use_bulk_delete(true));
	assert_eq!(delete.execute(&plan, &mut ctx).unwrap(), 2);
	let requests = source.requests();
	assert_eq!(requests.len(), 1);
	assert!(matches!(requests[0], DmlRequest::BulkDelete { .. }));
	assert_eq!(source.records("contacts"), int_rows(&[&[2, 60]]));
}

#[test]
fn test_partial_write_is_reported() {
	let source = contacts();
	source.fail_dml_after(1);
	let mut plan = ExecutionPlan::new();
	let rows = plan.constant_scan(int_schema(&["id", "score"]), int_rows(&[&[5, 1], &[6, 2], &[7, 3]])).unwrap();
	let insert = InsertRoot::new(&plan, "crm", "contacts", vec!["id".to_string(), "score".to_string()], rows).unwrap();

	let options = ExecutionOptions::new().batch_size(1).max_degree_of_parallelism(1).insert_confirm_threshold(10);
	let mut ctx = context(vec![source.clone()]).with_options(options);
	let err = insert.execute(&plan, &mut ctx).unwrap_err();
	assert!(err.diagnostic().notes.iter().any(|note| note.starts_with("1 records were written")));
	assert_eq!(source.records("contacts").len(), 5);
}

#[test]
fn test_rejected_batch_stops_sequential_dispatch() {
	let source = contacts();
	source.fail_dml_after(1);
	let mut plan = ExecutionPlan::new();
	let rows =
		plan.constant_scan(int_schema(&["id", "score"]), int_rows(&[&[5, 1], &[6, 2], &[7, 3], &[8, 4]])).unwrap();
	let insert = InsertRoot::new(&plan, "crm", "contacts", vec!["id".to_string(), "score".to_string()], rows).unwrap();

	let options = ExecutionOptions::new().batch_size(1).max_degree_of_parallelism(1).insert_confirm_threshold(10);
	let mut ctx = context(vec![source.clone()]).with_options(options);
	insert.execute(&plan, &mut ctx).unwrap_err();
	assert_eq!(source.requests().len(), 2);
	assert_eq!(source.records("contacts").len(), 5);
}

#[test]
fn test_rejected_batch_stops_parallel_dispatch() {
	let source = contacts();
	source.fail_dml_after(0);
	let mut plan = ExecutionPlan::new();
	let values: Vec<Vec<Value>> = (100..140).map(|id| vec![Value::Int(id), Value::Int(0)]).collect();
	let rows = plan.constant_scan(int_schema(&["id", "score"]), values).unwrap();
	let insert = InsertRoot::new(&plan, "crm", "contacts", vec!["id".to_string(), "score".to_string()], rows).unwrap();

	let options = ExecutionOptions::new().batch_size(1).max_degree_of_parallelism(4).insert_confirm_threshold(100);
	let mut ctx = context(vec![source.clone()]).with_options(options);
	insert.execute(&plan, &mut ctx).unwrap_err();
	// at most one request per worker passes the check before the first rejection
	assert!(source.requests().len() <= 4);
	assert_eq!(source.records("contacts").len(), 4);
}
