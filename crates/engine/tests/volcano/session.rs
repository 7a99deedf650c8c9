// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use quarry_core::{
	ColumnDef, DataSources, Expression, RemoteQuery, SortKey, Type, Value,
	expression::{AggregateCall, BinaryOp},
};
use quarry_engine::{
	AggregateSpec, Batch, CursorKind, CursorState, ExecutionPlan, FetchDirection, InsertRoot, NodeId, Session, Statement,
};
use quarry_testing::{Entity, MemoryDataSource};
use quarry_type::params;

use crate::{int_rows, int_schema};

fn session() -> (Session, Arc<MemoryDataSource>) {
	let source = Arc::new(MemoryDataSource::new("crm").with_entity(
		"contacts",
		Entity::new(&["id", "score"]).with_key("id").with_rows(int_rows(&[&[1, 10], &[2, 60], &[3, 80], &[4, 0]])),
	));
	let session = Session::new(DataSources::new().with(source.clone()));
	(session, source)
}

fn contacts(plan: &mut ExecutionPlan) -> NodeId {
	let query = RemoteQuery::new("contacts", vec!["id".to_string(), "score".to_string()])
		.with_alias("c")
		.with_order(SortKey::asc("id"));
	let columns = vec![ColumnDef::new("id", Type::Int), ColumnDef::new("score", Type::Int)];
	plan.remote_scan("crm", query, columns, Some("id")).unwrap()
}

fn scores_above(threshold: Expression) -> (ExecutionPlan, NodeId) {
	let mut plan = ExecutionPlan::new();
	let scan = contacts(&mut plan);
	let predicate = Expression::binary(BinaryOp::Greater, Expression::column("c.score"), threshold);
	let root = plan.filter(scan, &predicate).unwrap();
	(plan, root)
}

#[test]
fn test_reader_walks_multiple_result_sets() {
	let (mut session, _) = session();
	let (first, first_root) = scores_above(Expression::constant(50));
	let (second, second_root) = scores_above(Expression::constant(-1));
	let batch = Batch::new().with(Statement::query(first, first_root)).with(Statement::query(second, second_root));

	let mut reader = session.execute_reader(&batch, ()).unwrap();
	assert_eq!(reader.field_count(), 2);
	assert_eq!(reader.name(1).unwrap(), "score");
	assert_eq!(reader.field_type(0).unwrap(), Type::Int);
	assert_eq!(reader.ordinal("C.ID").unwrap(), 0);

	let mut ids = vec![];
	while reader.read().unwrap() {
		ids.push(reader.get::<i32>(0).unwrap());
	}
	assert_eq!(ids, vec![2, 3]);
	assert!(reader.value(0).is_err());

	assert!(reader.next_result().unwrap());
	let mut count = 0;
	while reader.read().unwrap() {
		assert!(!reader.is_null(1).unwrap());
		count += 1;
	}
	assert_eq!(count, 4);
	assert!(!reader.next_result().unwrap());
	assert!(!reader.has_result());
	assert_eq!(reader.close().unwrap(), -1);
}

#[test]
fn test_variables_and_parameters() {
	let (mut session, _) = session();
	let mut plan = ExecutionPlan::new();
	plan.declare_variable("@limit", Type::Int);
	plan.declare_parameter("@bonus", Type::Int);
	let scan = contacts(&mut plan);
	let threshold =
		Expression::binary(BinaryOp::Add, Expression::variable("@limit"), Expression::parameter("@bonus"));
	let predicate = Expression::binary(BinaryOp::Greater, Expression::column("c.score"), threshold);
	let root = plan.filter(scan, &predicate).unwrap();

	let batch = Batch::new()
		.with(Statement::declare("@limit", Type::Int, Some(Expression::constant(50))))
		.with(Statement::set(
			"@limit",
			Expression::binary(BinaryOp::Add, Expression::variable("@limit"), Expression::constant(5)),
		))
		.with(Statement::query(plan, root));

	let mut reader = session.execute_reader(&batch, params! { bonus: 10 }).unwrap();
	let mut ids = vec![];
	while reader.read().unwrap() {
		ids.push(reader.get_by_name::<i64>("id").unwrap());
	}
	assert_eq!(ids, vec![3]);
	reader.close().unwrap();

	// variables do not outlive their batch
	assert!(!session.context().variables.is_declared("@limit"));
}

#[test]
fn test_dropped_reader_ends_batch() {
	let (mut session, _) = session();
	let batch = Batch::new().with(Statement::declare("@limit", Type::Int, Some(Expression::constant(1))));

	let reader = session.execute_reader(&batch, ()).unwrap();
	assert!(!reader.has_result());
	drop(reader);
	assert!(!session.context().variables.is_declared("@limit"));
}

#[test]
fn test_scalar_and_non_query() {
	let (mut session, source) = session();

	let mut plan = ExecutionPlan::new();
	let scan = contacts(&mut plan);
	let count = plan.aggregate(scan, AggregateSpec::new().aggregate("n", AggregateCall::count_star())).unwrap();
	let batch = Batch::from(Statement::query(plan, count));
	assert_eq!(session.execute_scalar(&batch, ()).unwrap(), Value::Int(4));

	let mut plan = ExecutionPlan::new();
	let rows = plan.constant_scan(int_schema(&["id", "score"]), int_rows(&[&[5, 1], &[6, 2]])).unwrap();
	let root = InsertRoot::new(&plan, "crm", "contacts", vec!["id".to_string(), "score".to_string()], rows).unwrap();
	let insert = Batch::from(Statement::Insert {
		plan,
		root,
	});
	assert_eq!(session.execute_non_query(&insert, ()).unwrap(), 2);
	assert_eq!(source.records("contacts").len(), 6);
	assert_eq!(session.context().rowcount(), 2);

	assert_eq!(session.execute_scalar(&batch, ()).unwrap(), Value::Int(6));
	assert_eq!(session.execute_non_query(&Batch::new(), ()).unwrap(), -1);
}

#[test]
fn test_scalar_of_empty_result_is_null() {
	let (mut session, _) = session();
	let (plan, root) = scores_above(Expression::constant(1000));
	assert_eq!(session.execute_scalar(&Batch::from(Statement::query(plan, root)), ()).unwrap(), Value::Null);
}

#[test]
fn test_static_cursor_through_statements() {
	let (mut session, _) = session();
	let mut plan = ExecutionPlan::new();
	let root = contacts(&mut plan);

	let batch = Batch::new()
		.with(Statement::declare_cursor("contacts_cursor", CursorKind::Static, plan, root))
		.with(Statement::OpenCursor("contacts_cursor".to_string()))
		.with(Statement::fetch("contacts_cursor", FetchDirection::Last))
		.with(Statement::fetch("contacts_cursor", FetchDirection::Absolute(2)))
		.with(Statement::declare("@id", Type::Int, None))
		.with(Statement::declare("@score", Type::Int, None))
		.with(Statement::fetch_into(
			"contacts_cursor",
			FetchDirection::Next,
			vec!["@id".to_string(), "@score".to_string()],
		))
		.with(Statement::fetch("contacts_cursor", FetchDirection::Relative(5)));

	let mut reader = session.execute_reader(&batch, ()).unwrap();
	let mut fetched = vec![];
	loop {
		let mut ids = vec![];
		while reader.read().unwrap() {
			ids.push(reader.get::<Option<i32>>(0).unwrap());
		}
		fetched.push(ids);
		if !reader.next_result().unwrap() {
			break;
		}
	}
	reader.close().unwrap();
	assert_eq!(fetched, vec![vec![Some(4)], vec![Some(2)], vec![]]);
	assert_eq!(session.context().fetch_status(), -1);

	// the cursor outlives the batch
	assert_eq!(session.context().cursor_state("CONTACTS_CURSOR"), Some(CursorState::Open));
	let close = Batch::from(Statement::CloseCursor("contacts_cursor".to_string()));
	session.execute_non_query(&close, ()).unwrap();
	assert_eq!(session.context().cursor_state("contacts_cursor"), Some(CursorState::Closed));
	let deallocate = Batch::from(Statement::DeallocateCursor("contacts_cursor".to_string()));
	session.execute_non_query(&deallocate, ()).unwrap();
	assert_eq!(session.context().cursor_state("contacts_cursor"), None);
	let reopen = Batch::from(Statement::OpenCursor("contacts_cursor".to_string()));
	assert_eq!(session.execute_non_query(&reopen, ()).unwrap_err().number(), 16916);
}

#[test]
fn test_forward_only_cursor_rejects_scrolling() {
	let (mut session, _) = session();
	let mut plan = ExecutionPlan::new();
	let root = contacts(&mut plan);
	let batch = Batch::new()
		.with(Statement::declare_cursor("forward", CursorKind::ForwardOnly, plan, root))
		.with(Statement::OpenCursor("forward".to_string()))
		.with(Statement::fetch("forward", FetchDirection::Prior));

	let err = session.execute_non_query(&batch, ()).unwrap_err();
	assert_eq!(err.number(), 16911);
}

#[test]
fn test_cancelled_session_stops_reading() {
	let (mut session, _) = session();
	let (plan, root) = scores_above(Expression::constant(-1));
	let batch = Batch::from(Statement::query(plan, root));
	let token = session.cancellation();

	let mut reader = session.execute_reader(&batch, ()).unwrap();
	assert!(reader.read().unwrap());
	token.cancel();
	assert!(reader.read().unwrap_err().is_cancelled());
}
