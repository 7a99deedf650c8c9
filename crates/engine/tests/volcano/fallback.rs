// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};

use quarry_core::{ColumnDef, ExecutionOptions, RemoteQuery, Type};
use quarry_engine::{ExecutionPlan, NodeId};
use quarry_testing::{Entity, MemoryDataSource, row};

use crate::{column, context, int_rows, int_schema};

fn accounts(native_calls: Arc<AtomicUsize>) -> Arc<MemoryDataSource> {
	Arc::new(
		MemoryDataSource::new("crm")
			.with_entity("accounts", Entity::new(&["id", "balance"]).with_rows(int_rows(&[&[1, 100], &[2, 250]])))
			.with_native(move |sql, _| {
				native_calls.fetch_add(1, Ordering::SeqCst);
				assert!(sql.starts_with("SELECT"));
				Ok(vec![row![1, 100], row![2, 250], row![3, 0]])
			}),
	)
}

fn columns() -> Vec<ColumnDef> {
	vec![ColumnDef::new("id", Type::Int), ColumnDef::new("balance", Type::Int)]
}

fn scan(plan: &mut ExecutionPlan, entity: &str) -> NodeId {
	let query = RemoteQuery::new(entity, vec!["id".to_string(), "balance".to_string()]);
	plan.remote_scan("crm", query, columns(), Some("id")).unwrap()
}

fn native(plan: &mut ExecutionPlan) -> NodeId {
	plan.native_query("crm", "SELECT id, balance FROM accounts", columns()).unwrap()
}

#[test]
fn test_incompatible_query_falls_back() {
	let calls = Arc::new(AtomicUsize::new(0));
	let source = accounts(calls.clone());
	source.set_incompatible(Some("the aggregate cannot be expressed"));

	let mut plan = ExecutionPlan::new();
	let primary = scan(&mut plan, "accounts");
	let secondary = native(&mut plan);
	let node = plan.try_catch(primary, secondary).unwrap();
	assert_eq!(plan.catch_source(node).unwrap(), Some(secondary));

	let mut ctx = context(vec![source.clone()]).with_options(ExecutionOptions::new().use_native_query_endpoint(true));
	let rows = plan.collect(node, &mut ctx).unwrap();
	// row 3 exists only behind the native endpoint
	assert_eq!(column(&rows, 0), vec![Some(1), Some(2), Some(3)]);
	assert_eq!(calls.load(Ordering::SeqCst), 1);
	assert_eq!(source.fetch_count("accounts"), 0);
}

#[test]
fn test_fallback_needs_native_endpoint() {
	let calls = Arc::new(AtomicUsize::new(0));
	let source = accounts(calls.clone());
	source.set_incompatible(Some("the aggregate cannot be expressed"));

	let mut plan = ExecutionPlan::new();
	let primary = scan(&mut plan, "accounts");
	let secondary = native(&mut plan);
	let node = plan.try_catch(primary, secondary).unwrap();

	let err = plan.collect(node, &mut context(vec![source])).unwrap_err();
	assert_eq!(err.diagnostic().code, "REMOTE_004");
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_compatible_query_never_runs_secondary() {
	let calls = Arc::new(AtomicUsize::new(0));
	let source = accounts(calls.clone());

	let mut plan = ExecutionPlan::new();
	let primary = scan(&mut plan, "accounts");
	let secondary = native(&mut plan);
	let node = plan.try_catch(primary, secondary).unwrap();

	let rows = plan.collect(node, &mut context(vec![source])).unwrap();
	assert_eq!(column(&rows, 1), vec![Some(100), Some(250)]);
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_no_fallback_after_first_row() {
	let calls = Arc::new(AtomicUsize::new(0));
	let source = accounts(calls.clone());
	source.set_incompatible(Some("late failure"));

	let mut plan = ExecutionPlan::new();
	let local = plan.constant_scan(int_schema(&["id", "balance"]), int_rows(&[&[9, 9]])).unwrap();
	let remote = scan(&mut plan, "accounts");
	let primary = plan.concatenate(&[local, remote]).unwrap();
	let secondary = native(&mut plan);
	let node = plan.try_catch(primary, secondary).unwrap();

	let mut ctx = context(vec![source]);
	plan.execute(node, &mut ctx).unwrap();
	assert!(plan.next(node, &mut ctx).unwrap().is_some());
	let err = plan.next(node, &mut ctx).unwrap_err();
	assert!(err.is_incompatible());
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_other_failures_propagate() {
	let calls = Arc::new(AtomicUsize::new(0));
	let source = accounts(calls.clone());

	let mut plan = ExecutionPlan::new();
	let primary = scan(&mut plan, "missing");
	let secondary = native(&mut plan);
	let node = plan.try_catch(primary, secondary).unwrap();

	let err = plan.collect(node, &mut context(vec![source])).unwrap_err();
	assert!(!err.is_incompatible());
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_width_mismatch_rejected() {
	let mut plan = ExecutionPlan::new();
	let primary = scan(&mut plan, "accounts");
	let secondary = plan.constant_scan(int_schema(&["id"]), vec![]).unwrap();
	assert_eq!(plan.try_catch(primary, secondary).unwrap_err().number(), 205);
}
