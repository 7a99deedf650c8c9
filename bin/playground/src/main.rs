// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

#![cfg_attr(not(debug_assertions), deny(warnings))]

use std::sync::Arc;

use quarry_core::{
	ColumnDef, ConditionOperator, ConditionValue, DataSources, ExecutionOptions, Expression, JoinType, RemoteCondition,
	RemoteQuery, SortKey, Type, Value,
	expression::{AggregateCall, AggregateFunction, BinaryOp},
};
use quarry_engine::{
	AggregateSpec, Batch, CursorKind, ExecutionPlan, FetchDirection, RecursiveCteBuilder, RecursiveJoin, Session,
	Statement,
};
use quarry_testing::{Entity, MemoryDataSource};
use quarry_type::params;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn store() -> Arc<MemoryDataSource> {
	let employees = [
		(1, None, "Ada"),
		(2, Some(1), "Grace"),
		(3, Some(1), "Linus"),
		(4, Some(2), "Ken"),
		(5, Some(4), "Barbara"),
	]
	.into_iter()
	.map(|(id, manager, name): (i32, Option<i32>, &str)| {
		vec![Value::Int(id), manager.map(Value::Int).unwrap_or(Value::Null), Value::nvarchar(name)]
	})
	.collect();
	let orders = [(1, 2, 120), (2, 2, 80), (3, 4, 45), (4, 5, 300), (5, 3, 60)]
		.into_iter()
		.map(|(id, employee, amount): (i32, i32, i32)| vec![Value::Int(id), Value::Int(employee), Value::Int(amount)])
		.collect();
	Arc::new(
		MemoryDataSource::new("crm")
			.with_page_size(2)
			.with_entity("employees", Entity::new(&["id", "manager", "name"]).with_key("id").with_rows(employees))
			.with_entity("orders", Entity::new(&["id", "employee", "amount"]).with_key("id").with_rows(orders)),
	)
}

fn employee_columns() -> Vec<ColumnDef> {
	vec![ColumnDef::new("id", Type::Int), ColumnDef::new("manager", Type::Int), ColumnDef::new("name", Type::NVarChar)]
}

fn employee_query() -> RemoteQuery {
	RemoteQuery::new("employees", vec!["id".to_string(), "manager".to_string(), "name".to_string()])
}

/// WITH org AS (anchor: Ada; member: reports of the previous level) SELECT *
fn organisation(plan: &mut ExecutionPlan) -> quarry_engine::Result<quarry_engine::NodeId> {
	let seek_query = employee_query().with_condition(RemoteCondition::new(
		"manager",
		ConditionOperator::Equal,
		ConditionValue::Parameter("@manager".to_string()),
	));
	let seek_input = plan.remote_scan("crm", seek_query, employee_columns(), Some("id"))?;
	let full_input = plan.remote_scan("crm", employee_query(), employee_columns(), Some("id"))?;

	let anchor_query = employee_query().with_condition(RemoteCondition::is_null("manager"));
	let anchor = plan.remote_scan("crm", anchor_query, employee_columns(), Some("id"))?;
	let cte = RecursiveCteBuilder::new("org", anchor)
		.columns(vec![
			Expression::column("employees.id"),
			Expression::column("employees.manager"),
			Expression::column("employees.name"),
		])
		.join(RecursiveJoin {
			seek_input,
			full_input,
			join_type: JoinType::Inner,
			cte_column: "id".to_string(),
			source_column: "manager".to_string(),
			parameter: "@manager".to_string(),
		})
		.build(plan)?;
	cte.reference(plan)
}

/// SELECT employee, SUM(amount) FROM orders WHERE amount >= @min GROUP BY employee
fn sales(plan: &mut ExecutionPlan) -> quarry_engine::Result<quarry_engine::NodeId> {
	plan.declare_parameter("@min", Type::Int);
	let query = RemoteQuery::new("orders", vec!["employee".to_string(), "amount".to_string()])
		.with_order(SortKey::asc("employee"));
	let orders = plan.remote_scan(
		"crm",
		query,
		vec![ColumnDef::new("employee", Type::Int), ColumnDef::new("amount", Type::Int)],
		None,
	)?;
	let predicate = Expression::binary(
		BinaryOp::GreaterOrEqual,
		Expression::column("orders.amount"),
		Expression::parameter("@min"),
	);
	let orders = plan.filter(orders, &predicate)?;
	plan.aggregate(
		orders,
		AggregateSpec::new()
			.group_by("orders.employee")
			.aggregate("total", AggregateCall::new(AggregateFunction::Sum, Expression::column("orders.amount"))),
	)
}

fn main() -> quarry_engine::Result<()> {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.try_init();

	let source = store();
	let mut session = Session::new(DataSources::new().with(source.clone()))
		.with_options(ExecutionOptions::new().max_recursion(10));

	let mut org = ExecutionPlan::new();
	let org_root = organisation(&mut org)?;
	let mut totals = ExecutionPlan::new();
	let totals_root = sales(&mut totals)?;
	let batch = Batch::new().with(Statement::query(org, org_root)).with(Statement::query(totals, totals_root));

	let mut reader = session.execute_reader(&batch, params! { min: 50 })?;
	while reader.read()? {
		let name: String = reader.get(2)?;
		let manager: Option<i32> = reader.get(1)?;
		info!(id = reader.get::<i32>(0)?, ?manager, %name, "organisation");
	}
	reader.next_result()?;
	while reader.read()? {
		info!(employee = reader.get::<i32>(0)?, total = reader.get::<i64>(1)?, "sales");
	}
	reader.close()?;

	let mut cursor = ExecutionPlan::new();
	let newest_first = employee_query().with_order(SortKey::desc("id"));
	let cursor_root = cursor.remote_scan("crm", newest_first, employee_columns(), Some("id"))?;
	let scroll = Batch::new()
		.with(Statement::declare_cursor("newest", CursorKind::Static, cursor, cursor_root))
		.with(Statement::OpenCursor("newest".to_string()))
		.with(Statement::fetch("newest", FetchDirection::Absolute(2)))
		.with(Statement::CloseCursor("newest".to_string()))
		.with(Statement::DeallocateCursor("newest".to_string()));
	let second_newest = session.execute_scalar(&scroll, ())?;
	info!(id = %second_newest, "second newest employee");

	info!(pages = source.fetches().len(), "pages fetched from the store");
	Ok(())
}
