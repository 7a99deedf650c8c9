// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::cmp::Ordering;

use quarry_core::{Collation, ColumnDef, Expression, Schema, SortKey, Type, Value};
use quarry_engine::ExecutionPlan;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use uuid::Uuid;

use crate::{column, context, int_rows, int_schema};

/// Values listed in ascending order across families.
fn ascending() -> Vec<Value> {
	vec![
		Value::Null,
		Value::Boolean(false),
		Value::Boolean(true),
		Value::UniqueIdentifier(Uuid::from_bytes([0xff, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1])),
		Value::UniqueIdentifier(Uuid::from_bytes([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2])),
		Value::VarBinary(vec![1, 2]),
		Value::nvarchar("apple"),
		Value::nvarchar("Banana"),
		Value::varchar("cherry"),
		Value::Int(-5),
		Value::BigInt(3),
		Value::Int(40),
		Value::float(0.5),
	]
}

#[test]
fn test_sort_is_stable_under_random_permutations() {
	let expected = ascending();
	let schema = Schema::new(vec![ColumnDef::new("v", Type::Variant)]);
	let mut rng = StdRng::seed_from_u64(0x5eed);

	for _ in 0..20 {
		let mut shuffled = expected.clone();
		shuffled.shuffle(&mut rng);

		let mut plan = ExecutionPlan::new();
		let scan = plan.constant_scan(schema.clone(), shuffled.into_iter().map(|v| vec![v]).collect()).unwrap();
		let sort = plan.sort(scan, vec![SortKey::asc("v")], 0).unwrap();
		let rows = plan.collect(sort, &mut context(vec![])).unwrap();

		let sorted: Vec<Value> = rows.iter().map(|row| row[0].unwrap_variant().clone()).collect();
		assert_eq!(sorted, expected);
	}
}

#[test]
fn test_random_integers_sort_like_compare() {
	let mut rng = StdRng::seed_from_u64(42);
	let values: Vec<Value> = (0..200)
		.map(|_| {
			if rng.random_bool(0.1) {
				Value::Null
			} else {
				Value::Int(rng.random_range(-1000..1000))
			}
		})
		.collect();

	let mut plan = ExecutionPlan::new();
	let scan = plan.constant_scan(int_schema(&["v"]), values.iter().map(|v| vec![v.clone()]).collect()).unwrap();
	let sort = plan.sort(scan, vec![SortKey::desc("v")], 0).unwrap();
	let rows = plan.collect(sort, &mut context(vec![])).unwrap();

	let mut expected = values.clone();
	expected.sort_by(|a, b| b.compare(a, Collation::default_ref()));
	let actual: Vec<Value> = rows.iter().map(|row| row[0].clone()).collect();
	assert_eq!(actual, expected);
	assert_eq!(actual.last().map(Value::is_null), Some(values.iter().any(Value::is_null)));
}

#[test]
fn test_null_equality_differs_from_null_ordering() {
	let rows = vec![
		vec![Value::Null, Value::Null],
		vec![Value::Int(1), Value::Int(1)],
		vec![Value::Null, Value::Int(1)],
	];
	let mut plan = ExecutionPlan::new();
	let scan = plan.constant_scan(int_schema(&["a", "b"]), rows).unwrap();

	// = is unknown for NULLs
	let equal = plan.filter(scan, &Expression::equal(Expression::column("a"), Expression::column("b"))).unwrap();
	// ordering and grouping treat NULLs as equal to each other
	let sorted = plan.sort(scan, vec![SortKey::asc("a")], 0).unwrap();
	let distinct = plan.distinct(scan, &["a"]).unwrap();

	let mut ctx = context(vec![]);
	assert_eq!(column(&plan.collect(equal, &mut ctx).unwrap(), 0), vec![Some(1)]);
	assert_eq!(column(&plan.collect(sorted, &mut ctx).unwrap(), 0), vec![None, None, Some(1)]);
	assert_eq!(plan.collect(distinct, &mut ctx).unwrap().len(), 2);
	assert_eq!(Value::Null.compare(&Value::Null, Collation::default_ref()), Ordering::Equal);
}

#[test]
fn test_collation_sensitivity_round_trip() {
	let words = ["hello", "Héllo", "héllo", "Hello"];
	// (collation, distinct words, words equal to "hello")
	let cases = [
		("Latin1_General_CI_AI", 1, 4),
		("Latin1_General_CS_AS", 4, 1),
		("Latin1_General_CS_AI", 2, 2),
		("Latin1_General_CI_AS", 2, 2),
	];
	for (name, groups, matches) in cases {
		let collation = Collation::parse(name).unwrap();
		let schema = Schema::new(vec![ColumnDef::new("w", Type::NVarChar).with_collation(collation)]);
		let mut plan = ExecutionPlan::new();
		let scan = plan.constant_scan(schema, words.iter().map(|w| vec![Value::nvarchar(*w)]).collect()).unwrap();
		let distinct = plan.distinct(scan, &["w"]).unwrap();
		let equal =
			plan.filter(scan, &Expression::equal(Expression::column("w"), Expression::constant("hello"))).unwrap();

		let mut ctx = context(vec![]);
		assert_eq!(plan.collect(distinct, &mut ctx).unwrap().len(), groups, "{}", name);
		assert_eq!(plan.collect(equal, &mut ctx).unwrap().len(), matches, "{}", name);
	}
}

#[test]
fn test_presorted_sort_matches_full_sort() {
	let mut rng = StdRng::seed_from_u64(7);
	let mut rows: Vec<(i32, i32)> = (0..100).map(|_| (rng.random_range(0..5), rng.random_range(0..50))).collect();
	rows.sort_by_key(|(a, _)| *a);
	let values: Vec<Vec<Value>> = rows.iter().map(|(a, b)| vec![Value::Int(*a), Value::Int(*b)]).collect();

	let keys = vec![SortKey::asc("a"), SortKey::desc("b")];
	let mut plan = ExecutionPlan::new();
	let scan = plan.constant_scan(int_schema(&["a", "b"]), values).unwrap();
	let full = plan.sort(scan, keys.clone(), 0).unwrap();
	let partial = plan.sort(scan, keys, 1).unwrap();

	let mut ctx = context(vec![]);
	let full = plan.collect(full, &mut ctx).unwrap();
	let partial = plan.collect(partial, &mut ctx).unwrap();
	assert_eq!(full, partial);

	let a = column(&full, 0);
	let b = column(&full, 1);
	for i in 1..full.len() {
		assert!(a[i - 1] < a[i] || (a[i - 1] == a[i] && b[i - 1] >= b[i]));
	}
}

#[test]
fn test_top_and_offset_after_sort() {
	let mut plan = ExecutionPlan::new();
	let scan = plan.constant_scan(int_schema(&["n"]), int_rows(&[&[5], &[3], &[9], &[1]])).unwrap();
	let sort = plan.sort(scan, vec![SortKey::asc("n")], 0).unwrap();
	let top = plan.top(sort, 2, 1).unwrap();
	assert_eq!(column(&plan.collect(top, &mut context(vec![])).unwrap(), 0), vec![Some(3), Some(5)]);
}
