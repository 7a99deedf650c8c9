// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use indexmap::IndexMap;
use quarry_type::{
	Collation, Result, Type,
	error::diagnostic::query::{ambiguous_column, column_not_found},
	return_error,
};
use xxhash_rust::xxh3::Xxh3;

use crate::sort::{ResolvedSortKey, SortKey};

/// Output column of an operator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnDef {
	pub name: String,
	/// Table alias the column belongs to, if any.
	pub qualifier: Option<String>,
	pub ty: Type,
	pub nullable: bool,
	/// Produced by an expression rather than read from a source.
	pub computed: bool,
	/// Set for character columns; the default collation applies otherwise.
	pub collation: Option<Collation>,
}

impl ColumnDef {
	pub fn new(name: impl Into<String>, ty: Type) -> Self {
		Self {
			name: name.into(),
			qualifier: None,
			ty,
			nullable: true,
			computed: false,
			collation: ty.is_character().then(Collation::default),
		}
	}

	pub fn qualified(qualifier: impl Into<String>, name: impl Into<String>, ty: Type) -> Self {
		Self::new(name, ty).with_qualifier(qualifier)
	}

	pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
		self.qualifier = Some(qualifier.into());
		self
	}

	pub fn with_collation(mut self, collation: Collation) -> Self {
		self.collation = Some(collation);
		self
	}

	pub fn not_null(mut self) -> Self {
		self.nullable = false;
		self
	}

	pub fn as_computed(mut self) -> Self {
		self.computed = true;
		self
	}

	/// `alias.name` for qualified columns, the bare name otherwise.
	pub fn full_name(&self) -> String {
		match &self.qualifier {
			Some(qualifier) => format!("{}.{}", qualifier, self.name),
			None => self.name.clone(),
		}
	}

	pub fn collation(&self) -> &Collation {
		self.collation.as_ref().unwrap_or(Collation::default_ref())
	}
}

/// Output contract of an operator: ordered columns, the keys the rows are
/// known to be sorted by and the primary key column of each contributing
/// table alias.
///
/// Column names resolve case-insensitively, either bare or qualified with
/// the table alias.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
	columns: Vec<ColumnDef>,
	by_name: IndexMap<String, Vec<usize>>,
	sorted_by: Vec<SortKey>,
	primary_keys: IndexMap<String, String>,
}

impl Schema {
	pub fn new(columns: Vec<ColumnDef>) -> Self {
		let mut by_name: IndexMap<String, Vec<usize>> = IndexMap::new();
		for (ordinal, column) in columns.iter().enumerate() {
			by_name.entry(column.name.to_lowercase()).or_default().push(ordinal);
		}
		Self {
			columns,
			by_name,
			sorted_by: vec![],
			primary_keys: IndexMap::new(),
		}
	}

	pub fn empty() -> Self {
		Self::default()
	}

	pub fn with_sorted_by(mut self, keys: Vec<SortKey>) -> Self {
		self.sorted_by = keys;
		self
	}

	pub fn with_primary_key(mut self, alias: impl Into<String>, column: impl Into<String>) -> Self {
		self.primary_keys.insert(alias.into().to_lowercase(), column.into());
		self
	}

	pub fn columns(&self) -> &[ColumnDef] {
		&self.columns
	}

	pub fn column(&self, ordinal: usize) -> Option<&ColumnDef> {
		self.columns.get(ordinal)
	}

	pub fn len(&self) -> usize {
		self.columns.len()
	}

	pub fn is_empty(&self) -> bool {
		self.columns.is_empty()
	}

	pub fn sorted_by(&self) -> &[SortKey] {
		&self.sorted_by
	}

	pub fn primary_key(&self, alias: &str) -> Option<&str> {
		self.primary_keys.get(&alias.to_lowercase()).map(String::as_str)
	}

	pub fn primary_keys(&self) -> impl Iterator<Item = (&str, &str)> {
		self.primary_keys.iter().map(|(alias, column)| (alias.as_str(), column.as_str()))
	}

	/// Ordinal of a column, failing with SQL 207 when unknown and SQL 209
	/// when a bare name matches columns of more than one table.
	pub fn resolve(&self, name: &str) -> Result<usize> {
		let unquoted = unquote(name);
		let lower = unquoted.to_lowercase();

		let candidates: Vec<usize> = match lower.rsplit_once('.') {
			Some((qualifier, column)) => {
				let qualifier = unquote(qualifier);
				let column = unquote(column);
				self.by_name
					.get(column)
					.map(|ordinals| {
						ordinals.iter()
							.copied()
							.filter(|&i| {
								self.columns[i].qualifier.as_deref().is_some_and(
									|q| q.eq_ignore_ascii_case(qualifier),
								)
							})
							.collect()
					})
					.unwrap_or_default()
			}
			None => self.by_name.get(lower.as_str()).cloned().unwrap_or_default(),
		};

		match candidates.as_slice() {
			[] => return_error!(column_not_found(name)),
			[ordinal] => Ok(*ordinal),
			_ => return_error!(ambiguous_column(name)),
		}
	}

	pub fn find(&self, name: &str) -> Option<usize> {
		self.resolve(name).ok()
	}

	pub fn resolve_sort_keys(&self, keys: &[SortKey]) -> Result<Vec<ResolvedSortKey>> {
		keys.iter()
			.map(|key| {
				let ordinal = self.resolve(&key.column)?;
				Ok(ResolvedSortKey {
					ordinal,
					direction: key.direction,
					collation: self.columns[ordinal].collation().clone(),
				})
			})
			.collect()
	}

	pub fn collations(&self) -> Vec<Collation> {
		self.columns.iter().map(|c| c.collation().clone()).collect()
	}

	/// Schema of `self` followed by `other`. Sides that may be padded with
	/// NULLs by an outer join become nullable.
	pub fn join(&self, other: &Schema, left_nullable: bool, right_nullable: bool) -> Schema {
		let left = self.columns.iter().cloned().map(|mut c| {
			c.nullable |= left_nullable;
			c
		});
		let right = other.columns.iter().cloned().map(|mut c| {
			c.nullable |= right_nullable;
			c
		});
		let mut schema = Schema::new(left.chain(right).collect());
		schema.primary_keys = self.primary_keys.clone();
		for (alias, column) in &other.primary_keys {
			schema.primary_keys.entry(alias.clone()).or_insert_with(|| column.clone());
		}
		schema
	}

	/// Schema with `column` appended.
	pub fn with_column(&self, column: ColumnDef) -> Schema {
		let mut columns = self.columns.clone();
		columns.push(column);
		let mut schema = Schema::new(columns);
		schema.sorted_by = self.sorted_by.clone();
		schema.primary_keys = self.primary_keys.clone();
		schema
	}

	/// Schema made of the given columns. Sort keys and primary keys survive
	/// as long as the columns they name still resolve.
	pub fn project(&self, columns: Vec<ColumnDef>) -> Schema {
		let mut schema = Schema::new(columns);
		let sorted: Vec<SortKey> =
			self.sorted_by.iter().take_while(|key| schema.find(&key.column).is_some()).cloned().collect();
		schema.sorted_by = sorted;
		schema.primary_keys = self
			.primary_keys
			.iter()
			.filter(|(_, column)| schema.find(column).is_some())
			.map(|(alias, column)| (alias.clone(), column.clone()))
			.collect();
		schema
	}

	/// Stable hash of the column names, types and collations; two schemas
	/// with equal fingerprints compile expressions identically.
	pub fn fingerprint(&self) -> u64 {
		let mut hasher = Xxh3::new();
		for column in &self.columns {
			hasher.update(column.qualifier.as_deref().unwrap_or("").to_lowercase().as_bytes());
			hasher.update(b".");
			hasher.update(column.name.to_lowercase().as_bytes());
			hasher.update(b":");
			hasher.update(column.ty.to_string().as_bytes());
			hasher.update(b":");
			hasher.update(column.collation().name().as_bytes());
			hasher.update(&[column.nullable as u8, 0xff]);
		}
		hasher.digest()
	}
}

fn unquote(name: &str) -> &str {
	let name = name.trim();
	name.strip_prefix('[')
		.and_then(|n| n.strip_suffix(']'))
		.or_else(|| name.strip_prefix('"').and_then(|n| n.strip_suffix('"')))
		.unwrap_or(name)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn schema() -> Schema {
		Schema::new(vec![
			ColumnDef::qualified("a", "id", Type::Int),
			ColumnDef::qualified("a", "name", Type::NVarChar),
			ColumnDef::qualified("b", "id", Type::Int),
			ColumnDef::new("total", Type::BigInt).as_computed(),
		])
	}

	#[test]
	fn test_resolve_is_case_insensitive() {
		let schema = schema();
		assert_eq!(schema.resolve("NAME").unwrap(), 1);
		assert_eq!(schema.resolve("A.Name").unwrap(), 1);
		assert_eq!(schema.resolve("[total]").unwrap(), 3);
	}

	#[test]
	fn test_qualified_lookup_disambiguates() {
		let schema = schema();
		assert_eq!(schema.resolve("a.id").unwrap(), 0);
		assert_eq!(schema.resolve("b.id").unwrap(), 2);
	}

	#[test]
	fn test_ambiguous_column() {
		let err = schema().resolve("id").unwrap_err();
		assert_eq!(err.number(), 209);
	}

	#[test]
	fn test_unknown_column() {
		let err = schema().resolve("missing").unwrap_err();
		assert_eq!(err.number(), 207);
		let err = schema().resolve("c.id").unwrap_err();
		assert_eq!(err.number(), 207);
	}

	#[test]
	fn test_character_columns_carry_collation() {
		let schema = schema();
		assert!(schema.column(1).unwrap().collation.is_some());
		assert!(schema.column(0).unwrap().collation.is_none());
	}

	#[test]
	fn test_join_marks_outer_side_nullable() {
		let left = Schema::new(vec![ColumnDef::new("x", Type::Int).not_null()]).with_primary_key("l", "x");
		let right = Schema::new(vec![ColumnDef::new("y", Type::Int).not_null()]);
		let joined = left.join(&right, false, true);
		assert!(!joined.column(0).unwrap().nullable);
		assert!(joined.column(1).unwrap().nullable);
		assert_eq!(joined.primary_key("L"), Some("x"));
	}

	#[test]
	fn test_project_keeps_resolvable_sort_keys() {
		let schema = Schema::new(vec![ColumnDef::new("x", Type::Int), ColumnDef::new("y", Type::Int)])
			.with_sorted_by(vec![SortKey::asc("x"), SortKey::asc("y")]);
		let projected = schema.project(vec![ColumnDef::new("x", Type::Int)]);
		assert_eq!(projected.sorted_by(), &[SortKey::asc("x")]);
	}

	#[test]
	fn test_fingerprint_tracks_types() {
		let a = Schema::new(vec![ColumnDef::new("x", Type::Int)]);
		let b = Schema::new(vec![ColumnDef::new("X", Type::Int)]);
		let c = Schema::new(vec![ColumnDef::new("x", Type::BigInt)]);
		assert_eq!(a.fingerprint(), b.fingerprint());
		assert_ne!(a.fingerprint(), c.fingerprint());
	}
}
