//! # QuerySets
//!
//! The lazy query engine. A [`QuerySet`] accumulates include- and
//! exclude-expressions, compiles them into a single SELECT on first access,
//! and caches the materialized records for its lifetime.
//!
//! Chaining (`filter`, `exclude`) never mutates: each call validates its
//! condition against the schema immediately and returns a new, unevaluated
//! queryset with the expression list extended. Because the materialized
//! cache is per-instance and set at most once, chained querysets share no
//! mutable query state.

use std::fmt;

use once_cell::unsync::OnceCell;
use tracing::debug;

use crate::error::{OrmError, Result};
use crate::expression::FilterExpr;
use crate::fields::Value;
use crate::record::{Model, Record};
use crate::schema::ROW_ID;

/// A lazily evaluated, chainable collection of records defined by
/// include/exclude expression lists.
///
/// Includes are AND-combined; excludes are OR-combined inside a single
/// negated group: `WHERE a AND b AND NOT (c OR d)`.
pub struct QuerySet {
	model: Model,
	includes: Vec<FilterExpr>,
	excludes: Vec<FilterExpr>,
	cache: OnceCell<Vec<Record>>,
}

impl QuerySet {
	pub(crate) fn new(model: Model) -> Self {
		Self {
			model,
			includes: Vec::new(),
			excludes: Vec::new(),
			cache: OnceCell::new(),
		}
	}

	fn extended(&self, include: Option<FilterExpr>, exclude: Option<FilterExpr>) -> Self {
		let mut includes = self.includes.clone();
		let mut excludes = self.excludes.clone();
		includes.extend(include);
		excludes.extend(exclude);
		Self {
			model: self.model.clone(),
			includes,
			excludes,
			cache: OnceCell::new(),
		}
	}

	/// Narrow to rows matching `key = value` (or a `field__operator`
	/// lookup). Returns a new, unevaluated queryset.
	///
	/// The field name is validated against the schema here, before any SQL
	/// is compiled or executed.
	pub fn filter(&self, key: &str, value: impl Into<Value>) -> Result<Self> {
		let expr = FilterExpr::bind(self.model.schema(), key, value.into())?;
		Ok(self.extended(Some(expr), None))
	}

	/// Drop rows matching the condition. Multiple excludes accumulate into
	/// one OR-combined, negated group.
	pub fn exclude(&self, key: &str, value: impl Into<Value>) -> Result<Self> {
		let expr = FilterExpr::bind(self.model.schema(), key, value.into())?;
		Ok(self.extended(None, Some(expr)))
	}

	/// Compile the WHERE clause (leading space included) and its bound
	/// parameters, includes first, then excludes.
	fn build_where(&self) -> (String, Vec<Value>) {
		if self.includes.is_empty() && self.excludes.is_empty() {
			return (String::new(), Vec::new());
		}

		let mut params = Vec::new();
		let mut collect = |exprs: &[FilterExpr]| -> Vec<String> {
			exprs
				.iter()
				.map(|expr| {
					let (sql, param) = expr.render();
					params.extend(param);
					sql
				})
				.collect()
		};
		let include_fragments = collect(&self.includes);
		let exclude_fragments = collect(&self.excludes);

		let mut clause = String::from(" WHERE ");
		clause.push_str(&include_fragments.join(" AND "));
		if !include_fragments.is_empty() && !exclude_fragments.is_empty() {
			clause.push_str(" AND ");
		}
		if !exclude_fragments.is_empty() {
			clause.push_str(&format!("NOT ({})", exclude_fragments.join(" OR ")));
		}
		(clause, params)
	}

	fn fetch_all(&self) -> Result<Vec<Record>> {
		let (where_clause, params) = self.build_where();
		let sql = format!(
			"SELECT {}, * FROM {}{}",
			ROW_ID,
			self.model.schema().table_name(),
			where_clause
		);
		debug!(sql = %sql, "evaluating queryset");
		self.model
			.database()
			.select(&sql, &params, |row| self.model.from_row(row))
	}

	/// Materialize (on first call) and return the records.
	///
	/// Evaluation happens exactly once per queryset instance; later calls
	/// return the cached rows even if the table has changed since.
	pub fn rows(&self) -> Result<&[Record]> {
		let records = self.cache.get_or_try_init(|| self.fetch_all())?;
		Ok(records.as_slice())
	}

	/// Iterate over the materialized records.
	pub fn iter(&self) -> Result<std::slice::Iter<'_, Record>> {
		Ok(self.rows()?.iter())
	}

	/// Number of matching rows (materializes if needed).
	pub fn count(&self) -> Result<usize> {
		Ok(self.rows()?.len())
	}

	/// Narrow by one more condition and require exactly one match.
	pub fn get(&self, key: &str, value: impl Into<Value>) -> Result<Record> {
		self.filter(key, value)?.one()
	}

	/// Require exactly one match: zero rows fail with
	/// [`OrmError::DoesNotExist`], several with
	/// [`OrmError::MultipleObjectsReturned`].
	pub fn one(&self) -> Result<Record> {
		let rows = self.rows()?;
		match rows.len() {
			0 => Err(OrmError::DoesNotExist),
			1 => Ok(rows[0].clone()),
			n => Err(OrmError::MultipleObjectsReturned(n)),
		}
	}

	/// Delete every matching row directly, bypassing the cache: the same
	/// WHERE clause is compiled into a DELETE and executed immediately.
	/// Returns the number of deleted rows.
	pub fn delete(&self) -> Result<usize> {
		let (where_clause, params) = self.build_where();
		let sql = format!(
			"DELETE FROM {}{}",
			self.model.schema().table_name(),
			where_clause
		);
		debug!(sql = %sql, "deleting queryset");
		self.model.database().execute(&sql, &params)
	}
}

impl fmt::Debug for QuerySet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("QuerySet")
			.field("table", &self.model.schema().table_name())
			.field("includes", &self.includes.len())
			.field("excludes", &self.excludes.len())
			.field("evaluated", &self.cache.get().is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::connection::Database;
	use crate::fields::Field;
	use crate::schema::Schema;

	fn posts() -> Model {
		let db = Database::open_in_memory().unwrap();
		let schema = Schema::builder("Post")
			.field("title", Field::text())
			.field("rating", Field::integer())
			.build()
			.unwrap();
		db.create_table(&schema).unwrap();
		Model::new(schema, &db)
	}

	fn seeded() -> Model {
		let posts = posts();
		for (title, rating) in [("hello", 1), ("smith", 2), ("mia mia", 3), ("zzz zzz", 4)] {
			posts
				.create(&[("title", title.into()), ("rating", rating.into())])
				.unwrap();
		}
		posts
	}

	#[test]
	fn test_no_expressions_means_no_where_clause() {
		let posts = posts();
		let (clause, params) = posts.all().build_where();
		assert_eq!(clause, "");
		assert!(params.is_empty());
	}

	#[test]
	fn test_includes_are_and_joined() {
		let posts = posts();
		let qs = posts
			.filter("title", "hello")
			.unwrap()
			.filter("rating__gt", 1)
			.unwrap();
		let (clause, params) = qs.build_where();
		assert_eq!(clause, " WHERE title = ? AND rating > ?");
		assert_eq!(params, vec![Value::from("hello"), Value::from(1)]);
	}

	#[test]
	fn test_excludes_are_or_joined_and_negated() {
		let posts = posts();
		let qs = posts
			.filter("rating__gt", 0)
			.unwrap()
			.exclude("title", "zzz zzz")
			.unwrap()
			.exclude("title__startswith", "m")
			.unwrap();
		let (clause, params) = qs.build_where();
		assert_eq!(
			clause,
			" WHERE rating > ? AND NOT (title = ? OR title LIKE ? ESCAPE '\\')"
		);
		// Positional order: includes first, then excludes.
		assert_eq!(
			params,
			vec![
				Value::from(0),
				Value::from("zzz zzz"),
				Value::Text("m%".to_string())
			]
		);
	}

	#[test]
	fn test_only_excludes_still_produce_where() {
		let posts = posts();
		let qs = posts.exclude("title__contains", "z").unwrap();
		let (clause, _) = qs.build_where();
		assert_eq!(clause, " WHERE NOT (title LIKE ? ESCAPE '\\')");
	}

	#[test]
	fn test_is_null_fragment_binds_no_parameter() {
		let posts = posts();
		let qs = posts
			.filter("title", Value::Null)
			.unwrap()
			.filter("rating", 1)
			.unwrap();
		let (clause, params) = qs.build_where();
		assert_eq!(clause, " WHERE title IS NULL AND rating = ?");
		assert_eq!(params, vec![Value::from(1)]);
	}

	#[test]
	fn test_filter_does_not_mutate_parent() {
		let posts = seeded();
		let parent = posts.all();
		let child = parent.filter("title", "hello").unwrap();
		assert_eq!(parent.includes.len(), 0);
		assert_eq!(child.includes.len(), 1);
		assert_eq!(parent.count().unwrap(), 4);
		assert_eq!(child.count().unwrap(), 1);
	}

	#[test]
	fn test_unknown_filter_field_fails_before_evaluation() {
		let posts = posts();
		let result = posts.all().filter("author", "x");
		assert!(matches!(result, Err(OrmError::UnknownField(name)) if name == "author"));
	}

	#[test]
	fn test_cache_is_single_shot() {
		let posts = seeded();
		let qs = posts.all();
		assert_eq!(qs.count().unwrap(), 4);

		posts
			.create(&[("title", "late".into()), ("rating", 5.into())])
			.unwrap();

		// Same instance keeps its materialized rows; a fresh one re-queries.
		assert_eq!(qs.count().unwrap(), 4);
		assert_eq!(posts.all().count().unwrap(), 5);
	}

	#[test]
	fn test_delete_bypasses_cache() {
		let posts = seeded();
		let qs = posts.filter("title__contains", "z").unwrap();
		let deleted = qs.delete().unwrap();
		assert_eq!(deleted, 1);
		assert_eq!(posts.all().count().unwrap(), 3);
		// The deleting queryset never materialized anything.
		assert!(qs.cache.get().is_none());
	}

	#[test]
	fn test_rows_are_ordered_and_indexable() {
		let posts = seeded();
		let qs = posts.all();
		let rows = qs.rows().unwrap();
		assert_eq!(rows[0].text("title").unwrap(), Some("hello"));
		assert_eq!(rows[3].text("title").unwrap(), Some("zzz zzz"));
		assert_eq!(qs.iter().unwrap().count(), 4);
	}
}
