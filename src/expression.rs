//! # Filter Expressions
//!
//! A [`FilterExpr`] is one parsed condition: a field, an optional comparison
//! operator, and a value. Conditions are written Django-style as
//! `"field"` or `"field__operator"` keys, e.g. `title__startswith`.
//!
//! Expressions are parsed and validated against the schema when a queryset
//! is built, so a bad field name or lookup suffix fails before any SQL runs.

use crate::error::{OrmError, Result};
use crate::fields::Value;
use crate::schema::{RESERVED_NAMES, ROW_ID, Schema};

/// The supported comparison operators, as `__suffix` lookup names.
///
/// Equality and IS NULL have no suffix: a bare `field` key compares with `=`,
/// or with `IS NULL` when the value is [`Value::Null`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
	StartsWith,
	EndsWith,
	Contains,
	Gt,
	Gte,
	Lt,
	Lte,
	Ne,
}

impl FilterOperator {
	fn from_suffix(suffix: &str) -> Option<Self> {
		match suffix {
			"startswith" => Some(Self::StartsWith),
			"endswith" => Some(Self::EndsWith),
			"contains" => Some(Self::Contains),
			"gt" => Some(Self::Gt),
			"gte" => Some(Self::Gte),
			"lt" => Some(Self::Lt),
			"lte" => Some(Self::Lte),
			"ne" => Some(Self::Ne),
			_ => None,
		}
	}

	fn sql_comparison(&self) -> &'static str {
		match self {
			Self::Gt => ">",
			Self::Gte => ">=",
			Self::Lt => "<",
			Self::Lte => "<=",
			Self::Ne => "<>",
			// LIKE operators render their own fragment
			Self::StartsWith | Self::EndsWith | Self::Contains => "LIKE",
		}
	}
}

/// Escape LIKE wildcards (`%`, `_`) and the escape character itself in a
/// user-supplied value, so the value matches literally inside a pattern.
fn escape_like(raw: &str) -> String {
	let mut escaped = String::with_capacity(raw.len());
	for ch in raw.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			escaped.push('\\');
		}
		escaped.push(ch);
	}
	escaped
}

/// A single parsed condition: field, operator, value. Immutable once built.
#[derive(Debug, Clone)]
pub struct FilterExpr {
	field: String,
	operator: Option<FilterOperator>,
	value: Value,
}

impl FilterExpr {
	/// Parse a `field` or `field__operator` key.
	///
	/// Anything after the last `__` is operator position: an unrecognized
	/// trailing token fails with [`OrmError::UnsupportedLookup`].
	pub(crate) fn parse(key: &str, value: Value) -> Result<Self> {
		match key.rsplit_once("__") {
			Some((field, suffix)) => {
				let operator = FilterOperator::from_suffix(suffix)
					.ok_or_else(|| OrmError::UnsupportedLookup(suffix.to_string()))?;
				Ok(Self {
					field: field.to_string(),
					operator: Some(operator),
					value,
				})
			}
			None => Ok(Self {
				field: key.to_string(),
				operator: None,
				value,
			}),
		}
	}

	/// Parse `key`, then resolve the field against `schema`: the aliases
	/// `pk`, `id` and `rowid` rewrite to the row-identifier column, any
	/// other undeclared name fails with [`OrmError::UnknownField`].
	pub(crate) fn bind(schema: &Schema, key: &str, value: Value) -> Result<Self> {
		let mut expr = Self::parse(key, value)?;
		if RESERVED_NAMES.contains(&expr.field.as_str()) {
			expr.field = ROW_ID.to_string();
		} else if !schema.has_field(&expr.field) {
			return Err(OrmError::UnknownField(expr.field));
		}
		Ok(expr)
	}

	/// Render to a SQL fragment plus its bound parameter, if any.
	///
	/// The three substring operators escape LIKE wildcards in the value and
	/// match with SQLite's default collation, which is case-insensitive for
	/// ASCII.
	pub(crate) fn render(&self) -> (String, Option<Value>) {
		let Some(op) = self.operator else {
			return match &self.value {
				Value::Null => (format!("{} IS NULL", self.field), None),
				value => (format!("{} = ?", self.field), Some(value.clone())),
			};
		};

		match op {
			FilterOperator::StartsWith => self.like_fragment(|v| format!("{v}%")),
			FilterOperator::EndsWith => self.like_fragment(|v| format!("%{v}")),
			FilterOperator::Contains => self.like_fragment(|v| format!("%{v}%")),
			_ => (
				format!("{} {} ?", self.field, op.sql_comparison()),
				Some(self.value.clone()),
			),
		}
	}

	fn like_fragment(&self, pattern: impl FnOnce(&str) -> String) -> (String, Option<Value>) {
		let escaped = escape_like(&self.value.like_operand());
		(
			format!("{} LIKE ? ESCAPE '\\'", self.field),
			Some(Value::Text(pattern(&escaped))),
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fields::Field;
	use rstest::rstest;

	fn post_schema() -> Schema {
		Schema::builder("Post")
			.field("title", Field::text())
			.field("rating", Field::integer())
			.build()
			.unwrap()
	}

	#[test]
	fn test_bare_key_is_equality() {
		let expr = FilterExpr::parse("title", Value::from("hello")).unwrap();
		let (sql, param) = expr.render();
		assert_eq!(sql, "title = ?");
		assert_eq!(param, Some(Value::from("hello")));
	}

	#[test]
	fn test_bare_key_with_null_is_is_null() {
		let expr = FilterExpr::parse("title", Value::Null).unwrap();
		let (sql, param) = expr.render();
		assert_eq!(sql, "title IS NULL");
		assert_eq!(param, None);
	}

	#[test]
	fn test_empty_string_is_equality_not_is_null() {
		let expr = FilterExpr::parse("title", Value::from("")).unwrap();
		let (sql, param) = expr.render();
		assert_eq!(sql, "title = ?");
		assert_eq!(param, Some(Value::from("")));
	}

	#[rstest]
	#[case("rating__gt", "rating > ?")]
	#[case("rating__gte", "rating >= ?")]
	#[case("rating__lt", "rating < ?")]
	#[case("rating__lte", "rating <= ?")]
	#[case("rating__ne", "rating <> ?")]
	fn test_comparison_operators(#[case] key: &str, #[case] expected: &str) {
		let expr = FilterExpr::parse(key, Value::from(3)).unwrap();
		let (sql, param) = expr.render();
		assert_eq!(sql, expected);
		assert_eq!(param, Some(Value::Integer(3)));
	}

	#[rstest]
	#[case("title__startswith", "h", "h%")]
	#[case("title__endswith", "o", "%o")]
	#[case("title__contains", "i", "%i%")]
	fn test_like_operators(#[case] key: &str, #[case] value: &str, #[case] pattern: &str) {
		let expr = FilterExpr::parse(key, Value::from(value)).unwrap();
		let (sql, param) = expr.render();
		assert_eq!(sql, "title LIKE ? ESCAPE '\\'");
		assert_eq!(param, Some(Value::Text(pattern.to_string())));
	}

	#[test]
	fn test_like_wildcards_are_escaped() {
		let expr = FilterExpr::parse("title", Value::from("50%_off\\")).unwrap();
		// Equality does not escape; only LIKE patterns do.
		let (_, param) = expr.render();
		assert_eq!(param, Some(Value::from("50%_off\\")));

		let expr = FilterExpr::parse("title__contains", Value::from("50%_off\\")).unwrap();
		let (_, param) = expr.render();
		assert_eq!(param, Some(Value::Text("%50\\%\\_off\\\\%".to_string())));
	}

	#[test]
	fn test_unsupported_lookup_is_rejected() {
		let result = FilterExpr::parse("title__regex", Value::from("x"));
		assert!(matches!(result, Err(OrmError::UnsupportedLookup(op)) if op == "regex"));
	}

	#[test]
	fn test_split_happens_on_last_separator() {
		let result = FilterExpr::parse("a__b__gt", Value::from(1)).unwrap();
		assert_eq!(result.field, "a__b");
	}

	#[test]
	fn test_bind_rewrites_row_id_aliases() {
		let schema = post_schema();
		for alias in ["pk", "id", "rowid"] {
			let expr = FilterExpr::bind(&schema, alias, Value::from(1)).unwrap();
			assert_eq!(expr.field, "rowid");
		}
		let expr = FilterExpr::bind(&schema, "pk__gt", Value::from(1)).unwrap();
		assert_eq!(expr.field, "rowid");
	}

	#[test]
	fn test_bind_rejects_undeclared_fields() {
		let schema = post_schema();
		let result = FilterExpr::bind(&schema, "author", Value::from("x"));
		assert!(matches!(result, Err(OrmError::UnknownField(name)) if name == "author"));
	}
}
