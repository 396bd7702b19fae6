//! # Record Schemas
//!
//! Per-record-type metadata: a logical table name plus an ordered mapping of
//! field name to [`Field`]. A schema is built exactly once per record type
//! through [`Schema::builder`] and is immutable afterwards.
//!
//! Declaration order is preserved (via `IndexMap`) and drives the column
//! order of INSERT statements.

use indexmap::IndexMap;

use crate::error::{OrmError, Result};
use crate::fields::Field;

/// Column name of the storage row identifier.
pub(crate) const ROW_ID: &str = "rowid";

/// Aliases that always refer to the row identifier and can never be
/// declared as field names.
pub(crate) const RESERVED_NAMES: [&str; 3] = ["pk", "id", ROW_ID];

/// Immutable per-record-type metadata: table name + ordered field definitions.
///
/// # Examples
///
/// ```
/// use grappelli::{Field, Schema};
///
/// let schema = Schema::builder("Post")
///     .field("title", Field::text())
///     .field("rating", Field::integer())
///     .build()
///     .unwrap();
///
/// assert_eq!(schema.table_name(), "post");
/// assert_eq!(schema.field_names().collect::<Vec<_>>(), ["title", "rating"]);
/// ```
#[derive(Debug, Clone)]
pub struct Schema {
	table_name: String,
	fields: IndexMap<String, Field>,
}

impl Schema {
	/// Start declaring a schema for the record type `type_name`.
	///
	/// The table name is the lowercased type name.
	pub fn builder(type_name: &str) -> SchemaBuilder {
		SchemaBuilder {
			table_name: type_name.to_lowercase(),
			fields: IndexMap::new(),
		}
	}

	pub fn table_name(&self) -> &str {
		&self.table_name
	}

	/// Declared fields, in declaration order.
	pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
		self.fields.iter().map(|(name, field)| (name.as_str(), field))
	}

	/// Declared field names, in declaration order.
	pub fn field_names(&self) -> impl Iterator<Item = &str> {
		self.fields.keys().map(String::as_str)
	}

	/// Look up a declared field.
	pub fn field(&self, name: &str) -> Option<&Field> {
		self.fields.get(name)
	}

	pub fn has_field(&self, name: &str) -> bool {
		self.fields.contains_key(name)
	}

	pub fn len(&self) -> usize {
		self.fields.len()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}
}

/// Builder for [`Schema`]; collects fields in declaration order.
#[derive(Debug)]
pub struct SchemaBuilder {
	table_name: String,
	fields: IndexMap<String, Field>,
}

impl SchemaBuilder {
	/// Declare a field. Later declarations with the same name replace
	/// earlier ones, like attribute shadowing would.
	pub fn field(mut self, name: &str, field: Field) -> Self {
		self.fields.insert(name.to_string(), field);
		self
	}

	/// Finish the schema.
	///
	/// Fails with [`OrmError::ReservedFieldName`] if any field is named
	/// `pk`, `id` or `rowid`, since those always refer to the row identifier.
	pub fn build(self) -> Result<Schema> {
		for name in self.fields.keys() {
			if RESERVED_NAMES.contains(&name.as_str()) {
				return Err(OrmError::ReservedFieldName(name.clone()));
			}
		}
		Ok(Schema {
			table_name: self.table_name,
			fields: self.fields,
		})
	}
}
