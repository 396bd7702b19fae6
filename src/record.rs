//! # Models and Records
//!
//! A [`Model`] is the handle for one declared record type: it owns the
//! shared [`Schema`] and a clone of the [`Database`] handle, and exposes the
//! type-level API (`create`, `all`, `filter`, `exclude`, `get`).
//!
//! A [`Record`] is one in-memory instance of that type. Field values live in
//! an ordered name → [`Value`] map; a record becomes persisted only after a
//! successful [`Record::save`], which fills in its `pk` from the storage
//! engine's assigned row identifier.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::connection::Database;
use crate::error::{OrmError, Result};
use crate::fields::Value;
use crate::queryset::QuerySet;
use crate::schema::{ROW_ID, Schema};

/// Handle for a declared record type: shared schema + database handle.
///
/// # Examples
///
/// ```
/// use grappelli::{Database, Field, Model, Schema};
///
/// # fn main() -> grappelli::Result<()> {
/// let db = Database::open_in_memory()?;
/// let schema = Schema::builder("Post")
///     .field("title", Field::text())
///     .field("rating", Field::integer())
///     .build()?;
/// db.create_table(&schema)?;
/// let posts = Model::new(schema, &db);
///
/// posts.create(&[("title", "hello".into()), ("rating", 1.into())])?;
/// assert_eq!(posts.all().count()?, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Model {
	schema: Arc<Schema>,
	db: Database,
}

impl Model {
	/// Bind a schema to a database handle.
	pub fn new(schema: Schema, db: &Database) -> Self {
		Self {
			schema: Arc::new(schema),
			db: db.clone(),
		}
	}

	pub fn schema(&self) -> &Schema {
		&self.schema
	}

	pub(crate) fn database(&self) -> &Database {
		&self.db
	}

	/// A queryset over every row of this type.
	pub fn all(&self) -> QuerySet {
		QuerySet::new(self.clone())
	}

	/// A queryset restricted by one condition; see [`QuerySet::filter`].
	pub fn filter(&self, key: &str, value: impl Into<Value>) -> Result<QuerySet> {
		self.all().filter(key, value)
	}

	/// A queryset excluding rows matching one condition; see
	/// [`QuerySet::exclude`].
	pub fn exclude(&self, key: &str, value: impl Into<Value>) -> Result<QuerySet> {
		self.all().exclude(key, value)
	}

	/// Fetch the single record matching a condition; see [`QuerySet::get`].
	pub fn get(&self, key: &str, value: impl Into<Value>) -> Result<Record> {
		self.all().get(key, value)
	}

	/// Construct a record in memory without saving it.
	///
	/// Omitted fields take their declared default; a key that is not a
	/// schema field fails with [`OrmError::UnknownField`].
	pub fn new_record(&self, values: &[(&str, Value)]) -> Result<Record> {
		for (key, _) in values {
			if !self.schema.has_field(key) {
				return Err(OrmError::UnknownField(key.to_string()));
			}
		}

		let mut record_values = IndexMap::new();
		for (name, field) in self.schema.fields() {
			let value = values
				.iter()
				.find(|(key, _)| *key == name)
				.map(|(_, value)| value.clone())
				.unwrap_or_else(|| field.default().clone());
			record_values.insert(name.to_string(), value);
		}

		Ok(Record {
			model: self.clone(),
			values: record_values,
			pk: None,
		})
	}

	/// Construct and save in one step, returning the persisted record.
	pub fn create(&self, values: &[(&str, Value)]) -> Result<Record> {
		let mut record = self.new_record(values)?;
		record.save()?;
		Ok(record)
	}

	/// Materialize a record from a storage row. The row must carry the
	/// row-identifier column plus every schema field by name.
	pub(crate) fn from_row(&self, row: &rusqlite::Row<'_>) -> Result<Record> {
		let mut values = IndexMap::new();
		for name in self.schema.field_names() {
			values.insert(name.to_string(), row.get::<_, Value>(name)?);
		}
		let pk: i64 = row.get(ROW_ID)?;
		Ok(Record {
			model: self.clone(),
			values,
			pk: Some(pk),
		})
	}
}

impl fmt::Debug for Model {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Model")
			.field("table", &self.schema.table_name())
			.finish()
	}
}

/// One in-memory instance of a declared record type, optionally backed by a
/// persisted row.
#[derive(Clone)]
pub struct Record {
	model: Model,
	values: IndexMap<String, Value>,
	pk: Option<i64>,
}

impl Record {
	/// The storage row identifier, set after the first successful save.
	pub fn pk(&self) -> Option<i64> {
		self.pk
	}

	/// True iff this record is backed by a persisted row.
	pub fn is_persisted(&self) -> bool {
		self.pk.is_some()
	}

	/// The current value of a field.
	pub fn get(&self, name: &str) -> Result<&Value> {
		self.values
			.get(name)
			.ok_or_else(|| OrmError::UnknownField(name.to_string()))
	}

	/// Overwrite the value of a field. The change is in-memory until the
	/// next [`save`](Self::save).
	pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
		match self.values.get_mut(name) {
			Some(slot) => {
				*slot = value.into();
				Ok(())
			}
			None => Err(OrmError::UnknownField(name.to_string())),
		}
	}

	/// The field's text content, or `None` when null.
	pub fn text(&self, name: &str) -> Result<Option<&str>> {
		Ok(self.get(name)?.as_text())
	}

	/// The field's integer content, or `None` when null.
	pub fn integer(&self, name: &str) -> Result<Option<i64>> {
		Ok(self.get(name)?.as_integer())
	}

	/// The field's float content, or `None` when null.
	pub fn float(&self, name: &str) -> Result<Option<f64>> {
		Ok(self.get(name)?.as_float())
	}

	/// Persist this record: INSERT on first save (assigning `pk` from the
	/// new row identifier), UPDATE of all field columns afterwards.
	///
	/// Fails with [`OrmError::NullConstraint`] if a non-nullable field
	/// holds null, before any statement is issued. Exactly one statement
	/// is executed against the storage engine.
	pub fn save(&mut self) -> Result<()> {
		for (name, field) in self.model.schema().fields() {
			if !field.is_nullable() && self.values[name].is_null() {
				return Err(OrmError::NullConstraint(name.to_string()));
			}
		}

		let schema = Arc::clone(&self.model.schema);
		let params: Vec<Value> = schema
			.fields()
			.map(|(name, field)| field.encode(&self.values[name]))
			.collect();

		match self.pk {
			Some(pk) => {
				let assignments = schema
					.field_names()
					.map(|name| format!("{name} = ?"))
					.collect::<Vec<_>>()
					.join(", ");
				let sql = format!(
					"UPDATE {} SET {} WHERE {} = ?",
					schema.table_name(),
					assignments,
					ROW_ID
				);
				let mut params = params;
				params.push(Value::Integer(pk));
				self.model.database().execute(&sql, &params)?;
			}
			None => {
				let columns = schema.field_names().collect::<Vec<_>>().join(", ");
				let placeholders = vec!["?"; schema.len()].join(", ");
				let sql = format!(
					"INSERT INTO {} ({}) VALUES ({})",
					schema.table_name(),
					columns,
					placeholders
				);
				let rowid = self.model.database().insert(&sql, &params)?;
				self.pk = Some(rowid);
			}
		}
		Ok(())
	}
}

impl fmt::Debug for Record {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Record")
			.field("table", &self.model.schema().table_name())
			.field("pk", &self.pk)
			.field("values", &self.values)
			.finish()
	}
}
