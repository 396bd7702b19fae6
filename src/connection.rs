//! # Database Handle
//!
//! Thin synchronous wrapper around a shared `rusqlite::Connection`.
//!
//! The handle is opened once at startup and cloned into every [`Model`];
//! there is no pooling and no explicit transaction management. Each
//! statement runs under SQLite's per-statement autocommit, holding the
//! connection mutex for its duration.
//!
//! [`Model`]: crate::record::Model

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{Connection, params_from_iter};
use tracing::debug;

use crate::error::Result;
use crate::fields::Value;
use crate::schema::Schema;

/// Shared handle to the storage engine.
///
/// Cloning is cheap and every clone talks to the same connection.
#[derive(Clone)]
pub struct Database {
	conn: Arc<Mutex<Connection>>,
}

impl Database {
	/// Open (creating if necessary) a database file.
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		let conn = Connection::open(path)?;
		Ok(Self {
			conn: Arc::new(Mutex::new(conn)),
		})
	}

	/// Open a private in-memory database.
	pub fn open_in_memory() -> Result<Self> {
		let conn = Connection::open_in_memory()?;
		Ok(Self {
			conn: Arc::new(Mutex::new(conn)),
		})
	}

	/// Execute a single parameterized statement, returning the number of
	/// affected rows.
	pub fn execute(&self, sql: &str, params: &[Value]) -> Result<usize> {
		debug!(sql, params = params.len(), "execute");
		let conn = self.conn.lock();
		Ok(conn.execute(sql, params_from_iter(params.iter()))?)
	}

	/// Execute an INSERT and return the row identifier assigned to the new
	/// row. Runs under a single lock so the identifier cannot belong to a
	/// concurrent insert from another clone of this handle.
	pub(crate) fn insert(&self, sql: &str, params: &[Value]) -> Result<i64> {
		debug!(sql, params = params.len(), "insert");
		let conn = self.conn.lock();
		conn.execute(sql, params_from_iter(params.iter()))?;
		Ok(conn.last_insert_rowid())
	}

	/// Run a SELECT and map every row through `map`.
	pub(crate) fn select<T>(
		&self,
		sql: &str,
		params: &[Value],
		mut map: impl FnMut(&rusqlite::Row<'_>) -> Result<T>,
	) -> Result<Vec<T>> {
		debug!(sql, params = params.len(), "select");
		let conn = self.conn.lock();
		let mut stmt = conn.prepare(sql)?;
		let mut rows = stmt.query(params_from_iter(params.iter()))?;
		let mut out = Vec::new();
		while let Some(row) = rows.next()? {
			out.push(map(row)?);
		}
		Ok(out)
	}

	/// Create the table backing `schema`, if it does not already exist.
	///
	/// Column order follows field declaration order. The row identifier is
	/// SQLite's implicit `rowid`, so no primary-key column is declared.
	pub fn create_table(&self, schema: &Schema) -> Result<()> {
		let conn = self.conn.lock();
		let exists: bool = conn
			.query_row(
				"SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
				[schema.table_name()],
				|_| Ok(()),
			)
			.map(|_| true)
			.or_else(|err| match err {
				rusqlite::Error::QueryReturnedNoRows => Ok(false),
				other => Err(other),
			})?;
		if exists {
			debug!(table = schema.table_name(), "table already exists");
			return Ok(());
		}

		let columns = schema
			.fields()
			.map(|(name, field)| format!("{} {}", name, field.storage_type().sql_type_name()))
			.collect::<Vec<_>>()
			.join(", ");
		let sql = format!("CREATE TABLE {} ({})", schema.table_name(), columns);
		debug!(sql = %sql, "create table");
		conn.execute(&sql, [])?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fields::Field;

	fn post_schema() -> Schema {
		Schema::builder("Post")
			.field("title", Field::text())
			.field("rating", Field::integer())
			.build()
			.unwrap()
	}

	#[test]
	fn test_create_table_and_execute() {
		let db = Database::open_in_memory().unwrap();
		db.create_table(&post_schema()).unwrap();

		let affected = db
			.execute(
				"INSERT INTO post (title, rating) VALUES (?, ?)",
				&[Value::from("hello"), Value::from(1)],
			)
			.unwrap();
		assert_eq!(affected, 1);
	}

	#[test]
	fn test_create_table_is_idempotent() {
		let db = Database::open_in_memory().unwrap();
		let schema = post_schema();
		db.create_table(&schema).unwrap();
		db.create_table(&schema).unwrap();
	}

	#[test]
	fn test_insert_returns_rowid() {
		let db = Database::open_in_memory().unwrap();
		db.create_table(&post_schema()).unwrap();

		let first = db
			.insert(
				"INSERT INTO post (title, rating) VALUES (?, ?)",
				&[Value::from("a"), Value::from(1)],
			)
			.unwrap();
		let second = db
			.insert(
				"INSERT INTO post (title, rating) VALUES (?, ?)",
				&[Value::from("b"), Value::from(2)],
			)
			.unwrap();
		assert!(second > first);
	}

	#[test]
	fn test_select_maps_rows() {
		let db = Database::open_in_memory().unwrap();
		db.create_table(&post_schema()).unwrap();
		db.execute(
			"INSERT INTO post (title, rating) VALUES (?, ?)",
			&[Value::from("hello"), Value::from(1)],
		)
		.unwrap();

		let titles = db
			.select("SELECT title FROM post", &[], |row| {
				Ok(row.get::<_, String>(0)?)
			})
			.unwrap();
		assert_eq!(titles, ["hello"]);
	}

	#[test]
	fn test_storage_error_propagates() {
		let db = Database::open_in_memory().unwrap();
		let result = db.execute("SELECT * FROM missing", &[]);
		assert!(matches!(result, Err(crate::OrmError::Storage(_))));
	}
}
