//! # Grappelli
//!
//! Django-style mini ORM for SQLite.
//!
//! Grappelli lets a caller declare record schemas as typed field
//! collections, then create, query, filter and delete persisted rows
//! through a chainable queryset instead of hand-written SQL strings:
//!
//! - **Declarative schemas**: a [`Schema`] is built once per record type
//!   from ordered [`Field`] descriptors (nullability, default, storage
//!   type); declaration order drives INSERT column order.
//! - **Records**: a [`Record`] is an in-memory instance of a schema that
//!   validates and saves itself, picking up its `pk` from the storage
//!   engine's row identifier on first save.
//! - **Lookups**: conditions are written as `field` or `field__operator`
//!   keys (`title__startswith`, `rating__gte`, ...), parsed and validated
//!   eagerly, and rendered to parameterized SQL fragments.
//! - **Lazy querysets**: a [`QuerySet`] composes include/exclude
//!   expressions into one SELECT, executes it on first access, and caches
//!   the materialized records; chaining always returns a new queryset.
//!
//! Everything is synchronous and blocking: one shared [`Database`] handle,
//! one statement per operation, SQLite's per-statement autocommit.
//!
//! ## Quick Start
//!
//! ```
//! use grappelli::{Database, Field, Model, Schema};
//!
//! # fn main() -> grappelli::Result<()> {
//! let db = Database::open_in_memory()?;
//!
//! let schema = Schema::builder("Post")
//!     .field("title", Field::text())
//!     .field("rating", Field::integer().nullable())
//!     .build()?;
//! db.create_table(&schema)?;
//! let posts = Model::new(schema, &db);
//!
//! posts.create(&[("title", "hello".into()), ("rating", 1.into())])?;
//! posts.create(&[("title", "smith".into()), ("rating", 2.into())])?;
//!
//! let hits = posts.filter("title__startswith", "h")?;
//! assert_eq!(hits.count()?, 1);
//! assert_eq!(hits.rows()?[0].text("title")?, Some("hello"));
//!
//! let post = posts.get("title", "smith")?;
//! assert_eq!(post.integer("rating")?, Some(2));
//!
//! posts.exclude("title", "smith")?.delete()?;
//! assert_eq!(posts.all().count()?, 1);
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod expression;
pub mod fields;
pub mod queryset;
pub mod record;
pub mod schema;

pub use connection::Database;
pub use error::{OrmError, Result};
pub use expression::FilterOperator;
pub use fields::{Field, StorageType, Value};
pub use queryset::QuerySet;
pub use record::{Model, Record};
pub use schema::{Schema, SchemaBuilder};

/// Prelude module for convenient imports.
pub mod prelude {
	pub use crate::connection::Database;
	pub use crate::error::{OrmError, Result};
	pub use crate::expression::FilterOperator;
	pub use crate::fields::{Field, StorageType, Value};
	pub use crate::queryset::QuerySet;
	pub use crate::record::{Model, Record};
	pub use crate::schema::{Schema, SchemaBuilder};
}
