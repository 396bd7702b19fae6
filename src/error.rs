//! Error taxonomy for schema declaration, record construction and querying.
//!
//! Every validation error is raised eagerly at the point of misuse (building
//! a filter expression, constructing a record, declaring a schema), never
//! deferred to query evaluation. Storage-engine failures are wrapped in
//! [`OrmError::Storage`] and propagate unchanged.

/// Errors that can occur during schema declaration, record construction
/// and query execution.
#[derive(Debug, thiserror::Error)]
pub enum OrmError {
	/// A supplied key is not a declared field on the schema
	#[error("'{0}' is not a declared field")]
	UnknownField(String),

	/// The `__suffix` of a filter key is not a supported lookup
	#[error("lookup '{0}' is not supported")]
	UnsupportedLookup(String),

	/// Save attempted with a null value in a non-nullable field
	#[error("'{0}' cannot be null")]
	NullConstraint(String),

	/// A declared field name collides with the row-identifier aliases
	#[error("'{0}' is reserved for the row identifier")]
	ReservedFieldName(String),

	/// `get` matched no rows
	#[error("no row matched the query")]
	DoesNotExist,

	/// `get` matched more than one row
	#[error("multiple rows matched the query (expected 1, got {0})")]
	MultipleObjectsReturned(usize),

	/// Pass-through failure from the storage engine
	#[error("storage error: {0}")]
	Storage(#[from] rusqlite::Error),
}

/// Crate-local result alias.
pub type Result<T> = std::result::Result<T, OrmError>;
