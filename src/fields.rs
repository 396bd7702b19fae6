//! # Field System
//!
//! Typed attribute descriptors for record schemas, and the [`Value`] variant
//! type that record fields and bound query parameters are expressed in.
//!
//! A [`Field`] carries nullability, a default, and a storage type. Encoding
//! never enforces nullability: a null value encodes to the storage engine's
//! null regardless, and the constraint is checked at save time instead.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

/// A storage value: everything a record field or bound parameter can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Text(String),
	Integer(i64),
	Float(f64),
	Null,
}

impl Value {
	/// Whether this is the null value.
	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	/// Borrow the text content, if any.
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Value::Text(s) => Some(s),
			_ => None,
		}
	}

	/// The integer content, if any.
	pub fn as_integer(&self) -> Option<i64> {
		match self {
			Value::Integer(i) => Some(*i),
			_ => None,
		}
	}

	/// The float content, if any.
	pub fn as_float(&self) -> Option<f64> {
		match self {
			Value::Float(f) => Some(*f),
			_ => None,
		}
	}

	/// Render the value as the text operand of a LIKE pattern.
	pub(crate) fn like_operand(&self) -> String {
		match self {
			Value::Text(s) => s.clone(),
			Value::Integer(i) => i.to_string(),
			Value::Float(f) => f.to_string(),
			Value::Null => String::new(),
		}
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Value::Text(s.to_string())
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Value::Text(s)
	}
}

impl From<i64> for Value {
	fn from(i: i64) -> Self {
		Value::Integer(i)
	}
}

impl From<i32> for Value {
	fn from(i: i32) -> Self {
		Value::Integer(i as i64)
	}
}

impl From<f64> for Value {
	fn from(f: f64) -> Self {
		Value::Float(f)
	}
}

impl<T> From<Option<T>> for Value
where
	T: Into<Value>,
{
	fn from(opt: Option<T>) -> Self {
		match opt {
			Some(v) => v.into(),
			None => Value::Null,
		}
	}
}

impl ToSql for Value {
	fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
		Ok(match self {
			Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
			Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
			Value::Float(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
			Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
		})
	}
}

impl FromSql for Value {
	fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
		match value {
			ValueRef::Null => Ok(Value::Null),
			ValueRef::Integer(i) => Ok(Value::Integer(i)),
			ValueRef::Real(f) => Ok(Value::Float(f)),
			ValueRef::Text(bytes) => {
				let s = std::str::from_utf8(bytes).map_err(|e| FromSqlError::Other(Box::new(e)))?;
				Ok(Value::Text(s.to_string()))
			}
			ValueRef::Blob(_) => Err(FromSqlError::InvalidType),
		}
	}
}

/// SQLite column affinity for a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
	Text,
	Integer,
	Float,
}

impl StorageType {
	/// The DDL type name used in `CREATE TABLE`.
	pub fn sql_type_name(&self) -> &'static str {
		match self {
			StorageType::Text => "TEXT",
			StorageType::Integer => "INTEGER",
			StorageType::Float => "REAL",
		}
	}
}

/// A typed attribute descriptor: storage type, nullability and default.
///
/// # Examples
///
/// ```
/// use grappelli::{Field, Value};
///
/// let title = Field::text();
/// assert!(!title.is_nullable());
///
/// let rating = Field::integer().nullable().default_value(0);
/// assert!(rating.is_nullable());
/// assert_eq!(rating.default(), &Value::Integer(0));
/// ```
#[derive(Debug, Clone)]
pub struct Field {
	storage_type: StorageType,
	nullable: bool,
	default: Value,
}

impl Field {
	fn new(storage_type: StorageType) -> Self {
		Self {
			storage_type,
			nullable: false,
			default: Value::Null,
		}
	}

	/// A non-nullable TEXT field with no default.
	pub fn text() -> Self {
		Self::new(StorageType::Text)
	}

	/// A non-nullable INTEGER field with no default.
	pub fn integer() -> Self {
		Self::new(StorageType::Integer)
	}

	/// A non-nullable REAL field with no default.
	pub fn float() -> Self {
		Self::new(StorageType::Float)
	}

	/// Allow null values in this field.
	pub fn nullable(mut self) -> Self {
		self.nullable = true;
		self
	}

	/// Set the value used when a record is constructed without this field.
	pub fn default_value(mut self, value: impl Into<Value>) -> Self {
		self.default = value.into();
		self
	}

	pub fn storage_type(&self) -> StorageType {
		self.storage_type
	}

	pub fn is_nullable(&self) -> bool {
		self.nullable
	}

	pub fn default(&self) -> &Value {
		&self.default
	}

	/// Encode a value for storage.
	///
	/// Null passes through unchanged even for non-nullable fields; the null
	/// constraint is enforced by `Record::save`, not here.
	pub fn encode(&self, value: &Value) -> Value {
		value.clone()
	}
}
