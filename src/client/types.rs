//! Binding statement values as SQLite parameters.

use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};

use crate::statement::Value;

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Value::Null => Ok(ToSqlOutput::Owned(rusqlite::types::Value::Null)),
            Value::Bool(b) => Ok(ToSqlOutput::Owned(rusqlite::types::Value::Integer(i64::from(*b)))),
            Value::Int(i) => Ok(ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i))),
            Value::Float(f) => Ok(ToSqlOutput::Owned(rusqlite::types::Value::Real(*f))),
            Value::Text(s) => Ok(ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes()))),
        }
    }
}

/// Decode a column value read back from SQLite.
pub fn value_from_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(s) | ValueRef::Blob(s) => Value::Text(String::from_utf8_lossy(s).into_owned()),
    }
}
