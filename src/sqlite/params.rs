use std::fmt::Write;

use rusqlite::types::Value;

use crate::error::SqlConduitError;
use crate::params::{DbParameter, ParameterFactory};
use crate::types::{DbType, DbValue, ParameterDirection};

// Thread-local buffer for timestamp formatting
thread_local! {
    static TIMESTAMP_BUF: std::cell::RefCell<String> = std::cell::RefCell::new(String::with_capacity(32));
}

/// Convert a `DbValue` into a rusqlite `Value`.
#[must_use]
pub fn db_value_to_sqlite_value(value: &DbValue) -> Value {
    match value {
        DbValue::Int(i) => Value::Integer(*i),
        DbValue::Float(f) => Value::Real(*f),
        DbValue::Text(s) => Value::Text(s.clone()),
        DbValue::Bool(b) => Value::Integer(i64::from(*b)),
        DbValue::Timestamp(dt) => TIMESTAMP_BUF.with(|buf| {
            let mut borrow = buf.borrow_mut();
            borrow.clear();
            // Writing into a String cannot fail.
            let _ = write!(borrow, "{}", dt.format("%F %T%.f"));
            Value::Text(borrow.clone())
        }),
        DbValue::Null => Value::Null,
        DbValue::Json(jval) => Value::Text(jval.to_string()),
        DbValue::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

/// Extract a `DbValue` from a `SQLite` row.
///
/// # Errors
/// Returns `SqlConduitError::SqliteError` if the cell cannot be read.
pub fn sqlite_extract_value(row: &rusqlite::Row<'_>, idx: usize) -> Result<DbValue, SqlConduitError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => DbValue::Null,
        Value::Integer(i) => DbValue::Int(i),
        Value::Real(f) => DbValue::Float(f),
        Value::Text(s) => DbValue::Text(s),
        Value::Blob(b) => DbValue::Blob(b),
    })
}

/// Bind `params` to every placeholder of `stmt`.
///
/// Named placeholders (`@x`, `:x`, `$x`) take the first parameter with the same bare name,
/// ignoring case. Anonymous `?` and numbered `?N` placeholders bind by position.
///
/// # Errors
/// Returns `SqlConduitError::ExecutionError` when a placeholder has no parameter, or the
/// driver's error if binding fails.
pub fn bind_parameters(
    stmt: &mut rusqlite::Statement<'_>,
    params: &[DbParameter],
) -> Result<(), SqlConduitError> {
    let bindable: Vec<&DbParameter> = params
        .iter()
        .filter(|p| p.direction != ParameterDirection::ReturnValue)
        .collect();
    for index in 1..=stmt.parameter_count() {
        let parameter = resolve_parameter(stmt.parameter_name(index), index, &bindable)?;
        stmt.raw_bind_parameter(index, db_value_to_sqlite_value(&parameter.value))?;
    }
    Ok(())
}

fn resolve_parameter<'p>(
    placeholder: Option<&str>,
    index: usize,
    params: &[&'p DbParameter],
) -> Result<&'p DbParameter, SqlConduitError> {
    let found = match placeholder {
        Some(name) if name.starts_with('?') => name[1..]
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|n| params.get(n).copied()),
        Some(name) => {
            let bare = &name[1..];
            params
                .iter()
                .copied()
                .find(|p| p.bare_name().eq_ignore_ascii_case(bare))
        }
        None => params.get(index - 1).copied(),
    };
    found.ok_or_else(|| {
        SqlConduitError::ExecutionError(format!(
            "no parameter bound for placeholder {}",
            placeholder.map_or_else(|| format!("#{index}"), str::to_string)
        ))
    })
}

/// Stores names with a sigil so they line up with `SQLite`'s own parameter names.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteParameterFactory;

impl ParameterFactory for SqliteParameterFactory {
    fn create_parameter(
        &self,
        name: &str,
        value: DbValue,
        db_type: Option<DbType>,
        direction: ParameterDirection,
    ) -> DbParameter {
        let name = if name.starts_with(['@', ':', '$']) {
            name.to_string()
        } else {
            format!("@{name}")
        };
        let db_type = db_type.or_else(|| Some(value.inferred_type()));
        DbParameter {
            name,
            value,
            db_type,
            direction,
        }
    }
}
