use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::error::SqlConduitError;
use crate::provider::DataReader;
use crate::types::DbValue;

/// Conversion from a stored cell into a caller-requested type.
///
/// `zero_value` is what a NULL cell reads as, so typed access never faults on NULL.
pub trait FromDbValue: Sized {
    fn zero_value() -> Self;

    /// # Errors
    /// Returns `SqlConduitError::TypeMismatch` if the value cannot be coerced.
    fn from_db_value(value: &DbValue) -> Result<Self, SqlConduitError>;

    /// NULL-aware conversion used by row accessors.
    ///
    /// # Errors
    /// Returns `SqlConduitError::TypeMismatch` if a non-NULL value cannot be coerced.
    fn from_nullable(value: &DbValue) -> Result<Self, SqlConduitError> {
        if value.is_null() {
            Ok(Self::zero_value())
        } else {
            Self::from_db_value(value)
        }
    }
}

fn mismatch(expected: &'static str, value: &DbValue) -> SqlConduitError {
    SqlConduitError::TypeMismatch {
        expected,
        found: value.type_name(),
    }
}

impl FromDbValue for i64 {
    fn zero_value() -> Self {
        0
    }

    fn from_db_value(value: &DbValue) -> Result<Self, SqlConduitError> {
        value.as_int().ok_or_else(|| mismatch("i64", value))
    }
}

impl FromDbValue for i32 {
    fn zero_value() -> Self {
        0
    }

    fn from_db_value(value: &DbValue) -> Result<Self, SqlConduitError> {
        value
            .as_int()
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| mismatch("i32", value))
    }
}

impl FromDbValue for f64 {
    fn zero_value() -> Self {
        0.0
    }

    fn from_db_value(value: &DbValue) -> Result<Self, SqlConduitError> {
        value.as_float().ok_or_else(|| mismatch("f64", value))
    }
}

impl FromDbValue for bool {
    fn zero_value() -> Self {
        false
    }

    fn from_db_value(value: &DbValue) -> Result<Self, SqlConduitError> {
        value.as_bool().ok_or_else(|| mismatch("bool", value))
    }
}

impl FromDbValue for String {
    fn zero_value() -> Self {
        String::new()
    }

    fn from_db_value(value: &DbValue) -> Result<Self, SqlConduitError> {
        value
            .as_text()
            .map(str::to_string)
            .ok_or_else(|| mismatch("text", value))
    }
}

impl FromDbValue for Vec<u8> {
    fn zero_value() -> Self {
        Vec::new()
    }

    fn from_db_value(value: &DbValue) -> Result<Self, SqlConduitError> {
        value
            .as_blob()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| mismatch("blob", value))
    }
}

impl FromDbValue for NaiveDateTime {
    fn zero_value() -> Self {
        NaiveDateTime::default()
    }

    fn from_db_value(value: &DbValue) -> Result<Self, SqlConduitError> {
        value
            .as_timestamp()
            .ok_or_else(|| mismatch("timestamp", value))
    }
}

impl FromDbValue for JsonValue {
    fn zero_value() -> Self {
        JsonValue::Null
    }

    fn from_db_value(value: &DbValue) -> Result<Self, SqlConduitError> {
        match value {
            DbValue::Json(json) => Ok(json.clone()),
            DbValue::Text(text) => {
                serde_json::from_str(text).map_err(|_| mismatch("json", value))
            }
            _ => Err(mismatch("json", value)),
        }
    }
}

impl FromDbValue for DbValue {
    fn zero_value() -> Self {
        DbValue::Null
    }

    fn from_db_value(value: &DbValue) -> Result<Self, SqlConduitError> {
        Ok(value.clone())
    }
}

impl<T: FromDbValue> FromDbValue for Option<T> {
    fn zero_value() -> Self {
        None
    }

    fn from_db_value(value: &DbValue) -> Result<Self, SqlConduitError> {
        T::from_db_value(value).map(Some)
    }
}

/// Something that addresses a column: an ordinal or a column name.
pub trait ColumnIndex {
    /// # Errors
    /// Returns `SqlConduitError::ColumnNotFound` if the column is unknown to the reader.
    fn ordinal(&self, reader: &dyn DataReader) -> Result<usize, SqlConduitError>;
}

impl ColumnIndex for usize {
    fn ordinal(&self, reader: &dyn DataReader) -> Result<usize, SqlConduitError> {
        if *self < reader.column_names().len() {
            Ok(*self)
        } else {
            Err(SqlConduitError::ColumnNotFound(format!("ordinal {self}")))
        }
    }
}

impl ColumnIndex for &str {
    fn ordinal(&self, reader: &dyn DataReader) -> Result<usize, SqlConduitError> {
        reader
            .ordinal(self)
            .ok_or_else(|| SqlConduitError::ColumnNotFound((*self).to_string()))
    }
}

impl ColumnIndex for String {
    fn ordinal(&self, reader: &dyn DataReader) -> Result<usize, SqlConduitError> {
        self.as_str().ordinal(reader)
    }
}

/// Typed view of the reader's current row. Only valid inside one mapper call.
pub struct RowAdapter<'r> {
    reader: &'r dyn DataReader,
}

impl<'r> RowAdapter<'r> {
    #[must_use]
    pub fn new(reader: &'r dyn DataReader) -> Self {
        Self { reader }
    }

    /// Read a column as `T`; NULL reads as `T::zero_value()`.
    ///
    /// # Errors
    /// Returns `ColumnNotFound` for an unknown column and `TypeMismatch` if the stored value
    /// cannot be coerced to `T`.
    pub fn get<T: FromDbValue>(&self, index: impl ColumnIndex) -> Result<T, SqlConduitError> {
        let ordinal = index.ordinal(self.reader)?;
        T::from_nullable(self.reader.value(ordinal)?)
    }

    /// The stored value, `DbValue::Null` for NULL.
    ///
    /// # Errors
    /// Returns `ColumnNotFound` for an unknown column.
    pub fn get_value(&self, index: impl ColumnIndex) -> Result<DbValue, SqlConduitError> {
        let ordinal = index.ordinal(self.reader)?;
        Ok(self.reader.value(ordinal)?.clone())
    }

    /// # Errors
    /// Returns `ColumnNotFound` for an unknown column.
    pub fn is_null(&self, index: impl ColumnIndex) -> Result<bool, SqlConduitError> {
        let ordinal = index.ordinal(self.reader)?;
        Ok(self.reader.value(ordinal)?.is_null())
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.reader.column_names().len()
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        self.reader.column_names()
    }
}
