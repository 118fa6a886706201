//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::datasource::{DataSource, DataSourceOptions, DataSourceOptionsBuilder};
pub use crate::error::SqlConduitError;
pub use crate::params::{DbParameter, ParameterFactory, ParameterList};
pub use crate::provider::{DataReader, DbCommand, DbConnection, DbProvider, FillAdapter};
pub use crate::reflect::{ColumnMap, FieldMapped, column_map};
pub use crate::registry::{NamedQuery, QueryRegistry};
pub use crate::results::{
    ColumnIndex, DataSet, FromDataSet, FromDbValue, ResultSet, RowAdapter, TableRow,
};
pub use crate::statement::{QueryObject, RowIter, Statement};
pub use crate::translation::{
    DialectKind, ParameterDialect, QueryOptions, TranslationMode, translate_placeholders,
};
pub use crate::types::{CommandKind, DbType, DbValue, ParameterDirection};

pub use crate::field_mapped;

#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteProvider;
