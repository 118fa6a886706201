//! Vendor-neutral data access: statements with bound parameters, placeholder translation
//! between the named (`@x`) and positional (`?`) dialects, lazily streamed rows, and a
//! per-data-source registry of named queries.
//!
//! ```rust,no_run
//! use sql_conduit::prelude::*;
//!
//! # fn main() -> Result<(), SqlConduitError> {
//! let source = DataSource::builder("app.db").translation(true).build_sqlite()?;
//! source.registry().register("adults", "SELECT name FROM people WHERE age >= @age")?;
//! let names = source
//!     .named("adults")?
//!     .attach_parameter("@age", 18)?
//!     .execute_for_each_row(|row| row.get::<String>("name"))?;
//! for name in names {
//!     println!("{}", name?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod datasource;
pub mod error;
mod guard;
pub mod params;
pub mod prelude;
pub mod provider;
pub mod reflect;
pub mod registry;
pub mod results;
pub mod statement;
pub mod translation;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use datasource::{DataSource, DataSourceOptions, DataSourceOptionsBuilder};
pub use error::SqlConduitError;
pub use params::{DbParameter, ParameterList};
pub use registry::{NamedQuery, QueryRegistry};
pub use statement::{QueryObject, RowIter, Statement};
pub use types::{CommandKind, DbType, DbValue, ParameterDirection};
