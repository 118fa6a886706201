use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SqlConduitError;
use crate::provider::DbProvider;
use crate::registry::QueryRegistry;
use crate::statement::{QueryObject, Statement};
use crate::translation::DialectKind;
use crate::types::CommandKind;

/// Options for a [`DataSource`].
///
/// Deserializable so applications can keep them next to the rest of their configuration:
/// ```rust
/// use sql_conduit::prelude::*;
///
/// let opts = DataSourceOptions::from_json(
///     r#"{ "connection_string": "app.db", "translate_placeholders": true }"#,
/// )?;
/// assert_eq!(opts.source_dialect, DialectKind::Named);
/// # Ok::<(), SqlConduitError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSourceOptions {
    pub connection_string: String,
    /// Rewrite statement placeholders into the provider's dialect by default.
    pub translate_placeholders: bool,
    /// Dialect application SQL is written in when translation applies.
    pub source_dialect: DialectKind,
}

impl Default for DataSourceOptions {
    fn default() -> Self {
        Self {
            connection_string: String::new(),
            translate_placeholders: false,
            source_dialect: DialectKind::Named,
        }
    }
}

impl DataSourceOptions {
    #[must_use]
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_translation(mut self, translate_placeholders: bool) -> Self {
        self.translate_placeholders = translate_placeholders;
        self
    }

    #[must_use]
    pub fn with_source_dialect(mut self, source_dialect: DialectKind) -> Self {
        self.source_dialect = source_dialect;
        self
    }

    /// # Errors
    /// Returns `SqlConduitError::ConfigError` if `json` is not a valid options document.
    pub fn from_json(json: &str) -> Result<Self, SqlConduitError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Fluent builder for [`DataSourceOptions`].
#[derive(Debug, Clone)]
pub struct DataSourceOptionsBuilder {
    opts: DataSourceOptions,
}

impl DataSourceOptionsBuilder {
    #[must_use]
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            opts: DataSourceOptions::new(connection_string),
        }
    }

    #[must_use]
    pub fn translation(mut self, translate_placeholders: bool) -> Self {
        self.opts.translate_placeholders = translate_placeholders;
        self
    }

    #[must_use]
    pub fn source_dialect(mut self, source_dialect: DialectKind) -> Self {
        self.opts.source_dialect = source_dialect;
        self
    }

    #[must_use]
    pub fn finish(self) -> DataSourceOptions {
        self.opts
    }

    /// Build a data source over `provider` with these options.
    #[must_use]
    pub fn build(self, provider: Arc<dyn DbProvider>) -> DataSource {
        DataSource::new(provider, self.finish())
    }

    /// Build a data source over the bundled `SQLite` provider.
    ///
    /// # Errors
    /// Returns `SqlConduitError::ConfigError` if the connection string is empty.
    #[cfg(feature = "sqlite")]
    pub fn build_sqlite(self) -> Result<DataSource, SqlConduitError> {
        DataSource::new_sqlite(self.finish())
    }
}

struct DataSourceInner {
    provider: Arc<dyn DbProvider>,
    registry: QueryRegistry,
    options: DataSourceOptions,
}

/// Handle to one data source: its provider, its options and its named-query registry.
///
/// Cloning is cheap and shares the registry.
#[derive(Clone)]
pub struct DataSource {
    inner: Arc<DataSourceInner>,
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSource")
            .field("options", &self.inner.options)
            .field("queries", &self.inner.registry.count())
            .finish_non_exhaustive()
    }
}

impl DataSource {
    #[must_use]
    pub fn new(provider: Arc<dyn DbProvider>, options: DataSourceOptions) -> Self {
        Self {
            inner: Arc::new(DataSourceInner {
                provider,
                registry: QueryRegistry::new(),
                options,
            }),
        }
    }

    #[must_use]
    pub fn builder(connection_string: impl Into<String>) -> DataSourceOptionsBuilder {
        DataSourceOptionsBuilder::new(connection_string)
    }

    /// Data source over the bundled `SQLite` provider, keyed to `options.connection_string`.
    ///
    /// # Errors
    /// Returns `SqlConduitError::ConfigError` if the connection string is empty.
    #[cfg(feature = "sqlite")]
    pub fn new_sqlite(options: DataSourceOptions) -> Result<Self, SqlConduitError> {
        let provider = crate::sqlite::SqliteProvider::new(&options.connection_string)?;
        Ok(Self::new(Arc::new(provider), options))
    }

    #[must_use]
    pub fn provider(&self) -> &Arc<dyn DbProvider> {
        &self.inner.provider
    }

    #[must_use]
    pub fn options(&self) -> &DataSourceOptions {
        &self.inner.options
    }

    #[must_use]
    pub fn registry(&self) -> &QueryRegistry {
        &self.inner.registry
    }

    /// # Errors
    /// Returns `SqlConduitError::InvalidArgument` if `text` is empty.
    pub fn statement(
        &self,
        text: impl Into<String>,
        kind: CommandKind,
    ) -> Result<Statement, SqlConduitError> {
        Statement::new(self.clone(), text, kind)
    }

    /// Statement over plain SQL text.
    ///
    /// # Errors
    /// Returns `SqlConduitError::InvalidArgument` if `sql` is empty.
    pub fn sql(&self, sql: impl Into<String>) -> Result<Statement, SqlConduitError> {
        self.statement(sql, CommandKind::Text)
    }

    /// # Errors
    /// Returns `SqlConduitError::InvalidArgument` if `name` is empty.
    pub fn procedure(&self, name: impl Into<String>) -> Result<Statement, SqlConduitError> {
        self.statement(name, CommandKind::StoredProcedure)
    }

    /// Statement over a query registered under `name`.
    ///
    /// # Errors
    /// Returns `SqlConduitError::NotFound` if no such query is registered.
    pub fn named(&self, name: &str) -> Result<Statement, SqlConduitError> {
        let sql = self.inner.registry.find(name)?;
        self.sql(sql)
    }

    /// # Errors
    /// Returns `InvalidArgument` for empty command text, or whatever `query.bind` returns.
    pub fn query_object(&self, query: &dyn QueryObject) -> Result<Statement, SqlConduitError> {
        Statement::from_query_object(self.clone(), query)
    }
}
