use std::borrow::Cow;
use std::sync::Arc;

use crate::datasource::DataSource;
use crate::error::SqlConduitError;
use crate::params::{DbParameter, ParameterList};
use crate::reflect::{ColumnMap, FieldMapped, populate};
use crate::results::{DataSet, FromDataSet, FromDbValue, ResultSet, RowAdapter};
use crate::translation::{
    DialectKind, ParameterDialect, QueryOptions, TranslationMode, translate_placeholders,
};
use crate::types::{CommandKind, DbType, DbValue, ParameterDirection};

mod rows;
mod scope;

pub use rows::RowIter;

use rows::PendingReader;
use scope::ExecutionScope;

/// A query type that knows its own command text and parameters.
pub trait QueryObject {
    fn command_text(&self) -> String;

    fn command_kind(&self) -> CommandKind {
        CommandKind::Text
    }

    /// Attach this query's parameters.
    ///
    /// # Errors
    /// Implementations return `SqlConduitError::InvalidArgument` for unusable parameters.
    fn bind(&self, _parameters: &mut ParameterList) -> Result<(), SqlConduitError> {
        Ok(())
    }
}

/// A pending database operation: command text, command kind and parameters.
///
/// Mutators return the statement for chaining; the terminal `execute_*` calls open a
/// connection from the owning [`DataSource`].
/// ```rust,no_run
/// use sql_conduit::prelude::*;
///
/// # fn demo(source: &DataSource) -> Result<(), SqlConduitError> {
/// let names: Vec<String> = source
///     .sql("SELECT name FROM people WHERE age > @age")?
///     .attach_parameter("@age", 30)?
///     .execute_for_each_row(|row| row.get("name"))?
///     .collect::<Result<_, _>>()?;
/// # let _ = names;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Statement {
    source: DataSource,
    text: String,
    kind: CommandKind,
    parameters: ParameterList,
    options: QueryOptions,
}

impl Statement {
    /// # Errors
    /// Returns `SqlConduitError::InvalidArgument` if `text` is empty or blank.
    pub fn new(
        source: DataSource,
        text: impl Into<String>,
        kind: CommandKind,
    ) -> Result<Self, SqlConduitError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(SqlConduitError::invalid_argument(
                "command text must not be empty",
            ));
        }
        let parameters = ParameterList::new(source.provider().parameter_factory());
        Ok(Self {
            source,
            text,
            kind,
            parameters,
            options: QueryOptions::default(),
        })
    }

    /// Build a statement from a self-describing query object.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for empty command text, or whatever `query.bind` returns.
    pub fn from_query_object(
        source: DataSource,
        query: &dyn QueryObject,
    ) -> Result<Self, SqlConduitError> {
        let mut statement = Self::new(source, query.command_text(), query.command_kind())?;
        query.bind(&mut statement.parameters)?;
        Ok(statement)
    }

    #[must_use]
    pub fn command_text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn command_kind(&self) -> CommandKind {
        self.kind
    }

    #[must_use]
    pub fn parameters(&self) -> &ParameterList {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut ParameterList {
        &mut self.parameters
    }

    #[must_use]
    pub fn options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn translation(mut self, translation: TranslationMode) -> Self {
        self.options.translation = translation;
        self
    }

    /// # Errors
    /// Returns `SqlConduitError::InvalidArgument` if `name` is empty.
    pub fn attach_parameter(
        mut self,
        name: &str,
        value: impl Into<DbValue>,
    ) -> Result<Self, SqlConduitError> {
        self.parameters.add(name, value)?;
        Ok(self)
    }

    /// # Errors
    /// Returns `SqlConduitError::InvalidArgument` if `name` is empty.
    pub fn attach_typed(
        mut self,
        name: &str,
        value: impl Into<DbValue>,
        db_type: DbType,
    ) -> Result<Self, SqlConduitError> {
        self.parameters.add_typed(name, value, db_type)?;
        Ok(self)
    }

    /// # Errors
    /// Returns `SqlConduitError::InvalidArgument` if `name` is empty.
    pub fn attach_directed(
        mut self,
        name: &str,
        value: impl Into<DbValue>,
        direction: ParameterDirection,
    ) -> Result<Self, SqlConduitError> {
        self.parameters.add_directed(name, value, direction)?;
        Ok(self)
    }

    /// # Errors
    /// Returns `SqlConduitError::InvalidArgument` if `name` is empty.
    pub fn attach_parameter_full(
        mut self,
        name: &str,
        value: impl Into<DbValue>,
        db_type: DbType,
        direction: ParameterDirection,
    ) -> Result<Self, SqlConduitError> {
        self.parameters.add_full(name, value, db_type, direction)?;
        Ok(self)
    }

    /// Attach one input parameter per `(name, value)` entry.
    ///
    /// # Errors
    /// Returns `SqlConduitError::InvalidArgument` if any key is empty.
    pub fn attach_map<I, K, V>(mut self, entries: I) -> Result<Self, SqlConduitError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<DbValue>,
    {
        self.parameters.extend_from_map(entries)?;
        Ok(self)
    }

    /// # Errors
    /// Returns `SqlConduitError::InvalidArgument` if any parameter has an empty name.
    pub fn attach_list<I>(mut self, parameters: I) -> Result<Self, SqlConduitError>
    where
        I: IntoIterator<Item = DbParameter>,
    {
        self.parameters.extend_from(parameters)?;
        Ok(self)
    }

    /// Let `populate` mutate the live parameter list.
    ///
    /// # Errors
    /// Propagates any error `populate` returns.
    pub fn attach_with<F>(mut self, populate: F) -> Result<Self, SqlConduitError>
    where
        F: FnOnce(&mut ParameterList) -> Result<(), SqlConduitError>,
    {
        populate(&mut self.parameters)?;
        Ok(self)
    }

    /// Source and target dialects when this statement's text gets rewritten.
    fn translation_route(&self) -> Option<(DialectKind, DialectKind)> {
        if self.kind == CommandKind::StoredProcedure {
            return None;
        }
        let options = self.source.options();
        let target = self.source.provider().dialect();
        let enabled = self.options.translation.resolve(options.translate_placeholders);
        (enabled && options.source_dialect != target).then_some((options.source_dialect, target))
    }

    /// Command text as the provider will see it.
    ///
    /// # Errors
    /// Returns `SqlConduitError::InvalidArgument` if translation is enabled and fails.
    pub fn resolved_text(&self) -> Result<Cow<'_, str>, SqlConduitError> {
        match self.translation_route() {
            Some((source, target)) => translate_placeholders(&self.text, source, target, true),
            None => Ok(Cow::Borrowed(&self.text)),
        }
    }

    /// Parameters as the provider will see them.
    ///
    /// Positional SQL rewritten into named placeholders binds by position, so each bindable
    /// parameter takes the name of the placeholder generated at its position.
    #[must_use]
    pub fn resolved_parameters(&self) -> Cow<'_, [DbParameter]> {
        let Some((DialectKind::Positional, target)) = self.translation_route() else {
            return Cow::Borrowed(self.parameters.as_slice());
        };
        let dialect = target.dialect();
        let mut ordinal = 0;
        let renamed = self
            .parameters
            .iter()
            .map(|parameter| {
                let mut parameter = parameter.clone();
                if parameter.direction != ParameterDirection::ReturnValue {
                    parameter.name = dialect.placeholder(ordinal);
                    ordinal += 1;
                }
                parameter
            })
            .collect::<Vec<_>>();
        Cow::Owned(renamed)
    }

    /// Open a connection and create the command; everything is owned by the returned scope.
    fn open_scope(&self) -> Result<ExecutionScope, SqlConduitError> {
        let text = self.resolved_text()?;
        ExecutionScope::open(
            self.source.provider().as_ref(),
            &text,
            self.kind,
            &self.resolved_parameters(),
        )
    }

    /// Lazily map each row with `mapper`.
    ///
    /// The connection is opened on the first pull, not here.
    ///
    /// # Errors
    /// Returns `SqlConduitError::InvalidArgument` if placeholder translation fails. Provider
    /// errors while opening, stepping or mapping are yielded by the iterator.
    pub fn execute_for_each_row<T, F>(&self, mapper: F) -> Result<RowIter<T, F>, SqlConduitError>
    where
        F: FnMut(&RowAdapter<'_>) -> Result<T, SqlConduitError>,
    {
        let pending = PendingReader::new(
            Arc::clone(self.source.provider()),
            self.resolved_text()?.into_owned(),
            self.kind,
            self.resolved_parameters().into_owned(),
        );
        Ok(RowIter::new(pending, mapper))
    }

    /// Execute and populate a fresh `T` per row from `map` (field name → column name).
    ///
    /// Slower than an explicit mapper; field names `T` lacks are skipped.
    ///
    /// # Errors
    /// Returns `SqlConduitError::InvalidArgument` if placeholder translation fails.
    pub fn execute_for_each_row_mapped<T>(
        &self,
        map: &ColumnMap,
    ) -> Result<
        RowIter<T, impl FnMut(&RowAdapter<'_>) -> Result<T, SqlConduitError> + use<T>>,
        SqlConduitError,
    >
    where
        T: FieldMapped + Default,
    {
        let map = map.clone();
        self.execute_for_each_row(move |row: &RowAdapter<'_>| populate::<T>(row, &map))
    }

    /// First mapped row, or `T::default()` when the result is empty.
    ///
    /// # Errors
    /// Returns provider errors unchanged, or the mapper's error for the first row.
    pub fn execute_for_first_row<T, F>(&self, mapper: F) -> Result<T, SqlConduitError>
    where
        T: Default,
        F: FnMut(&RowAdapter<'_>) -> Result<T, SqlConduitError>,
    {
        let mut rows = self.execute_for_each_row(mapper)?;
        rows.next().unwrap_or_else(|| Ok(T::default()))
    }

    /// # Errors
    /// Returns provider errors unchanged, or a row access error for the first row.
    pub fn execute_for_first_row_mapped<T>(&self, map: &ColumnMap) -> Result<T, SqlConduitError>
    where
        T: FieldMapped + Default,
    {
        let mut rows = self.execute_for_each_row_mapped::<T>(map)?;
        rows.next().unwrap_or_else(|| Ok(T::default()))
    }

    /// First column of the first row; the zero value when there are no rows.
    ///
    /// # Errors
    /// Returns provider errors unchanged, or `TypeMismatch` if the value does not fit `T`.
    pub fn execute_for_scalar<T: FromDbValue>(&self) -> Result<T, SqlConduitError> {
        let mut rows = self.execute_for_each_row(|row| row.get::<T>(0usize))?;
        rows.next().unwrap_or_else(|| Ok(T::zero_value()))
    }

    /// Bulk-fill every result of the command through the provider's fill adapter.
    ///
    /// # Errors
    /// Returns provider errors unchanged.
    pub fn execute_for_dataset(&self) -> Result<DataSet, SqlConduitError> {
        let mut scope = self.open_scope()?;
        let mut adapter = self
            .source
            .provider()
            .create_fill_adapter(scope.take_command()?);
        let mut data_set = DataSet::default();
        let filled = adapter.fill(&mut data_set);
        // The adapter owns and closes the command; the connection goes last.
        drop(adapter);
        scope.release();
        let rows = filled?;
        tracing::debug!(rows, tables = data_set.len(), "data set filled");
        Ok(data_set)
    }

    /// # Errors
    /// Returns provider errors unchanged, or the conversion error from `T`.
    pub fn execute_for_dataset_as<T: FromDataSet>(&self) -> Result<T, SqlConduitError> {
        T::from_data_set(self.execute_for_dataset()?)
    }

    /// First result of the command as one table.
    ///
    /// # Errors
    /// Returns provider errors unchanged.
    pub fn execute_for_table(&self) -> Result<ResultSet, SqlConduitError> {
        self.execute_for_dataset_as::<ResultSet>()
    }

    /// Execute without a cursor; returns the affected-row count the provider reports.
    ///
    /// # Errors
    /// Returns provider errors unchanged.
    pub fn execute_without_result(&self) -> Result<usize, SqlConduitError> {
        let mut scope = self.open_scope()?;
        let affected = scope.command_mut()?.execute_non_query()?;
        scope.release();
        tracing::debug!(affected, "command executed");
        Ok(affected)
    }
}
