//! Contracts a vendor binding implements to plug into the statement pipeline.
//!
//! Every object handed out here is owned (`'static`), so a row iterator can hold the
//! connection, the command and the reader at once and release them in order.

use std::sync::Arc;

use crate::error::SqlConduitError;
use crate::params::{DbParameter, DefaultParameterFactory, ParameterFactory};
use crate::results::{DataSet, ResultSet};
use crate::translation::DialectKind;
use crate::types::{CommandKind, DbValue};

/// Connection/command/parameter factory keyed to one connection string.
pub trait DbProvider: Send + Sync {
    /// Placeholder dialect the provider's commands expect.
    fn dialect(&self) -> DialectKind;

    /// A new, unopened connection.
    ///
    /// # Errors
    /// Returns the provider's error if a connection object cannot be created.
    fn create_connection(&self) -> Result<Box<dyn DbConnection>, SqlConduitError>;

    fn parameter_factory(&self) -> Arc<dyn ParameterFactory> {
        Arc::new(DefaultParameterFactory)
    }

    /// Adapter that bulk-fills tabular results from `command`.
    fn create_fill_adapter(&self, command: Box<dyn DbCommand>) -> Box<dyn FillAdapter> {
        Box::new(ReaderFillAdapter::new(command))
    }
}

pub trait DbConnection: Send {
    /// # Errors
    /// Propagates the provider's connectivity error unchanged.
    fn open(&mut self) -> Result<(), SqlConduitError>;

    /// # Errors
    /// Returns the provider's error if the command cannot be built.
    fn create_command(
        &mut self,
        text: &str,
        kind: CommandKind,
        parameters: &[DbParameter],
    ) -> Result<Box<dyn DbCommand>, SqlConduitError>;

    fn close(&mut self);
}

pub trait DbCommand: Send {
    /// Execute and return a forward-only reader over the results.
    ///
    /// # Errors
    /// Propagates the provider's execution error unchanged.
    fn execute_reader(&mut self) -> Result<Box<dyn DataReader>, SqlConduitError>;

    /// Execute without a cursor, returning the affected-row count.
    ///
    /// # Errors
    /// Propagates the provider's execution error unchanged.
    fn execute_non_query(&mut self) -> Result<usize, SqlConduitError>;

    fn close(&mut self);
}

/// Forward-only cursor. Values are only valid for the current row.
pub trait DataReader: Send {
    fn column_names(&self) -> &[String];

    /// Advance to the next row. Returns `false` once the current result is exhausted.
    ///
    /// # Errors
    /// Propagates the provider's error raised while stepping.
    fn read(&mut self) -> Result<bool, SqlConduitError>;

    /// Value at `ordinal` in the current row.
    ///
    /// # Errors
    /// Returns `SqlConduitError::ColumnNotFound` if `ordinal` is out of range, or an
    /// execution error if no row is current.
    fn value(&self, ordinal: usize) -> Result<&DbValue, SqlConduitError>;

    /// Move to the next result of a multi-result command.
    ///
    /// # Errors
    /// Propagates the provider's error.
    fn next_result(&mut self) -> Result<bool, SqlConduitError> {
        Ok(false)
    }

    fn close(&mut self);

    /// Ordinal of `name` in the current result's columns.
    fn ordinal(&self, name: &str) -> Option<usize> {
        self.column_names().iter().position(|col| col == name)
    }
}

/// Fills tabular structures from a command in one pass.
pub trait FillAdapter {
    /// Append one table per result to `data_set`, returning the number of rows filled.
    ///
    /// # Errors
    /// Propagates provider errors raised while executing or reading.
    fn fill(&mut self, data_set: &mut DataSet) -> Result<usize, SqlConduitError>;
}

/// Fill adapter that drains the command's reader, result by result.
pub struct ReaderFillAdapter {
    command: Box<dyn DbCommand>,
}

impl ReaderFillAdapter {
    #[must_use]
    pub fn new(command: Box<dyn DbCommand>) -> Self {
        Self { command }
    }
}

impl FillAdapter for ReaderFillAdapter {
    fn fill(&mut self, data_set: &mut DataSet) -> Result<usize, SqlConduitError> {
        let mut reader = self.command.execute_reader()?;
        let filled = drain_reader(reader.as_mut(), data_set);
        reader.close();
        filled
    }
}

impl Drop for ReaderFillAdapter {
    fn drop(&mut self) {
        self.command.close();
    }
}

fn drain_reader(
    reader: &mut dyn DataReader,
    data_set: &mut DataSet,
) -> Result<usize, SqlConduitError> {
    let mut total = 0;
    loop {
        let mut table = ResultSet::with_capacity(10);
        table.set_column_names(Arc::new(reader.column_names().to_vec()));
        let width = reader.column_names().len();
        while reader.read()? {
            let mut row = Vec::with_capacity(width);
            for ordinal in 0..width {
                row.push(reader.value(ordinal)?.clone());
            }
            table.add_row_values(row);
        }
        total += table.len();
        data_set.push(table);
        if !reader.next_result()? {
            break;
        }
    }
    Ok(total)
}
