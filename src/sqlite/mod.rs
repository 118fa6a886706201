//! Embedded `SQLite` provider.
//!
//! Each connection owns a worker thread holding the `rusqlite::Connection`; readers pull rows
//! from it one at a time.

mod params;
mod reader;
mod worker;

use std::sync::Arc;
use std::sync::mpsc::{self, Sender};

use crate::error::SqlConduitError;
use crate::params::{DbParameter, ParameterFactory};
use crate::provider::{DataReader, DbCommand, DbConnection, DbProvider};
use crate::translation::DialectKind;
use crate::types::CommandKind;

pub use params::{
    SqliteParameterFactory, bind_parameters, db_value_to_sqlite_value, sqlite_extract_value,
};
pub use reader::SqliteReader;

use worker::{ReaderMessage, SqliteWorker, WorkerCommand, connection_error};

/// Provider keyed to one `SQLite` path (or `:memory:`).
#[derive(Debug, Clone)]
pub struct SqliteProvider {
    path: String,
}

impl SqliteProvider {
    /// # Errors
    /// Returns `SqlConduitError::ConfigError` if `path` is empty.
    pub fn new(path: &str) -> Result<Self, SqlConduitError> {
        if path.is_empty() {
            return Err(SqlConduitError::ConfigError(
                "SQLite connection string must not be empty".into(),
            ));
        }
        Ok(Self {
            path: path.to_string(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl DbProvider for SqliteProvider {
    fn dialect(&self) -> DialectKind {
        DialectKind::Named
    }

    fn create_connection(&self) -> Result<Box<dyn DbConnection>, SqlConduitError> {
        Ok(Box::new(SqliteConnection {
            path: self.path.clone(),
            worker: None,
        }))
    }

    fn parameter_factory(&self) -> Arc<dyn ParameterFactory> {
        Arc::new(SqliteParameterFactory)
    }
}

/// Connection whose worker thread exists between `open` and `close`.
pub struct SqliteConnection {
    path: String,
    worker: Option<SqliteWorker>,
}

impl DbConnection for SqliteConnection {
    fn open(&mut self) -> Result<(), SqlConduitError> {
        if self.worker.is_none() {
            self.worker = Some(SqliteWorker::spawn(&self.path)?);
        }
        Ok(())
    }

    fn create_command(
        &mut self,
        text: &str,
        kind: CommandKind,
        parameters: &[DbParameter],
    ) -> Result<Box<dyn DbCommand>, SqlConduitError> {
        if kind == CommandKind::StoredProcedure {
            return Err(SqlConduitError::Unimplemented(
                "SQLite has no stored procedures".into(),
            ));
        }
        let worker = self
            .worker
            .as_ref()
            .ok_or_else(|| connection_error("SQLite connection is not open"))?;
        Ok(Box::new(SqliteCommand {
            sender: Some(worker.sender()),
            sql: text.to_string(),
            params: parameters.to_vec(),
        }))
    }

    fn close(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.shutdown();
        }
    }
}

pub struct SqliteCommand {
    sender: Option<Sender<WorkerCommand>>,
    sql: String,
    params: Vec<DbParameter>,
}

impl SqliteCommand {
    fn send(&self, command: WorkerCommand) -> Result<(), SqlConduitError> {
        self.sender
            .as_ref()
            .ok_or_else(|| connection_error("SQLite command is closed"))?
            .send(command)
            .map_err(|_| connection_error("SQLite worker closed"))
    }
}

impl DbCommand for SqliteCommand {
    fn execute_reader(&mut self) -> Result<Box<dyn DataReader>, SqlConduitError> {
        let (tx, rx) = mpsc::sync_channel(0);
        self.send(WorkerCommand::ExecuteReader {
            sql: self.sql.clone(),
            params: self.params.clone(),
            respond_to: tx,
        })?;
        match rx.recv() {
            Ok(ReaderMessage::Columns(columns)) => Ok(Box::new(SqliteReader::new(columns, rx))),
            Ok(ReaderMessage::Failed(err)) => Err(err),
            Ok(ReaderMessage::Row(_) | ReaderMessage::Done) => Err(
                SqlConduitError::ExecutionError("SQLite reader started without columns".into()),
            ),
            Err(_) => Err(connection_error(
                "SQLite worker dropped while executing reader",
            )),
        }
    }

    fn execute_non_query(&mut self) -> Result<usize, SqlConduitError> {
        let (tx, rx) = mpsc::sync_channel(1);
        self.send(WorkerCommand::ExecuteNonQuery {
            sql: self.sql.clone(),
            params: self.params.clone(),
            respond_to: tx,
        })?;
        rx.recv()
            .map_err(|_| connection_error("SQLite worker dropped while executing command"))?
    }

    fn close(&mut self) {
        self.sender = None;
    }
}
