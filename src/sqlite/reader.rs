use std::sync::mpsc::Receiver;

use crate::error::SqlConduitError;
use crate::provider::DataReader;
use crate::types::DbValue;

use super::worker::{ReaderMessage, connection_error};

/// Forward-only reader fed by the connection's worker thread.
pub struct SqliteReader {
    columns: Vec<String>,
    receiver: Option<Receiver<ReaderMessage>>,
    current: Option<Vec<DbValue>>,
}

impl SqliteReader {
    pub(super) fn new(columns: Vec<String>, receiver: Receiver<ReaderMessage>) -> Self {
        Self {
            columns,
            receiver: Some(receiver),
            current: None,
        }
    }
}

impl DataReader for SqliteReader {
    fn column_names(&self) -> &[String] {
        &self.columns
    }

    fn read(&mut self) -> Result<bool, SqlConduitError> {
        let Some(receiver) = self.receiver.as_ref() else {
            self.current = None;
            return Ok(false);
        };
        match receiver.recv() {
            Ok(ReaderMessage::Row(values)) => {
                self.current = Some(values);
                Ok(true)
            }
            Ok(ReaderMessage::Done | ReaderMessage::Columns(_)) => {
                self.close();
                Ok(false)
            }
            Ok(ReaderMessage::Failed(err)) => {
                self.close();
                Err(err)
            }
            Err(_) => {
                self.close();
                Err(connection_error("SQLite worker dropped while reading"))
            }
        }
    }

    fn value(&self, ordinal: usize) -> Result<&DbValue, SqlConduitError> {
        let row = self
            .current
            .as_ref()
            .ok_or_else(|| SqlConduitError::ExecutionError("no current row".into()))?;
        row.get(ordinal)
            .ok_or_else(|| SqlConduitError::ColumnNotFound(format!("ordinal {ordinal}")))
    }

    fn close(&mut self) {
        // Dropping the receiver tells the worker to stop stepping.
        self.receiver = None;
        self.current = None;
    }
}
