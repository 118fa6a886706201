#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use sql_conduit::prelude::*;

/// Shared log of everything the fake provider saw, in order.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }
}

/// In-memory provider returning canned rows and recording open/close order.
#[derive(Debug, Clone)]
pub struct RecordingProvider {
    pub log: EventLog,
    pub dialect: DialectKind,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<DbValue>>,
    pub fail_open: bool,
    pub affected: usize,
}

impl RecordingProvider {
    pub fn new(columns: &[&str], rows: Vec<Vec<DbValue>>) -> Self {
        Self {
            log: EventLog::default(),
            dialect: DialectKind::Named,
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            rows,
            fail_open: false,
            affected: 0,
        }
    }

    pub fn source(&self) -> DataSource {
        DataSource::new(Arc::new(self.clone()), DataSourceOptions::new("fake"))
    }

    pub fn source_with(&self, options: DataSourceOptions) -> DataSource {
        DataSource::new(Arc::new(self.clone()), options)
    }
}

impl DbProvider for RecordingProvider {
    fn dialect(&self) -> DialectKind {
        self.dialect
    }

    fn create_connection(&self) -> Result<Box<dyn DbConnection>, SqlConduitError> {
        Ok(Box::new(FakeConnection {
            provider: self.clone(),
        }))
    }
}

struct FakeConnection {
    provider: RecordingProvider,
}

impl DbConnection for FakeConnection {
    fn open(&mut self) -> Result<(), SqlConduitError> {
        if self.provider.fail_open {
            return Err(SqlConduitError::ConnectionError("refused".into()));
        }
        self.provider.log.push("connection.open");
        Ok(())
    }

    fn create_command(
        &mut self,
        text: &str,
        kind: CommandKind,
        parameters: &[DbParameter],
    ) -> Result<Box<dyn DbCommand>, SqlConduitError> {
        self.provider.log.push(format!("command {kind:?}: {text}"));
        for p in parameters {
            self.provider.log.push(format!("param {}", p.name));
        }
        Ok(Box::new(FakeCommand {
            provider: self.provider.clone(),
        }))
    }

    fn close(&mut self) {
        self.provider.log.push("connection.close");
    }
}

struct FakeCommand {
    provider: RecordingProvider,
}

impl DbCommand for FakeCommand {
    fn execute_reader(&mut self) -> Result<Box<dyn DataReader>, SqlConduitError> {
        self.provider.log.push("command.execute_reader");
        Ok(Box::new(FakeReader {
            log: self.provider.log.clone(),
            columns: self.provider.columns.clone(),
            rows: self.provider.rows.clone(),
            position: None,
        }))
    }

    fn execute_non_query(&mut self) -> Result<usize, SqlConduitError> {
        self.provider.log.push("command.execute_non_query");
        Ok(self.provider.affected)
    }

    fn close(&mut self) {
        self.provider.log.push("command.close");
    }
}

struct FakeReader {
    log: EventLog,
    columns: Vec<String>,
    rows: Vec<Vec<DbValue>>,
    position: Option<usize>,
}

impl DataReader for FakeReader {
    fn column_names(&self) -> &[String] {
        &self.columns
    }

    fn read(&mut self) -> Result<bool, SqlConduitError> {
        let next = self.position.map_or(0, |p| p + 1);
        self.position = Some(next);
        if next < self.rows.len() {
            self.log.push(format!("reader.read {next}"));
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn value(&self, ordinal: usize) -> Result<&DbValue, SqlConduitError> {
        self.position
            .and_then(|p| self.rows.get(p))
            .and_then(|row| row.get(ordinal))
            .ok_or_else(|| SqlConduitError::ColumnNotFound(format!("ordinal {ordinal}")))
    }

    fn close(&mut self) {
        self.log.push("reader.close");
    }
}

pub fn people() -> RecordingProvider {
    RecordingProvider::new(
        &["id", "name", "score"],
        vec![
            vec![DbValue::Int(1), DbValue::Text("ann".into()), DbValue::Float(9.5)],
            vec![DbValue::Int(2), DbValue::Text("bo".into()), DbValue::Null],
            vec![DbValue::Int(3), DbValue::Null, DbValue::Float(7.0)],
        ],
    )
}
