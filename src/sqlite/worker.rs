use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::thread::{self, JoinHandle};

use crate::error::SqlConduitError;
use crate::params::DbParameter;
use crate::types::DbValue;

use super::params::{bind_parameters, sqlite_extract_value};

static NEXT_WORKER_ID: AtomicU64 = AtomicU64::new(1);

pub(super) enum WorkerCommand {
    ExecuteNonQuery {
        sql: String,
        params: Vec<DbParameter>,
        respond_to: SyncSender<Result<usize, SqlConduitError>>,
    },
    ExecuteReader {
        sql: String,
        params: Vec<DbParameter>,
        respond_to: SyncSender<ReaderMessage>,
    },
    Shutdown,
}

/// Messages streamed from the worker to a reader, one row per message.
pub(super) enum ReaderMessage {
    Columns(Vec<String>),
    Row(Vec<DbValue>),
    Failed(SqlConduitError),
    Done,
}

/// Dedicated thread that owns one `rusqlite::Connection`.
pub(super) struct SqliteWorker {
    sender: Sender<WorkerCommand>,
    handle: Option<JoinHandle<()>>,
    id: u64,
}

impl SqliteWorker {
    /// Spawn the worker and open `path` on it, waiting for the open to finish.
    pub(super) fn spawn(path: &str) -> Result<Self, SqlConduitError> {
        let (sender, receiver) = mpsc::channel::<WorkerCommand>();
        let (opened_tx, opened_rx) = mpsc::sync_channel::<Result<(), SqlConduitError>>(1);
        let id = NEXT_WORKER_ID.fetch_add(1, Ordering::Relaxed);
        let path = path.to_string();
        let handle = thread::Builder::new()
            .name(format!("sqlite-worker-{id}"))
            .spawn(move || match rusqlite::Connection::open(&path) {
                Ok(conn) => {
                    let _ = opened_tx.send(Ok(()));
                    run_sqlite_worker(&conn, &receiver);
                }
                Err(err) => {
                    let _ = opened_tx.send(Err(SqlConduitError::SqliteError(err)));
                }
            })
            .map_err(|err| {
                SqlConduitError::ConnectionError(format!(
                    "failed to spawn SQLite worker thread: {err}"
                ))
            })?;

        match opened_rx.recv() {
            Ok(Ok(())) => {
                tracing::debug!(worker = id, "sqlite connection opened");
                Ok(Self {
                    sender,
                    handle: Some(handle),
                    id,
                })
            }
            Ok(Err(err)) => {
                let _ = handle.join();
                Err(err)
            }
            Err(_) => Err(connection_error("SQLite worker exited while opening")),
        }
    }

    pub(super) fn sender(&self) -> Sender<WorkerCommand> {
        self.sender.clone()
    }

    pub(super) fn shutdown(&mut self) {
        let _ = self.sender.send(WorkerCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!(worker = self.id, "sqlite worker panicked");
            }
            tracing::debug!(worker = self.id, "sqlite connection closed");
        }
    }
}

impl Drop for SqliteWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub(super) fn connection_error(message: &str) -> SqlConduitError {
    SqlConduitError::ConnectionError(message.into())
}

fn run_sqlite_worker(conn: &rusqlite::Connection, receiver: &Receiver<WorkerCommand>) {
    while let Ok(command) = receiver.recv() {
        match command {
            WorkerCommand::Shutdown => break,
            WorkerCommand::ExecuteNonQuery {
                sql,
                params,
                respond_to,
            } => {
                let _ = respond_to.send(execute_non_query(conn, &sql, &params));
            }
            WorkerCommand::ExecuteReader {
                sql,
                params,
                respond_to,
            } => {
                if let Err(err) = stream_rows(conn, &sql, &params, &respond_to) {
                    let _ = respond_to.send(ReaderMessage::Failed(err));
                }
            }
        }
    }
}

fn execute_non_query(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[DbParameter],
) -> Result<usize, SqlConduitError> {
    let mut stmt = conn.prepare(sql)?;
    bind_parameters(&mut stmt, params)?;
    Ok(stmt.raw_execute()?)
}

/// Step the statement one row per send. The channel is a rendezvous, so stepping waits for
/// the reader; a dropped reader ends the loop and finalizes the statement.
fn stream_rows(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[DbParameter],
    tx: &SyncSender<ReaderMessage>,
) -> Result<(), SqlConduitError> {
    let mut stmt = conn.prepare(sql)?;
    bind_parameters(&mut stmt, params)?;
    let columns: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let width = columns.len();
    if tx.send(ReaderMessage::Columns(columns)).is_err() {
        return Ok(());
    }

    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(width);
        for idx in 0..width {
            values.push(sqlite_extract_value(row, idx)?);
        }
        if tx.send(ReaderMessage::Row(values)).is_err() {
            tracing::debug!("reader closed early; finalizing statement");
            return Ok(());
        }
    }
    let _ = tx.send(ReaderMessage::Done);
    Ok(())
}
