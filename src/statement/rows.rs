use std::marker::PhantomData;
use std::sync::Arc;

use super::scope::ExecutionScope;
use crate::error::SqlConduitError;
use crate::params::DbParameter;
use crate::provider::DbProvider;
use crate::results::RowAdapter;
use crate::types::CommandKind;

/// Everything needed to open a reader, captured when the iterator is built.
pub(crate) struct PendingReader {
    provider: Arc<dyn DbProvider>,
    text: String,
    kind: CommandKind,
    parameters: Vec<DbParameter>,
}

impl PendingReader {
    pub(crate) fn new(
        provider: Arc<dyn DbProvider>,
        text: String,
        kind: CommandKind,
        parameters: Vec<DbParameter>,
    ) -> Self {
        Self {
            provider,
            text,
            kind,
            parameters,
        }
    }

    fn open(self) -> Result<ExecutionScope, SqlConduitError> {
        let mut scope =
            ExecutionScope::open(self.provider.as_ref(), &self.text, self.kind, &self.parameters)?;
        let reader = scope.command_mut()?.execute_reader()?;
        scope.set_reader(reader);
        Ok(scope)
    }
}

enum RowState {
    Pending(PendingReader),
    Open(ExecutionScope),
    Finished,
}

/// Lazy, single-pass sequence of mapped rows.
///
/// Nothing is opened until the first `next`; each call then pulls one row from the reader.
/// Reader, command and connection are released when the rows run out, when opening, a read
/// or the mapper fails, or when the iterator is dropped early. After that the iterator only
/// returns `None`.
pub struct RowIter<T, F> {
    state: RowState,
    mapper: F,
    rows: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F> RowIter<T, F>
where
    F: FnMut(&RowAdapter<'_>) -> Result<T, SqlConduitError>,
{
    pub(crate) fn new(pending: PendingReader, mapper: F) -> Self {
        Self {
            state: RowState::Pending(pending),
            mapper,
            rows: 0,
            _marker: PhantomData,
        }
    }

    /// Rows produced so far.
    #[must_use]
    pub fn rows_read(&self) -> usize {
        self.rows
    }

    fn finish(&mut self) {
        if let RowState::Open(mut scope) = std::mem::replace(&mut self.state, RowState::Finished)
        {
            tracing::debug!(rows = self.rows, "row sequence finished");
            scope.release();
        }
    }

    fn step(&mut self) -> Result<Option<T>, SqlConduitError> {
        if let RowState::Pending(_) = self.state {
            let RowState::Pending(pending) =
                std::mem::replace(&mut self.state, RowState::Finished)
            else {
                return Ok(None);
            };
            self.state = RowState::Open(pending.open()?);
        }
        let RowState::Open(scope) = &mut self.state else {
            return Ok(None);
        };
        let Some(reader) = scope.reader() else {
            return Ok(None);
        };
        if reader.read()? {
            let row = RowAdapter::new(&*reader);
            (self.mapper)(&row).map(Some)
        } else {
            Ok(None)
        }
    }
}

impl<T, F> Iterator for RowIter<T, F>
where
    F: FnMut(&RowAdapter<'_>) -> Result<T, SqlConduitError>,
{
    type Item = Result<T, SqlConduitError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let RowState::Finished = self.state {
            return None;
        }
        match self.step() {
            Ok(Some(item)) => {
                self.rows += 1;
                tracing::trace!(row = self.rows, "row mapped");
                Some(Ok(item))
            }
            Ok(None) => {
                self.finish();
                None
            }
            Err(err) => {
                self.finish();
                Some(Err(err))
            }
        }
    }
}

impl<T, F> std::iter::FusedIterator for RowIter<T, F> where
    F: FnMut(&RowAdapter<'_>) -> Result<T, SqlConduitError>
{
}
