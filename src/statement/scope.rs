use crate::error::SqlConduitError;
use crate::params::DbParameter;
use crate::provider::{DataReader, DbCommand, DbConnection, DbProvider};
use crate::types::CommandKind;

/// Resources held by one execution, released reader → command → connection.
///
/// Release happens exactly once: explicitly via [`ExecutionScope::release`], or on drop.
pub(crate) struct ExecutionScope {
    connection: Option<Box<dyn DbConnection>>,
    command: Option<Box<dyn DbCommand>>,
    reader: Option<Box<dyn DataReader>>,
}

impl ExecutionScope {
    pub(crate) fn new(connection: Box<dyn DbConnection>) -> Self {
        Self {
            connection: Some(connection),
            command: None,
            reader: None,
        }
    }

    /// Create and open a connection, then create the command on it.
    pub(crate) fn open(
        provider: &dyn DbProvider,
        text: &str,
        kind: CommandKind,
        parameters: &[DbParameter],
    ) -> Result<Self, SqlConduitError> {
        let mut scope = Self::new(provider.create_connection()?);
        scope.connection_mut()?.open()?;
        tracing::debug!(
            command = %text,
            kind = ?kind,
            parameters = parameters.len(),
            "executing command"
        );
        let command = scope
            .connection_mut()?
            .create_command(text, kind, parameters)?;
        scope.set_command(command);
        Ok(scope)
    }

    pub(crate) fn connection_mut(
        &mut self,
    ) -> Result<&mut (dyn DbConnection + 'static), SqlConduitError> {
        self.connection
            .as_deref_mut()
            .ok_or_else(|| released("connection"))
    }

    pub(crate) fn set_command(&mut self, command: Box<dyn DbCommand>) {
        self.command = Some(command);
    }

    pub(crate) fn command_mut(
        &mut self,
    ) -> Result<&mut (dyn DbCommand + 'static), SqlConduitError> {
        self.command.as_deref_mut().ok_or_else(|| released("command"))
    }

    /// Hand the command to a collaborator that closes it itself.
    pub(crate) fn take_command(&mut self) -> Result<Box<dyn DbCommand>, SqlConduitError> {
        self.command.take().ok_or_else(|| released("command"))
    }

    pub(crate) fn set_reader(&mut self, reader: Box<dyn DataReader>) {
        self.reader = Some(reader);
    }

    pub(crate) fn reader(&mut self) -> Option<&mut (dyn DataReader + 'static)> {
        self.reader.as_deref_mut()
    }

    pub(crate) fn release(&mut self) {
        if let Some(mut reader) = self.reader.take() {
            reader.close();
        }
        if let Some(mut command) = self.command.take() {
            command.close();
        }
        if let Some(mut connection) = self.connection.take() {
            connection.close();
            tracing::debug!("execution resources released");
        }
    }
}

impl Drop for ExecutionScope {
    fn drop(&mut self) {
        self.release();
    }
}

fn released(what: &str) -> SqlConduitError {
    SqlConduitError::ExecutionError(format!("{what} already released"))
}
