use std::borrow::Cow;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::SqlConduitError;

mod named;
mod parsers;
mod positional;
mod scanner;

pub use named::NamedDialect;
pub use positional::PositionalDialect;

/// Location of one placeholder inside SQL text, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterMatch {
    pub start: usize,
    pub len: usize,
}

impl ParameterMatch {
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// A parameter-placeholder convention and its matching, extraction and rewriting rules.
///
/// Placeholders inside quoted literals and comments are never reported.
pub trait ParameterDialect {
    /// Parameter names referenced by `sql`, in order, each with a leading `@`.
    fn find_parameter_names(&self, sql: &str) -> Vec<String>;

    /// First placeholder of this dialect at or after byte offset `from`.
    fn next_parameter_match_from(&self, sql: &str, from: usize) -> Option<ParameterMatch>;

    /// The placeholder this dialect emits for the `ordinal`-th rewritten parameter.
    fn placeholder(&self, ordinal: usize) -> String;

    /// First placeholder of this dialect in `sql`.
    fn next_parameter_match(&self, sql: &str) -> Option<ParameterMatch> {
        self.next_parameter_match_from(sql, 0)
    }

    /// Rewrite every placeholder recognised by `source` into this dialect's syntax.
    ///
    /// Named targets number their placeholders `@p0`, `@p1`, ...; positional targets emit `?`.
    /// Scanning resumes after each inserted placeholder, so rewriting a dialect into itself
    /// terminates.
    ///
    /// # Errors
    /// Returns `SqlConduitError::InvalidArgument` if `sql` is empty or blank.
    fn replace_parameter_syntax(
        &self,
        sql: &str,
        source: &dyn ParameterDialect,
    ) -> Result<String, SqlConduitError> {
        if sql.trim().is_empty() {
            return Err(SqlConduitError::invalid_argument(
                "sql text is required for placeholder rewriting",
            ));
        }

        let mut text = sql.to_string();
        let mut cursor = 0;
        let mut ordinal = 0;
        while let Some(found) = source.next_parameter_match_from(&text, cursor) {
            let replacement = self.placeholder(ordinal);
            text.replace_range(found.start..found.end(), &replacement);
            cursor = found.start + replacement.len();
            ordinal += 1;
        }
        Ok(text.trim().to_string())
    }
}

/// The placeholder dialects this crate understands.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize,
)]
pub enum DialectKind {
    /// `@name` placeholders.
    #[default]
    Named,
    /// `?` placeholders.
    Positional,
}

impl DialectKind {
    #[must_use]
    pub fn dialect(self) -> &'static dyn ParameterDialect {
        match self {
            DialectKind::Named => &NamedDialect,
            DialectKind::Positional => &PositionalDialect,
        }
    }

    #[must_use]
    pub fn other(self) -> DialectKind {
        match self {
            DialectKind::Named => DialectKind::Positional,
            DialectKind::Positional => DialectKind::Named,
        }
    }
}

/// How to resolve translation for a call relative to the data source default.
///
/// # Examples
/// ```rust
/// use sql_conduit::prelude::*;
///
/// let options = QueryOptions::default()
///     .with_translation(TranslationMode::ForceOn);
/// # let _ = options;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranslationMode {
    /// Follow the data source's default setting.
    #[default]
    SourceDefault,
    /// Force translation on, regardless of the data source default.
    ForceOn,
    /// Force translation off, regardless of the data source default.
    ForceOff,
}

impl TranslationMode {
    #[must_use]
    pub fn resolve(self, source_default: bool) -> bool {
        match self {
            TranslationMode::SourceDefault => source_default,
            TranslationMode::ForceOn => true,
            TranslationMode::ForceOff => false,
        }
    }
}

/// Per-call options for statement execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryOptions {
    pub translation: TranslationMode,
}

impl QueryOptions {
    #[must_use]
    pub fn with_translation(mut self, translation: TranslationMode) -> Self {
        self.translation = translation;
        self
    }
}

/// Rewrite `sql` from `source` placeholders into `target` placeholders.
///
/// Returns a borrowed `Cow` when translation is disabled or nothing matched.
///
/// # Errors
/// Returns `SqlConduitError::InvalidArgument` if translation is enabled and `sql` is blank.
pub fn translate_placeholders(
    sql: &str,
    source: DialectKind,
    target: DialectKind,
    enabled: bool,
) -> Result<Cow<'_, str>, SqlConduitError> {
    if !enabled || source == target {
        return Ok(Cow::Borrowed(sql));
    }
    if source.dialect().next_parameter_match(sql).is_none() {
        return Ok(Cow::Borrowed(sql));
    }
    if source == DialectKind::Positional {
        reject_numbered_placeholders(sql)?;
    }
    target
        .dialect()
        .replace_parameter_syntax(sql, source.dialect())
        .map(Cow::Owned)
}

/// `?1`-style placeholders carry their own binding order, which rewriting would lose.
fn reject_numbered_placeholders(sql: &str) -> Result<(), SqlConduitError> {
    let mut cursor = 0;
    while let Some(found) = PositionalDialect.next_parameter_match_from(sql, cursor) {
        if sql[found.end()..].starts_with(|c: char| c.is_ascii_digit()) {
            return Err(SqlConduitError::invalid_argument(format!(
                "numbered placeholder at byte {} cannot be translated",
                found.start
            )));
        }
        cursor = found.end();
    }
    Ok(())
}
