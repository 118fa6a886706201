//! Shared name → SQL mapping owned by a data source.
//!
//! Every operation takes a blocking `RwLock`; nothing runs unprotected under contention.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use walkdir::WalkDir;

use crate::error::SqlConduitError;
use crate::guard::{read_guard, write_guard};

/// A query definition addressable by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedQuery {
    pub name: String,
    pub sql: String,
}

impl NamedQuery {
    #[must_use]
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }

    pub fn set_sql(&mut self, sql: impl Into<String>) {
        self.sql = sql.into();
    }
}

/// Thread-safe registry of named queries. Registering an existing name replaces its SQL.
#[derive(Debug, Default)]
pub struct QueryRegistry {
    entries: RwLock<HashMap<String, String>>,
}

impl QueryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Returns `SqlConduitError::InvalidArgument` if `name` is empty.
    pub fn register(&self, name: &str, sql: &str) -> Result<(), SqlConduitError> {
        if name.is_empty() {
            return Err(SqlConduitError::invalid_argument(
                "query name must not be empty",
            ));
        }
        let replaced = write_guard(&self.entries, "query registry")
            .insert(name.to_string(), sql.to_string())
            .is_some();
        tracing::debug!(name, replaced, "registered query");
        Ok(())
    }

    /// # Errors
    /// Returns `SqlConduitError::InvalidArgument` if the query's name is empty.
    pub fn register_query(&self, query: NamedQuery) -> Result<(), SqlConduitError> {
        self.register(&query.name, &query.sql)
    }

    /// Register every query `extractor` produces from `sources`.
    ///
    /// # Errors
    /// Propagates the first extractor error; queries from earlier sources stay registered.
    pub fn register_sources<S, E, I>(
        &self,
        sources: impl IntoIterator<Item = S>,
        extractor: E,
    ) -> Result<usize, SqlConduitError>
    where
        E: FnMut(&S) -> Result<I, SqlConduitError>,
        I: IntoIterator<Item = NamedQuery>,
    {
        self.register_selected_sources(sources, |_| true, extractor)
    }

    /// Like [`QueryRegistry::register_sources`], skipping sources `selector` rejects.
    ///
    /// # Errors
    /// Propagates the first extractor error; queries from earlier sources stay registered.
    /// Returns `SqlConduitError::InvalidArgument` if an extracted query has an empty name.
    pub fn register_selected_sources<S, P, E, I>(
        &self,
        sources: impl IntoIterator<Item = S>,
        selector: P,
        mut extractor: E,
    ) -> Result<usize, SqlConduitError>
    where
        P: Fn(&S) -> bool,
        E: FnMut(&S) -> Result<I, SqlConduitError>,
        I: IntoIterator<Item = NamedQuery>,
    {
        let mut registered = 0;
        for source in sources {
            if !selector(&source) {
                continue;
            }
            // Extraction may do I/O; only the inserts happen under the lock.
            let queries: Vec<NamedQuery> = extractor(&source)?.into_iter().collect();
            if queries.iter().any(|q| q.name.is_empty()) {
                return Err(SqlConduitError::invalid_argument(
                    "extracted query has an empty name",
                ));
            }
            let mut entries = write_guard(&self.entries, "query registry");
            for query in queries {
                entries.insert(query.name, query.sql);
                registered += 1;
            }
        }
        tracing::debug!(registered, "bulk registered queries");
        Ok(registered)
    }

    /// Recursively load every file under `dir` whose extension is `extension`.
    ///
    /// The file's base name (extension stripped) is the key; its full contents are the SQL.
    ///
    /// # Errors
    /// Returns `SqlConduitError::IoError` if the directory cannot be walked or a file read.
    pub fn load_directory(
        &self,
        dir: impl AsRef<Path>,
        extension: &str,
    ) -> Result<usize, SqlConduitError> {
        let extension = extension.trim_start_matches('.');
        let mut files = Vec::new();
        collect_query_files(dir.as_ref(), extension, &mut files)?;
        files.sort();
        self.register_sources(files, |path: &PathBuf| {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                return Ok(Vec::new());
            };
            let sql = fs::read_to_string(path)?;
            Ok(vec![NamedQuery::new(stem, sql)])
        })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        read_guard(&self.entries, "query registry").contains_key(name)
    }

    /// # Errors
    /// Returns `SqlConduitError::NotFound` if no query is registered under `name`.
    pub fn find(&self, name: &str) -> Result<String, SqlConduitError> {
        read_guard(&self.entries, "query registry")
            .get(name)
            .cloned()
            .ok_or_else(|| SqlConduitError::NotFound(format!("query {name:?}")))
    }

    /// Remove a query. Removing an absent name is an error, not a no-op.
    ///
    /// # Errors
    /// Returns `SqlConduitError::NotFound` if no query is registered under `name`.
    pub fn remove(&self, name: &str) -> Result<(), SqlConduitError> {
        write_guard(&self.entries, "query registry")
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| SqlConduitError::NotFound(format!("query {name:?}")))
    }

    pub fn clear(&self) {
        write_guard(&self.entries, "query registry").clear();
    }

    #[must_use]
    pub fn count(&self) -> usize {
        read_guard(&self.entries, "query registry").len()
    }

    /// Sorted snapshot of the registered names.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = read_guard(&self.entries, "query registry")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

/// Symlinks are not followed, so a linked directory loop is never re-entered.
fn collect_query_files(
    dir: &Path,
    extension: &str,
    out: &mut Vec<PathBuf>,
) -> Result<(), SqlConduitError> {
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        {
            out.push(entry.into_path());
        }
    }
    Ok(())
}
