//! Artifact sink capability.
//!
//! Engines hand side tables (bin edges, flagged rows) to an optional sink and
//! record whatever location string it returns. Where and how the tables are
//! stored is entirely up to the implementation; this crate ships only an
//! in-memory sink.

use crate::error::Result;
use polars::prelude::DataFrame;

/// Somewhere to put side tables produced during a call.
pub trait ArtifactSink {
    /// Persists `table` under `name` and returns its location.
    ///
    /// # Errors
    ///
    /// Implementations return [`crate::error::DriftwatchError::Artifact`] (or
    /// `Io`) when the table cannot be stored.
    fn persist(&mut self, table: &DataFrame, name: &str) -> Result<String>;
}

/// Keeps persisted tables in memory, in insertion order.
#[derive(Debug, Default)]
pub struct MemorySink {
    tables: Vec<(String, DataFrame)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently persisted table called `name`.
    pub fn get(&self, name: &str) -> Option<&DataFrame> {
        self.tables
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, df)| df)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tables.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl ArtifactSink for MemorySink {
    fn persist(&mut self, table: &DataFrame, name: &str) -> Result<String> {
        tracing::debug!(name, rows = table.height(), "Persisting artifact in memory");
        self.tables.push((name.to_owned(), table.clone()));
        Ok(format!("memory://{name}"))
    }
}
