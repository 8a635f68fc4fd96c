//! Named, read-only views over a `polars` [`DataFrame`].
//!
//! A [`Snapshot`] is one instance of a tabular dataset at a point in time. The
//! engines in this crate only ever read from it: values are copied out into
//! plain vectors before any statistic is computed.
//!
//! Columns are classified into two kinds:
//!
//! - **Numeric**: any numeric dtype, plus booleans (read as `0.0`/`1.0`)
//! - **Categorical**: everything else, read through a cast to `String`
//!
//! Nulls and floating-point `NaN` both count as missing entries.

use crate::error::{Result, ResultExt as _};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::collections::BTreeMap;

/// Column classification used to pick a statistic path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl ColumnKind {
    pub fn of(dtype: &DataType) -> Self {
        if dtype.is_primitive_numeric() || dtype.is_bool() {
            Self::Numeric
        } else {
            Self::Categorical
        }
    }
}

/// Values of one column copied out of a snapshot.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

impl ColumnData {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Numeric(_) => ColumnKind::Numeric,
            Self::Categorical(_) => ColumnKind::Categorical,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(v) => v.len(),
            Self::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Non-missing numeric values; empty for categorical data.
    pub fn present_numbers(&self) -> Vec<f64> {
        match self {
            Self::Numeric(v) => v.iter().flatten().copied().collect(),
            Self::Categorical(_) => Vec::new(),
        }
    }

    /// Non-missing values rendered as category labels.
    pub fn present_categories(&self) -> Vec<String> {
        match self {
            Self::Numeric(v) => v.iter().flatten().map(ToString::to_string).collect(),
            Self::Categorical(v) => v.iter().flatten().cloned().collect(),
        }
    }
}

/// An immutable named table.
#[derive(Clone, Debug)]
pub struct Snapshot {
    name: String,
    frame: DataFrame,
    meta: BTreeMap<String, serde_json::Value>,
}

impl Snapshot {
    pub fn new(name: impl Into<String>, frame: DataFrame) -> Self {
        Self {
            name: name.into(),
            frame,
            meta: BTreeMap::new(),
        }
    }

    /// Builds a snapshot from columns of equal length.
    ///
    /// # Errors
    ///
    /// Returns error if the columns differ in length or share a name.
    pub fn from_columns(name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        let frame = DataFrame::new(columns)?;
        Ok(Self::new(name, frame))
    }

    /// Attaches a free-form metadata entry (source system, load time, ...).
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn meta(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.meta
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    /// # Errors
    ///
    /// Returns error if the column does not exist.
    pub fn column_kind(&self, name: &str) -> Result<ColumnKind> {
        let col = self
            .frame
            .column(name)
            .with_context(|| format!("Column '{name}' not found in snapshot '{}'", self.name))?;
        Ok(ColumnKind::of(col.dtype()))
    }

    /// Names of all numeric columns, in frame order.
    pub fn numeric_column_names(&self) -> Vec<String> {
        self.frame
            .get_columns()
            .iter()
            .filter(|c| ColumnKind::of(c.dtype()) == ColumnKind::Numeric)
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Copies a column out according to its kind.
    ///
    /// # Errors
    ///
    /// Returns error if the column does not exist or cannot be cast.
    pub fn column(&self, name: &str) -> Result<ColumnData> {
        match self.column_kind(name)? {
            ColumnKind::Numeric => self.numeric_values(name).map(ColumnData::Numeric),
            ColumnKind::Categorical => self.category_values(name).map(ColumnData::Categorical),
        }
    }

    /// Reads a column as `f64`, mapping nulls and `NaN` to `None`.
    ///
    /// # Errors
    ///
    /// Returns error if the column does not exist or cannot be cast to `f64`.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let series = self
            .frame
            .column(name)
            .with_context(|| format!("Column '{name}' not found in snapshot '{}'", self.name))?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        let ca = series.f64()?;
        Ok(ca
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect())
    }

    /// Reads any column as category labels.
    ///
    /// # Errors
    ///
    /// Returns error if the column does not exist or cannot be cast to a string.
    pub fn category_values(&self, name: &str) -> Result<Vec<Option<String>>> {
        let series = self
            .frame
            .column(name)
            .with_context(|| format!("Column '{name}' not found in snapshot '{}'", self.name))?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let ca = series.str()?;
        Ok(ca.into_iter().map(|v| v.map(str::to_owned)).collect())
    }

    /// Short content-independent identity: SHA-256 over the column names and
    /// row count, first 16 hex characters.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for name in self.column_names() {
            hasher.update(name.as_bytes());
            hasher.update([0x1f]);
        }
        hasher.update(self.height().to_string().as_bytes());
        let hash = format!("{:x}", hasher.finalize());
        hash.chars().take(16).collect()
    }
}
