//! Metric records and the result container produced by every engine call.
//!
//! Record ids are typed ([`MetricId`]) and only rendered to dotted strings at
//! the edge (`Display`/`Serialize`). Downstream consumers group and band
//! records by these prefixes, so the rendered forms are stable:
//!
//! | Id | Level | Emitted by |
//! |---|---|---|
//! | `dq.represent.psi.<col>` / `dq.represent.ks.<col>` | column | `compare` |
//! | `dq.represent.psi.aggregate` | dataset | `compare` |
//! | `dq.drift.psi.<col>` / `dq.drift.ks.<col>` | column | `measure_drift`, history (last step) |
//! | `dq.drift.psi.aggregate` | dataset | `measure_drift` |
//! | `dq.drift.aggregate` | dataset | `measure_drift` |
//! | `dq.drift.history.steps` | dataset | history |
//! | `dq.drift.psi.aggregate.step_<i>` | dataset | history |
//! | `dq.drift.psi.trend` | dataset | history |
//! | `dq.anomaly.rate` / `dq.anomaly.threshold` | dataset | `score_outliers` |
//! | `dq.anomaly.score.<col>` | column | `score_outliers` (auto mode) |

use crate::error::{DriftwatchError, Result};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Version stamped on every record.
pub const METRIC_VERSION: &str = "1.0.0";

/// Statistic namespace of comparison records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    /// Generic candidate-vs-reference comparison.
    Represent,
    /// The same comparison read as drift of a current snapshot from a reference.
    Drift,
}

impl Namespace {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Represent => "represent",
            Self::Drift => "drift",
        }
    }
}

/// Divergence statistic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    /// Population stability index (numeric and categorical columns)
    Psi,
    /// Kolmogorov–Smirnov distance (numeric columns only)
    Ks,
}

impl Statistic {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Psi => "psi",
            Self::Ks => "ks",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Statistic {
    type Err = DriftwatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "psi" => Ok(Self::Psi),
            "ks" => Ok(Self::Ks),
            other => Err(DriftwatchError::Config(format!(
                "Unknown statistic '{other}' (expected 'psi' or 'ks')"
            ))),
        }
    }
}

/// Identity of a metric record.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MetricId {
    /// `dq.<ns>.<stat>.<column>`
    Column {
        namespace: Namespace,
        statistic: Statistic,
        column: String,
    },
    /// `dq.<ns>.<stat>.aggregate`
    Aggregate {
        namespace: Namespace,
        statistic: Statistic,
    },
    /// `dq.drift.aggregate`
    DriftAggregate,
    /// `dq.drift.<stat>.aggregate.step_<step>`
    StepAggregate { statistic: Statistic, step: usize },
    /// `dq.drift.<stat>.trend`
    Trend { statistic: Statistic },
    /// `dq.drift.history.steps`
    HistorySteps,
    /// `dq.anomaly.rate`
    AnomalyRate,
    /// `dq.anomaly.threshold`
    AnomalyThreshold,
    /// `dq.anomaly.score.<column>`
    AnomalyColumnScore { column: String },
}

impl MetricId {
    pub fn column(namespace: Namespace, statistic: Statistic, column: impl Into<String>) -> Self {
        Self::Column {
            namespace,
            statistic,
            column: column.into(),
        }
    }

    /// Moves comparison-namespace ids into the drift namespace.
    ///
    /// Total over all variants: ids outside the comparison namespace are
    /// returned unchanged.
    #[must_use]
    pub fn into_drift(self) -> Self {
        match self {
            Self::Column {
                namespace: Namespace::Represent,
                statistic,
                column,
            } => Self::Column {
                namespace: Namespace::Drift,
                statistic,
                column,
            },
            Self::Aggregate {
                namespace: Namespace::Represent,
                statistic,
            } => Self::Aggregate {
                namespace: Namespace::Drift,
                statistic,
            },
            other => other,
        }
    }

    pub fn namespace(&self) -> Option<Namespace> {
        match self {
            Self::Column { namespace, .. } | Self::Aggregate { namespace, .. } => Some(*namespace),
            Self::DriftAggregate | Self::StepAggregate { .. } | Self::Trend { .. } | Self::HistorySteps => {
                Some(Namespace::Drift)
            }
            Self::AnomalyRate | Self::AnomalyThreshold | Self::AnomalyColumnScore { .. } => None,
        }
    }

    pub fn statistic(&self) -> Option<Statistic> {
        match self {
            Self::Column { statistic, .. }
            | Self::Aggregate { statistic, .. }
            | Self::StepAggregate { statistic, .. }
            | Self::Trend { statistic } => Some(*statistic),
            _ => None,
        }
    }

    /// Column the record is about, for per-column ids.
    pub fn column_name(&self) -> Option<&str> {
        match self {
            Self::Column { column, .. } | Self::AnomalyColumnScore { column } => Some(column),
            _ => None,
        }
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column {
                namespace,
                statistic,
                column,
            } => write!(f, "dq.{}.{statistic}.{column}", namespace.as_str()),
            Self::Aggregate {
                namespace,
                statistic,
            } => write!(f, "dq.{}.{statistic}.aggregate", namespace.as_str()),
            Self::DriftAggregate => f.write_str("dq.drift.aggregate"),
            Self::StepAggregate { statistic, step } => {
                write!(f, "dq.drift.{statistic}.aggregate.step_{step}")
            }
            Self::Trend { statistic } => write!(f, "dq.drift.{statistic}.trend"),
            Self::HistorySteps => f.write_str("dq.drift.history.steps"),
            Self::AnomalyRate => f.write_str("dq.anomaly.rate"),
            Self::AnomalyThreshold => f.write_str("dq.anomaly.threshold"),
            Self::AnomalyColumnScore { column } => write!(f, "dq.anomaly.score.{column}"),
        }
    }
}

impl Serialize for MetricId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Keys of the artifact side channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArtifactKey {
    /// `artifact.represent.<column>.bins`
    BinEdges { column: String },
    /// `artifact.anomaly.rows`
    AnomalyRows,
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BinEdges { column } => write!(f, "artifact.represent.{column}.bins"),
            Self::AnomalyRows => f.write_str("artifact.anomaly.rows"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricLevel {
    Dataset,
    Column,
    Row,
    Segment,
}

/// What a record describes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetricTarget {
    /// Every column (`"*"`).
    All,
    Column(String),
    Columns(Vec<String>),
    /// Free-form label, e.g. `"t1->t2"` for a history step.
    Label(String),
}

impl Serialize for MetricTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_str("*"),
            Self::Column(s) | Self::Label(s) => serializer.serialize_str(s),
            Self::Columns(cols) => cols.serialize(serializer),
        }
    }
}

/// Record payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
    Sequence(Vec<MetricValue>),
    Mapping(BTreeMap<String, MetricValue>),
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<usize> for MetricValue {
    fn from(v: usize) -> Self {
        Self::Number(v as f64)
    }
}

impl From<String> for MetricValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<Vec<String>> for MetricValue {
    fn from(v: Vec<String>) -> Self {
        Self::Sequence(v.into_iter().map(Self::Text).collect())
    }
}

impl From<Vec<f64>> for MetricValue {
    fn from(v: Vec<f64>) -> Self {
        Self::Sequence(v.into_iter().map(Self::Number).collect())
    }
}

/// The atomic output unit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricRecord {
    pub id: MetricId,
    pub level: MetricLevel,
    pub target: MetricTarget,
    pub value: MetricValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Band label slot (good/warn/bad) for an interpretation layer; never set here.
    pub interpretation: Option<String>,
    pub metadata: BTreeMap<String, MetricValue>,
    pub version: String,
}

impl MetricRecord {
    pub fn new(
        id: MetricId,
        level: MetricLevel,
        target: MetricTarget,
        value: impl Into<MetricValue>,
    ) -> Self {
        Self {
            id,
            level,
            target,
            value: value.into(),
            unit: None,
            interpretation: None,
            metadata: BTreeMap::new(),
            version: METRIC_VERSION.to_owned(),
        }
    }

    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.value.as_f64()
    }

    /// Same record under the drift namespace; value and metadata untouched.
    #[must_use]
    pub fn into_drift(self) -> Self {
        Self {
            id: self.id.into_drift(),
            ..self
        }
    }
}

/// Records produced by one engine call plus their side channels.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub records: Vec<MetricRecord>,
    /// Artifact name → location returned by the sink.
    pub artifacts: BTreeMap<String, String>,
    pub meta: BTreeMap<String, MetricValue>,
}

impl ComparisonResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: MetricRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record whose rendered id equals `id`.
    pub fn get(&self, id: &str) -> Option<&MetricRecord> {
        self.records.iter().find(|r| r.id.to_string() == id)
    }

    pub fn find(&self, id: &MetricId) -> Option<&MetricRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// Numeric value of the record with rendered id `id`.
    pub fn value(&self, id: &str) -> Option<f64> {
        self.get(id).and_then(MetricRecord::as_f64)
    }

    /// Rendered id → value for every numeric record, as threshold checks read them.
    pub fn numeric_values(&self) -> BTreeMap<String, f64> {
        self.records
            .iter()
            .filter_map(|r| r.as_f64().map(|v| (r.id.to_string(), v)))
            .collect()
    }

    /// Serializes the records as a JSON array; `NaN` values become `null`.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.records)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_rendering() {
        let psi = MetricId::column(Namespace::Represent, Statistic::Psi, "age");
        assert_eq!(psi.to_string(), "dq.represent.psi.age");
        assert_eq!(
            MetricId::StepAggregate {
                statistic: Statistic::Psi,
                step: 2
            }
            .to_string(),
            "dq.drift.psi.aggregate.step_2"
        );
        assert_eq!(
            MetricId::AnomalyColumnScore {
                column: "fare".to_owned()
            }
            .to_string(),
            "dq.anomaly.score.fare"
        );
        assert_eq!(
            ArtifactKey::BinEdges {
                column: "age".to_owned()
            }
            .to_string(),
            "artifact.represent.age.bins"
        );
    }

    #[test]
    fn test_into_drift_is_total() {
        let ks = MetricId::column(Namespace::Represent, Statistic::Ks, "x").into_drift();
        assert_eq!(ks.to_string(), "dq.drift.ks.x");

        let agg = MetricId::Aggregate {
            namespace: Namespace::Represent,
            statistic: Statistic::Psi,
        };
        assert_eq!(agg.into_drift().to_string(), "dq.drift.psi.aggregate");

        // already drift, or not a comparison id at all
        assert_eq!(MetricId::HistorySteps.into_drift(), MetricId::HistorySteps);
        assert_eq!(MetricId::AnomalyRate.into_drift(), MetricId::AnomalyRate);
    }

    #[test]
    fn test_column_name_with_dots_survives() {
        let id = MetricId::column(Namespace::Drift, Statistic::Psi, "price.usd");
        assert_eq!(id.column_name(), Some("price.usd"));
        assert_eq!(id.statistic(), Some(Statistic::Psi));
    }

    #[test]
    fn test_statistic_parse() {
        assert_eq!("PSI".parse::<Statistic>().ok(), Some(Statistic::Psi));
        assert!("chi2".parse::<Statistic>().is_err());
    }

    #[test]
    fn test_result_lookup_and_json() -> anyhow::Result<()> {
        let mut result = ComparisonResult::new();
        result.push(
            MetricRecord::new(
                MetricId::column(Namespace::Represent, Statistic::Ks, "x"),
                MetricLevel::Column,
                MetricTarget::Column("x".to_owned()),
                f64::NAN,
            )
            .with_meta("reason", "empty sample"),
        );
        result.push(MetricRecord::new(
            MetricId::AnomalyRate,
            MetricLevel::Dataset,
            MetricTarget::All,
            0.25,
        ));

        assert_eq!(result.value("dq.anomaly.rate"), Some(0.25));
        assert!(result.value("dq.represent.ks.x").is_some_and(f64::is_nan));
        assert_eq!(result.numeric_values().len(), 2);

        let json: serde_json::Value = serde_json::from_str(&result.to_json()?)?;
        assert_eq!(json[0]["id"], "dq.represent.ks.x");
        assert!(json[0]["value"].is_null());
        assert_eq!(json[1]["target"], "*");
        assert_eq!(json[1]["version"], METRIC_VERSION);
        Ok(())
    }
}
