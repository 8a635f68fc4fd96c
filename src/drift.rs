//! Drift of a current snapshot from a reference, and drift over time.
//!
//! [`measure_drift`] is a comparison read as drift: every `dq.represent.*`
//! record is re-emitted under `dq.drift.*` with the value untouched, and the
//! dataset aggregate is additionally exposed as `dq.drift.aggregate`.
//!
//! [`measure_drift_history`] walks an ordered series of snapshots and
//! compares each one against its predecessor. It emits, in order:
//!
//! 1. `dq.drift.history.steps`: number of consecutive pairs
//! 2. `dq.drift.psi.aggregate.step_<i>` for `i` in `1..N`
//! 3. `dq.drift.psi.<col>` for the last step only
//! 4. `dq.drift.psi.trend`: last minus first non-`NaN` step aggregate, only
//!    when at least two step aggregates are not `NaN`

use crate::compare::compare;
use crate::config::{ComparisonOptions, HistoryOptions};
use crate::error::Result;
use crate::metrics::{
    ComparisonResult, MetricId, MetricLevel, MetricRecord, MetricTarget, Namespace, Statistic,
};
use crate::sink::ArtifactSink;
use crate::snapshot::Snapshot;
use crate::stats::trend;

const AGGREGATE_PSI: MetricId = MetricId::Aggregate {
    namespace: Namespace::Drift,
    statistic: Statistic::Psi,
};

/// Re-labels a comparison into the drift namespace.
///
/// Record order and values are preserved. If the comparison carried a PSI
/// aggregate, a copy is appended as `dq.drift.aggregate`.
pub fn relabel_as_drift(comparison: ComparisonResult) -> ComparisonResult {
    let ComparisonResult {
        records,
        artifacts,
        mut meta,
    } = comparison;

    let mut records: Vec<MetricRecord> = records.into_iter().map(MetricRecord::into_drift).collect();
    if let Some(aggregate) = records.iter().find(|r| r.id == AGGREGATE_PSI).cloned() {
        records.push(MetricRecord {
            id: MetricId::DriftAggregate,
            ..aggregate
        });
    }

    if let Some(left) = meta.get("left").cloned() {
        meta.insert("current".to_owned(), left);
    }
    if let Some(right) = meta.get("right").cloned() {
        meta.insert("reference".to_owned(), right);
    }

    ComparisonResult {
        records,
        artifacts,
        meta,
    }
}

/// Measures drift of `current` from `reference`.
///
/// # Errors
///
/// Same conditions as [`compare`].
pub fn measure_drift(
    current: &Snapshot,
    reference: &Snapshot,
    options: &ComparisonOptions,
    sink: Option<&mut dyn ArtifactSink>,
) -> Result<ComparisonResult> {
    tracing::info!(
        current = current.name(),
        reference = reference.name(),
        "Measuring drift"
    );
    compare(current, reference, options, sink).map(relabel_as_drift)
}

/// Tracks PSI drift across consecutive snapshots (oldest first).
///
/// Fewer than two snapshots yield only the step count record (`0`).
///
/// # Errors
///
/// Returns error if any pairwise comparison fails.
pub fn measure_drift_history(
    snapshots: &[Snapshot],
    options: &HistoryOptions,
) -> Result<ComparisonResult> {
    let steps = snapshots.len().saturating_sub(1);
    tracing::info!(snapshots = snapshots.len(), steps, "Tracking drift history");

    let mut result = ComparisonResult::new();
    result.push(MetricRecord::new(
        MetricId::HistorySteps,
        MetricLevel::Dataset,
        MetricTarget::All,
        steps,
    ));
    result
        .meta
        .insert("n_snapshots".to_owned(), snapshots.len().into());

    if steps == 0 {
        return Ok(result);
    }

    let comparison = options.comparison();
    let mut step_values = Vec::with_capacity(steps);
    let mut last = None;

    for (i, pair) in snapshots.windows(2).enumerate() {
        let [previous, current] = pair else {
            continue;
        };
        let step = i + 1;
        let rep = compare(current, previous, &comparison, None)?;

        let value = rep
            .find(&MetricId::Aggregate {
                namespace: Namespace::Represent,
                statistic: Statistic::Psi,
            })
            .and_then(MetricRecord::as_f64)
            .unwrap_or(f64::NAN);
        tracing::debug!(step, from = previous.name(), to = current.name(), psi = value, "History step");
        step_values.push(value);

        result.push(
            MetricRecord::new(
                MetricId::StepAggregate {
                    statistic: Statistic::Psi,
                    step,
                },
                MetricLevel::Dataset,
                MetricTarget::Label(format!("{}->{}", previous.name(), current.name())),
                value,
            )
            .with_meta("step", step)
            .with_meta("from", previous.name())
            .with_meta("to", current.name()),
        );
        last = Some(rep);
    }

    if let Some(rep) = last {
        result.records.extend(
            rep.records
                .into_iter()
                .filter(|r| {
                    matches!(
                        r.id,
                        MetricId::Column {
                            statistic: Statistic::Psi,
                            ..
                        }
                    )
                })
                .map(MetricRecord::into_drift),
        );
    }

    match trend(&step_values) {
        Some(delta) => {
            result.push(
                MetricRecord::new(
                    MetricId::Trend {
                        statistic: Statistic::Psi,
                    },
                    MetricLevel::Dataset,
                    MetricTarget::All,
                    delta,
                )
                .with_meta("steps", steps),
            );
            tracing::info!(trend = delta, "Drift history complete");
        }
        None => tracing::info!("Drift history complete; fewer than two valid steps, no trend"),
    }
    Ok(result)
}
