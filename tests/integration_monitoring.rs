//! Integration tests for the monitoring workflow
//!
//! These tests drive the public API the way a monitoring job would: build
//! snapshots, run comparisons, drift history and outlier scoring, and check the
//! emitted records end to end.

use anyhow::Result;
use driftwatch::anomaly::{MultivariateScorer, score_outliers};
use driftwatch::compare::compare;
use driftwatch::config::{
    ComparisonOptions, HistoryOptions, MonitorSettings, OutlierMode, OutlierOptions,
    load_settings, save_settings,
};
use driftwatch::drift::{measure_drift, measure_drift_history};
use driftwatch::error::DriftwatchError;
use driftwatch::metrics::MetricLevel;
use driftwatch::sink::MemorySink;
use driftwatch::snapshot::Snapshot;
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use proptest::prelude::*;

/// Deterministic "customer" snapshot; `shift` moves the numeric column and
/// skews the plan mix towards "pro".
fn customers(name: &str, rows: usize, shift: f64) -> Result<Snapshot> {
    let spend: Vec<f64> = (0..rows)
        .map(|i| ((i * 37) % 100) as f64 + shift)
        .collect();
    let plan: Vec<&str> = (0..rows)
        .map(|i| {
            let cut = if shift > 0.0 { 2 } else { 4 };
            if i % 5 < cut { "basic" } else { "pro" }
        })
        .collect();
    Ok(Snapshot::from_columns(
        name,
        vec![
            Column::from(Series::new("spend".into(), spend)),
            Column::from(Series::new("plan".into(), plan)),
        ],
    )?)
}

#[test]
fn test_drift_end_to_end() -> Result<()> {
    let reference = customers("2024-01", 200, 0.0)?;
    let current = customers("2024-02", 200, 25.0)?;
    let mut sink = MemorySink::new();

    let rep = measure_drift(
        &current,
        &reference,
        &ComparisonOptions::default(),
        Some(&mut sink),
    )?;

    for id in [
        "dq.drift.psi.spend",
        "dq.drift.ks.spend",
        "dq.drift.psi.plan",
        "dq.drift.psi.aggregate",
        "dq.drift.aggregate",
    ] {
        assert!(
            rep.value(id).is_some_and(|v| v > 0.0),
            "{id} should report positive drift"
        );
    }
    assert!(rep.get("dq.drift.ks.plan").is_none(), "No KS for categorical");
    assert!(rep.records.iter().all(|r| !r.id.to_string().starts_with("dq.represent.")));

    let psi_spend = rep.value("dq.drift.psi.spend").unwrap_or(f64::NAN);
    let psi_plan = rep.value("dq.drift.psi.plan").unwrap_or(f64::NAN);
    let aggregate = rep.value("dq.drift.psi.aggregate").unwrap_or(f64::NAN);
    assert!((aggregate - (psi_spend + psi_plan) / 2.0).abs() < 1e-12);

    assert_eq!(sink.names(), vec!["spend_bins"]);
    assert!(rep.artifacts.contains_key("artifact.represent.spend.bins"));

    let json: serde_json::Value = serde_json::from_str(&rep.to_json()?)?;
    assert_eq!(json.as_array().map(Vec::len), Some(rep.len()));
    Ok(())
}

#[test]
fn test_compare_is_stable_for_identical_snapshots() -> Result<()> {
    let a = customers("a", 120, 0.0)?;
    let b = customers("b", 120, 0.0)?;

    let rep = compare(&a, &b, &ComparisonOptions::default(), None)?;
    for (id, value) in rep.numeric_values() {
        assert!(value.abs() < 1e-9, "{id} should be ~0, got {value}");
    }
    assert_eq!(
        rep.records
            .iter()
            .filter(|r| r.level == MetricLevel::Dataset)
            .count(),
        1
    );
    Ok(())
}

#[test]
fn test_history_last_step_matches_direct_drift() -> Result<()> {
    let history = [
        customers("w1", 150, 0.0)?,
        customers("w2", 150, 0.0)?,
        customers("w3", 150, 10.0)?,
        customers("w4", 150, 40.0)?,
    ];
    let options = HistoryOptions::default();
    let rep = measure_drift_history(&history, &options)?;

    assert_eq!(rep.value("dq.drift.history.steps"), Some(3.0));
    let steps: Vec<f64> = (1..=3)
        .filter_map(|i| rep.value(&format!("dq.drift.psi.aggregate.step_{i}")))
        .collect();
    let (Some(&first), Some(&last)) = (steps.first(), steps.last()) else {
        panic!("expected three step aggregates, got {steps:?}");
    };
    assert_eq!(steps.len(), 3);
    assert!(first < last);

    let [.., previous, current] = &history;
    let direct = measure_drift(current, previous, &options.comparison(), None)?;
    assert_eq!(
        rep.value("dq.drift.psi.aggregate.step_3"),
        direct.value("dq.drift.psi.aggregate")
    );
    assert_eq!(rep.value("dq.drift.psi.spend"), direct.value("dq.drift.psi.spend"));
    assert_eq!(rep.value("dq.drift.psi.plan"), direct.value("dq.drift.psi.plan"));
    assert_eq!(rep.value("dq.drift.psi.trend"), Some(last - first));
    Ok(())
}

/// 200 rows with every 20th row pushed far out: 5% contamination.
fn with_injected_outliers() -> Result<Snapshot> {
    let x: Vec<f64> = (0..200)
        .map(|i| {
            if i % 20 == 0 {
                1_000.0
            } else {
                ((i * 37) % 100) as f64 / 10.0
            }
        })
        .collect();
    let y: Vec<f64> = (0..200).map(|i| ((i * 13) % 50) as f64).collect();
    Ok(Snapshot::from_columns(
        "injected",
        vec![
            Column::from(Series::new("x".into(), x)),
            Column::from(Series::new("y".into(), y)),
        ],
    )?)
}

#[test]
fn test_auto_mode_recovers_injected_outliers() -> Result<()> {
    let snap = with_injected_outliers()?;
    let mut sink = MemorySink::new();
    let opts = OutlierOptions::default().with_contamination(0.05);

    let out = score_outliers(&snap, &opts, None, Some(&mut sink))?;

    let expected: Vec<usize> = (0..200).step_by(20).collect();
    assert_eq!(out.flagged_rows, expected);
    assert!((out.rate() - 0.05).abs() < 1e-12);

    let rows = sink.get("injected__anomalies");
    assert_eq!(rows.map(DataFrame::height), Some(10));
    let index = rows
        .map(|df| df.column("row_index").map(|c| c.len()))
        .transpose()?;
    assert_eq!(index, Some(10));
    Ok(())
}

/// Negative distance to the fitted column means: nearer is more normal.
#[derive(Default)]
struct CentroidScorer {
    centroid: Option<Array1<f64>>,
}

impl MultivariateScorer for CentroidScorer {
    fn fit(&mut self, x: &Array2<f64>) -> driftwatch::error::Result<()> {
        self.centroid = x.mean_axis(Axis(0));
        Ok(())
    }

    fn score(&self, x: &Array2<f64>) -> driftwatch::error::Result<Array1<f64>> {
        let centroid = self
            .centroid
            .as_ref()
            .ok_or_else(|| DriftwatchError::Model("score called before fit".to_owned()))?;
        Ok(x.outer_iter()
            .map(|row| -(&row - centroid).mapv(|d| d * d).sum().sqrt())
            .collect())
    }
}

#[test]
fn test_model_mode_uses_supplied_scorer() -> Result<()> {
    let snap = with_injected_outliers()?;
    let mut model = CentroidScorer::default();
    let opts = OutlierOptions::default()
        .with_mode(OutlierMode::Model)
        .with_contamination(0.05);

    let out = score_outliers(&snap, &opts, Some(&mut model), None)?;

    assert!(model.centroid.is_some(), "fit should run before score");
    assert!(out.row_scores.iter().all(|s| (0.0..=1.0).contains(s)));
    assert!(out.flagged_rows.iter().all(|i| i % 20 == 0));
    assert!(out.result.get("dq.anomaly.score.x").is_none(), "Per-column scores are auto-only");
    assert_eq!(out.result.meta.get("method"), Some(&"model".into()));
    Ok(())
}

#[test]
fn test_model_mode_without_model_fails_fast() -> Result<()> {
    let snap = with_injected_outliers()?;
    let opts = OutlierOptions::default().with_mode(OutlierMode::Model);
    let err = score_outliers(&snap, &opts, None, None);
    assert!(matches!(err, Err(DriftwatchError::Config(_))));
    Ok(())
}

#[test]
fn test_settings_drive_every_engine() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("monitor.json");
    let settings = MonitorSettings {
        bins: 5,
        features: Some(vec!["spend".to_owned()]),
        contamination: 0.05,
        ..MonitorSettings::default()
    };
    save_settings(&path, &settings)?;
    let settings = load_settings(&path)?;

    let a = customers("a", 100, 0.0)?;
    let b = customers("b", 100, 5.0)?;
    let rep = compare(&b, &a, &settings.comparison_options(), None)?;
    assert!(rep.get("dq.represent.psi.plan").is_none());
    let bins = rep
        .get("dq.represent.psi.spend")
        .and_then(|r| r.metadata.get("bins"))
        .and_then(|v| v.as_f64());
    assert_eq!(bins, Some(5.0));

    let history = measure_drift_history(&[a, b], &settings.history_options())?;
    assert!(history.get("dq.drift.ks.spend").is_none());

    let out = score_outliers(&with_injected_outliers()?, &settings.outlier_options(), None, None)?;
    assert_eq!(out.flagged_rows.len(), 10);
    Ok(())
}

proptest! {
    #[test]
    fn prop_row_scores_lie_in_unit_interval(
        values in prop::collection::vec(-1e6_f64..1e6, 1..60),
        contamination in 0.001_f64..=1.0,
    ) {
        let snap = Snapshot::from_columns(
            "prop",
            vec![Column::from(Series::new("v".into(), values.clone()))],
        ).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let opts = OutlierOptions::default().with_contamination(contamination);
        let out = score_outliers(&snap, &opts, None, None)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert_eq!(out.row_scores.len(), values.len());
        prop_assert!(out.row_scores.iter().all(|s| (0.0..=1.0).contains(s)));
        prop_assert!((0.0..=1.0).contains(&out.rate()));
    }
}
