//! Integration tests for the align → compute → rank pipeline

use chrono::{DateTime, Duration, TimeZone, Utc};
use kolosal_insight::prelude::*;
use std::collections::BTreeMap;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kolosal_insight=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

fn hours(from: i64, n: i64) -> Vec<Option<DateTime<Utc>>> {
    let origin = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (from..from + n)
        .map(|h| Some(origin + Duration::hours(h)))
        .collect()
}

fn inputs(tables: Vec<LabeledSeriesTable>) -> (BTreeMap<String, LabeledSeriesTable>, BTreeMap<String, String>) {
    let time_columns = tables
        .iter()
        .map(|t| (t.domain().to_string(), "ts".to_string()))
        .collect();
    let tables = tables
        .into_iter()
        .map(|t| (t.domain().to_string(), t))
        .collect();
    (tables, time_columns)
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_weather_economic_scenario() {
    init_tracing();
    let (tables, time_columns) = inputs(vec![
        LabeledSeriesTable::new("weather")
            .with_time_column("ts", hours(0, 3))
            .with_values("temperature", &[10.0, 12.0, 14.0]),
        LabeledSeriesTable::new("economic")
            .with_time_column("ts", hours(0, 3))
            .with_values("stocks", &[100.0, 105.0, 110.0]),
    ]);

    let session = AnalysisSession::new();
    let aligned = session.align(&tables, &time_columns).unwrap();
    assert_eq!(aligned.grid().len(), 3);

    let records = session.compute(&aligned, "weather", "temperature").unwrap();
    assert_eq!(records.len(), 1);
    let r = &records[0];
    assert_eq!(r.label(), "economic.stocks");
    assert!((r.pearson_r.value().unwrap() - 1.0).abs() < 1e-9);
    assert!((r.spearman_r.value().unwrap() - 1.0).abs() < 1e-12);
    assert!(r.mutual_information.value().unwrap() > 0.0);
    assert_eq!(r.n_obs, 3);
}

#[test]
fn test_domain_with_empty_time_column_is_skipped() {
    init_tracing();
    let (tables, time_columns) = inputs(vec![
        LabeledSeriesTable::new("weather")
            .with_time_column("ts", hours(0, 4))
            .with_values("temperature", &[1.0, 2.0, 3.0, 4.0]),
        LabeledSeriesTable::new("social")
            .with_time_column("ts", vec![None; 4])
            .with_values("mentions", &[5.0, 6.0, 7.0, 8.0]),
    ]);

    let aligned = SeriesAligner::new(Frequency::hourly())
        .align(&tables, &time_columns, &OperationLog::new())
        .unwrap();
    assert_eq!(aligned.skipped_domains(), ["social".to_string()]);
    assert!(aligned.table("social").is_none());
    assert_eq!(aligned.domains().collect::<Vec<_>>(), vec!["weather"]);
}

#[test]
fn test_zero_variance_target_yields_undefined_fields() {
    let (tables, time_columns) = inputs(vec![
        LabeledSeriesTable::new("weather")
            .with_time_column("ts", hours(0, 5))
            .with_values("temperature", &[20.0, 20.0, 20.0, 20.0, 20.0]),
        LabeledSeriesTable::new("economic")
            .with_time_column("ts", hours(0, 5))
            .with_values("stocks", &[1.0, 3.0, 2.0, 5.0, 4.0]),
    ]);

    let session = AnalysisSession::new();
    let aligned = session.align(&tables, &time_columns).unwrap();
    let records = session.compute(&aligned, "weather", "temperature").unwrap();

    let r = &records[0];
    assert!(r.pearson_r.is_undefined());
    assert!(r.pearson_p.is_undefined());
    assert!(r.spearman_r.is_undefined());

    let json = serde_json::to_value(r).unwrap();
    assert_eq!(json["pearson_r"], "undefined");
    assert_eq!(json["pearson_p"], "undefined");

    let ranked = session
        .rank(&records, RankMetric::Pearson, 5, true)
        .unwrap();
    assert!(ranked.is_empty());
    assert_eq!(ranked.excluded_undefined, 1);
}

#[test]
fn test_no_time_source_and_insufficient_span() {
    let (tables, _) = inputs(vec![LabeledSeriesTable::new("weather")
        .with_time_column("ts", hours(0, 3))
        .with_values("temperature", &[1.0, 2.0, 3.0])]);
    let log = OperationLog::new();
    let aligner = SeriesAligner::new(Frequency::hourly());

    let err = aligner.align(&tables, &BTreeMap::new(), &log).unwrap_err();
    assert!(matches!(err, InsightError::NoTimeSource));
    assert_eq!(err.to_string(), "Alignment error: no time source");

    let (tables, time_columns) = inputs(vec![LabeledSeriesTable::new("weather")
        .with_time_column("ts", hours(0, 3))
        .with_values("temperature", &[1.0, 2.0, 3.0])]);
    let err = SeriesAligner::new(Frequency::daily())
        .align(&tables, &time_columns, &log)
        .unwrap_err();
    assert!(err.is_alignment_error());
    assert!(log.is_empty());
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_self_correlation_and_negation() {
    let values = [3.0, 1.5, 4.0, 1.0, 5.5, 9.0, 2.5];
    let negated: Vec<f64> = values.iter().map(|v| -v).collect();
    let (tables, time_columns) = inputs(vec![
        LabeledSeriesTable::new("a")
            .with_time_column("ts", hours(0, 7))
            .with_values("x", &values),
        LabeledSeriesTable::new("b")
            .with_time_column("ts", hours(0, 7))
            .with_values("copy", &values)
            .with_values("negated", &negated),
    ]);

    let session = AnalysisSession::new();
    let aligned = session.align(&tables, &time_columns).unwrap();
    let records = session.compute(&aligned, "a", "x").unwrap();

    let copy = records.iter().find(|r| r.column == "copy").unwrap();
    let neg = records.iter().find(|r| r.column == "negated").unwrap();
    assert!((copy.pearson_r.value().unwrap() - 1.0).abs() < 1e-12);
    assert!((copy.spearman_r.value().unwrap() - 1.0).abs() < 1e-12);
    assert!((neg.pearson_r.value().unwrap() + 1.0).abs() < 1e-12);
    assert!((neg.spearman_r.value().unwrap() + 1.0).abs() < 1e-12);
    assert!(copy.pearson_p.value().unwrap() < 1e-12);
}

#[test]
fn test_statistics_stay_in_bounds() {
    let n = 48;
    let a: Vec<f64> = (0..n).map(|i| ((i * 7919) % 97) as f64).collect();
    let b: Vec<f64> = (0..n).map(|i| ((i * 104_729) % 89) as f64 * 0.5).collect();
    let c: Vec<f64> = a.iter().map(|v| v * v).collect();
    let (tables, time_columns) = inputs(vec![
        LabeledSeriesTable::new("left")
            .with_time_column("ts", hours(0, n as i64))
            .with_values("a", &a),
        LabeledSeriesTable::new("right")
            .with_time_column("ts", hours(0, n as i64))
            .with_values("b", &b)
            .with_values("c", &c),
    ]);

    let session = AnalysisSession::new();
    let aligned = session.align(&tables, &time_columns).unwrap();
    for r in session.compute(&aligned, "left", "a").unwrap() {
        for v in [r.pearson_r, r.spearman_r].iter().filter_map(|s| s.value()) {
            assert!((-1.0..=1.0).contains(&v));
        }
        for p in [r.pearson_p, r.spearman_p].iter().filter_map(|s| s.value()) {
            assert!((0.0..=1.0).contains(&p));
        }
        assert!(r.mutual_information.value().unwrap() >= 0.0);
    }
}

#[test]
fn test_alignment_is_idempotent() {
    let (tables, time_columns) = inputs(vec![
        LabeledSeriesTable::new("weather")
            .with_time_column(
                "ts",
                (0..12)
                    .map(|m| Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::minutes(m * 25)))
                    .collect(),
            )
            .with_values("temperature", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0]),
        LabeledSeriesTable::new("economic")
            .with_time_column(
                "ts",
                (0..3)
                    .map(|h| Some(Utc.with_ymd_and_hms(2024, 3, 1, 2 * h, 0, 0).unwrap()))
                    .collect(),
            )
            .with_values("stocks", &[100.0, 101.0, 99.0]),
    ]);

    let aligner = SeriesAligner::new(Frequency::hourly());
    let log = OperationLog::new();
    let first = aligner.align(&tables, &time_columns, &log).unwrap();
    let second = aligner
        .align(first.tables(), first.time_columns(), &log)
        .unwrap();

    assert_eq!(first.grid(), second.grid());
    assert_eq!(first.tables(), second.tables());
    assert_eq!(log.history_for("align").len(), 2);
}

#[test]
fn test_bucket_mean_without_interpolation() {
    let origin = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let ts = vec![
        Some(origin),
        Some(origin + Duration::minutes(30)),
        Some(origin + Duration::hours(3)),
    ];
    let (tables, time_columns) = inputs(vec![LabeledSeriesTable::new("weather")
        .with_time_column("ts", ts)
        .with_values("temperature", &[10.0, 20.0, 40.0])]);

    let aligned = SeriesAligner::new(Frequency::hourly())
        .align(&tables, &time_columns, &OperationLog::new())
        .unwrap();
    let values = aligned.table("weather").unwrap().numeric("temperature").unwrap();
    assert_eq!(values, &[Some(15.0), None, None, Some(40.0)]);
}

#[test]
fn test_leading_and_trailing_gaps() {
    let (tables, time_columns) = inputs(vec![
        LabeledSeriesTable::new("weather")
            .with_time_column("ts", hours(0, 6))
            .with_values("temperature", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
        LabeledSeriesTable::new("economic")
            .with_time_column("ts", hours(3, 6))
            .with_values("stocks", &[4.0, 3.0, 8.0, 1.0, 2.0, 0.0]),
    ]);

    let session = AnalysisSession::new();
    let aligned = session.align(&tables, &time_columns).unwrap();
    assert_eq!(aligned.grid().len(), 9);

    let coverage = aligned.coverage();
    let stocks = coverage.iter().find(|c| c.column == "stocks").unwrap();
    assert_eq!(stocks.observed, 6);
    assert!((stocks.fraction - 6.0 / 9.0).abs() < 1e-12);
    assert_eq!(stocks.first_observed, hours(3, 1)[0]);

    let records = session.compute(&aligned, "weather", "temperature").unwrap();
    assert_eq!(records[0].n_obs, 3);
}

#[test]
fn test_ranking_is_deterministic_and_tolerates_large_top_n() {
    let target = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let (tables, time_columns) = inputs(vec![
        LabeledSeriesTable::new("weather")
            .with_time_column("ts", hours(0, 6))
            .with_values("temperature", &target),
        LabeledSeriesTable::new("economic")
            .with_time_column("ts", hours(0, 6))
            .with_values("up", &[2.0, 4.0, 6.0, 8.0, 10.0, 12.0])
            .with_values("down", &[6.0, 5.0, 4.0, 3.0, 2.0, 1.0])
            .with_values("noise", &[3.0, 1.0, 4.0, 1.0, 5.0, 9.0]),
    ]);

    let session = AnalysisSession::new();
    let aligned = session.align(&tables, &time_columns).unwrap();
    let records = session.compute(&aligned, "weather", "temperature").unwrap();

    let first = session.rank(&records, RankMetric::Pearson, 100, true).unwrap();
    let second = session.rank(&records, RankMetric::Pearson, 100, true).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    // |r| ties between up and down break by column name
    assert_eq!(
        first.labels(),
        vec!["economic.down", "economic.up", "economic.noise"]
    );
}

#[test]
fn test_operation_log_records_every_step() {
    let (tables, time_columns) = inputs(vec![
        LabeledSeriesTable::new("weather")
            .with_time_column("ts", hours(0, 4))
            .with_values("temperature", &[1.0, 2.0, 4.0, 3.0]),
        LabeledSeriesTable::new("economic")
            .with_time_column("ts", hours(0, 4))
            .with_values("stocks", &[1.0, 3.0, 2.0, 4.0]),
    ]);

    let session = AnalysisSession::new();
    let aligned = session.align(&tables, &time_columns).unwrap();
    let records = session.compute(&aligned, "weather", "temperature").unwrap();
    session.rank_default(&records, RankMetric::MutualInformation).unwrap();
    session.matrix(&aligned, CorrelationMethod::Pearson).unwrap();

    let history = session.history();
    let ops: Vec<&str> = history.iter().map(|e| e.operation.as_str()).collect();
    assert_eq!(ops, vec!["align", "compute", "rank", "matrix"]);
    assert!(history.windows(2).all(|w| w[0].sequence < w[1].sequence));
    assert_eq!(
        history[0].params.get("grid_len"),
        Some(&serde_json::json!(4))
    );
}
