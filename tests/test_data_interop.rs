//! Integration tests for polars input and configuration loading

use kolosal_insight::prelude::*;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::io::Write;

const HOUR_MS: i64 = 3_600_000;
const ORIGIN_MS: i64 = 1_704_067_200_000; // 2024-01-01T00:00:00Z

fn hourly_series(name: &str, n: i64) -> Series {
    let millis: Vec<i64> = (0..n).map(|h| ORIGIN_MS + h * HOUR_MS).collect();
    Series::new(name.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .unwrap()
}

// ============================================================================
// DataFrame input
// ============================================================================

#[test]
fn test_dataframe_domains_through_session() {
    let mut weather = df!(
        "temperature" => &[10.0, 12.0, 14.0, 13.0, 15.0],
        "humidity" => &[80i64, 75, 70, 72, 65]
    )
    .unwrap();
    weather.with_column(hourly_series("ts", 5)).unwrap();

    let mut economic = df!(
        "stocks" => &[100.0, 105.0, 110.0, 108.0, 112.0]
    )
    .unwrap();
    economic.with_column(hourly_series("time", 5)).unwrap();

    let request = AnalysisRequest::new("weather", "temperature")
        .with_table(LabeledSeriesTable::from_dataframe("weather", &weather).unwrap(), "ts")
        .with_table(LabeledSeriesTable::from_dataframe("economic", &economic).unwrap(), "time")
        .with_metric(RankMetric::Spearman)
        .with_top_n(1);

    let session = AnalysisSession::new();
    let report = session.analyze(&request).unwrap();

    assert_eq!(report.grid_len, 5);
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.ranked.len(), 1);
    assert!(report.skipped_domains.is_empty());
    // humidity falls as temperature rises
    let humidity = report
        .records
        .iter()
        .find(|r| r.column == "humidity")
        .unwrap();
    assert!(humidity.spearman_r.value().unwrap() < -0.8);
}

#[test]
fn test_text_column_fails_fast() {
    let mut social = df!(
        "mentions" => &[1.0, 2.0, 3.0],
        "sentiment" => &["good", "bad", "good"]
    )
    .unwrap();
    social.with_column(hourly_series("ts", 3)).unwrap();

    let table = LabeledSeriesTable::from_dataframe("social", &social).unwrap();
    let mut tables = BTreeMap::new();
    tables.insert("social".to_string(), table);
    let mut time_columns = BTreeMap::new();
    time_columns.insert("social".to_string(), "ts".to_string());

    let err = SeriesAligner::new(Frequency::hourly())
        .align(&tables, &time_columns, &OperationLog::new())
        .unwrap_err();
    assert!(matches!(
        err,
        InsightError::NonNumericColumn { ref column, .. } if column == "sentiment"
    ));
}

#[test]
fn test_aligned_table_exports_to_dataframe() {
    let mut weather = df!("temperature" => &[1.0, 3.0]).unwrap();
    let ts = Series::new("ts".into(), vec![ORIGIN_MS, ORIGIN_MS + 3 * HOUR_MS])
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .unwrap();
    weather.with_column(ts).unwrap();

    let mut tables = BTreeMap::new();
    tables.insert(
        "weather".to_string(),
        LabeledSeriesTable::from_dataframe("weather", &weather).unwrap(),
    );
    let mut time_columns = BTreeMap::new();
    time_columns.insert("weather".to_string(), "ts".to_string());

    let aligned = SeriesAligner::new(Frequency::hourly())
        .align(&tables, &time_columns, &OperationLog::new())
        .unwrap();
    let out = aligned.table("weather").unwrap().to_dataframe().unwrap();

    assert_eq!(out.height(), 4);
    assert_eq!(out.column("temperature").unwrap().null_count(), 2);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "alignment": {{ "frequency": "30min", "max_grid_points": 5000 }},
            "association": {{ "mi_neighbors": 5, "parallel": false }},
            "ranking": {{ "default_top_n": 3, "max_p_value": 0.05 }}
        }}"#
    )
    .unwrap();

    let config = EngineConfig::from_file(file.path()).unwrap();
    assert_eq!(config.alignment.frequency, Frequency::Minutes(30));
    assert_eq!(config.alignment.max_grid_points, 5000);
    assert_eq!(config.association.mi_neighbors, 5);
    assert!(!config.association.parallel);
    assert_eq!(config.association.random_state, 0);
    assert_eq!(config.ranking.default_top_n, 3);

    let session = AnalysisSession::with_config(config).unwrap();
    assert_eq!(session.config().ranking.max_p_value, Some(0.05));
}

#[test]
fn test_config_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = EngineConfig::from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, InsightError::IoError(_)));
}

#[test]
fn test_grid_limit_from_config() {
    let config = EngineConfig::new().with_alignment(
        AlignmentConfig::new()
            .with_frequency(Frequency::Seconds(1))
            .with_max_grid_points(100),
    );
    let mut weather = df!("temperature" => &[1.0, 2.0]).unwrap();
    let ts = Series::new("ts".into(), vec![ORIGIN_MS, ORIGIN_MS + HOUR_MS])
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .unwrap();
    weather.with_column(ts).unwrap();

    let request = AnalysisRequest::new("weather", "temperature").with_table(
        LabeledSeriesTable::from_dataframe("weather", &weather).unwrap(),
        "ts",
    );
    let err = AnalysisSession::with_config(config)
        .unwrap()
        .analyze(&request)
        .unwrap_err();
    assert!(matches!(err, InsightError::GridTooLarge { limit: 100, .. }));
}
