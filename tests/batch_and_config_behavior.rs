//! Behavior-driven tests for batch analytics, configuration and the
//! outbound envelope

use std::io::Write;

use ferroquant_core::{
    AnalyticsConfig, AnalyticsError, BatchRunner, CoreError, Envelope, EnvelopeError,
    EnvelopeMeta, IndicatorKind, RiskPeriod, SCHEMA_VERSION,
};
use ferroquant_tests::{bars, closes_from_returns};

fn returns(n: usize, scale: f64) -> Vec<f64> {
    (0..n)
        .map(|i| scale * ((i as f64) * 1.3).cos())
        .collect()
}

// =============================================================================
// Batch Journey: Universe Runs
// =============================================================================

#[test]
fn when_one_symbol_has_no_data_then_the_rest_of_the_universe_still_completes() {
    // Given: A three-symbol universe where the middle symbol is empty
    let universe = vec![
        bars("sh.600519", &closes_from_returns(&returns(40, 0.01))),
        bars("sh.600036", &[]),
        bars("sz.000858", &closes_from_returns(&returns(40, 0.02))),
    ];
    let runner = BatchRunner::new(Some(2)).expect("worker pool");

    // When: Indicators are computed across the pool
    let items = runner.indicators(&universe, &AnalyticsConfig::default());

    // Then: Results come back in input order
    let symbols: Vec<&str> = items.iter().map(|item| item.symbol.as_str()).collect();
    assert_eq!(symbols, ["sh.600519", "sh.600036", "sz.000858"]);

    // And: Only the empty symbol failed
    assert!(items[0].is_ok());
    assert!(matches!(
        items[1].result,
        Err(AnalyticsError::InsufficientData { .. })
    ));
    assert!(items[2].is_ok());
}

#[test]
fn when_the_full_analysis_runs_with_a_benchmark_then_each_symbol_gets_risk() {
    // Given: Two stocks and a benchmark
    let benchmark = bars("sh.000300", &closes_from_returns(&returns(60, 0.01)));
    let universe = vec![
        bars("sh.600519", &closes_from_returns(&returns(60, 0.015))),
        bars("sz.000858", &closes_from_returns(&returns(60, 0.005))),
    ];
    let runner = BatchRunner::new(Some(2)).expect("worker pool");

    // When: Every engine is run per symbol
    let items = runner.analyze(&universe, Some(&benchmark), &AnalyticsConfig::default());

    // Then: Each analysis carries indicators, moving averages and risk
    for item in &items {
        let analysis = item.result.as_ref().expect("analysis");
        assert!(analysis.is_complete());
        let indicators = analysis.indicators.as_ref().expect("indicators");
        assert_eq!(indicators.table.len(), 61);
        let moving_averages = analysis.moving_averages.as_ref().expect("moving averages");
        assert!(!moving_averages.positions.is_empty());
        let risk = analysis.risk.as_ref().expect("risk with benchmark");
        assert_eq!(risk.benchmark.as_str(), "sh.000300");
    }

    // And: Returns scaled against the benchmark give proportional betas
    let betas: Vec<f64> = items
        .iter()
        .filter_map(|item| item.result.as_ref().ok())
        .filter_map(|analysis| analysis.risk.as_ref())
        .map(|risk| risk.metrics.beta)
        .collect();
    assert!((betas[0] - 1.5).abs() < 0.05);
    assert!((betas[1] - 0.5).abs() < 0.05);
}

#[test]
fn when_risk_cannot_be_computed_then_indicators_and_averages_are_still_reported() {
    // Given: A rising stock and a benchmark that never moves
    let rising: Vec<f64> = (0..40).map(|i| 20.0 + i as f64 * 0.25).collect();
    let universe = vec![bars("sh.600519", &rising)];
    let benchmark = bars("sh.000300", &[100.0; 40]);
    let runner = BatchRunner::new(Some(2)).expect("worker pool");

    // When: The full analysis runs against that benchmark
    let items = runner.analyze(&universe, Some(&benchmark), &AnalyticsConfig::default());

    // Then: The symbol still succeeds with its independent reports
    let analysis = items[0].result.as_ref().expect("partial analysis");
    let indicators = analysis.indicators.as_ref().expect("indicators survive");
    assert_eq!(indicators.table.len(), 40);
    assert!(analysis.moving_averages.is_some());

    // And: Only risk is missing, reported with its own error code
    assert!(analysis.risk.is_none());
    assert!(!analysis.is_complete());
    let failed: Vec<(&str, &str)> = analysis
        .failures
        .iter()
        .map(|failure| (failure.metric.as_str(), failure.code.as_str()))
        .collect();
    assert_eq!(failed, [("risk", "analytics.degenerate_input")]);
}

#[test]
fn when_a_zero_sized_pool_is_configured_then_configuration_is_rejected() {
    let err = AnalyticsConfig::from_json_str(r#"{"worker_threads": 0}"#)
        .expect_err("zero workers");

    assert!(matches!(
        err,
        CoreError::Analytics(AnalyticsError::InvalidParameter {
            name: "worker_threads",
            ..
        })
    ));
}

// =============================================================================
// Configuration Journey
// =============================================================================

#[test]
fn when_a_config_file_overrides_some_keys_then_the_rest_keep_defaults() {
    // Given: A config file selecting RSI and a one-year risk window
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"{{
            "indicators": {{"indicators": ["RSI"], "rsi": {{"period": 9}}}},
            "risk": {{"period": "1Y", "risk_free_rate": 0.02}},
            "output": {{"round_digits": 2}}
        }}"#
    )
    .expect("write config");

    // When: The configuration is loaded from that path
    let config = AnalyticsConfig::load(Some(file.path())).expect("config");

    // Then: Overrides apply
    assert_eq!(config.indicators.indicators, vec![IndicatorKind::Rsi]);
    assert_eq!(config.indicators.rsi.period, 9);
    assert_eq!(config.risk.period, Some(RiskPeriod::OneYear));
    assert_eq!(config.risk.risk_free_rate, 0.02);
    assert_eq!(config.output.round_digits, 2);

    // And: Untouched keys keep their defaults
    assert_eq!(config.output.tail_rows, 30);
    assert_eq!(config.dcf.discount_rate, 0.10);
    assert_eq!(config.risk.benchmark, "sh.000300");
}

#[test]
fn when_a_config_file_is_missing_then_loading_reports_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("absent.json");

    let err = AnalyticsConfig::load(Some(&missing)).expect_err("missing file");

    assert!(matches!(err, CoreError::Io(_)));
}

// =============================================================================
// Envelope Journey
// =============================================================================

#[test]
fn when_an_engine_fails_then_the_envelope_carries_a_structured_error() {
    // Given: An engine error
    let failure = AnalyticsError::insufficient_data("closes", 26, 10);

    // When: It is wrapped into a response envelope
    let meta = EnvelopeMeta::generate("indicators", 4).expect("meta");
    let error = EnvelopeError::from_analytics(&failure).with_subject("MACD");
    let envelope =
        Envelope::with_errors(meta, serde_json::Value::Null, vec![error]).expect("envelope");

    // Then: The JSON form has the schema version, engine and error code
    let json = serde_json::to_value(&envelope).expect("serialize");
    assert_eq!(json["meta"]["schema_version"], SCHEMA_VERSION);
    assert_eq!(json["meta"]["engine"], "indicators");
    assert_eq!(json["errors"][0]["code"], "analytics.insufficient_data");
    assert_eq!(json["errors"][0]["subject"], "MACD");
    assert_eq!(json["errors"][0]["retryable"], false);
    assert_eq!(
        json["meta"]["trace_id"].as_str().map(str::len),
        Some(32),
        "trace id is a 32-character hex string"
    );
}
