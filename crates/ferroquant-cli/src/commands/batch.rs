use ferroquant_core::{
    AnalyticsConfig, BatchItem, BatchRunner, CrossoverEvent, EnvelopeError, IndicatorReport,
    MaPosition, MetricFailure, MovingAverageReport, OutputOptions, RiskReport, Symbol, SymbolAnalysis, Table,
};
use serde::Serialize;
use serde_json::Value;

use crate::cli::{BatchArgs, BatchKind};
use crate::error::CliError;

use super::{failure_error, frame, input, CommandResult};

#[derive(Debug, Serialize)]
struct BatchResponseData {
    kind: &'static str,
    threads: usize,
    symbols: usize,
    succeeded: usize,
    items: Vec<BatchEntry>,
}

#[derive(Debug, Serialize)]
struct BatchEntry {
    symbol: Symbol,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
}

pub fn run(args: &BatchArgs, config: &AnalyticsConfig) -> Result<CommandResult, CliError> {
    let universe = input::load_universe(&args.universe)?;
    let benchmark = args
        .benchmark
        .as_deref()
        .map(input::load_bars)
        .transpose()?;
    let runner = BatchRunner::from_config(config)?;
    let output = &config.output;

    tracing::debug!(
        kind = args.kind.as_str(),
        symbols = universe.len(),
        threads = runner.threads(),
        "starting batch"
    );

    let mut warnings = Vec::new();
    let (entries, errors) = match args.kind {
        BatchKind::Indicators => collect(runner.indicators(&universe, config), |report| {
            serde_json::to_value(indicator_summary(report, output))
        })?,
        BatchKind::MovingAverages => {
            collect(runner.moving_averages(&universe, config), |report| {
                serde_json::to_value(moving_average_summary(report, output))
            })?
        }
        BatchKind::Risk => {
            let benchmark = benchmark.as_ref().ok_or_else(|| {
                CliError::Input(String::from("--kind risk requires --benchmark"))
            })?;
            collect(runner.risk(&universe, benchmark, config), serde_json::to_value)?
        }
        BatchKind::All => {
            if benchmark.is_none() {
                warnings.push(String::from("no --benchmark given; risk was skipped"));
            }
            let items = runner.analyze(&universe, benchmark.as_ref(), config);
            let partial = engine_failures(&items);
            let (entries, mut errors) = collect(items, |analysis: SymbolAnalysis| {
                serde_json::to_value(AnalysisSummary {
                    indicators: analysis
                        .indicators
                        .map(|report| indicator_summary(report, output)),
                    moving_averages: analysis
                        .moving_averages
                        .map(|report| moving_average_summary(report, output)),
                    risk: analysis.risk,
                    failures: analysis.failures,
                })
            })?;
            errors.extend(partial);
            (entries, errors)
        }
    };

    let data = BatchResponseData {
        kind: args.kind.as_str(),
        threads: runner.threads(),
        symbols: entries.len(),
        succeeded: entries.iter().filter(|entry| entry.status == "ok").count(),
        items: entries,
    };

    let mut result = CommandResult::ok(serde_json::to_value(data)?).with_errors(errors);
    for warning in warnings {
        result = result.with_warning(warning);
    }
    Ok(result)
}

/// Per-symbol entries in input order; failed symbols become envelope errors
/// whose subject is the symbol.
fn collect<T, F>(
    items: Vec<BatchItem<T>>,
    encode: F,
) -> Result<(Vec<BatchEntry>, Vec<EnvelopeError>), CliError>
where
    F: Fn(T) -> Result<Value, serde_json::Error>,
{
    let mut entries = Vec::with_capacity(items.len());
    let mut errors = Vec::new();

    for item in items {
        match item.result {
            Ok(value) => entries.push(BatchEntry {
                symbol: item.symbol,
                status: "ok",
                result: Some(encode(value)?),
            }),
            Err(error) => {
                errors.push(EnvelopeError::from_analytics(&error).with_subject(item.symbol.as_str()));
                entries.push(BatchEntry {
                    symbol: item.symbol,
                    status: "error",
                    result: None,
                });
            }
        }
    }

    Ok((entries, errors))
}

/// Engines that failed for symbols whose analysis otherwise succeeded; the
/// subject is `symbol:engine`.
fn engine_failures(items: &[BatchItem<SymbolAnalysis>]) -> Vec<EnvelopeError> {
    items
        .iter()
        .filter_map(|item| Some((&item.symbol, item.result.as_ref().ok()?)))
        .flat_map(|(symbol, analysis)| {
            analysis.failures.iter().map(move |failure| {
                failure_error(
                    &failure.code,
                    &failure.message,
                    &format!("{symbol}:{}", failure.metric),
                )
            })
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct IndicatorSummary {
    table: Table,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failed: Vec<String>,
}

fn indicator_summary(report: IndicatorReport, output: &OutputOptions) -> IndicatorSummary {
    IndicatorSummary {
        table: frame(&report.table, None, None, output),
        failed: report
            .failures
            .iter()
            .map(|failure| failure.indicator.as_str().to_owned())
            .collect(),
    }
}

#[derive(Debug, Serialize)]
struct MovingAverageSummary {
    latest_close: f64,
    positions: Vec<MaPosition>,
    crossovers: Vec<CrossoverEvent>,
    table: Table,
}

fn moving_average_summary(
    report: MovingAverageReport,
    output: &OutputOptions,
) -> MovingAverageSummary {
    MovingAverageSummary {
        table: frame(&report.table, None, None, output),
        latest_close: report.latest_close,
        positions: report.positions,
        crossovers: report.crossovers,
    }
}

#[derive(Debug, Serialize)]
struct AnalysisSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    indicators: Option<IndicatorSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    moving_averages: Option<MovingAverageSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    risk: Option<RiskReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<MetricFailure>,
}
