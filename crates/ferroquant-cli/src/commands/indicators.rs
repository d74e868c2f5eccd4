use ferroquant_core::{compute_indicators, AnalyticsConfig, IndicatorKind, Symbol, Table};
use serde::Serialize;

use crate::cli::IndicatorsArgs;
use crate::error::CliError;

use super::{failure_error, frame, input, parse_date, CommandResult};

#[derive(Debug, Serialize)]
struct IndicatorsResponseData {
    symbol: Symbol,
    indicators: Vec<IndicatorKind>,
    bar_count: usize,
    table: Table,
}

pub fn run(args: &IndicatorsArgs, config: &AnalyticsConfig) -> Result<CommandResult, CliError> {
    let start = parse_date(args.start.as_deref())?;
    let end = parse_date(args.end.as_deref())?;

    let mut options = config.indicators.clone();
    if let Some(list) = &args.indicators {
        options = options.with_indicators(IndicatorKind::parse_list(list)?);
    }

    // Bars before `start` still feed the lookback windows.
    let series = input::load_bars(&args.bars)?.window(None, end);
    let report = compute_indicators(&series, &options)?;

    let errors = report
        .failures
        .iter()
        .map(|failure| failure_error(&failure.code, &failure.message, failure.indicator.as_str()))
        .collect();

    let data = serde_json::to_value(IndicatorsResponseData {
        symbol: report.symbol.clone(),
        indicators: options.indicators.clone(),
        bar_count: series.len(),
        table: frame(&report.table, start, args.tail, &config.output),
    })?;

    Ok(CommandResult::ok(data).with_errors(errors))
}
