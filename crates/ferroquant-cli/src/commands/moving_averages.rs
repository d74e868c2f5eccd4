use ferroquant_core::{
    compute_moving_averages, AnalyticsConfig, CrossoverEvent, CrossoverPair, MaKind, MaPosition,
    Symbol, Table,
};
use serde::Serialize;

use crate::cli::MovingAveragesArgs;
use crate::error::CliError;

use super::{frame, input, metric_errors, CommandResult};

#[derive(Debug, Serialize)]
struct MovingAveragesResponseData {
    symbol: Symbol,
    latest_close: f64,
    positions: Vec<MaPosition>,
    crossover: Option<CrossoverPair>,
    crossovers: Vec<CrossoverEvent>,
    table: Table,
}

pub fn run(args: &MovingAveragesArgs, config: &AnalyticsConfig) -> Result<CommandResult, CliError> {
    let mut options = config.moving_averages.clone();
    if let Some(periods) = &args.periods {
        options.periods = periods.clone();
    }
    if let Some(kinds) = &args.kinds {
        options.kinds = kinds
            .split(',')
            .map(str::trim)
            .filter(|kind| !kind.is_empty())
            .map(str::parse::<MaKind>)
            .collect::<Result<_, _>>()?;
    }
    if let (Some(short), Some(long)) = (args.short, args.long) {
        let kind = options.crossover.map(|pair| pair.kind).unwrap_or_default();
        options.crossover = Some(CrossoverPair { short, long, kind });
    }

    let series = input::load_bars(&args.bars)?;
    let report = compute_moving_averages(&series, &options)?;

    let mut result = CommandResult::ok(serde_json::Value::Null);
    if report.crossovers.is_empty() && report.crossover.is_some() {
        result = result.with_warning("no crossover events in the supplied bars");
    }

    result.data = serde_json::to_value(MovingAveragesResponseData {
        table: frame(&report.table, None, args.tail, &config.output),
        symbol: report.symbol,
        latest_close: report.latest_close,
        positions: report.positions,
        crossover: report.crossover,
        crossovers: report.crossovers,
    })?;

    Ok(result.with_errors(metric_errors(&report.failures)))
}
