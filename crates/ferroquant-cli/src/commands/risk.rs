use ferroquant_core::{compute_risk, AnalyticsConfig, RiskPeriod, RiskReport, Table};
use serde::Serialize;

use crate::cli::RiskArgs;
use crate::error::CliError;

use super::{input, metric_errors, CommandResult};

#[derive(Debug, Serialize)]
struct RiskResponseData {
    #[serde(flatten)]
    report: RiskReport,
    summary: Table,
}

pub fn run(args: &RiskArgs, config: &AnalyticsConfig) -> Result<CommandResult, CliError> {
    let mut options = config.risk.clone();
    if let Some(period) = &args.period {
        options.period = Some(period.parse::<RiskPeriod>()?);
    }
    if let Some(rate) = args.risk_free_rate {
        options.risk_free_rate = rate;
    }

    let asset = input::load_bars(&args.bars)?;
    let benchmark = input::load_bars(&args.benchmark)?;
    options.benchmark = benchmark.symbol.to_string();

    let report = compute_risk(&asset, &benchmark, &options)?;
    let errors = metric_errors(&report.metrics.failures);
    let summary = report
        .metrics
        .summary_table()
        .rounded(config.output.round_digits);

    let mut result = CommandResult::ok(serde_json::to_value(RiskResponseData { report, summary })?);
    if options.period.is_none() {
        result = result.with_warning("no --period given; every overlapping bar was used");
    }

    Ok(result.with_errors(errors))
}
