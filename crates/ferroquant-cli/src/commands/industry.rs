use ferroquant_core::{compare_industry, AnalyticsConfig, Symbol, ValuationRatio};

use crate::cli::IndustryArgs;
use crate::error::CliError;

use super::{input, metric_errors, CommandResult};

pub fn run(args: &IndustryArgs, config: &AnalyticsConfig) -> Result<CommandResult, CliError> {
    let symbol = Symbol::parse(&args.target)?;
    let mut options = config.industry.clone();
    if let Some(list) = &args.ratio {
        options.ratios = ValuationRatio::parse_list(list)?;
    }

    let universe = input::load_peers(&args.peers)?;
    let target = universe
        .iter()
        .find(|peer| peer.symbol == symbol)
        .ok_or_else(|| {
            CliError::Input(format!(
                "target {symbol} not found in {}",
                args.peers.display()
            ))
        })?;

    let report = compare_industry(target, &universe, &options)?;
    let errors = metric_errors(&report.failures);
    Ok(CommandResult::ok(serde_json::to_value(report)?).with_errors(errors))
}
