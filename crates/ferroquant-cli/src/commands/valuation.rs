use ferroquant_core::valuation_history;

use crate::cli::ValuationArgs;
use crate::error::CliError;

use super::{input, metric_errors, CommandResult};

pub fn run(args: &ValuationArgs) -> Result<CommandResult, CliError> {
    let file = input::load_valuation_snapshots(&args.snapshots)?;
    let report = valuation_history(&file.symbol, &file.snapshots)?;

    let errors = metric_errors(&report.failures);
    Ok(CommandResult::ok(serde_json::to_value(report)?).with_errors(errors))
}
