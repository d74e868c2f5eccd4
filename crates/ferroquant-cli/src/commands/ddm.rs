use ferroquant_core::{compute_ddm, AnalyticsConfig};

use crate::cli::DdmArgs;
use crate::error::CliError;

use super::{input, CommandResult};

pub fn run(args: &DdmArgs, config: &AnalyticsConfig) -> Result<CommandResult, CliError> {
    let mut options = config.ddm.clone();
    if let Some(years_back) = args.years_back {
        options.years_back = years_back;
    }
    if let Some(years) = args.forecast_years {
        options.forecast_years = years;
    }
    if let Some(rate) = args.discount_rate {
        options.discount_rate = rate;
    }
    if let Some(rate) = args.terminal_growth_rate {
        options.terminal_growth_rate = rate;
    }

    let history = input::load_fundamentals(&args.fundamentals)?;
    let valuation = compute_ddm(&history, &options, args.price)?;
    Ok(CommandResult::ok(serde_json::to_value(valuation)?))
}
