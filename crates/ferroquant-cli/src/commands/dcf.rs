use ferroquant_core::{compute_dcf, AnalyticsConfig};

use crate::cli::DcfArgs;
use crate::error::CliError;

use super::{input, CommandResult};

pub fn run(args: &DcfArgs, config: &AnalyticsConfig) -> Result<CommandResult, CliError> {
    let mut options = config.dcf.clone();
    if let Some(years_back) = args.years_back {
        options.years_back = years_back;
    }
    if args.projection_years.is_some() {
        options.projection_years = args.projection_years;
    }
    if let Some(rate) = args.discount_rate {
        options.discount_rate = rate;
    }
    if let Some(rate) = args.terminal_growth_rate {
        options.terminal_growth_rate = rate;
    }

    let history = input::load_fundamentals(&args.fundamentals)?;
    let valuation = compute_dcf(&history, &options, args.price)?;

    let mut result = CommandResult::ok(serde_json::to_value(&valuation)?);
    if valuation.per_share.is_none() {
        result = result.with_warning(
            "per-share value omitted: latest snapshot lacks total_shares or total_liabilities",
        );
    }
    Ok(result)
}
