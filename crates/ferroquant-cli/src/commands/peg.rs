use ferroquant_core::{compute_peg, Quarter};

use crate::cli::PegArgs;
use crate::error::CliError;

use super::{input, CommandResult};

pub fn run(args: &PegArgs) -> Result<CommandResult, CliError> {
    let quarter = args.quarter.parse::<Quarter>()?;
    let history = input::load_fundamentals(&args.fundamentals)?;

    let result = compute_peg(&history, args.year, quarter, args.pe)?;
    Ok(CommandResult::ok(serde_json::to_value(result)?))
}
