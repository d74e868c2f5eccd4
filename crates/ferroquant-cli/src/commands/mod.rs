mod batch;
mod dcf;
mod ddm;
mod indicators;
mod industry;
mod input;
mod moving_averages;
mod peg;
mod risk;
mod valuation;

use std::time::Instant;

use ferroquant_core::{
    AnalyticsConfig, AnalyticsError, Envelope, EnvelopeError, EnvelopeMeta, IndicatorTable,
    MetricFailure, OutputOptions, Table, TradingDate,
};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_errors(mut self, errors: Vec<EnvelopeError>) -> Self {
        self.errors.extend(errors);
        self
    }
}

/// Envelope to render plus the engine error that aborted the command, if any.
pub struct Outcome {
    pub envelope: Envelope<Value>,
    pub failure: Option<AnalyticsError>,
}

pub fn run(cli: &Cli) -> Result<Outcome, CliError> {
    let config = AnalyticsConfig::load(cli.config.as_deref())?;
    let engine = engine_name(&cli.command);
    tracing::debug!(engine, "running command");

    let started = Instant::now();
    let result = match &cli.command {
        Command::Indicators(args) => indicators::run(args, &config),
        Command::MovingAverages(args) => moving_averages::run(args, &config),
        Command::Risk(args) => risk::run(args, &config),
        Command::Peg(args) => peg::run(args),
        Command::Dcf(args) => dcf::run(args, &config),
        Command::Ddm(args) => ddm::run(args, &config),
        Command::Valuation(args) => valuation::run(args),
        Command::Industry(args) => industry::run(args, &config),
        Command::Batch(args) => batch::run(args, &config),
    };
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let (command_result, failure) = match result {
        Ok(command_result) => (command_result, None),
        Err(CliError::Analytics(error)) => {
            tracing::warn!(engine, code = error.code(), error = %error, "engine failed");
            let result = CommandResult::ok(Value::Null)
                .with_errors(vec![EnvelopeError::from_analytics(&error)]);
            (result, Some(error))
        }
        Err(other) => return Err(other),
    };

    let CommandResult {
        data,
        warnings,
        errors,
    } = command_result;

    let mut meta = EnvelopeMeta::generate(engine, latency_ms)?;
    for warning in warnings {
        meta.push_warning(warning);
    }

    let envelope = Envelope::with_errors(meta, data, errors)?;
    Ok(Outcome { envelope, failure })
}

fn engine_name(command: &Command) -> &'static str {
    match command {
        Command::Indicators(_) => "indicators",
        Command::MovingAverages(_) => "moving_averages",
        Command::Risk(_) => "risk",
        Command::Peg(_) => "valuation.peg",
        Command::Dcf(_) => "valuation.dcf",
        Command::Ddm(_) => "valuation.ddm",
        Command::Valuation(_) => "valuation.history",
        Command::Industry(_) => "valuation.industry",
        Command::Batch(_) => "batch",
    }
}

/// Rows on or after `start`, trimmed to the last `tail` rows and rounded.
fn frame(
    table: &IndicatorTable,
    start: Option<TradingDate>,
    tail: Option<usize>,
    output: &OutputOptions,
) -> Table {
    let mut flat = table.to_table();
    if let Some(start) = start {
        let kept: Vec<_> = table
            .rows
            .iter()
            .zip(flat.rows)
            .filter(|(row, _)| row.date >= start)
            .map(|(_, cells)| cells)
            .collect();
        flat.rows = kept;
    }

    flat.tail(tail.unwrap_or(output.tail_rows))
        .rounded(output.round_digits)
}

fn metric_errors(failures: &[MetricFailure]) -> Vec<EnvelopeError> {
    failures
        .iter()
        .map(|failure| failure_error(&failure.code, &failure.message, &failure.metric))
        .collect()
}

fn failure_error(code: &str, message: &str, subject: &str) -> EnvelopeError {
    EnvelopeError {
        code: code.to_owned(),
        message: message.to_owned(),
        retryable: Some(false),
        subject: Some(subject.to_owned()),
    }
}

fn parse_date(input: Option<&str>) -> Result<Option<TradingDate>, CliError> {
    input
        .map(TradingDate::parse)
        .transpose()
        .map_err(CliError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    use ferroquant_core::IndicatorRow;

    fn table(dates: &[&str]) -> IndicatorTable {
        IndicatorTable {
            columns: vec![String::from("RSI")],
            rows: dates
                .iter()
                .enumerate()
                .map(|(index, date)| IndicatorRow {
                    date: TradingDate::parse(date).expect("date"),
                    close: 10.0 + index as f64 / 3.0,
                    values: [(String::from("RSI"), Some(50.123_456))].into_iter().collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn frame_filters_then_tails_then_rounds() {
        let source = table(&["2024-01-02", "2024-01-03", "2024-01-04", "2024-01-05"]);
        let start = TradingDate::parse("2024-01-03").expect("date");
        let output = OutputOptions {
            tail_rows: 30,
            round_digits: 2,
        };

        let framed = frame(&source, Some(start), Some(2), &output);

        assert_eq!(framed.columns, vec!["date", "close", "RSI"]);
        assert_eq!(framed.len(), 2);
        assert_eq!(
            framed.cell(0, "date"),
            Some(&ferroquant_core::Cell::from("2024-01-04"))
        );
        assert_eq!(framed.cell(1, "RSI").and_then(|cell| cell.as_number()), Some(50.12));
    }

    #[test]
    fn frame_defaults_to_configured_tail() {
        let source = table(&["2024-01-02", "2024-01-03", "2024-01-04"]);
        let output = OutputOptions {
            tail_rows: 1,
            round_digits: 4,
        };

        assert_eq!(frame(&source, None, None, &output).len(), 1);
    }

    #[test]
    fn engine_names_are_stable() {
        use crate::cli::PegArgs;

        let command = Command::Peg(PegArgs {
            fundamentals: "f.json".into(),
            pe: Some(20.0),
            year: 2023,
            quarter: String::from("4"),
        });
        assert_eq!(engine_name(&command), "valuation.peg");
    }
}
