//! CLI argument definitions for ferroquant.
//!
//! Every command reads caller-supplied JSON files, runs one analytics engine
//! and prints the result inside the standard response envelope.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `indicators` | Technical indicator table for one bar series |
//! | `moving-averages` | SMA/EMA/WMA table, price position and crossovers |
//! | `risk` | Risk metrics of a series against a benchmark |
//! | `peg` | PEG ratio for one reporting period |
//! | `dcf` | Discounted free cash flow valuation |
//! | `ddm` | Dividend discount valuation |
//! | `valuation` | Valuation ratio history statistics |
//! | `industry` | Percentile of a company among industry peers |
//! | `batch` | Indicators or risk across a symbol universe |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, ndjson, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Treat warnings and errors as failures |
//! | `--stream` | `false` | Emit NDJSON lifecycle events |
//! | `--config` | `$FERROQUANT_CONFIG` | JSON analytics configuration |
//! | `--verbose` | `false` | Debug logging on stderr |
//!
//! # Examples
//!
//! ```bash
//! ferroquant indicators --bars 600519.json --indicators MACD,RSI --tail 10
//! ferroquant risk --bars 600519.json --benchmark hs300.json --period 1Y --pretty
//! ferroquant industry --target sh.600519 --peers liquor.json --ratio pe,pb
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Quantitative analytics over caller-supplied market and fundamental data.
#[derive(Debug, Parser)]
#[command(
    name = "ferroquant",
    author,
    version,
    about = "Quantitative analytics CLI: indicators, risk and valuation"
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat warnings and errors as failures (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Emit NDJSON events (start, progress, chunk, error, end).
    #[arg(long, global = true, default_value_t = false)]
    pub stream: bool,

    /// Analytics configuration file; falls back to `FERROQUANT_CONFIG`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text summary for terminal display.
    Table,
    /// Single JSON object output.
    Json,
    /// One compact JSON object per line.
    Ndjson,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute technical indicators for a bar series.
    Indicators(IndicatorsArgs),
    /// Compute moving averages, price position and crossovers.
    MovingAverages(MovingAveragesArgs),
    /// Compute risk metrics against a benchmark series.
    Risk(RiskArgs),
    /// Compute the PEG ratio for one reporting period.
    Peg(PegArgs),
    /// Discounted cash flow valuation from annual free cash flow.
    Dcf(DcfArgs),
    /// Dividend discount valuation from annual dividends.
    Ddm(DdmArgs),
    /// Summarize valuation ratio history.
    Valuation(ValuationArgs),
    /// Rank a company's valuation ratios among industry peers.
    Industry(IndustryArgs),
    /// Run indicators or risk across a symbol universe on the worker pool.
    Batch(BatchArgs),
}

#[derive(Debug, Args)]
pub struct IndicatorsArgs {
    /// Bar series JSON file (`{"symbol": ..., "bars": [...]}`).
    #[arg(long)]
    pub bars: PathBuf,

    /// Comma-separated indicator names, e.g. `MACD,RSI,BOLL`.
    #[arg(long)]
    pub indicators: Option<String>,

    /// First date (inclusive) of the rows to report.
    #[arg(long)]
    pub start: Option<String>,

    /// Last date (inclusive) of the bars to use.
    #[arg(long)]
    pub end: Option<String>,

    /// Number of most recent rows to print.
    #[arg(long)]
    pub tail: Option<usize>,
}

#[derive(Debug, Args)]
pub struct MovingAveragesArgs {
    #[arg(long)]
    pub bars: PathBuf,

    /// Comma-separated window lengths, e.g. `5,10,20`.
    #[arg(long, value_delimiter = ',')]
    pub periods: Option<Vec<usize>>,

    /// Comma-separated kinds: `SMA`, `EMA`, `WMA`.
    #[arg(long)]
    pub kinds: Option<String>,

    /// Short window of the crossover pair.
    #[arg(long, requires = "long")]
    pub short: Option<usize>,

    /// Long window of the crossover pair.
    #[arg(long, requires = "short")]
    pub long: Option<usize>,

    #[arg(long)]
    pub tail: Option<usize>,
}

#[derive(Debug, Args)]
pub struct RiskArgs {
    #[arg(long)]
    pub bars: PathBuf,

    /// Benchmark bar series JSON file.
    #[arg(long)]
    pub benchmark: PathBuf,

    /// Lookback window: `3M`, `6M`, `1Y` or `2Y`.
    #[arg(long)]
    pub period: Option<String>,

    /// Annual risk-free rate, e.g. `0.03`.
    #[arg(long)]
    pub risk_free_rate: Option<f64>,
}

#[derive(Debug, Args)]
pub struct PegArgs {
    /// Fundamentals JSON file (`{"symbol": ..., "snapshots": [...]}`).
    #[arg(long)]
    pub fundamentals: PathBuf,

    /// Price/earnings ratio; defaults to the snapshot's `pe_ttm`.
    #[arg(long)]
    pub pe: Option<f64>,

    #[arg(long)]
    pub year: i32,

    /// Fiscal quarter, `1`-`4` or `Q1`-`Q4`.
    #[arg(long)]
    pub quarter: String,
}

#[derive(Debug, Args)]
pub struct DcfArgs {
    #[arg(long)]
    pub fundamentals: PathBuf,

    #[arg(long)]
    pub years_back: Option<usize>,

    #[arg(long)]
    pub projection_years: Option<usize>,

    #[arg(long)]
    pub discount_rate: Option<f64>,

    #[arg(long)]
    pub terminal_growth_rate: Option<f64>,

    /// Current share price for the premium calculation.
    #[arg(long)]
    pub price: Option<f64>,
}

#[derive(Debug, Args)]
pub struct DdmArgs {
    #[arg(long)]
    pub fundamentals: PathBuf,

    #[arg(long)]
    pub years_back: Option<usize>,

    #[arg(long)]
    pub forecast_years: Option<usize>,

    #[arg(long)]
    pub discount_rate: Option<f64>,

    #[arg(long)]
    pub terminal_growth_rate: Option<f64>,

    #[arg(long)]
    pub price: Option<f64>,
}

#[derive(Debug, Args)]
pub struct ValuationArgs {
    /// Daily valuation snapshots JSON file (`{"symbol": ..., "snapshots": [...]}`).
    #[arg(long)]
    pub snapshots: PathBuf,
}

#[derive(Debug, Args)]
pub struct IndustryArgs {
    /// Symbol of the company being ranked.
    #[arg(long)]
    pub target: String,

    /// Peer valuations JSON file (array); must include the target.
    #[arg(long)]
    pub peers: PathBuf,

    /// Comma-separated ratios: `pe`, `pb`, `ps`.
    #[arg(long)]
    pub ratio: Option<String>,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Directory of bar series files, or one file holding an array of series.
    #[arg(long)]
    pub universe: PathBuf,

    /// Benchmark bar series; required for `--kind risk`.
    #[arg(long)]
    pub benchmark: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = BatchKind::Indicators)]
    pub kind: BatchKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BatchKind {
    Indicators,
    MovingAverages,
    Risk,
    /// Indicators, moving averages and (with a benchmark) risk.
    All,
}

impl BatchKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Indicators => "indicators",
            Self::MovingAverages => "moving_averages",
            Self::Risk => "risk",
            Self::All => "all",
        }
    }
}
