//! Quantitative analytics core for ferroquant.
//!
//! This crate contains:
//! - Canonical domain models and validation (bars, fundamentals, peers)
//! - The series aligner
//! - Indicator, moving average, risk and valuation engines
//! - A bounded worker pool for batch analytics
//! - Outbound tables, response envelope and structured errors
//!
//! Every engine call is a pure, synchronous function of its inputs. Raw data
//! is supplied by the caller; nothing in this crate performs network I/O.

pub mod align;
pub mod batch;
pub mod config;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod indicators;
pub mod moving_average;
pub mod risk;
pub mod stats;
pub mod table;
pub mod valuation;

pub use align::{align, align_pair, AlignedPair, DatedSeries, ReturnSeries};
pub use batch::{BatchItem, BatchRunner, SymbolAnalysis};
pub use config::{AnalyticsConfig, OutputOptions, CONFIG_ENV_VAR};
pub use domain::{
    Bar, BarSeries, FundamentalHistory, FundamentalSnapshot, PeerValuation, Quarter, Symbol,
    TradingDate, UtcDateTime, ValuationSnapshot,
};
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta, SCHEMA_VERSION};
pub use error::{AnalyticsError, AnalyticsErrorKind, CoreError, MetricFailure, ValidationError};
pub use indicators::{
    compute_indicators, Indicator, IndicatorFailure, IndicatorKind, IndicatorOptions,
    IndicatorReport,
};
pub use moving_average::{
    compute_moving_averages, CrossSignal, CrossoverEvent, CrossoverPair, MaKind, MaPosition,
    MovingAverageOptions, MovingAverageReport, PricePosition,
};
pub use risk::{
    compute_risk, risk_metrics, risk_metrics_from_returns, RiskMetrics, RiskOptions, RiskPeriod,
    RiskReport,
};
pub use table::{Cell, IndicatorRow, IndicatorTable, Table};
pub use valuation::{
    compare_industry, compute_dcf, compute_ddm, compute_peg, project_dcf, valuation_history,
    DcfOptions, DcfProjection, DcfValuation, DdmOptions, DdmValuation, IndustryOptions,
    IndustryReport, PegResult, PeerComparison, ValuationHistoryReport, ValuationRatio,
};
