//! # Domain Models
//!
//! Canonical inbound types supplied by the retrieval collaborator.
//!
//! All models are designed to be:
//!
//! - **Validated**: construction checks every invariant
//! - **Immutable once built**: engines only borrow them
//! - **Serializable**: full serde support for JSON
//!
//! ## Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Bar`] | OHLCV bar for one trading date |
//! | [`BarSeries`] | Strictly increasing bars for a symbol |
//! | [`FundamentalSnapshot`] | Per (symbol, year, quarter) fundamentals |
//! | [`FundamentalHistory`] | Chronological fundamentals for one symbol |
//! | [`ValuationSnapshot`] | Daily PE/PB/PS/PCF ratios |
//! | [`PeerValuation`] | Ratios of one company for industry comparison |
//! | [`Symbol`] | Validated exchange-qualified code |
//! | [`TradingDate`] | ISO `YYYY-MM-DD` date |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! ## Validation
//!
//! ```rust,ignore
//! use ferroquant_core::{Bar, TradingDate, ValidationError};
//!
//! let date = TradingDate::parse("2024-01-02")?;
//! let bar = Bar::new(date, 10.0, 10.5, 9.8, 10.2, Some(1_000.0))?;
//!
//! // high < low is rejected
//! let invalid = Bar::new(date, 10.0, 9.0, 10.5, 10.2, None);
//! assert!(matches!(invalid, Err(ValidationError::InvalidBarRange)));
//! ```

mod date;
mod models;
mod symbol;

pub use date::{TradingDate, UtcDateTime};
pub use models::{
    Bar, BarSeries, FundamentalHistory, FundamentalSnapshot, PeerValuation, Quarter,
    ValuationSnapshot,
};
pub use symbol::Symbol;
