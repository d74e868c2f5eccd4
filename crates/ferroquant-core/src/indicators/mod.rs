//! # Indicator Engine
//!
//! Windowed technical indicators over an OHLCV [`BarSeries`].
//!
//! | Indicator | Columns | First defined index |
//! |-----------|---------|---------------------|
//! | MACD | `MACD`, `MACD_SIGNAL`, `MACD_HIST` | `slow − 1` (signal: `slow + signal − 2`) |
//! | RSI | `RSI` | `period` |
//! | KDJ | `KDJ_K`, `KDJ_D`, `KDJ_J` | `period + smooth_k − 2` |
//! | BOLL | `BOLL_UPPER`, `BOLL_MIDDLE`, `BOLL_LOWER`, `BOLL_WIDTH` | `period − 1` |
//! | WR | `WR` | `period − 1` |
//! | STOCH | `STOCH_K`, `STOCH_D` | `period + smooth_k − 2` |
//! | CCI | `CCI` | `period − 1` |
//! | ATR | `ATR` | `period − 1` |
//!
//! Values before the first defined index are `None`, never a partial-window
//! estimate. A failing indicator (for example a zero period) is reported as an
//! [`IndicatorFailure`] and does not prevent its siblings from being computed.

mod atr;
mod bollinger;
mod cci;
mod macd;
mod rsi;
mod stochastic;
mod williams;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use atr::Atr;
pub use bollinger::Bollinger;
pub use cci::Cci;
pub use macd::Macd;
pub use rsi::Rsi;
pub use stochastic::{Kdj, Stochastic};
pub use williams::WilliamsR;

use crate::{AnalyticsError, Bar, BarSeries, IndicatorTable, Symbol, ValidationError};

/// The eight supported indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum IndicatorKind {
    Macd,
    Rsi,
    Kdj,
    Boll,
    Wr,
    Stoch,
    Cci,
    Atr,
}

impl IndicatorKind {
    pub const ALL: [Self; 8] = [
        Self::Macd,
        Self::Rsi,
        Self::Kdj,
        Self::Boll,
        Self::Wr,
        Self::Stoch,
        Self::Cci,
        Self::Atr,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Macd => "MACD",
            Self::Rsi => "RSI",
            Self::Kdj => "KDJ",
            Self::Boll => "BOLL",
            Self::Wr => "WR",
            Self::Stoch => "STOCH",
            Self::Cci => "CCI",
            Self::Atr => "ATR",
        }
    }

    /// Parse a comma separated list such as `"macd, rsi,BB"`.
    pub fn parse_list(input: &str) -> Result<Vec<Self>, ValidationError> {
        let mut kinds = Vec::new();
        for part in input.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            let kind = part.parse::<Self>()?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Ok(kinds)
    }
}

impl Display for IndicatorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndicatorKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MACD" => Ok(Self::Macd),
            "RSI" => Ok(Self::Rsi),
            "KDJ" => Ok(Self::Kdj),
            "BOLL" | "BB" => Ok(Self::Boll),
            "WR" => Ok(Self::Wr),
            "STOCH" => Ok(Self::Stoch),
            "CCI" => Ok(Self::Cci),
            "ATR" => Ok(Self::Atr),
            _ => Err(ValidationError::UnknownIndicator {
                value: s.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for IndicatorKind {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IndicatorKind> for String {
    fn from(value: IndicatorKind) -> Self {
        value.as_str().to_owned()
    }
}

/// A windowed indicator producing one or more aligned columns.
pub trait Indicator {
    fn kind(&self) -> IndicatorKind;

    /// Column names in output order.
    fn columns(&self) -> &'static [&'static str];

    /// Index of the first bar with a defined primary value.
    fn lookback(&self) -> usize;

    fn validate(&self) -> Result<(), AnalyticsError>;

    /// One `bars.len()`-long column per entry of [`Indicator::columns`].
    fn compute(&self, bars: &[Bar]) -> Result<Vec<Vec<Option<f64>>>, AnalyticsError>;
}

/// Per-indicator parameters plus the requested subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndicatorOptions {
    pub indicators: Vec<IndicatorKind>,
    pub macd: Macd,
    pub rsi: Rsi,
    pub kdj: Kdj,
    pub boll: Bollinger,
    pub wr: WilliamsR,
    pub stoch: Stochastic,
    pub cci: Cci,
    pub atr: Atr,
}

impl Default for IndicatorOptions {
    fn default() -> Self {
        Self {
            indicators: IndicatorKind::ALL.to_vec(),
            macd: Macd::default(),
            rsi: Rsi::default(),
            kdj: Kdj::default(),
            boll: Bollinger::default(),
            wr: WilliamsR::default(),
            stoch: Stochastic::default(),
            cci: Cci::default(),
            atr: Atr::default(),
        }
    }
}

impl IndicatorOptions {
    pub fn with_indicators(mut self, indicators: Vec<IndicatorKind>) -> Self {
        self.indicators = indicators;
        self
    }

    pub fn indicator(&self, kind: IndicatorKind) -> &dyn Indicator {
        match kind {
            IndicatorKind::Macd => &self.macd,
            IndicatorKind::Rsi => &self.rsi,
            IndicatorKind::Kdj => &self.kdj,
            IndicatorKind::Boll => &self.boll,
            IndicatorKind::Wr => &self.wr,
            IndicatorKind::Stoch => &self.stoch,
            IndicatorKind::Cci => &self.cci,
            IndicatorKind::Atr => &self.atr,
        }
    }

    /// Checks the selection and every configured parameter set.
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if self.indicators.is_empty() {
            return Err(AnalyticsError::invalid_parameter(
                "indicators",
                "at least one indicator is required",
            ));
        }
        IndicatorKind::ALL
            .iter()
            .try_for_each(|kind| self.indicator(*kind).validate())
    }
}

/// An indicator that could not be computed for this request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorFailure {
    pub indicator: IndicatorKind,
    pub code: String,
    pub message: String,
}

impl IndicatorFailure {
    fn new(indicator: IndicatorKind, error: &AnalyticsError) -> Self {
        Self {
            indicator,
            code: error.code().to_owned(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReport {
    pub symbol: Symbol,
    pub table: IndicatorTable,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<IndicatorFailure>,
}

impl IndicatorReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Compute the requested indicators over `series`.
///
/// Fails only when there is nothing to compute on (empty series or empty
/// selection); per-indicator problems land in [`IndicatorReport::failures`].
pub fn compute_indicators(
    series: &BarSeries,
    options: &IndicatorOptions,
) -> Result<IndicatorReport, AnalyticsError> {
    if series.is_empty() {
        return Err(AnalyticsError::insufficient_data("indicators", 1, 0));
    }
    if options.indicators.is_empty() {
        return Err(AnalyticsError::invalid_parameter(
            "indicators",
            "at least one indicator is required",
        ));
    }
    tracing::debug!(
        symbol = %series.symbol,
        bars = series.len(),
        indicators = ?options.indicators,
        "computing indicators"
    );

    let mut table = IndicatorTable::with_axis(series.bars.iter().map(|bar| (bar.date, bar.close)));
    let mut failures = Vec::new();
    let mut seen = Vec::with_capacity(options.indicators.len());

    for kind in &options.indicators {
        if seen.contains(kind) {
            continue;
        }
        seen.push(*kind);

        let indicator = options.indicator(*kind);
        match indicator.compute(&series.bars) {
            Ok(columns) => {
                for (name, values) in indicator.columns().iter().zip(columns) {
                    table.insert_column(name, values);
                }
            }
            Err(err) => {
                tracing::warn!(
                    symbol = %series.symbol,
                    indicator = %kind,
                    error = %err,
                    "indicator failed, continuing with siblings"
                );
                failures.push(IndicatorFailure::new(*kind, &err));
            }
        }
    }

    Ok(IndicatorReport {
        symbol: series.symbol.clone(),
        table,
        failures,
    })
}

pub(crate) fn require_period(name: &'static str, period: usize) -> Result<(), AnalyticsError> {
    if period == 0 {
        return Err(AnalyticsError::invalid_parameter(
            name,
            "period must be positive",
        ));
    }
    Ok(())
}

/// Highest high and lowest low of the trailing `period` bars.
pub(crate) fn rolling_range(bars: &[Bar], period: usize) -> Vec<Option<(f64, f64)>> {
    let mut out = vec![None; bars.len()];
    if period == 0 || bars.len() < period {
        return out;
    }
    for (offset, window) in bars.windows(period).enumerate() {
        let high = window.iter().map(|bar| bar.high).fold(f64::MIN, f64::max);
        let low = window.iter().map(|bar| bar.low).fold(f64::MAX, f64::min);
        out[offset + period - 1] = Some((high, low));
    }
    out
}

pub(crate) fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|bar| bar.close).collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{Bar, TradingDate};

    /// Consecutive calendar days starting 2024-01-01 with the given closes;
    /// high/low are close ± 1.
    pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        let start = TradingDate::parse("2024-01-01").expect("date").into_inner();
        closes
            .iter()
            .enumerate()
            .map(|(day, close)| {
                let date = start
                    .checked_add(time::Duration::days(day as i64))
                    .expect("in range");
                Bar::new(
                    TradingDate::from_date(date),
                    *close,
                    close + 1.0,
                    (close - 1.0).max(0.0),
                    *close,
                    Some(1_000.0),
                )
                .expect("bar")
            })
            .collect()
    }

    pub fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("defined value");
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }
}
