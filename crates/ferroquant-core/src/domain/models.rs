use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Symbol, TradingDate, ValidationError};

/// OHLCV bar for one trading session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: TradingDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
}

impl Bar {
    pub fn new(
        date: TradingDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: Option<f64>,
    ) -> Result<Self, ValidationError> {
        let bar = Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        };
        bar.validate()?;
        Ok(bar)
    }

    /// Re-checks the invariants `new` enforces; used for deserialized bars.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_non_negative("open", self.open)?;
        validate_non_negative("high", self.high)?;
        validate_non_negative("low", self.low)?;
        validate_non_negative("close", self.close)?;
        validate_optional_non_negative("volume", self.volume)?;

        if self.high < self.low {
            return Err(ValidationError::InvalidBarRange);
        }

        if self.open < self.low
            || self.open > self.high
            || self.close < self.low
            || self.close > self.high
        {
            return Err(ValidationError::InvalidBarBounds);
        }

        Ok(())
    }

    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// Chronological bar sequence for one symbol.
///
/// Dates are strictly increasing. Gaps (non-trading days) are valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBarSeries")]
pub struct BarSeries {
    pub symbol: Symbol,
    pub bars: Vec<Bar>,
}

#[derive(Deserialize)]
struct RawBarSeries {
    symbol: Symbol,
    bars: Vec<Bar>,
}

impl TryFrom<RawBarSeries> for BarSeries {
    type Error = ValidationError;

    fn try_from(raw: RawBarSeries) -> Result<Self, Self::Error> {
        Self::new(raw.symbol, raw.bars)
    }
}

impl BarSeries {
    pub fn new(symbol: Symbol, bars: Vec<Bar>) -> Result<Self, ValidationError> {
        for bar in &bars {
            bar.validate()?;
        }

        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(ValidationError::UnorderedBars {
                    previous: pair[0].date.to_string(),
                    next: pair[1].date.to_string(),
                });
            }
        }

        Ok(Self { symbol, bars })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }

    pub fn dates(&self) -> Vec<TradingDate> {
        self.bars.iter().map(|bar| bar.date).collect()
    }

    pub fn last_date(&self) -> Option<TradingDate> {
        self.bars.last().map(|bar| bar.date)
    }

    /// Bars whose date falls inside `[start, end]`; either bound may be open.
    pub fn window(&self, start: Option<TradingDate>, end: Option<TradingDate>) -> Self {
        let bars = self
            .bars
            .iter()
            .filter(|bar| start.map_or(true, |start| bar.date >= start))
            .filter(|bar| end.map_or(true, |end| bar.date <= end))
            .cloned()
            .collect();

        Self {
            symbol: self.symbol.clone(),
            bars,
        }
    }

    /// The most recent `n` bars.
    pub fn tail(&self, n: usize) -> Self {
        let skip = self.bars.len().saturating_sub(n);
        Self {
            symbol: self.symbol.clone(),
            bars: self.bars[skip..].to_vec(),
        }
    }
}

/// Fiscal quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const fn number(self) -> u8 {
        match self {
            Self::Q1 => 1,
            Self::Q2 => 2,
            Self::Q3 => 3,
            Self::Q4 => 4,
        }
    }
}

impl TryFrom<u8> for Quarter {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Q1),
            2 => Ok(Self::Q2),
            3 => Ok(Self::Q3),
            4 => Ok(Self::Q4),
            other => Err(ValidationError::InvalidQuarter {
                value: other.to_string(),
            }),
        }
    }
}

impl From<Quarter> for u8 {
    fn from(value: Quarter) -> Self {
        value.number()
    }
}

impl FromStr for Quarter {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim().trim_start_matches(['q', 'Q']);
        trimmed
            .parse::<u8>()
            .map_err(|_| ValidationError::InvalidQuarter {
                value: value.to_owned(),
            })
            .and_then(Self::try_from)
    }
}

impl Display for Quarter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Q{}", self.number())
    }
}

/// Per-quarter fundamentals as retrieved from the provider.
///
/// Every figure is optional: `None` means the provider reported it as
/// unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalSnapshot {
    pub symbol: Symbol,
    pub year: i32,
    pub quarter: Quarter,
    #[serde(default)]
    pub net_profit: Option<f64>,
    #[serde(default)]
    pub eps: Option<f64>,
    #[serde(default)]
    pub free_cash_flow: Option<f64>,
    #[serde(default)]
    pub operating_cash_flow: Option<f64>,
    #[serde(default)]
    pub pe_ttm: Option<f64>,
    #[serde(default)]
    pub pb_mrq: Option<f64>,
    #[serde(default)]
    pub ps_ttm: Option<f64>,
    #[serde(default)]
    pub dividend_per_share: Option<f64>,
    #[serde(default)]
    pub total_liabilities: Option<f64>,
    #[serde(default)]
    pub total_shares: Option<f64>,
    #[serde(default)]
    pub industry: Option<String>,
}

impl FundamentalSnapshot {
    pub fn new(symbol: Symbol, year: i32, quarter: Quarter) -> Self {
        Self {
            symbol,
            year,
            quarter,
            net_profit: None,
            eps: None,
            free_cash_flow: None,
            operating_cash_flow: None,
            pe_ttm: None,
            pb_mrq: None,
            ps_ttm: None,
            dividend_per_share: None,
            total_liabilities: None,
            total_shares: None,
            industry: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_optional_finite("net_profit", self.net_profit)?;
        validate_optional_finite("eps", self.eps)?;
        validate_optional_finite("free_cash_flow", self.free_cash_flow)?;
        validate_optional_finite("operating_cash_flow", self.operating_cash_flow)?;
        validate_optional_finite("pe_ttm", self.pe_ttm)?;
        validate_optional_finite("pb_mrq", self.pb_mrq)?;
        validate_optional_finite("ps_ttm", self.ps_ttm)?;
        validate_optional_non_negative("dividend_per_share", self.dividend_per_share)?;
        validate_optional_non_negative("total_liabilities", self.total_liabilities)?;
        validate_optional_non_negative("total_shares", self.total_shares)?;
        Ok(())
    }

    const fn period_key(&self) -> (i32, u8) {
        (self.year, self.quarter.number())
    }
}

/// Fundamentals for one symbol ordered by `(year, quarter)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundamentalHistory {
    pub symbol: Symbol,
    snapshots: Vec<FundamentalSnapshot>,
}

impl FundamentalHistory {
    /// Keeps the snapshots belonging to `symbol`, sorted chronologically.
    /// Later duplicates of the same period replace earlier ones.
    pub fn new(
        symbol: Symbol,
        snapshots: Vec<FundamentalSnapshot>,
    ) -> Result<Self, ValidationError> {
        let mut kept: Vec<FundamentalSnapshot> = Vec::with_capacity(snapshots.len());
        for snapshot in snapshots.into_iter().filter(|s| s.symbol == symbol) {
            snapshot.validate()?;
            match kept
                .iter_mut()
                .find(|existing| existing.period_key() == snapshot.period_key())
            {
                Some(existing) => *existing = snapshot,
                None => kept.push(snapshot),
            }
        }
        kept.sort_by_key(FundamentalSnapshot::period_key);

        Ok(Self {
            symbol,
            snapshots: kept,
        })
    }

    pub fn snapshots(&self) -> &[FundamentalSnapshot] {
        &self.snapshots
    }

    pub fn get(&self, year: i32, quarter: Quarter) -> Option<&FundamentalSnapshot> {
        self.snapshots
            .iter()
            .find(|snapshot| snapshot.year == year && snapshot.quarter == quarter)
    }

    pub fn latest(&self) -> Option<&FundamentalSnapshot> {
        self.snapshots.last()
    }

    /// Fiscal-year values of `field` taken from Q4 snapshots, oldest first.
    /// Years where the figure is unavailable are skipped.
    pub fn annual_series<F>(&self, field: F) -> Vec<(i32, f64)>
    where
        F: Fn(&FundamentalSnapshot) -> Option<f64>,
    {
        self.snapshots
            .iter()
            .filter(|snapshot| snapshot.quarter == Quarter::Q4)
            .filter_map(|snapshot| field(snapshot).map(|value| (snapshot.year, value)))
            .collect()
    }
}

/// Daily valuation ratios reported alongside the close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationSnapshot {
    pub date: TradingDate,
    pub close: f64,
    #[serde(default)]
    pub pe_ttm: Option<f64>,
    #[serde(default)]
    pub pb_mrq: Option<f64>,
    #[serde(default)]
    pub ps_ttm: Option<f64>,
    #[serde(default)]
    pub pcf_ttm: Option<f64>,
}

/// One company's valuation ratios for industry comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerValuation {
    pub symbol: Symbol,
    #[serde(default)]
    pub name: Option<String>,
    pub industry: String,
    #[serde(default)]
    pub pe_ttm: Option<f64>,
    #[serde(default)]
    pub pb_mrq: Option<f64>,
    #[serde(default)]
    pub ps_ttm: Option<f64>,
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

fn validate_optional_non_negative(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(value) = value {
        validate_non_negative(field, value)?;
    }
    Ok(())
}

fn validate_optional_finite(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(value) = value {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue { field });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> TradingDate {
        TradingDate::parse(value).expect("date")
    }

    #[test]
    fn rejects_invalid_bar_bounds() {
        let err = Bar::new(date("2024-01-02"), 10.0, 12.0, 9.0, 12.5, Some(10.0))
            .expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidBarBounds));
    }

    #[test]
    fn rejects_duplicate_bar_dates() {
        let symbol = Symbol::parse("sh.600000").expect("symbol");
        let bar = Bar::new(date("2024-01-02"), 10.0, 11.0, 9.0, 10.5, None).expect("bar");
        let err = BarSeries::new(symbol, vec![bar.clone(), bar]).expect_err("must fail");
        assert!(matches!(err, ValidationError::UnorderedBars { .. }));
    }

    #[test]
    fn deserialized_series_is_validated() {
        let raw = r#"{"symbol":"sh.600000","bars":[
            {"date":"2024-01-03","open":10,"high":11,"low":9,"close":10},
            {"date":"2024-01-02","open":10,"high":11,"low":9,"close":10}]}"#;
        let err = serde_json::from_str::<BarSeries>(raw).expect_err("must fail");
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn windows_by_inclusive_dates() {
        let symbol = Symbol::parse("sh.600000").expect("symbol");
        let bars = ["2024-01-02", "2024-01-03", "2024-01-05"]
            .iter()
            .map(|d| Bar::new(date(d), 10.0, 11.0, 9.0, 10.0, None).expect("bar"))
            .collect();
        let series = BarSeries::new(symbol, bars).expect("series");

        let window = series.window(Some(date("2024-01-03")), None);
        assert_eq!(window.len(), 2);
        assert_eq!(window.bars[0].date, date("2024-01-03"));
    }

    #[test]
    fn parses_quarter_labels() {
        assert_eq!("Q3".parse::<Quarter>().expect("quarter"), Quarter::Q3);
        assert_eq!("4".parse::<Quarter>().expect("quarter"), Quarter::Q4);
        assert!(matches!(
            "5".parse::<Quarter>(),
            Err(ValidationError::InvalidQuarter { .. })
        ));
    }

    #[test]
    fn history_sorts_and_extracts_annual_values() {
        let symbol = Symbol::parse("sz.000001").expect("symbol");
        let mut later = FundamentalSnapshot::new(symbol.clone(), 2023, Quarter::Q4);
        later.free_cash_flow = Some(120.0);
        let mut earlier = FundamentalSnapshot::new(symbol.clone(), 2022, Quarter::Q4);
        earlier.free_cash_flow = Some(100.0);
        let interim = FundamentalSnapshot::new(symbol.clone(), 2023, Quarter::Q2);

        let history =
            FundamentalHistory::new(symbol, vec![later, interim, earlier]).expect("history");

        assert_eq!(
            history.annual_series(|s| s.free_cash_flow),
            vec![(2022, 100.0), (2023, 120.0)]
        );
        assert_eq!(history.latest().map(|s| s.year), Some(2023));
    }
}
