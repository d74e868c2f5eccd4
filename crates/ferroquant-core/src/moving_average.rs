//! Simple, exponential and weighted moving averages plus the trend signals
//! derived from them.
//!
//! The window kernels (`sma`, `ema`, `wma`) are shared with the indicator
//! engine. Every kernel returns one slot per input value; a slot is `None`
//! until the window is full.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    AnalyticsError, BarSeries, IndicatorTable, MetricFailure, Symbol, TradingDate,
    ValidationError,
};

pub const DEFAULT_MA_PERIODS: [usize; 6] = [5, 10, 20, 50, 120, 250];

/// Arithmetic mean of the trailing `period` values.
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    for (offset, window) in values.windows(period).enumerate() {
        out[offset + period - 1] = Some(window.iter().sum::<f64>() / period as f64);
    }
    out
}

/// EMA with `alpha = 2 / (period + 1)`, seeded by the SMA of the first
/// `period` values.
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(prev);
    for (index, value) in values.iter().enumerate().skip(period) {
        prev = alpha * value + (1.0 - alpha) * prev;
        out[index] = Some(prev);
    }
    out
}

/// Linearly weighted mean; the most recent value has weight `period`.
pub fn wma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    let denominator = (period * (period + 1)) as f64 / 2.0;
    for (offset, window) in values.windows(period).enumerate() {
        let weighted = window
            .iter()
            .enumerate()
            .map(|(i, value)| (i + 1) as f64 * value)
            .sum::<f64>();
        out[offset + period - 1] = Some(weighted / denominator);
    }
    out
}

/// Apply `kernel` to the contiguous run of defined values that starts at the
/// first `Some`, keeping everything before it undefined.
fn over_defined<F>(values: &[Option<f64>], period: usize, kernel: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64], usize) -> Vec<Option<f64>>,
{
    let mut out = vec![None; values.len()];
    let Some(start) = values.iter().position(Option::is_some) else {
        return out;
    };
    let dense: Vec<f64> = values[start..].iter().map_while(|value| *value).collect();
    for (offset, value) in kernel(&dense, period).into_iter().enumerate() {
        out[start + offset] = value;
    }
    out
}

pub(crate) fn sma_defined(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    over_defined(values, period, sma)
}

pub(crate) fn ema_defined(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    over_defined(values, period, ema)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaKind {
    #[default]
    Sma,
    Ema,
    Wma,
}

impl MaKind {
    pub const ALL: [Self; 3] = [Self::Sma, Self::Ema, Self::Wma];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sma => "SMA",
            Self::Ema => "EMA",
            Self::Wma => "WMA",
        }
    }

    pub fn column(self, period: usize) -> String {
        format!("{}_{period}", self.as_str())
    }

    pub fn apply(self, values: &[f64], period: usize) -> Vec<Option<f64>> {
        match self {
            Self::Sma => sma(values, period),
            Self::Ema => ema(values, period),
            Self::Wma => wma(values, period),
        }
    }
}

impl Display for MaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SMA" => Ok(Self::Sma),
            "EMA" => Ok(Self::Ema),
            "WMA" => Ok(Self::Wma),
            _ => Err(ValidationError::UnknownMovingAverage {
                value: s.to_owned(),
            }),
        }
    }
}

/// Short/long period pair watched for crossovers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrossoverPair {
    pub short: usize,
    pub long: usize,
    #[serde(default)]
    pub kind: MaKind,
}

impl Default for CrossoverPair {
    fn default() -> Self {
        Self {
            short: 5,
            long: 20,
            kind: MaKind::Sma,
        }
    }
}

impl CrossoverPair {
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if self.short == 0 {
            return Err(AnalyticsError::invalid_parameter(
                "crossover.short",
                "period must be positive",
            ));
        }
        if self.short >= self.long {
            return Err(AnalyticsError::invalid_parameter(
                "crossover.long",
                format!(
                    "long period {} must exceed short period {}",
                    self.long, self.short
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MovingAverageOptions {
    pub periods: Vec<usize>,
    pub kinds: Vec<MaKind>,
    pub crossover: Option<CrossoverPair>,
}

impl Default for MovingAverageOptions {
    fn default() -> Self {
        Self {
            periods: DEFAULT_MA_PERIODS.to_vec(),
            kinds: MaKind::ALL.to_vec(),
            crossover: Some(CrossoverPair::default()),
        }
    }
}

impl MovingAverageOptions {
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if self.periods.is_empty() {
            return Err(AnalyticsError::invalid_parameter(
                "periods",
                "at least one period is required",
            ));
        }
        if self.kinds.is_empty() {
            return Err(AnalyticsError::invalid_parameter(
                "kinds",
                "at least one moving average kind is required",
            ));
        }
        if let Some(pair) = &self.crossover {
            pair.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricePosition {
    Above,
    Below,
    At,
}

/// Latest close measured against one moving average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaPosition {
    pub kind: MaKind,
    pub period: usize,
    pub value: Option<f64>,
    pub deviation_pct: Option<f64>,
    pub position: Option<PricePosition>,
}

impl MaPosition {
    fn measure(kind: MaKind, period: usize, close: f64, value: Option<f64>) -> Self {
        let deviation_pct = value
            .filter(|ma| *ma != 0.0)
            .map(|ma| (close / ma - 1.0) * 100.0);
        let position = value.map(|ma| {
            if close > ma {
                PricePosition::Above
            } else if close < ma {
                PricePosition::Below
            } else {
                PricePosition::At
            }
        });
        Self {
            kind,
            period,
            value,
            deviation_pct,
            position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossSignal {
    /// Short average crossed above the long one.
    GoldenCross,
    /// Short average crossed below the long one.
    DeathCross,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossoverEvent {
    pub date: TradingDate,
    pub signal: CrossSignal,
    pub short_value: f64,
    pub long_value: f64,
}

/// Sign changes of `short − long` between consecutive defined dates.
///
/// A zero spread carries no sign: `−, 0, +` is one golden cross reported on
/// the date the spread turns positive.
pub fn detect_crossovers(
    dates: &[TradingDate],
    short: &[Option<f64>],
    long: &[Option<f64>],
) -> Vec<CrossoverEvent> {
    let mut events = Vec::new();
    let mut last_sign = 0.0_f64;

    for ((date, short), long) in dates.iter().zip(short).zip(long) {
        let (Some(short), Some(long)) = (short, long) else {
            continue;
        };
        let spread = short - long;
        if spread == 0.0 {
            continue;
        }
        let sign = spread.signum();
        if last_sign != 0.0 && sign != last_sign {
            events.push(CrossoverEvent {
                date: *date,
                signal: if sign > 0.0 {
                    CrossSignal::GoldenCross
                } else {
                    CrossSignal::DeathCross
                },
                short_value: *short,
                long_value: *long,
            });
        }
        last_sign = sign;
    }

    events
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverageReport {
    pub symbol: Symbol,
    pub latest_close: f64,
    pub table: IndicatorTable,
    pub positions: Vec<MaPosition>,
    pub crossover: Option<CrossoverPair>,
    pub crossovers: Vec<CrossoverEvent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<MetricFailure>,
}

/// Compute every requested `(kind, period)` column, the latest position
/// summary and the crossover events of the configured pair.
///
/// A zero period or a bad crossover pair is reported as a failure while the
/// remaining columns are still produced.
pub fn compute_moving_averages(
    series: &BarSeries,
    options: &MovingAverageOptions,
) -> Result<MovingAverageReport, AnalyticsError> {
    let Some(last) = series.bars.last() else {
        return Err(AnalyticsError::insufficient_data("moving averages", 1, 0));
    };
    tracing::debug!(
        symbol = %series.symbol,
        bars = series.len(),
        periods = ?options.periods,
        "computing moving averages"
    );

    let closes = series.closes();
    let dates = series.dates();
    let mut table = IndicatorTable::with_axis(dates.iter().copied().zip(closes.iter().copied()));
    let mut positions = Vec::new();
    let mut failures = Vec::new();

    let mut periods = options.periods.clone();
    periods.sort_unstable();
    periods.dedup();

    for period in periods {
        if period == 0 {
            let err = AnalyticsError::invalid_parameter("periods", "period must be positive");
            tracing::warn!(symbol = %series.symbol, error = %err, "skipping moving average");
            failures.push(MetricFailure::new("MA_0", &err));
            continue;
        }
        for kind in &options.kinds {
            let values = kind.apply(&closes, period);
            let latest = values.last().copied().flatten();
            positions.push(MaPosition::measure(*kind, period, last.close, latest));
            table.insert_column(&kind.column(period), values);
        }
    }

    let mut crossovers = Vec::new();
    if let Some(pair) = &options.crossover {
        match pair.validate() {
            Ok(()) => {
                let short = pair.kind.apply(&closes, pair.short);
                let long = pair.kind.apply(&closes, pair.long);
                crossovers = detect_crossovers(&dates, &short, &long);
            }
            Err(err) => {
                tracing::warn!(symbol = %series.symbol, error = %err, "skipping crossovers");
                failures.push(MetricFailure::new("crossover", &err));
            }
        }
    }

    Ok(MovingAverageReport {
        symbol: series.symbol.clone(),
        latest_close: last.close,
        table,
        positions,
        crossover: options.crossover,
        crossovers,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("defined value");
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn sma_is_undefined_until_window_is_full() {
        let out = sma(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_close(out[2], 2.0);
        assert_close(out[3], 3.0);
    }

    #[test]
    fn ema_is_seeded_by_sma() {
        let out = ema(&[2.0, 4.0, 6.0, 8.0], 3);
        assert_eq!(out[1], None);
        assert_close(out[2], 4.0);
        // alpha = 0.5
        assert_close(out[3], 6.0);
    }

    #[test]
    fn wma_weights_most_recent_highest() {
        let out = wma(&[1.0, 2.0, 3.0], 3);
        // (1*1 + 2*2 + 3*3) / 6
        assert_close(out[2], 14.0 / 6.0);
    }

    #[test]
    fn short_input_yields_only_undefined() {
        assert!(ema(&[1.0, 2.0], 5).iter().all(Option::is_none));
        assert!(sma(&[1.0], 0).iter().all(Option::is_none));
    }

    #[test]
    fn defined_kernels_skip_leading_gaps() {
        let out = sma_defined(&[None, None, Some(1.0), Some(3.0), Some(5.0)], 2);
        assert_eq!(out[2], None);
        assert_close(out[3], 2.0);
        assert_close(out[4], 4.0);
    }

    #[test]
    fn detects_golden_and_death_crosses() {
        let dates: Vec<TradingDate> = (1..=5)
            .map(|day| TradingDate::parse(&format!("2024-01-0{day}")).expect("date"))
            .collect();
        let short = [None, Some(1.0), Some(3.0), Some(3.0), Some(1.0)];
        let long = [None, Some(2.0), Some(2.0), Some(3.0), Some(2.0)];

        let events = detect_crossovers(&dates, &short, &long);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].signal, CrossSignal::GoldenCross);
        assert_eq!(events[0].date, dates[2]);
        assert_eq!(events[1].signal, CrossSignal::DeathCross);
        assert_eq!(events[1].date, dates[4]);
    }

    #[test]
    fn parses_kind_case_insensitively() {
        assert_eq!("ema".parse::<MaKind>().expect("kind"), MaKind::Ema);
        assert!("hma".parse::<MaKind>().is_err());
    }

    #[test]
    fn rejects_inverted_crossover_pair() {
        let pair = CrossoverPair {
            short: 20,
            long: 5,
            kind: MaKind::Sma,
        };
        let err = pair.validate().expect_err("must fail");
        assert!(matches!(err, AnalyticsError::InvalidParameter { .. }));
    }
}
