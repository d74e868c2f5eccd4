//! # Risk Metrics Engine
//!
//! Asset-versus-benchmark risk over aligned daily simple returns.
//!
//! | Metric | Definition |
//! |--------|------------|
//! | beta | `cov(a, b) / var(b)` |
//! | alpha | `mean(a) − beta × mean(b)` (per period, not annualized) |
//! | volatility | `std(a) × √A` |
//! | Sharpe | `(mean(a) − rf / A) / std(a) × √A` |
//! | Sortino | `(mean(a) − target) / downside_deviation` |
//! | max drawdown | `min(price / running_max − 1)` |
//! | downside deviation | `std(a where a < 0) × √A` |
//!
//! `A` is the annualization factor (252 for daily bars). Variances and
//! covariances use the sample (n − 1) estimator.
//!
//! Zero benchmark variance fails the whole report because beta is undefined.
//! Any other zero denominator only drops that ratio and records a
//! [`MetricFailure`].

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::align::{align_pair, AlignedPair, ReturnSeries};
use crate::{
    stats, AnalyticsError, BarSeries, Cell, MetricFailure, Symbol, Table, TradingDate,
    ValidationError,
};

pub const DEFAULT_BENCHMARK: &str = "sh.000300";
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Calendar lookback applied relative to the asset's last bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RiskPeriod {
    ThreeMonths,
    SixMonths,
    #[default]
    OneYear,
    TwoYears,
}

impl RiskPeriod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ThreeMonths => "3M",
            Self::SixMonths => "6M",
            Self::OneYear => "1Y",
            Self::TwoYears => "2Y",
        }
    }

    pub const fn days(self) -> i64 {
        match self {
            Self::ThreeMonths => 90,
            Self::SixMonths => 180,
            Self::OneYear => 365,
            Self::TwoYears => 730,
        }
    }
}

impl Display for RiskPeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskPeriod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "3M" => Ok(Self::ThreeMonths),
            "6M" => Ok(Self::SixMonths),
            "1Y" => Ok(Self::OneYear),
            "2Y" => Ok(Self::TwoYears),
            _ => Err(ValidationError::InvalidRiskPeriod {
                value: s.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for RiskPeriod {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RiskPeriod> for String {
    fn from(value: RiskPeriod) -> Self {
        value.as_str().to_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskOptions {
    pub benchmark: String,
    /// `None` uses every supplied bar.
    pub period: Option<RiskPeriod>,
    /// Annual rate, e.g. `0.03`.
    pub risk_free_rate: f64,
    pub annualization_factor: f64,
    /// Per-period target return for Sortino.
    pub target_return: f64,
}

impl Default for RiskOptions {
    fn default() -> Self {
        Self {
            benchmark: String::from(DEFAULT_BENCHMARK),
            period: Some(RiskPeriod::OneYear),
            risk_free_rate: 0.03,
            annualization_factor: TRADING_DAYS_PER_YEAR,
            target_return: 0.0,
        }
    }
}

impl RiskOptions {
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        Symbol::parse(&self.benchmark)?;
        if !self.risk_free_rate.is_finite() {
            return Err(AnalyticsError::invalid_parameter(
                "risk_free_rate",
                "must be finite",
            ));
        }
        if !self.annualization_factor.is_finite() || self.annualization_factor <= 0.0 {
            return Err(AnalyticsError::invalid_parameter(
                "annualization_factor",
                format!("must be positive, got {}", self.annualization_factor),
            ));
        }
        if !self.target_return.is_finite() {
            return Err(AnalyticsError::invalid_parameter(
                "target_return",
                "must be finite",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetaProfile {
    /// beta > 1.2
    Aggressive,
    Neutral,
    /// beta < 0.8
    Defensive,
}

impl BetaProfile {
    pub fn classify(beta: f64) -> Self {
        if beta > 1.2 {
            Self::Aggressive
        } else if beta < 0.8 {
            Self::Defensive
        } else {
            Self::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharpeGrade {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl SharpeGrade {
    pub fn classify(sharpe: f64) -> Self {
        if sharpe > 1.0 {
            Self::Excellent
        } else if sharpe > 0.5 {
            Self::Good
        } else if sharpe > 0.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    Strong,
    Moderate,
    Weak,
}

impl CorrelationStrength {
    pub fn classify(correlation: f64) -> Self {
        let magnitude = correlation.abs();
        if magnitude > 0.7 {
            Self::Strong
        } else if magnitude > 0.3 {
            Self::Moderate
        } else {
            Self::Weak
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskInterpretation {
    pub beta: BetaProfile,
    pub sharpe: Option<SharpeGrade>,
    pub correlation: Option<CorrelationStrength>,
}

/// Scalar metrics plus the aligned returns they were computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub observations: usize,
    pub beta: f64,
    pub alpha: f64,
    pub volatility: f64,
    pub benchmark_volatility: f64,
    pub sharpe: Option<f64>,
    pub benchmark_sharpe: Option<f64>,
    pub sortino: Option<f64>,
    pub max_drawdown: f64,
    pub downside_deviation: f64,
    pub annualized_return: f64,
    pub benchmark_annualized_return: f64,
    pub excess_return: f64,
    pub tracking_error: f64,
    pub information_ratio: Option<f64>,
    pub correlation: Option<f64>,
    pub interpretation: RiskInterpretation,
    pub aligned: AlignedPair,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<MetricFailure>,
}

impl RiskMetrics {
    /// `metric, value` rows for the formatter.
    pub fn summary_table(&self) -> Table {
        let rows: [(&str, Option<f64>); 15] = [
            ("beta", Some(self.beta)),
            ("alpha", Some(self.alpha)),
            ("volatility", Some(self.volatility)),
            ("benchmark_volatility", Some(self.benchmark_volatility)),
            ("sharpe", self.sharpe),
            ("benchmark_sharpe", self.benchmark_sharpe),
            ("sortino", self.sortino),
            ("max_drawdown", Some(self.max_drawdown)),
            ("downside_deviation", Some(self.downside_deviation)),
            ("annualized_return", Some(self.annualized_return)),
            ("benchmark_annualized_return", Some(self.benchmark_annualized_return)),
            ("excess_return", Some(self.excess_return)),
            ("tracking_error", Some(self.tracking_error)),
            ("information_ratio", self.information_ratio),
            ("correlation", self.correlation),
        ];
        let mut table = Table::new(["metric", "value"]);
        table.rows = rows
            .into_iter()
            .map(|(name, value)| vec![Cell::from(name), Cell::from(value)])
            .collect();
        table
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub symbol: Symbol,
    pub benchmark: Symbol,
    pub period: Option<RiskPeriod>,
    pub start: TradingDate,
    pub end: TradingDate,
    pub metrics: RiskMetrics,
}

/// `min over t of (price[t] / max(price[..=t]) − 1)`; 0 for empty or
/// never-declining input.
pub fn max_drawdown(prices: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0_f64;
    for &price in prices {
        peak = peak.max(price);
        if peak > 0.0 {
            worst = worst.min(price / peak - 1.0);
        }
    }
    worst
}

/// `(1 + total)^(A / n) − 1` for `n` compounded period returns.
pub fn annualized_return(returns: &[f64], annualization_factor: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let total = returns.iter().map(|r| 1.0 + r).product::<f64>() - 1.0;
    (1.0 + total).powf(annualization_factor / returns.len() as f64) - 1.0
}

/// Annualized sample deviation of the negative returns; 0 when fewer than two
/// returns are negative.
pub fn downside_deviation(returns: &[f64], annualization_factor: f64) -> f64 {
    let negatives: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    stats::sample_std(&negatives)
        .map(|std| std * annualization_factor.sqrt())
        .unwrap_or(0.0)
}

fn ratio(
    metric: &str,
    numerator: f64,
    denominator: f64,
    failures: &mut Vec<MetricFailure>,
) -> Option<f64> {
    if denominator == 0.0 || !denominator.is_finite() {
        let err = AnalyticsError::degenerate(format!("{metric} denominator is zero"));
        failures.push(MetricFailure::new(metric, &err));
        return None;
    }
    Some(numerator / denominator)
}

/// Metrics over an already aligned pair.
///
/// `prices` feeds max drawdown; without it the drawdown is taken on the
/// wealth curve compounded from the asset returns.
pub fn risk_metrics(
    aligned: AlignedPair,
    prices: Option<&[f64]>,
    options: &RiskOptions,
) -> Result<RiskMetrics, AnalyticsError> {
    options.validate()?;
    if aligned.len() < 2 {
        return Err(AnalyticsError::alignment(format!(
            "risk metrics need at least 2 common return dates, got {}",
            aligned.len()
        )));
    }

    let factor = options.annualization_factor;
    let sqrt_factor = factor.sqrt();
    let asset = &aligned.asset;
    let bench = &aligned.benchmark;
    let n = aligned.len();

    let too_short = || AnalyticsError::insufficient_data("risk returns", 2, n);
    let asset_mean = stats::mean(asset).ok_or_else(too_short)?;
    let bench_mean = stats::mean(bench).ok_or_else(too_short)?;
    let asset_std = stats::sample_std(asset).ok_or_else(too_short)?;
    let bench_var = stats::sample_variance(bench).ok_or_else(too_short)?;
    let covariance = stats::sample_covariance(asset, bench).ok_or_else(too_short)?;

    if bench_var == 0.0 {
        return Err(AnalyticsError::degenerate(
            "benchmark return variance is zero, beta is undefined",
        ));
    }
    let beta = covariance / bench_var;
    let alpha = asset_mean - beta * bench_mean;
    let bench_std = bench_var.sqrt();

    let mut failures = Vec::new();
    let daily_rf = options.risk_free_rate / factor;

    let volatility = asset_std * sqrt_factor;
    let benchmark_volatility = bench_std * sqrt_factor;
    let sharpe = ratio("sharpe", asset_mean - daily_rf, asset_std, &mut failures)
        .map(|value| value * sqrt_factor);
    let benchmark_sharpe = ratio(
        "benchmark_sharpe",
        bench_mean - daily_rf,
        bench_std,
        &mut failures,
    )
    .map(|value| value * sqrt_factor);

    let downside = downside_deviation(asset, factor);
    let sortino = ratio(
        "sortino",
        asset_mean - options.target_return,
        downside,
        &mut failures,
    );

    let drawdown = match prices {
        Some(prices) => max_drawdown(prices),
        None => {
            let mut wealth = Vec::with_capacity(n + 1);
            wealth.push(1.0);
            for r in asset {
                let last = wealth.last().copied().unwrap_or(1.0);
                wealth.push(last * (1.0 + r));
            }
            max_drawdown(&wealth)
        }
    };

    let annual = annualized_return(asset, factor);
    let bench_annual = annualized_return(bench, factor);
    let excess: Vec<f64> = asset.iter().zip(bench).map(|(a, b)| a - b).collect();
    let tracking_error = stats::sample_std(&excess).unwrap_or(0.0) * sqrt_factor;
    let information_ratio = ratio(
        "information_ratio",
        annual - bench_annual,
        tracking_error,
        &mut failures,
    );
    let correlation = ratio(
        "correlation",
        covariance,
        asset_std * bench_std,
        &mut failures,
    );

    for failure in &failures {
        tracing::warn!(metric = %failure.metric, "{}", failure.message);
    }

    Ok(RiskMetrics {
        observations: n,
        beta,
        alpha,
        volatility,
        benchmark_volatility,
        sharpe,
        benchmark_sharpe,
        sortino,
        max_drawdown: drawdown,
        downside_deviation: downside,
        annualized_return: annual,
        benchmark_annualized_return: bench_annual,
        excess_return: annual - bench_annual,
        tracking_error,
        information_ratio,
        correlation,
        interpretation: RiskInterpretation {
            beta: BetaProfile::classify(beta),
            sharpe: sharpe.map(SharpeGrade::classify),
            correlation: correlation.map(CorrelationStrength::classify),
        },
        aligned,
        failures,
    })
}

/// Align two return series and compute their metrics.
pub fn risk_metrics_from_returns(
    asset: &ReturnSeries,
    benchmark: &ReturnSeries,
    options: &RiskOptions,
) -> Result<RiskMetrics, AnalyticsError> {
    let aligned = align_pair(asset, benchmark)?;
    risk_metrics(aligned, None, options)
}

/// Full report for `asset` against `benchmark` bars over `options.period`.
pub fn compute_risk(
    asset: &BarSeries,
    benchmark: &BarSeries,
    options: &RiskOptions,
) -> Result<RiskReport, AnalyticsError> {
    options.validate()?;
    let Some(last) = asset.last_date() else {
        return Err(AnalyticsError::insufficient_data("asset bars", 3, 0));
    };
    tracing::debug!(
        symbol = %asset.symbol,
        benchmark = %benchmark.symbol,
        period = ?options.period,
        "computing risk metrics"
    );

    let start = options.period.map(|period| last.days_before(period.days()));
    let asset = asset.window(start, None);
    let benchmark = benchmark.window(start, None);

    let asset_returns = ReturnSeries::from_bars(&asset);
    let bench_returns = ReturnSeries::from_bars(&benchmark);
    let aligned = align_pair(&asset_returns, &bench_returns)?;

    let (Some(first), Some(end)) = (aligned.dates.first().copied(), aligned.dates.last().copied())
    else {
        return Err(AnalyticsError::alignment("no common return dates"));
    };

    // Prices from the bar preceding the first aligned return onward.
    let first_index = asset
        .bars
        .iter()
        .position(|bar| bar.date == first)
        .map_or(0, |index| index.saturating_sub(1));
    let prices: Vec<f64> = asset.bars[first_index..]
        .iter()
        .filter(|bar| bar.date <= end)
        .map(|bar| bar.close)
        .collect();
    let start = asset.bars[first_index].date;

    let metrics = risk_metrics(aligned, Some(&prices), options)?;

    Ok(RiskReport {
        symbol: asset.symbol.clone(),
        benchmark: benchmark.symbol.clone(),
        period: options.period,
        start,
        end,
        metrics,
    })
}
