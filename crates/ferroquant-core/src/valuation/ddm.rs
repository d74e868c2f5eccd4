use serde::{Deserialize, Serialize};

use super::{discount_factors, premium_pct, validate_rates, AnnualValue};
use crate::{stats, AnalyticsError, FundamentalHistory, Symbol};

/// Two-stage dividend discount model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DdmOptions {
    pub years_back: usize,
    pub forecast_years: usize,
    pub discount_rate: f64,
    pub terminal_growth_rate: f64,
    /// Bounds applied to the mean historical growth.
    pub min_growth_rate: f64,
    pub max_growth_rate: f64,
}

impl Default for DdmOptions {
    fn default() -> Self {
        Self {
            years_back: 5,
            forecast_years: 5,
            discount_rate: 0.10,
            terminal_growth_rate: 0.025,
            min_growth_rate: 0.01,
            max_growth_rate: 0.20,
        }
    }
}

impl DdmOptions {
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if self.years_back < 2 {
            return Err(AnalyticsError::invalid_parameter(
                "years_back",
                format!("at least 2 years are needed for a growth rate, got {}", self.years_back),
            ));
        }
        if self.forecast_years == 0 {
            return Err(AnalyticsError::invalid_parameter(
                "forecast_years",
                "must be positive",
            ));
        }
        if !self.min_growth_rate.is_finite()
            || !self.max_growth_rate.is_finite()
            || self.min_growth_rate > self.max_growth_rate
        {
            return Err(AnalyticsError::invalid_parameter(
                "min_growth_rate",
                format!(
                    "growth bounds must be finite with min <= max, got [{}, {}]",
                    self.min_growth_rate, self.max_growth_rate
                ),
            ));
        }
        validate_rates(self.discount_rate, self.terminal_growth_rate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DdmValuation {
    pub symbol: Symbol,
    pub dividends: Vec<AnnualValue>,
    pub historical_growth: f64,
    pub growth_rate: f64,
    pub forecast: Vec<f64>,
    pub discount_factors: Vec<f64>,
    pub present_values: Vec<f64>,
    pub terminal_value: f64,
    pub discounted_terminal_value: f64,
    pub intrinsic_value: f64,
    pub price: Option<f64>,
    pub premium_pct: Option<f64>,
}

/// Intrinsic value per share from annual (Q4) dividends per share.
///
/// Growth is the mean annualized change between successive paying years of
/// the last `years_back`, clamped to `[min_growth_rate, max_growth_rate]`. A
/// change spanning a skipped year is annualized over the full gap.
pub fn compute_ddm(
    history: &FundamentalHistory,
    options: &DdmOptions,
    price: Option<f64>,
) -> Result<DdmValuation, AnalyticsError> {
    options.validate()?;
    tracing::debug!(symbol = %history.symbol, ?options, "computing DDM");

    let paying: Vec<AnnualValue> = history
        .annual_series(|snapshot| snapshot.dividend_per_share)
        .into_iter()
        .filter(|(_, value)| *value > 0.0)
        .map(|(year, value)| AnnualValue { year, value })
        .collect();
    let dividends = paying[paying.len().saturating_sub(options.years_back)..].to_vec();
    if dividends.len() < 2 {
        return Err(AnalyticsError::insufficient_data(
            "dividend-paying years",
            2,
            dividends.len(),
        ));
    }

    let changes: Vec<f64> = dividends
        .windows(2)
        .map(|pair| {
            let years = (pair[1].year - pair[0].year).max(1);
            (pair[1].value / pair[0].value).powf(1.0 / f64::from(years)) - 1.0
        })
        .collect();
    let historical_growth = stats::mean(&changes)
        .ok_or_else(|| AnalyticsError::insufficient_data("dividend growth", 1, 0))?;
    let growth_rate = historical_growth.clamp(options.min_growth_rate, options.max_growth_rate);

    let latest = dividends[dividends.len() - 1].value;
    let years = options.forecast_years;
    let forecast: Vec<f64> = (1..=years)
        .map(|year| latest * (1.0 + growth_rate).powi(year as i32))
        .collect();
    let factors = discount_factors(options.discount_rate, years);
    let present_values: Vec<f64> = forecast
        .iter()
        .zip(&factors)
        .map(|(dividend, factor)| dividend * factor)
        .collect();

    let terminal_value = forecast[years - 1] * (1.0 + options.terminal_growth_rate)
        / (options.discount_rate - options.terminal_growth_rate);
    let discounted_terminal_value = terminal_value * factors[years - 1];
    let intrinsic_value = present_values.iter().sum::<f64>() + discounted_terminal_value;

    Ok(DdmValuation {
        symbol: history.symbol.clone(),
        dividends,
        historical_growth,
        growth_rate,
        forecast,
        discount_factors: factors,
        present_values,
        terminal_value,
        discounted_terminal_value,
        intrinsic_value,
        price,
        premium_pct: price.and_then(|price| premium_pct(price, intrinsic_value)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FundamentalSnapshot, Quarter};

    fn history(dividends: &[(i32, f64)]) -> FundamentalHistory {
        let symbol = Symbol::parse("sh.601398").expect("symbol");
        let snapshots = dividends
            .iter()
            .map(|(year, dividend)| {
                let mut snapshot = FundamentalSnapshot::new(symbol.clone(), *year, Quarter::Q4);
                snapshot.dividend_per_share = Some(*dividend);
                snapshot
            })
            .collect();
        FundamentalHistory::new(symbol, snapshots).expect("history")
    }

    #[test]
    fn values_steady_growth() {
        let history = history(&[(2021, 1.0), (2022, 1.05), (2023, 1.1025)]);
        let result = compute_ddm(&history, &DdmOptions::default(), Some(20.0)).expect("ddm");

        assert!((result.growth_rate - 0.05).abs() < 1e-9);
        assert_eq!(result.forecast.len(), 5);
        let expected_first = 1.1025 * 1.05 / 1.10;
        assert!((result.present_values[0] - expected_first).abs() < 1e-9);
        assert!(result.intrinsic_value > 0.0);
        assert!(result.premium_pct.is_some());
    }

    #[test]
    fn clamps_extreme_growth() {
        let history = history(&[(2022, 1.0), (2023, 3.0)]);
        let result = compute_ddm(&history, &DdmOptions::default(), None).expect("ddm");
        assert_eq!(result.growth_rate, 0.20);

        let history = self::history(&[(2022, 1.0), (2023, 0.5)]);
        let result = compute_ddm(&history, &DdmOptions::default(), None).expect("ddm");
        assert_eq!(result.growth_rate, 0.01);
    }

    #[test]
    fn growth_across_a_skipped_year_is_annualized() {
        let history = history(&[(2020, 1.0), (2021, 1.05), (2023, 1.157625)]);
        let result = compute_ddm(&history, &DdmOptions::default(), None).expect("ddm");

        assert!((result.historical_growth - 0.05).abs() < 1e-9);
        assert_eq!(result.dividends.len(), 3);
    }

    #[test]
    fn needs_two_paying_years() {
        let history = history(&[(2022, 0.0), (2023, 1.0)]);
        let err = compute_ddm(&history, &DdmOptions::default(), None).expect_err("must fail");
        assert!(matches!(
            err,
            AnalyticsError::InsufficientData { required: 2, actual: 1, .. }
        ));
    }
}
