use serde::{Deserialize, Serialize};

use super::{discount_factors, premium_pct, validate_rates, AnnualValue};
use crate::{AnalyticsError, FundamentalHistory, Symbol};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DcfOptions {
    /// Historical annual FCF values feeding the growth estimate.
    pub years_back: usize,
    /// Forecast horizon; `None` reuses `years_back`.
    pub projection_years: Option<usize>,
    pub discount_rate: f64,
    pub terminal_growth_rate: f64,
    /// Upper bound applied to the historical CAGR.
    pub max_growth_rate: Option<f64>,
}

impl Default for DcfOptions {
    fn default() -> Self {
        Self {
            years_back: 5,
            projection_years: None,
            discount_rate: 0.10,
            terminal_growth_rate: 0.025,
            max_growth_rate: None,
        }
    }
}

impl DcfOptions {
    pub fn horizon(&self) -> usize {
        self.projection_years.unwrap_or(self.years_back)
    }

    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if self.years_back < 2 {
            return Err(AnalyticsError::invalid_parameter(
                "years_back",
                format!("at least 2 years are needed for a growth rate, got {}", self.years_back),
            ));
        }
        if self.horizon() == 0 {
            return Err(AnalyticsError::invalid_parameter(
                "projection_years",
                "must be positive",
            ));
        }
        if let Some(cap) = self.max_growth_rate {
            if !cap.is_finite() {
                return Err(AnalyticsError::invalid_parameter(
                    "max_growth_rate",
                    "must be finite",
                ));
            }
        }
        validate_rates(self.discount_rate, self.terminal_growth_rate)
    }
}

/// Projected cash flows, their discount factors and the terminal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfProjection {
    pub historical: Vec<f64>,
    pub historical_growth: f64,
    pub growth_rate: f64,
    pub projected: Vec<f64>,
    pub discount_factors: Vec<f64>,
    pub discounted: Vec<f64>,
    pub terminal_value: f64,
    pub discounted_terminal_value: f64,
    pub enterprise_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerShareValue {
    pub total_liabilities: f64,
    pub equity_value: f64,
    pub total_shares: f64,
    pub value_per_share: f64,
    pub price: Option<f64>,
    pub premium_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfValuation {
    pub symbol: Symbol,
    pub years: Vec<AnnualValue>,
    pub projection: DcfProjection,
    pub per_share: Option<PerShareValue>,
}

/// Compound annual growth rate between two positive values `periods` apart.
pub fn cagr(first: f64, last: f64, periods: usize) -> Result<f64, AnalyticsError> {
    if periods == 0 {
        return Err(AnalyticsError::invalid_parameter(
            "periods",
            "CAGR needs at least one period",
        ));
    }
    if first <= 0.0 || last <= 0.0 {
        return Err(AnalyticsError::degenerate(format!(
            "CAGR needs positive endpoints, got {first} and {last}"
        )));
    }
    Ok((last / first).powf(1.0 / periods as f64) - 1.0)
}

/// Project the most recent `years_back` values of `history` forward.
///
/// `history` holds consecutive fiscal years.
pub fn project_dcf(history: &[f64], options: &DcfOptions) -> Result<DcfProjection, AnalyticsError> {
    let window = &history[history.len().saturating_sub(options.years_back)..];
    project(window, window.len().saturating_sub(1), options)
}

/// `periods` is the number of years between the first and last value of
/// `window`, which exceeds `window.len() - 1` when a year is unreported.
fn project(
    window: &[f64],
    periods: usize,
    options: &DcfOptions,
) -> Result<DcfProjection, AnalyticsError> {
    options.validate()?;
    if window.len() < 2 {
        return Err(AnalyticsError::insufficient_data(
            "free cash flow years",
            2,
            window.len(),
        ));
    }
    let (first, last) = (window[0], window[window.len() - 1]);

    let historical_growth = cagr(first, last, periods)?;
    let growth_rate = options
        .max_growth_rate
        .map_or(historical_growth, |cap| historical_growth.min(cap));

    let horizon = options.horizon();
    let projected: Vec<f64> = (1..=horizon)
        .map(|year| last * (1.0 + growth_rate).powi(year as i32))
        .collect();
    let factors = discount_factors(options.discount_rate, horizon);
    let discounted: Vec<f64> = projected
        .iter()
        .zip(&factors)
        .map(|(fcf, factor)| fcf * factor)
        .collect();

    let final_fcf = projected[horizon - 1];
    let terminal_value = final_fcf * (1.0 + options.terminal_growth_rate)
        / (options.discount_rate - options.terminal_growth_rate);
    let discounted_terminal_value = terminal_value * factors[horizon - 1];
    let enterprise_value = discounted.iter().sum::<f64>() + discounted_terminal_value;

    Ok(DcfProjection {
        historical: window.to_vec(),
        historical_growth,
        growth_rate,
        projected,
        discount_factors: factors,
        discounted,
        terminal_value,
        discounted_terminal_value,
        enterprise_value,
    })
}

/// DCF over the annual (Q4) free cash flow of `history`.
///
/// When the latest snapshot carries liabilities and share count the
/// enterprise value is also converted to a per-share value and compared to
/// `price`.
pub fn compute_dcf(
    history: &FundamentalHistory,
    options: &DcfOptions,
    price: Option<f64>,
) -> Result<DcfValuation, AnalyticsError> {
    tracing::debug!(symbol = %history.symbol, ?options, "computing DCF");
    let annual = history.annual_series(|snapshot| snapshot.free_cash_flow);
    let skip = annual.len().saturating_sub(options.years_back);
    let years: Vec<AnnualValue> = annual[skip..]
        .iter()
        .map(|(year, value)| AnnualValue {
            year: *year,
            value: *value,
        })
        .collect();
    let values: Vec<f64> = years.iter().map(|point| point.value).collect();
    let periods = match (years.first(), years.last()) {
        (Some(first), Some(last)) => usize::try_from(last.year - first.year).unwrap_or(0),
        _ => 0,
    };

    let projection = project(&values, periods, options)?;

    let per_share = history.latest().and_then(|latest| {
        let total_liabilities = latest.total_liabilities?;
        let total_shares = latest.total_shares.filter(|shares| *shares > 0.0)?;
        let equity_value = projection.enterprise_value - total_liabilities;
        let value_per_share = equity_value / total_shares;
        Some(PerShareValue {
            total_liabilities,
            equity_value,
            total_shares,
            value_per_share,
            price,
            premium_pct: price.and_then(|price| premium_pct(price, value_per_share)),
        })
    });

    Ok(DcfValuation {
        symbol: history.symbol.clone(),
        years,
        projection,
        per_share,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FundamentalSnapshot, Quarter};

    const TEN_PERCENT: [f64; 5] = [100.0, 110.0, 121.0, 133.1, 146.41];

    #[test]
    fn projects_ten_percent_history() {
        let projection = project_dcf(&TEN_PERCENT, &DcfOptions::default()).expect("dcf");

        assert!((projection.growth_rate - 0.10).abs() < 1e-9);
        assert_eq!(projection.projected.len(), 5);
        assert!((projection.projected[0] - 161.051).abs() < 1e-6);
        assert!((projection.discount_factors[0] - 1.0 / 1.1).abs() < 1e-12);
        // every discounted year is 146.41 since growth equals the discount rate
        assert!(projection
            .discounted
            .iter()
            .all(|value| (value - 146.41).abs() < 1e-6));

        let terminal = 146.41 * 1.1_f64.powi(5) * 1.025 / 0.075;
        assert!((projection.terminal_value - terminal).abs() < 1e-6);
        let expected = 5.0 * 146.41 + terminal / 1.1_f64.powi(5);
        assert!((projection.enterprise_value - expected).abs() < 1e-6);
    }

    #[test]
    fn equal_discount_and_terminal_growth_is_invalid() {
        let options = DcfOptions {
            discount_rate: 0.05,
            terminal_growth_rate: 0.05,
            ..DcfOptions::default()
        };
        let err = project_dcf(&TEN_PERCENT, &options).expect_err("must fail");
        assert!(matches!(err, AnalyticsError::InvalidParameter { .. }));
    }

    #[test]
    fn horizon_is_independent_of_history() {
        let options = DcfOptions {
            projection_years: Some(8),
            ..DcfOptions::default()
        };
        let projection = project_dcf(&TEN_PERCENT, &options).expect("dcf");
        assert_eq!(projection.projected.len(), 8);
        assert_eq!(projection.historical.len(), 5);
    }

    #[test]
    fn growth_cap_applies() {
        let options = DcfOptions {
            max_growth_rate: Some(0.05),
            ..DcfOptions::default()
        };
        let projection = project_dcf(&TEN_PERCENT, &options).expect("dcf");
        assert_eq!(projection.growth_rate, 0.05);
        assert!(projection.historical_growth > 0.09);
    }

    #[test]
    fn negative_endpoint_is_degenerate() {
        let err = project_dcf(&[-10.0, 20.0], &DcfOptions::default()).expect_err("must fail");
        assert!(matches!(err, AnalyticsError::DegenerateInput { .. }));
    }

    #[test]
    fn single_year_is_insufficient() {
        let err = project_dcf(&[100.0], &DcfOptions::default()).expect_err("must fail");
        assert!(matches!(
            err,
            AnalyticsError::InsufficientData { required: 2, actual: 1, .. }
        ));
    }

    #[test]
    fn uses_only_the_most_recent_years() {
        let options = DcfOptions {
            years_back: 2,
            ..DcfOptions::default()
        };
        let projection = project_dcf(&[1.0, 2.0, 100.0, 110.0], &options).expect("dcf");
        assert_eq!(projection.historical, vec![100.0, 110.0]);
        assert!((projection.growth_rate - 0.10).abs() < 1e-9);
        assert_eq!(projection.projected.len(), 2);
    }

    #[test]
    fn unreported_year_still_counts_as_a_growth_period() {
        let symbol = Symbol::parse("sh.600519").expect("symbol");
        let snapshots = [
            (2019, Some(100.0)),
            (2020, Some(110.0)),
            (2021, None),
            (2022, Some(133.1)),
            (2023, Some(146.41)),
        ]
        .into_iter()
        .map(|(year, fcf)| {
            let mut snapshot = FundamentalSnapshot::new(symbol.clone(), year, Quarter::Q4);
            snapshot.free_cash_flow = fcf;
            snapshot
        })
        .collect();
        let history = FundamentalHistory::new(symbol, snapshots).expect("history");

        let valuation = compute_dcf(&history, &DcfOptions::default(), None).expect("dcf");

        let years: Vec<i32> = valuation.years.iter().map(|point| point.year).collect();
        assert_eq!(years, [2019, 2020, 2022, 2023]);
        assert!((valuation.projection.historical_growth - 0.10).abs() < 1e-9);
    }
}
