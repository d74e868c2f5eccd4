use serde::{Deserialize, Serialize};

use crate::{AnalyticsError, FundamentalHistory, Quarter, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PegBand {
    /// PEG < 0.5
    SignificantlyUndervalued,
    /// PEG <= 1
    Undervalued,
    /// PEG <= 1.5
    Fair,
    /// PEG <= 2
    Overvalued,
    SignificantlyOvervalued,
}

impl PegBand {
    pub fn classify(peg: f64) -> Self {
        if peg < 0.5 {
            Self::SignificantlyUndervalued
        } else if peg <= 1.0 {
            Self::Undervalued
        } else if peg <= 1.5 {
            Self::Fair
        } else if peg <= 2.0 {
            Self::Overvalued
        } else {
            Self::SignificantlyOvervalued
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PegResult {
    pub symbol: Symbol,
    pub year: i32,
    pub quarter: Quarter,
    pub pe: f64,
    pub net_profit: f64,
    pub prior_net_profit: f64,
    /// Fractional, e.g. `0.25` for 25 %.
    pub growth_rate: f64,
    pub peg: f64,
    pub band: PegBand,
}

/// `(current − prior) / |prior|`.
pub fn yoy_growth(current: f64, prior: f64) -> Result<f64, AnalyticsError> {
    if prior == 0.0 {
        return Err(AnalyticsError::degenerate(
            "same-quarter net profit of the prior year is zero",
        ));
    }
    Ok((current - prior) / prior.abs())
}

/// `PE / (growth × 100)`; growth must be positive.
pub fn peg_ratio(pe: f64, growth_rate: f64) -> Result<f64, AnalyticsError> {
    if !pe.is_finite() || pe <= 0.0 {
        return Err(AnalyticsError::invalid_parameter(
            "pe",
            format!("must be positive and finite, got {pe}"),
        ));
    }
    if !growth_rate.is_finite() || growth_rate <= 0.0 {
        return Err(AnalyticsError::invalid_parameter(
            "growth_rate",
            format!("PEG is not meaningful for non-positive growth, got {growth_rate}"),
        ));
    }
    Ok(pe / (growth_rate * 100.0))
}

/// PEG for `(year, quarter)` against the same quarter one year earlier.
///
/// `pe` overrides the snapshot's `pe_ttm` when given.
pub fn compute_peg(
    history: &FundamentalHistory,
    year: i32,
    quarter: Quarter,
    pe: Option<f64>,
) -> Result<PegResult, AnalyticsError> {
    tracing::debug!(symbol = %history.symbol, year, %quarter, "computing PEG");
    let current = history.get(year, quarter);
    let prior = history.get(year - 1, quarter);

    let net_profit = current
        .and_then(|snapshot| snapshot.net_profit)
        .ok_or_else(|| {
            AnalyticsError::insufficient_data(format!("net profit {year} {quarter}"), 1, 0)
        })?;
    let prior_net_profit = prior
        .and_then(|snapshot| snapshot.net_profit)
        .ok_or_else(|| {
            AnalyticsError::insufficient_data(format!("net profit {} {quarter}", year - 1), 1, 0)
        })?;
    let pe = pe
        .or_else(|| current.and_then(|snapshot| snapshot.pe_ttm))
        .ok_or_else(|| AnalyticsError::insufficient_data(format!("pe {year} {quarter}"), 1, 0))?;

    let growth_rate = yoy_growth(net_profit, prior_net_profit)?;
    let peg = peg_ratio(pe, growth_rate)?;

    Ok(PegResult {
        symbol: history.symbol.clone(),
        year,
        quarter,
        pe,
        net_profit,
        prior_net_profit,
        growth_rate,
        peg,
        band: PegBand::classify(peg),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FundamentalSnapshot;

    fn history(current: Option<f64>, prior: Option<f64>) -> FundamentalHistory {
        let symbol = Symbol::parse("sz.000001").expect("symbol");
        let mut this_year = FundamentalSnapshot::new(symbol.clone(), 2024, Quarter::Q2);
        this_year.net_profit = current;
        this_year.pe_ttm = Some(20.0);
        let mut last_year = FundamentalSnapshot::new(symbol.clone(), 2023, Quarter::Q2);
        last_year.net_profit = prior;
        FundamentalHistory::new(symbol, vec![last_year, this_year]).expect("history")
    }

    #[test]
    fn computes_peg_from_yoy_growth() {
        let result =
            compute_peg(&history(Some(125.0), Some(100.0)), 2024, Quarter::Q2, None).expect("peg");
        assert!((result.growth_rate - 0.25).abs() < 1e-12);
        assert!((result.peg - 0.8).abs() < 1e-12);
        assert_eq!(result.band, PegBand::Undervalued);
    }

    #[test]
    fn negative_growth_is_invalid() {
        let err = compute_peg(&history(Some(80.0), Some(100.0)), 2024, Quarter::Q2, None)
            .expect_err("must fail");
        assert!(matches!(
            err,
            AnalyticsError::InvalidParameter { name: "growth_rate", .. }
        ));
    }

    #[test]
    fn growth_from_a_loss_uses_absolute_base() {
        let growth = yoy_growth(50.0, -100.0).expect("growth");
        assert!((growth - 1.5).abs() < 1e-12);
    }

    #[test]
    fn missing_prior_is_insufficient_and_zero_prior_is_degenerate() {
        let err = compute_peg(&history(Some(80.0), None), 2024, Quarter::Q2, Some(10.0))
            .expect_err("must fail");
        assert!(matches!(err, AnalyticsError::InsufficientData { .. }));

        let err = compute_peg(&history(Some(80.0), Some(0.0)), 2024, Quarter::Q2, Some(10.0))
            .expect_err("must fail");
        assert!(matches!(err, AnalyticsError::DegenerateInput { .. }));
    }
}
