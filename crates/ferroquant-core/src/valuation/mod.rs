//! # Valuation Engine
//!
//! | Model | Entry point | Inputs |
//! |-------|-------------|--------|
//! | PEG | [`compute_peg`] | quarterly net profit, PE |
//! | DCF | [`compute_dcf`] | annual free cash flow |
//! | DDM | [`compute_ddm`] | annual dividend per share |
//! | Valuation history | [`valuation_history`] | daily PE/PB/PS/PCF |
//! | Industry comparison | [`compare_industry`] | peer PE/PB/PS |
//!
//! Discounting models share the same rate checks: the discount rate must lie
//! in `(0, 1)` and exceed the terminal growth rate, otherwise the perpetuity
//! does not converge.

mod dcf;
mod ddm;
mod history;
mod industry;
mod peg;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use dcf::{cagr, compute_dcf, project_dcf, DcfOptions, DcfProjection, DcfValuation, PerShareValue};
pub use ddm::{compute_ddm, DdmOptions, DdmValuation};
pub use history::{valuation_history, RatioHistory, ValuationHistoryReport};
pub use industry::{
    compare_industry, compare_ratio, IndustryLevel, IndustryOptions, IndustryReport,
    PeerComparison, PeerStatistics,
};
pub use peg::{compute_peg, peg_ratio, yoy_growth, PegBand, PegResult};

use crate::{AnalyticsError, PeerValuation, ValidationError, ValuationSnapshot};

/// Valuation multiples understood by the history and industry reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ValuationRatio {
    Pe,
    Pb,
    Ps,
    Pcf,
}

impl ValuationRatio {
    pub const ALL: [Self; 4] = [Self::Pe, Self::Pb, Self::Ps, Self::Pcf];
    /// Ratios available for peer comparison.
    pub const PEER: [Self; 3] = [Self::Pe, Self::Pb, Self::Ps];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pe => "pe",
            Self::Pb => "pb",
            Self::Ps => "ps",
            Self::Pcf => "pcf",
        }
    }

    pub fn of_snapshot(self, snapshot: &ValuationSnapshot) -> Option<f64> {
        match self {
            Self::Pe => snapshot.pe_ttm,
            Self::Pb => snapshot.pb_mrq,
            Self::Ps => snapshot.ps_ttm,
            Self::Pcf => snapshot.pcf_ttm,
        }
    }

    pub fn of_peer(self, peer: &PeerValuation) -> Option<f64> {
        match self {
            Self::Pe => peer.pe_ttm,
            Self::Pb => peer.pb_mrq,
            Self::Ps => peer.ps_ttm,
            Self::Pcf => None,
        }
    }

    /// Parse a comma separated list such as `"pe,pb"`.
    pub fn parse_list(input: &str) -> Result<Vec<Self>, ValidationError> {
        let mut ratios = Vec::new();
        for part in input.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            let ratio = part.parse::<Self>()?;
            if !ratios.contains(&ratio) {
                ratios.push(ratio);
            }
        }
        Ok(ratios)
    }
}

impl Display for ValuationRatio {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValuationRatio {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pe" | "pe_ttm" => Ok(Self::Pe),
            "pb" | "pb_mrq" => Ok(Self::Pb),
            "ps" | "ps_ttm" => Ok(Self::Ps),
            "pcf" | "pcf_ttm" => Ok(Self::Pcf),
            _ => Err(ValidationError::UnknownRatio {
                value: s.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for ValuationRatio {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ValuationRatio> for String {
    fn from(value: ValuationRatio) -> Self {
        value.as_str().to_owned()
    }
}

/// One fiscal-year input value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnualValue {
    pub year: i32,
    pub value: f64,
}

/// `(price / intrinsic − 1) × 100`; positive means the price is above value.
pub fn premium_pct(price: f64, intrinsic: f64) -> Option<f64> {
    (intrinsic > 0.0 && price.is_finite()).then(|| (price / intrinsic - 1.0) * 100.0)
}

pub(crate) fn validate_rates(
    discount_rate: f64,
    terminal_growth_rate: f64,
) -> Result<(), AnalyticsError> {
    if !discount_rate.is_finite() || discount_rate <= 0.0 || discount_rate >= 1.0 {
        return Err(AnalyticsError::invalid_parameter(
            "discount_rate",
            format!("must be in (0, 1), got {discount_rate}"),
        ));
    }
    if !terminal_growth_rate.is_finite() {
        return Err(AnalyticsError::invalid_parameter(
            "terminal_growth_rate",
            "must be finite",
        ));
    }
    if discount_rate <= terminal_growth_rate {
        return Err(AnalyticsError::invalid_parameter(
            "discount_rate",
            format!(
                "must exceed terminal growth rate {terminal_growth_rate}, got {discount_rate}"
            ),
        ));
    }
    Ok(())
}

/// `1 / (1 + rate)^year` for `year = 1..=years`.
pub(crate) fn discount_factors(rate: f64, years: usize) -> Vec<f64> {
    (1..=years)
        .map(|year| 1.0 / (1.0 + rate).powi(year as i32))
        .collect()
}
