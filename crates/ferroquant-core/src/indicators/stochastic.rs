//! KDJ and the Stochastic Oscillator share the raw stochastic value (RSV).

use serde::{Deserialize, Serialize};

use super::{require_period, rolling_range, Indicator, IndicatorKind};
use crate::moving_average::sma_defined;
use crate::{AnalyticsError, Bar};

/// `RSV = (close − lowestLow) / (highestHigh − lowestLow) × 100`, 50 when
/// the window has no range.
pub(crate) fn rsv(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    rolling_range(bars, period)
        .into_iter()
        .zip(bars)
        .map(|(range, bar)| {
            let (high, low) = range?;
            if high == low {
                Some(50.0)
            } else {
                Some((bar.close - low) / (high - low) * 100.0)
            }
        })
        .collect()
}

/// `%K = SMA(RSV, smooth_k)`, `%D = SMA(%K, smooth_d)`.
fn k_and_d(
    bars: &[Bar],
    period: usize,
    smooth_k: usize,
    smooth_d: usize,
) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let k = sma_defined(&rsv(bars, period), smooth_k);
    let d = sma_defined(&k, smooth_d);
    (k, d)
}

fn validate_periods(
    prefix: &'static [&'static str; 3],
    period: usize,
    smooth_k: usize,
    smooth_d: usize,
) -> Result<(), AnalyticsError> {
    require_period(prefix[0], period)?;
    require_period(prefix[1], smooth_k)?;
    require_period(prefix[2], smooth_d)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Kdj {
    pub period: usize,
    pub smooth_k: usize,
    pub smooth_d: usize,
}

impl Default for Kdj {
    fn default() -> Self {
        Self {
            period: 9,
            smooth_k: 3,
            smooth_d: 3,
        }
    }
}

impl Indicator for Kdj {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Kdj
    }

    fn columns(&self) -> &'static [&'static str] {
        &["KDJ_K", "KDJ_D", "KDJ_J"]
    }

    fn lookback(&self) -> usize {
        (self.period + self.smooth_k).saturating_sub(2)
    }

    fn validate(&self) -> Result<(), AnalyticsError> {
        validate_periods(
            &["kdj.period", "kdj.smooth_k", "kdj.smooth_d"],
            self.period,
            self.smooth_k,
            self.smooth_d,
        )
    }

    fn compute(&self, bars: &[Bar]) -> Result<Vec<Vec<Option<f64>>>, AnalyticsError> {
        self.validate()?;
        let (k, d) = k_and_d(bars, self.period, self.smooth_k, self.smooth_d);
        let j = k
            .iter()
            .zip(&d)
            .map(|(k, d)| Some(3.0 * (*k)? - 2.0 * (*d)?))
            .collect();
        Ok(vec![k, d, j])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Stochastic {
    pub period: usize,
    pub smooth_k: usize,
    pub smooth_d: usize,
}

impl Default for Stochastic {
    fn default() -> Self {
        Self {
            period: 14,
            smooth_k: 3,
            smooth_d: 3,
        }
    }
}

impl Indicator for Stochastic {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Stoch
    }

    fn columns(&self) -> &'static [&'static str] {
        &["STOCH_K", "STOCH_D"]
    }

    fn lookback(&self) -> usize {
        (self.period + self.smooth_k).saturating_sub(2)
    }

    fn validate(&self) -> Result<(), AnalyticsError> {
        validate_periods(
            &["stoch.period", "stoch.smooth_k", "stoch.smooth_d"],
            self.period,
            self.smooth_k,
            self.smooth_d,
        )
    }

    fn compute(&self, bars: &[Bar]) -> Result<Vec<Vec<Option<f64>>>, AnalyticsError> {
        self.validate()?;
        let (k, d) = k_and_d(bars, self.period, self.smooth_k, self.smooth_d);
        Ok(vec![k, d])
    }
}
