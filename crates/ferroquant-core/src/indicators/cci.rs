use serde::{Deserialize, Serialize};

use super::{require_period, Indicator, IndicatorKind};
use crate::moving_average::sma;
use crate::{AnalyticsError, Bar};

const LAMBERT_CONSTANT: f64 = 0.015;

/// Commodity Channel Index over the typical price `(high + low + close) / 3`.
/// A window with zero mean deviation reads 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Cci {
    pub period: usize,
}

impl Default for Cci {
    fn default() -> Self {
        Self { period: 20 }
    }
}

impl Indicator for Cci {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Cci
    }

    fn columns(&self) -> &'static [&'static str] {
        &["CCI"]
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn validate(&self) -> Result<(), AnalyticsError> {
        require_period("cci.period", self.period)
    }

    fn compute(&self, bars: &[Bar]) -> Result<Vec<Vec<Option<f64>>>, AnalyticsError> {
        self.validate()?;
        let typical: Vec<f64> = bars.iter().map(Bar::typical_price).collect();
        let means = sma(&typical, self.period);

        let mut out = vec![None; typical.len()];
        if typical.len() >= self.period {
            for (offset, window) in typical.windows(self.period).enumerate() {
                let index = offset + self.period - 1;
                let Some(mean) = means[index] else {
                    continue;
                };
                let mean_deviation = window.iter().map(|tp| (tp - mean).abs()).sum::<f64>()
                    / self.period as f64;
                out[index] = Some(if mean_deviation == 0.0 {
                    0.0
                } else {
                    (typical[index] - mean) / (LAMBERT_CONSTANT * mean_deviation)
                });
            }
        }
        Ok(vec![out])
    }
}
