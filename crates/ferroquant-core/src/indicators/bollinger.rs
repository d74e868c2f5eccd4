use serde::{Deserialize, Serialize};

use super::{closes, require_period, Indicator, IndicatorKind};
use crate::moving_average::sma;
use crate::{stats, AnalyticsError, Bar};

/// Bollinger Bands around `SMA(close, period)` at `k` population standard
/// deviations. `BOLL_WIDTH` is `upper − lower`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Bollinger {
    pub period: usize,
    pub k: f64,
}

impl Default for Bollinger {
    fn default() -> Self {
        Self { period: 20, k: 2.0 }
    }
}

impl Indicator for Bollinger {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Boll
    }

    fn columns(&self) -> &'static [&'static str] {
        &["BOLL_UPPER", "BOLL_MIDDLE", "BOLL_LOWER", "BOLL_WIDTH"]
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn validate(&self) -> Result<(), AnalyticsError> {
        require_period("boll.period", self.period)?;
        if !self.k.is_finite() || self.k < 0.0 {
            return Err(AnalyticsError::invalid_parameter(
                "boll.k",
                format!("band multiplier must be finite and non-negative, got {}", self.k),
            ));
        }
        Ok(())
    }

    fn compute(&self, bars: &[Bar]) -> Result<Vec<Vec<Option<f64>>>, AnalyticsError> {
        self.validate()?;
        let closes = closes(bars);
        let middle = sma(&closes, self.period);

        let mut upper = vec![None; closes.len()];
        let mut lower = vec![None; closes.len()];
        let mut width = vec![None; closes.len()];
        if closes.len() >= self.period {
            for (offset, window) in closes.windows(self.period).enumerate() {
                let index = offset + self.period - 1;
                let (Some(mid), Some(std)) = (middle[index], stats::population_std(window)) else {
                    continue;
                };
                upper[index] = Some(mid + self.k * std);
                lower[index] = Some(mid - self.k * std);
                width[index] = Some(2.0 * self.k * std);
            }
        }

        Ok(vec![upper, middle, lower, width])
    }
}
