use serde::{Deserialize, Serialize};

use super::{require_period, rolling_range, Indicator, IndicatorKind};
use crate::{AnalyticsError, Bar};

/// Williams %R in `[−100, 0]`; −50 when the window has no range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WilliamsR {
    pub period: usize,
}

impl Default for WilliamsR {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Indicator for WilliamsR {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Wr
    }

    fn columns(&self) -> &'static [&'static str] {
        &["WR"]
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn validate(&self) -> Result<(), AnalyticsError> {
        require_period("wr.period", self.period)
    }

    fn compute(&self, bars: &[Bar]) -> Result<Vec<Vec<Option<f64>>>, AnalyticsError> {
        self.validate()?;
        let values = rolling_range(bars, self.period)
            .into_iter()
            .zip(bars)
            .map(|(range, bar)| {
                let (high, low) = range?;
                if high == low {
                    Some(-50.0)
                } else {
                    Some(-100.0 * (high - bar.close) / (high - low))
                }
            })
            .collect();
        Ok(vec![values])
    }
}
