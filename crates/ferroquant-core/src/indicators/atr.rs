use serde::{Deserialize, Serialize};

use super::{require_period, Indicator, IndicatorKind};
use crate::{AnalyticsError, Bar};

/// Average True Range with Wilder smoothing.
///
/// The first bar's true range is `high − low`; the first ATR is the mean of
/// the first `period` true ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Atr {
    pub period: usize,
}

impl Default for Atr {
    fn default() -> Self {
        Self { period: 14 }
    }
}

pub(crate) fn true_range(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(index, bar)| {
            let range = bar.high - bar.low;
            match index.checked_sub(1).map(|prev| bars[prev].close) {
                Some(prev_close) => range
                    .max((bar.high - prev_close).abs())
                    .max((bar.low - prev_close).abs()),
                None => range,
            }
        })
        .collect()
}

impl Indicator for Atr {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Atr
    }

    fn columns(&self) -> &'static [&'static str] {
        &["ATR"]
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn validate(&self) -> Result<(), AnalyticsError> {
        require_period("atr.period", self.period)
    }

    fn compute(&self, bars: &[Bar]) -> Result<Vec<Vec<Option<f64>>>, AnalyticsError> {
        self.validate()?;
        let period = self.period;
        let tr = true_range(bars);
        let mut out = vec![None; tr.len()];
        if tr.len() < period {
            return Ok(vec![out]);
        }

        let mut atr = tr[..period].iter().sum::<f64>() / period as f64;
        out[period - 1] = Some(atr);
        for index in period..tr.len() {
            atr = (atr * (period - 1) as f64 + tr[index]) / period as f64;
            out[index] = Some(atr);
        }
        Ok(vec![out])
    }
}
