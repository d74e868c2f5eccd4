use serde::{Deserialize, Serialize};

use super::{closes, require_period, Indicator, IndicatorKind};
use crate::moving_average::{ema, ema_defined};
use crate::{AnalyticsError, Bar};

/// Moving Average Convergence Divergence.
///
/// `MACD = EMA(fast) − EMA(slow)`, `MACD_SIGNAL = EMA(MACD, signal)` taken
/// over the defined part of the MACD line, `MACD_HIST = MACD − MACD_SIGNAL`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Macd {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

impl Indicator for Macd {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Macd
    }

    fn columns(&self) -> &'static [&'static str] {
        &["MACD", "MACD_SIGNAL", "MACD_HIST"]
    }

    fn lookback(&self) -> usize {
        self.slow.saturating_sub(1)
    }

    fn validate(&self) -> Result<(), AnalyticsError> {
        require_period("macd.fast", self.fast)?;
        require_period("macd.slow", self.slow)?;
        require_period("macd.signal", self.signal)?;
        if self.fast >= self.slow {
            return Err(AnalyticsError::invalid_parameter(
                "macd.fast",
                format!(
                    "fast period {} must be shorter than slow period {}",
                    self.fast, self.slow
                ),
            ));
        }
        Ok(())
    }

    fn compute(&self, bars: &[Bar]) -> Result<Vec<Vec<Option<f64>>>, AnalyticsError> {
        self.validate()?;
        let closes = closes(bars);

        let fast = ema(&closes, self.fast);
        let slow = ema(&closes, self.slow);
        let line: Vec<Option<f64>> = fast
            .iter()
            .zip(&slow)
            .map(|(fast, slow)| Some((*fast)? - (*slow)?))
            .collect();
        let signal = ema_defined(&line, self.signal);
        let histogram = line
            .iter()
            .zip(&signal)
            .map(|(line, signal)| Some((*line)? - (*signal)?))
            .collect();

        Ok(vec![line, signal, histogram])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::{assert_close, bars_from_closes};

    #[test]
    fn line_and_signal_lookbacks() {
        let macd = Macd {
            fast: 3,
            slow: 5,
            signal: 2,
        };
        let bars = bars_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let out = macd.compute(&bars).expect("macd");

        assert_eq!(out[0][3], None);
        assert!(out[0][4].is_some());
        assert_eq!(out[1][4], None);
        assert!(out[1][5].is_some());
        assert_eq!(out[2][4], None);
    }

    #[test]
    fn flat_series_has_zero_histogram() {
        let bars = bars_from_closes(&[100.0; 40]);
        let out = Macd::default().compute(&bars).expect("macd");
        for index in 33..40 {
            assert_close(out[2][index], 0.0);
        }
    }

    #[test]
    fn rejects_fast_not_below_slow() {
        let macd = Macd {
            fast: 26,
            slow: 12,
            signal: 9,
        };
        assert!(matches!(
            macd.validate(),
            Err(AnalyticsError::InvalidParameter { name: "macd.fast", .. })
        ));
    }
}
