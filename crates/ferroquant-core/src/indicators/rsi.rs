use serde::{Deserialize, Serialize};

use super::{closes, require_period, Indicator, IndicatorKind};
use crate::{AnalyticsError, Bar};

/// Relative Strength Index with Wilder smoothing.
///
/// The first average gain/loss is the plain mean of the first `period`
/// changes; later values use `(prev × (period − 1) + current) / period`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Rsi {
    pub period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            // flat window
            50.0
        } else {
            100.0
        }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

impl Indicator for Rsi {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Rsi
    }

    fn columns(&self) -> &'static [&'static str] {
        &["RSI"]
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn validate(&self) -> Result<(), AnalyticsError> {
        require_period("rsi.period", self.period)
    }

    fn compute(&self, bars: &[Bar]) -> Result<Vec<Vec<Option<f64>>>, AnalyticsError> {
        self.validate()?;
        let closes = closes(bars);
        let period = self.period;
        let mut out = vec![None; closes.len()];
        if closes.len() <= period {
            return Ok(vec![out]);
        }

        let (gains, losses): (Vec<f64>, Vec<f64>) = closes
            .windows(2)
            .map(|pair| {
                let change = pair[1] - pair[0];
                (change.max(0.0), (-change).max(0.0))
            })
            .unzip();

        let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
        let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;
        out[period] = Some(rsi_value(avg_gain, avg_loss));

        for change in period..gains.len() {
            avg_gain = (avg_gain * (period - 1) as f64 + gains[change]) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + losses[change]) / period as f64;
            out[change + 1] = Some(rsi_value(avg_gain, avg_loss));
        }

        Ok(vec![out])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::{assert_close, bars_from_closes};

    #[test]
    fn flat_series_is_fifty() {
        let out = Rsi::default()
            .compute(&bars_from_closes(&[100.0; 25]))
            .expect("rsi");
        assert_eq!(out[0][13], None);
        for index in 14..25 {
            assert_close(out[0][index], 50.0);
        }
    }

    #[test]
    fn pure_uptrend_is_hundred() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let out = Rsi { period: 5 }
            .compute(&bars_from_closes(&closes))
            .expect("rsi");
        assert_close(out[0][19], 100.0);
    }

    #[test]
    fn stays_within_bounds() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0)
            .collect();
        let out = Rsi::default()
            .compute(&bars_from_closes(&closes))
            .expect("rsi");
        assert!(out[0]
            .iter()
            .flatten()
            .all(|value| (0.0..=100.0).contains(value)));
    }

    #[test]
    fn matches_hand_computed_value() {
        // changes: +1, -1, +2 with period 2 → seed gains 0.5 losses 0.5,
        // then gain (0.5 + 2) / 2 = 1.25, loss 0.25 → RS 5
        let out = Rsi { period: 2 }
            .compute(&bars_from_closes(&[10.0, 11.0, 10.0, 12.0]))
            .expect("rsi");
        assert_close(out[0][2], 50.0);
        assert_close(out[0][3], 100.0 - 100.0 / 6.0);
    }
}
