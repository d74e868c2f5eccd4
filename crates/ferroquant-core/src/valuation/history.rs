use serde::{Deserialize, Serialize};

use super::ValuationRatio;
use crate::{stats, AnalyticsError, MetricFailure, Symbol, TradingDate, ValuationSnapshot};

/// Where the latest value of one ratio sits within its own history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioHistory {
    pub ratio: ValuationRatio,
    pub observations: usize,
    pub current: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// `(current / mean − 1) × 100`, absent when the mean is zero.
    pub deviation_pct: Option<f64>,
    /// Share of observations `<= current`, in percent.
    pub percentile: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationHistoryReport {
    pub symbol: Symbol,
    pub start: TradingDate,
    pub end: TradingDate,
    pub latest_close: f64,
    pub ratios: Vec<RatioHistory>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<MetricFailure>,
}

fn ratio_history(
    ratio: ValuationRatio,
    snapshots: &[ValuationSnapshot],
) -> Result<RatioHistory, AnalyticsError> {
    let values: Vec<f64> = snapshots
        .iter()
        .filter_map(|snapshot| ratio.of_snapshot(snapshot))
        .filter(|value| value.is_finite())
        .collect();
    let Some(current) = values.last().copied() else {
        return Err(AnalyticsError::insufficient_data(
            format!("{ratio} history"),
            1,
            0,
        ));
    };
    let insufficient = || AnalyticsError::insufficient_data(format!("{ratio} history"), 1, 0);
    let mean = stats::mean(&values).ok_or_else(insufficient)?;

    Ok(RatioHistory {
        ratio,
        observations: values.len(),
        current,
        mean,
        min: stats::min(&values).ok_or_else(insufficient)?,
        max: stats::max(&values).ok_or_else(insufficient)?,
        deviation_pct: (mean != 0.0).then(|| (current / mean - 1.0) * 100.0),
        percentile: stats::percentile_rank(current, &values).ok_or_else(insufficient)?,
    })
}

/// Summarize PE/PB/PS/PCF over a chronological snapshot series.
///
/// A ratio with no observations is reported as a failure; the others are
/// still summarized.
pub fn valuation_history(
    symbol: &Symbol,
    snapshots: &[ValuationSnapshot],
) -> Result<ValuationHistoryReport, AnalyticsError> {
    let (Some(first), Some(last)) = (snapshots.first(), snapshots.last()) else {
        return Err(AnalyticsError::insufficient_data("valuation snapshots", 1, 0));
    };
    tracing::debug!(%symbol, snapshots = snapshots.len(), "summarizing valuation history");

    let mut ratios = Vec::new();
    let mut failures = Vec::new();
    for ratio in ValuationRatio::ALL {
        match ratio_history(ratio, snapshots) {
            Ok(history) => ratios.push(history),
            Err(err) => {
                tracing::warn!(%symbol, %ratio, error = %err, "ratio history unavailable");
                failures.push(MetricFailure::new(ratio.as_str(), &err));
            }
        }
    }

    Ok(ValuationHistoryReport {
        symbol: symbol.clone(),
        start: first.date,
        end: last.date,
        latest_close: last.close,
        ratios,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(date: &str, pe: Option<f64>) -> ValuationSnapshot {
        ValuationSnapshot {
            date: TradingDate::parse(date).expect("date"),
            close: 10.0,
            pe_ttm: pe,
            pb_mrq: Some(1.0),
            ps_ttm: None,
            pcf_ttm: None,
        }
    }

    #[test]
    fn summarizes_current_against_history() {
        let snapshots = vec![
            snapshot("2024-01-02", Some(10.0)),
            snapshot("2024-01-03", Some(20.0)),
            snapshot("2024-01-04", None),
            snapshot("2024-01-05", Some(15.0)),
        ];
        let symbol = Symbol::parse("sh.600519").expect("symbol");
        let report = valuation_history(&symbol, &snapshots).expect("report");

        let pe = &report.ratios[0];
        assert_eq!(pe.ratio, ValuationRatio::Pe);
        assert_eq!(pe.observations, 3);
        assert_eq!(pe.current, 15.0);
        assert_eq!(pe.mean, 15.0);
        assert_eq!(pe.deviation_pct, Some(0.0));
        assert!((pe.percentile - 200.0 / 3.0).abs() < 1e-9);

        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].metric, "ps");
    }

    #[test]
    fn empty_history_is_insufficient() {
        let symbol = Symbol::parse("sh.600519").expect("symbol");
        let err = valuation_history(&symbol, &[]).expect_err("must fail");
        assert!(matches!(err, AnalyticsError::InsufficientData { .. }));
    }
}
