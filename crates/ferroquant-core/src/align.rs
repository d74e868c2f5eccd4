//! Date-axis alignment of independently retrieved series.
//!
//! Alignment is a strict intersection: dates missing from any input are
//! dropped, never interpolated or forward-filled.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{AnalyticsError, BarSeries, TradingDate, ValidationError};

/// Date-indexed values with strictly increasing dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedSeries<T> {
    points: Vec<(TradingDate, T)>,
}

/// Simple returns keyed by the later of the two closes they derive from.
pub type ReturnSeries = DatedSeries<f64>;

impl<T> DatedSeries<T> {
    pub fn new(points: Vec<(TradingDate, T)>) -> Result<Self, ValidationError> {
        for pair in points.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(ValidationError::UnorderedSeries {
                    previous: pair[0].0.to_string(),
                    next: pair[1].0.to_string(),
                });
            }
        }
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[(TradingDate, T)] {
        &self.points
    }

    pub fn dates(&self) -> impl Iterator<Item = TradingDate> + '_ {
        self.points.iter().map(|(date, _)| *date)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.points.iter().map(|(_, value)| value)
    }
}

impl ReturnSeries {
    /// `r[t] = close[t] / close[t-1] - 1`, dated at `t`.
    ///
    /// A zero previous close has no defined return; that date is skipped.
    pub fn from_bars(series: &BarSeries) -> Self {
        let points = series
            .bars
            .windows(2)
            .filter(|pair| pair[0].close != 0.0)
            .map(|pair| (pair[1].date, pair[1].close / pair[0].close - 1.0))
            .collect();
        Self { points }
    }

    pub fn to_values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, value)| *value).collect()
    }
}

/// Two return series restricted to their common dates.
///
/// `asset`, `benchmark` and `dates` always have equal length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedPair {
    pub dates: Vec<TradingDate>,
    pub asset: Vec<f64>,
    pub benchmark: Vec<f64>,
}

impl AlignedPair {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Restrict every input to the dates present in all of them.
///
/// Output order matches input order; each output keeps chronological order.
pub fn align<T: Clone>(series: &[&DatedSeries<T>]) -> Result<Vec<DatedSeries<T>>, AnalyticsError> {
    if series.len() < 2 {
        return Err(AnalyticsError::invalid_parameter(
            "series",
            format!("alignment needs at least 2 series, got {}", series.len()),
        ));
    }

    let mut common: BTreeSet<TradingDate> = series[0].dates().collect();
    for other in &series[1..] {
        let dates: BTreeSet<TradingDate> = other.dates().collect();
        common.retain(|date| dates.contains(date));
    }

    if common.is_empty() {
        return Err(AnalyticsError::alignment(format!(
            "no common dates across {} series",
            series.len()
        )));
    }

    let aligned = series
        .iter()
        .map(|input| DatedSeries {
            points: input
                .points
                .iter()
                .filter(|(date, _)| common.contains(date))
                .cloned()
                .collect(),
        })
        .collect();

    Ok(aligned)
}

/// Align asset and benchmark returns into an [`AlignedPair`].
pub fn align_pair(
    asset: &ReturnSeries,
    benchmark: &ReturnSeries,
) -> Result<AlignedPair, AnalyticsError> {
    let aligned = align(&[asset, benchmark])?;
    let (asset, benchmark) = (&aligned[0], &aligned[1]);

    Ok(AlignedPair {
        dates: asset.dates().collect(),
        asset: asset.to_values(),
        benchmark: benchmark.to_values(),
    })
}
