use serde::{Deserialize, Serialize};

use super::ValuationRatio;
use crate::{stats, AnalyticsError, MetricFailure, PeerValuation, Symbol};

pub const MIN_PEERS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndustryOptions {
    pub ratios: Vec<ValuationRatio>,
    /// Peers (target excluded) required per comparison.
    pub min_peers: usize,
}

impl Default for IndustryOptions {
    fn default() -> Self {
        Self {
            ratios: ValuationRatio::PEER.to_vec(),
            min_peers: MIN_PEERS,
        }
    }
}

impl IndustryOptions {
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if self.ratios.is_empty() {
            return Err(AnalyticsError::invalid_parameter(
                "ratios",
                "at least one ratio is required",
            ));
        }
        if let Some(ratio) = self
            .ratios
            .iter()
            .find(|ratio| !ValuationRatio::PEER.contains(ratio))
        {
            return Err(AnalyticsError::invalid_parameter(
                "ratios",
                format!("{ratio} is not available for peer comparison"),
            ));
        }
        if self.min_peers < MIN_PEERS {
            return Err(AnalyticsError::invalid_parameter(
                "min_peers",
                format!("must be at least {MIN_PEERS}, got {}", self.min_peers),
            ));
        }
        Ok(())
    }
}

/// Target level relative to the industry mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndustryLevel {
    /// below 0.8 × mean
    SignificantlyUndervalued,
    /// below 0.95 × mean
    SlightlyUndervalued,
    /// up to 1.05 × mean
    Fair,
    /// up to 1.2 × mean
    SlightlyOvervalued,
    SignificantlyOvervalued,
}

impl IndustryLevel {
    pub fn classify(value: f64, mean: f64) -> Self {
        if value < mean * 0.8 {
            Self::SignificantlyUndervalued
        } else if value < mean * 0.95 {
            Self::SlightlyUndervalued
        } else if value <= mean * 1.05 {
            Self::Fair
        } else if value <= mean * 1.2 {
            Self::SlightlyOvervalued
        } else {
            Self::SignificantlyOvervalued
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerStatistics {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerComparison {
    pub ratio: ValuationRatio,
    pub target_value: f64,
    pub peers_used: usize,
    /// Share of the industry (target included) at or below the target.
    pub percentile: f64,
    pub statistics: PeerStatistics,
    /// `(target / mean − 1) × 100`.
    pub relative_to_mean_pct: Option<f64>,
    pub level: Option<IndustryLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryReport {
    pub symbol: Symbol,
    pub industry: String,
    pub peer_count: usize,
    pub comparisons: Vec<PeerComparison>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<MetricFailure>,
}

/// Rank `target` among `peers` (target excluded) on one ratio.
///
/// Peers without the ratio are skipped before counting.
pub fn compare_ratio(
    target: &PeerValuation,
    peers: &[&PeerValuation],
    ratio: ValuationRatio,
    min_peers: usize,
) -> Result<PeerComparison, AnalyticsError> {
    let target_value = ratio
        .of_peer(target)
        .filter(|value| value.is_finite())
        .ok_or_else(|| {
            AnalyticsError::insufficient_data(format!("{ratio} of {}", target.symbol), 1, 0)
        })?;
    let peer_values: Vec<f64> = peers
        .iter()
        .filter_map(|peer| ratio.of_peer(peer))
        .filter(|value| value.is_finite())
        .collect();
    if peer_values.len() < min_peers {
        return Err(AnalyticsError::InsufficientPeers {
            industry: target.industry.clone(),
            peers: peer_values.len(),
            required: min_peers,
        });
    }

    let mut population = Vec::with_capacity(peer_values.len() + 1);
    population.push(target_value);
    population.extend_from_slice(&peer_values);

    let empty = || AnalyticsError::insufficient_data(format!("{ratio} peers"), min_peers, 0);
    let mean = stats::mean(&population).ok_or_else(empty)?;
    let statistics = PeerStatistics {
        count: population.len(),
        mean,
        median: stats::median(&population).ok_or_else(empty)?,
        min: stats::min(&population).ok_or_else(empty)?,
        max: stats::max(&population).ok_or_else(empty)?,
        std_dev: stats::sample_std(&population),
    };

    Ok(PeerComparison {
        ratio,
        target_value,
        peers_used: peer_values.len(),
        percentile: stats::percentile_rank(target_value, &population).ok_or_else(empty)?,
        statistics,
        relative_to_mean_pct: (mean != 0.0).then(|| (target_value / mean - 1.0) * 100.0),
        level: (mean > 0.0).then(|| IndustryLevel::classify(target_value, mean)),
    })
}

/// Compare `target` with every member of `universe` sharing its industry.
///
/// Fails when fewer than `min_peers` companies besides the target belong to
/// the industry. Individual ratios that cannot be compared are reported as
/// failures.
pub fn compare_industry(
    target: &PeerValuation,
    universe: &[PeerValuation],
    options: &IndustryOptions,
) -> Result<IndustryReport, AnalyticsError> {
    options.validate()?;
    let peers: Vec<&PeerValuation> = universe
        .iter()
        .filter(|peer| peer.industry == target.industry && peer.symbol != target.symbol)
        .collect();
    tracing::debug!(
        symbol = %target.symbol,
        industry = %target.industry,
        peers = peers.len(),
        "comparing industry valuation"
    );
    if peers.len() < options.min_peers {
        return Err(AnalyticsError::InsufficientPeers {
            industry: target.industry.clone(),
            peers: peers.len(),
            required: options.min_peers,
        });
    }

    let mut comparisons = Vec::new();
    let mut failures = Vec::new();
    for ratio in &options.ratios {
        match compare_ratio(target, &peers, *ratio, options.min_peers) {
            Ok(comparison) => comparisons.push(comparison),
            Err(err) => {
                tracing::warn!(symbol = %target.symbol, %ratio, error = %err, "ratio comparison skipped");
                failures.push(MetricFailure::new(ratio.as_str(), &err));
            }
        }
    }

    Ok(IndustryReport {
        symbol: target.symbol.clone(),
        industry: target.industry.clone(),
        peer_count: peers.len(),
        comparisons,
        failures,
    })
}
