//! Bounded worker pool for analytics across a symbol universe.
//!
//! Each symbol is computed independently; one symbol's failure is carried in
//! its own [`BatchItem`] and never affects the others. Results come back in
//! input order.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;

use crate::indicators::{compute_indicators, IndicatorReport};
use crate::moving_average::{compute_moving_averages, MovingAverageReport};
use crate::risk::{compute_risk, RiskReport};
use crate::{AnalyticsConfig, AnalyticsError, BarSeries, CoreError, MetricFailure, Symbol};

/// Outcome for one symbol of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem<T> {
    pub symbol: Symbol,
    pub result: Result<T, AnalyticsError>,
}

impl<T> BatchItem<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Indicators, moving averages and risk for one symbol.
///
/// Each engine is independent: a report is `None` when its engine failed
/// (listed in `failures`) or, for risk, when no benchmark was supplied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolAnalysis {
    pub indicators: Option<IndicatorReport>,
    pub moving_averages: Option<MovingAverageReport>,
    pub risk: Option<RiskReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<MetricFailure>,
}

impl SymbolAnalysis {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

fn isolate<T>(
    engine: &str,
    result: Result<T, AnalyticsError>,
    failures: &mut Vec<MetricFailure>,
    first_error: &mut Option<AnalyticsError>,
) -> Option<T> {
    match result {
        Ok(report) => Some(report),
        Err(err) => {
            failures.push(MetricFailure::new(engine, &err));
            first_error.get_or_insert(err);
            None
        }
    }
}

pub struct BatchRunner {
    pool: ThreadPool,
}

impl BatchRunner {
    /// Pool with `worker_threads` workers, or one per available core.
    pub fn new(worker_threads: Option<usize>) -> Result<Self, CoreError> {
        let threads = worker_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(1)
        });
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|index| format!("ferroquant-worker-{index}"))
            .build()?;
        tracing::debug!(threads = pool.current_num_threads(), "batch pool ready");
        Ok(Self { pool })
    }

    pub fn from_config(config: &AnalyticsConfig) -> Result<Self, CoreError> {
        Self::new(config.worker_threads)
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Apply `job` to every series on the pool, preserving input order.
    pub fn run<T, F>(&self, universe: &[BarSeries], job: F) -> Vec<BatchItem<T>>
    where
        T: Send,
        F: Fn(&BarSeries) -> Result<T, AnalyticsError> + Sync,
    {
        self.pool.install(|| {
            universe
                .par_iter()
                .map(|series| {
                    let result = job(series);
                    if let Err(err) = &result {
                        tracing::warn!(symbol = %series.symbol, error = %err, "batch item failed");
                    }
                    BatchItem {
                        symbol: series.symbol.clone(),
                        result,
                    }
                })
                .collect()
        })
    }

    pub fn indicators(
        &self,
        universe: &[BarSeries],
        config: &AnalyticsConfig,
    ) -> Vec<BatchItem<IndicatorReport>> {
        self.run(universe, |series| {
            compute_indicators(series, &config.indicators)
        })
    }

    pub fn moving_averages(
        &self,
        universe: &[BarSeries],
        config: &AnalyticsConfig,
    ) -> Vec<BatchItem<MovingAverageReport>> {
        self.run(universe, |series| {
            compute_moving_averages(series, &config.moving_averages)
        })
    }

    pub fn risk(
        &self,
        universe: &[BarSeries],
        benchmark: &BarSeries,
        config: &AnalyticsConfig,
    ) -> Vec<BatchItem<RiskReport>> {
        self.run(universe, |series| compute_risk(series, benchmark, &config.risk))
    }

    /// Every per-symbol engine, with the three computations joined in
    /// parallel inside each item.
    ///
    /// A failing engine is recorded in [`SymbolAnalysis::failures`] next to
    /// the reports that succeeded. The item is an error only when no engine
    /// produced a report.
    pub fn analyze(
        &self,
        universe: &[BarSeries],
        benchmark: Option<&BarSeries>,
        config: &AnalyticsConfig,
    ) -> Vec<BatchItem<SymbolAnalysis>> {
        self.run(universe, |series| {
            let ((indicators, moving_averages), risk) = rayon::join(
                || {
                    rayon::join(
                        || compute_indicators(series, &config.indicators),
                        || compute_moving_averages(series, &config.moving_averages),
                    )
                },
                || benchmark.map(|benchmark| compute_risk(series, benchmark, &config.risk)),
            );
            let mut failures = Vec::new();
            let mut first_error = None;
            let analysis = SymbolAnalysis {
                indicators: isolate("indicators", indicators, &mut failures, &mut first_error),
                moving_averages: isolate(
                    "moving_averages",
                    moving_averages,
                    &mut failures,
                    &mut first_error,
                ),
                risk: risk.and_then(|risk| isolate("risk", risk, &mut failures, &mut first_error)),
                failures,
            };

            let produced = analysis.indicators.is_some()
                || analysis.moving_averages.is_some()
                || analysis.risk.is_some();
            match first_error {
                Some(err) if !produced => Err(err),
                _ => Ok(analysis),
            }
        })
    }
}
