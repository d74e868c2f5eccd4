use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation and contract errors exposed by `ferroquant-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },
    #[error("symbol must be exchange-qualified as <exchange>.<code>: '{value}'")]
    SymbolNotQualified { value: String },

    #[error("date must be ISO YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("quarter must be 1, 2, 3 or 4: '{value}'")]
    InvalidQuarter { value: String },
    #[error("unknown indicator '{value}', expected one of MACD, RSI, KDJ, BOLL, WR, STOCH, CCI, ATR")]
    UnknownIndicator { value: String },
    #[error("unknown moving average kind '{value}', expected one of SMA, EMA, WMA")]
    UnknownMovingAverage { value: String },
    #[error("unknown valuation ratio '{value}', expected one of pe, pb, ps, pcf")]
    UnknownRatio { value: String },
    #[error("invalid risk period '{value}', expected one of 3M, 6M, 1Y, 2Y")]
    InvalidRiskPeriod { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("bar high must be >= low")]
    InvalidBarRange,
    #[error("bar open/close must be within high/low range")]
    InvalidBarBounds,
    #[error("bar dates must be strictly increasing: {previous} then {next}")]
    UnorderedBars { previous: String, next: String },
    #[error("series dates must be strictly increasing: {previous} then {next}")]
    UnorderedSeries { previous: String, next: String },

    #[error("table row has {actual} cells, expected {expected}")]
    RowWidth { expected: usize, actual: usize },

    #[error("request_id must be at least 8 characters")]
    InvalidRequestId,
    #[error("trace_id must be 32 hex characters")]
    InvalidTraceId,
    #[error("schema_version must match vMAJOR.MINOR.PATCH: '{value}'")]
    InvalidSchemaVersion { value: String },
    #[error("engine name cannot be empty")]
    EmptyEngine,

    #[error("error code cannot be empty")]
    EmptyErrorCode,
    #[error("error message cannot be empty")]
    EmptyErrorMessage,
}

/// Analytics error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsErrorKind {
    InsufficientData,
    InvalidParameter,
    Alignment,
    DegenerateInput,
    InsufficientPeers,
    Validation,
}

/// Typed failure of a single engine computation.
///
/// Every analytics computation is deterministic, so none of these are
/// retryable.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("insufficient data for {what}: required {required}, got {actual}")]
    InsufficientData {
        what: String,
        required: usize,
        actual: usize,
    },

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("series alignment failed: {reason}")]
    Alignment { reason: String },

    #[error("degenerate input: {reason}")]
    DegenerateInput { reason: String },

    #[error("industry '{industry}' has {peers} peer(s), at least {required} required")]
    InsufficientPeers {
        industry: String,
        peers: usize,
        required: usize,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl AnalyticsError {
    pub fn insufficient_data(what: impl Into<String>, required: usize, actual: usize) -> Self {
        Self::InsufficientData {
            what: what.into(),
            required,
            actual,
        }
    }

    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub fn alignment(reason: impl Into<String>) -> Self {
        Self::Alignment {
            reason: reason.into(),
        }
    }

    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateInput {
            reason: reason.into(),
        }
    }

    pub const fn kind(&self) -> AnalyticsErrorKind {
        match self {
            Self::InsufficientData { .. } => AnalyticsErrorKind::InsufficientData,
            Self::InvalidParameter { .. } => AnalyticsErrorKind::InvalidParameter,
            Self::Alignment { .. } => AnalyticsErrorKind::Alignment,
            Self::DegenerateInput { .. } => AnalyticsErrorKind::DegenerateInput,
            Self::InsufficientPeers { .. } => AnalyticsErrorKind::InsufficientPeers,
            Self::Validation(_) => AnalyticsErrorKind::Validation,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self.kind() {
            AnalyticsErrorKind::InsufficientData => "analytics.insufficient_data",
            AnalyticsErrorKind::InvalidParameter => "analytics.invalid_parameter",
            AnalyticsErrorKind::Alignment => "analytics.alignment",
            AnalyticsErrorKind::DegenerateInput => "analytics.degenerate_input",
            AnalyticsErrorKind::InsufficientPeers => "analytics.insufficient_peers",
            AnalyticsErrorKind::Validation => "analytics.validation",
        }
    }

    pub const fn retryable(&self) -> bool {
        false
    }
}

/// A failed sibling computation reported next to the results that succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricFailure {
    pub metric: String,
    pub code: String,
    pub message: String,
}

impl MetricFailure {
    pub fn new(metric: impl Into<String>, error: &AnalyticsError) -> Self {
        Self {
            metric: metric.into(),
            code: error.code().to_owned(),
            message: error.to_string(),
        }
    }
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_stable_codes() {
        let err = AnalyticsError::invalid_parameter("discount_rate", "must be in (0, 1)");
        assert_eq!(err.code(), "analytics.invalid_parameter");
        assert!(!err.retryable());

        let err = AnalyticsError::from(ValidationError::EmptySymbol);
        assert_eq!(err.kind(), AnalyticsErrorKind::Validation);
    }

    #[test]
    fn renders_peer_shortfall() {
        let err = AnalyticsError::InsufficientPeers {
            industry: String::from("banking"),
            peers: 1,
            required: 2,
        };
        assert_eq!(
            err.to_string(),
            "industry 'banking' has 1 peer(s), at least 2 required"
        );
    }
}
