use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ferroquant_core::ValidationError),

    #[error(transparent)]
    Analytics(#[from] ferroquant_core::AnalyticsError),

    #[error("input error: {0}")]
    Input(String),

    #[error("strict mode failed: warnings={warning_count}, errors={error_count}")]
    StrictModeViolation {
        warning_count: usize,
        error_count: usize,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) | Self::Input(_) => 2,
            Self::Analytics(_) => 3,
            Self::Serialization(_) => 4,
            Self::StrictModeViolation { .. } => 5,
            Self::Io(_) => 10,
        }
    }
}

impl From<ferroquant_core::CoreError> for CliError {
    fn from(error: ferroquant_core::CoreError) -> Self {
        use ferroquant_core::CoreError;

        match error {
            CoreError::Validation(error) => Self::Validation(error),
            CoreError::Analytics(error) => Self::Analytics(error),
            CoreError::Serialization(error) => Self::Serialization(error),
            CoreError::Io(error) => Self::Io(error),
            CoreError::WorkerPool(error) => Self::Io(std::io::Error::other(error)),
        }
    }
}
