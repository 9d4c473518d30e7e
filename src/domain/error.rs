//! Domain error types.

/// Top-level error type for tradesim.
///
/// Configuration problems are raised before any simulation work begins;
/// nothing inside a run produces an error.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown signal expression '{name}' in slot {slot}")]
    UnknownExpression { slot: String, name: String },

    #[error("signal expression '{expression}' needs indicator '{indicator}', which is not configured")]
    MissingIndicator {
        expression: String,
        indicator: String,
    },

    #[error("unknown strategy preset '{name}'")]
    UnknownPreset { name: String },

    #[error("bar series is empty")]
    EmptySeries,

    #[error("bar timestamps must be strictly increasing (violated at index {index})")]
    UnorderedBars { index: usize },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        EngineError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&EngineError> for std::process::ExitCode {
    fn from(err: &EngineError) -> Self {
        let code: u8 = match err {
            EngineError::Io(_) => 1,
            EngineError::ConfigParse { .. }
            | EngineError::ConfigMissing { .. }
            | EngineError::ConfigInvalid { .. } => 2,
            EngineError::UnknownExpression { .. }
            | EngineError::MissingIndicator { .. }
            | EngineError::UnknownPreset { .. } => 4,
            EngineError::EmptySeries
            | EngineError::UnorderedBars { .. }
            | EngineError::Data { .. } => 5,
            EngineError::Report { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
