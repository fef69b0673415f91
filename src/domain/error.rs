//! Domain error types.

/// Errors surfaced at the engine boundary.
///
/// Only structurally invalid configuration becomes an `EngineError`; numeric
/// edge cases inside indicators and statistics resolve to documented defaults.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("unsupported indicator: {name}")]
    UnsupportedIndicator { name: String },

    #[error("unsupported position sizing mode: {name}")]
    UnsupportedSizingMode { name: String },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl EngineError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        EngineError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Top-level error type for signalbench.
#[derive(Debug, thiserror::Error)]
pub enum SignalbenchError {
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

    #[error("malformed price data in {source_name}: {reason}")]
    DataFormat { source_name: String, reason: String },

    #[error("no usable price data in {source_name}")]
    NoData { source_name: String },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SignalbenchError> for std::process::ExitCode {
    fn from(err: &SignalbenchError) -> Self {
        let code: u8 = match err {
            SignalbenchError::Io(_) => 1,
            SignalbenchError::ConfigParse { .. }
            | SignalbenchError::ConfigMissing { .. }
            | SignalbenchError::ConfigInvalid { .. } => 2,
            SignalbenchError::Engine(_) => 4,
            SignalbenchError::DataFormat { .. } | SignalbenchError::NoData { .. } => 5,
            SignalbenchError::Report { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_display() {
        let err = EngineError::UnsupportedIndicator {
            name: "BOLLINGER".into(),
        };
        assert_eq!(err.to_string(), "unsupported indicator: BOLLINGER");

        let err = EngineError::invalid("period", "must be at least 1");
        assert_eq!(err.to_string(), "invalid parameter period: must be at least 1");
    }

    #[test]
    fn engine_error_converts_transparently() {
        let err: SignalbenchError = EngineError::UnsupportedSizingMode {
            name: "kelly".into(),
        }
        .into();
        assert_eq!(err.to_string(), "unsupported position sizing mode: kelly");
    }

    #[test]
    fn exit_codes_by_category() {
        use std::process::ExitCode;

        let code = |err: &SignalbenchError| format!("{:?}", ExitCode::from(err));
        let expected = |n: u8| format!("{:?}", ExitCode::from(n));

        let config = SignalbenchError::ConfigMissing {
            section: "backtest".into(),
            key: "indicator".into(),
        };
        assert_eq!(code(&config), expected(2));

        let data = SignalbenchError::NoData {
            source_name: "prices.csv".into(),
        };
        assert_eq!(code(&data), expected(5));

        let engine: SignalbenchError = EngineError::invalid("period", "zero").into();
        assert_eq!(code(&engine), expected(4));
    }
}
