//! Domain error types.

/// Top-level error type for trendtrader.
#[derive(Debug, thiserror::Error)]
pub enum TrendtraderError {
    #[error("data error: {reason}")]
    Data { reason: String },

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

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("strategy {name} already stopped")]
    AlreadyStopped { name: String },

    #[error("no data for {code} on {exchange}")]
    NoData { code: String, exchange: String },

    #[error("insufficient data for {code} on {exchange}: have {bars} bars, need {minimum}")]
    InsufficientData {
        code: String,
        exchange: String,
        bars: usize,
        minimum: usize,
    },

    #[error("failed to persist {what}: {reason}")]
    Persistence { what: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TrendtraderError> for std::process::ExitCode {
    fn from(err: &TrendtraderError) -> Self {
        let code: u8 = match err {
            TrendtraderError::Io(_) => 1,
            TrendtraderError::ConfigParse { .. }
            | TrendtraderError::ConfigMissing { .. }
            | TrendtraderError::ConfigInvalid { .. } => 2,
            TrendtraderError::Data { .. } | TrendtraderError::Persistence { .. } => 3,
            TrendtraderError::UnknownStrategy { .. } | TrendtraderError::AlreadyStopped { .. } => 4,
            TrendtraderError::NoData { .. } | TrendtraderError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
