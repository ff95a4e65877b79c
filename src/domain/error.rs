//! Domain error types.
//!
//! Data gaps and indicator warm-up are not errors: they are absorbed into
//! `None` indicator values and neutral decisions upstream. The variants here
//! cover what genuinely fails: broken collaborators, bad configuration, and
//! rejected portfolio transactions.

/// Top-level error type for markettwin.
#[derive(Debug, thiserror::Error)]
pub enum TwinError {
    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config: {reason}")]
    ConfigInvalid { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient cash: need {needed:.2}, have {available:.2}")]
    InsufficientCash { needed: f64, available: f64 },

    #[error("no position in {symbol}")]
    NoPosition { symbol: String },

    #[error("cannot sell {requested} shares of {symbol}, only hold {held}")]
    InsufficientShares {
        symbol: String,
        requested: u64,
        held: u64,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<&TwinError> for std::process::ExitCode {
    fn from(err: &TwinError) -> Self {
        let code: u8 = match err {
            TwinError::Io(_) | TwinError::Json(_) => 1,
            TwinError::ConfigParse { .. } | TwinError::ConfigInvalid { .. } => 2,
            TwinError::DataSource { .. } => 3,
            TwinError::NoData { .. } => 4,
            TwinError::InsufficientCash { .. }
            | TwinError::NoPosition { .. }
            | TwinError::InsufficientShares { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
