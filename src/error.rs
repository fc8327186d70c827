use thiserror::Error;

// Error types for the price lookup pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PriceError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream error: {status_code} - {body}")]
    Upstream { status_code: u16, body: String },

    #[error("Data error: {0}")]
    Data(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),
}

impl PriceError {
    /// Short label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            PriceError::Configuration(_) => "configuration",
            PriceError::Upstream { .. } => "upstream",
            PriceError::Data(_) => "data",
            PriceError::Network(_) => "network",
            PriceError::Timeout(_) => "timeout",
        }
    }
}

impl From<serde_json::Error> for PriceError {
    fn from(err: serde_json::Error) -> Self {
        PriceError::Data(format!("invalid JSON payload: {err}"))
    }
}
