use thiserror::Error;

use rebal_engine::EngineError;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Response is missing field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid value for '{field}': {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Cannot read chain configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid chain configuration: {0}")]
    Config(String),
}

impl SourceError {
    pub fn into_chain_error(self, chain_name: &str) -> EngineError {
        EngineError::chain_fetch(chain_name, self)
    }

    pub fn into_oracle_error(self) -> EngineError {
        EngineError::OracleUnavailable(self.to_string())
    }
}
