#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("No chain data available")]
    NoChainData,
    #[error("Total fund size oracle unavailable: {0}")]
    OracleUnavailable(String),
    #[error("Persistence conflict: {0}")]
    PersistenceConflict(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Failed to fetch metrics for chain {chain}: {message}")]
    Source { chain: String, message: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl EngineError {
    pub fn chain_fetch(chain: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Source {
            chain: chain.into(),
            message: message.to_string(),
        }
    }

    /// The day could not be computed because inputs were missing.
    pub const fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::NoChainData)
    }

    /// The computation ran but the result could not be stored.
    pub const fn is_persistence_failure(&self) -> bool {
        matches!(self, Self::PersistenceConflict(_) | Self::Persistence(_))
    }

    /// Whether the scheduler should retry the whole computation later.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NoChainData | Self::PersistenceConflict(_) | Self::Persistence(_)
        )
    }
}
