use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Market, price, headline or external service retrieval failed. Retried next cycle.
    #[error("Transient fetch error: {0}")]
    TransientFetch(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    /// No verdict could be recovered from the relevance service response.
    #[error("Assessment parse error: {0}")]
    AssessmentParse(String),

    /// The order book cannot fill the notional inside the liquidity band.
    #[error("Liquidity infeasible: {0}")]
    LiquidityInfeasible(String),

    /// A second open trade was attempted on a market that already has one.
    #[error("Duplicate exposure: {0}")]
    DuplicateExposure(String),

    /// Store write or read failure. The only cycle-fatal error.
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl DomainError {
    /// Whether this error must abort the current cycle.
    pub fn is_cycle_fatal(&self) -> bool {
        matches!(self, DomainError::Persistence(_))
    }

    /// Whether another attempt at the same external call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::TransientFetch(_))
    }
}

impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self {
        DomainError::Persistence(e.to_string())
    }
}
