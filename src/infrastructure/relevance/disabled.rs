use crate::domain::entities::market::Market;
use crate::domain::entities::signal::Signal;
use crate::domain::error::DomainError;
use crate::domain::ports::relevance_service::RelevanceService;
use async_trait::async_trait;

/// Stand-in when no relevance API key is configured. Every call fails, so
/// candidate pairs stay unevaluated until a key is provided.
pub struct DisabledRelevance;

#[async_trait]
impl RelevanceService for DisabledRelevance {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn assess(&self, _signal: &Signal, _market: &Market) -> Result<String, DomainError> {
        Err(DomainError::Config(
            "relevance service not configured (ANTHROPIC_API_KEY unset)".into(),
        ))
    }
}
