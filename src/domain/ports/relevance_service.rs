use crate::domain::entities::market::Market;
use crate::domain::entities::signal::Signal;
use crate::domain::error::DomainError;
use async_trait::async_trait;

/// External semantic-assessment service.
///
/// Returns the service's free-text answer untouched; turning it into a
/// `Verdict` is the assessor's job.
#[async_trait]
pub trait RelevanceService: Send + Sync {
    fn name(&self) -> &str;

    async fn assess(&self, signal: &Signal, market: &Market) -> Result<String, DomainError>;
}
