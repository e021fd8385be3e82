use crate::application::retry::with_retry;
use crate::config::RetryPolicy;
use crate::domain::entities::market::Market;
use crate::domain::entities::signal::Signal;
use crate::domain::error::DomainError;
use crate::domain::ports::relevance_service::RelevanceService;
use crate::domain::values::verdict::Verdict;
use std::sync::Arc;
use tracing::debug;

/// Relevance gate: calls the external service under the retry policy and
/// parses its answer into a [`Verdict`].
pub struct RelevanceAssessor {
    service: Arc<dyn RelevanceService>,
    retry: RetryPolicy,
}

impl RelevanceAssessor {
    pub fn new(service: Arc<dyn RelevanceService>, retry: RetryPolicy) -> Self {
        Self { service, retry }
    }

    pub fn service_name(&self) -> &str {
        self.service.name()
    }

    pub async fn assess(&self, signal: &Signal, market: &Market) -> Result<Verdict, DomainError> {
        let raw = with_retry(&self.retry, "assess_relevance", || {
            self.service.assess(signal, market)
        })
        .await?;

        let verdict = Verdict::parse(&raw)?;
        debug!(
            signal = %signal.id,
            market = %market.id,
            relevant = verdict.relevant,
            direction = %verdict.direction,
            confidence = verdict.confidence.value(),
            "Relevance verdict"
        );
        Ok(verdict)
    }
}
