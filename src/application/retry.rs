use crate::config::RetryPolicy;
use crate::domain::error::DomainError;
use std::future::Future;
use tracing::warn;

/// Run an external call under the policy's timeout, retrying transient
/// failures with exponential backoff. Non-retryable errors return at once.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T, DomainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DomainError>>,
{
    let attempts = policy.max_retries + 1;
    let mut last_error = None;

    for attempt in 0..attempts {
        match tokio::time::timeout(policy.timeout(), op()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) if !e.is_retryable() => return Err(e),
            Ok(Err(e)) => {
                warn!(call = label, attempt = attempt + 1, error = %e, "External call failed");
                last_error = Some(e);
            }
            Err(_) => {
                warn!(call = label, attempt = attempt + 1, timeout_secs = policy.timeout_secs, "External call timed out");
                last_error = Some(DomainError::TransientFetch(format!(
                    "{label} timed out after {}s",
                    policy.timeout_secs
                )));
            }
        }

        if attempt + 1 < attempts {
            tokio::time::sleep(policy.backoff(attempt)).await;
        }
    }

    Err(last_error.unwrap_or_else(|| DomainError::TransientFetch(format!("{label}: retries exhausted"))))
}
