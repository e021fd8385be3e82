pub mod noop;
pub mod openai;
pub mod voyage;

use crate::domain::error::DomainError;
use reqwest::StatusCode;

/// Rate limits and server errors are worth retrying; anything else is not.
pub(crate) fn status_error(provider: &str, status: StatusCode, body: &str) -> DomainError {
    let msg = format!("{provider} API {status}: {body}");
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        DomainError::TransientFetch(msg)
    } else {
        DomainError::Embedding(msg)
    }
}
