use crate::domain::entities::market_match::{Evaluation, Match};
use crate::domain::error::DomainError;
use chrono::{DateTime, Utc};

/// Append-only match log plus the evaluated-pairs audit set.
pub trait MatchRepository: Send + Sync {
    /// Persist a batch of evaluations, and the matches they carry, in one
    /// transaction. Pairs already present are left untouched.
    fn record_evaluations(&self, evaluations: &[Evaluation]) -> Result<usize, DomainError>;
    fn evaluated_pairs(&self) -> Result<Vec<(String, String)>, DomainError>;
    fn list_evaluations(&self, limit: Option<usize>) -> Result<Vec<Evaluation>, DomainError>;
    fn list_matches(&self, since: Option<DateTime<Utc>>, limit: Option<usize>) -> Result<Vec<Match>, DomainError>;
    fn get_match(&self, id: &str) -> Result<Option<Match>, DomainError>;
}
