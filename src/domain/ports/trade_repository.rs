use crate::domain::entities::skipped_entry::SkippedEntry;
use crate::domain::entities::trade::Trade;
use crate::domain::error::DomainError;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct TradeFilter {
    pub limit: Option<usize>,
    pub since: Option<DateTime<Utc>>,
    pub market_id: Option<String>,
    /// `Some(true)` closed only, `Some(false)` open only.
    pub closed: Option<bool>,
}

impl TradeFilter {
    pub fn open() -> Self {
        Self {
            closed: Some(false),
            ..Self::default()
        }
    }

    pub fn closed() -> Self {
        Self {
            closed: Some(true),
            ..Self::default()
        }
    }
}

/// Durable trade store. All writes are single-record and all-or-nothing.
pub trait TradeRepository: Send + Sync {
    /// Insert a new open trade. Fails with `DuplicateExposure` when the market
    /// already has an open trade.
    fn add_trade(&self, trade: &Trade) -> Result<(), DomainError>;
    /// Persist the terminal fields of a trade that is still open in the store.
    /// Returns false if the stored trade was already closed.
    fn close_trade(&self, trade: &Trade) -> Result<bool, DomainError>;
    fn list_trades(&self, filter: &TradeFilter) -> Result<Vec<Trade>, DomainError>;
    fn get_trade(&self, id: &str) -> Result<Option<Trade>, DomainError>;
    fn open_trade_for_market(&self, market_id: &str) -> Result<Option<Trade>, DomainError>;
    fn has_trade_for_match(&self, match_id: &str) -> Result<bool, DomainError>;
    /// Append a skip unless the latest skip for the same match has the same
    /// reason. Returns whether a row was written.
    fn record_skip(&self, skip: &SkippedEntry) -> Result<bool, DomainError>;
    fn list_skipped(&self, limit: Option<usize>) -> Result<Vec<SkippedEntry>, DomainError>;
}
