use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InsufficientLiquidity,
    NoOrderBook,
    NoMidpoint,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InsufficientLiquidity => write!(f, "insufficient_liquidity"),
            SkipReason::NoOrderBook => write!(f, "no_order_book"),
            SkipReason::NoMidpoint => write!(f, "no_midpoint"),
        }
    }
}

impl FromStr for SkipReason {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insufficient_liquidity" => Ok(SkipReason::InsufficientLiquidity),
            "no_order_book" => Ok(SkipReason::NoOrderBook),
            "no_midpoint" => Ok(SkipReason::NoMidpoint),
            _ => Err(format!("Unknown skip reason: {s}")),
        }
    }
}

/// A match whose entry could not be priced this cycle. Audit only; the match stays retryable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub match_id: String,
    pub market_id: String,
    pub reason: SkipReason,
    pub skipped_at: DateTime<Utc>,
}
