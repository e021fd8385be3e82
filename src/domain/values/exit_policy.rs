//! Exit rules for open paper trades.
//!
//! Checked in priority order, first match wins:
//! 1. stop-loss: return ≤ −stop_loss, at any hold time
//! 2. take-profit: return ≥ take_profit, only after the minimum hold
//! 3. time expiry: held ≥ max_hold, regardless of return

use crate::domain::entities::trade::Trade;
use crate::domain::values::trade_status::CloseReason;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

const EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Serialize)]
pub struct ExitPolicy {
    /// Fractional gain that triggers take-profit. Default: 0.03.
    pub take_profit: f64,
    /// Fractional loss (positive number) that triggers stop-loss. Default: 0.05.
    pub stop_loss: f64,
    /// Take-profit is suppressed until the trade has been held this long.
    #[serde(serialize_with = "serialize_minutes")]
    pub min_hold_for_take_profit: Duration,
    #[serde(serialize_with = "serialize_minutes")]
    pub max_hold: Duration,
}

fn serialize_minutes<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i64(d.num_minutes())
}

impl Default for ExitPolicy {
    fn default() -> Self {
        Self {
            take_profit: 0.03,
            stop_loss: 0.05,
            min_hold_for_take_profit: Duration::minutes(15),
            max_hold: Duration::hours(2),
        }
    }
}

impl ExitPolicy {
    /// Decide whether `trade` closes at `price` at time `now`.
    pub fn evaluate(&self, trade: &Trade, price: f64, now: DateTime<Utc>) -> Option<CloseReason> {
        if !trade.is_open() {
            return None;
        }
        let ret = trade.unrealized_return(price);
        let held = trade.held_for(now);

        if ret <= -self.stop_loss + EPSILON {
            Some(CloseReason::StopLoss)
        } else if ret >= self.take_profit - EPSILON && held >= self.min_hold_for_take_profit {
            Some(CloseReason::TakeProfit)
        } else if held >= self.max_hold {
            Some(CloseReason::TimeExpired)
        } else {
            None
        }
    }
}
