use crate::domain::values::trade_side::TradeSide;
use crate::domain::values::trade_status::{CloseReason, TradeStatus};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub market_id: String,
    pub match_id: String,
    pub side: TradeSide,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    /// Fixed notional in dollars.
    pub notional: f64,
    pub shares: f64,
    pub status: TradeStatus,
    pub close_time: Option<DateTime<Utc>>,
    pub close_reason: Option<CloseReason>,
    pub exit_price: Option<f64>,
    pub realized_pnl: Option<f64>,
}

impl Trade {
    pub fn open(
        market_id: String,
        match_id: String,
        side: TradeSide,
        entry_price: f64,
        notional: f64,
        entry_time: DateTime<Utc>,
    ) -> Self {
        let shares = if entry_price > 0.0 { notional / entry_price } else { 0.0 };
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            market_id,
            match_id,
            side,
            entry_price,
            entry_time,
            notional,
            shares,
            status: TradeStatus::Open,
            close_time: None,
            close_reason: None,
            exit_price: None,
            realized_pnl: None,
        }
    }

    /// Side-adjusted fractional return at `price`.
    pub fn unrealized_return(&self, price: f64) -> f64 {
        if self.entry_price <= 0.0 {
            return 0.0;
        }
        self.side.sign() * (price - self.entry_price) / self.entry_price
    }

    pub fn held_for(&self, now: DateTime<Utc>) -> Duration {
        now - self.entry_time
    }

    /// Terminal transition. Returns false, leaving the record untouched, if already closed.
    pub fn close(&mut self, reason: CloseReason, exit_price: f64, now: DateTime<Utc>) -> bool {
        if self.is_closed() {
            return false;
        }
        let ret = self.unrealized_return(exit_price);
        self.status = TradeStatus::from(reason);
        self.close_reason = Some(reason);
        self.close_time = Some(now);
        self.exit_price = Some(exit_price);
        self.realized_pnl = Some(ret * self.notional);
        true
    }

    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    pub fn is_closed(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_return_is_sign_adjusted() {
        let t = Trade::open("m".into(), "x".into(), TradeSide::Short, 0.50, 25.0, Utc::now());
        assert!((t.unrealized_return(0.45) - 0.10).abs() < 1e-9);
        assert!((t.unrealized_return(0.55) + 0.10).abs() < 1e-9);
    }

    #[test]
    fn test_close_is_terminal() {
        let now = Utc::now();
        let mut t = Trade::open("m".into(), "x".into(), TradeSide::Long, 1.0, 25.0, now);
        assert!((t.shares - 25.0).abs() < 1e-9);
        assert!(t.close(CloseReason::StopLoss, 0.9, now));
        assert!(!t.close(CloseReason::TakeProfit, 1.2, now));
        assert_eq!(t.status, TradeStatus::StopLoss);
        assert!((t.realized_pnl.unwrap() + 2.5).abs() < 1e-9);
    }
}
