use crate::domain::entities::trade::Trade;
use crate::domain::error::DomainError;
use crate::domain::ports::trade_repository::{TradeFilter, TradeRepository};
use crate::domain::values::trade_status::CloseReason;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TradeStats {
    pub total: usize,
    pub open: usize,
    pub closed: usize,
    pub wins: usize,
    pub losses: usize,
    pub flat: usize,
    /// Wins over closed trades, 0 when nothing has closed.
    pub win_rate: f64,
    /// Mean realized return per closed trade.
    pub avg_return: f64,
    pub total_realized_pnl: f64,
    pub exit_reasons: BTreeMap<CloseReason, usize>,
    pub avg_hold_minutes: f64,
}

impl TradeStats {
    pub fn from_trades(trades: &[Trade]) -> Self {
        let mut stats = TradeStats {
            total: trades.len(),
            ..TradeStats::default()
        };

        let mut return_sum = 0.0;
        let mut hold_minutes_sum = 0.0;

        for trade in trades {
            if trade.is_open() {
                stats.open += 1;
                continue;
            }
            stats.closed += 1;

            let pnl = trade.realized_pnl.unwrap_or_default();
            stats.total_realized_pnl += pnl;
            if pnl > 0.0 {
                stats.wins += 1;
            } else if pnl < 0.0 {
                stats.losses += 1;
            } else {
                stats.flat += 1;
            }

            if let Some(exit) = trade.exit_price {
                return_sum += trade.unrealized_return(exit);
            }
            if let Some(reason) = trade.close_reason {
                *stats.exit_reasons.entry(reason).or_insert(0) += 1;
            }
            if let Some(closed_at) = trade.close_time {
                hold_minutes_sum += (closed_at - trade.entry_time).num_seconds() as f64 / 60.0;
            }
        }

        if stats.closed > 0 {
            let n = stats.closed as f64;
            stats.win_rate = stats.wins as f64 / n;
            stats.avg_return = return_sum / n;
            stats.avg_hold_minutes = hold_minutes_sum / n;
        }
        stats
    }
}

pub struct TradeStatsUseCase {
    trades: Arc<dyn TradeRepository>,
}

impl TradeStatsUseCase {
    pub fn new(trades: Arc<dyn TradeRepository>) -> Self {
        Self { trades }
    }

    pub fn stats(&self) -> Result<TradeStats, DomainError> {
        let trades = self.trades.list_trades(&TradeFilter::default())?;
        Ok(TradeStats::from_trades(&trades))
    }
}
