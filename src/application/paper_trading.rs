use crate::config::EngineConfig;
use crate::domain::entities::market::Market;
use crate::domain::entities::market_match::Match;
use crate::domain::entities::skipped_entry::{SkipReason, SkippedEntry};
use crate::domain::entities::trade::Trade;
use crate::domain::error::DomainError;
use crate::domain::ports::trade_repository::{TradeFilter, TradeRepository};
use crate::domain::values::entry_pricing::price_entry_for_side;
use crate::domain::values::exit_policy::ExitPolicy;
use crate::domain::values::trade_side::TradeSide;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub enum OpenOutcome {
    Opened(Trade),
    /// Entry could not be priced. Recorded, not an error.
    Skipped(SkippedEntry),
}

#[derive(Debug, Default, Serialize)]
pub struct EntryReport {
    pub considered: usize,
    pub opened: Vec<Trade>,
    pub skipped: Vec<SkippedEntry>,
    /// Matches refused because their market already has an open trade.
    pub duplicates: usize,
    /// Matches that already produced a trade in an earlier cycle.
    pub already_traded: usize,
    /// Matches whose market is absent from the current snapshot.
    pub missing_market: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct CheckReport {
    pub checked: usize,
    pub closed: Vec<Trade>,
    pub still_open: usize,
    /// Open trades with no usable price this cycle.
    pub missing_price: usize,
}

/// Paper trading state machine: opens trades from matches and closes them
/// on take-profit, stop-loss or time expiry.
pub struct PaperTradingEngine {
    trades: Arc<dyn TradeRepository>,
    notional: f64,
    band: f64,
    exit: ExitPolicy,
}

impl PaperTradingEngine {
    pub fn new(trades: Arc<dyn TradeRepository>, config: &EngineConfig) -> Self {
        Self {
            trades,
            notional: config.notional,
            band: config.liquidity_band,
            exit: config.exit.clone(),
        }
    }

    /// Open a trade for `m` at the VWAP the book supports.
    ///
    /// Fails with `DuplicateExposure` if the market already has an open trade.
    pub fn open_from_match(&self, m: &Match, market: &Market, now: DateTime<Utc>) -> Result<OpenOutcome, DomainError> {
        if market.id != m.market_id {
            return Err(DomainError::InvalidInput(format!(
                "match {} is for market {}, not {}",
                m.id, m.market_id, market.id
            )));
        }
        let side = TradeSide::from_direction(m.direction)
            .ok_or_else(|| DomainError::InvalidInput(format!("match {} has no direction", m.id)))?;

        if let Some(open) = self.trades.open_trade_for_market(&market.id)? {
            return Err(DomainError::DuplicateExposure(format!(
                "market {} already has open trade {}",
                market.id, open.id
            )));
        }

        let Some(book) = market.order_book.as_ref() else {
            return self.skip(m, SkipReason::NoOrderBook, now);
        };
        let Some(midpoint) = market.resolved_midpoint() else {
            return self.skip(m, SkipReason::NoMidpoint, now);
        };

        let fill = match price_entry_for_side(book, side, midpoint, self.notional, self.band) {
            Ok(fill) => fill,
            Err(reason) => {
                info!(
                    market = %market.id,
                    side = %side,
                    midpoint,
                    notional = self.notional,
                    reason = %reason,
                    "Entry infeasible"
                );
                return self.skip(m, SkipReason::InsufficientLiquidity, now);
            }
        };

        let trade = Trade::open(market.id.clone(), m.id.clone(), side, fill.vwap, self.notional, now);
        self.trades.add_trade(&trade)?;

        info!(
            trade = %trade.id,
            market = %trade.market_id,
            side = %side,
            entry_price = trade.entry_price,
            levels = fill.levels_used,
            "Opened paper trade"
        );
        Ok(OpenOutcome::Opened(trade))
    }

    /// Try to open a trade for every match without one, oldest match first.
    pub fn open_from_matches(
        &self,
        matches: &[Match],
        markets: &[Market],
        now: DateTime<Utc>,
    ) -> Result<EntryReport, DomainError> {
        let by_id: HashMap<&str, &Market> = markets.iter().map(|m| (m.id.as_str(), m)).collect();
        let mut ordered: Vec<&Match> = matches.iter().collect();
        ordered.sort_by(|a, b| a.matched_at.cmp(&b.matched_at).then_with(|| a.id.cmp(&b.id)));

        let mut report = EntryReport {
            considered: ordered.len(),
            ..EntryReport::default()
        };

        for m in ordered {
            if self.trades.has_trade_for_match(&m.id)? {
                report.already_traded += 1;
                continue;
            }
            let Some(market) = by_id.get(m.market_id.as_str()) else {
                debug!(market = %m.market_id, "Matched market not in snapshot");
                report.missing_market += 1;
                continue;
            };

            match self.open_from_match(m, market, now) {
                Ok(OpenOutcome::Opened(trade)) => report.opened.push(trade),
                Ok(OpenOutcome::Skipped(skip)) => report.skipped.push(skip),
                Err(DomainError::DuplicateExposure(msg)) => {
                    info!(matched = %m.id, reason = %msg, "Duplicate exposure, not opening");
                    report.duplicates += 1;
                }
                Err(e) if e.is_cycle_fatal() => return Err(e),
                Err(e) => {
                    warn!(matched = %m.id, error = %e, "Could not open trade");
                    report.errors.push(format!("{}: {e}", m.id));
                }
            }
        }

        Ok(report)
    }

    /// Apply the exit rules to every open trade at the given prices.
    pub fn check_open_trades(
        &self,
        prices: &HashMap<String, f64>,
        now: DateTime<Utc>,
    ) -> Result<CheckReport, DomainError> {
        let open = self.trades.list_trades(&TradeFilter::open())?;
        let mut report = CheckReport {
            checked: open.len(),
            ..CheckReport::default()
        };

        for mut trade in open {
            let price = match prices.get(&trade.market_id) {
                Some(p) if p.is_finite() && *p > 0.0 => *p,
                _ => {
                    warn!(trade = %trade.id, market = %trade.market_id, "No usable price, leaving trade open");
                    report.missing_price += 1;
                    continue;
                }
            };

            let Some(reason) = self.exit.evaluate(&trade, price, now) else {
                report.still_open += 1;
                continue;
            };

            if !trade.close(reason, price, now) {
                continue;
            }
            if self.trades.close_trade(&trade)? {
                info!(
                    trade = %trade.id,
                    market = %trade.market_id,
                    reason = %reason,
                    exit_price = price,
                    pnl = trade.realized_pnl.unwrap_or_default(),
                    "Closed paper trade"
                );
                report.closed.push(trade);
            } else {
                debug!(trade = %trade.id, "Trade already closed in store");
            }
        }

        Ok(report)
    }

    fn skip(&self, m: &Match, reason: SkipReason, now: DateTime<Utc>) -> Result<OpenOutcome, DomainError> {
        let skip = SkippedEntry {
            match_id: m.id.clone(),
            market_id: m.market_id.clone(),
            reason,
            skipped_at: now,
        };
        if !self.trades.record_skip(&skip)? {
            debug!(matched = %skip.match_id, reason = %skip.reason, "Skip unchanged since last attempt");
        }
        Ok(OpenOutcome::Skipped(skip))
    }
}
