//! Executable entry pricing against an order-book snapshot.
//!
//! A paper entry of a fixed notional is filled by walking the book from the
//! best level outward, consuming `price × size` dollars per level, until the
//! notional is filled or the next level sits outside the liquidity band
//! around the midpoint:
//!
//! - long entries walk asks upward, capped at `midpoint × (1 + band)`
//! - short entries walk bids downward, floored at `midpoint × (1 − band)`
//!
//! The fill price is the volume-weighted average of the consumed levels,
//! `total cost / total size`. If the band runs out before the notional is
//! filled the entry is [`Infeasible`] and no trade may be opened.

use crate::domain::entities::market::{OrderBook, PriceLevel};
use crate::domain::error::DomainError;
use crate::domain::values::trade_side::TradeSide;
use serde::Serialize;
use std::fmt;

/// Default liquidity band around the midpoint (5%).
pub const DEFAULT_LIQUIDITY_BAND: f64 = 0.05;

const EPSILON: f64 = 1e-9;

/// A feasible fill of the requested notional.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EntryFill {
    /// Volume-weighted average fill price.
    pub vwap: f64,
    /// Contracts acquired.
    pub shares: f64,
    /// Dollars spent. Equals the requested notional.
    pub cost: f64,
    /// Number of book levels touched, including a partially consumed one.
    pub levels_used: usize,
    /// Price of the last level touched.
    pub worst_price: f64,
}

/// Why an entry could not be priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Infeasible {
    /// The relevant side of the book has no usable levels.
    NoLiquidity,
    /// Depth inside the band is smaller than the notional.
    InsufficientDepth,
    /// Midpoint missing, zero or negative.
    InvalidMidpoint,
    InvalidNotional,
}

impl fmt::Display for Infeasible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Infeasible::NoLiquidity => write!(f, "no liquidity"),
            Infeasible::InsufficientDepth => write!(f, "insufficient depth within band"),
            Infeasible::InvalidMidpoint => write!(f, "invalid midpoint"),
            Infeasible::InvalidNotional => write!(f, "invalid notional"),
        }
    }
}

impl From<Infeasible> for DomainError {
    fn from(reason: Infeasible) -> Self {
        DomainError::LiquidityInfeasible(reason.to_string())
    }
}

/// Price a long entry: walk asks upward within `midpoint × (1 + band)`.
pub fn price_entry(
    book: &OrderBook,
    midpoint: f64,
    notional: f64,
    band: f64,
) -> Result<EntryFill, Infeasible> {
    price_entry_for_side(book, TradeSide::Long, midpoint, notional, band)
}

/// Price an entry on either side of the book.
pub fn price_entry_for_side(
    book: &OrderBook,
    side: TradeSide,
    midpoint: f64,
    notional: f64,
    band: f64,
) -> Result<EntryFill, Infeasible> {
    if !notional.is_finite() || notional <= 0.0 {
        return Err(Infeasible::InvalidNotional);
    }
    if !midpoint.is_finite() || midpoint <= 0.0 {
        return Err(Infeasible::InvalidMidpoint);
    }
    match side {
        TradeSide::Long => {
            let cap = midpoint * (1.0 + band);
            walk_levels(&book.sorted_asks(), notional, |p| p <= cap + EPSILON)
        }
        TradeSide::Short => {
            let floor = midpoint * (1.0 - band);
            walk_levels(&book.sorted_bids(), notional, |p| p >= floor - EPSILON)
        }
    }
}

fn walk_levels(
    levels: &[PriceLevel],
    notional: f64,
    within_band: impl Fn(f64) -> bool,
) -> Result<EntryFill, Infeasible> {
    if levels.is_empty() {
        return Err(Infeasible::NoLiquidity);
    }

    let mut remaining = notional;
    let mut cost = 0.0;
    let mut shares = 0.0;
    let mut levels_used = 0;
    let mut worst_price = 0.0;

    for level in levels {
        if remaining <= EPSILON || !within_band(level.price) {
            break;
        }
        levels_used += 1;
        worst_price = level.price;

        let level_cost = level.price * level.size;
        if level_cost <= remaining {
            cost += level_cost;
            shares += level.size;
            remaining -= level_cost;
        } else {
            cost += remaining;
            shares += remaining / level.price;
            remaining = 0.0;
        }
    }

    if shares <= 0.0 || remaining > EPSILON {
        return Err(Infeasible::InsufficientDepth);
    }

    Ok(EntryFill {
        vwap: cost / shares,
        shares,
        cost,
        levels_used,
        worst_price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(asks: &[(f64, f64)]) -> OrderBook {
        OrderBook::new(
            vec![],
            asks.iter().map(|(p, s)| PriceLevel::new(*p, *s)).collect(),
        )
    }

    #[test]
    fn test_single_level_fill_is_level_price() {
        let b = book(&[(0.40, 1000.0)]);
        let fill = price_entry(&b, 0.40, 25.0, DEFAULT_LIQUIDITY_BAND).unwrap();
        assert!((fill.vwap - 0.40).abs() < 1e-12);
        assert!((fill.shares - 62.5).abs() < 1e-9);
        assert_eq!(fill.levels_used, 1);
    }

    #[test]
    fn test_unsorted_levels_are_walked_best_first() {
        let b = book(&[(0.42, 100.0), (0.40, 10.0)]);
        let fill = price_entry(&b, 0.41, 25.0, DEFAULT_LIQUIDITY_BAND).unwrap();
        // 10 @ 0.40 = $4, then $21 @ 0.42
        let expected = 25.0 / (10.0 + 21.0 / 0.42);
        assert!((fill.vwap - expected).abs() < 1e-12);
        assert_eq!(fill.worst_price, 0.42);
    }

    #[test]
    fn test_level_outside_band_stops_walk() {
        let b = book(&[(0.50, 10.0), (0.60, 1000.0)]);
        assert_eq!(
            price_entry(&b, 0.50, 25.0, DEFAULT_LIQUIDITY_BAND),
            Err(Infeasible::InsufficientDepth)
        );
    }

    #[test]
    fn test_invalid_inputs() {
        let b = book(&[(0.50, 100.0)]);
        assert_eq!(price_entry(&b, 0.0, 25.0, 0.05), Err(Infeasible::InvalidMidpoint));
        assert_eq!(price_entry(&b, 0.5, 0.0, 0.05), Err(Infeasible::InvalidNotional));
        assert_eq!(
            price_entry(&OrderBook::default(), 0.5, 25.0, 0.05),
            Err(Infeasible::NoLiquidity)
        );
    }
}
