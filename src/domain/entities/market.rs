use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One price level of an order book. `size` is a contract quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
    pub size: f64,
}

impl PriceLevel {
    pub fn new(price: f64, size: f64) -> Self {
        Self { price, size }
    }

    pub fn is_usable(&self) -> bool {
        self.price > 0.0 && self.size > 0.0 && self.price.is_finite() && self.size.is_finite()
    }
}

/// Order-book snapshot. Levels may arrive unsorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    #[serde(default)]
    pub bids: Vec<PriceLevel>,
    #[serde(default)]
    pub asks: Vec<PriceLevel>,
}

impl OrderBook {
    pub fn new(bids: Vec<PriceLevel>, asks: Vec<PriceLevel>) -> Self {
        Self { bids, asks }
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks
            .iter()
            .filter(|l| l.is_usable())
            .map(|l| l.price)
            .min_by(|a, b| a.total_cmp(b))
    }

    pub fn best_bid(&self) -> Option<f64> {
        self.bids
            .iter()
            .filter(|l| l.is_usable())
            .map(|l| l.price)
            .max_by(|a, b| a.total_cmp(b))
    }

    /// Asks sorted best (lowest) first, unusable levels dropped.
    pub fn sorted_asks(&self) -> Vec<PriceLevel> {
        let mut asks: Vec<PriceLevel> = self.asks.iter().copied().filter(|l| l.is_usable()).collect();
        asks.sort_by(|a, b| a.price.total_cmp(&b.price));
        asks
    }

    /// Bids sorted best (highest) first, unusable levels dropped.
    pub fn sorted_bids(&self) -> Vec<PriceLevel> {
        let mut bids: Vec<PriceLevel> = self.bids.iter().copied().filter(|l| l.is_usable()).collect();
        bids.sort_by(|a, b| b.price.total_cmp(&a.price));
        bids
    }
}

/// A prediction-market contract as polled from the market feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub outcomes: Vec<String>,
    #[serde(default)]
    pub outcome_prices: Vec<f64>,
    #[serde(default)]
    pub midpoint: Option<f64>,
    #[serde(default)]
    pub order_book: Option<OrderBook>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub volume: f64,
}

impl Market {
    pub fn new(id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            description: String::new(),
            outcomes: vec!["Yes".into(), "No".into()],
            outcome_prices: Vec::new(),
            midpoint: None,
            order_book: None,
            end_date: None,
            volume: 0.0,
        }
    }

    /// Text fed to the embedding provider.
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.question, self.description).trim().to_string()
    }

    pub fn outcome_price(&self, outcome: &str) -> Option<f64> {
        self.outcomes
            .iter()
            .zip(self.outcome_prices.iter())
            .find(|(o, _)| o.eq_ignore_ascii_case(outcome))
            .map(|(_, p)| *p)
    }

    /// Reference price: explicit midpoint, then book mid, then best ask, then the YES price.
    pub fn resolved_midpoint(&self) -> Option<f64> {
        if let Some(mid) = self.midpoint.filter(|m| *m > 0.0) {
            return Some(mid);
        }
        if let Some(book) = &self.order_book {
            match (book.best_bid(), book.best_ask()) {
                (Some(bid), Some(ask)) => return Some((bid + ask) / 2.0),
                (None, Some(ask)) => return Some(ask),
                _ => {}
            }
        }
        self.outcome_price("yes").filter(|p| *p > 0.0)
    }
}
