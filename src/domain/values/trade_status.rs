use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Why an open trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    TakeProfit,
    StopLoss,
    TimeExpired,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::TakeProfit => write!(f, "take_profit"),
            CloseReason::StopLoss => write!(f, "stop_loss"),
            CloseReason::TimeExpired => write!(f, "time_expired"),
        }
    }
}

impl FromStr for CloseReason {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "take_profit" => Ok(CloseReason::TakeProfit),
            "stop_loss" => Ok(CloseReason::StopLoss),
            "time_expired" => Ok(CloseReason::TimeExpired),
            _ => Err(format!("Unknown close reason: {s}")),
        }
    }
}

/// Trade lifecycle. `Open` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    Open,
    TakeProfit,
    StopLoss,
    TimeExpired,
}

impl TradeStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TradeStatus::Open)
    }
}

impl From<CloseReason> for TradeStatus {
    fn from(reason: CloseReason) -> Self {
        match reason {
            CloseReason::TakeProfit => TradeStatus::TakeProfit,
            CloseReason::StopLoss => TradeStatus::StopLoss,
            CloseReason::TimeExpired => TradeStatus::TimeExpired,
        }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeStatus::Open => write!(f, "open"),
            TradeStatus::TakeProfit => write!(f, "take_profit"),
            TradeStatus::StopLoss => write!(f, "stop_loss"),
            TradeStatus::TimeExpired => write!(f, "time_expired"),
        }
    }
}

impl FromStr for TradeStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(TradeStatus::Open),
            other => other
                .parse::<CloseReason>()
                .map(TradeStatus::from)
                .map_err(|_| format!("Unknown trade status: {s}")),
        }
    }
}
