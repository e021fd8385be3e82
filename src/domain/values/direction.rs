use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which way a signal pushes a market, as judged by the relevance assessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Evidence for the market's YES outcome.
    For,
    /// Evidence against the market's YES outcome.
    Against,
    Neutral,
}

impl Direction {
    /// Parse the loose spellings an assessor may return ("YES", "no", "for", null...).
    pub fn from_loose(s: &str) -> Option<Self> {
        match s.trim().trim_matches('"').to_lowercase().as_str() {
            "yes" | "for" | "up" | "bullish" => Some(Direction::For),
            "no" | "against" | "down" | "bearish" => Some(Direction::Against),
            "" | "null" | "none" | "neutral" | "n/a" => Some(Direction::Neutral),
            _ => None,
        }
    }

    pub fn is_actionable(&self) -> bool {
        !matches!(self, Direction::Neutral)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::For => write!(f, "for"),
            Direction::Against => write!(f, "against"),
            Direction::Neutral => write!(f, "neutral"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "for" => Ok(Direction::For),
            "against" => Ok(Direction::Against),
            "neutral" => Ok(Direction::Neutral),
            _ => Err(format!("Unknown direction: {s}")),
        }
    }
}
