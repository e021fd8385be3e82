use crate::domain::values::direction::Direction;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Long,
    Short,
}

impl TradeSide {
    /// Neutral verdicts never produce a side.
    pub fn from_direction(direction: Direction) -> Option<Self> {
        match direction {
            Direction::For => Some(TradeSide::Long),
            Direction::Against => Some(TradeSide::Short),
            Direction::Neutral => None,
        }
    }

    /// +1 for long, -1 for short.
    pub fn sign(&self) -> f64 {
        match self {
            TradeSide::Long => 1.0,
            TradeSide::Short => -1.0,
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Long => write!(f, "long"),
            TradeSide::Short => write!(f, "short"),
        }
    }
}

impl FromStr for TradeSide {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "long" => Ok(TradeSide::Long),
            "short" => Ok(TradeSide::Short),
            _ => Err(format!("Unknown trade side: {s}")),
        }
    }
}
