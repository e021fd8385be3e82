use crate::domain::values::confidence::Confidence;
use crate::domain::values::direction::Direction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A signal/market pair that passed both the similarity and the relevance gates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub signal_id: String,
    pub market_id: String,
    pub similarity: f64,
    pub relevant: bool,
    pub direction: Direction,
    pub confidence: Confidence,
    pub reasoning: Option<String>,
    pub headline: String,
    pub market_question: String,
    pub matched_at: DateTime<Utc>,
}

/// Outcome of evaluating one signal/market pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationOutcome {
    Matched,
    Rejected,
}

impl std::fmt::Display for EvaluationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationOutcome::Matched => write!(f, "matched"),
            EvaluationOutcome::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for EvaluationOutcome {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "matched" => Ok(EvaluationOutcome::Matched),
            "rejected" => Ok(EvaluationOutcome::Rejected),
            _ => Err(format!("Unknown evaluation outcome: {s}")),
        }
    }
}

/// Audit row for the evaluated-pairs set. Rejected pairs never reach the trading engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub signal_id: String,
    pub market_id: String,
    pub outcome: EvaluationOutcome,
    pub reason: Option<String>,
    pub similarity: f64,
    pub evaluated_at: DateTime<Utc>,
    /// Present exactly when `outcome` is `Matched`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<Match>,
}

impl Evaluation {
    pub fn matched(m: Match) -> Self {
        Self {
            signal_id: m.signal_id.clone(),
            market_id: m.market_id.clone(),
            outcome: EvaluationOutcome::Matched,
            reason: None,
            similarity: m.similarity,
            evaluated_at: m.matched_at,
            matched: Some(m),
        }
    }

    pub fn rejected(signal_id: &str, market_id: &str, similarity: f64, reason: impl Into<String>) -> Self {
        Self {
            signal_id: signal_id.to_string(),
            market_id: market_id.to_string(),
            outcome: EvaluationOutcome::Rejected,
            reason: Some(reason.into()),
            similarity,
            evaluated_at: Utc::now(),
            matched: None,
        }
    }
}
