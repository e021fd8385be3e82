//! Strict verdict type and the single parsing boundary for relevance-service output.
//!
//! The relevance service answers in free text that is supposed to be raw JSON
//! but regularly arrives wrapped in markdown fences, prefixed with prose or
//! truncated. Parsing runs in stages:
//!
//! 1. strip wrapping (code fences, language tags, stray backticks, text around
//!    the outermost `{...}`)
//! 2. structured JSON parse with lenient field types
//! 3. regex extraction of `relevant`, `direction`, `confidence`, `reasoning`
//!
//! Only when `relevant` cannot be recovered does parsing fail with
//! [`DomainError::AssessmentParse`].

use crate::domain::error::DomainError;
use crate::domain::values::confidence::Confidence;
use crate::domain::values::direction::Direction;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub relevant: bool,
    pub direction: Direction,
    pub confidence: Confidence,
    pub reasoning: Option<String>,
}

impl Verdict {
    pub fn parse(raw: &str) -> Result<Verdict, DomainError> {
        let cleaned = strip_wrapping(raw);

        if let Some(verdict) = parse_structured(&cleaned) {
            return Ok(verdict);
        }
        if let Some(verdict) = extract_patterns(&cleaned) {
            return Ok(verdict);
        }

        let preview: String = raw.chars().take(120).collect();
        Err(DomainError::AssessmentParse(format!(
            "no verdict recoverable from response: {preview:?}"
        )))
    }

    /// Passes the relevance gate: relevant, directional and confident enough.
    pub fn qualifies(&self, confidence_threshold: f64) -> bool {
        self.relevant && self.direction.is_actionable() && self.confidence.meets(confidence_threshold)
    }
}

fn field_re(key: &str, value: &str) -> Option<Regex> {
    Regex::new(&format!(r#"(?i)(?:^|[^A-Za-z_])["']?{key}["']?\s*[:=]\s*{value}"#)).ok()
}

fn strip_wrapping(raw: &str) -> String {
    let unfenced = match Regex::new(r"```[A-Za-z]*") {
        Ok(re) => re.replace_all(raw, "").into_owned(),
        Err(_) => raw.to_string(),
    };
    let trimmed = unfenced.trim().trim_matches('`').trim();
    let trimmed = trimmed
        .strip_prefix("json")
        .or_else(|| trimmed.strip_prefix("JSON"))
        .unwrap_or(trimmed)
        .trim();

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => trimmed[start..=end].to_string(),
        _ => trimmed.to_string(),
    }
}

fn parse_structured(s: &str) -> Option<Verdict> {
    let value: Value = serde_json::from_str(s).ok()?;
    let obj = value.as_object()?;

    let relevant = obj.get("relevant").and_then(loose_bool)?;
    let direction = match obj.get("direction") {
        None | Some(Value::Null) => Direction::Neutral,
        Some(Value::String(d)) => Direction::from_loose(d).unwrap_or(Direction::Neutral),
        Some(_) => Direction::Neutral,
    };
    let confidence = obj.get("confidence").and_then(loose_f64).unwrap_or(0.0);
    let reasoning = obj
        .get("reasoning")
        .and_then(|v| v.as_str())
        .map(String::from);

    Some(Verdict {
        relevant,
        direction,
        confidence: Confidence::clamped(confidence),
        reasoning,
    })
}

fn extract_patterns(s: &str) -> Option<Verdict> {
    let relevant = field_re("relevant", r#"["']?(true|false|yes|no)\b"#)?
        .captures(s)
        .and_then(|c| c.get(1))
        .and_then(|m| parse_bool_word(m.as_str()))?;
    let direction = field_re("direction", r#"["']?([A-Za-z/]+)"#)
        .and_then(|re| re.captures(s))
        .and_then(|c| c.get(1))
        .and_then(|m| Direction::from_loose(m.as_str()))
        .unwrap_or(Direction::Neutral);
    let confidence = field_re("confidence", r#"["']?(-?\d+(?:\.\d+)?\s*%?)"#)
        .and_then(|re| re.captures(s))
        .and_then(|c| c.get(1))
        .and_then(|m| parse_confidence(m.as_str()))
        .unwrap_or(0.0);
    let reasoning = field_re("reasoning", r#""([^"]*)""#)
        .and_then(|re| re.captures(s))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    Some(Verdict {
        relevant,
        direction,
        confidence: Confidence::clamped(confidence),
        reasoning,
    })
}

fn loose_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::String(s) => parse_bool_word(s),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        _ => None,
    }
}

fn loose_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_confidence(s),
        _ => None,
    }
}

/// `"0.45"`, `"45%"` and `"45 %"` all read as 0.45.
fn parse_confidence(s: &str) -> Option<f64> {
    let s = s.trim();
    match s.strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f64>().ok().map(|v| v / 100.0),
        None => s.parse::<f64>().ok(),
    }
}

fn parse_bool_word(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}
