use serde::{Deserialize, Serialize};
use std::fmt;

/// Assessor confidence, always within [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Confidence(f64);

impl Confidence {
    pub fn new(value: f64) -> Result<Self, String> {
        if !(0.0..=1.0).contains(&value) {
            return Err(format!(
                "Confidence must be between 0.0 and 1.0, got {value}"
            ));
        }
        Ok(Confidence(value))
    }

    /// Clamp an arbitrary assessor number into range. NaN becomes 0.
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            return Confidence(0.0);
        }
        Confidence(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn meets(&self, threshold: f64) -> bool {
        self.0 >= threshold
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Confidence(0.0)
    }
}
