use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A news item considered as potential trading evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    pub headline: String,
    #[serde(default)]
    pub source: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Signal {
    pub fn new(id: impl Into<String>, headline: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            headline: headline.into(),
            source: source.into(),
            published_at: Utc::now(),
            url: None,
        }
    }
}
