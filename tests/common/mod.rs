//! Shared test helpers: scripted providers, builders and engine setup.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use newsedge::config::{EngineConfig, RetryPolicy};
use newsedge::domain::entities::market::{Market, OrderBook, PriceLevel};
use newsedge::domain::entities::market_match::Match;
use newsedge::domain::entities::signal::Signal;
use newsedge::domain::error::DomainError;
use newsedge::domain::ports::embedding_port::{EmbeddingProvider, InputType};
use newsedge::domain::ports::relevance_service::RelevanceService;
use newsedge::domain::values::confidence::Confidence;
use newsedge::domain::values::direction::Direction;
use newsedge::NewsEdge;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Embeds known texts to fixed vectors; unknown texts get an orthogonal fallback.
pub struct MockEmbedder {
    vectors: Mutex<HashMap<String, Vec<f32>>>,
    failing: Mutex<HashSet<String>>,
    calls: AtomicUsize,
    texts_embedded: AtomicUsize,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            vectors: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            calls: AtomicUsize::new(0),
            texts_embedded: AtomicUsize::new(0),
        }
    }

    pub fn with(self, text: &str, vector: [f32; 3]) -> Self {
        self.set(text, vector);
        self
    }

    pub fn set(&self, text: &str, vector: [f32; 3]) {
        self.vectors.lock().unwrap().insert(text.to_string(), vector.to_vec());
    }

    /// Batches containing `text` fail with a transient error until cleared.
    pub fn fail_on(&self, text: &str) {
        self.failing.lock().unwrap().insert(text.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Texts successfully embedded, across all calls.
    pub fn texts_embedded(&self) -> usize {
        self.texts_embedded.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, texts: &[String], _input_type: InputType) -> Result<Vec<Vec<f32>>, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        {
            let failing = self.failing.lock().unwrap();
            if texts.iter().any(|t| failing.contains(t)) {
                return Err(DomainError::TransientFetch("mock embedder unavailable".into()));
            }
        }
        let vectors = self.vectors.lock().unwrap();
        self.texts_embedded.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| vectors.get(t).cloned().unwrap_or_else(|| vec![0.0, 0.0, 1.0]))
            .collect())
    }

    fn dimension(&self) -> usize {
        3
    }
}

#[derive(Clone)]
pub enum Reply {
    Text(String),
    Transient,
}

/// Relevance service answering from a per-pair script.
pub struct ScriptedRelevance {
    script: Mutex<HashMap<(String, String), Reply>>,
    default: Reply,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, String)>>,
}

impl ScriptedRelevance {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(HashMap::new()),
            default: Reply::Text(verdict_json(false, "null", 0.0)),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with(self, signal_id: &str, market_id: &str, reply: Reply) -> Self {
        self.set(signal_id, market_id, reply);
        self
    }

    pub fn set(&self, signal_id: &str, market_id: &str, reply: Reply) {
        self.script
            .lock()
            .unwrap()
            .insert((signal_id.to_string(), market_id.to_string()), reply);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<(String, String)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelevanceService for ScriptedRelevance {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn assess(&self, signal: &Signal, market: &Market) -> Result<String, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = (signal.id.clone(), market.id.clone());
        self.seen.lock().unwrap().push(key.clone());
        let reply = self
            .script
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| self.default.clone());
        match reply {
            Reply::Text(t) => Ok(t),
            Reply::Transient => Err(DomainError::TransientFetch("mock relevance timeout".into())),
        }
    }
}

pub fn verdict_json(relevant: bool, direction: &str, confidence: f64) -> String {
    let direction = if direction == "null" {
        "null".to_string()
    } else {
        format!("\"{direction}\"")
    };
    format!(
        r#"{{"relevant": {relevant}, "direction": {direction}, "confidence": {confidence}, "reasoning": "scripted"}}"#
    )
}

pub fn yes(confidence: f64) -> Reply {
    Reply::Text(verdict_json(true, "YES", confidence))
}

pub fn no(confidence: f64) -> Reply {
    Reply::Text(verdict_json(true, "NO", confidence))
}

/// Defaults with retries that do not sleep.
pub fn fast_config() -> EngineConfig {
    EngineConfig {
        retry: RetryPolicy {
            max_retries: 1,
            base_backoff_ms: 0,
            timeout_secs: 5,
        },
        ..EngineConfig::default()
    }
}

pub fn setup(embedder: Arc<MockEmbedder>, relevance: Arc<ScriptedRelevance>) -> NewsEdge {
    NewsEdge::with_providers(":memory:", fast_config(), embedder, relevance).unwrap()
}

pub fn signal(id: &str, headline: &str) -> Signal {
    Signal::new(id, headline, "wire")
}

pub fn market(id: &str, question: &str) -> Market {
    Market::new(id, question)
}

/// Market with a deep single-level book at `price` on both sides.
pub fn liquid_market(id: &str, question: &str, price: f64) -> Market {
    let mut m = Market::new(id, question);
    m.midpoint = Some(price);
    m.order_book = Some(OrderBook::new(
        vec![PriceLevel::new(price, 10_000.0)],
        vec![PriceLevel::new(price, 10_000.0)],
    ));
    m
}

pub fn book(bids: &[(f64, f64)], asks: &[(f64, f64)]) -> OrderBook {
    OrderBook::new(
        bids.iter().map(|(p, s)| PriceLevel::new(*p, *s)).collect(),
        asks.iter().map(|(p, s)| PriceLevel::new(*p, *s)).collect(),
    )
}

pub fn make_match(id: &str, market_id: &str, direction: Direction, matched_at: DateTime<Utc>) -> Match {
    Match {
        id: id.to_string(),
        signal_id: format!("sig-{id}"),
        market_id: market_id.to_string(),
        similarity: 0.9,
        relevant: true,
        direction,
        confidence: Confidence::clamped(0.8),
        reasoning: None,
        headline: "headline".into(),
        market_question: "question".into(),
        matched_at,
    }
}

pub fn prices(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
    pairs.iter().map(|(id, p)| (id.to_string(), *p)).collect()
}
