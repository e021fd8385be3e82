use crate::application::retry::with_retry;
use crate::config::RetryPolicy;
use crate::domain::entities::market::Market;
use crate::domain::error::DomainError;
use crate::domain::ports::embedding_port::{EmbeddingProvider, InputType};
use crate::domain::ports::vector_store::VectorStore;
use crate::domain::values::similarity::cosine_similarity;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Outcome of bringing the index up to date with a market universe.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexSyncReport {
    /// Markets already indexed, not re-encoded.
    pub cached: usize,
    pub embedded: usize,
    /// Markets whose embedding failed this cycle. Retried next cycle.
    pub failed: Vec<String>,
}

/// Market embeddings, cached in memory and written through to the vector store.
pub struct VectorIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    cache: RwLock<HashMap<String, Vec<f32>>>,
    batch_size: usize,
    retry: RetryPolicy,
}

impl VectorIndex {
    /// Build the index from whatever the store already holds.
    pub fn load(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        batch_size: usize,
        retry: RetryPolicy,
    ) -> Result<Self, DomainError> {
        let provider_dim = embedder.dimension();
        if provider_dim > 0 {
            if let Some(stored_dim) = store.get_stored_dimension()? {
                if stored_dim != provider_dim {
                    warn!(
                        stored_dim,
                        provider_dim,
                        "Cached market vectors do not match the embedding provider; similarities against them will be 0"
                    );
                }
            }
        }

        let cache: HashMap<String, Vec<f32>> = store.load_all()?.into_iter().collect();
        info!(cached = cache.len(), "Loaded market embedding cache");

        Ok(Self {
            embedder,
            store,
            cache: RwLock::new(cache),
            batch_size: batch_size.max(1),
            retry,
        })
    }

    pub fn len(&self) -> usize {
        self.read_cache().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, market_id: &str) -> bool {
        self.read_cache().contains_key(market_id)
    }

    /// Embedding for one market, computed only if not already indexed.
    pub async fn upsert(&self, market_id: &str, text: &str) -> Result<Vec<f32>, DomainError> {
        if let Some(existing) = self.read_cache().get(market_id) {
            return Ok(existing.clone());
        }

        let texts = vec![text.to_string()];
        let vectors = with_retry(&self.retry, "embed_market", || {
            self.embedder.embed(&texts, InputType::Document)
        })
        .await?;
        let vector = vectors
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| DomainError::Embedding(format!("no embedding returned for market {market_id}")))?;

        self.insert(market_id, vector.clone())?;
        Ok(vector)
    }

    /// Embed every market in `markets` that is not yet indexed, in batches.
    ///
    /// Only store failures are returned as errors; embedding failures are
    /// reported per market and leave those markets out until the next sync.
    pub async fn sync(&self, markets: &[Market]) -> Result<IndexSyncReport, DomainError> {
        let mut report = IndexSyncReport::default();
        let mut seen = HashSet::new();
        let mut missing: Vec<&Market> = Vec::new();

        for market in markets {
            if !seen.insert(market.id.as_str()) {
                continue;
            }
            if self.contains(&market.id) {
                report.cached += 1;
            } else {
                missing.push(market);
            }
        }

        if missing.is_empty() {
            debug!(cached = report.cached, "Market index up to date");
            return Ok(report);
        }

        info!(new = missing.len(), cached = report.cached, "Embedding new markets");

        for chunk in missing.chunks(self.batch_size) {
            let texts: Vec<String> = chunk.iter().map(|m| m.embedding_text()).collect();
            let result = with_retry(&self.retry, "embed_markets", || {
                self.embedder.embed(&texts, InputType::Document)
            })
            .await;

            match result {
                Ok(vectors) if vectors.len() == chunk.len() => {
                    for (market, vector) in chunk.iter().zip(vectors) {
                        if vector.is_empty() {
                            report.failed.push(market.id.clone());
                            continue;
                        }
                        self.insert(&market.id, vector)?;
                        report.embedded += 1;
                    }
                }
                Ok(vectors) => {
                    warn!(
                        expected = chunk.len(),
                        got = vectors.len(),
                        "Embedding batch size mismatch, skipping batch"
                    );
                    report.failed.extend(chunk.iter().map(|m| m.id.clone()));
                }
                Err(e) => {
                    warn!(error = %e, markets = chunk.len(), "Embedding batch failed, will retry next cycle");
                    report.failed.extend(chunk.iter().map(|m| m.id.clone()));
                }
            }
        }

        if !report.failed.is_empty() {
            warn!(failed = report.failed.len(), "Some markets are not indexed this cycle");
        }
        Ok(report)
    }

    /// Embed a signal headline for querying.
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let texts = vec![text.to_string()];
        let vectors = with_retry(&self.retry, "embed_signal", || {
            self.embedder.embed(&texts, InputType::Query)
        })
        .await?;
        vectors
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| DomainError::Embedding("no embedding returned for signal".into()))
    }

    /// Top `k` markets by cosine similarity, descending, ties by market id.
    /// With `universe`, only those market ids are considered.
    pub fn query(&self, embedding: &[f32], k: usize, universe: Option<&HashSet<String>>) -> Vec<(String, f64)> {
        let cache = self.read_cache();
        let mut scored: Vec<(String, f64)> = cache
            .iter()
            .filter(|(id, _)| universe.map_or(true, |u| u.contains(id.as_str())))
            .map(|(id, vector)| (id.clone(), cosine_similarity(embedding, vector)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(k);
        scored
    }

    fn insert(&self, market_id: &str, vector: Vec<f32>) -> Result<(), DomainError> {
        self.store.store(market_id, &vector)?;
        self.cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(market_id.to_string(), vector);
        Ok(())
    }

    fn read_cache(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Vec<f32>>> {
        self.cache.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
