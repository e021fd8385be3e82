pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

use crate::application::match_engine::{MatchEngine, MatchReport};
use crate::application::paper_trading::{CheckReport, EntryReport, PaperTradingEngine};
use crate::application::relevance::RelevanceAssessor;
use crate::application::stats::{TradeStats, TradeStatsUseCase};
use crate::application::vector_index::VectorIndex;
use crate::config::EngineConfig;
use crate::domain::entities::market::Market;
use crate::domain::entities::market_match::{Evaluation, Match};
use crate::domain::entities::signal::Signal;
use crate::domain::entities::skipped_entry::SkippedEntry;
use crate::domain::entities::trade::Trade;
use crate::domain::error::DomainError;
use crate::domain::ports::embedding_port::EmbeddingProvider;
use crate::domain::ports::match_repository::MatchRepository;
use crate::domain::ports::relevance_service::RelevanceService;
use crate::domain::ports::trade_repository::{TradeFilter, TradeRepository};
use crate::domain::ports::vector_store::VectorStore;
use crate::domain::values::evaluated_pairs::EvaluatedPairs;
use crate::infrastructure::embeddings::noop::NoopProvider;
use crate::infrastructure::embeddings::openai::OpenAiProvider;
use crate::infrastructure::embeddings::voyage::VoyageProvider;
use crate::infrastructure::relevance::anthropic::AnthropicRelevance;
use crate::infrastructure::relevance::disabled::DisabledRelevance;
use crate::infrastructure::sqlite::match_repo::SqliteMatchRepo;
use crate::infrastructure::sqlite::migrations::run_migrations;
use crate::infrastructure::sqlite::trade_repo::SqliteTradeRepo;
use crate::infrastructure::sqlite::vector_store::SqliteVectorStore;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct PipelineReport {
    pub matching: MatchReport,
    pub entries: EntryReport,
}

pub struct NewsEdge {
    config: EngineConfig,
    match_engine: MatchEngine,
    trading: PaperTradingEngine,
    stats_uc: TradeStatsUseCase,
    match_repo: Arc<dyn MatchRepository>,
    trade_repo: Arc<dyn TradeRepository>,
    /// Guards every mutating entry point; one cycle runs at a time.
    evaluated: Mutex<EvaluatedPairs>,
}

impl NewsEdge {
    /// Open with configuration and providers taken from the environment.
    pub fn new(db_path: &str) -> Result<Self, DomainError> {
        let config = EngineConfig::from_env()?;

        let provider = std::env::var("NEWSEDGE_EMBEDDING_PROVIDER").unwrap_or_else(|_| "noop".into());
        let api_key = std::env::var("NEWSEDGE_EMBEDDING_API_KEY").unwrap_or_default();
        let model = std::env::var("NEWSEDGE_EMBEDDING_MODEL").ok();

        let embedder: Arc<dyn EmbeddingProvider> = match provider.as_str() {
            "voyage" => Arc::new(VoyageProvider::new(api_key, model, None)),
            "openai" => Arc::new(OpenAiProvider::new(api_key, model)),
            _ => Arc::new(NoopProvider),
        };

        let relevance: Arc<dyn RelevanceService> = match std::env::var("ANTHROPIC_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Arc::new(AnthropicRelevance::new(
                key,
                std::env::var("NEWSEDGE_RELEVANCE_MODEL").ok(),
                None,
            )),
            _ => Arc::new(DisabledRelevance),
        };

        Self::with_providers(db_path, config, embedder, relevance)
    }

    pub fn with_providers(
        db_path: &str,
        config: EngineConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        relevance: Arc<dyn RelevanceService>,
    ) -> Result<Self, DomainError> {
        config.validate()?;

        // Each repository owns a connection; an in-memory database must be
        // shared between them or every repository would see its own copy.
        let path = if db_path == ":memory:" {
            format!("file:newsedge-{}?mode=memory&cache=shared", uuid::Uuid::new_v4())
        } else {
            db_path.to_string()
        };

        let conn1 = open_connection(&path)?;
        run_migrations(&conn1)?;
        let conn2 = open_connection(&path)?;
        let conn3 = open_connection(&path)?;

        let match_repo: Arc<dyn MatchRepository> = Arc::new(SqliteMatchRepo::new(conn1));
        let trade_repo: Arc<dyn TradeRepository> = Arc::new(SqliteTradeRepo::new(conn2));
        let vector_store: Arc<dyn VectorStore> = Arc::new(SqliteVectorStore::new(conn3));

        let evaluated: EvaluatedPairs = match_repo.evaluated_pairs()?.into_iter().collect();
        let open_trades = trade_repo.list_trades(&TradeFilter::open())?.len();

        let index = Arc::new(VectorIndex::load(
            embedder,
            vector_store,
            config.embed_batch_size,
            config.retry.clone(),
        )?);
        let assessor = Arc::new(RelevanceAssessor::new(relevance, config.retry.clone()));

        info!(
            db = db_path,
            evaluated_pairs = evaluated.len(),
            indexed_markets = index.len(),
            open_trades,
            relevance = assessor.service_name(),
            "Engine state loaded"
        );

        Ok(Self {
            match_engine: MatchEngine::new(index, assessor, match_repo.clone(), &config),
            trading: PaperTradingEngine::new(trade_repo.clone(), &config),
            stats_uc: TradeStatsUseCase::new(trade_repo.clone()),
            match_repo,
            trade_repo,
            evaluated: Mutex::new(evaluated),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// One matching pass. Returns the report including the new matches.
    pub async fn run_matching(&self, signals: &[Signal], markets: &[Market]) -> Result<MatchReport, DomainError> {
        let mut evaluated = self.evaluated.lock().await;
        self.match_engine.run(signals, markets, &mut evaluated).await
    }

    /// Open trades for matches inside the entry window that have none yet.
    pub async fn open_pending(&self, markets: &[Market], now: DateTime<Utc>) -> Result<EntryReport, DomainError> {
        let _guard = self.evaluated.lock().await;
        self.open_pending_locked(markets, now)
    }

    /// Matching followed by entries, under one lock.
    pub async fn run_pipeline(&self, signals: &[Signal], markets: &[Market]) -> Result<PipelineReport, DomainError> {
        let mut evaluated = self.evaluated.lock().await;
        let matching = self.match_engine.run(signals, markets, &mut evaluated).await?;
        let entries = self.open_pending_locked(markets, Utc::now())?;
        info!(
            matched = matching.matches.len(),
            opened = entries.opened.len(),
            skipped = entries.skipped.len(),
            "Pipeline cycle complete"
        );
        Ok(PipelineReport { matching, entries })
    }

    /// Apply exit rules to every open trade. `prices` is keyed by market id.
    pub async fn run_trade_checks(
        &self,
        prices: &HashMap<String, f64>,
        now: DateTime<Utc>,
    ) -> Result<CheckReport, DomainError> {
        let _guard = self.evaluated.lock().await;
        let report = self.trading.check_open_trades(prices, now)?;
        info!(
            checked = report.checked,
            closed = report.closed.len(),
            missing_price = report.missing_price,
            "Trade check complete"
        );
        Ok(report)
    }

    pub async fn evaluated_pair_count(&self) -> usize {
        self.evaluated.lock().await.len()
    }

    pub fn list_matches(&self, since: Option<DateTime<Utc>>, limit: Option<usize>) -> Result<Vec<Match>, DomainError> {
        self.match_repo.list_matches(since, limit)
    }

    pub fn get_match(&self, id: &str) -> Result<Option<Match>, DomainError> {
        self.match_repo.get_match(id)
    }

    pub fn list_evaluations(&self, limit: Option<usize>) -> Result<Vec<Evaluation>, DomainError> {
        self.match_repo.list_evaluations(limit)
    }

    pub fn list_trades(&self, filter: &TradeFilter) -> Result<Vec<Trade>, DomainError> {
        self.trade_repo.list_trades(filter)
    }

    pub fn list_skipped(&self, limit: Option<usize>) -> Result<Vec<SkippedEntry>, DomainError> {
        self.trade_repo.list_skipped(limit)
    }

    pub fn trade_stats(&self) -> Result<TradeStats, DomainError> {
        self.stats_uc.stats()
    }

    fn open_pending_locked(&self, markets: &[Market], now: DateTime<Utc>) -> Result<EntryReport, DomainError> {
        let since = now - self.config.entry_window;
        let candidates = self.match_repo.list_matches(Some(since), None)?;
        self.trading.open_from_matches(&candidates, markets, now)
    }
}

/// Current reference prices keyed by market id, for `run_trade_checks`.
pub fn prices_from_markets(markets: &[Market]) -> HashMap<String, f64> {
    markets
        .iter()
        .filter_map(|m| m.resolved_midpoint().map(|p| (m.id.clone(), p)))
        .collect()
}

fn open_connection(path: &str) -> Result<Connection, DomainError> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| DomainError::Persistence(format!("cannot open {path}: {e}")))?;

    if !path.starts_with("file:") {
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| DomainError::Persistence(format!("WAL error: {e}")))?;
    }
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    Ok(conn)
}
