use crate::application::relevance::RelevanceAssessor;
use crate::application::vector_index::{IndexSyncReport, VectorIndex};
use crate::config::EngineConfig;
use crate::domain::entities::market::Market;
use crate::domain::entities::market_match::{Evaluation, Match};
use crate::domain::entities::signal::Signal;
use crate::domain::error::DomainError;
use crate::domain::ports::match_repository::MatchRepository;
use crate::domain::values::evaluated_pairs::EvaluatedPairs;
use crate::domain::values::verdict::Verdict;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchReport {
    pub index: IndexSyncReport,
    pub signals: usize,
    /// Signals whose headline could not be embedded this cycle.
    pub signals_failed: usize,
    /// Pairs at or above the similarity threshold, not yet evaluated.
    pub candidates: usize,
    pub rejected: usize,
    /// Pairs whose assessment failed and will be retried next cycle.
    pub deferred: usize,
    pub matches: Vec<Match>,
}

struct Candidate<'a> {
    signal: &'a Signal,
    market: &'a Market,
    similarity: f64,
}

/// Two-stage matcher: vector similarity first, relevance assessment second.
pub struct MatchEngine {
    index: Arc<VectorIndex>,
    assessor: Arc<RelevanceAssessor>,
    repo: Arc<dyn MatchRepository>,
    similarity_threshold: f64,
    confidence_threshold: f64,
    top_k: usize,
    concurrency: usize,
}

impl MatchEngine {
    pub fn new(
        index: Arc<VectorIndex>,
        assessor: Arc<RelevanceAssessor>,
        repo: Arc<dyn MatchRepository>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            index,
            assessor,
            repo,
            similarity_threshold: config.similarity_threshold,
            confidence_threshold: config.confidence_threshold,
            top_k: config.top_k,
            concurrency: config.assess_concurrency.max(1),
        }
    }

    /// One matching pass over `signals` against the `markets` universe.
    ///
    /// Pairs in `evaluated` are never assessed again; every pair assessed
    /// to a verdict in this pass is added to it once persisted.
    pub async fn run(
        &self,
        signals: &[Signal],
        markets: &[Market],
        evaluated: &mut EvaluatedPairs,
    ) -> Result<MatchReport, DomainError> {
        let mut report = MatchReport {
            index: self.index.sync(markets).await?,
            signals: signals.len(),
            ..MatchReport::default()
        };

        let by_id: HashMap<&str, &Market> = markets.iter().map(|m| (m.id.as_str(), m)).collect();
        let universe: HashSet<String> = by_id.keys().map(|id| id.to_string()).collect();

        let mut candidates: Vec<Candidate<'_>> = Vec::new();
        let mut queued: HashSet<(&str, &str)> = HashSet::new();

        for signal in signals {
            let embedding = match self.index.embed_query(&signal.headline).await {
                Ok(e) => e,
                Err(e) => {
                    warn!(signal = %signal.id, error = %e, "Could not embed signal, skipping this cycle");
                    report.signals_failed += 1;
                    continue;
                }
            };

            for (market_id, similarity) in self.index.query(&embedding, self.top_k, Some(&universe)) {
                if similarity < self.similarity_threshold {
                    continue;
                }
                if evaluated.contains(&signal.id, &market_id) {
                    continue;
                }
                let Some(market) = by_id.get(market_id.as_str()).copied() else {
                    continue;
                };
                if !queued.insert((signal.id.as_str(), market.id.as_str())) {
                    continue;
                }
                debug!(signal = %signal.id, market = %market.id, similarity, "Candidate pair");
                candidates.push(Candidate {
                    signal,
                    market,
                    similarity,
                });
            }
        }

        report.candidates = candidates.len();
        if candidates.is_empty() {
            info!(signals = report.signals, "No new candidate pairs");
            return Ok(report);
        }

        let assessor = &self.assessor;
        let results: Vec<(Candidate<'_>, Result<Verdict, DomainError>)> = stream::iter(candidates)
            .map(|c| async move {
                let verdict = assessor.assess(c.signal, c.market).await;
                (c, verdict)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut evaluations = Vec::with_capacity(results.len());
        for (c, result) in results {
            match result {
                Ok(verdict) if verdict.qualifies(self.confidence_threshold) => {
                    evaluations.push(Evaluation::matched(build_match(&c, verdict)));
                }
                Ok(verdict) => {
                    let reason = rejection_reason(&verdict, self.confidence_threshold);
                    debug!(signal = %c.signal.id, market = %c.market.id, reason = %reason, "Pair rejected");
                    evaluations.push(Evaluation::rejected(&c.signal.id, &c.market.id, c.similarity, reason));
                }
                Err(e @ DomainError::AssessmentParse(_)) => {
                    warn!(signal = %c.signal.id, market = %c.market.id, error = %e, "Unparseable assessment, rejecting pair");
                    evaluations.push(Evaluation::rejected(&c.signal.id, &c.market.id, c.similarity, e.to_string()));
                }
                Err(e) => {
                    warn!(signal = %c.signal.id, market = %c.market.id, error = %e, "Assessment failed, will retry next cycle");
                    report.deferred += 1;
                }
            }
        }

        evaluations.sort_by(|a, b| {
            a.signal_id
                .cmp(&b.signal_id)
                .then_with(|| a.market_id.cmp(&b.market_id))
        });

        self.repo.record_evaluations(&evaluations)?;

        for evaluation in evaluations {
            evaluated.insert(&evaluation.signal_id, &evaluation.market_id);
            match evaluation.matched {
                Some(m) => report.matches.push(m),
                None => report.rejected += 1,
            }
        }

        info!(
            signals = report.signals,
            candidates = report.candidates,
            matched = report.matches.len(),
            rejected = report.rejected,
            deferred = report.deferred,
            "Matching pass complete"
        );
        Ok(report)
    }
}

fn build_match(c: &Candidate<'_>, verdict: Verdict) -> Match {
    Match {
        id: uuid::Uuid::new_v4().to_string(),
        signal_id: c.signal.id.clone(),
        market_id: c.market.id.clone(),
        similarity: c.similarity,
        relevant: verdict.relevant,
        direction: verdict.direction,
        confidence: verdict.confidence,
        reasoning: verdict.reasoning,
        headline: c.signal.headline.clone(),
        market_question: c.market.question.clone(),
        matched_at: Utc::now(),
    }
}

fn rejection_reason(verdict: &Verdict, confidence_threshold: f64) -> String {
    if !verdict.relevant {
        "not relevant".to_string()
    } else if !verdict.direction.is_actionable() {
        "no direction".to_string()
    } else {
        format!(
            "confidence {:.2} below {:.2}",
            verdict.confidence.value(),
            confidence_threshold
        )
    }
}
