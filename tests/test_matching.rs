mod common;

use common::*;
use newsedge::domain::entities::market_match::EvaluationOutcome;
use newsedge::domain::values::direction::Direction;
use std::sync::Arc;

const FED: &str = "Fed signals rate cut";
const Q_FED: &str = "Will the Fed cut rates in March?";
const Q_CPI: &str = "Will CPI exceed 3%?";
const Q_SNOW: &str = "Will it snow in Miami?";

fn embedder() -> Arc<MockEmbedder> {
    Arc::new(
        MockEmbedder::new()
            .with(FED, [1.0, 0.0, 0.0])
            .with(Q_FED, [1.0, 0.0, 0.0])
            .with(Q_CPI, [0.8, 0.6, 0.0])
            .with(Q_SNOW, [0.6, 0.8, 0.0]),
    )
}

fn universe() -> Vec<newsedge::domain::entities::market::Market> {
    vec![market("m-fed", Q_FED), market("m-cpi", Q_CPI), market("m-snow", Q_SNOW)]
}

#[tokio::test]
async fn test_below_threshold_pairs_never_reach_assessor() {
    let relevance = Arc::new(ScriptedRelevance::new());
    let engine = setup(embedder(), relevance.clone());

    let markets = vec![market("m-snow", Q_SNOW)];
    let report = engine.run_matching(&[signal("s1", FED)], &markets).await.unwrap();

    assert_eq!(report.candidates, 0);
    assert!(report.matches.is_empty());
    assert_eq!(relevance.calls(), 0);
    assert!(engine.list_evaluations(None).unwrap().is_empty());
}

#[tokio::test]
async fn test_only_confident_relevant_pairs_become_matches() {
    let relevance = Arc::new(
        ScriptedRelevance::new()
            .with("s1", "m-fed", yes(0.9))
            .with("s1", "m-cpi", yes(0.5)),
    );
    let engine = setup(embedder(), relevance.clone());

    let report = engine.run_matching(&[signal("s1", FED)], &universe()).await.unwrap();

    assert_eq!(relevance.calls(), 2);
    assert!(!relevance.seen().contains(&("s1".to_string(), "m-snow".to_string())));
    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.rejected, 1);

    let stored = engine.list_matches(None, None).unwrap();
    assert_eq!(stored.len(), 1);
    for m in &stored {
        assert!(m.similarity >= 0.65);
        assert!(m.confidence.value() >= 0.6);
        assert!(m.relevant);
        assert_eq!(m.direction, Direction::For);
    }
    assert_eq!(stored[0].market_id, "m-fed");
    assert_eq!(stored[0].market_question, Q_FED);

    let evaluations = engine.list_evaluations(None).unwrap();
    assert_eq!(evaluations.len(), 2);
    let cpi = evaluations.iter().find(|e| e.market_id == "m-cpi").unwrap();
    assert_eq!(cpi.outcome, EvaluationOutcome::Rejected);
    assert!(cpi.reason.as_deref().unwrap().contains("confidence"));
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let relevance = Arc::new(ScriptedRelevance::new().with("s1", "m-fed", yes(0.9)));
    let engine = setup(embedder(), relevance.clone());
    let signals = [signal("s1", FED)];

    let first = engine.run_matching(&signals, &universe()).await.unwrap();
    let calls_after_first = relevance.calls();
    let second = engine.run_matching(&signals, &universe()).await.unwrap();

    assert_eq!(first.matches.len(), 1);
    assert!(second.matches.is_empty());
    assert_eq!(second.candidates, 0);
    assert_eq!(relevance.calls(), calls_after_first);
    assert_eq!(engine.list_matches(None, None).unwrap().len(), 1);
    assert_eq!(engine.evaluated_pair_count().await, 2);
}

#[tokio::test]
async fn test_transient_failure_is_retried_next_cycle() {
    let relevance = Arc::new(ScriptedRelevance::new().with("s1", "m-fed", Reply::Transient));
    let engine = setup(embedder(), relevance.clone());
    let signals = [signal("s1", FED)];
    let markets = vec![market("m-fed", Q_FED)];

    let first = engine.run_matching(&signals, &markets).await.unwrap();
    assert_eq!(first.deferred, 1);
    assert!(first.matches.is_empty());
    // one attempt plus one retry
    assert_eq!(relevance.calls(), 2);
    assert!(engine.list_evaluations(None).unwrap().is_empty());

    relevance.set("s1", "m-fed", yes(0.8));
    let second = engine.run_matching(&signals, &markets).await.unwrap();
    assert_eq!(second.matches.len(), 1);
    assert_eq!(relevance.calls(), 3);
}

#[tokio::test]
async fn test_unparseable_assessment_rejects_pair() {
    let relevance = Arc::new(
        ScriptedRelevance::new().with("s1", "m-fed", Reply::Text("I'm not sure how to answer that.".into())),
    );
    let engine = setup(embedder(), relevance.clone());
    let signals = [signal("s1", FED)];
    let markets = vec![market("m-fed", Q_FED)];

    let report = engine.run_matching(&signals, &markets).await.unwrap();
    assert_eq!(report.rejected, 1);
    assert!(report.matches.is_empty());

    let evaluations = engine.list_evaluations(None).unwrap();
    assert_eq!(evaluations.len(), 1);
    assert_eq!(evaluations[0].outcome, EvaluationOutcome::Rejected);

    engine.run_matching(&signals, &markets).await.unwrap();
    assert_eq!(relevance.calls(), 1);
}

#[tokio::test]
async fn test_fenced_verdict_and_neutral_direction() {
    let relevance = Arc::new(
        ScriptedRelevance::new()
            .with(
                "s1",
                "m-fed",
                Reply::Text(format!("```json\n{}\n```", verdict_json(true, "NO", 0.75))),
            )
            .with("s1", "m-cpi", Reply::Text(verdict_json(true, "null", 0.95))),
    );
    let engine = setup(embedder(), relevance.clone());

    let report = engine.run_matching(&[signal("s1", FED)], &universe()).await.unwrap();

    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.matches[0].direction, Direction::Against);
    let evaluations = engine.list_evaluations(None).unwrap();
    let cpi = evaluations.iter().find(|e| e.market_id == "m-cpi").unwrap();
    assert_eq!(cpi.reason.as_deref(), Some("no direction"));
}

#[tokio::test]
async fn test_matches_are_returned_in_pair_order() {
    let embedder = embedder();
    embedder.set("Fed minutes leak", [1.0, 0.0, 0.0]);
    let relevance = Arc::new(
        ScriptedRelevance::new()
            .with("s2", "m-fed", yes(0.9))
            .with("s2", "m-cpi", no(0.7))
            .with("s1", "m-fed", yes(0.8))
            .with("s1", "m-cpi", yes(0.65)),
    );
    let engine = setup(embedder, relevance);

    let signals = [signal("s2", "Fed minutes leak"), signal("s1", FED)];
    let report = engine.run_matching(&signals, &universe()).await.unwrap();

    let pairs: Vec<(String, String)> = report
        .matches
        .iter()
        .map(|m| (m.signal_id.clone(), m.market_id.clone()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("s1".to_string(), "m-cpi".to_string()),
            ("s1".to_string(), "m-fed".to_string()),
            ("s2".to_string(), "m-cpi".to_string()),
            ("s2".to_string(), "m-fed".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_markets_outside_current_universe_are_not_candidates() {
    let relevance = Arc::new(ScriptedRelevance::new());
    let engine = setup(embedder(), relevance.clone());

    // First pass indexes m-fed.
    engine.run_matching(&[], &universe()).await.unwrap();

    // m-fed has closed and is absent from this snapshot.
    let markets = vec![market("m-snow", Q_SNOW)];
    let report = engine.run_matching(&[signal("s1", FED)], &markets).await.unwrap();

    assert_eq!(report.candidates, 0);
    assert_eq!(relevance.calls(), 0);
}

#[tokio::test]
async fn test_signal_embedding_failure_skips_only_that_signal() {
    let embedder = embedder();
    embedder.set("CPI hot", [0.8, 0.6, 0.0]);
    embedder.fail_on(FED);
    let relevance = Arc::new(ScriptedRelevance::new().with("s2", "m-cpi", yes(0.9)));
    let engine = setup(embedder, relevance);

    let report = engine
        .run_matching(&[signal("s1", FED), signal("s2", "CPI hot")], &universe())
        .await
        .unwrap();

    assert_eq!(report.signals_failed, 1);
    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.matches[0].signal_id, "s2");
}
