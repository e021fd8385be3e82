mod common;

use chrono::Duration;
use common::*;
use newsedge::domain::ports::trade_repository::TradeFilter;
use newsedge::domain::values::trade_status::TradeStatus;
use newsedge::NewsEdge;
use std::sync::Arc;

const FED: &str = "Fed signals rate cut";
const Q_FED: &str = "Will the Fed cut rates in March?";

fn open(path: &str, embedder: &Arc<MockEmbedder>, relevance: &Arc<ScriptedRelevance>) -> NewsEdge {
    NewsEdge::with_providers(path, fast_config(), embedder.clone(), relevance.clone()).unwrap()
}

#[tokio::test]
async fn test_restart_reloads_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("newsedge.db");
    let path = path.to_str().unwrap();

    let embedder = Arc::new(
        MockEmbedder::new()
            .with(FED, [1.0, 0.0, 0.0])
            .with(Q_FED, [1.0, 0.0, 0.0]),
    );
    let relevance = Arc::new(ScriptedRelevance::new().with("s1", "m-fed", yes(0.9)));
    let signals = [signal("s1", FED)];
    let markets = vec![liquid_market("m-fed", Q_FED, 0.40)];

    let trade = {
        let engine = open(path, &embedder, &relevance);
        let cycle = engine.run_pipeline(&signals, &markets).await.unwrap();
        assert_eq!(cycle.entries.opened.len(), 1);
        cycle.entries.opened[0].clone()
    };
    let embedded_before = embedder.texts_embedded();
    let assessed_before = relevance.calls();

    let engine = open(path, &embedder, &relevance);
    assert_eq!(engine.evaluated_pair_count().await, 1);

    let open_trades = engine.list_trades(&TradeFilter::open()).unwrap();
    assert_eq!(open_trades.len(), 1);
    assert_eq!(open_trades[0].id, trade.id);
    assert!((open_trades[0].entry_price - trade.entry_price).abs() < 1e-12);

    // Same inputs again: no reassessment, no market re-embedding.
    let report = engine.run_matching(&signals, &markets).await.unwrap();
    assert!(report.matches.is_empty());
    assert_eq!(report.index.cached, 1);
    assert_eq!(report.index.embedded, 0);
    assert_eq!(relevance.calls(), assessed_before);
    // only the signal headline is embedded
    assert_eq!(embedder.texts_embedded(), embedded_before + 1);

    // The reloaded trade still runs through the exit rules.
    let checks = engine
        .run_trade_checks(&prices(&[("m-fed", 0.37)]), trade.entry_time + Duration::minutes(5))
        .await
        .unwrap();
    assert_eq!(checks.closed.len(), 1);
    assert_eq!(checks.closed[0].status, TradeStatus::StopLoss);

    let entries = engine.open_pending(&markets, trade.entry_time).await.unwrap();
    assert_eq!(entries.already_traded, 1);
    assert!(entries.opened.is_empty());
}

#[tokio::test]
async fn test_restart_keeps_matches_and_skips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("newsedge.db");
    let path = path.to_str().unwrap();

    let embedder = Arc::new(
        MockEmbedder::new()
            .with(FED, [1.0, 0.0, 0.0])
            .with(Q_FED, [1.0, 0.0, 0.0]),
    );
    let relevance = Arc::new(ScriptedRelevance::new().with("s1", "m-fed", no(0.7)));
    let mut thin = market("m-fed", Q_FED);
    thin.midpoint = Some(0.5);
    thin.order_book = Some(book(&[(0.5, 1.0)], &[(0.51, 1.0)]));

    {
        let engine = open(path, &embedder, &relevance);
        let cycle = engine.run_pipeline(&[signal("s1", FED)], &[thin]).await.unwrap();
        assert_eq!(cycle.entries.skipped.len(), 1);
    }

    let engine = open(path, &embedder, &relevance);
    let matches = engine.list_matches(None, None).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].market_id, "m-fed");
    let reloaded = engine.get_match(&matches[0].id).unwrap().unwrap();
    assert_eq!(reloaded.signal_id, "s1");
    assert_eq!(reloaded.direction, newsedge::domain::values::direction::Direction::Against);
    assert!(engine.get_match("missing").unwrap().is_none());
    assert_eq!(engine.list_skipped(None).unwrap().len(), 1);
    assert_eq!(engine.list_evaluations(None).unwrap().len(), 1);
    assert!(engine.list_trades(&TradeFilter::default()).unwrap().is_empty());
}
