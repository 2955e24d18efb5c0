mod helpers;

use chrono::{Duration, Utc};
use continuous::memory::search::{Ranking, RecallQuery, MAX_RECALL_LIMIT};
use continuous::memory::types::{MemoryType, NewMemory, SourceType, DEFAULT_IMPORTANCE};
use helpers::{fact, test_engine};

#[tokio::test]
async fn remember_then_get_round_trips() {
    let t = test_engine();
    let stored = t
        .engine
        .remember(
            NewMemory::new("  Ana prefers tabs over spaces  ", MemoryType::Preference)
                .with_tags(vec!["style".into(), " style ".into(), "editor".into()])
                .with_source("chat")
                .with_source_type(SourceType::Inferred)
                .with_confidence(0.8)
                .with_project(Some("acme".into())),
        )
        .await
        .unwrap();

    assert_eq!(stored.content, "Ana prefers tabs over spaces");
    assert_eq!(stored.importance, DEFAULT_IMPORTANCE);
    assert_eq!(stored.tags, vec!["style".to_string(), "editor".to_string()]);
    assert_eq!(stored.source_type, SourceType::Inferred);
    assert!(stored.related_to.is_empty());

    let fetched = t.engine.get(stored.id).await.unwrap().unwrap();
    assert_eq!(fetched, stored);
}

#[tokio::test]
async fn memories_without_importance_get_the_default() {
    let t = test_engine();
    for memory_type in [
        MemoryType::Decision,
        MemoryType::Preference,
        MemoryType::Person,
        MemoryType::Fact,
    ] {
        let stored = t
            .engine
            .remember(NewMemory::new(format!("a plain {memory_type:?} note"), memory_type))
            .await
            .unwrap();
        assert_eq!(stored.importance, 0.5, "{memory_type:?}");
    }

    let promise = t
        .engine
        .remember(NewMemory::new("Call the landlord back", MemoryType::Promise))
        .await
        .unwrap();
    assert_eq!(promise.importance, 1.0);
}

#[tokio::test]
async fn promise_importance_is_always_one() {
    let t = test_engine();
    let promise = t
        .engine
        .remember(NewMemory::new("Send the invoice by Monday", MemoryType::Promise).with_importance(0.2))
        .await
        .unwrap();
    assert_eq!(promise.importance, 1.0);
}

#[tokio::test]
async fn invalid_input_is_rejected_before_storing() {
    let t = test_engine();
    assert!(t.engine.remember(fact("   ")).await.is_err());
    let err = t
        .engine
        .remember(fact("Out of range").with_importance(1.2))
        .await
        .unwrap_err();
    assert!(err.is_client_error());
    assert_eq!(t.engine.stats().await.unwrap().total_memories, 0);
}

#[tokio::test]
async fn recall_puts_the_closest_memory_first() {
    let t = test_engine();
    let editor = t.engine.remember(fact("My favourite editor is helix")).await.unwrap();
    t.engine.remember(fact("The build uses cargo nextest")).await.unwrap();
    t.engine.remember(fact("Lunch is at noon on weekdays")).await.unwrap();

    let response = t
        .engine
        .recall(RecallQuery::new("which editor is my favourite"))
        .await
        .unwrap();
    assert_eq!(response.results[0].memory.id, editor.id);
    assert!(response.results[0].similarity > 0.5);
    for pair in response.results.windows(2) {
        assert!(pair[0].similarity >= pair[1].similarity);
    }
}

#[tokio::test]
async fn recall_respects_limit_and_filters() {
    let t = test_engine();
    for i in 0..8 {
        t.engine
            .remember(fact(&format!("deploy note number {i}")))
            .await
            .unwrap();
    }
    t.engine
        .remember(NewMemory::new("deploy only after review", MemoryType::Decision).with_importance(0.7))
        .await
        .unwrap();

    let mut q = RecallQuery::new("deploy note");
    q.limit = Some(3);
    assert_eq!(t.engine.recall(q).await.unwrap().results.len(), 3);

    // Default limit comes from settings.
    let response = t.engine.recall(RecallQuery::new("deploy note")).await.unwrap();
    assert_eq!(response.results.len(), t.engine.settings().default_limit);

    let mut q = RecallQuery::new("deploy");
    q.filter.memory_type = Some(MemoryType::Decision);
    let response = t.engine.recall(q).await.unwrap();
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].memory.memory_type, MemoryType::Decision);

    let mut q = RecallQuery::new("deploy");
    q.filter.min_importance = 0.6;
    let response = t.engine.recall(q).await.unwrap();
    assert!(response.results.iter().all(|h| h.memory.importance >= 0.6));
}

#[tokio::test]
async fn recall_limit_is_capped() {
    let t = test_engine();
    for i in 0..(MAX_RECALL_LIMIT + 5) {
        t.engine.remember(fact(&format!("note {i}"))).await.unwrap();
    }
    let mut q = RecallQuery::new("note");
    q.limit = Some(500);
    assert_eq!(t.engine.recall(q).await.unwrap().results.len(), MAX_RECALL_LIMIT);
}

#[tokio::test]
async fn recall_validates_its_input() {
    let t = test_engine();
    assert!(t.engine.recall(RecallQuery::new("  ")).await.is_err());

    let mut q = RecallQuery::new("anything");
    q.filter.min_confidence = 2.0;
    assert!(t.engine.recall(q).await.unwrap_err().is_client_error());
}

#[tokio::test]
async fn recall_on_empty_store_is_empty() {
    let t = test_engine();
    let response = t.engine.recall(RecallQuery::new("anything")).await.unwrap();
    assert!(response.results.is_empty());
}

#[tokio::test]
async fn weighted_ranking_orders_by_score() {
    let t = test_engine();
    let faded = t
        .engine
        .remember(fact("coffee order is an oat latte").with_importance(1.0))
        .await
        .unwrap();
    t.store
        .backdate(faded.id, Utc::now() - Duration::days(120))
        .await
        .unwrap();
    t.engine
        .remember(fact("coffee order is a flat white").with_importance(0.5))
        .await
        .unwrap();

    let mut q = RecallQuery::new("coffee order");
    q.ranking = Ranking::Weighted;
    let response = t.engine.recall(q).await.unwrap();
    assert_eq!(response.ranking, Ranking::Weighted);
    let scores: Vec<f64> = response
        .results
        .iter()
        .map(|h| h.similarity * h.effective_importance)
        .collect();
    for pair in scores.windows(2) {
        assert!(pair[0] >= pair[1], "weighted results out of order: {scores:?}");
    }
    // 120 days is four half-lives: 1.0 decays to 0.0625, below the fresh 0.5.
    assert_ne!(response.results[0].memory.id, faded.id);
}
