mod helpers;

use chrono::{Duration, Utc};
use continuous::memory::consolidate::ConsolidationStatus;
use continuous::memory::store::MemoryStore;
use continuous::memory::types::{MemoryType, NewMemory};
use helpers::{fact, test_engine};

const OLD: i64 = 10;

#[tokio::test]
async fn dry_run_proposes_without_deleting() {
    let t = test_engine();
    let weak = t
        .engine
        .remember(fact("Postgres listens on port 5432 in staging").with_importance(0.5))
        .await
        .unwrap();
    let strong = t
        .engine
        .remember(fact("Postgres listens on port 5432 in staging").with_importance(0.7))
        .await
        .unwrap();
    let other = t
        .engine
        .remember(fact("Grafana dashboards are owned by the platform team"))
        .await
        .unwrap();
    for id in [weak.id, strong.id, other.id] {
        t.store
            .backdate(id, Utc::now() - Duration::days(OLD))
            .await
            .unwrap();
    }

    let actions = t.engine.consolidate(None, None, false).await.unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].keep, strong.id);
    assert_eq!(actions[0].remove, weak.id);
    assert_eq!(actions[0].status, ConsolidationStatus::Proposed);
    assert_eq!(t.engine.stats().await.unwrap().total_memories, 3);
}

#[tokio::test]
async fn apply_merges_links_and_deletes() {
    let t = test_engine();
    let weak = t
        .engine
        .remember(fact("The on-call rota is in PagerDuty").with_importance(0.4))
        .await
        .unwrap();
    let strong = t
        .engine
        .remember(fact("The on-call rota is in PagerDuty").with_importance(0.9))
        .await
        .unwrap();
    let neighbour = t
        .engine
        .remember(fact("Escalations go to the platform lead"))
        .await
        .unwrap();
    t.store.add_link(weak.id, neighbour.id).await.unwrap();
    for id in [weak.id, strong.id] {
        t.store
            .backdate(id, Utc::now() - Duration::days(OLD))
            .await
            .unwrap();
    }

    let actions = t.engine.consolidate(None, None, true).await.unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].status, ConsolidationStatus::Consolidated);

    assert!(t.engine.get(weak.id).await.unwrap().is_none());
    let kept = t.engine.get(strong.id).await.unwrap().unwrap();
    assert!(kept.related_to.contains(&neighbour.id));

    // Nothing left to merge.
    assert!(t.engine.consolidate(None, None, true).await.unwrap().is_empty());
}

#[tokio::test]
async fn recent_memories_and_promises_are_left_alone() {
    let t = test_engine();
    t.engine.remember(fact("Fresh duplicate note")).await.unwrap();
    t.engine.remember(fact("Fresh duplicate note")).await.unwrap();

    let p1 = t
        .engine
        .remember(NewMemory::new("Renew the domain before March", MemoryType::Promise))
        .await
        .unwrap();
    let p2 = t
        .engine
        .remember(NewMemory::new("Renew the domain before March", MemoryType::Promise))
        .await
        .unwrap();
    for id in [p1.id, p2.id] {
        t.store
            .backdate(id, Utc::now() - Duration::days(OLD))
            .await
            .unwrap();
    }

    assert!(t.engine.consolidate(None, None, true).await.unwrap().is_empty());
    assert_eq!(t.store.count().await.unwrap(), 4);
}

#[tokio::test]
async fn threshold_is_validated() {
    let t = test_engine();
    assert!(t.engine.consolidate(Some(1.5), None, false).await.is_err());
}
