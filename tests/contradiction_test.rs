mod helpers;

use continuous::memory::contradiction::ConflictReason;
use continuous::memory::types::{MemoryType, NewMemory};
use helpers::{fact, test_engine};

#[tokio::test]
async fn negated_statement_is_flagged() {
    let t = test_engine();
    let stored = t
        .engine
        .remember(fact("The deploy window is on Friday at 5pm"))
        .await
        .unwrap();

    let candidates = t
        .engine
        .check_contradiction("The deploy window is not on Friday at 5pm", MemoryType::Fact)
        .await
        .unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].memory.id, stored.id);
    assert!(candidates[0].is_likely_conflict());
    assert!(candidates[0].reasons.contains(&ConflictReason::NegationMismatch));
}

#[tokio::test]
async fn changed_figure_is_flagged() {
    let t = test_engine();
    t.engine
        .remember(fact("The team standup has 6 people"))
        .await
        .unwrap();
    let candidates = t
        .engine
        .check_contradiction("The team standup has 9 people", MemoryType::Fact)
        .await
        .unwrap();
    assert!(candidates
        .iter()
        .flat_map(|c| &c.reasons)
        .any(|r| matches!(r, ConflictReason::DifferentFigures { .. })));
}

#[tokio::test]
async fn only_same_type_is_compared() {
    let t = test_engine();
    t.engine
        .remember(NewMemory::new(
            "We use Postgres for the main database",
            MemoryType::Decision,
        ))
        .await
        .unwrap();
    let candidates = t
        .engine
        .check_contradiction("We no longer use Postgres for the main database", MemoryType::Fact)
        .await
        .unwrap();
    assert!(candidates.is_empty());
}

#[tokio::test]
async fn remember_checked_reports_but_still_stores() {
    let t = test_engine();
    t.engine
        .remember(NewMemory::new("Sam always uses the dark theme", MemoryType::Preference))
        .await
        .unwrap();
    let outcome = t
        .engine
        .remember_checked(NewMemory::new("Sam never uses the dark theme", MemoryType::Preference))
        .await
        .unwrap();
    assert_eq!(outcome.possible_contradictions.len(), 1);
    assert!(outcome.possible_contradictions[0]
        .reasons
        .iter()
        .any(|r| matches!(r, ConflictReason::OpposingTerms { .. })));
    assert!(t.engine.get(outcome.memory.id).await.unwrap().is_some());
}

#[tokio::test]
async fn empty_content_is_rejected() {
    let t = test_engine();
    assert!(t
        .engine
        .check_contradiction("  ", MemoryType::Fact)
        .await
        .is_err());
}
