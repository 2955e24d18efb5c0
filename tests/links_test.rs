mod helpers;

use continuous::memory::links::MAX_GRAPH_DEPTH;
use continuous::memory::store::MemoryStore;
use helpers::{fact, test_engine};
use uuid::Uuid;

#[tokio::test]
async fn links_are_mutual_and_idempotent() {
    let t = test_engine();
    let a = t
        .engine
        .remember(fact("Rust services use tokio for async IO"))
        .await
        .unwrap();
    let b = t
        .engine
        .remember(fact("Rust services use tokio for async networking IO"))
        .await
        .unwrap();
    let unrelated = t
        .engine
        .remember(fact("Alice likes green tea in the morning"))
        .await
        .unwrap();

    let linked = t.engine.link(a.id).await.unwrap();
    assert_eq!(linked, vec![b.id]);

    let a_after = t.engine.get(a.id).await.unwrap().unwrap();
    let b_after = t.engine.get(b.id).await.unwrap().unwrap();
    assert_eq!(a_after.related_to, vec![b.id]);
    assert_eq!(b_after.related_to, vec![a.id]);
    assert!(t.engine.get(unrelated.id).await.unwrap().unwrap().related_to.is_empty());

    // Linking again adds nothing new.
    t.engine.link(a.id).await.unwrap();
    let a_again = t.engine.get(a.id).await.unwrap().unwrap();
    assert_eq!(a_again.related_to, vec![b.id]);
}

#[tokio::test]
async fn linking_unknown_memory_fails() {
    let t = test_engine();
    let err = t.engine.link(Uuid::now_v7()).await.unwrap_err();
    assert!(err.is_client_error());
}

#[tokio::test]
async fn graph_walks_links_up_to_depth() {
    let t = test_engine();
    let a = t.engine.remember(fact("chain link alpha")).await.unwrap();
    let b = t.engine.remember(fact("chain link beta")).await.unwrap();
    let c = t.engine.remember(fact("chain link gamma")).await.unwrap();
    t.store.add_link(a.id, b.id).await.unwrap();
    t.store.add_link(b.id, a.id).await.unwrap();
    t.store.add_link(b.id, c.id).await.unwrap();
    t.store.add_link(c.id, b.id).await.unwrap();

    let shallow = t.engine.graph(a.id, Some(1)).await.unwrap();
    assert_eq!(shallow.root, Some(a.id));
    assert_eq!(shallow.nodes.len(), 2);
    assert!(shallow.node(c.id).is_none());

    let deep = t.engine.graph(a.id, None).await.unwrap();
    assert_eq!(deep.nodes.len(), 3);
    assert!(deep.node(c.id).is_some());
    assert!(deep.edges.iter().any(|e| e.from == b.id && e.to == c.id));

    let root_only = t.engine.graph(a.id, Some(0)).await.unwrap();
    assert_eq!(root_only.nodes.len(), 1);
    assert!(root_only.edges.is_empty());
}

#[tokio::test]
async fn graph_depth_is_capped() {
    let t = test_engine();
    let mut ids = Vec::new();
    for i in 0..(MAX_GRAPH_DEPTH + 3) {
        ids.push(t.engine.remember(fact(&format!("step {i}"))).await.unwrap().id);
    }
    for pair in ids.windows(2) {
        t.store.add_link(pair[0], pair[1]).await.unwrap();
    }
    let graph = t.engine.graph(ids[0], Some(100)).await.unwrap();
    assert_eq!(graph.nodes.len(), MAX_GRAPH_DEPTH + 1);
}

#[tokio::test]
async fn deleted_neighbour_leaves_a_dangling_edge() {
    let t = test_engine();
    let a = t.engine.remember(fact("kept memory")).await.unwrap();
    let b = t.engine.remember(fact("soon forgotten")).await.unwrap();
    t.store.add_link(a.id, b.id).await.unwrap();
    t.engine.forget(b.id).await.unwrap();

    let graph = t.engine.graph(a.id, None).await.unwrap();
    assert_eq!(graph.nodes.len(), 1);
    assert_eq!(graph.edges.len(), 1);
    assert!(graph.node(graph.edges[0].to).is_none());
}

#[tokio::test]
async fn graph_of_unknown_memory_fails() {
    let t = test_engine();
    assert!(t.engine.graph(Uuid::now_v7(), None).await.is_err());
}
