#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use continuous::embedding::{l2_normalize, EmbeddingProvider, EMBEDDING_DIM};
use continuous::memory::local::LocalStore;
use continuous::memory::types::{MemoryType, NewMemory};
use continuous::memory::{EngineSettings, MemoryEngine};
use tempfile::TempDir;

/// Bag-of-words embedder: each lowercase word is hashed into one of the
/// 384 dimensions. Texts sharing words get high cosine similarity, which is
/// all the engine tests need.
pub struct HashEmbedder;

fn fnv1a(word: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in word.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

impl EmbeddingProvider for HashEmbedder {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut v = vec![0.0f32; EMBEDDING_DIM];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let slot = (fnv1a(&word.to_lowercase()) % EMBEDDING_DIM as u64) as usize;
            v[slot] += 1.0;
        }
        Ok(l2_normalize(v))
    }
}

/// An engine over an in-memory store. The temp dir holds the identity file
/// and acts as the working directory; keep it alive for the test's duration.
pub struct TestEngine {
    pub engine: Arc<MemoryEngine>,
    pub store: Arc<LocalStore>,
    pub dir: TempDir,
}

pub fn test_engine() -> TestEngine {
    test_engine_with(|_| {})
}

/// Like [`test_engine`], letting the caller adjust settings first.
pub fn test_engine_with(adjust: impl FnOnce(&mut EngineSettings)) -> TestEngine {
    let dir = TempDir::new().unwrap();
    let mut settings = EngineSettings {
        identity_path: dir.path().join("identity.md"),
        working_dir: dir.path().to_path_buf(),
        known_projects: Vec::new(),
        current_project: None,
        ..EngineSettings::default()
    };
    adjust(&mut settings);

    let store = Arc::new(LocalStore::in_memory());
    let engine = Arc::new(MemoryEngine::new(
        store.clone(),
        Arc::new(HashEmbedder),
        settings,
    ));
    TestEngine { engine, store, dir }
}

pub fn fact(content: &str) -> NewMemory {
    NewMemory::new(content, MemoryType::Fact)
}

pub fn write_identity(dir: &Path, text: &str) {
    std::fs::write(dir.join("identity.md"), text).unwrap();
}
