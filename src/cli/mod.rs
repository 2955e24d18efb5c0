pub mod consolidate;
pub mod doctor;
pub mod graph;
pub mod memories;
pub mod session;
pub mod stats;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::AsyncWriteExt;

use crate::config::{expand_tilde, ContinuousConfig, EmbeddingConfig};
use crate::embedding::local::{MODEL_FILE, TOKENIZER_FILE};
use crate::embedding::LazyProvider;
use crate::memory::{EngineSettings, MemoryEngine};

const MODEL_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/onnx/model.onnx";
const TOKENIZER_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/tokenizer.json";

/// Engine for one CLI invocation. The model is only loaded if a command embeds.
pub async fn open_engine(config: &ContinuousConfig) -> Result<MemoryEngine> {
    let store = crate::db::open_store(config).await?;
    Ok(MemoryEngine::new(
        store,
        Arc::new(LazyProvider::new(config.embedding.clone())),
        EngineSettings::from_config(config),
    ))
}

/// Download the ONNX model and tokenizer into the cache directory.
pub async fn model_download(config: &EmbeddingConfig) -> Result<()> {
    let cache_dir = expand_tilde(&config.cache_dir);
    std::fs::create_dir_all(&cache_dir)
        .with_context(|| format!("failed to create {}", cache_dir.display()))?;

    for (name, url) in [(MODEL_FILE, MODEL_URL), (TOKENIZER_FILE, TOKENIZER_URL)] {
        let dest = cache_dir.join(name);
        if dest.exists() {
            println!("{name} already present at {}", dest.display());
            continue;
        }
        println!("Downloading {name}...");
        download_file(url, &dest).await?;
        println!("Saved {}", dest.display());
    }

    println!("Embedding model ready.");
    Ok(())
}

/// Fetch `url` into `dest` with a progress bar, writing to a temp file first.
async fn download_file(url: &str, dest: &Path) -> Result<()> {
    let mut response = reqwest::get(url)
        .await
        .with_context(|| format!("request to {url} failed"))?;
    anyhow::ensure!(
        response.status().is_success(),
        "download of {url} failed with HTTP {}",
        response.status()
    );

    let pb = match response.content_length() {
        Some(size) => {
            let style = ProgressStyle::default_bar()
                .template("  {bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})")
                .context("invalid progress template")?
                .progress_chars("##-");
            ProgressBar::new(size).with_style(style)
        }
        None => ProgressBar::new_spinner(),
    };

    let tmp_path = dest.with_extension("part");
    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;
    while let Some(chunk) = response.chunk().await.context("error reading response")? {
        file.write_all(&chunk).await.context("error writing file")?;
        pb.inc(chunk.len() as u64);
    }
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp_path, dest)
        .await
        .context("failed to move download into place")?;
    pb.finish_and_clear();
    Ok(())
}
