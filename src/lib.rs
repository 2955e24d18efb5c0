//! Long-term memory for an AI assistant, served over MCP.
//!
//! Short text memories (promises, facts, preferences, decisions, ...) are
//! embedded with a local all-MiniLM-L6-v2 model and stored in Postgres with
//! pgvector, or in a local JSON file when no database is configured. Recall
//! is nearest-neighbour search by cosine distance, with importance decaying
//! on a 30-day half-life at read time. Promises never decay.
//!
//! | Type | Default importance |
//! |------|--------------------|
//! | promise | 1.0 (fixed) |
//! | every other type | 0.5 |
//!
//! # Modules
//!
//! - [`memory`]: the [`MemoryEngine`](memory::MemoryEngine) facade, storage backends,
//!   decay, extraction, contradiction checks, linking and consolidation
//! - [`db`]: Postgres pool, schema migrations and health checks
//! - [`embedding`]: the embedding provider trait and the ONNX implementation
//! - [`tools`] and [`server`]: the MCP surface over stdio or streamable HTTP
//! - [`cli`]: terminal commands
//! - [`config`], [`error`], [`identity`], [`project`]

pub mod cli;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod identity;
pub mod memory;
pub mod project;
pub mod server;
pub mod tools;
