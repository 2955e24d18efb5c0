//! SQL DDL for the `memories` table and the `match_memories` search function.
//!
//! Statements are split per migration step. Everything uses `IF NOT EXISTS` or
//! `CREATE OR REPLACE` so re-running a step is harmless.

/// Metadata table holding `schema_version` and `embedding_model`.
pub const SCHEMA_META_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
"#;

/// v1: base table as first deployed (type, importance, tags, source, links).
pub const V1_STATEMENTS: &[&str] = &[
    "CREATE EXTENSION IF NOT EXISTS vector",
    r#"
    CREATE TABLE IF NOT EXISTS memories (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        content TEXT NOT NULL,
        memory_type TEXT NOT NULL,
        importance DOUBLE PRECISION NOT NULL DEFAULT 0.5
            CHECK (importance >= 0.0 AND importance <= 1.0),
        tags TEXT[] NOT NULL DEFAULT '{}',
        source TEXT NOT NULL DEFAULT 'direct',
        related_to UUID[] NOT NULL DEFAULT '{}',
        embedding vector(384) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_memories_type ON memories(memory_type)",
    "CREATE INDEX IF NOT EXISTS idx_memories_created_at ON memories(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_memories_tags ON memories USING GIN(tags)",
];

/// ivfflat index. Created outside the migration transaction and allowed to fail
/// (an empty table or a missing extension should not block startup).
pub const VECTOR_INDEX_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_memories_embedding ON memories
USING ivfflat (embedding vector_cosine_ops) WITH (lists = 100)
"#;

/// v2: provenance, confidence, project scoping, and the 6-argument search function.
pub const V2_STATEMENTS: &[&str] = &[
    r#"
    ALTER TABLE memories
        ADD COLUMN IF NOT EXISTS source_type TEXT NOT NULL DEFAULT 'user_stated',
        ADD COLUMN IF NOT EXISTS confidence DOUBLE PRECISION NOT NULL DEFAULT 1.0
            CHECK (confidence >= 0.0 AND confidence <= 1.0),
        ADD COLUMN IF NOT EXISTS project TEXT
    "#,
    "CREATE INDEX IF NOT EXISTS idx_memories_project ON memories(project)",
    "DROP FUNCTION IF EXISTS match_memories(vector, integer, text, double precision)",
    r#"
    CREATE OR REPLACE FUNCTION match_memories(
        query_embedding vector(384),
        match_count INTEGER,
        filter_type TEXT DEFAULT NULL,
        min_importance DOUBLE PRECISION DEFAULT 0.0,
        filter_project TEXT DEFAULT NULL,
        min_confidence DOUBLE PRECISION DEFAULT 0.0
    )
    RETURNS TABLE (
        id UUID,
        content TEXT,
        memory_type TEXT,
        importance DOUBLE PRECISION,
        tags TEXT[],
        source TEXT,
        source_type TEXT,
        confidence DOUBLE PRECISION,
        related_to UUID[],
        project TEXT,
        created_at TIMESTAMPTZ,
        updated_at TIMESTAMPTZ,
        similarity DOUBLE PRECISION
    )
    LANGUAGE sql STABLE
    AS $$
        SELECT
            m.id, m.content, m.memory_type, m.importance, m.tags, m.source,
            m.source_type, m.confidence, m.related_to, m.project,
            m.created_at, m.updated_at,
            1 - (m.embedding <=> query_embedding) AS similarity
        FROM memories m
        WHERE (filter_type IS NULL OR m.memory_type = filter_type)
          AND m.importance >= min_importance
          AND m.confidence >= min_confidence
          AND (filter_project IS NULL OR m.project = filter_project)
        ORDER BY m.embedding <=> query_embedding
        LIMIT match_count
    $$
    "#,
];
