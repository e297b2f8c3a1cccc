//! Graph store schema SQL.
//!
//! Node identity is unique per label at the schema level; edge
//! deletion cascades from either endpoint, so deleting a node is a
//! detach-delete. `shared` edges are append-only and excluded from
//! the one-edge-per-(kind, src, dst) index.

/// Nodes and edges tables plus the uniqueness constraints the
/// bootstrap guarantees. Every statement is idempotent.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS nodes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    label TEXT NOT NULL CHECK (label IN ('person', 'post', 'tag')),
    ext_id TEXT NOT NULL,
    name TEXT,
    role TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_nodes_label_ext ON nodes(label, ext_id);

CREATE TABLE IF NOT EXISTS edges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    src INTEGER NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
    dst INTEGER NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
    score INTEGER NOT NULL DEFAULT 0 CHECK (score >= 0)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_edges_kind_src_dst
    ON edges(kind, src, dst) WHERE kind != 'shared';
CREATE INDEX IF NOT EXISTS idx_edges_src_kind ON edges(src, kind);
CREATE INDEX IF NOT EXISTS idx_edges_dst_kind ON edges(dst, kind);
"#;
