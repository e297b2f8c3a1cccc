//! SkillGraph DocStore — the primary document store (source of truth)
//! plus the sync outbox feeding the graph index.

pub mod outbox;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use sqlite::DocStore;
pub use types::*;
