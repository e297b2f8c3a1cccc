//! SkillGraph Graph Store — the property-graph index behind scoring and
//! recommendations. Derived state only; the primary document store is
//! the source of truth.

pub mod pool;
pub mod schema;
pub mod store;
pub mod types;

pub use pool::{GraphPool, GraphSession};
pub use store::GraphStore;
pub use types::*;
