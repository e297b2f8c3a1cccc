//! SkillGraph Sync — mirrors primary-store lifecycle and engagement
//! events into the graph index and derives new interests from
//! observed engagement.

pub mod engage;
pub mod event;
pub mod mirror;
pub mod promote;

pub use engage::Scorer;
pub use event::{apply_event, SyncEvent};
pub use mirror::Mirror;
pub use promote::promote_interests;
