//! SkillGraph Core — error taxonomy, configuration, shared types.

pub mod config;
pub mod error;
pub mod types;

pub use config::{DataPaths, EngineConfig};
pub use error::{Error, Result};
pub use types::{ContentKind, RefCount, RoleCategory, TagName};
