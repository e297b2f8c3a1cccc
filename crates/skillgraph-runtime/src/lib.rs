//! SkillGraph Runtime — the engine facade the request-handling layer
//! talks to: fire-and-forget sync hooks, the outbox drain, and the
//! recommendation read path.

pub mod engine;
pub mod locks;
pub mod worker;

pub use engine::{DrainReport, Engine};
pub use worker::spawn_drain_loop;
