//! Background outbox drain.
//!
//! The inline drain after each hook keeps sync lag near zero in the
//! common case; this loop picks up events that failed there, bounding
//! drift when the graph store was temporarily unavailable.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::engine::Engine;

/// Spawn a periodic drain task on the current tokio runtime. Aborting
/// the returned handle stops the loop.
pub fn spawn_drain_loop(engine: Arc<Engine>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let engine = Arc::clone(&engine);
            // The drain is synchronous SQLite work; keep it off the
            // async workers.
            let report = tokio::task::spawn_blocking(move || engine.drain()).await;
            match report {
                Ok(report) if report.applied > 0 || report.failed > 0 => {
                    debug!(applied = report.applied, failed = report.failed, "background drain pass");
                }
                _ => {}
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillgraph_core::EngineConfig;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_background_drain_applies_pending() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::from_env(dir.path()).unwrap();
        let engine = Arc::new(Engine::open(config).unwrap());
        engine.bootstrap();

        // Enqueued directly, so no inline drain has run.
        let event = serde_json::json!({
            "type": "person_created",
            "person_id": "u1", "name": "Asha", "role": "student",
            "skills": ["rust"], "interests": [],
        });
        engine.docs().outbox_enqueue(&event).unwrap();
        assert_eq!(engine.docs().outbox_pending(10).unwrap().len(), 1);

        let handle = spawn_drain_loop(Arc::clone(&engine), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.abort();

        assert!(engine.docs().outbox_pending(10).unwrap().is_empty());
        assert!(engine
            .graph()
            .node_exists(skillgraph_graph::NodeLabel::Person, "u1")
            .unwrap());
    }
}
