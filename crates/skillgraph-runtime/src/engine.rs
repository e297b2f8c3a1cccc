//! The engine facade.
//!
//! Hooks are fire-and-forget: the primary write has already succeeded
//! when one is invoked, so every graph-side problem is logged and
//! absorbed here — enqueue failures, apply failures, all of it. The
//! caller's response never depends on the graph. Graph sessions carry
//! a busy timeout, so a wedged graph database surfaces as an ordinary
//! failed (and later retried) sync event rather than a hung request.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::locks::EngagementLocks;
use skillgraph_core::{EngineConfig, Error, Result};
use skillgraph_docstore::DocStore;
use skillgraph_graph::GraphStore;
use skillgraph_rank::Recommendation;
use skillgraph_sync::{apply_event, SyncEvent};

/// Outcome of one outbox drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub applied: usize,
    pub failed: usize,
}

/// Graph Synchronization & Interest-Scoring Engine.
pub struct Engine {
    docs: Arc<DocStore>,
    graph: Arc<GraphStore>,
    config: EngineConfig,
    locks: EngagementLocks,
    drain_lock: Mutex<()>,
}

impl Engine {
    /// Open both stores under the configured data directories.
    pub fn open(config: EngineConfig) -> Result<Self> {
        let docs = Arc::new(DocStore::open(&config.data_paths.primary)?);
        let graph = Arc::new(GraphStore::open(
            &config.data_paths.graph,
            std::time::Duration::from_millis(config.graph_busy_timeout_ms),
        )?);
        Ok(Self::new(docs, graph, config))
    }

    pub fn new(docs: Arc<DocStore>, graph: Arc<GraphStore>, config: EngineConfig) -> Self {
        Self {
            docs,
            graph,
            config,
            locks: EngagementLocks::new(),
            drain_lock: Mutex::new(()),
        }
    }

    /// The primary store, for the request layer's own reads and writes.
    pub fn docs(&self) -> &DocStore {
        &self.docs
    }

    /// The graph index. Derived state; direct mutation bypasses the
    /// outbox and is for inspection only.
    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Call once at process start. Constraint failure is logged and
    /// non-fatal: the engine keeps operating without the uniqueness
    /// guarantee until a later defensive bootstrap succeeds.
    pub fn bootstrap(&self) {
        match self.graph.ensure_constraints() {
            Ok(()) => info!("graph schema bootstrap complete"),
            Err(e) => error!("graph schema bootstrap failed: {e}"),
        }
    }

    // ---------------------------------------------------------------
    // Sync hooks (fire-and-forget)
    // ---------------------------------------------------------------

    pub fn on_person_created(
        &self,
        person_id: &str,
        name: &str,
        role: &str,
        skills: &[String],
        interests: &[String],
    ) {
        self.submit(SyncEvent::PersonCreated {
            person_id: person_id.to_string(),
            name: name.to_string(),
            role: role.to_string(),
            skills: skills.to_vec(),
            interests: interests.to_vec(),
        });
    }

    pub fn on_person_deleted(&self, person_id: &str) {
        self.submit(SyncEvent::PersonDeleted {
            person_id: person_id.to_string(),
        });
    }

    pub fn on_post_created(
        &self,
        poster_id: &str,
        post_id: &str,
        title: &str,
        required_tags: &[String],
    ) {
        self.submit(SyncEvent::PostCreated {
            poster_id: poster_id.to_string(),
            post_id: post_id.to_string(),
            title: title.to_string(),
            required_tags: required_tags.to_vec(),
        });
    }

    pub fn on_post_deleted(&self, post_id: &str) {
        self.submit(SyncEvent::PostDeleted {
            post_id: post_id.to_string(),
        });
    }

    pub fn on_follow(&self, follower_id: &str, followee_id: &str) {
        self.submit(SyncEvent::Followed {
            follower_id: follower_id.to_string(),
            followee_id: followee_id.to_string(),
        });
    }

    pub fn on_unfollow(&self, follower_id: &str, followee_id: &str) {
        self.submit(SyncEvent::Unfollowed {
            follower_id: follower_id.to_string(),
            followee_id: followee_id.to_string(),
        });
    }

    pub fn on_comment_added(&self, person_id: &str, post_id: &str) {
        self.submit(SyncEvent::CommentAdded {
            person_id: person_id.to_string(),
            post_id: post_id.to_string(),
        });
    }

    pub fn on_comment_removed(&self, person_id: &str, post_id: &str) {
        self.submit(SyncEvent::CommentRemoved {
            person_id: person_id.to_string(),
            post_id: post_id.to_string(),
        });
    }

    pub fn on_reply_added(&self, person_id: &str, post_id: &str) {
        self.submit(SyncEvent::ReplyAdded {
            person_id: person_id.to_string(),
            post_id: post_id.to_string(),
        });
    }

    pub fn on_reply_removed(&self, person_id: &str, post_id: &str) {
        self.submit(SyncEvent::ReplyRemoved {
            person_id: person_id.to_string(),
            post_id: post_id.to_string(),
        });
    }

    pub fn on_like_toggled(&self, person_id: &str, post_id: &str) {
        self.submit(SyncEvent::LikeToggled {
            person_id: person_id.to_string(),
            post_id: post_id.to_string(),
        });
    }

    pub fn on_dislike_toggled(&self, person_id: &str, post_id: &str) {
        self.submit(SyncEvent::DislikeToggled {
            person_id: person_id.to_string(),
            post_id: post_id.to_string(),
        });
    }

    pub fn on_shared(&self, sender_id: &str, post_id: &str) {
        self.submit(SyncEvent::Shared {
            sender_id: sender_id.to_string(),
            post_id: post_id.to_string(),
        });
    }

    /// Enqueue an event and drain inline. Never returns an error: the
    /// primary action already reported success to the user.
    fn submit(&self, event: SyncEvent) {
        let payload = match serde_json::to_value(&event) {
            Ok(payload) => payload,
            Err(e) => {
                error!("failed to serialize sync event: {e}");
                return;
            }
        };
        if let Err(e) = self.docs.outbox_enqueue(&payload) {
            error!("failed to enqueue sync event: {e}");
            return;
        }
        self.drain();
    }

    // ---------------------------------------------------------------
    // Outbox drain
    // ---------------------------------------------------------------

    /// Apply pending sync events, oldest first, up to the configured
    /// batch size. Failed events stay pending (with an attempt count)
    /// until they dead-letter.
    ///
    /// Passes are serialized: `outbox_pending` does not claim rows, so
    /// two overlapping passes would fetch and apply the same row twice.
    /// The engagement events are not idempotent, hence one pass at a
    /// time — a row is deleted before the next pass can read it.
    pub fn drain(&self) -> DrainReport {
        let _pass = self.drain_lock.lock();
        let mut report = DrainReport::default();
        let pending = match self.docs.outbox_pending(self.config.drain_batch) {
            Ok(pending) => pending,
            Err(e) => {
                error!("outbox read failed: {e}");
                return report;
            }
        };

        for entry in pending {
            let event: SyncEvent = match serde_json::from_value(entry.payload.clone()) {
                Ok(event) => event,
                Err(e) => {
                    self.note_failure(entry.id, &Error::Json(e));
                    report.failed += 1;
                    continue;
                }
            };

            let guard = event
                .engagement_pair()
                .map(|(person, post)| self.locks.pair(person, post));
            let _held = guard.as_ref().map(|lock| lock.lock());

            match apply_event(&self.graph, &self.docs, &event) {
                Ok(()) => {
                    if let Err(e) = self.docs.outbox_mark_applied(entry.id) {
                        error!("failed to clear applied outbox row {}: {e}", entry.id);
                    }
                    report.applied += 1;
                }
                Err(e) => {
                    self.note_failure(entry.id, &e);
                    report.failed += 1;
                }
            }
        }
        report
    }

    fn note_failure(&self, outbox_id: i64, error: &Error) {
        warn!(outbox_id, "sync event apply failed: {error}");
        if let Err(e) =
            self.docs
                .outbox_mark_failed(outbox_id, &error.to_string(), self.config.max_sync_attempts)
        {
            error!("failed to record outbox failure for row {outbox_id}: {e}");
        }
    }

    // ---------------------------------------------------------------
    // Read path
    // ---------------------------------------------------------------

    /// Ranked recommendations for a person, resolved against the
    /// primary store. `limit` defaults to the configured value.
    pub fn get_recommendations(
        &self,
        person_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Recommendation>> {
        let limit = limit.unwrap_or(self.config.recommend_limit);
        skillgraph_rank::recommend(&self.graph, &self.docs, person_id, limit)
    }
}
