//! Engagement Scorer — comments, replies, likes, dislikes, shares.
//!
//! Replies are comments for engagement accounting: each add/remove is
//! one tick of the `commented_on` reference count and one application
//! (or reversal) of the common-tag score rule.

use tracing::debug;

use skillgraph_core::Result;
use skillgraph_graph::{GraphStore, LikeState};

/// Applies engagement events to the graph's scored edges.
pub struct Scorer<'a> {
    graph: &'a GraphStore,
}

impl<'a> Scorer<'a> {
    pub fn new(graph: &'a GraphStore) -> Self {
        Self { graph }
    }

    /// One comment or reply added. Returns the new reference count.
    pub fn comment_added(&self, person_id: &str, post_id: &str) -> Result<u32> {
        let count = self.graph.comment_added(person_id, post_id)?;
        debug!(person_id, post_id, count, "comment engagement recorded");
        Ok(count)
    }

    /// One comment or reply removed. Returns the remaining count, if
    /// the edge survived.
    pub fn comment_removed(&self, person_id: &str, post_id: &str) -> Result<Option<u32>> {
        self.graph.comment_removed(person_id, post_id)
    }

    /// Toggle the like relation; returns the resulting state.
    pub fn toggle_like(&self, person_id: &str, post_id: &str) -> Result<LikeState> {
        self.graph.toggle_like(person_id, post_id)
    }

    /// Toggle the dislike relation; returns the resulting state.
    pub fn toggle_dislike(&self, person_id: &str, post_id: &str) -> Result<LikeState> {
        self.graph.toggle_dislike(person_id, post_id)
    }

    /// Record a share. The follower-relationship precondition between
    /// sender and recipient is checked by the caller against the
    /// primary store before this is invoked.
    pub fn share(&self, sender_id: &str, post_id: &str) -> Result<()> {
        self.graph.record_share(sender_id, post_id)
    }
}
