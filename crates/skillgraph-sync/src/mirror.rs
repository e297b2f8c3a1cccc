//! Entity Mirror — primary-store lifecycle events → graph nodes/edges.
//!
//! Every operation here is invoked after the corresponding primary
//! write has already succeeded; nothing is rolled back on graph
//! failure. Follow/unfollow preconditions (not-self, not-duplicate)
//! are checked by the caller against the primary store, not here.

use tracing::debug;

use skillgraph_core::{Result, TagName};
use skillgraph_graph::GraphStore;

/// Mirrors entity lifecycle into the graph store.
pub struct Mirror<'a> {
    graph: &'a GraphStore,
}

impl<'a> Mirror<'a> {
    pub fn new(graph: &'a GraphStore) -> Self {
        Self { graph }
    }

    /// Mirror user registration: person node plus profile skill and
    /// interest edges at score 0. Existing edge scores are untouched.
    pub fn person_created(
        &self,
        person_id: &str,
        name: &str,
        role: &str,
        skills: &[String],
        interests: &[String],
    ) -> Result<()> {
        // Defensive: node-creating mutation, constraints may be missing.
        self.graph.ensure_constraints()?;
        let skills = TagName::normalize_all(skills);
        let interests = TagName::normalize_all(interests);
        self.graph
            .create_person(person_id, name, role, &skills, &interests)
    }

    /// Detach-delete the person node.
    pub fn person_deleted(&self, person_id: &str) -> Result<()> {
        self.graph.delete_person(person_id)
    }

    /// Mirror content creation: post node, `requires` tag edges and the
    /// authorship edge, one unit of work.
    pub fn post_created(
        &self,
        poster_id: &str,
        post_id: &str,
        title: &str,
        required_tags: &[String],
    ) -> Result<()> {
        self.graph.ensure_constraints()?;
        let required = TagName::normalize_all(required_tags);
        self.graph.create_post(poster_id, post_id, title, &required)
    }

    /// Detach-delete the post node.
    pub fn post_deleted(&self, post_id: &str) -> Result<()> {
        self.graph.delete_post(post_id)
    }

    pub fn follow(&self, follower_id: &str, followee_id: &str) -> Result<()> {
        debug!(follower_id, followee_id, "mirroring follow");
        self.graph.follow(follower_id, followee_id)
    }

    pub fn unfollow(&self, follower_id: &str, followee_id: &str) -> Result<()> {
        self.graph.unfollow(follower_id, followee_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillgraph_graph::NodeLabel;
    use std::time::Duration;

    fn test_graph() -> (GraphStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let graph = GraphStore::open(dir.path(), Duration::from_millis(200)).unwrap();
        graph.ensure_constraints().unwrap();
        (graph, dir)
    }

    #[test]
    fn test_person_mirror_normalizes_tags() {
        let (graph, _dir) = test_graph();
        let mirror = Mirror::new(&graph);
        mirror
            .person_created(
                "u1",
                "Asha",
                "student",
                &[" Rust ".into(), "GO".into(), "rust".into()],
                &["ML".into()],
            )
            .unwrap();

        assert!(graph.node_exists(NodeLabel::Tag, "rust").unwrap());
        assert!(graph.node_exists(NodeLabel::Tag, "go").unwrap());
        let profile = graph.tag_profile("u1").unwrap();
        assert_eq!(profile.skills, vec!["rust", "go"]);
        assert_eq!(profile.interests, vec!["ml"]);
    }

    #[test]
    fn test_post_mirror_without_constraints_bootstraps() {
        let dir = tempfile::tempdir().unwrap();
        let graph = GraphStore::open(dir.path(), Duration::from_millis(200)).unwrap();
        // No explicit ensure_constraints; the mirror applies them.
        let mirror = Mirror::new(&graph);
        mirror
            .person_created("u1", "Asha", "student", &[], &[])
            .unwrap();
        mirror
            .post_created("u1", "p1", "A post", &["rust".into()])
            .unwrap();
        assert!(graph.node_exists(NodeLabel::Post, "p1").unwrap());
    }
}
