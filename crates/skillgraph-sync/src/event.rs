//! Typed sync events and the apply dispatch.
//!
//! One `SyncEvent` is one graph-bound mutation, recorded in the
//! primary-store outbox and applied here. Applying an event twice is
//! safe for the mirror events (upserts/deletes) but not for the
//! engagement events, which carry toggle/counter semantics. The
//! outbox deletes a row only after a successful apply, runs drain
//! passes one at a time so overlapping passes cannot fetch the same
//! row, and serializes applies per engagement pair.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engage::Scorer;
use crate::mirror::Mirror;
use crate::promote::promote_interests;
use skillgraph_core::Result;
use skillgraph_docstore::DocStore;
use skillgraph_graph::{GraphStore, LikeState};

/// A pending graph mutation, mirroring one primary-store write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    PersonCreated {
        person_id: String,
        name: String,
        role: String,
        skills: Vec<String>,
        interests: Vec<String>,
    },
    PersonDeleted {
        person_id: String,
    },
    PostCreated {
        poster_id: String,
        post_id: String,
        title: String,
        required_tags: Vec<String>,
    },
    PostDeleted {
        post_id: String,
    },
    Followed {
        follower_id: String,
        followee_id: String,
    },
    Unfollowed {
        follower_id: String,
        followee_id: String,
    },
    CommentAdded {
        person_id: String,
        post_id: String,
    },
    CommentRemoved {
        person_id: String,
        post_id: String,
    },
    ReplyAdded {
        person_id: String,
        post_id: String,
    },
    ReplyRemoved {
        person_id: String,
        post_id: String,
    },
    LikeToggled {
        person_id: String,
        post_id: String,
    },
    DislikeToggled {
        person_id: String,
        post_id: String,
    },
    Shared {
        sender_id: String,
        post_id: String,
    },
}

impl SyncEvent {
    /// The (person, post) pair for events that need per-pair
    /// serialization at apply time.
    pub fn engagement_pair(&self) -> Option<(&str, &str)> {
        match self {
            SyncEvent::CommentAdded { person_id, post_id }
            | SyncEvent::CommentRemoved { person_id, post_id }
            | SyncEvent::ReplyAdded { person_id, post_id }
            | SyncEvent::ReplyRemoved { person_id, post_id }
            | SyncEvent::LikeToggled { person_id, post_id }
            | SyncEvent::DislikeToggled { person_id, post_id } => {
                Some((person_id.as_str(), post_id.as_str()))
            }
            _ => None,
        }
    }
}

/// Apply one event to the graph (and, for promotions, the primary
/// store). Errors mean "retry later"; they never unwind the primary
/// write that produced the event.
pub fn apply_event(graph: &GraphStore, docs: &DocStore, event: &SyncEvent) -> Result<()> {
    let mirror = Mirror::new(graph);
    let scorer = Scorer::new(graph);

    match event {
        SyncEvent::PersonCreated {
            person_id,
            name,
            role,
            skills,
            interests,
        } => mirror.person_created(person_id, name, role, skills, interests),
        SyncEvent::PersonDeleted { person_id } => mirror.person_deleted(person_id),
        SyncEvent::PostCreated {
            poster_id,
            post_id,
            title,
            required_tags,
        } => mirror.post_created(poster_id, post_id, title, required_tags),
        SyncEvent::PostDeleted { post_id } => mirror.post_deleted(post_id),
        SyncEvent::Followed {
            follower_id,
            followee_id,
        } => mirror.follow(follower_id, followee_id),
        SyncEvent::Unfollowed {
            follower_id,
            followee_id,
        } => mirror.unfollow(follower_id, followee_id),
        SyncEvent::CommentAdded { person_id, post_id }
        | SyncEvent::ReplyAdded { person_id, post_id } => {
            scorer.comment_added(person_id, post_id)?;
            promote_interests(graph, docs, person_id, post_id)?;
            Ok(())
        }
        SyncEvent::CommentRemoved { person_id, post_id }
        | SyncEvent::ReplyRemoved { person_id, post_id } => {
            scorer.comment_removed(person_id, post_id)?;
            Ok(())
        }
        SyncEvent::LikeToggled { person_id, post_id } => {
            let state = scorer.toggle_like(person_id, post_id)?;
            debug!(person_id, post_id, ?state, "like toggled");
            if state == LikeState::Liked {
                promote_interests(graph, docs, person_id, post_id)?;
            }
            Ok(())
        }
        SyncEvent::DislikeToggled { person_id, post_id } => {
            scorer.toggle_dislike(person_id, post_id)?;
            Ok(())
        }
        SyncEvent::Shared { sender_id, post_id } => scorer.share(sender_id, post_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillgraph_core::{ContentKind, RoleCategory, TagName};
    use skillgraph_docstore::{NewContent, NewUser};
    use skillgraph_graph::{EdgeKind, NodeLabel};
    use std::time::Duration;

    fn stores() -> (GraphStore, DocStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let graph = GraphStore::open(dir.path().join("graph"), Duration::from_millis(200)).unwrap();
        graph.ensure_constraints().unwrap();
        let docs = DocStore::open(dir.path().join("primary")).unwrap();
        (graph, docs, dir)
    }

    fn seed(graph: &GraphStore, docs: &DocStore) -> (String, String) {
        let person = docs
            .create_user(NewUser {
                name: "Asha".into(),
                email: "asha@example.com".into(),
                role: RoleCategory::Student,
                skills: vec!["rust".into()],
                interests: vec![],
            })
            .unwrap();
        let post = docs
            .create_content(NewContent {
                kind: ContentKind::Job,
                owner_id: person.clone(),
                title: "Rust role".into(),
                body: None,
                required_tags: vec!["rust".into(), "sql".into()],
            })
            .unwrap();
        let skills = [TagName::new("rust").unwrap()];
        graph
            .create_person(&person, "Asha", "student", &skills, &[])
            .unwrap();
        graph
            .create_post(&person, &post, "Rust role", &TagName::normalize_all(&["rust".into(), "sql".into()]))
            .unwrap();
        (person, post)
    }

    #[test]
    fn test_event_json_roundtrip() {
        let event = SyncEvent::LikeToggled {
            person_id: "u1".into(),
            post_id: "p1".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "like_toggled");
        let back: SyncEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_engagement_pair() {
        let event = SyncEvent::CommentAdded {
            person_id: "u1".into(),
            post_id: "p1".into(),
        };
        assert_eq!(event.engagement_pair(), Some(("u1", "p1")));
        assert!(SyncEvent::PostDeleted { post_id: "p1".into() }
            .engagement_pair()
            .is_none());
    }

    #[test]
    fn test_apply_comment_promotes() {
        let (graph, docs, _dir) = stores();
        let (person, post) = seed(&graph, &docs);

        apply_event(
            &graph,
            &docs,
            &SyncEvent::CommentAdded {
                person_id: person.clone(),
                post_id: post.clone(),
            },
        )
        .unwrap();

        assert_eq!(graph.comment_count(&person, &post).unwrap(), Some(1));
        // rust was held, so it got the increment; sql got promoted.
        assert_eq!(graph.tag_score(&person, EdgeKind::HasSkill, "rust").unwrap(), Some(1));
        assert_eq!(graph.tag_score(&person, EdgeKind::InterestedIn, "sql").unwrap(), Some(0));
        assert_eq!(docs.get_user(&person).unwrap().unwrap().interests, vec!["sql"]);
    }

    #[test]
    fn test_apply_like_promotes_only_on_enter() {
        let (graph, docs, _dir) = stores();
        let (person, post) = seed(&graph, &docs);
        let like = SyncEvent::LikeToggled {
            person_id: person.clone(),
            post_id: post.clone(),
        };

        apply_event(&graph, &docs, &like).unwrap();
        assert_eq!(docs.get_user(&person).unwrap().unwrap().interests, vec!["sql"]);

        // Unliking does not demote.
        apply_event(&graph, &docs, &like).unwrap();
        assert_eq!(docs.get_user(&person).unwrap().unwrap().interests, vec!["sql"]);
        assert_eq!(graph.tag_score(&person, EdgeKind::HasSkill, "rust").unwrap(), Some(0));
    }

    #[test]
    fn test_apply_person_deleted_detaches() {
        let (graph, docs, _dir) = stores();
        let (person, post) = seed(&graph, &docs);
        apply_event(
            &graph,
            &docs,
            &SyncEvent::CommentAdded {
                person_id: person.clone(),
                post_id: post.clone(),
            },
        )
        .unwrap();

        apply_event(&graph, &docs, &SyncEvent::PersonDeleted { person_id: person.clone() }).unwrap();
        assert!(!graph.node_exists(NodeLabel::Person, &person).unwrap());
        assert_eq!(graph.comment_count(&person, &post).unwrap(), None);
    }

    #[test]
    fn test_apply_engagement_on_missing_node_errors() {
        let (graph, docs, _dir) = stores();
        let err = apply_event(
            &graph,
            &docs,
            &SyncEvent::CommentAdded {
                person_id: "ghost".into(),
                post_id: "nowhere".into(),
            },
        );
        assert!(err.is_err());
    }
}
