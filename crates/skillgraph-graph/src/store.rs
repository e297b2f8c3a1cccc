//! Typed graph operations over the pooled SQLite backend.
//!
//! Each public method is one logical unit of work: it checks out one
//! session, runs a fixed set of prepared statements (inside a
//! transaction where the operation is multi-statement), and releases
//! the session on every path. There is no string-composed query
//! anywhere; the operation set below is the whole query surface.
//!
//! Missing endpoint nodes surface as [`Error::Graph`] so the caller's
//! retry machinery can reorder around divergence instead of silently
//! dropping the mutation.

use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::pool::GraphPool;
use crate::schema::SCHEMA_SQL;
use crate::types::{EdgeKind, LikeState, NodeLabel, PostTags, TagProfile};
use skillgraph_core::types::Decrement;
use skillgraph_core::{Error, RefCount, Result, TagName};

fn db(e: rusqlite::Error) -> Error {
    Error::Graph(e.to_string())
}

/// The property-graph index: person, post and tag nodes plus scored
/// relationship edges.
pub struct GraphStore {
    pool: GraphPool,
}

impl GraphStore {
    /// Open the graph store under `db_dir`. Constraints are not applied
    /// here; call [`GraphStore::ensure_constraints`] at startup.
    pub fn open(db_dir: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let pool = GraphPool::open(db_dir, busy_timeout)?;
        Ok(Self { pool })
    }

    /// Apply the schema and uniqueness constraints. Idempotent; safe to
    /// invoke repeatedly and after node-creating mutations.
    pub fn ensure_constraints(&self) -> Result<()> {
        let session = self.pool.acquire()?;
        session.execute_batch(SCHEMA_SQL).map_err(db)?;
        debug!("graph constraints ensured");
        Ok(())
    }

    // ---------------------------------------------------------------
    // Entity mirror operations
    // ---------------------------------------------------------------

    /// Create (or refresh) a person node with profile skill and interest
    /// edges. Profile edges start at score 0 and an existing edge's
    /// score is never reset.
    pub fn create_person(
        &self,
        person_id: &str,
        name: &str,
        role: &str,
        skills: &[TagName],
        interests: &[TagName],
    ) -> Result<()> {
        let mut session = self.pool.acquire()?;
        let tx = session.transaction().map_err(db)?;

        tx.prepare_cached(
            "INSERT INTO nodes (label, ext_id, name, role) VALUES ('person', ?1, ?2, ?3)
             ON CONFLICT(label, ext_id) DO UPDATE SET name = excluded.name, role = excluded.role",
        )
        .map_err(db)?
        .execute(params![person_id, name, role])
        .map_err(db)?;

        let person = node_id(&tx, NodeLabel::Person, person_id)?
            .ok_or_else(|| Error::Graph(format!("person node vanished: {person_id}")))?;

        for tag in skills {
            let t = upsert_tag(&tx, tag)?;
            link_scored(&tx, EdgeKind::HasSkill, person, t, 0)?;
        }
        for tag in interests {
            let t = upsert_tag(&tx, tag)?;
            link_scored(&tx, EdgeKind::InterestedIn, person, t, 0)?;
        }

        tx.commit().map_err(db)?;
        info!(person_id, "mirrored person into graph");
        Ok(())
    }

    /// Detach-delete a person node and every incident edge.
    pub fn delete_person(&self, person_id: &str) -> Result<()> {
        self.delete_node(NodeLabel::Person, person_id)
    }

    /// Create a post node, its required-tag edges and the authorship
    /// edge, as one transaction. The poster node must already exist.
    pub fn create_post(
        &self,
        poster_id: &str,
        post_id: &str,
        title: &str,
        required: &[TagName],
    ) -> Result<()> {
        let mut session = self.pool.acquire()?;
        let tx = session.transaction().map_err(db)?;

        let poster = node_id(&tx, NodeLabel::Person, poster_id)?
            .ok_or_else(|| Error::Graph(format!("poster node missing: {poster_id}")))?;

        tx.prepare_cached(
            "INSERT INTO nodes (label, ext_id, name) VALUES ('post', ?1, ?2)
             ON CONFLICT(label, ext_id) DO UPDATE SET name = excluded.name",
        )
        .map_err(db)?
        .execute(params![post_id, title])
        .map_err(db)?;

        let post = node_id(&tx, NodeLabel::Post, post_id)?
            .ok_or_else(|| Error::Graph(format!("post node vanished: {post_id}")))?;

        for tag in required {
            let t = upsert_tag(&tx, tag)?;
            link_scored(&tx, EdgeKind::Requires, post, t, 0)?;
        }
        link_scored(&tx, EdgeKind::Created, poster, post, 0)?;

        tx.commit().map_err(db)?;
        info!(post_id, "mirrored post into graph");
        Ok(())
    }

    /// Detach-delete a post node and every incident edge.
    pub fn delete_post(&self, post_id: &str) -> Result<()> {
        self.delete_node(NodeLabel::Post, post_id)
    }

    /// Create a `following` edge. Self-follow and duplicate checks are
    /// the caller's responsibility against the primary store.
    pub fn follow(&self, follower_id: &str, followee_id: &str) -> Result<()> {
        let session = self.pool.acquire()?;
        let follower = require_node(&session, NodeLabel::Person, follower_id)?;
        let followee = require_node(&session, NodeLabel::Person, followee_id)?;
        link_scored(&session, EdgeKind::Following, follower, followee, 0)?;
        Ok(())
    }

    /// Delete the `following` edge, if present.
    pub fn unfollow(&self, follower_id: &str, followee_id: &str) -> Result<()> {
        let session = self.pool.acquire()?;
        session
            .prepare_cached(
                "DELETE FROM edges WHERE kind = 'following'
                 AND src = (SELECT id FROM nodes WHERE label = 'person' AND ext_id = ?1)
                 AND dst = (SELECT id FROM nodes WHERE label = 'person' AND ext_id = ?2)",
            )
            .map_err(db)?
            .execute(params![follower_id, followee_id])
            .map_err(db)?;
        Ok(())
    }

    fn delete_node(&self, label: NodeLabel, ext_id: &str) -> Result<()> {
        let session = self.pool.acquire()?;
        let n = session
            .prepare_cached("DELETE FROM nodes WHERE label = ?1 AND ext_id = ?2")
            .map_err(db)?
            .execute(params![label.as_str(), ext_id])
            .map_err(db)?;
        debug!(label = label.as_str(), ext_id, deleted = n, "detach-deleted node");
        Ok(())
    }

    // ---------------------------------------------------------------
    // Engagement scoring
    // ---------------------------------------------------------------

    /// Register one comment (or reply) by `person_id` on `post_id`.
    /// Creates the `commented_on` edge at count 1 or increments it, and
    /// bumps the person's affinity score on every tag the post requires
    /// that the person already holds. Returns the new count.
    pub fn comment_added(&self, person_id: &str, post_id: &str) -> Result<u32> {
        let mut session = self.pool.acquire()?;
        let tx = session.transaction().map_err(db)?;
        let person = require_node(&tx, NodeLabel::Person, person_id)?;
        let post = require_node(&tx, NodeLabel::Post, post_id)?;

        let count = match comment_count_ids(&tx, person, post)? {
            None => {
                tx.prepare_cached(
                    "INSERT INTO edges (kind, src, dst, score) VALUES ('commented_on', ?1, ?2, 1)",
                )
                .map_err(db)?
                .execute(params![person, post])
                .map_err(db)?;
                RefCount::one()
            }
            Some(existing) => {
                let next = existing.incremented();
                set_comment_count(&tx, person, post, next)?;
                next
            }
        };

        // Every comment is its own positive signal, first or not.
        raise_common_scores(&tx, person, post)?;
        tx.commit().map_err(db)?;
        Ok(count.get())
    }

    /// Reverse one comment (or reply) by `person_id` on `post_id`.
    /// Deletes the edge when this was the last counted comment,
    /// otherwise decrements; either way the matching affinity scores
    /// are lowered once, saturating at zero. Returns the remaining
    /// count, `None` when the edge was removed or never existed.
    pub fn comment_removed(&self, person_id: &str, post_id: &str) -> Result<Option<u32>> {
        let mut session = self.pool.acquire()?;
        let tx = session.transaction().map_err(db)?;
        let person = require_node(&tx, NodeLabel::Person, person_id)?;
        let post = require_node(&tx, NodeLabel::Post, post_id)?;

        let Some(count) = comment_count_ids(&tx, person, post)? else {
            // Nothing to reverse; net count never went positive.
            return Ok(None);
        };

        let remaining = match count.decremented() {
            Decrement::Drop => {
                tx.prepare_cached(
                    "DELETE FROM edges WHERE kind = 'commented_on' AND src = ?1 AND dst = ?2",
                )
                .map_err(db)?
                .execute(params![person, post])
                .map_err(db)?;
                None
            }
            Decrement::Keep(next) => {
                set_comment_count(&tx, person, post, next)?;
                Some(next.get())
            }
        };

        lower_common_scores(&tx, person, post)?;
        tx.commit().map_err(db)?;
        Ok(remaining)
    }

    /// Toggle the like relation. `liked → none` reverses the like's
    /// score increments; `none`/`disliked → liked` clears any dislike
    /// edge and applies the increments. Returns the new state.
    pub fn toggle_like(&self, person_id: &str, post_id: &str) -> Result<LikeState> {
        let mut session = self.pool.acquire()?;
        let tx = session.transaction().map_err(db)?;
        let person = require_node(&tx, NodeLabel::Person, person_id)?;
        let post = require_node(&tx, NodeLabel::Post, post_id)?;

        let next = match reaction_state_ids(&tx, person, post)? {
            LikeState::Liked => {
                delete_reaction(&tx, EdgeKind::Likes, person, post)?;
                lower_common_scores(&tx, person, post)?;
                LikeState::None
            }
            state => {
                if state == LikeState::Disliked {
                    delete_reaction(&tx, EdgeKind::Dislikes, person, post)?;
                }
                link_scored(&tx, EdgeKind::Likes, person, post, 0)?;
                raise_common_scores(&tx, person, post)?;
                LikeState::Liked
            }
        };

        tx.commit().map_err(db)?;
        Ok(next)
    }

    /// Toggle the dislike relation. Dislike edges carry no score
    /// deltas, but displacing a `liked` state reverses the like's
    /// increments. Returns the new state.
    pub fn toggle_dislike(&self, person_id: &str, post_id: &str) -> Result<LikeState> {
        let mut session = self.pool.acquire()?;
        let tx = session.transaction().map_err(db)?;
        let person = require_node(&tx, NodeLabel::Person, person_id)?;
        let post = require_node(&tx, NodeLabel::Post, post_id)?;

        let next = match reaction_state_ids(&tx, person, post)? {
            LikeState::Disliked => {
                delete_reaction(&tx, EdgeKind::Dislikes, person, post)?;
                LikeState::None
            }
            state => {
                if state == LikeState::Liked {
                    delete_reaction(&tx, EdgeKind::Likes, person, post)?;
                    lower_common_scores(&tx, person, post)?;
                }
                link_scored(&tx, EdgeKind::Dislikes, person, post, 0)?;
                LikeState::Disliked
            }
        };

        tx.commit().map_err(db)?;
        Ok(next)
    }

    /// Append one `shared` edge. Never deduplicated; no scoring.
    pub fn record_share(&self, sender_id: &str, post_id: &str) -> Result<()> {
        let session = self.pool.acquire()?;
        let sender = require_node(&session, NodeLabel::Person, sender_id)?;
        let post = require_node(&session, NodeLabel::Post, post_id)?;
        session
            .prepare_cached("INSERT INTO edges (kind, src, dst, score) VALUES ('shared', ?1, ?2, 0)")
            .map_err(db)?
            .execute(params![sender, post])
            .map_err(db)?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Interest promotion
    // ---------------------------------------------------------------

    /// Tags the post requires that the person holds via neither scored
    /// relation, in store order.
    pub fn missing_required_tags(&self, person_id: &str, post_id: &str) -> Result<Vec<String>> {
        let session = self.pool.acquire()?;
        let mut stmt = session
            .prepare_cached(
                "SELECT t.ext_id FROM edges r
                 JOIN nodes p ON p.id = r.src
                 JOIN nodes t ON t.id = r.dst
                 WHERE r.kind = 'requires' AND p.label = 'post' AND p.ext_id = ?2
                 AND NOT EXISTS (
                     SELECT 1 FROM edges h
                     JOIN nodes u ON u.id = h.src
                     WHERE u.label = 'person' AND u.ext_id = ?1
                       AND h.kind IN ('has_skill', 'interested_in')
                       AND h.dst = t.id)
                 ORDER BY r.id",
            )
            .map_err(db)?;
        let rows = stmt
            .query_map(params![person_id, post_id], |row| row.get::<_, String>(0))
            .map_err(db)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db)?;
        Ok(rows)
    }

    /// Create an `interested_in` edge at baseline score 0 (no-op when
    /// the edge already exists).
    pub fn add_interest(&self, person_id: &str, tag: &TagName) -> Result<()> {
        let session = self.pool.acquire()?;
        let person = require_node(&session, NodeLabel::Person, person_id)?;
        let t = upsert_tag(&session, tag)?;
        link_scored(&session, EdgeKind::InterestedIn, person, t, 0)?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Ranking reads
    // ---------------------------------------------------------------

    /// The person's skill and interest tag names, from scored edges.
    pub fn tag_profile(&self, person_id: &str) -> Result<TagProfile> {
        let session = self.pool.acquire()?;
        let mut stmt = session
            .prepare_cached(
                "SELECT t.ext_id, e.kind FROM edges e
                 JOIN nodes u ON u.id = e.src
                 JOIN nodes t ON t.id = e.dst
                 WHERE u.label = 'person' AND u.ext_id = ?1
                   AND e.kind IN ('has_skill', 'interested_in')
                 ORDER BY e.id",
            )
            .map_err(db)?;
        let mut profile = TagProfile::default();
        let rows = stmt
            .query_map(params![person_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(db)?;
        for row in rows {
            let (tag, kind) = row.map_err(db)?;
            if kind == EdgeKind::HasSkill.as_str() {
                profile.skills.push(tag);
            } else {
                profile.interests.push(tag);
            }
        }
        Ok(profile)
    }

    /// Every post node with its required tags, in store iteration order.
    pub fn candidate_posts(&self) -> Result<Vec<PostTags>> {
        let session = self.pool.acquire()?;
        let mut stmt = session
            .prepare_cached(
                "SELECT p.ext_id, t.ext_id FROM nodes p
                 LEFT JOIN edges e ON e.src = p.id AND e.kind = 'requires'
                 LEFT JOIN nodes t ON t.id = e.dst
                 WHERE p.label = 'post'
                 ORDER BY p.id, e.id",
            )
            .map_err(db)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })
            .map_err(db)?;

        let mut posts: Vec<PostTags> = Vec::new();
        for row in rows {
            let (post_id, tag) = row.map_err(db)?;
            if posts.last().map(|p| p.post_id.as_str()) != Some(post_id.as_str()) {
                posts.push(PostTags {
                    post_id,
                    required: Vec::new(),
                });
            }
            if let (Some(tag), Some(last)) = (tag, posts.last_mut()) {
                last.required.push(tag);
            }
        }
        Ok(posts)
    }

    /// Posts the person currently likes.
    pub fn liked_posts(&self, person_id: &str) -> Result<Vec<String>> {
        let session = self.pool.acquire()?;
        let mut stmt = session
            .prepare_cached(
                "SELECT p.ext_id FROM edges e
                 JOIN nodes u ON u.id = e.src
                 JOIN nodes p ON p.id = e.dst
                 WHERE e.kind = 'likes' AND u.label = 'person' AND u.ext_id = ?1",
            )
            .map_err(db)?;
        let rows = stmt
            .query_map(params![person_id], |row| row.get::<_, String>(0))
            .map_err(db)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db)?;
        Ok(rows)
    }

    // ---------------------------------------------------------------
    // Inspection (used by callers and tests)
    // ---------------------------------------------------------------

    /// Whether a node exists.
    pub fn node_exists(&self, label: NodeLabel, ext_id: &str) -> Result<bool> {
        let session = self.pool.acquire()?;
        Ok(node_id(&session, label, ext_id)?.is_some())
    }

    /// Current like/dislike state for the pair.
    pub fn reaction_state(&self, person_id: &str, post_id: &str) -> Result<LikeState> {
        let session = self.pool.acquire()?;
        let (Some(person), Some(post)) = (
            node_id(&session, NodeLabel::Person, person_id)?,
            node_id(&session, NodeLabel::Post, post_id)?,
        ) else {
            return Ok(LikeState::None);
        };
        reaction_state_ids(&session, person, post)
    }

    /// Current `commented_on` count, `None` when no edge exists.
    pub fn comment_count(&self, person_id: &str, post_id: &str) -> Result<Option<u32>> {
        let session = self.pool.acquire()?;
        let (Some(person), Some(post)) = (
            node_id(&session, NodeLabel::Person, person_id)?,
            node_id(&session, NodeLabel::Post, post_id)?,
        ) else {
            return Ok(None);
        };
        Ok(comment_count_ids(&session, person, post)?.map(|c| c.get()))
    }

    /// Affinity score on one scored person→tag edge.
    pub fn tag_score(&self, person_id: &str, kind: EdgeKind, tag: &str) -> Result<Option<u32>> {
        let session = self.pool.acquire()?;
        let score: Option<i64> = session
            .prepare_cached(
                "SELECT e.score FROM edges e
                 JOIN nodes u ON u.id = e.src
                 JOIN nodes t ON t.id = e.dst
                 WHERE e.kind = ?1 AND u.label = 'person' AND u.ext_id = ?2
                   AND t.label = 'tag' AND t.ext_id = ?3",
            )
            .map_err(db)?
            .query_row(params![kind.as_str(), person_id, tag], |row| row.get(0))
            .optional()
            .map_err(db)?;
        Ok(score.map(|s| s.max(0) as u32))
    }

    /// Number of `shared` edges for the pair (append-only, so this can
    /// exceed one).
    pub fn share_count(&self, person_id: &str, post_id: &str) -> Result<u32> {
        let session = self.pool.acquire()?;
        let n: i64 = session
            .prepare_cached(
                "SELECT COUNT(*) FROM edges e
                 JOIN nodes u ON u.id = e.src
                 JOIN nodes p ON p.id = e.dst
                 WHERE e.kind = 'shared' AND u.ext_id = ?1 AND p.ext_id = ?2",
            )
            .map_err(db)?
            .query_row(params![person_id, post_id], |row| row.get(0))
            .map_err(db)?;
        Ok(n as u32)
    }

    /// Whether `follower` has a `following` edge to `followee`.
    pub fn is_following(&self, follower_id: &str, followee_id: &str) -> Result<bool> {
        let session = self.pool.acquire()?;
        let n: i64 = session
            .prepare_cached(
                "SELECT COUNT(*) FROM edges e
                 JOIN nodes a ON a.id = e.src
                 JOIN nodes b ON b.id = e.dst
                 WHERE e.kind = 'following' AND a.ext_id = ?1 AND b.ext_id = ?2",
            )
            .map_err(db)?
            .query_row(params![follower_id, followee_id], |row| row.get(0))
            .map_err(db)?;
        Ok(n > 0)
    }
}

// -------------------------------------------------------------------
// Statement helpers, shared by sessions and transactions
// -------------------------------------------------------------------

fn node_id(conn: &Connection, label: NodeLabel, ext_id: &str) -> Result<Option<i64>> {
    conn.prepare_cached("SELECT id FROM nodes WHERE label = ?1 AND ext_id = ?2")
        .map_err(db)?
        .query_row(params![label.as_str(), ext_id], |row| row.get(0))
        .optional()
        .map_err(db)
}

fn require_node(conn: &Connection, label: NodeLabel, ext_id: &str) -> Result<i64> {
    node_id(conn, label, ext_id)?
        .ok_or_else(|| Error::Graph(format!("{} node missing: {ext_id}", label.as_str())))
}

fn upsert_tag(conn: &Connection, tag: &TagName) -> Result<i64> {
    conn.prepare_cached(
        "INSERT INTO nodes (label, ext_id, name) VALUES ('tag', ?1, ?1)
         ON CONFLICT(label, ext_id) DO NOTHING",
    )
    .map_err(db)?
    .execute(params![tag.as_str()])
    .map_err(db)?;
    require_node(conn, NodeLabel::Tag, tag.as_str())
}

/// Insert an edge unless the (kind, src, dst) pair already exists.
/// Existing edges keep their score.
fn link_scored(conn: &Connection, kind: EdgeKind, src: i64, dst: i64, score: u32) -> Result<()> {
    conn.prepare_cached(
        "INSERT OR IGNORE INTO edges (kind, src, dst, score) VALUES (?1, ?2, ?3, ?4)",
    )
    .map_err(db)?
    .execute(params![kind.as_str(), src, dst, score])
    .map_err(db)?;
    Ok(())
}

fn delete_reaction(conn: &Connection, kind: EdgeKind, person: i64, post: i64) -> Result<()> {
    conn.prepare_cached("DELETE FROM edges WHERE kind = ?1 AND src = ?2 AND dst = ?3")
        .map_err(db)?
        .execute(params![kind.as_str(), person, post])
        .map_err(db)?;
    Ok(())
}

fn reaction_state_ids(conn: &Connection, person: i64, post: i64) -> Result<LikeState> {
    let kind: Option<String> = conn
        .prepare_cached(
            "SELECT kind FROM edges
             WHERE src = ?1 AND dst = ?2 AND kind IN ('likes', 'dislikes')",
        )
        .map_err(db)?
        .query_row(params![person, post], |row| row.get(0))
        .optional()
        .map_err(db)?;
    Ok(match kind.as_deref() {
        Some("likes") => LikeState::Liked,
        Some("dislikes") => LikeState::Disliked,
        _ => LikeState::None,
    })
}

fn comment_count_ids(conn: &Connection, person: i64, post: i64) -> Result<Option<RefCount>> {
    let score: Option<i64> = conn
        .prepare_cached("SELECT score FROM edges WHERE kind = 'commented_on' AND src = ?1 AND dst = ?2")
        .map_err(db)?
        .query_row(params![person, post], |row| row.get(0))
        .optional()
        .map_err(db)?;
    Ok(score.map(RefCount::from_stored))
}

fn set_comment_count(conn: &Connection, person: i64, post: i64, count: RefCount) -> Result<()> {
    conn.prepare_cached(
        "UPDATE edges SET score = ?3 WHERE kind = 'commented_on' AND src = ?1 AND dst = ?2",
    )
    .map_err(db)?
    .execute(params![person, post, count.get()])
    .map_err(db)?;
    Ok(())
}

/// +1 on every scored person→tag edge whose tag the post requires.
fn raise_common_scores(conn: &Connection, person: i64, post: i64) -> Result<usize> {
    conn.prepare_cached(
        "UPDATE edges SET score = score + 1
         WHERE kind IN ('has_skill', 'interested_in') AND src = ?1
           AND dst IN (SELECT dst FROM edges WHERE kind = 'requires' AND src = ?2)",
    )
    .map_err(db)?
    .execute(params![person, post])
    .map_err(db)
}

/// -1, floored at zero, on the same edge set as [`raise_common_scores`].
fn lower_common_scores(conn: &Connection, person: i64, post: i64) -> Result<usize> {
    conn.prepare_cached(
        "UPDATE edges SET score = MAX(score - 1, 0)
         WHERE kind IN ('has_skill', 'interested_in') AND src = ?1
           AND dst IN (SELECT dst FROM edges WHERE kind = 'requires' AND src = ?2)",
    )
    .map_err(db)?
    .execute(params![person, post])
    .map_err(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(names: &[&str]) -> Vec<TagName> {
        names.iter().map(|n| TagName::new(n).unwrap()).collect()
    }

    fn test_store() -> (GraphStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = GraphStore::open(dir.path(), Duration::from_millis(200)).unwrap();
        store.ensure_constraints().unwrap();
        (store, dir)
    }

    fn seed_pair(store: &GraphStore) {
        store
            .create_person("u1", "Asha", "student", &tags(&["go", "rust"]), &tags(&["ml"]))
            .unwrap();
        store
            .create_person("u2", "Bora", "mentor", &tags(&[]), &tags(&[]))
            .unwrap();
        store
            .create_post("u2", "p1", "Rust backend role", &tags(&["rust", "sql"]))
            .unwrap();
    }

    #[test]
    fn test_constraints_idempotent() {
        let (store, _dir) = test_store();
        store.ensure_constraints().unwrap();
        store.ensure_constraints().unwrap();
    }

    #[test]
    fn test_person_upsert_keeps_scores() {
        let (store, _dir) = test_store();
        seed_pair(&store);
        store.toggle_like("u1", "p1").unwrap();
        assert_eq!(store.tag_score("u1", EdgeKind::HasSkill, "rust").unwrap(), Some(1));

        // Re-mirroring the person must not reset engagement scores.
        store
            .create_person("u1", "Asha A.", "student", &tags(&["go", "rust"]), &tags(&["ml"]))
            .unwrap();
        assert_eq!(store.tag_score("u1", EdgeKind::HasSkill, "rust").unwrap(), Some(1));
    }

    #[test]
    fn test_post_creation_links() {
        let (store, _dir) = test_store();
        seed_pair(&store);
        assert!(store.node_exists(NodeLabel::Post, "p1").unwrap());
        assert!(store.node_exists(NodeLabel::Tag, "sql").unwrap());
        let posts = store.candidate_posts().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].required, vec!["rust", "sql"]);
    }

    #[test]
    fn test_post_creation_requires_poster() {
        let (store, _dir) = test_store();
        let err = store.create_post("ghost", "p9", "orphan", &tags(&["go"]));
        assert!(err.is_err());
        assert!(!store.node_exists(NodeLabel::Post, "p9").unwrap());
    }

    #[test]
    fn test_comment_refcount_lifecycle() {
        let (store, _dir) = test_store();
        seed_pair(&store);

        assert_eq!(store.comment_added("u1", "p1").unwrap(), 1);
        assert_eq!(store.comment_added("u1", "p1").unwrap(), 2);
        assert_eq!(store.tag_score("u1", EdgeKind::HasSkill, "rust").unwrap(), Some(2));

        assert_eq!(store.comment_removed("u1", "p1").unwrap(), Some(1));
        assert_eq!(store.tag_score("u1", EdgeKind::HasSkill, "rust").unwrap(), Some(1));

        // Last removal deletes the edge rather than leaving count 0.
        assert_eq!(store.comment_removed("u1", "p1").unwrap(), None);
        assert_eq!(store.comment_count("u1", "p1").unwrap(), None);
        assert_eq!(store.tag_score("u1", EdgeKind::HasSkill, "rust").unwrap(), Some(0));

        // Removing with no edge is a no-op.
        assert_eq!(store.comment_removed("u1", "p1").unwrap(), None);
        assert_eq!(store.tag_score("u1", EdgeKind::HasSkill, "rust").unwrap(), Some(0));
    }

    #[test]
    fn test_like_toggle_involution() {
        let (store, _dir) = test_store();
        seed_pair(&store);

        assert_eq!(store.toggle_like("u1", "p1").unwrap(), LikeState::Liked);
        assert_eq!(store.tag_score("u1", EdgeKind::HasSkill, "rust").unwrap(), Some(1));

        assert_eq!(store.toggle_like("u1", "p1").unwrap(), LikeState::None);
        assert_eq!(store.tag_score("u1", EdgeKind::HasSkill, "rust").unwrap(), Some(0));
    }

    #[test]
    fn test_like_then_dislike_is_disliked() {
        let (store, _dir) = test_store();
        seed_pair(&store);

        store.toggle_like("u1", "p1").unwrap();
        assert_eq!(store.toggle_dislike("u1", "p1").unwrap(), LikeState::Disliked);
        assert_eq!(store.reaction_state("u1", "p1").unwrap(), LikeState::Disliked);
        // Displacing the like reversed its increment.
        assert_eq!(store.tag_score("u1", EdgeKind::HasSkill, "rust").unwrap(), Some(0));

        // Dislike toggles off with no score effect.
        assert_eq!(store.toggle_dislike("u1", "p1").unwrap(), LikeState::None);
        assert_eq!(store.tag_score("u1", EdgeKind::HasSkill, "rust").unwrap(), Some(0));
    }

    #[test]
    fn test_likes_dislikes_never_coexist() {
        let (store, _dir) = test_store();
        seed_pair(&store);
        store.toggle_dislike("u1", "p1").unwrap();
        store.toggle_like("u1", "p1").unwrap();
        assert_eq!(store.reaction_state("u1", "p1").unwrap(), LikeState::Liked);
        store.toggle_dislike("u1", "p1").unwrap();
        assert_eq!(store.reaction_state("u1", "p1").unwrap(), LikeState::Disliked);
    }

    #[test]
    fn test_scores_never_negative() {
        let (store, _dir) = test_store();
        seed_pair(&store);
        // More decrements than increments.
        store.toggle_like("u1", "p1").unwrap();
        store.toggle_like("u1", "p1").unwrap();
        store.toggle_dislike("u1", "p1").unwrap();
        store.comment_added("u1", "p1").unwrap();
        store.comment_removed("u1", "p1").unwrap();
        store.comment_removed("u1", "p1").unwrap();
        assert_eq!(store.tag_score("u1", EdgeKind::HasSkill, "rust").unwrap(), Some(0));
        assert_eq!(store.tag_score("u1", EdgeKind::InterestedIn, "ml").unwrap(), Some(0));
    }

    #[test]
    fn test_share_append_only() {
        let (store, _dir) = test_store();
        seed_pair(&store);
        store.record_share("u1", "p1").unwrap();
        store.record_share("u1", "p1").unwrap();
        assert_eq!(store.share_count("u1", "p1").unwrap(), 2);
    }

    #[test]
    fn test_follow_unfollow() {
        let (store, _dir) = test_store();
        seed_pair(&store);
        store.follow("u1", "u2").unwrap();
        assert!(store.is_following("u1", "u2").unwrap());
        assert!(!store.is_following("u2", "u1").unwrap());
        store.unfollow("u1", "u2").unwrap();
        assert!(!store.is_following("u1", "u2").unwrap());
    }

    #[test]
    fn test_person_delete_detaches() {
        let (store, _dir) = test_store();
        seed_pair(&store);
        store.comment_added("u1", "p1").unwrap();
        store.follow("u1", "u2").unwrap();

        store.delete_person("u1").unwrap();
        assert!(!store.node_exists(NodeLabel::Person, "u1").unwrap());
        // Incident edges are gone; the post and tags survive.
        assert_eq!(store.comment_count("u1", "p1").unwrap(), None);
        assert!(store.node_exists(NodeLabel::Post, "p1").unwrap());
        assert!(store.node_exists(NodeLabel::Tag, "rust").unwrap());
    }

    #[test]
    fn test_missing_required_tags() {
        let (store, _dir) = test_store();
        seed_pair(&store);
        // u1 holds rust (skill); sql is required but unheld.
        assert_eq!(store.missing_required_tags("u1", "p1").unwrap(), vec!["sql"]);

        store.add_interest("u1", &TagName::new("sql").unwrap()).unwrap();
        assert!(store.missing_required_tags("u1", "p1").unwrap().is_empty());
        assert_eq!(store.tag_score("u1", EdgeKind::InterestedIn, "sql").unwrap(), Some(0));
    }

    #[test]
    fn test_tag_profile() {
        let (store, _dir) = test_store();
        seed_pair(&store);
        let profile = store.tag_profile("u1").unwrap();
        assert_eq!(profile.skills, vec!["go", "rust"]);
        assert_eq!(profile.interests, vec!["ml"]);
    }

    #[test]
    fn test_engagement_on_missing_nodes_errors() {
        let (store, _dir) = test_store();
        seed_pair(&store);
        assert!(store.comment_added("ghost", "p1").is_err());
        assert!(store.toggle_like("u1", "ghost-post").is_err());
    }
}
