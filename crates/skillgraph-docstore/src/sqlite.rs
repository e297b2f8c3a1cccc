//! SQLite-backed primary document store.
//!
//! Source of truth for users, content and membership. Precondition
//! checks (self-follow, duplicate follow, share targets) live here:
//! the request layer validates against this store before any graph
//! mutation is attempted, and a primary write that succeeds is never
//! rolled back by a later graph failure.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;
use uuid::Uuid;

use crate::schema::{OUTBOX_SCHEMA_SQL, SCHEMA_SQL};
use crate::types::*;
use skillgraph_core::{ContentKind, Error, Result};

pub(crate) fn db(e: rusqlite::Error) -> Error {
    Error::Database(e.to_string())
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn content_table(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Feed => "feed_posts",
        ContentKind::Job => "job_posts",
        ContentKind::Question => "question_posts",
    }
}

/// The primary document store.
pub struct DocStore {
    pub(crate) conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DocStore {
    /// Open or create the store. The file will be `db_dir/primary.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("primary.db");

        let conn = Connection::open(&db_path).map_err(db)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(db)?;
        conn.execute_batch(&format!("{}\n{}", SCHEMA_SQL, OUTBOX_SCHEMA_SQL))
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };
        info!("DocStore initialized: path={}", store.db_path.display());
        Ok(store)
    }

    // ---------------------------------------------------------------
    // Users
    // ---------------------------------------------------------------

    /// Register a user. Returns the new user id.
    pub fn create_user(&self, user: NewUser) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO users (id, name, email, role, skills_json, interests_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .map_err(db)?
        .execute(params![
            id,
            user.name,
            user.email,
            user.role.as_str(),
            serde_json::to_string(&user.skills)?,
            serde_json::to_string(&user.interests)?,
            now_millis(),
        ])
        .map_err(db)?;
        Ok(id)
    }

    pub fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>> {
        let conn = self.conn.lock();
        let user = conn
            .prepare_cached("SELECT * FROM users WHERE id = ?1")
            .map_err(db)?
            .query_row(params![user_id], row_to_user)
            .optional()
            .map_err(db)?;
        Ok(user)
    }

    /// Delete a user. Follow rows referencing them cascade away.
    pub fn delete_user(&self, user_id: &str) -> Result<()> {
        let conn = self.conn.lock();
        let n = conn
            .prepare_cached("DELETE FROM users WHERE id = ?1")
            .map_err(db)?
            .execute(params![user_id])
            .map_err(db)?;
        if n == 0 {
            return Err(Error::NotFound(format!("user {user_id}")));
        }
        Ok(())
    }

    /// Set-union `tags` into the user's interest list. Returns the tags
    /// that were actually new.
    pub fn union_interests(&self, user_id: &str, tags: &[String]) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let interests_json: String = conn
            .prepare_cached("SELECT interests_json FROM users WHERE id = ?1")
            .map_err(db)?
            .query_row(params![user_id], |row| row.get(0))
            .optional()
            .map_err(db)?
            .ok_or_else(|| Error::NotFound(format!("user {user_id}")))?;

        let mut interests: Vec<String> = serde_json::from_str(&interests_json)?;
        let mut added = Vec::new();
        for tag in tags {
            if !interests.iter().any(|t| t == tag) {
                interests.push(tag.clone());
                added.push(tag.clone());
            }
        }
        if !added.is_empty() {
            conn.prepare_cached("UPDATE users SET interests_json = ?2 WHERE id = ?1")
                .map_err(db)?
                .execute(params![user_id, serde_json::to_string(&interests)?])
                .map_err(db)?;
        }
        Ok(added)
    }

    // ---------------------------------------------------------------
    // Follow membership (precondition-checked)
    // ---------------------------------------------------------------

    /// Record a follow. Rejects self-follows and duplicates before any
    /// write, so the graph mirror is only invoked in a valid state.
    pub fn follow(&self, follower_id: &str, followee_id: &str) -> Result<()> {
        if follower_id == followee_id {
            return Err(Error::Precondition("cannot follow yourself".into()));
        }
        let conn = self.conn.lock();
        require_user(&conn, follower_id)?;
        require_user(&conn, followee_id)?;
        if is_following(&conn, follower_id, followee_id)? {
            return Err(Error::Precondition("already following this user".into()));
        }
        conn.prepare_cached(
            "INSERT INTO follows (follower_id, followee_id, created_at) VALUES (?1, ?2, ?3)",
        )
        .map_err(db)?
        .execute(params![follower_id, followee_id, now_millis()])
        .map_err(db)?;
        Ok(())
    }

    /// Remove a follow. Rejects when no follow exists.
    pub fn unfollow(&self, follower_id: &str, followee_id: &str) -> Result<()> {
        let conn = self.conn.lock();
        require_user(&conn, followee_id)?;
        let n = conn
            .prepare_cached("DELETE FROM follows WHERE follower_id = ?1 AND followee_id = ?2")
            .map_err(db)?
            .execute(params![follower_id, followee_id])
            .map_err(db)?;
        if n == 0 {
            return Err(Error::Precondition("you do not follow this user".into()));
        }
        Ok(())
    }

    pub fn is_following(&self, follower_id: &str, followee_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        is_following(&conn, follower_id, followee_id)
    }

    // ---------------------------------------------------------------
    // Content
    // ---------------------------------------------------------------

    /// Create a content document in its collection. Returns the id.
    pub fn create_content(&self, content: NewContent) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let conn = self.conn.lock();
        require_user(&conn, &content.owner_id)?;
        let sql = format!(
            "INSERT INTO {} (id, owner_id, title, body, required_tags_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            content_table(content.kind)
        );
        conn.prepare_cached(&sql)
            .map_err(db)?
            .execute(params![
                id,
                content.owner_id,
                content.title,
                content.body,
                serde_json::to_string(&content.required_tags)?,
                now_millis(),
            ])
            .map_err(db)?;
        Ok(id)
    }

    /// Look an id up across all three collections.
    pub fn get_content(&self, content_id: &str) -> Result<Option<ContentRecord>> {
        let conn = self.conn.lock();
        get_content(&conn, content_id)
    }

    /// Delete a content document wherever it lives, along with its
    /// comments, reactions and share rows.
    pub fn delete_content(&self, content_id: &str) -> Result<ContentKind> {
        let conn = self.conn.lock();
        let record = get_content(&conn, content_id)?
            .ok_or_else(|| Error::NotFound(format!("content {content_id}")))?;
        let sql = format!("DELETE FROM {} WHERE id = ?1", content_table(record.kind));
        conn.prepare_cached(&sql)
            .map_err(db)?
            .execute(params![content_id])
            .map_err(db)?;
        for sql in [
            "DELETE FROM comments WHERE content_id = ?1",
            "DELETE FROM reactions WHERE content_id = ?1",
            "DELETE FROM shares WHERE content_id = ?1",
        ] {
            conn.prepare_cached(sql)
                .map_err(db)?
                .execute(params![content_id])
                .map_err(db)?;
        }
        Ok(record.kind)
    }

    // ---------------------------------------------------------------
    // Comments and replies
    // ---------------------------------------------------------------

    pub fn add_comment(&self, content_id: &str, author_id: &str, text: &str) -> Result<CommentRecord> {
        self.insert_comment(content_id, None, author_id, text)
    }

    /// Add a reply under an existing comment.
    pub fn add_reply(
        &self,
        parent_comment_id: &str,
        author_id: &str,
        text: &str,
    ) -> Result<CommentRecord> {
        let content_id = {
            let conn = self.conn.lock();
            let parent: Option<String> = conn
                .prepare_cached("SELECT content_id FROM comments WHERE id = ?1")
                .map_err(db)?
                .query_row(params![parent_comment_id], |row| row.get::<_, String>(0))
                .optional()
                .map_err(db)?;
            parent.ok_or_else(|| Error::NotFound(format!("comment {parent_comment_id}")))?
        };
        self.insert_comment(&content_id, Some(parent_comment_id), author_id, text)
    }

    fn insert_comment(
        &self,
        content_id: &str,
        parent_id: Option<&str>,
        author_id: &str,
        text: &str,
    ) -> Result<CommentRecord> {
        let conn = self.conn.lock();
        require_user(&conn, author_id)?;
        if get_content(&conn, content_id)?.is_none() {
            return Err(Error::NotFound(format!("content {content_id}")));
        }
        let record = CommentRecord {
            id: Uuid::new_v4().to_string(),
            content_id: content_id.to_string(),
            parent_id: parent_id.map(str::to_string),
            author_id: author_id.to_string(),
            text: text.to_string(),
            created_at: now_millis(),
        };
        conn.prepare_cached(
            "INSERT INTO comments (id, content_id, parent_id, author_id, text, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .map_err(db)?
        .execute(params![
            record.id,
            record.content_id,
            record.parent_id,
            record.author_id,
            record.text,
            record.created_at,
        ])
        .map_err(db)?;
        Ok(record)
    }

    /// Remove a comment (or reply). Replies under a removed comment
    /// cascade away; the request layer fires one removal event per row
    /// it knows it removed.
    pub fn remove_comment(&self, comment_id: &str) -> Result<CommentRecord> {
        let conn = self.conn.lock();
        let record = conn
            .prepare_cached("SELECT * FROM comments WHERE id = ?1")
            .map_err(db)?
            .query_row(params![comment_id], row_to_comment)
            .optional()
            .map_err(db)?
            .ok_or_else(|| Error::NotFound(format!("comment {comment_id}")))?;
        conn.prepare_cached("DELETE FROM comments WHERE id = ?1")
            .map_err(db)?
            .execute(params![comment_id])
            .map_err(db)?;
        Ok(record)
    }

    // ---------------------------------------------------------------
    // Reactions and shares
    // ---------------------------------------------------------------

    /// Toggle like membership. Returns `true` when the post is now
    /// liked. Mutually exclusive with dislike membership.
    pub fn toggle_like(&self, content_id: &str, user_id: &str) -> Result<bool> {
        self.toggle_reaction(content_id, user_id, "like")
    }

    /// Toggle dislike membership. Returns `true` when now disliked.
    pub fn toggle_dislike(&self, content_id: &str, user_id: &str) -> Result<bool> {
        self.toggle_reaction(content_id, user_id, "dislike")
    }

    fn toggle_reaction(&self, content_id: &str, user_id: &str, reaction: &str) -> Result<bool> {
        let conn = self.conn.lock();
        require_user(&conn, user_id)?;
        if get_content(&conn, content_id)?.is_none() {
            return Err(Error::NotFound(format!("content {content_id}")));
        }
        let current: Option<String> = conn
            .prepare_cached("SELECT reaction FROM reactions WHERE content_id = ?1 AND user_id = ?2")
            .map_err(db)?
            .query_row(params![content_id, user_id], |row| row.get(0))
            .optional()
            .map_err(db)?;

        if current.as_deref() == Some(reaction) {
            conn.prepare_cached("DELETE FROM reactions WHERE content_id = ?1 AND user_id = ?2")
                .map_err(db)?
                .execute(params![content_id, user_id])
                .map_err(db)?;
            Ok(false)
        } else {
            conn.prepare_cached(
                "INSERT INTO reactions (content_id, user_id, reaction, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(content_id, user_id) DO UPDATE SET reaction = excluded.reaction",
            )
            .map_err(db)?
            .execute(params![content_id, user_id, reaction, now_millis()])
            .map_err(db)?;
            Ok(true)
        }
    }

    /// Whether the user currently likes the content.
    pub fn likes(&self, content_id: &str, user_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let current: Option<String> = conn
            .prepare_cached("SELECT reaction FROM reactions WHERE content_id = ?1 AND user_id = ?2")
            .map_err(db)?
            .query_row(params![content_id, user_id], |row| row.get(0))
            .optional()
            .map_err(db)?;
        Ok(current.as_deref() == Some("like"))
    }

    /// Share content with a recipient. The sender must follow the
    /// recipient or be followed by them.
    pub fn record_share(&self, content_id: &str, sender_id: &str, recipient_id: &str) -> Result<()> {
        let conn = self.conn.lock();
        require_user(&conn, sender_id)?;
        require_user(&conn, recipient_id)?;
        if get_content(&conn, content_id)?.is_none() {
            return Err(Error::NotFound(format!("content {content_id}")));
        }
        if !is_following(&conn, sender_id, recipient_id)?
            && !is_following(&conn, recipient_id, sender_id)?
        {
            return Err(Error::Precondition(
                "can only share with your followers or followings".into(),
            ));
        }
        conn.prepare_cached(
            "INSERT INTO shares (content_id, sender_id, recipient_id, shared_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .map_err(db)?
        .execute(params![content_id, sender_id, recipient_id, now_millis()])
        .map_err(db)?;
        Ok(())
    }

    /// Content that has been shared with the user, newest share first.
    pub fn shared_with(&self, user_id: &str) -> Result<Vec<ContentRecord>> {
        let conn = self.conn.lock();
        let ids: Vec<String> = conn
            .prepare_cached(
                "SELECT DISTINCT content_id FROM shares WHERE recipient_id = ?1 ORDER BY id DESC",
            )
            .map_err(db)?
            .query_map(params![user_id], |row| row.get(0))
            .map_err(db)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db)?;
        let mut out = Vec::new();
        for id in ids {
            if let Some(record) = get_content(&conn, &id)? {
                out.push(record);
            }
        }
        Ok(out)
    }
}

fn require_user(conn: &Connection, user_id: &str) -> Result<()> {
    let exists: Option<i64> = conn
        .prepare_cached("SELECT 1 FROM users WHERE id = ?1")
        .map_err(db)?
        .query_row(params![user_id], |row| row.get(0))
        .optional()
        .map_err(db)?;
    if exists.is_none() {
        return Err(Error::NotFound(format!("user {user_id}")));
    }
    Ok(())
}

fn is_following(conn: &Connection, follower_id: &str, followee_id: &str) -> Result<bool> {
    let n: i64 = conn
        .prepare_cached("SELECT COUNT(*) FROM follows WHERE follower_id = ?1 AND followee_id = ?2")
        .map_err(db)?
        .query_row(params![follower_id, followee_id], |row| row.get(0))
        .map_err(db)?;
    Ok(n > 0)
}

fn get_content(conn: &Connection, content_id: &str) -> Result<Option<ContentRecord>> {
    for kind in ContentKind::ALL {
        let sql = format!("SELECT * FROM {} WHERE id = ?1", content_table(kind));
        let found = conn
            .prepare_cached(&sql)
            .map_err(db)?
            .query_row(params![content_id], |row| row_to_content(row, kind))
            .optional()
            .map_err(db)?;
        if found.is_some() {
            return Ok(found);
        }
    }
    Ok(None)
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    let skills_json: String = row.get("skills_json")?;
    let interests_json: String = row.get("interests_json")?;
    Ok(UserRecord {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        role: row.get("role")?,
        skills: serde_json::from_str(&skills_json).unwrap_or_default(),
        interests: serde_json::from_str(&interests_json).unwrap_or_default(),
        created_at: row.get("created_at")?,
    })
}

fn row_to_content(row: &Row<'_>, kind: ContentKind) -> rusqlite::Result<ContentRecord> {
    let tags_json: String = row.get("required_tags_json")?;
    Ok(ContentRecord {
        id: row.get("id")?,
        kind,
        owner_id: row.get("owner_id")?,
        title: row.get("title")?,
        body: row.get("body")?,
        required_tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        created_at: row.get("created_at")?,
    })
}

fn row_to_comment(row: &Row<'_>) -> rusqlite::Result<CommentRecord> {
    Ok(CommentRecord {
        id: row.get("id")?,
        content_id: row.get("content_id")?,
        parent_id: row.get("parent_id")?,
        author_id: row.get("author_id")?,
        text: row.get("text")?,
        created_at: row.get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillgraph_core::RoleCategory;

    fn test_store() -> (DocStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = DocStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn user(store: &DocStore, name: &str) -> String {
        store
            .create_user(NewUser {
                name: name.to_string(),
                email: format!("{name}@example.com"),
                role: RoleCategory::Student,
                skills: vec!["rust".into()],
                interests: vec![],
            })
            .unwrap()
    }

    #[test]
    fn test_user_roundtrip() {
        let (store, _dir) = test_store();
        let id = user(&store, "asha");
        let record = store.get_user(&id).unwrap().unwrap();
        assert_eq!(record.name, "asha");
        assert_eq!(record.skills, vec!["rust"]);

        store.delete_user(&id).unwrap();
        assert!(store.get_user(&id).unwrap().is_none());
        assert!(matches!(store.delete_user(&id), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_interest_union() {
        let (store, _dir) = test_store();
        let id = user(&store, "asha");
        let added = store
            .union_interests(&id, &["ml".into(), "sql".into()])
            .unwrap();
        assert_eq!(added, vec!["ml", "sql"]);

        // Already-present tags are not re-added.
        let added = store.union_interests(&id, &["sql".into(), "go".into()]).unwrap();
        assert_eq!(added, vec!["go"]);
        let record = store.get_user(&id).unwrap().unwrap();
        assert_eq!(record.interests, vec!["ml", "sql", "go"]);
    }

    #[test]
    fn test_follow_preconditions() {
        let (store, _dir) = test_store();
        let a = user(&store, "asha");
        let b = user(&store, "bora");

        assert!(matches!(store.follow(&a, &a), Err(Error::Precondition(_))));
        assert!(matches!(store.follow(&a, "nope"), Err(Error::NotFound(_))));

        store.follow(&a, &b).unwrap();
        assert!(store.is_following(&a, &b).unwrap());
        assert!(matches!(store.follow(&a, &b), Err(Error::Precondition(_))));

        store.unfollow(&a, &b).unwrap();
        assert!(matches!(store.unfollow(&a, &b), Err(Error::Precondition(_))));
    }

    #[test]
    fn test_content_shared_id_namespace() {
        let (store, _dir) = test_store();
        let owner = user(&store, "asha");
        let job_id = store
            .create_content(NewContent {
                kind: ContentKind::Job,
                owner_id: owner.clone(),
                title: "Rust backend role".into(),
                body: None,
                required_tags: vec!["rust".into()],
            })
            .unwrap();
        let question_id = store
            .create_content(NewContent {
                kind: ContentKind::Question,
                owner_id: owner,
                title: "Borrow checker question".into(),
                body: Some("why".into()),
                required_tags: vec!["rust".into(), "lifetimes".into()],
            })
            .unwrap();

        assert_eq!(store.get_content(&job_id).unwrap().unwrap().kind, ContentKind::Job);
        let q = store.get_content(&question_id).unwrap().unwrap();
        assert_eq!(q.kind, ContentKind::Question);
        assert_eq!(q.required_tags, vec!["rust", "lifetimes"]);

        assert_eq!(store.delete_content(&job_id).unwrap(), ContentKind::Job);
        assert!(store.get_content(&job_id).unwrap().is_none());
    }

    #[test]
    fn test_comments_and_replies() {
        let (store, _dir) = test_store();
        let owner = user(&store, "asha");
        let commenter = user(&store, "bora");
        let post = store
            .create_content(NewContent {
                kind: ContentKind::Feed,
                owner_id: owner,
                title: "hello".into(),
                body: None,
                required_tags: vec![],
            })
            .unwrap();

        let comment = store.add_comment(&post, &commenter, "nice").unwrap();
        let reply = store.add_reply(&comment.id, &commenter, "more").unwrap();
        assert_eq!(reply.parent_id.as_deref(), Some(comment.id.as_str()));
        assert_eq!(reply.content_id, post);

        let removed = store.remove_comment(&comment.id).unwrap();
        assert_eq!(removed.text, "nice");
        assert!(matches!(
            store.remove_comment(&comment.id),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_reaction_toggles() {
        let (store, _dir) = test_store();
        let owner = user(&store, "asha");
        let fan = user(&store, "bora");
        let post = store
            .create_content(NewContent {
                kind: ContentKind::Feed,
                owner_id: owner,
                title: "hello".into(),
                body: None,
                required_tags: vec![],
            })
            .unwrap();

        assert!(store.toggle_like(&post, &fan).unwrap());
        assert!(store.likes(&post, &fan).unwrap());
        // Disliking displaces the like.
        assert!(store.toggle_dislike(&post, &fan).unwrap());
        assert!(!store.likes(&post, &fan).unwrap());
        // Toggling dislike again clears it.
        assert!(!store.toggle_dislike(&post, &fan).unwrap());
    }

    #[test]
    fn test_share_requires_relationship() {
        let (store, _dir) = test_store();
        let a = user(&store, "asha");
        let b = user(&store, "bora");
        let post = store
            .create_content(NewContent {
                kind: ContentKind::Feed,
                owner_id: a.clone(),
                title: "hello".into(),
                body: None,
                required_tags: vec![],
            })
            .unwrap();

        assert!(matches!(
            store.record_share(&post, &a, &b),
            Err(Error::Precondition(_))
        ));

        store.follow(&b, &a).unwrap();
        store.record_share(&post, &a, &b).unwrap();
        let shared = store.shared_with(&b).unwrap();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].id, post);
    }
}
