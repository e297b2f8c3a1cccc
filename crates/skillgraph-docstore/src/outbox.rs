//! Sync outbox operations.
//!
//! Every graph-bound mutation is recorded here first, in the same
//! primary database as the write it mirrors. Drained rows are deleted;
//! rows that keep failing flip to the dead state and stay inspectable
//! instead of being silently dropped.

use rusqlite::{params, OptionalExtension, Row};
use tracing::warn;

use crate::sqlite::{db, now_millis, DocStore};
use crate::types::{OutboxEntry, OutboxStatus};
use skillgraph_core::Result;

impl DocStore {
    /// Append a sync event. Returns the outbox row id.
    pub fn outbox_enqueue(&self, payload: &serde_json::Value) -> Result<i64> {
        let conn = self.conn.lock();
        let id = conn
            .prepare_cached("INSERT INTO outbox (payload, created_at) VALUES (?1, ?2)")
            .map_err(db)?
            .insert(params![payload.to_string(), now_millis()])
            .map_err(db)?;
        Ok(id)
    }

    /// Pending events in enqueue order, bounded by `limit`.
    pub fn outbox_pending(&self, limit: usize) -> Result<Vec<OutboxEntry>> {
        self.outbox_by_status(OutboxStatus::Pending, limit)
    }

    /// Dead-lettered events, oldest first.
    pub fn outbox_dead(&self, limit: usize) -> Result<Vec<OutboxEntry>> {
        self.outbox_by_status(OutboxStatus::Dead, limit)
    }

    fn outbox_by_status(&self, status: OutboxStatus, limit: usize) -> Result<Vec<OutboxEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT * FROM outbox WHERE status = ?1 ORDER BY id ASC LIMIT ?2")
            .map_err(db)?;
        let rows = stmt
            .query_map(params![status.as_str(), limit as i64], row_to_entry)
            .map_err(db)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db)?;
        Ok(rows)
    }

    /// Remove a successfully applied event.
    pub fn outbox_mark_applied(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock();
        conn.prepare_cached("DELETE FROM outbox WHERE id = ?1")
            .map_err(db)?
            .execute(params![id])
            .map_err(db)?;
        Ok(())
    }

    /// Record a failed apply attempt. The row moves to the dead state
    /// once `max_attempts` is reached.
    pub fn outbox_mark_failed(&self, id: i64, error: &str, max_attempts: u32) -> Result<()> {
        let conn = self.conn.lock();
        let attempts: Option<i64> = conn
            .prepare_cached("SELECT attempts FROM outbox WHERE id = ?1")
            .map_err(db)?
            .query_row(params![id], |row| row.get(0))
            .optional()
            .map_err(db)?;
        let Some(attempts) = attempts else {
            return Ok(());
        };
        let attempts = attempts as u32 + 1;
        let status = if attempts >= max_attempts {
            warn!(outbox_id = id, attempts, error, "sync event dead-lettered");
            OutboxStatus::Dead
        } else {
            OutboxStatus::Pending
        };
        conn.prepare_cached(
            "UPDATE outbox SET attempts = ?2, status = ?3, last_error = ?4, updated_at = ?5
             WHERE id = ?1",
        )
        .map_err(db)?
        .execute(params![id, attempts, status.as_str(), error, now_millis()])
        .map_err(db)?;
        Ok(())
    }
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<OutboxEntry> {
    let payload: String = row.get("payload")?;
    let status: String = row.get("status")?;
    Ok(OutboxEntry {
        id: row.get("id")?,
        payload: serde_json::from_str(&payload).unwrap_or(serde_json::Value::Null),
        status: if status == "dead" {
            OutboxStatus::Dead
        } else {
            OutboxStatus::Pending
        },
        attempts: row.get::<_, i64>("attempts")? as u32,
        last_error: row.get("last_error")?,
    })
}
