//! Connection pool for the graph store.
//!
//! Every logical operation acquires a [`GraphSession`] at entry and
//! releases it on all return paths (the session returns its connection
//! to the pool on drop). Nothing holds a connection across a whole
//! request.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::Connection;

use skillgraph_core::{Error, Result};

/// A small free-list pool of SQLite connections to the graph database.
pub struct GraphPool {
    db_path: PathBuf,
    idle: Mutex<Vec<Connection>>,
    busy_timeout: Duration,
    max_idle: usize,
}

impl GraphPool {
    /// Open a pool against `db_dir/graph.db`, creating the directory
    /// and database as needed.
    pub fn open(db_dir: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("graph.db");

        let pool = Self {
            db_path,
            idle: Mutex::new(Vec::new()),
            busy_timeout,
            max_idle: 4,
        };
        // Fail early if the database cannot be opened at all.
        let session = pool.acquire()?;
        drop(session);
        Ok(pool)
    }

    /// Check out a session, reusing an idle connection when available.
    pub fn acquire(&self) -> Result<GraphSession<'_>> {
        let conn = match self.idle.lock().pop() {
            Some(conn) => conn,
            None => self.connect()?,
        };
        Ok(GraphSession {
            conn: Some(conn),
            pool: self,
        })
    }

    fn connect(&self) -> Result<Connection> {
        let conn =
            Connection::open(&self.db_path).map_err(|e| Error::Graph(e.to_string()))?;
        conn.busy_timeout(self.busy_timeout)
            .map_err(|e| Error::Graph(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Graph(e.to_string()))?;
        Ok(conn)
    }

    fn release(&self, conn: Connection) {
        let mut idle = self.idle.lock();
        if idle.len() < self.max_idle {
            idle.push(conn);
        }
        // Otherwise the connection just closes.
    }
}

/// A scoped graph session: one checked-out connection, returned to the
/// pool when the session drops.
pub struct GraphSession<'a> {
    conn: Option<Connection>,
    pool: &'a GraphPool,
}

impl Deref for GraphSession<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("session connection taken")
    }
}

impl DerefMut for GraphSession<'_> {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("session connection taken")
    }
}

impl Drop for GraphSession<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}
