//! Per-(person, post) engagement locks.
//!
//! The comment count and the like/dislike toggle are read-modify-write
//! sequences; serializing them per pair closes the lost-update window
//! without a global lock.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

#[derive(Default)]
pub struct EngagementLocks {
    map: DashMap<(String, String), Arc<Mutex<()>>>,
}

impl EngagementLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock for one (person, post) pair. Hold the guard for the
    /// duration of the engagement mutation.
    pub fn pair(&self, person_id: &str, post_id: &str) -> Arc<Mutex<()>> {
        self.map
            .entry((person_id.to_string(), post_id.to_string()))
            .or_default()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_pair_same_lock() {
        let locks = EngagementLocks::new();
        let a = locks.pair("u1", "p1");
        let b = locks.pair("u1", "p1");
        let c = locks.pair("u1", "p2");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
