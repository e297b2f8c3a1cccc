//! Shared domain types used across the engine crates.

use serde::{Deserialize, Serialize};

/// Coarse role category recorded on a person node at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleCategory {
    Student,
    Mentor,
    Recruiter,
}

impl RoleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleCategory::Student => "student",
            RoleCategory::Mentor => "mentor",
            RoleCategory::Recruiter => "recruiter",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "student" => Some(RoleCategory::Student),
            "mentor" => Some(RoleCategory::Mentor),
            "recruiter" => Some(RoleCategory::Recruiter),
            _ => None,
        }
    }
}

impl std::fmt::Display for RoleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The primary-store content collections. All three share one id namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    Feed,
    Job,
    Question,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] =
        [ContentKind::Feed, ContentKind::Job, ContentKind::Question];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Feed => "feed",
            ContentKind::Job => "job",
            ContentKind::Question => "question",
        }
    }
}

/// A normalized skill-or-interest label: trimmed, lowercased, globally
/// unique in the graph's tag vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagName(String);

impl TagName {
    /// Normalize a raw label. Returns `None` for labels that are empty
    /// after trimming.
    pub fn new(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            None
        } else {
            Some(TagName(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalize a batch of raw labels, dropping empties and duplicates
    /// while preserving first-seen order.
    pub fn normalize_all(raw: &[String]) -> Vec<TagName> {
        let mut seen = Vec::new();
        for label in raw {
            if let Some(tag) = TagName::new(label) {
                if !seen.contains(&tag) {
                    seen.push(tag);
                }
            }
        }
        seen
    }
}

impl std::fmt::Display for TagName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A saturating reference count for scored edges. Decrementing at one
/// yields [`Decrement::Drop`]: the edge must be deleted, not left at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefCount(u32);

/// Outcome of decrementing a [`RefCount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decrement {
    /// The count is still positive.
    Keep(RefCount),
    /// The count reached zero; the owning edge must be removed.
    Drop,
}

impl RefCount {
    pub fn one() -> Self {
        RefCount(1)
    }

    /// Reconstruct from a stored value. Counts below one are clamped up:
    /// an existing edge always means "at least one engagement".
    pub fn from_stored(value: i64) -> Self {
        RefCount(value.max(1) as u32)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn incremented(&self) -> Self {
        RefCount(self.0.saturating_add(1))
    }

    pub fn decremented(&self) -> Decrement {
        if self.0 <= 1 {
            Decrement::Drop
        } else {
            Decrement::Keep(RefCount(self.0 - 1))
        }
    }
}
