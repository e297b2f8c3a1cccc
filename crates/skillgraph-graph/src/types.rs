//! Graph-side vocabulary types.

use serde::{Deserialize, Serialize};

/// Node labels. External ids are unique within a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeLabel {
    Person,
    Post,
    Tag,
}

impl NodeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::Person => "person",
            NodeLabel::Post => "post",
            NodeLabel::Tag => "tag",
        }
    }
}

/// Edge kinds. The scored kinds carry an affinity score (person→tag)
/// or a reference count (`commented_on`); the rest hold score 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Created,
    Requires,
    HasSkill,
    InterestedIn,
    CommentedOn,
    Likes,
    Dislikes,
    Following,
    Shared,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Created => "created",
            EdgeKind::Requires => "requires",
            EdgeKind::HasSkill => "has_skill",
            EdgeKind::InterestedIn => "interested_in",
            EdgeKind::CommentedOn => "commented_on",
            EdgeKind::Likes => "likes",
            EdgeKind::Dislikes => "dislikes",
            EdgeKind::Following => "following",
            EdgeKind::Shared => "shared",
        }
    }
}

/// Like/dislike relation state for one (person, post) pair. The two
/// edges are mutually exclusive, so this is a three-state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LikeState {
    None,
    Liked,
    Disliked,
}

/// A person's scored tag neighborhood: skill and interest names only.
#[derive(Debug, Clone, Default)]
pub struct TagProfile {
    pub skills: Vec<String>,
    pub interests: Vec<String>,
}

/// A candidate post and the tags it requires, in store iteration order.
#[derive(Debug, Clone)]
pub struct PostTags {
    pub post_id: String,
    pub required: Vec<String>,
}
