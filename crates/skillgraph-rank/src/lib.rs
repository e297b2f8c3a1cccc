//! SkillGraph Rank — similarity-ranked post recommendations.

pub mod recommend;
pub mod similarity;

pub use recommend::{recommend, RankedPost, Recommendation};
pub use similarity::Similarity;
