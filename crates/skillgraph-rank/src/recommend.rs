//! Recommendation Ranker — graph-side ranking, primary-side resolution.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::similarity::Similarity;
use skillgraph_core::Result;
use skillgraph_docstore::{ContentRecord, DocStore};
use skillgraph_graph::GraphStore;

/// A ranked graph candidate before primary-store resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPost {
    pub post_id: String,
    pub score: f64,
}

/// A resolved recommendation: ranked id plus the primary document.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub post: ContentRecord,
    pub score: f64,
}

/// Rank unseen posts for `person_id` by combined tag similarity.
///
/// Posts the person currently likes are excluded, zero-similarity
/// candidates are dropped, and the survivors are resolved against the
/// primary store in rank order. Ranked ids the primary store no longer
/// has (deletion divergence) are dropped, not returned as placeholders.
pub fn recommend(
    graph: &GraphStore,
    docs: &DocStore,
    person_id: &str,
    limit: usize,
) -> Result<Vec<Recommendation>> {
    let ranked = rank(graph, person_id, limit)?;

    let mut out = Vec::with_capacity(ranked.len());
    for candidate in ranked {
        match docs.get_content(&candidate.post_id)? {
            Some(post) => out.push(Recommendation {
                post,
                score: candidate.score,
            }),
            None => {
                debug!(post_id = %candidate.post_id, "ranked id missing from primary store, dropped");
            }
        }
    }
    Ok(out)
}

/// Graph-only ranking step: candidates with `combined > 0`, minus
/// already-liked posts, sorted by non-increasing combined score.
/// Stable sort, so tied candidates keep store iteration order (an
/// implementation detail callers must not rely on).
pub fn rank(graph: &GraphStore, person_id: &str, limit: usize) -> Result<Vec<RankedPost>> {
    let profile = graph.tag_profile(person_id)?;
    let skills: HashSet<&str> = profile.skills.iter().map(String::as_str).collect();
    let interests: HashSet<&str> = profile.interests.iter().map(String::as_str).collect();
    let liked: HashSet<String> = graph.liked_posts(person_id)?.into_iter().collect();

    let mut ranked: Vec<RankedPost> = Vec::new();
    for candidate in graph.candidate_posts()? {
        if liked.contains(&candidate.post_id) {
            continue;
        }
        let required: HashSet<&str> = candidate.required.iter().map(String::as_str).collect();
        let sim = Similarity::compute(&skills, &interests, &required);
        if sim.combined > 0.0 {
            ranked.push(RankedPost {
                post_id: candidate.post_id,
                score: sim.combined,
            });
        }
    }

    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(limit);
    Ok(ranked)
}
