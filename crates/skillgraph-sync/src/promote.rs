//! Interest Promotion — derive new interests from engagement.
//!
//! After a comment, reply or like, tags the target post requires that
//! the engaging person holds via neither scored relation become
//! `interested_in` edges at baseline score, and the tag names are
//! set-unioned into the person's primary-store interest list. One-way:
//! removing the engagement later never demotes the interest.

use tracing::info;

use skillgraph_core::{Result, TagName};
use skillgraph_docstore::DocStore;
use skillgraph_graph::GraphStore;

/// Promote the unheld required tags of `post_id` into `person_id`'s
/// interest set, in both stores. Returns the promoted tag names.
pub fn promote_interests(
    graph: &GraphStore,
    docs: &DocStore,
    person_id: &str,
    post_id: &str,
) -> Result<Vec<String>> {
    let missing = graph.missing_required_tags(person_id, post_id)?;
    if missing.is_empty() {
        return Ok(missing);
    }

    for name in &missing {
        if let Some(tag) = TagName::new(name) {
            graph.add_interest(person_id, &tag)?;
        }
    }
    docs.union_interests(person_id, &missing)?;

    info!(person_id, post_id, promoted = missing.len(), "interests promoted");
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillgraph_core::{ContentKind, RoleCategory};
    use skillgraph_docstore::{NewContent, NewUser};
    use skillgraph_graph::EdgeKind;
    use std::time::Duration;

    fn stores() -> (GraphStore, DocStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let graph = GraphStore::open(dir.path().join("graph"), Duration::from_millis(200)).unwrap();
        graph.ensure_constraints().unwrap();
        let docs = DocStore::open(dir.path().join("primary")).unwrap();
        (graph, docs, dir)
    }

    fn tags(names: &[&str]) -> Vec<TagName> {
        names.iter().map(|n| TagName::new(n).unwrap()).collect()
    }

    #[test]
    fn test_promotion_is_create_if_absent() {
        let (graph, docs, _dir) = stores();
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
                kind: ContentKind::Question,
                owner_id: person.clone(),
                title: "q".into(),
                body: None,
                required_tags: vec!["rust".into(), "sql".into()],
            })
            .unwrap();

        graph
            .create_person(&person, "Asha", "student", &tags(&["rust"]), &[])
            .unwrap();
        graph
            .create_post(&person, &post, "q", &tags(&["rust", "sql"]))
            .unwrap();

        // rust is already held as a skill, so only sql is promoted.
        let promoted = promote_interests(&graph, &docs, &person, &post).unwrap();
        assert_eq!(promoted, vec!["sql"]);
        assert_eq!(graph.tag_score(&person, EdgeKind::InterestedIn, "sql").unwrap(), Some(0));
        let record = docs.get_user(&person).unwrap().unwrap();
        assert_eq!(record.interests, vec!["sql"]);

        // A second promotion is a no-op; nothing is demoted either.
        let promoted = promote_interests(&graph, &docs, &person, &post).unwrap();
        assert!(promoted.is_empty());
        let record = docs.get_user(&person).unwrap().unwrap();
        assert_eq!(record.interests, vec!["sql"]);
    }
}
