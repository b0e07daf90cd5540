//! Case-insensitive artifact search over titles and tags.

use crate::artifact::Artifact;

/// Returns true if `term` occurs in the artifact's title or in any tag,
/// ignoring case. An empty term matches every artifact.
pub fn matches_term(artifact: &Artifact, term: &str) -> bool {
    let needle = term.to_lowercase();
    if needle.is_empty() {
        return true;
    }

    artifact.title.to_lowercase().contains(&needle)
        || artifact
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(&needle))
}

/// Filters `artifacts` by [`matches_term`], preserving order.
pub fn search(artifacts: &[Artifact], term: &str) -> Vec<Artifact> {
    artifacts
        .iter()
        .filter(|artifact| matches_term(artifact, term))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ArtifactId, Owner};
    use chrono::Utc;

    fn artifact(title: &str, tags: &[&str]) -> Artifact {
        Artifact {
            id: ArtifactId::new(title),
            title: title.to_string(),
            code: "x()".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            author: "Ada".to_string(),
            created_at: Utc::now(),
            owner_id: Owner::Anonymous,
        }
    }

    #[test]
    fn test_title_match_is_case_insensitive() {
        assert!(matches_term(&artifact("Counter", &[]), "COUNT"));
        assert!(matches_term(&artifact("Counter", &[]), "ter"));
        assert!(!matches_term(&artifact("Counter", &[]), "text"));
    }

    #[test]
    fn test_tag_match() {
        let a = artifact("Widget", &["Animation", "canvas"]);
        assert!(matches_term(&a, "anim"));
        assert!(matches_term(&a, "CANVAS"));
        assert!(!matches_term(&a, "form"));
    }

    #[test]
    fn test_empty_term_matches_all() {
        let list = vec![artifact("A", &[]), artifact("B", &[])];
        assert_eq!(search(&list, "").len(), 2);
    }

    #[test]
    fn test_search_preserves_order() {
        let list = vec![
            artifact("Counter B", &[]),
            artifact("Text Tool", &[]),
            artifact("Counter A", &[]),
        ];
        let titles: Vec<String> = search(&list, "counter").into_iter().map(|a| a.title).collect();
        assert_eq!(titles, vec!["Counter B", "Counter A"]);
    }
}
