//! Scenario tests for draft validation and search across the public API.

use appshelf_core::{parse_tags, search, Artifact, ArtifactDraft, ArtifactId, Owner, ValidationError};
use chrono::{Duration, Utc};

fn commit(draft: ArtifactDraft, id: &str, minutes_ago: i64) -> Artifact {
    draft
        .validate()
        .expect("draft should be valid")
        .into_artifact(
            ArtifactId::new(id),
            Utc::now() - Duration::minutes(minutes_ago),
            Owner::Anonymous,
        )
}

#[test]
fn test_search_count_returns_only_counter() {
    let counter = commit(
        ArtifactDraft {
            title: Some("Counter".to_string()),
            code: "let n = 0;".to_string(),
            tags: parse_tags("demo"),
            author: Some("Ada".to_string()),
        },
        "demo10",
        1,
    );
    let text_tool = commit(
        ArtifactDraft {
            title: Some("Text Tool".to_string()),
            code: "document.title = 'x';".to_string(),
            tags: parse_tags("text, tools"),
            author: None,
        },
        "demo11",
        2,
    );

    let results = search(&[counter.clone(), text_tool], "count");
    assert_eq!(results, vec![counter]);
}

#[test]
fn test_tag_input_from_form_round_trips_into_artifact() {
    let artifact = commit(
        ArtifactDraft {
            title: None,
            code: "paint()".to_string(),
            tags: parse_tags("canvas,  animation ,,"),
            author: None,
        },
        "demo12",
        0,
    );
    assert_eq!(artifact.tags, vec!["canvas", "animation"]);
    assert_eq!(artifact.title, appshelf_core::DEFAULT_TITLE);
    assert_eq!(artifact.author, appshelf_core::DEFAULT_AUTHOR);
}

#[test]
fn test_blank_drafts_never_commit() {
    for code in ["", "   ", "\n\t"] {
        assert_eq!(
            ArtifactDraft::with_code(code).validate(),
            Err(ValidationError::EmptyCode)
        );
    }
}
