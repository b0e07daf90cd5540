//! Turning command-line input into a submission draft.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use appshelf_core::{parse_tags, ArtifactDraft};

/// Reads artifact code from a file, or from stdin when `path` is `-`.
pub fn read_code(path: &str) -> Result<String> {
    if path == "-" {
        let mut code = String::new();
        std::io::stdin()
            .read_to_string(&mut code)
            .context("Failed to read code from stdin")?;
        return Ok(code);
    }

    std::fs::read_to_string(Path::new(path))
        .with_context(|| format!("Failed to read '{}'", path))
}

/// Builds a draft from raw form values. Blank title and author are left
/// unset so the server applies its placeholders.
pub fn build_draft(
    code: String,
    title: Option<String>,
    author: Option<String>,
    tags: Option<&str>,
) -> ArtifactDraft {
    let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    ArtifactDraft {
        title: non_blank(title),
        code,
        tags: tags.map(parse_tags).unwrap_or_default(),
        author: non_blank(author),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_code_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "let n = 1;").unwrap();

        let code = read_code(file.path().to_str().unwrap()).unwrap();
        assert_eq!(code, "let n = 1;\n");
    }

    #[test]
    fn test_read_code_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.js");
        let err = read_code(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("missing.js"));
    }

    #[test]
    fn test_build_draft_parses_tags() {
        let draft = build_draft(
            "x".to_string(),
            Some("Counter".to_string()),
            Some("Ada".to_string()),
            Some("demo, counter, ,"),
        );
        assert_eq!(draft.title.as_deref(), Some("Counter"));
        assert_eq!(draft.author.as_deref(), Some("Ada"));
        assert_eq!(draft.tags, vec!["demo", "counter"]);
    }

    #[test]
    fn test_build_draft_leaves_blank_fields_unset() {
        let draft = build_draft("x".to_string(), Some("  ".to_string()), None, None);
        assert!(draft.title.is_none());
        assert!(draft.author.is_none());
        assert!(draft.tags.is_empty());
    }
}
