// Tag parsing for comma-separated tag input
//
// Example: "calculator, form,,  animation" becomes
// ["calculator", "form", "animation"].

/// Splits comma-separated tag input, trimming each tag and dropping blanks.
///
/// Order and duplicates are preserved.
///
/// # Examples
/// ```
/// use appshelf_core::parse_tags;
///
/// assert_eq!(parse_tags("demo, ui"), vec!["demo", "ui"]);
/// assert!(parse_tags(" , ").is_empty());
/// ```
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_tags() {
        assert_eq!(parse_tags("calculator,form"), vec!["calculator", "form"]);
    }

    #[test]
    fn test_whitespace_and_blanks_dropped() {
        assert_eq!(
            parse_tags("  calculator , ,form,, animation "),
            vec!["calculator", "form", "animation"]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn test_duplicates_preserved() {
        assert_eq!(parse_tags("demo,demo"), vec!["demo", "demo"]);
    }
}
