//! Content cleaning for extracted sections: fence stripping and code-block lookup.

use once_cell::sync::Lazy;
use regex::Regex;

const FENCE: &str = "```";

/// Below this many characters a cleaned section is considered suspiciously short...
const SHORT_CLEANED_CHARS: usize = 100;
/// ...when the raw section was longer than this.
const LONG_RAW_CHARS: usize = 200;

/// First fenced block: opening fence, optional language word, then the shortest
/// run of content up to a closing fence.
static CODE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```[A-Za-z0-9_]*\s*([\s\S]+?)```").expect("code block pattern is valid")
});

/// Strips a wrapping triple-backtick fence and an optional language tag line.
///
/// Text that is not wrapped in a fence is only trimmed. Stripping repeats until
/// the text no longer starts and ends with a fence, so the function is idempotent.
pub fn clean_markdown_code(text: &str) -> String {
    let mut current = text.trim().to_string();
    while let Some(next) = strip_fence_once(&current) {
        current = next;
    }
    current
}

fn strip_fence_once(text: &str) -> Option<String> {
    if text.len() < FENCE.len() * 2 || !text.starts_with(FENCE) || !text.ends_with(FENCE) {
        return None;
    }

    let inner = text[FENCE.len()..text.len() - FENCE.len()].trim();
    Some(drop_language_tag(inner).to_string())
}

fn drop_language_tag(text: &str) -> &str {
    match text.split_once('\n') {
        Some((first_line, rest)) if is_language_tag(first_line.trim()) => rest.trim(),
        _ => text,
    }
}

/// A bare lowercase word such as `markdown` or `md`.
fn is_language_tag(line: &str) -> bool {
    !line.is_empty() && line.bytes().all(|b| b.is_ascii_lowercase())
}

/// Returns the inner content of the first fenced code block in `text`.
///
/// Without a fenced block this falls back to [`clean_markdown_code`], unless that
/// leaves almost nothing of a long input, in which case the raw text is kept.
pub fn find_code_content(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    if let Some(inner) = CODE_BLOCK.captures(text).and_then(|caps| caps.get(1)) {
        return inner.as_str().trim().to_string();
    }

    let cleaned = clean_markdown_code(text);
    if cleaned.chars().count() < SHORT_CLEANED_CHARS && text.chars().count() > LONG_RAW_CHARS {
        return text.trim().to_string();
    }

    cleaned
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_clean_plain_text_is_trimmed_only() {
        assert_eq!(clean_markdown_code("  hello\nworld  "), "hello\nworld");
    }

    #[test]
    fn test_clean_strips_fence_and_language_tag() {
        assert_eq!(
            clean_markdown_code("```markdown\n# Jane\nEngineer\n```"),
            "# Jane\nEngineer"
        );
    }

    #[test]
    fn test_clean_keeps_first_line_that_is_not_a_tag() {
        assert_eq!(
            clean_markdown_code("```\nJane Roe\nEngineer\n```"),
            "Jane Roe\nEngineer"
        );
        assert_eq!(
            clean_markdown_code("```\nMarkdown\nbody\n```"),
            "Markdown\nbody"
        );
    }

    #[test]
    fn test_clean_single_line_body_keeps_word() {
        // No newline after the tag: nothing to drop.
        assert_eq!(clean_markdown_code("```summary```"), "summary");
    }

    #[test]
    fn test_clean_ignores_unbalanced_fence() {
        assert_eq!(clean_markdown_code("```markdown\nstill streaming"), "```markdown\nstill streaming");
        assert_eq!(clean_markdown_code("```"), "```");
    }

    #[test]
    fn test_clean_is_idempotent() {
        let inputs = [
            "",
            "```",
            "``````",
            "plain",
            "```md\nbody\n```",
            "```\n```inner```\n```",
            "```\nmd\n```x```\n```",
            "  ```text\nA\nB\n```  ",
        ];
        for input in inputs {
            let once = clean_markdown_code(input);
            assert_eq!(clean_markdown_code(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_find_code_content_prefers_fenced_block() {
        let text = "Here is your resume:\n```markdown\nJohn Doe\nEngineer\n```\nGood luck!";
        assert_eq!(find_code_content(text), "John Doe\nEngineer");
    }

    #[test]
    fn test_find_code_content_takes_first_block() {
        let text = "```\nfirst\n```\n```\nsecond\n```";
        assert_eq!(find_code_content(text), "first");
    }

    #[test]
    fn test_find_code_content_without_fence_uses_cleaned_text() {
        assert_eq!(find_code_content("  Dear Hiring Manager  "), "Dear Hiring Manager");
    }

    #[test]
    fn test_find_code_content_empty() {
        assert_eq!(find_code_content(""), "");
    }

    #[test]
    fn test_find_code_content_keeps_long_unfenced_text() {
        let text = format!(
            "Dear Hiring Manager,\n\n{}\nSincerely,\nJane",
            "I bring a decade of distributed systems experience. ".repeat(8)
        );
        assert!(text.chars().count() > LONG_RAW_CHARS);
        assert_eq!(find_code_content(&text), text.trim());
    }

    #[test]
    fn test_find_code_content_unterminated_fence_is_returned_as_is() {
        let text = format!("```markdown\n{}", "John Doe, Engineer. ".repeat(15));
        assert_eq!(find_code_content(&text), text.trim());
    }

    #[test]
    fn test_find_code_content_whitespace_only_block_is_empty() {
        assert_eq!(find_code_content("```md\n   \n```"), "");
    }

    proptest! {
        #[test]
        fn prop_clean_is_idempotent_for_any_text(text in any::<String>()) {
            let once = clean_markdown_code(&text);
            prop_assert_eq!(clean_markdown_code(&once), once);
        }

        #[test]
        fn prop_clean_is_idempotent_for_fence_heavy_text(
            text in "(```|[a-z]{1,6}|\\n| ){0,16}"
        ) {
            let once = clean_markdown_code(&text);
            prop_assert_eq!(clean_markdown_code(&once), once);
        }

        #[test]
        fn prop_fenced_block_content_is_found(
            tag in "[a-z]{0,8}",
            body in "[A-Za-z0-9 ,.]{1,80}"
        ) {
            prop_assume!(!body.trim().is_empty());
            let text = format!("Intro line\n```{tag}\n{body}\n```\nOutro");
            prop_assert_eq!(find_code_content(&text), body.trim());
        }
    }
}
