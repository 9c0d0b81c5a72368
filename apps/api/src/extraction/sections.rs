//! Section Extractor: carves the four named sections out of a feedback document.
//!
//! The heading names below are shared with the generation prompt. Changing one
//! side without the other silently empties a section.

use serde::{Deserialize, Serialize};

use crate::extraction::cleaning::{clean_markdown_code, find_code_content};
use crate::extraction::heading::find_heading;

pub const SUMMARY_HEADING: &str = "Overall Summary";
pub const BREAKDOWN_HEADING: &str = "Section-by-Section Breakdown";
pub const REFINED_COPY_HEADING: &str = "Refined Resume Copy";
pub const COVER_LETTER_HEADING: &str = "Cover Letter Draft";

/// One of the four regions of the generated feedback, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    Summary,
    Breakdown,
    RefinedCopy,
    CoverLetter,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Summary,
        Section::Breakdown,
        Section::RefinedCopy,
        Section::CoverLetter,
    ];

    pub fn heading(self) -> &'static str {
        match self {
            Section::Summary => SUMMARY_HEADING,
            Section::Breakdown => BREAKDOWN_HEADING,
            Section::RefinedCopy => REFINED_COPY_HEADING,
            Section::CoverLetter => COVER_LETTER_HEADING,
        }
    }

    /// The heading that closes this section, if any. The cover letter runs to
    /// the end of the document.
    pub fn end_heading(self) -> Option<&'static str> {
        match self {
            Section::Summary => Some(BREAKDOWN_HEADING),
            Section::Breakdown => Some(REFINED_COPY_HEADING),
            Section::RefinedCopy => Some(COVER_LETTER_HEADING),
            Section::CoverLetter => None,
        }
    }

    /// Text shown in place of a section that never materialized.
    pub fn placeholder(self) -> &'static str {
        match self {
            Section::Summary => "Summary not generated.",
            Section::Breakdown => "Detailed breakdown not generated.",
            Section::RefinedCopy => "Refined copy not generated.",
            Section::CoverLetter => "Cover letter not generated.",
        }
    }

    /// Everything past the summary sits behind the payment unlock.
    pub fn is_gated(self) -> bool {
        !matches!(self, Section::Summary)
    }

    /// Extracts and cleans this section from `document`. Empty when absent.
    pub fn extract_from(self, document: &str) -> String {
        let raw = extract_section(document, self.heading(), self.end_heading());
        match self {
            Section::Summary | Section::Breakdown => clean_markdown_code(&raw),
            Section::RefinedCopy | Section::CoverLetter => find_code_content(&raw),
        }
    }
}

/// Returns the trimmed text between the `start` heading and the `end` heading.
///
/// A missing start heading yields an empty string. A missing end heading lets the
/// section run to the end of `text`.
pub fn extract_section(text: &str, start: &str, end: Option<&str>) -> String {
    let Some(start_match) = find_heading(text, start, 0) else {
        return String::new();
    };

    let content_start = start_match.end();
    let content_end = end
        .and_then(|name| find_heading(text, name, content_start))
        .map(|m| m.offset)
        .unwrap_or(text.len());

    text[content_start..content_end].trim().to_string()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const FULL_DOC: &str = "### Overall Summary\n\
        Strong engineer, weak metrics.\n\
        ### Section-by-Section Breakdown\n\
        - **Experience:** add numbers\n\
        ### Tailoring for the Target Role\n\
        Use keywords.\n\
        ---\n\
        ### Refined Resume Copy\n\
        ```markdown\n\
        Jane Roe\n\
        Staff Engineer\n\
        ```\n\
        ---\n\
        ### Cover Letter Draft\n\
        ```\n\
        Dear Hiring Manager,\n\
        I am excited.\n\
        ```\n";

    #[test]
    fn test_extract_between_headings() {
        let text = "### Overall Summary\nHello\n### Section-by-Section Breakdown\nWorld";
        assert_eq!(
            extract_section(text, SUMMARY_HEADING, Some(BREAKDOWN_HEADING)),
            "Hello"
        );
    }

    #[test]
    fn test_missing_start_is_empty() {
        assert_eq!(extract_section("no headings", SUMMARY_HEADING, None), "");
    }

    #[test]
    fn test_missing_end_runs_to_document_end() {
        let text = "## Overall Summary\n  partial summary still streaming  ";
        assert_eq!(
            extract_section(text, SUMMARY_HEADING, Some(BREAKDOWN_HEADING)),
            "partial summary still streaming"
        );
    }

    #[test]
    fn test_end_heading_before_start_is_ignored() {
        let text = "### Section-by-Section Breakdown\nearly\n### Overall Summary\nlate";
        assert_eq!(
            extract_section(text, SUMMARY_HEADING, Some(BREAKDOWN_HEADING)),
            "late"
        );
    }

    #[test]
    fn test_extraction_is_idempotent() {
        for section in Section::ALL {
            assert_eq!(section.extract_from(FULL_DOC), section.extract_from(FULL_DOC));
        }
    }

    #[test]
    fn test_full_document_has_no_cross_contamination() {
        assert_eq!(
            Section::Summary.extract_from(FULL_DOC),
            "Strong engineer, weak metrics."
        );
        assert_eq!(
            Section::Breakdown.extract_from(FULL_DOC),
            "- **Experience:** add numbers\n### Tailoring for the Target Role\nUse keywords.\n---"
        );
        assert_eq!(
            Section::RefinedCopy.extract_from(FULL_DOC),
            "Jane Roe\nStaff Engineer"
        );
        assert_eq!(
            Section::CoverLetter.extract_from(FULL_DOC),
            "Dear Hiring Manager,\nI am excited."
        );
    }

    #[test]
    fn test_bold_headings_with_fenced_copy() {
        let doc = "**Refined Resume Copy**\n```markdown\nJohn Doe\nEngineer\n```\n**Cover Letter Draft**\nDear Hiring Manager";
        assert_eq!(Section::RefinedCopy.extract_from(doc), "John Doe\nEngineer");
        assert_eq!(Section::CoverLetter.extract_from(doc), "Dear Hiring Manager");
    }

    #[test]
    fn test_only_summary_is_ungated() {
        assert!(!Section::Summary.is_gated());
        assert!(Section::Breakdown.is_gated());
        assert!(Section::RefinedCopy.is_gated());
        assert!(Section::CoverLetter.is_gated());
    }

    #[test]
    fn test_section_serializes_camel_case() {
        assert_eq!(
            serde_json::to_string(&Section::RefinedCopy).unwrap(),
            "\"refinedCopy\""
        );
    }

    fn assemble(summary: &str, details: &str, refined: &str, letter: &str) -> String {
        format!(
            "### {SUMMARY_HEADING}\n{summary}\n### {BREAKDOWN_HEADING}\n{details}\n\
             ### {REFINED_COPY_HEADING}\n```\n{refined}\n```\n### {COVER_LETTER_HEADING}\n{letter}"
        )
    }

    proptest! {
        #[test]
        fn prop_extraction_recovers_each_body(
            summary in "[A-Za-z0-9 ,.\\n-]{0,60}",
            details in "[A-Za-z0-9 ,.\\n-]{0,60}",
            refined in "[A-Za-z0-9 ,.\\n-]{0,60}",
            letter in "[A-Za-z0-9 ,.\\n-]{0,60}"
        ) {
            let doc = assemble(&summary, &details, &refined, &letter);
            prop_assert_eq!(Section::Summary.extract_from(&doc), summary.trim());
            prop_assert_eq!(Section::Breakdown.extract_from(&doc), details.trim());
            prop_assert_eq!(Section::RefinedCopy.extract_from(&doc), refined.trim());
            prop_assert_eq!(Section::CoverLetter.extract_from(&doc), letter.trim());
        }

        #[test]
        fn prop_cleaned_sections_are_fixed_points(doc in any::<String>()) {
            for section in [Section::Summary, Section::Breakdown] {
                let once = section.extract_from(&doc);
                prop_assert_eq!(clean_markdown_code(&once), once.clone());
                prop_assert_eq!(section.extract_from(&doc), once);
            }
        }
    }
}
