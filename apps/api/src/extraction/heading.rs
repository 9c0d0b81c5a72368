//! Heading Locator: finds a named section heading inside generated markdown.

/// Heading prefixes in the order they are tried.
///
/// The order matters: the first prefix that occurs anywhere after `from` wins,
/// even if a later prefix would match earlier in the document.
const HEADING_PREFIXES: [&str; 6] = ["###", "##", "#", "####", "#####", "######"];

/// A located heading token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingMatch {
    pub offset: usize,
    pub token: String,
}

impl HeadingMatch {
    /// Byte offset just past the matched token.
    pub fn end(&self) -> usize {
        self.offset + self.token.len()
    }
}

/// Finds `name` as a markdown heading (`# name` .. `###### name`) or as bold
/// text (`**name**`), starting the search at byte offset `from`.
///
/// Matching is literal, case-sensitive and whitespace-exact. A token embedded in
/// prose still counts.
pub fn find_heading(haystack: &str, name: &str, from: usize) -> Option<HeadingMatch> {
    let window = haystack.get(from..)?;

    HEADING_PREFIXES
        .iter()
        .map(|prefix| format!("{prefix} {name}"))
        .chain(std::iter::once(format!("**{name}**")))
        .find_map(|token| {
            window.find(&token).map(|index| HeadingMatch {
                offset: from + index,
                token,
            })
        })
}
