use regex::Regex;

use crate::error::ParseError;
use crate::signature::{Locale, PatternSpec, SignaturePattern, TimestampParser, default_patterns};
use crate::tree::PageTree;

/// Tunable constants of the heuristics.
///
/// The defaults come from observation of real talk pages, not from any
/// optimality argument; keep them adjustable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    /// Maximum backward steps when resolving one comment's boundary.
    pub walk_steps: usize,
    /// Minimum word overlap for a source candidate to count as a match.
    pub overlap_threshold: f64,
    /// How many preceding signatures the chained-context fallback compares.
    pub chain_depth: usize,
    /// Passes of trailing-markup trimming before a signature.
    pub trim_passes: usize,
    /// Maximum characters between an author link and its date.
    pub author_distance: usize,
    /// Maximum source characters between an author link and its date.
    pub signature_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            walk_steps: 300,
            overlap_threshold: 0.67,
            chain_depth: 2,
            trim_passes: 3,
            author_distance: 80,
            signature_length: 255,
        }
    }
}

/// Everything a parsing pass needs to know about the wiki it reads.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    pub timestamp: TimestampParser,
    /// Signature pattern table, highest priority first.
    pub signature_patterns: Vec<SignaturePattern>,
    /// Page prefixes identifying a user, e.g. `User:` or `Special:Contributions/`.
    pub user_link_prefixes: Vec<String>,
    /// Classes of blocks that never host signatures (notices, navigation boxes).
    pub non_signature_classes: Vec<String>,
    /// Classes of moved/archived-content templates; walks never cross them.
    pub moved_content_classes: Vec<String>,
    /// Classes of floated or boxed decorations trimmed from a comment's end.
    pub decorative_classes: Vec<String>,
    /// Classes of outdent markers.
    pub outdent_classes: Vec<String>,
    /// Signature-adjacent markup trimmed from the end of a comment's source.
    pub signature_prefix: Regex,
    pub limits: Limits,
}

pub const DEFAULT_SIGNATURE_PREFIX: &str = r"(?:[-–—]{1,2}|&[mn]dash;|~)[ \t]*$";

impl ParserConfig {
    /// Builds a configuration from a locale and a pattern table; every other
    /// field takes its default.
    pub fn new(locale: &Locale, patterns: &[PatternSpec]) -> Result<Self, ParseError> {
        let timestamp = TimestampParser::new(locale)?;
        let signature_patterns = patterns
            .iter()
            .map(|spec| SignaturePattern::compile(spec, &timestamp))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            timestamp,
            signature_patterns,
            user_link_prefixes: strings(&["User:", "User talk:", "Special:Contributions/"]),
            non_signature_classes: strings(&["mw-notalk", "navbox", "ambox"]),
            moved_content_classes: strings(&["moved-discussion", "archived-discussion"]),
            decorative_classes: strings(&["tright", "floatright", "quotebox"]),
            outdent_classes: strings(&["outdent-template"]),
            signature_prefix: compile_prefix(DEFAULT_SIGNATURE_PREFIX)?,
            limits: Limits::default(),
        })
    }

    pub fn set_signature_prefix(&mut self, pattern: &str) -> Result<(), ParseError> {
        self.signature_prefix = compile_prefix(pattern)?;
        Ok(())
    }

    /// User name for a page title like `User talk:Alice/Archive 1`.
    pub fn user_from_page(&self, page: &str) -> Option<String> {
        let page = page.trim();
        self.user_link_prefixes.iter().find_map(|prefix| {
            let rest = strip_prefix_ignore_case(page, prefix)?;
            let name = if prefix.ends_with('/') {
                rest
            } else {
                rest.split(['/', '#']).next().unwrap_or(rest)
            };
            let name = name.trim();
            (!name.is_empty()).then(|| name.to_string())
        })
    }

    pub fn is_non_signature<T: PageTree + ?Sized>(&self, tree: &T, node: T::Node) -> bool {
        has_any_class(tree, node, &self.non_signature_classes)
    }

    pub fn is_moved_content<T: PageTree + ?Sized>(&self, tree: &T, node: T::Node) -> bool {
        has_any_class(tree, node, &self.moved_content_classes)
    }

    pub fn is_decorative<T: PageTree + ?Sized>(&self, tree: &T, node: T::Node) -> bool {
        has_any_class(tree, node, &self.decorative_classes)
    }

    pub fn is_outdent<T: PageTree + ?Sized>(&self, tree: &T, node: T::Node) -> bool {
        has_any_class(tree, node, &self.outdent_classes)
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::new(&Locale::default(), &default_patterns())
            .expect("built-in locale and patterns compile")
    }
}

fn has_any_class<T: PageTree + ?Sized>(tree: &T, node: T::Node, classes: &[String]) -> bool {
    classes.iter().any(|class| tree.has_class(node, class))
}

fn strip_prefix_ignore_case<'p>(page: &'p str, prefix: &str) -> Option<&'p str> {
    let head = page.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &page[prefix.len()..])
}

fn compile_prefix(pattern: &str) -> Result<Regex, ParseError> {
    Regex::new(pattern).map_err(|e| ParseError::InvalidPattern {
        name: "signature_prefix".to_string(),
        message: e.to_string(),
    })
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("User:Alice", Some("Alice"))]
    #[case("User talk:Alice/Archive 1", Some("Alice"))]
    #[case("user:Bob#top", Some("Bob"))]
    #[case("Special:Contributions/192.0.2.1", Some("192.0.2.1"))]
    #[case("Talk:Main Page", None)]
    #[case("User:", None)]
    fn user_from_page(#[case] page: &str, #[case] expected: Option<&str>) {
        let config = ParserConfig::default();
        assert_eq!(config.user_from_page(page).as_deref(), expected);
    }

    #[test]
    fn default_limits() {
        let limits = ParserConfig::default().limits;
        assert_eq!(limits.walk_steps, 300);
        assert_eq!(limits.chain_depth, 2);
        assert!((limits.overlap_threshold - 0.67).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_bad_prefix() {
        let mut config = ParserConfig::default();
        assert!(config.set_signature_prefix("(").is_err());
        assert!(config.set_signature_prefix(r"--\s*$").is_ok());
    }
}
