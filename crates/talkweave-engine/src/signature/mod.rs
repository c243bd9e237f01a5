//! # Signature Scanning
//!
//! Finds the literal author + timestamp tokens that end authored comments.
//! Each block's inline text is flattened into one string, the prioritized
//! pattern table runs over it, and every accepted match is mapped back to
//! the text node holding its date.

pub mod pattern;
pub mod timestamp;

use std::ops::Range;

use chrono::{DateTime, Utc};

use crate::config::ParserConfig;
use crate::tree::{NodeKind, PageTree, walk};

pub use pattern::{PatternMatch, PatternSpec, SignaturePattern, default_patterns};
pub use timestamp::{Locale, TimestampParser};

/// A signature found in the rendered page.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature<N> {
    /// Rendered text from the author link (or pattern start) to the end of the date.
    pub raw_text: String,
    pub author: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub date_text: String,
    pub is_unsigned_template: bool,
    /// Text node holding the end of the date.
    pub node: N,
    /// Byte offset of the date inside `node`'s text; orders signatures that
    /// share one text node.
    pub date_offset: usize,
    /// Block whose inline text hosts the signature.
    pub block: N,
}

/// Flattened inline text of one block.
struct InlineText<N> {
    text: String,
    /// `(node, start offset in text)`, ascending.
    runs: Vec<(N, usize)>,
    user_links: Vec<UserLink>,
}

struct UserLink {
    range: Range<usize>,
    author: String,
}

impl<N: Copy> InlineText<N> {
    fn run_at(&self, offset: usize) -> Option<(N, usize)> {
        let idx = self.runs.partition_point(|&(_, start)| start <= offset);
        idx.checked_sub(1).map(|i| self.runs[i])
    }
}

pub struct SignatureScanner<'a, T: PageTree> {
    tree: &'a T,
    config: &'a ParserConfig,
}

impl<'a, T: PageTree> SignatureScanner<'a, T> {
    pub fn new(tree: &'a T, config: &'a ParserConfig) -> Self {
        Self { tree, config }
    }

    /// Signatures in `block`'s own inline content, in text order.
    ///
    /// Nested blocks are not entered; they are scanned on their own.
    pub fn scan_block(&self, block: T::Node) -> Vec<Signature<T::Node>> {
        let mut inline = InlineText {
            text: String::new(),
            runs: Vec::new(),
            user_links: Vec::new(),
        };
        for child in self.tree.children(block) {
            self.collect_inline(child, &mut inline);
        }
        if inline.runs.is_empty() {
            return Vec::new();
        }

        let mut previous_end = 0;
        let mut out = Vec::new();
        for found in pattern::scan_table(&self.config.signature_patterns, &inline.text) {
            if let Some(signature) = self.build(&inline, &found, previous_end, block) {
                out.push(signature);
            }
            previous_end = found.range.end;
        }
        out
    }

    fn collect_inline(&self, node: T::Node, out: &mut InlineText<T::Node>) {
        match self.tree.kind(node) {
            NodeKind::Text => {
                let text = self.tree.text(node).unwrap_or_default();
                out.runs.push((node, out.text.len()));
                out.text.push_str(text);
            }
            NodeKind::Element if walk::is_inline(self.tree, node) => {
                if self.config.is_non_signature(self.tree, node) {
                    return;
                }
                let start = out.text.len();
                for child in self.tree.children(node) {
                    self.collect_inline(child, out);
                }
                if self.tree.tag(node) == Some("a")
                    && let Some(author) = user_from_link(self.tree, node, self.config)
                {
                    out.user_links.push(UserLink {
                        range: start..out.text.len(),
                        author,
                    });
                }
            }
            _ => {}
        }
    }

    fn build(
        &self,
        inline: &InlineText<T::Node>,
        found: &PatternMatch,
        previous_end: usize,
        block: T::Node,
    ) -> Option<Signature<T::Node>> {
        let date = found.date.clone()?;
        let date_text = inline.text[date.clone()].to_string();
        let (node, run_start) = inline.run_at(date.end.saturating_sub(1))?;

        let mut raw_start = found.range.start;
        let author = match &found.author {
            Some(range) => Some(inline.text[range.clone()].trim().to_string()),
            None => {
                let nearby: Vec<&UserLink> = inline
                    .user_links
                    .iter()
                    .filter(|link| {
                        link.range.start >= previous_end
                            && link.range.end <= date.start
                            && date.start - link.range.end <= self.config.limits.author_distance
                    })
                    .collect();
                nearby.last().map(|last| {
                    // "Alice (talk)" is one signature: start at the first link to the same user.
                    let first = nearby
                        .iter()
                        .filter(|link| link.author == last.author)
                        .map(|link| link.range.start)
                        .min()
                        .unwrap_or(last.range.start);
                    raw_start = raw_start.min(first);
                    last.author.clone()
                })
            }
        };

        Some(Signature {
            raw_text: inline.text[raw_start..found.range.end].trim().to_string(),
            author,
            timestamp: self.config.timestamp.parse(&date_text),
            date_text,
            is_unsigned_template: found.unsigned,
            node,
            date_offset: date.start.saturating_sub(run_start),
            block,
        })
    }
}

/// Author name behind a user, user-talk or contributions link.
pub fn user_from_link<T: PageTree + ?Sized>(
    tree: &T,
    link: T::Node,
    config: &ParserConfig,
) -> Option<String> {
    let from_title = tree.attr(link, "title").map(|title| {
        title
            .strip_suffix(" (page does not exist)")
            .unwrap_or(title)
            .to_string()
    });
    let from_href = tree.attr(link, "href").and_then(page_from_href);

    from_title
        .into_iter()
        .chain(from_href)
        .find_map(|page| config.user_from_page(&page))
}

fn page_from_href(href: &str) -> Option<String> {
    let page = if let Some((_, rest)) = href.split_once("/wiki/") {
        rest.split(['?', '#']).next()?
    } else {
        let (_, query) = href.split_once('?')?;
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix("title="))?
    };
    let page = urlencoding::decode(page).ok()?;
    Some(page.replace('_', " "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::HtmlPage;
    use pretty_assertions::assert_eq;

    fn scan(html: &str) -> Vec<Signature<ego_tree::NodeId>> {
        let page = HtmlPage::parse(html);
        let config = ParserConfig::default();
        let scanner = SignatureScanner::new(&page, &config);
        let block = page.first_child(page.content_root()).unwrap();
        scanner.scan_block(block)
    }

    #[test]
    fn author_comes_from_nearest_user_link() {
        let sigs = scan(
            r#"<div class="mw-parser-output"><p>Hi. --<a href="/wiki/User:Alice" title="User:Alice">Alice</a> (<a href="/wiki/User_talk:Alice" title="User talk:Alice">talk</a>) 12:00, 1 January 2020 (UTC)</p></div>"#,
        );
        assert_eq!(sigs.len(), 1);
        assert_eq!(sigs[0].author.as_deref(), Some("Alice"));
        assert_eq!(sigs[0].date_text, "12:00, 1 January 2020 (UTC)");
        assert_eq!(sigs[0].raw_text, "Alice (talk) 12:00, 1 January 2020 (UTC)");
        assert!(sigs[0].timestamp.is_some());
        assert!(!sigs[0].is_unsigned_template);
    }

    #[test]
    fn red_links_and_contributions_resolve_authors() {
        let sigs = scan(
            r#"<div class="mw-parser-output"><p>A <a href="/w/index.php?title=User:New_user&amp;action=edit&amp;redlink=1" title="User:New user (page does not exist)">New user</a> 12:00, 1 January 2020 (UTC) B <a href="/wiki/Special:Contributions/192.0.2.7">192.0.2.7</a> 13:00, 1 January 2020 (UTC)</p></div>"#,
        );
        let authors: Vec<_> = sigs.iter().map(|s| s.author.clone()).collect();
        assert_eq!(
            authors,
            [Some("New user".to_string()), Some("192.0.2.7".to_string())]
        );
    }

    #[test]
    fn percent_encoded_href_without_title_is_decoded() {
        let sigs = scan(
            r#"<div class="mw-parser-output"><p>Hola <a href="/wiki/User:Jos%C3%A9_P%C3%A9rez">José</a> 12:00, 1 January 2020 (UTC)</p></div>"#,
        );
        assert_eq!(sigs.len(), 1);
        assert_eq!(sigs[0].author.as_deref(), Some("José Pérez"));
    }

    #[test]
    fn link_before_previous_signature_is_not_reused() {
        let sigs = scan(
            r#"<div class="mw-parser-output"><p>A <a href="/wiki/User:Alice" title="User:Alice">Alice</a> 12:00, 1 January 2020 (UTC) B 13:00, 1 January 2020 (UTC)</p></div>"#,
        );
        assert_eq!(sigs.len(), 2);
        assert_eq!(sigs[1].author, None);
        assert!(sigs[0].date_offset < sigs[1].date_offset);
        assert_eq!(sigs[0].node, sigs[1].node);
    }

    #[test]
    fn nested_blocks_are_not_scanned_with_parent() {
        let sigs = scan(
            r#"<div class="mw-parser-output"><ul><li>Top <a href="/wiki/User:Alice" title="User:Alice">Alice</a> 12:00, 1 January 2020 (UTC)<ul><li>Reply <a href="/wiki/User:Bob" title="User:Bob">Bob</a> 13:00, 1 January 2020 (UTC)</li></ul></li></ul></div>"#,
        );
        // The first child of the content root is the outer <ul>, which has no inline text of its own.
        assert!(sigs.is_empty());
    }
}
