//! # Discussion Assembly
//!
//! Turns the targets of one page into an immutable graph of [`Comment`]s and
//! [`Section`]s. Entities live in arenas indexed by [`CommentId`] and
//! [`SectionId`]; the reply parent and the owning section of a comment are
//! derived on first request and memoized per id.
//!
//! ## Modules
//!
//! - **`comment`**: `Comment`, `CommentId`, `CommentKey`
//! - **`section`**: `Section`, `SectionId`
//! - **`parser`**: `DiscussionParser`, the collect → resolve → assemble pass
//! - **`text`**: visible comment text and word overlap scoring

pub mod comment;
pub mod parser;
pub mod section;
pub mod text;

use std::cell::OnceCell;

use crate::error::ParseError;

pub use comment::{Comment, CommentId, CommentKey};
pub use parser::{DiscussionParser, parse_discussion};
pub use section::{Section, SectionId};

/// The comments and sections of one page, in document order.
#[derive(Debug)]
pub struct Discussion<N> {
    comments: Vec<Comment<N>>,
    sections: Vec<Section<N>>,
    failures: Vec<ParseError>,
    parent_cache: Vec<OnceCell<Option<CommentId>>>,
    section_cache: Vec<OnceCell<Option<SectionId>>>,
}

impl<N> Discussion<N> {
    pub(crate) fn new(
        comments: Vec<Comment<N>>,
        sections: Vec<Section<N>>,
        failures: Vec<ParseError>,
    ) -> Self {
        let parent_cache = comments.iter().map(|_| OnceCell::new()).collect();
        let section_cache = comments.iter().map(|_| OnceCell::new()).collect();
        Self {
            comments,
            sections,
            failures,
            parent_cache,
            section_cache,
        }
    }

    pub fn comments(&self) -> &[Comment<N>] {
        &self.comments
    }

    pub fn sections(&self) -> &[Section<N>] {
        &self.sections
    }

    pub fn comment(&self, id: CommentId) -> Option<&Comment<N>> {
        self.comments.get(id.0)
    }

    pub fn section(&self, id: SectionId) -> Option<&Section<N>> {
        self.sections.get(id.0)
    }

    /// Signatures that produced no comment, with the reason for each.
    pub fn failures(&self) -> &[ParseError] {
        &self.failures
    }

    /// The comment `id` replies to.
    ///
    /// After an outdent marker this is the immediately preceding comment.
    /// Otherwise it is the nearest preceding comment of the same section with
    /// a lower level.
    pub fn parent(&self, id: CommentId) -> Option<CommentId> {
        let cell = self.parent_cache.get(id.0)?;
        *cell.get_or_init(|| self.find_parent(id))
    }

    fn find_parent(&self, id: CommentId) -> Option<CommentId> {
        let comment = self.comment(id)?;
        let previous = id.0.checked_sub(1)?;
        if comment.is_outdented {
            return Some(CommentId(previous));
        }
        let section = self.section_of(id);
        self.comments[..id.0]
            .iter()
            .rev()
            .take_while(|c| self.section_of(c.id) == section)
            .find(|c| c.level < comment.level)
            .map(|c| c.id)
    }

    /// The nearest preceding section listing `id`; `None` above the first heading.
    pub fn section_of(&self, id: CommentId) -> Option<SectionId> {
        let cell = self.section_cache.get(id.0)?;
        *cell.get_or_init(|| {
            let position = self.comment(id)?.position;
            self.sections
                .iter()
                .rev()
                .filter(|s| s.position < position)
                .find(|s| s.comments.contains(&id))
                .map(|s| s.id)
        })
    }

    /// Direct replies to `id`, in document order.
    pub fn children(&self, id: CommentId) -> Vec<CommentId> {
        self.comments
            .iter()
            .skip(id.0 + 1)
            .filter(|c| self.parent(c.id) == Some(id))
            .map(|c| c.id)
            .collect()
    }

    /// The section's own comments, optionally followed by those of its
    /// subsections (every following section until one of the same or a
    /// higher heading level).
    pub fn section_comments(&self, id: SectionId, include_subsections: bool) -> Vec<CommentId> {
        let Some(section) = self.section(id) else {
            return Vec::new();
        };
        let mut out = section.comments.clone();
        if include_subsections {
            for sub in self.sections[id.0 + 1..]
                .iter()
                .take_while(|s| s.level > section.level)
            {
                out.extend_from_slice(&sub.comments);
            }
        }
        out
    }

    pub fn section_parent(&self, id: SectionId) -> Option<SectionId> {
        self.section(id)?.parent
    }

    /// The comment of this pass that corresponds to `other`, which may come
    /// from another pass over the same page.
    ///
    /// Comments match on [`CommentKey`]; among several, the one whose text
    /// shares the most words with `other` wins.
    pub fn find_matching<M>(&self, other: &Comment<M>) -> Option<&Comment<N>> {
        let key = other.key();
        self.comments
            .iter()
            .filter(|c| c.key() == key)
            .max_by(|a, b| {
                text::overlap(&a.text, &other.text).total_cmp(&text::overlap(&b.text, &other.text))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::tree::HtmlPage;
    use pretty_assertions::assert_eq;

    fn sig(user: &str, time: &str) -> String {
        format!(
            r#"<a href="/wiki/User:{user}" title="User:{user}">{user}</a> {time}, 1 January 2020 (UTC)"#
        )
    }

    fn parse(body: &str) -> (HtmlPage, Discussion<ego_tree::NodeId>) {
        let page = HtmlPage::parse(&format!(r#"<div class="mw-parser-output">{body}</div>"#));
        let discussion = parse_discussion(&page, page.content_root(), &ParserConfig::default());
        (page, discussion)
    }

    fn authors(discussion: &Discussion<ego_tree::NodeId>, ids: &[CommentId]) -> Vec<String> {
        ids.iter()
            .map(|&id| discussion.comment(id).unwrap().author.clone())
            .collect()
    }

    #[test]
    fn threads_replies_by_level() {
        let (_, d) = parse(&format!(
            "<h2>A</h2><p>Start {}</p><dl><dd>Reply {}<dl><dd>Deeper {}</dd></dl></dd><dd>Second {}</dd></dl>",
            sig("Alice", "10:00"),
            sig("Bob", "11:00"),
            sig("Carol", "12:00"),
            sig("Dan", "13:00")
        ));
        assert_eq!(d.comments().len(), 4);
        let levels: Vec<_> = d.comments().iter().map(|c| c.level).collect();
        assert_eq!(levels, [0, 1, 2, 1]);
        assert_eq!(d.parent(CommentId(1)), Some(CommentId(0)));
        assert_eq!(d.parent(CommentId(2)), Some(CommentId(1)));
        assert_eq!(d.parent(CommentId(3)), Some(CommentId(0)));
        assert_eq!(d.parent(CommentId(0)), None);
        assert_eq!(authors(&d, &d.children(CommentId(0))), ["Bob", "Dan"]);
        assert!(d.comments()[0].is_opening_section);
        assert!(!d.comments()[1].is_opening_section);
        assert_eq!(d.comments()[1].text, "Reply");
    }

    #[test]
    fn parents_never_cross_sections() {
        let (_, d) = parse(&format!(
            "<h2>A</h2><p>Top {}</p><h2>B</h2><dl><dd>Indented {}</dd></dl>",
            sig("Alice", "10:00"),
            sig("Bob", "11:00")
        ));
        assert_eq!(d.section_of(CommentId(1)), Some(SectionId(1)));
        assert_eq!(d.parent(CommentId(1)), None);
    }

    #[test]
    fn outdent_forces_previous_comment_as_parent() {
        let (_, d) = parse(&format!(
            r#"<p>Top {}</p><dl><dd>Reply {}<dl><dd>Deep {}</dd></dl></dd></dl><div class="outdent-template">outdent</div><p>Back left {}</p>"#,
            sig("Alice", "10:00"),
            sig("Bob", "11:00"),
            sig("Carol", "12:00"),
            sig("Dan", "13:00")
        ));
        let dan = CommentId(3);
        assert_eq!(d.comment(dan).unwrap().level, 0);
        assert!(d.comment(dan).unwrap().is_outdented);
        assert_eq!(d.parent(dan), Some(CommentId(2)));
    }

    #[test]
    fn sections_nest_by_heading_level() {
        let (_, d) = parse(&format!(
            "<h2>Main</h2><p>One {}</p><h3>Sub</h3><p>Two {}</p><h2>Next</h2><p>Three {}</p>",
            sig("Alice", "10:00"),
            sig("Bob", "11:00"),
            sig("Carol", "12:00")
        ));
        let headlines: Vec<_> = d.sections().iter().map(|s| s.headline.as_str()).collect();
        assert_eq!(headlines, ["Main", "Sub", "Next"]);
        assert_eq!(d.section_parent(SectionId(1)), Some(SectionId(0)));
        assert_eq!(d.section_parent(SectionId(2)), None);
        assert_eq!(
            d.section_comments(SectionId(0), true),
            [CommentId(0), CommentId(1)]
        );
        assert_eq!(d.section_comments(SectionId(0), false), [CommentId(0)]);
    }

    #[test]
    fn failures_are_collected_without_aborting() {
        let (_, d) = parse(&format!(
            "<p>Anonymous 09:00, 1 January 2020 (UTC)</p><p>Signed {}</p>",
            sig("Alice", "10:00")
        ));
        assert_eq!(d.comments().len(), 1);
        assert_eq!(d.failures().len(), 1);
        assert!(matches!(d.failures()[0], ParseError::AuthorUnknown { .. }));
    }

    #[test]
    fn find_matching_across_passes() {
        let body = format!("<p>Hi {}</p><p>Hi again {}</p>", sig("Alice", "10:00"), sig("Bob", "11:00"));
        let (_, first) = parse(&body);
        let (_, second) = parse(&body);
        let bob = &first.comments()[1];
        assert_eq!(second.find_matching(bob).map(|c| c.id), Some(CommentId(1)));
    }
}
