use crate::boundary::BoundaryResolver;
use crate::config::ParserConfig;
use crate::targets::{HeadingDetector, TagHeadingDetector, TargetCollector, TargetKind};
use crate::tree::{DocumentOrder, PageTree};

use super::{Comment, CommentId, Discussion, Section, SectionId, text};

/// One read-only pass over a page: collect targets, resolve each signature's
/// boundary and assemble the discussion graph.
pub struct DiscussionParser<'a, T: PageTree> {
    tree: &'a T,
    root: T::Node,
    config: &'a ParserConfig,
    headings: &'a dyn HeadingDetector<T>,
}

impl<'a, T: PageTree> DiscussionParser<'a, T> {
    pub fn new(tree: &'a T, root: T::Node, config: &'a ParserConfig) -> Self {
        Self {
            tree,
            root,
            config,
            headings: &TagHeadingDetector,
        }
    }

    pub fn with_heading_detector(mut self, headings: &'a dyn HeadingDetector<T>) -> Self {
        self.headings = headings;
        self
    }

    pub fn parse(&self) -> Discussion<T::Node> {
        let order = DocumentOrder::build(self.tree, self.root);
        let targets =
            TargetCollector::new(self.tree, self.root, self.config, self.headings, &order).collect();
        let resolver = BoundaryResolver::new(self.tree, self.root, self.config, &order, &targets);

        let mut comments: Vec<Comment<T::Node>> = Vec::new();
        let mut sections: Vec<Section<T::Node>> = Vec::new();
        let mut failures = Vec::new();

        for target in &targets {
            let position = order.position(target.node).unwrap_or_default();
            match &target.kind {
                TargetKind::Heading(heading) => {
                    let id = SectionId(sections.len());
                    let parent = sections
                        .iter()
                        .rev()
                        .find(|s| s.level < heading.level)
                        .map(|s| s.id);
                    log::debug!("section {id} {:?} (h{})", heading.text, heading.level);
                    sections.push(Section {
                        id,
                        headline: heading.text.clone(),
                        level: heading.level,
                        comments: Vec::new(),
                        parent,
                        node: target.node,
                        position,
                    });
                }
                TargetKind::Signature(signature) => {
                    let boundary = match resolver.resolve(signature) {
                        Ok(boundary) => boundary,
                        Err(e) => {
                            log::warn!("skipping signature: {e}");
                            failures.push(e);
                            continue;
                        }
                    };
                    let id = CommentId(comments.len());
                    let section = sections.last_mut();
                    let is_opening_section = section.as_ref().is_some_and(|s| s.comments.is_empty());
                    if let Some(section) = section {
                        section.comments.push(id);
                    }
                    log::debug!(
                        "comment {id} by {} at level {} ({} elements)",
                        boundary.author,
                        boundary.level,
                        boundary.elements.len()
                    );
                    comments.push(Comment {
                        id,
                        text: text::comment_text(self.tree, self.config, &boundary.elements, signature),
                        author: boundary.author,
                        timestamp: signature.timestamp,
                        date_text: signature.date_text.clone(),
                        signature_text: signature.raw_text.clone(),
                        is_unsigned_template: signature.is_unsigned_template,
                        level: boundary.level,
                        bottom_level: boundary.bottom_level,
                        elements: boundary.elements,
                        is_opening_section,
                        is_outdented: boundary.outdented,
                        position,
                    });
                }
            }
        }

        Discussion::new(comments, sections, failures)
    }
}

/// Parses the discussion under `root` with the default heading detector.
pub fn parse_discussion<T: PageTree>(
    tree: &T,
    root: T::Node,
    config: &ParserConfig,
) -> Discussion<T::Node> {
    DiscussionParser::new(tree, root, config).parse()
}
