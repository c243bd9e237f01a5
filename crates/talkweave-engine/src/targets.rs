use crate::config::ParserConfig;
use crate::signature::{Signature, SignatureScanner};
use crate::tree::{DocumentOrder, NodeKind, PageTree, TreeWalker, walk};

/// A heading as reported by a [`HeadingDetector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingTarget {
    pub level: u8,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TargetKind<N> {
    Heading(HeadingTarget),
    Signature(Signature<N>),
}

/// A heading or signature, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Target<N> {
    pub node: N,
    pub kind: TargetKind<N>,
}

impl<N> Target<N> {
    pub fn signature(&self) -> Option<&Signature<N>> {
        match &self.kind {
            TargetKind::Signature(signature) => Some(signature),
            TargetKind::Heading(_) => None,
        }
    }

    pub fn is_heading(&self) -> bool {
        matches!(self.kind, TargetKind::Heading(_))
    }
}

/// Decides which elements are section headings.
pub trait HeadingDetector<T: PageTree> {
    fn heading(&self, tree: &T, node: T::Node) -> Option<HeadingTarget>;
}

/// `<h1>`–`<h6>`, plus the `div.mw-heading` wrappers newer skins put around them.
pub struct TagHeadingDetector;

const HEADING_WRAPPER_CLASS: &str = "mw-heading";
const EDIT_SECTION_CLASS: &str = "mw-editsection";

impl<T: PageTree> HeadingDetector<T> for TagHeadingDetector {
    fn heading(&self, tree: &T, node: T::Node) -> Option<HeadingTarget> {
        let heading = if tree.has_class(node, HEADING_WRAPPER_CLASS) {
            tree.children(node)
                .find(|&child| tree.tag(child).and_then(walk::heading_level).is_some())?
        } else {
            node
        };
        let level = tree.tag(heading).and_then(walk::heading_level)?;
        let mut text = String::new();
        headline_text(tree, heading, &mut text);
        Some(HeadingTarget {
            level,
            text: text.trim().to_string(),
        })
    }
}

fn headline_text<T: PageTree>(tree: &T, node: T::Node, out: &mut String) {
    for child in tree.children(node) {
        match tree.kind(child) {
            NodeKind::Text => out.push_str(tree.text(child).unwrap_or_default()),
            NodeKind::Element if !tree.has_class(child, EDIT_SECTION_CLASS) => {
                headline_text(tree, child, out)
            }
            _ => {}
        }
    }
}

/// Runs the signature scanner and heading detector over a content root.
pub struct TargetCollector<'a, T: PageTree> {
    tree: &'a T,
    root: T::Node,
    config: &'a ParserConfig,
    headings: &'a dyn HeadingDetector<T>,
    order: &'a DocumentOrder<T::Node>,
}

impl<'a, T: PageTree> TargetCollector<'a, T> {
    pub fn new(
        tree: &'a T,
        root: T::Node,
        config: &'a ParserConfig,
        headings: &'a dyn HeadingDetector<T>,
        order: &'a DocumentOrder<T::Node>,
    ) -> Self {
        Self {
            tree,
            root,
            config,
            headings,
            order,
        }
    }

    pub fn collect(&self) -> Vec<Target<T::Node>> {
        let scanner = SignatureScanner::new(self.tree, self.config);
        let mut targets: Vec<Target<T::Node>> = scanner
            .scan_block(self.root)
            .into_iter()
            .map(signature_target)
            .collect();

        let mut walker = TreeWalker::new(self.tree, self.root, self.root);
        let mut next = walker.next_node();
        while let Some(node) = next {
            if self.tree.kind(node) != NodeKind::Element || walk::is_inline(self.tree, node) {
                next = walker.next_node();
                continue;
            }
            if let Some(heading) = self.headings.heading(self.tree, node) {
                targets.push(Target {
                    node,
                    kind: TargetKind::Heading(heading),
                });
                next = walker.next_node_skipping_children();
                continue;
            }
            if self.config.is_non_signature(self.tree, node) {
                next = walker.next_node_skipping_children();
                continue;
            }
            targets.extend(scanner.scan_block(node).into_iter().map(signature_target));
            next = walker.next_node();
        }

        targets.sort_by(|a, b| {
            self.order
                .compare(a.node, b.node)
                .then_with(|| date_offset(a).cmp(&date_offset(b)))
        });
        targets
    }
}

fn signature_target<N: Copy>(signature: Signature<N>) -> Target<N> {
    Target {
        node: signature.node,
        kind: TargetKind::Signature(signature),
    }
}

fn date_offset<N>(target: &Target<N>) -> usize {
    target.signature().map_or(0, |s| s.date_offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::HtmlPage;
    use pretty_assertions::assert_eq;

    fn collect(html: &str) -> Vec<String> {
        let page = HtmlPage::parse(html);
        let root = page.content_root();
        let config = ParserConfig::default();
        let order = DocumentOrder::build(&page, root);
        TargetCollector::new(&page, root, &config, &TagHeadingDetector, &order)
            .collect()
            .into_iter()
            .map(|t| match t.kind {
                TargetKind::Heading(h) => format!("h{} {}", h.level, h.text),
                TargetKind::Signature(s) => {
                    format!("sig {} {}", s.author.unwrap_or_default(), s.date_text)
                }
            })
            .collect()
    }

    #[test]
    fn targets_follow_document_order() {
        let targets = collect(
            r#"<div class="mw-parser-output">
<div class="mw-heading mw-heading2"><h2 id="Topic">Topic</h2><span class="mw-editsection">[edit]</span></div>
<ul><li>A <a href="/wiki/User:Alice" title="User:Alice">Alice</a> 12:00, 1 January 2020 (UTC)
<ul><li>B <a href="/wiki/User:Bob" title="User:Bob">Bob</a> 13:00, 1 January 2020 (UTC)</li></ul>
After <a href="/wiki/User:Carol" title="User:Carol">Carol</a> 14:00, 1 January 2020 (UTC)</li></ul>
<h3>Sub <span class="mw-editsection">[edit source]</span></h3>
</div>"#,
        );
        assert_eq!(
            targets,
            [
                "h2 Topic",
                "sig Alice 12:00, 1 January 2020 (UTC)",
                "sig Bob 13:00, 1 January 2020 (UTC)",
                "sig Carol 14:00, 1 January 2020 (UTC)",
                "h3 Sub",
            ]
        );
    }

    #[test]
    fn excluded_blocks_host_no_signatures() {
        let targets = collect(
            r#"<div class="mw-parser-output"><div class="mw-notalk"><p>Notice 12:00, 1 January 2020 (UTC)</p></div><p>Real <a href="/wiki/User:Alice" title="User:Alice">Alice</a> 13:00, 1 January 2020 (UTC)</p></div>"#,
        );
        assert_eq!(targets, ["sig Alice 13:00, 1 January 2020 (UTC)"]);
    }

    #[test]
    fn headings_do_not_host_signatures() {
        let targets = collect(
            r#"<div class="mw-parser-output"><h2>Meeting 12:00, 1 January 2020 (UTC)</h2></div>"#,
        );
        assert_eq!(targets, ["h2 Meeting 12:00, 1 January 2020 (UTC)"]);
    }
}
