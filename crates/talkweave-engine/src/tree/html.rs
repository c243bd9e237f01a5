use std::sync::LazyLock;

use ego_tree::{NodeId, NodeRef};
use scraper::{Html, Node, Selector};

use super::{NodeKind, PageTree};

static PARSER_OUTPUT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".mw-parser-output").unwrap());
static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());

/// A rendered page parsed with `scraper`, exposed through [`PageTree`].
pub struct HtmlPage {
    html: Html,
    content_root: NodeId,
}

impl HtmlPage {
    /// Parses a full document or a bare fragment.
    ///
    /// The content root is the first `.mw-parser-output` element, falling
    /// back to `<body>`.
    pub fn parse(source: &str) -> Self {
        let html = Html::parse_document(source);
        let content_root = html
            .select(&PARSER_OUTPUT)
            .next()
            .or_else(|| html.select(&BODY).next())
            .map(|element| element.id())
            .unwrap_or_else(|| html.tree.root().id());
        Self { html, content_root }
    }

    pub fn content_root(&self) -> NodeId {
        self.content_root
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    fn node(&self, id: NodeId) -> Option<NodeRef<'_, Node>> {
        self.html.tree.get(id)
    }
}

impl PageTree for HtmlPage {
    type Node = NodeId;

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.parent().map(|n| n.id())
    }

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.first_child().map(|n| n.id())
    }

    fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.last_child().map(|n| n.id())
    }

    fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.prev_sibling().map(|n| n.id())
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.next_sibling().map(|n| n.id())
    }

    fn kind(&self, node: NodeId) -> NodeKind {
        match self.node(node).map(|n| n.value()) {
            Some(Node::Element(_)) => NodeKind::Element,
            Some(Node::Text(_)) => NodeKind::Text,
            Some(Node::Comment(_)) => NodeKind::Comment,
            _ => NodeKind::Other,
        }
    }

    fn tag(&self, node: NodeId) -> Option<&str> {
        self.node(node)?.value().as_element().map(|e| e.name())
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node)?.value().as_element()?.attr(name)
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        self.node(node)?.value().as_text().map(|t| &**t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_root_prefers_parser_output() {
        let page = HtmlPage::parse(
            r#"<html><body><div id="x"><div class="mw-parser-output"><p>Hi</p></div></div></body></html>"#,
        );
        let root = page.content_root();
        assert!(page.has_class(root, "mw-parser-output"));
        let p = page.first_child(root).unwrap();
        assert_eq!(page.tag(p), Some("p"));
        assert_eq!(page.text(page.first_child(p).unwrap()), Some("Hi"));
    }

    #[test]
    fn content_root_falls_back_to_body() {
        let page = HtmlPage::parse("<p>Hi</p>");
        assert_eq!(page.tag(page.content_root()), Some("body"));
    }

    #[test]
    fn node_kinds() {
        let page = HtmlPage::parse("<p>a<!-- note --></p>");
        let p = page.first_child(page.content_root()).unwrap();
        let text = page.first_child(p).unwrap();
        let comment = page.next_sibling(text).unwrap();
        assert_eq!(page.kind(p), NodeKind::Element);
        assert_eq!(page.kind(text), NodeKind::Text);
        assert_eq!(page.kind(comment), NodeKind::Comment);
        assert_eq!(page.tag(text), None);
    }
}
