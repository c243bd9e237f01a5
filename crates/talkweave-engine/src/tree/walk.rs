use std::cmp::Ordering;
use std::collections::HashMap;

use super::{NodeKind, PageTree};

/// Elements that continue the surrounding paragraph instead of opening a block.
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "big", "br", "cite", "code", "data", "del", "dfn", "em",
    "font", "i", "img", "ins", "kbd", "mark", "q", "s", "samp", "small", "span", "strike",
    "strong", "sub", "sup", "time", "tt", "u", "var", "wbr",
];

/// Elements that carry no authored content.
const METADATA_TAGS: &[&str] = &["style", "link", "meta", "script"];

/// Elements that count as content even when they hold no text.
const MEDIA_TAGS: &[&str] = &["img", "video", "audio", "hr", "table", "figure"];

pub fn is_inline<T: PageTree + ?Sized>(tree: &T, node: T::Node) -> bool {
    match tree.kind(node) {
        NodeKind::Text | NodeKind::Comment => true,
        NodeKind::Element => tree.tag(node).is_some_and(|tag| INLINE_TAGS.contains(&tag)),
        NodeKind::Other => false,
    }
}

pub fn is_element<T: PageTree + ?Sized>(tree: &T, node: T::Node) -> bool {
    tree.kind(node) == NodeKind::Element
}

pub fn is_metadata<T: PageTree + ?Sized>(tree: &T, node: T::Node) -> bool {
    tree.tag(node).is_some_and(|tag| METADATA_TAGS.contains(&tag))
}

/// List containers that define reply nesting.
pub fn is_list_tag(tag: &str) -> bool {
    matches!(tag, "ul" | "ol" | "dl")
}

pub fn heading_level(tag: &str) -> Option<u8> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Whitespace-only text and markup comments.
pub fn is_blank<T: PageTree + ?Sized>(tree: &T, node: T::Node) -> bool {
    match tree.kind(node) {
        NodeKind::Text => tree.text(node).is_none_or(|t| t.trim().is_empty()),
        NodeKind::Comment => true,
        _ => false,
    }
}

/// Concatenated text of every descendant text node.
pub fn text_content<T: PageTree + ?Sized>(tree: &T, node: T::Node) -> String {
    let mut out = String::new();
    push_text(tree, node, &mut out);
    out
}

fn push_text<T: PageTree + ?Sized>(tree: &T, node: T::Node, out: &mut String) {
    match tree.kind(node) {
        NodeKind::Text => out.push_str(tree.text(node).unwrap_or_default()),
        NodeKind::Element if !is_metadata(tree, node) => {
            for child in tree.children(node) {
                push_text(tree, child, out);
            }
        }
        _ => {}
    }
}

/// True when `node` is `ancestor` or lies inside it.
pub fn contains<T: PageTree + ?Sized>(tree: &T, ancestor: T::Node, node: T::Node) -> bool {
    let mut current = Some(node);
    while let Some(n) = current {
        if n == ancestor {
            return true;
        }
        current = tree.parent(n);
    }
    false
}

/// Nearest non-inline ancestor of `node`, never climbing past `root`.
pub fn closest_block<T: PageTree + ?Sized>(tree: &T, root: T::Node, node: T::Node) -> T::Node {
    let mut current = node;
    while current != root && is_inline(tree, current) {
        match tree.parent(current) {
            Some(parent) => current = parent,
            None => break,
        }
    }
    current
}

/// An element with nothing to show: no visible text and no media.
pub fn is_empty_placeholder<T: PageTree + ?Sized>(tree: &T, node: T::Node) -> bool {
    match tree.kind(node) {
        NodeKind::Text | NodeKind::Comment => is_blank(tree, node),
        NodeKind::Element => {
            !has_media(tree, node) && text_content(tree, node).trim().is_empty()
        }
        NodeKind::Other => true,
    }
}

fn has_media<T: PageTree + ?Sized>(tree: &T, node: T::Node) -> bool {
    if tree.tag(node).is_some_and(|tag| MEDIA_TAGS.contains(&tag)) {
        return true;
    }
    tree.children(node).any(|child| has_media(tree, child))
}

/// Stateful cursor for ordered traversal bounded by a root node.
///
/// Movement methods return the new position and leave the cursor unchanged
/// when there is nowhere to go; the cursor never leaves the root's subtree.
pub struct TreeWalker<'t, T: PageTree + ?Sized> {
    tree: &'t T,
    root: T::Node,
    current: T::Node,
}

impl<'t, T: PageTree + ?Sized> TreeWalker<'t, T> {
    pub fn new(tree: &'t T, root: T::Node, start: T::Node) -> Self {
        Self {
            tree,
            root,
            current: start,
        }
    }

    pub fn current(&self) -> T::Node {
        self.current
    }

    pub fn parent_node(&mut self) -> Option<T::Node> {
        if self.current == self.root {
            return None;
        }
        let parent = self.tree.parent(self.current)?;
        self.current = parent;
        Some(parent)
    }

    pub fn previous_sibling(&mut self) -> Option<T::Node> {
        if self.current == self.root {
            return None;
        }
        let prev = self.tree.prev_sibling(self.current)?;
        self.current = prev;
        Some(prev)
    }

    pub fn next_sibling(&mut self) -> Option<T::Node> {
        if self.current == self.root {
            return None;
        }
        let next = self.tree.next_sibling(self.current)?;
        self.current = next;
        Some(next)
    }

    /// Preorder successor.
    pub fn next_node(&mut self) -> Option<T::Node> {
        if let Some(child) = self.tree.first_child(self.current) {
            self.current = child;
            return Some(child);
        }
        self.next_node_skipping_children()
    }

    /// Preorder successor that does not descend into the current node.
    pub fn next_node_skipping_children(&mut self) -> Option<T::Node> {
        let mut node = self.current;
        loop {
            if node == self.root {
                return None;
            }
            if let Some(next) = self.tree.next_sibling(node) {
                self.current = next;
                return Some(next);
            }
            node = self.tree.parent(node)?;
        }
    }

    /// Preorder predecessor.
    pub fn previous_node(&mut self) -> Option<T::Node> {
        if self.current == self.root {
            return None;
        }
        match self.tree.prev_sibling(self.current) {
            Some(mut node) => {
                while let Some(last) = self.tree.last_child(node) {
                    node = last;
                }
                self.current = node;
                Some(node)
            }
            None => self.parent_node(),
        }
    }
}

/// Preorder positions of every node under a root, for O(1) order comparison.
#[derive(Debug, Clone)]
pub struct DocumentOrder<N> {
    positions: HashMap<N, usize>,
}

impl<N: Copy + Eq + std::hash::Hash> DocumentOrder<N> {
    pub fn build<T: PageTree<Node = N> + ?Sized>(tree: &T, root: N) -> Self {
        let mut positions = HashMap::new();
        positions.insert(root, 0);
        let mut walker = TreeWalker::new(tree, root, root);
        while let Some(node) = walker.next_node() {
            let next = positions.len();
            positions.insert(node, next);
        }
        Self { positions }
    }

    pub fn position(&self, node: N) -> Option<usize> {
        self.positions.get(&node).copied()
    }

    /// Nodes outside the indexed subtree sort after everything inside it.
    pub fn compare(&self, a: N, b: N) -> Ordering {
        let pa = self.position(a).unwrap_or(usize::MAX);
        let pb = self.position(b).unwrap_or(usize::MAX);
        pa.cmp(&pb)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
