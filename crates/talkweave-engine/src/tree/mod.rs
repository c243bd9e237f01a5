//! # Page Tree Access
//!
//! The engine never owns the rendered page. Callers hand it a read-only
//! [`PageTree`] plus the node that bounds the discussion content, and every
//! entity the engine produces stores plain node handles into that tree.
//!
//! ## Modules
//!
//! - **`walk`**: ordered traversal primitives (`TreeWalker`), inline/block
//!   classification and document-order comparison (`DocumentOrder`)
//! - **`html`**: `HtmlPage`, a `PageTree` over a parsed `scraper::Html` document

pub mod html;
pub mod walk;

use std::fmt::Debug;
use std::hash::Hash;

pub use html::HtmlPage;
pub use walk::{DocumentOrder, TreeWalker};

/// Coarse classification of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    /// Markup comments (`<!-- -->`), never content.
    Comment,
    /// Document, doctype and anything else the walker should ignore.
    Other,
}

/// Read-only access to a rendered document tree.
///
/// Handles are cheap copies; the tree that hands them out stays borrowed for
/// as long as the engine reads from it.
pub trait PageTree {
    type Node: Copy + Eq + Hash + Debug;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;
    fn first_child(&self, node: Self::Node) -> Option<Self::Node>;
    fn last_child(&self, node: Self::Node) -> Option<Self::Node>;
    fn prev_sibling(&self, node: Self::Node) -> Option<Self::Node>;
    fn next_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    fn kind(&self, node: Self::Node) -> NodeKind;

    /// Lowercase tag name for elements, `None` for everything else.
    fn tag(&self, node: Self::Node) -> Option<&str>;

    fn attr(&self, node: Self::Node, name: &str) -> Option<&str>;

    /// Character data of text nodes.
    fn text(&self, node: Self::Node) -> Option<&str>;

    fn has_class(&self, node: Self::Node, class: &str) -> bool {
        self.attr(node, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    fn children(&self, node: Self::Node) -> Children<'_, Self> {
        Children {
            tree: self,
            next: self.first_child(node),
        }
    }
}

/// Iterator over the direct children of a node, in order.
pub struct Children<'t, T: PageTree + ?Sized> {
    tree: &'t T,
    next: Option<T::Node>,
}

impl<T: PageTree + ?Sized> Iterator for Children<'_, T> {
    type Item = T::Node;

    fn next(&mut self) -> Option<T::Node> {
        let current = self.next?;
        self.next = self.tree.next_sibling(current);
        Some(current)
    }
}
