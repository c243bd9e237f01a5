//! Post-walk cleanup of a comment's node set.
//!
//! Every pass only drops or substitutes handles; the page itself is never touched.

use crate::config::ParserConfig;
use crate::tree::{DocumentOrder, NodeKind, PageTree, walk};

/// Orders, trims, deduplicates and unwraps `nodes`. `anchor` is the signature's
/// text node; nothing containing it is ever dropped.
pub fn finish<T: PageTree>(
    tree: &T,
    config: &ParserConfig,
    order: &DocumentOrder<T::Node>,
    anchor: T::Node,
    mut nodes: Vec<T::Node>,
) -> Vec<T::Node> {
    nodes.sort_by(|a, b| order.compare(*a, *b));
    nodes.dedup();
    trim_trailing(tree, config, anchor, &mut nodes);
    let nodes = drop_redundant(tree, anchor, nodes);
    nodes
        .into_iter()
        .map(|node| unwrap_list(tree, node))
        .collect()
}

fn trim_trailing<T: PageTree>(
    tree: &T,
    config: &ParserConfig,
    anchor: T::Node,
    nodes: &mut Vec<T::Node>,
) {
    while let Some(&last) = nodes.last() {
        if walk::contains(tree, last, anchor) {
            break;
        }
        let decorative = walk::is_blank(tree, last)
            || walk::is_metadata(tree, last)
            || config.is_decorative(tree, last);
        if !decorative {
            break;
        }
        nodes.pop();
    }
}

/// Drops nodes inside another selected node, and empty placeholders.
fn drop_redundant<T: PageTree>(tree: &T, anchor: T::Node, nodes: Vec<T::Node>) -> Vec<T::Node> {
    let mut kept: Vec<T::Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if kept.iter().any(|&outer| walk::contains(tree, outer, node)) {
            continue;
        }
        if walk::is_empty_placeholder(tree, node) && !walk::contains(tree, node, anchor) {
            continue;
        }
        kept.push(node);
    }
    kept
}

/// Replaces a list wrapper by its sole item while the item reproduces all of
/// the wrapper's text. An item holding nothing but a nested list is a wrapper too.
fn unwrap_list<T: PageTree>(tree: &T, mut node: T::Node) -> T::Node {
    loop {
        let mut items = tree
            .children(node)
            .filter(|&child| tree.kind(child) == NodeKind::Element);
        let (Some(item), None) = (items.next(), items.next()) else {
            break;
        };
        let is_list = |n| tree.tag(n).is_some_and(walk::is_list_tag);
        let is_item = tree.tag(node).is_some_and(|tag| matches!(tag, "li" | "dd" | "dt"));
        if !(is_list(node) || is_item && is_list(item)) {
            break;
        }
        let has_loose_text = tree
            .children(node)
            .any(|child| tree.kind(child) == NodeKind::Text && !walk::is_blank(tree, child));
        if has_loose_text
            || walk::text_content(tree, item).trim() != walk::text_content(tree, node).trim()
        {
            break;
        }
        node = item;
    }
    node
}
