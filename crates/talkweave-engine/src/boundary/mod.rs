//! # Boundary Resolution
//!
//! Decides which nodes make up the comment ending at one signature.
//!
//! The resolver starts at the block hosting the signature, narrows it to the
//! children that belong to this comment, then walks backward (previous
//! siblings first, parents when siblings run out) collecting leading material
//! until it meets another comment, a heading, an excluded block or the
//! content root.
//!
//! ## Modules
//!
//! - **`level`**: `LevelTagger`, memoized list nesting levels
//! - **`cleanup`**: ordering, trailing decoration trim, deduplication and
//!   list unwrapping of the collected nodes

pub mod cleanup;
pub mod level;

use crate::config::ParserConfig;
use crate::error::{ParseError, UnresolvedReason};
use crate::signature::{Signature, user_from_link};
use crate::targets::Target;
use crate::tree::{DocumentOrder, NodeKind, PageTree, TreeWalker, walk};

pub use level::LevelTagger;

/// The nodes of one comment plus what the walk learned on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary<N> {
    /// Never empty; in document order; no node contains another.
    pub elements: Vec<N>,
    pub author: String,
    pub level: usize,
    /// Nesting level of the last element.
    pub bottom_level: usize,
    /// An outdent marker directly precedes the comment.
    pub outdented: bool,
}

#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    position: usize,
    date_offset: usize,
    target: usize,
}

impl IndexEntry {
    fn key(&self) -> (usize, usize) {
        (self.position, self.date_offset)
    }
}

/// Targets sorted by document position, for subtree range queries.
struct TargetIndex {
    entries: Vec<IndexEntry>,
}

impl TargetIndex {
    fn build<N: Copy + Eq + std::hash::Hash>(
        targets: &[Target<N>],
        order: &DocumentOrder<N>,
    ) -> Self {
        let mut entries: Vec<IndexEntry> = targets
            .iter()
            .enumerate()
            .filter_map(|(target, t)| {
                Some(IndexEntry {
                    position: order.position(t.node)?,
                    date_offset: t.signature().map_or(0, |s| s.date_offset),
                    target,
                })
            })
            .collect();
        entries.sort_by_key(IndexEntry::key);
        Self { entries }
    }

    fn find(&self, key: (usize, usize)) -> Option<IndexEntry> {
        self.entries
            .binary_search_by_key(&key, IndexEntry::key)
            .ok()
            .map(|i| self.entries[i])
    }

    /// Entries whose position falls in `first..=last`.
    fn range(&self, first: usize, last: usize) -> &[IndexEntry] {
        let lo = self.entries.partition_point(|e| e.position < first);
        let hi = self.entries.partition_point(|e| e.position <= last);
        &self.entries[lo..hi]
    }
}

/// What a subtree holds besides our own signature.
#[derive(Debug, Default, Clone, Copy)]
struct Foreign {
    earlier: usize,
    later: usize,
    headings: usize,
}

impl Foreign {
    fn signatures(&self) -> usize {
        self.earlier + self.later
    }

    fn is_clear(&self) -> bool {
        self.signatures() == 0 && self.headings == 0
    }
}

/// Result of narrowing the block that hosts our date.
struct Narrowed<N> {
    parts: Vec<N>,
    /// The whole block was taken, so enclosing blocks may be absorbed too.
    whole: bool,
    /// Material before the parts belongs to someone else.
    blocked: bool,
    outdented: bool,
}

pub struct BoundaryResolver<'a, T: PageTree> {
    tree: &'a T,
    root: T::Node,
    config: &'a ParserConfig,
    order: &'a DocumentOrder<T::Node>,
    targets: &'a [Target<T::Node>],
    index: TargetIndex,
    levels: LevelTagger<'a, T>,
}

impl<'a, T: PageTree> BoundaryResolver<'a, T> {
    pub fn new(
        tree: &'a T,
        root: T::Node,
        config: &'a ParserConfig,
        order: &'a DocumentOrder<T::Node>,
        targets: &'a [Target<T::Node>],
    ) -> Self {
        Self {
            tree,
            root,
            config,
            order,
            targets,
            index: TargetIndex::build(targets, order),
            levels: LevelTagger::new(tree, root),
        }
    }

    /// Resolves the comment ending at `signature`.
    ///
    /// A signature missing from the resolver's targets is resolved against
    /// all of them as foreign content.
    pub fn resolve(
        &self,
        signature: &Signature<T::Node>,
    ) -> Result<Boundary<T::Node>, ParseError> {
        let key = (self.position(signature.node), signature.date_offset);
        let ours = self
            .index
            .find(key)
            .filter(|entry| !self.targets[entry.target].is_heading())
            .unwrap_or(IndexEntry {
                position: key.0,
                date_offset: key.1,
                target: usize::MAX,
            });

        let narrowed = self.narrow(signature, &ours);
        let mut parts = narrowed.parts;
        let mut outdented = narrowed.outdented;
        if !narrowed.blocked {
            outdented |= self.walk_back(signature, &ours, narrowed.whole, &mut parts)?;
        }

        let elements = cleanup::finish(self.tree, self.config, self.order, signature.node, parts);
        if elements.is_empty() {
            return Err(self.unresolved(signature, UnresolvedReason::NoElements));
        }

        let author = signature
            .author
            .clone()
            .or_else(|| self.last_user_link(&elements))
            .ok_or_else(|| ParseError::AuthorUnknown {
                signature: signature.raw_text.clone(),
                position: ours.position,
            })?;

        let level = self.levels.depth(elements[0]);
        let bottom_level = self.levels.depth(elements[elements.len() - 1]);
        Ok(Boundary {
            elements,
            author,
            level,
            bottom_level,
            outdented,
        })
    }

    fn position(&self, node: T::Node) -> usize {
        self.order.position(node).unwrap_or(usize::MAX)
    }

    fn foreign(&self, node: T::Node, ours: &IndexEntry) -> Foreign {
        let Some(first) = self.order.position(node) else {
            return Foreign::default();
        };
        let mut last_node = node;
        while let Some(child) = self.tree.last_child(last_node) {
            last_node = child;
        }
        let last = self.position(last_node);

        let mut out = Foreign::default();
        for entry in self.index.range(first, last) {
            if entry.target == ours.target {
                continue;
            }
            if self.targets[entry.target].is_heading() {
                out.headings += 1;
            } else if entry.key() < ours.key() {
                out.earlier += 1;
            } else {
                out.later += 1;
            }
        }
        out
    }

    /// Nodes a backward walk never crosses.
    fn is_hard_stop(&self, node: T::Node) -> bool {
        let tag = self.tree.tag(node);
        tag.and_then(walk::heading_level).is_some()
            || tag == Some("hr")
            || self.config.is_moved_content(self.tree, node)
            || self.config.is_non_signature(self.tree, node)
    }

    fn narrow(&self, signature: &Signature<T::Node>, ours: &IndexEntry) -> Narrowed<T::Node> {
        let block = signature.block;
        let is_root = block == self.root;
        let whole = Narrowed {
            parts: vec![block],
            whole: true,
            blocked: false,
            outdented: false,
        };
        if !is_root && self.foreign(block, ours).is_clear() {
            return whole;
        }

        let children: Vec<T::Node> = self.tree.children(block).collect();
        let Some(own) = children
            .iter()
            .position(|&child| walk::contains(self.tree, child, signature.node))
        else {
            return whole;
        };

        let mut start = 0;
        let mut blocked = is_root;
        let mut outdented = false;
        for (idx, &child) in children[..own].iter().enumerate() {
            if self.config.is_outdent(self.tree, child) {
                start = idx + 1;
                blocked = true;
                outdented = true;
            } else if self.is_hard_stop(child) || !self.foreign(child, ours).is_clear() {
                start = idx + 1;
                blocked = true;
                outdented = false;
            }
        }
        if self.foreign(children[own], ours).earlier > 0 {
            blocked = true;
        }

        // Inline material between our date and a later one in the same run
        // opens the next comment; a later block only ends ours where it starts.
        let end = match children[own + 1..].iter().position(|&child| {
            let foreign = self.foreign(child, ours);
            foreign.later > 0 || foreign.headings > 0
        }) {
            Some(offset) if walk::is_inline(self.tree, children[own + 1 + offset]) => own + 1,
            Some(offset) => own + 1 + offset,
            None => children.len(),
        };

        if start == 0 && end == children.len() && !is_root {
            return Narrowed {
                whole: false,
                blocked,
                ..whole
            };
        }
        Narrowed {
            parts: children[start..end].to_vec(),
            whole: false,
            blocked,
            outdented,
        }
    }

    /// Collects leading material before the block; returns whether an
    /// outdent marker ended the walk.
    fn walk_back(
        &self,
        signature: &Signature<T::Node>,
        ours: &IndexEntry,
        mut absorbing: bool,
        parts: &mut Vec<T::Node>,
    ) -> Result<bool, ParseError> {
        let limit = self.config.limits.walk_steps;
        let mut walker = TreeWalker::new(self.tree, self.root, signature.block);
        let mut steps = 0;

        loop {
            steps += 1;
            if steps > limit {
                return Err(self.unresolved(signature, UnresolvedReason::StepLimit { limit }));
            }

            if let Some(sibling) = walker.previous_sibling() {
                if walk::is_blank(self.tree, sibling) || walk::is_metadata(self.tree, sibling) {
                    continue;
                }
                if self.config.is_outdent(self.tree, sibling) {
                    return Ok(true);
                }
                if self.is_hard_stop(sibling) || !self.foreign(sibling, ours).is_clear() {
                    return Ok(false);
                }
                parts.insert(0, sibling);
                continue;
            }

            let Some(parent) = walker.parent_node() else {
                return Ok(false);
            };
            if parent == self.root || self.is_hard_stop(parent) {
                return Ok(false);
            }
            let foreign = self.foreign(parent, ours);
            if foreign.earlier > 0 {
                return Ok(false);
            }
            if absorbing && foreign.is_clear() {
                parts.clear();
                parts.push(parent);
            } else {
                absorbing = false;
            }
        }
    }

    fn last_user_link(&self, elements: &[T::Node]) -> Option<String> {
        let mut found = None;
        for &element in elements {
            let mut walker = TreeWalker::new(self.tree, element, element);
            let mut next = Some(element);
            while let Some(node) = next {
                if self.tree.kind(node) == NodeKind::Element
                    && self.tree.tag(node) == Some("a")
                    && let Some(author) = user_from_link(self.tree, node, self.config)
                {
                    found = Some(author);
                }
                next = walker.next_node();
            }
        }
        found
    }

    fn unresolved(&self, signature: &Signature<T::Node>, reason: UnresolvedReason) -> ParseError {
        ParseError::BoundaryUnresolved {
            signature: signature.raw_text.clone(),
            position: self.position(signature.node),
            reason,
        }
    }
}
