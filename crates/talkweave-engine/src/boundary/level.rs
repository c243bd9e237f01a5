use std::cell::RefCell;
use std::collections::HashMap;

use crate::tree::{PageTree, walk};

/// Tags list containers with their reply nesting level, memoized per list.
///
/// A `ul`/`dl` sits one level below the nearest enclosing list. An `ol` only
/// opens a level when no list encloses it; a numbered list inside a reply is
/// content of that reply, not a deeper reply.
pub struct LevelTagger<'a, T: PageTree> {
    tree: &'a T,
    root: T::Node,
    cache: RefCell<HashMap<T::Node, usize>>,
}

impl<'a, T: PageTree> LevelTagger<'a, T> {
    pub fn new(tree: &'a T, root: T::Node) -> Self {
        Self {
            tree,
            root,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Level of the nearest list strictly enclosing `node`, 0 outside lists.
    pub fn depth(&self, node: T::Node) -> usize {
        let mut current = node;
        while current != self.root {
            let Some(parent) = self.tree.parent(current) else {
                break;
            };
            if parent == self.root {
                break;
            }
            if self.tree.tag(parent).is_some_and(walk::is_list_tag) {
                return self.list_level(parent);
            }
            current = parent;
        }
        0
    }

    pub fn list_level(&self, list: T::Node) -> usize {
        if let Some(&level) = self.cache.borrow().get(&list) {
            return level;
        }
        let enclosing = self.depth(list);
        let level = match self.tree.tag(list) {
            Some("ol") if enclosing > 0 => enclosing,
            _ => enclosing + 1,
        };
        self.cache.borrow_mut().insert(list, level);
        level
    }
}
