use std::fmt;

use super::CommentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SectionId(pub usize);

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// A heading and the comments directly under it.
#[derive(Debug, Clone, PartialEq)]
pub struct Section<N> {
    pub id: SectionId,
    pub headline: String,
    /// Heading level, 1 to 6.
    pub level: u8,
    /// Comments between this heading and the next one, in document order.
    pub comments: Vec<CommentId>,
    /// Nearest preceding section with a lower heading level.
    pub parent: Option<SectionId>,
    pub node: N,
    pub position: usize,
}
