use std::fmt;

use chrono::{DateTime, Utc};

/// Index of a comment within one parsing pass.
///
/// Ids are sequential in document order and mean nothing across passes; use
/// [`CommentKey`] to recognise a comment again after re-parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommentId(pub usize);

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Identity of a comment that survives re-parsing an unchanged page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommentKey {
    pub author: String,
    pub date_text: String,
    pub level: usize,
}

/// One signed contribution.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment<N> {
    pub id: CommentId,
    pub author: String,
    pub timestamp: Option<DateTime<Utc>>,
    /// Timestamp exactly as rendered.
    pub date_text: String,
    /// Rendered signature, from the author link to the end of the date.
    pub signature_text: String,
    pub is_unsigned_template: bool,
    /// Reply nesting level; 0 for unindented comments.
    pub level: usize,
    pub bottom_level: usize,
    /// Rendered content nodes, in document order. Never empty.
    pub elements: Vec<N>,
    /// Visible text without the signature; paragraphs separated by `\n`.
    pub text: String,
    /// First comment under its heading.
    pub is_opening_section: bool,
    pub is_outdented: bool,
    /// Document position of the signature's date.
    pub position: usize,
}

impl<N> Comment<N> {
    pub fn key(&self) -> CommentKey {
        CommentKey {
            author: self.author.clone(),
            date_text: self.date_text.clone(),
            level: self.level,
        }
    }
}
