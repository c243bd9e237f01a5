use crate::discussion::CommentId;

/// Failures surfaced by a parsing pass or a source lookup.
///
/// None of these abort a pass: resolver and assembler failures are collected
/// per target, and locator failures are returned to the caller for that
/// comment only.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("unresolved comment boundary for {signature:?} at position {position}: {reason}")]
    BoundaryUnresolved {
        signature: String,
        position: usize,
        reason: UnresolvedReason,
    },
    #[error("no author found for {signature:?} at position {position}")]
    AuthorUnknown { signature: String, position: usize },
    #[error("comment {comment} not found in source: {reason}")]
    SourceNotFound {
        comment: CommentId,
        reason: NotFoundReason,
    },
    #[error(
        "comment {comment}: opens section = {opens_section}, but heading in source = {heading_found}"
    )]
    AmbiguousSection {
        comment: CommentId,
        opens_section: bool,
        heading_found: bool,
    },
    #[error("invalid pattern {name}: {message}")]
    InvalidPattern { name: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UnresolvedReason {
    #[error("walk exceeded {limit} steps")]
    StepLimit { limit: usize },
    #[error("no content elements left")]
    NoElements,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NotFoundReason {
    #[error("author and timestamp never occur")]
    NoOccurrences,
    #[error("no candidate passed the overlap or context checks")]
    NoMatch,
}
