//! # talkweave-engine
//!
//! Segments rendered wiki discussion pages into comments and sections, and
//! reconciles each comment with the span of page source it came from.
//!
//! A pass runs leaves first: `targets` finds headings and signatures,
//! `boundary` decides which nodes belong to each signature's comment,
//! `discussion` assembles the comment/section graph, and `source` locates
//! comments in wikitext on demand. The page is only ever read.
//!
//! ## Modules
//!
//! - **`tree`**: the `PageTree` abstraction, traversal helpers and the `scraper` adapter
//! - **`signature`**: timestamp parsing and the signature pattern table
//! - **`targets`**: heading detection and target collection
//! - **`boundary`**: per-signature boundary resolution and nesting levels
//! - **`discussion`**: `Comment`, `Section` and the `Discussion` graph
//! - **`source`**: `SourceLocator`
//! - **`config`**: `ParserConfig` and tunable `Limits`
//! - **`snapshot`**: normalization and invariant checks for tests

pub mod boundary;
pub mod config;
pub mod discussion;
pub mod error;
pub mod signature;
pub mod snapshot;
pub mod source;
pub mod targets;
pub mod tree;

pub use config::{Limits, ParserConfig};
pub use discussion::{
    Comment, CommentId, CommentKey, Discussion, DiscussionParser, Section, SectionId,
    parse_discussion,
};
pub use error::{NotFoundReason, ParseError, UnresolvedReason};
pub use signature::{Locale, PatternSpec, default_patterns};
pub use source::{HeadingInfo, SourceLocation, SourceLocator, locate};
pub use targets::{HeadingDetector, HeadingTarget, TagHeadingDetector};
pub use tree::{HtmlPage, PageTree};
