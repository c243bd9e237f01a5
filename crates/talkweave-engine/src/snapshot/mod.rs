//! # Snapshot Testing Support
//!
//! Utilities for testing a parsing pass via snapshot assertions and invariant checks.
//!
//! ## Modules
//!
//! - **`normalize`**: Converts a `Discussion` to a stable, serializable `Snap` for
//!   `insta` snapshot testing and idempotence comparisons
//! - **`invariants`**: Runtime checks of the discussion graph (document order,
//!   non-empty boundaries, parent levels and sections)

pub mod invariants;
pub mod normalize;

pub use invariants::check as invariants;
pub use normalize::{CommentSnap, SectionSnap, Snap, normalize};
