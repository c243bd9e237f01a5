//! # Source Location
//!
//! Maps a rendered [`Comment`] back to the span of page source that produced
//! it, so an editor can rewrite or reply to exactly that text.
//!
//! There is no byte-accurate link between the two, so the locator scans the
//! source for the comment's author + date signature and scores every
//! occurrence:
//!
//! 1. the message code of a candidate runs from the end of the previous
//!    source signature to the candidate's signature, minus any leading
//!    heading, markup comment or horizontal rule
//! 2. candidates whose code shares too few words with the rendered text are
//!    dropped; the rest rank by overlap, then by whether the preceding source
//!    signature matches the preceding comment, then by heading consistency
//! 3. when nothing clears the threshold, the chain of preceding signatures
//!    must match the chain of preceding comments instead
//!
//! ## Modules
//!
//! - **`scan`**: signature patterns over wikitext
//! - **`markup`**: wikitext to plain text for word comparison
//! - **`indent`**: list-marker indentation of a comment and its replies
//! - **`span`**: byte ranges into the source

pub mod indent;
pub mod markup;
pub mod scan;
pub mod span;

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::ParserConfig;
use crate::discussion::{Comment, CommentId, Discussion, text};
use crate::error::{NotFoundReason, ParseError};

pub use indent::{Indentation, indentation};
pub use scan::{SourceScanner, SourceSignature, same_user};
pub use span::Span;

static HEADING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(={1,6})[ \t]*(.+?)[ \t]*=+[ \t]*(?:\n|$)").unwrap());
static ANY_HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^=.*=[ \t]*$").unwrap());
static LEADING_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?s)<!--.*?-->").unwrap());
static RULE_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-{4,}[ \t]*(?:\n|$)").unwrap());
static TRAILING_BLANKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:[ \t\u{a0}]|&nbsp;|&#160;)+$").unwrap());
static DANGLING_OPENER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:<(?:small|span|sup|sub|font|b|i|u|s)\b[^<>]*>|'{2,5})[ \t]*$").unwrap()
});

/// A heading found directly above a comment's code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingInfo {
    pub level: u8,
    pub text: String,
    pub offset: usize,
}

/// Where a comment sits in the page source.
///
/// Offsets are byte offsets with `line_start <= start <= end <= signature_end`.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLocation {
    /// Start of the line the comment's first line begins on.
    pub line_start: usize,
    /// First byte of the comment's own text, after its list markers.
    pub start: usize,
    /// End of the comment's text; the signature literal starts here.
    pub end: usize,
    /// End of the signature's date.
    pub signature_end: usize,
    /// `source[start..end]`.
    pub code: String,
    pub indentation: String,
    pub reply_indentation: String,
    /// `source[end..signature_end]`, including any separator before the author link.
    pub signature_literal: String,
    pub heading: Option<HeadingInfo>,
    /// Word overlap between `code` and the rendered text.
    pub overlap: f64,
    /// Non-fatal inconsistencies noticed while locating.
    pub warnings: Vec<ParseError>,
}

#[derive(Debug, Clone)]
struct Candidate {
    signature: Span,
    /// Message code start after leading heading and markup were stripped.
    code_start: usize,
    heading: Option<HeadingInfo>,
    /// Index of the closest source signature ending before this one.
    preceding: Option<usize>,
    overlap: f64,
}

/// Locates `id`'s source span in `source`.
pub fn locate<N>(
    discussion: &Discussion<N>,
    id: CommentId,
    source: &str,
    config: &ParserConfig,
) -> Result<SourceLocation, ParseError> {
    let scanner = SourceScanner::new(config)?;
    let signatures = scanner.signatures(source, config);
    locate_with(discussion, id, source, config, &scanner, &signatures)
}

fn locate_with<N>(
    discussion: &Discussion<N>,
    id: CommentId,
    source: &str,
    config: &ParserConfig,
    scanner: &SourceScanner,
    signatures: &[SourceSignature],
) -> Result<SourceLocation, ParseError> {
    let not_found = |reason| ParseError::SourceNotFound { comment: id, reason };
    let comment = discussion
        .comment(id)
        .ok_or_else(|| not_found(NotFoundReason::NoOccurrences))?;

    let occurrences = scanner.occurrences(comment, source, config)?;
    if occurrences.is_empty() {
        return Err(not_found(NotFoundReason::NoOccurrences));
    }

    let candidates: Vec<Candidate> = occurrences
        .into_iter()
        .map(|signature| candidate(comment, source, signatures, signature))
        .collect();

    let previous = id.0.checked_sub(1).and_then(|i| discussion.comment(CommentId(i)));
    let headline = discussion
        .section_of(id)
        .and_then(|s| discussion.section(s))
        .map(|s| s.headline.as_str());
    let threshold = config.limits.overlap_threshold;
    let chosen = candidates
        .iter()
        .filter(|c| c.overlap >= threshold)
        .max_by(|a, b| {
            a.overlap
                .total_cmp(&b.overlap)
                .then_with(|| {
                    agrees(signatures, a.preceding, previous)
                        .cmp(&agrees(signatures, b.preceding, previous))
                })
                .then_with(|| {
                    heading_fit(a, comment, headline).cmp(&heading_fit(b, comment, headline))
                })
                // Earlier candidates win full ties.
                .then_with(|| b.signature.start.cmp(&a.signature.start))
        })
        .or_else(|| {
            log::trace!("comment {id}: no candidate above {threshold}, trying chained context");
            candidates
                .iter()
                .find(|c| chain_matches(discussion, id, signatures, c.preceding, config))
        })
        .ok_or_else(|| not_found(NotFoundReason::NoMatch))?;

    Ok(finish(comment, source, config, chosen))
}

fn candidate<N>(
    comment: &Comment<N>,
    source: &str,
    signatures: &[SourceSignature],
    signature: Span,
) -> Candidate {
    let preceding = signatures
        .partition_point(|s| s.span.end <= signature.start)
        .checked_sub(1);
    let mut code_from = preceding.map_or(0, |i| signatures[i].span.end);
    // Text above the last heading belongs to the previous section.
    if let Some(m) = ANY_HEADING
        .find_iter(Span::new(code_from, signature.start).slice(source))
        .last()
    {
        code_from += m.start();
    }
    let (code_start, heading) = strip_leading(source, code_from, signature.start);
    let code = Span::new(code_start, signature.start).slice(source);
    let overlap = text::overlap(&markup::strip_markup(code), &comment.text);
    log::trace!(
        "comment {}: candidate at {}..{} overlap {overlap:.2}",
        comment.id,
        signature.start,
        signature.end
    );
    Candidate {
        signature,
        code_start,
        heading,
        preceding,
        overlap,
    }
}

/// Skips blank lines, markup comments, horizontal rules and headings at the
/// start of `source[from..to]`; returns the new start and the last heading.
fn strip_leading(source: &str, mut from: usize, to: usize) -> (usize, Option<HeadingInfo>) {
    let mut heading = None;
    loop {
        let rest = Span::new(from, to).slice(source);
        let trimmed = rest.trim_start();
        if trimmed.len() != rest.len() {
            from += rest.len() - trimmed.len();
            continue;
        }
        if let Some(caps) = HEADING_LINE.captures(rest) {
            heading = Some(HeadingInfo {
                level: caps[1].len() as u8,
                text: caps[2].trim().to_string(),
                offset: from,
            });
            from += caps[0].len();
        } else if let Some(m) = LEADING_COMMENT.find(rest).or_else(|| RULE_LINE.find(rest)) {
            from += m.end();
        } else {
            return (from, heading);
        }
    }
}

/// 2 when a heading is present exactly when the comment opens its section
/// and names that section, 1 when only presence agrees, 0 otherwise.
fn heading_fit<N>(candidate: &Candidate, comment: &Comment<N>, headline: Option<&str>) -> u8 {
    match (&candidate.heading, comment.is_opening_section) {
        (Some(heading), true) => {
            let text = markup::strip_markup(&heading.text);
            if headline.is_some_and(|h| text::normalize(h) == text::normalize(&text)) {
                2
            } else {
                1
            }
        }
        (None, false) => 2,
        _ => 0,
    }
}

fn agrees<N>(
    signatures: &[SourceSignature],
    preceding: Option<usize>,
    comment: Option<&Comment<N>>,
) -> bool {
    match (preceding, comment) {
        (Some(i), Some(c)) => matches_comment(&signatures[i], c),
        (None, None) => true,
        _ => false,
    }
}

fn matches_comment<N>(signature: &SourceSignature, comment: &Comment<N>) -> bool {
    signature.date_text == comment.date_text
        && signature
            .author
            .as_deref()
            .is_some_and(|author| same_user(author, &comment.author))
}

/// The source signatures before a candidate against the comments before `id`.
fn chain_matches<N>(
    discussion: &Discussion<N>,
    id: CommentId,
    signatures: &[SourceSignature],
    preceding: Option<usize>,
    config: &ParserConfig,
) -> bool {
    let depth = config.limits.chain_depth.min(id.0);
    (1..=depth).all(|k| {
        let Some(signature) = preceding.and_then(|p| p.checked_sub(k - 1)) else {
            return false;
        };
        discussion
            .comment(CommentId(id.0 - k))
            .is_some_and(|c| matches_comment(&signatures[signature], c))
    })
}

fn finish<N>(
    comment: &Comment<N>,
    source: &str,
    config: &ParserConfig,
    chosen: &Candidate,
) -> SourceLocation {
    let mut end = chosen.signature.start;
    for _ in 0..config.limits.trim_passes {
        let before = end;
        let code = Span::new(chosen.code_start, end).slice(source);
        if let Some(m) = TRAILING_BLANKS.find(code) {
            end = chosen.code_start + m.start();
        }
        let code = Span::new(chosen.code_start, end).slice(source);
        if let Some(m) = config.signature_prefix.find(code) {
            end = chosen.code_start + m.start();
        }
        let code = Span::new(chosen.code_start, end).slice(source);
        if let Some(m) = DANGLING_OPENER.find(code) {
            end = chosen.code_start + m.start();
        }
        if end == before {
            break;
        }
    }

    let code = Span::new(chosen.code_start, end).slice(source);
    let indent = indentation(code, comment.level > 0);
    let start = (chosen.code_start + indent.consumed).min(end);
    let line_start = source[..chosen.code_start].rfind('\n').map_or(0, |i| i + 1);

    let mut warnings = Vec::new();
    if chosen.heading.is_some() != comment.is_opening_section {
        let warning = ParseError::AmbiguousSection {
            comment: comment.id,
            opens_section: comment.is_opening_section,
            heading_found: chosen.heading.is_some(),
        };
        log::warn!("{warning}");
        warnings.push(warning);
    }

    SourceLocation {
        line_start,
        start,
        end,
        signature_end: chosen.signature.end,
        code: Span::new(start, end).slice(source).to_string(),
        indentation: indent.markers,
        reply_indentation: indent.reply,
        signature_literal: Span::new(end, chosen.signature.end).slice(source).to_string(),
        heading: chosen.heading.clone(),
        overlap: chosen.overlap,
        warnings,
    }
}

/// Locates comments of one discussion in one revision of its source,
/// memoizing each answer.
pub struct SourceLocator<'d, N> {
    discussion: &'d Discussion<N>,
    config: &'d ParserConfig,
    source: String,
    scanner: SourceScanner,
    signatures: Vec<SourceSignature>,
    cache: RefCell<HashMap<CommentId, Result<SourceLocation, ParseError>>>,
}

impl<'d, N> SourceLocator<'d, N> {
    pub fn new(
        discussion: &'d Discussion<N>,
        config: &'d ParserConfig,
        source: impl Into<String>,
    ) -> Result<Self, ParseError> {
        let source = source.into();
        let scanner = SourceScanner::new(config)?;
        let signatures = scanner.signatures(&source, config);
        log::debug!("source has {} signatures", signatures.len());
        Ok(Self {
            discussion,
            config,
            source,
            scanner,
            signatures,
            cache: RefCell::new(HashMap::new()),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Signatures found in the source, in order.
    pub fn signatures(&self) -> &[SourceSignature] {
        &self.signatures
    }

    pub fn locate(&self, id: CommentId) -> Result<SourceLocation, ParseError> {
        if let Some(found) = self.cache.borrow().get(&id) {
            return found.clone();
        }
        let found = locate_with(
            self.discussion,
            id,
            &self.source,
            self.config,
            &self.scanner,
            &self.signatures,
        );
        if let Err(e) = &found {
            log::warn!("{e}");
        }
        self.cache.borrow_mut().insert(id, found.clone());
        found
    }
}
