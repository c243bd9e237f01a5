use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::ParserConfig;
use crate::signature::Signature;
use crate::tree::{PageTree, walk};

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());
static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\p{L}{2,}").unwrap());

/// Visible text of a comment with its signature cut off.
///
/// Runs of inline nodes form one line; every block starts a new one.
pub fn comment_text<T: PageTree>(
    tree: &T,
    config: &ParserConfig,
    elements: &[T::Node],
    signature: &Signature<T::Node>,
) -> String {
    let mut raw = String::new();
    let mut in_line = false;
    for &element in elements {
        let inline = walk::is_inline(tree, element);
        if !inline || !in_line {
            raw.push('\n');
        }
        raw.push_str(&walk::text_content(tree, element));
        in_line = inline;
    }
    let mut text = normalize(&raw);

    let signature_text = normalize(&signature.raw_text);
    let cut = text
        .rfind(&signature_text)
        .or_else(|| text.rfind(&signature.date_text));
    if let Some(cut) = cut {
        text.truncate(cut);
    }
    let trimmed = text.trim_end();
    let trimmed = config.signature_prefix.replace(trimmed, "");
    trimmed.trim_end().to_string()
}

/// Collapses horizontal whitespace and drops blank lines.
pub fn normalize(text: &str) -> String {
    text.lines()
        .map(|line| WHITESPACE.replace_all(line.trim(), " "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Distinct lowercase words of two letters or more.
pub fn words(text: &str) -> HashSet<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Shared words divided by the larger vocabulary; two empty texts agree fully.
pub fn overlap(a: &str, b: &str) -> f64 {
    let a = words(a);
    let b = words(b);
    let larger = a.len().max(b.len());
    if larger == 0 {
        return 1.0;
    }
    a.intersection(&b).count() as f64 / larger as f64
}
