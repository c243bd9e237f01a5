use std::sync::LazyLock;

use regex::Regex;

static HTML_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static INTERNAL_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[(?:[^|\]\[]*\|)?([^\]\[]*)\]\]").unwrap());
static EXTERNAL_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(?:https?:)?//[^\s\]]+\s*([^\]]*)\]").unwrap());
static TEMPLATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{[^{}]*\}\}").unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?[A-Za-z][^<>]*>").unwrap());
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"'{2,}").unwrap());

/// Rounds of template removal; each round peels one nesting level.
const TEMPLATE_DEPTH: usize = 4;

/// Approximate visible text of a wikitext fragment, for word comparison.
pub fn strip_markup(code: &str) -> String {
    let mut text = HTML_COMMENT.replace_all(code, "").into_owned();
    for _ in 0..TEMPLATE_DEPTH {
        let next = TEMPLATE.replace_all(&text, "");
        if next.len() == text.len() {
            break;
        }
        text = next.into_owned();
    }
    let text = INTERNAL_LINK.replace_all(&text, "$1");
    let text = EXTERNAL_LINK.replace_all(&text, "$1");
    let text = TAG.replace_all(&text, "");
    let text = EMPHASIS.replace_all(&text, "");
    html_escape::decode_html_entities(&text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Plain text", "Plain text")]
    #[case("See [[Main Page|the main page]] and [[Help]]", "See the main page and Help")]
    #[case("'''Bold''' and ''italic''", "Bold and italic")]
    #[case("a {{tl|{{nested}}}} b", "a  b")]
    #[case("x <!-- hidden --> <small>y</small>", "x  y")]
    #[case("[https://example.org Example] &amp; more", "Example & more")]
    fn strips(#[case] code: &str, #[case] expected: &str) {
        assert_eq!(strip_markup(code), expected);
    }
}
