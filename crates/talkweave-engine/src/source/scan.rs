use regex::Regex;

use super::span::Span;
use crate::config::ParserConfig;
use crate::discussion::Comment;
use crate::error::ParseError;

/// A signature found in page source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSignature {
    /// From the author link (or template start) to the end of the date.
    pub span: Span,
    pub author: Option<String>,
    pub date_text: String,
}

/// Finds signatures in wikitext.
#[derive(Debug, Clone)]
pub struct SourceScanner {
    prefixes: String,
    user_link: Regex,
    unsigned: Regex,
}

const UNSIGNED_TEMPLATE: &str = r"\{\{\s*(?:subst:\s*)?(?i:unsigned)[\w ]*\|";

impl SourceScanner {
    pub fn new(config: &ParserConfig) -> Result<Self, ParseError> {
        let prefixes = config
            .user_link_prefixes
            .iter()
            .map(|p| flexible(p.trim()))
            .collect::<Vec<_>>()
            .join("|");
        let user_link = compile(
            "user link",
            &format!(r"\[\[[ _]*:?[ _]*(?i:{prefixes})[ _]*(?P<user>[^|\]\[#/\n]+?)[ _]*[|\]#/]"),
        )?;
        let unsigned = compile(
            "unsigned template",
            &format!(r"{UNSIGNED_TEMPLATE}\s*(?P<user>[^|{{}}]+?)\s*(?:\|[^{{}}]*)?\}}\}}"),
        )?;
        Ok(Self {
            prefixes,
            user_link,
            unsigned,
        })
    }

    /// Every signature in `source`, in order.
    pub fn signatures(&self, source: &str, config: &ParserConfig) -> Vec<SourceSignature> {
        let templates: Vec<(Span, String)> = self
            .unsigned
            .captures_iter(source)
            .filter_map(|caps| Some((Span::from(caps.get(0)?.range()), caps["user"].to_string())))
            .collect();

        let mut out = Vec::new();
        let mut previous_end = 0;
        for date in config.timestamp.find_all(source) {
            let date = Span::from(date);
            if date.start < previous_end {
                continue;
            }
            let date_text = date.slice(source).to_string();
            if let Some((template, user)) = templates.iter().find(|(t, _)| t.contains(date)) {
                out.push(SourceSignature {
                    span: *template,
                    author: Some(user.clone()),
                    date_text,
                });
                previous_end = template.end;
                continue;
            }

            let line_start = source[..date.start].rfind('\n').map_or(0, |i| i + 1);
            let reach = char_floor(source, date.start.saturating_sub(config.limits.signature_length));
            let window = Span::new(previous_end.max(line_start).max(reach), date.start);
            let link = self
                .user_link
                .captures_iter(window.slice(source))
                .last()
                .and_then(|caps| {
                    let whole = caps.get(0)?;
                    Some((window.start + whole.start(), caps["user"].replace('_', " ")))
                });
            let (start, author) = match link {
                Some((start, author)) => (start, Some(author)),
                None => (date.start, None),
            };
            out.push(SourceSignature {
                span: Span::new(start, date.end),
                author,
                date_text,
            });
            previous_end = date.end;
        }
        out
    }

    /// Signature spans in `source` that could belong to `comment`.
    pub fn occurrences<N>(
        &self,
        comment: &Comment<N>,
        source: &str,
        config: &ParserConfig,
    ) -> Result<Vec<Span>, ParseError> {
        let author = flexible_name(&comment.author);
        let date = regex::escape(&comment.date_text);

        if comment.is_unsigned_template {
            let pattern = compile(
                "comment signature",
                &format!(r"{UNSIGNED_TEMPLATE}\s*{author}\s*\|[^{{}}]*?{date}[^{{}}]*\}}\}}"),
            )?;
            return Ok(pattern.find_iter(source).map(|m| m.range().into()).collect());
        }

        let link = format!(r"\[\[[ _]*:?[ _]*(?i:{})[ _]*{author}[ _]*[|\]#/]", self.prefixes);
        let limit = config.limits.signature_length;
        let pattern = compile("comment signature", &format!(r"{link}[^\n]{{0,{limit}}}?{date}"))?;
        let link = compile("comment author link", &link)?;

        Ok(pattern
            .find_iter(source)
            .filter_map(|m| {
                // The gap may run through an earlier signature; restart after its date.
                let text = m.as_str();
                let date_start = text.len() - comment.date_text.len();
                let after = config
                    .timestamp
                    .find_all(&text[..date_start])
                    .last()
                    .map_or(0, |r| r.end);
                let l = link.find_at(text, after)?;
                Some(Span::new(m.start() + l.start(), m.end()))
            })
            .collect())
    }
}

/// Whether two user names refer to the same account: underscores equal spaces
/// and the first letter is case-insensitive.
pub fn same_user(a: &str, b: &str) -> bool {
    let norm = |name: &str| {
        let name = name.replace('_', " ");
        let mut chars = name.trim().chars();
        chars
            .next()
            .map(|first| first.to_uppercase().chain(chars).collect::<String>())
            .unwrap_or_default()
    };
    norm(a) == norm(b)
}

fn flexible(literal: &str) -> String {
    regex::escape(literal).replace(' ', "[ _]+")
}

fn flexible_name(name: &str) -> String {
    let name = name.trim();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() => {
            format!("(?i:{}){}", regex::escape(&first.to_string()), flexible(chars.as_str()))
        }
        _ => flexible(name),
    }
}

fn char_floor(source: &str, mut index: usize) -> usize {
    while !source.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn compile(name: &str, pattern: &str) -> Result<Regex, ParseError> {
    Regex::new(pattern).map_err(|e| ParseError::InvalidPattern {
        name: name.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = "== Topic ==\n* Hello. --[[User:Alice|Alice]] 12:00, 1 January 2020 (UTC)\n** Reply. --[[User talk:Bob_Smith|talk]] 13:00, 1 January 2020 (UTC)\n:Question? {{unsigned|192.0.2.1|14:00, 1 January 2020 (UTC)}}\n";

    #[test]
    fn finds_generic_signatures() {
        let config = ParserConfig::default();
        let scanner = SourceScanner::new(&config).unwrap();
        let sigs = scanner.signatures(SOURCE, &config);
        let summary: Vec<_> = sigs
            .iter()
            .map(|s| (s.author.clone().unwrap_or_default(), s.span.slice(SOURCE).to_string()))
            .collect();
        assert_eq!(
            summary,
            [
                (
                    "Alice".to_string(),
                    "[[User:Alice|Alice]] 12:00, 1 January 2020 (UTC)".to_string()
                ),
                (
                    "Bob Smith".to_string(),
                    "[[User talk:Bob_Smith|talk]] 13:00, 1 January 2020 (UTC)".to_string()
                ),
                (
                    "192.0.2.1".to_string(),
                    "{{unsigned|192.0.2.1|14:00, 1 January 2020 (UTC)}}".to_string()
                ),
            ]
        );
    }

    #[test]
    fn same_user_ignores_underscores_and_first_letter_case() {
        assert!(same_user("bob_Smith", "Bob Smith"));
        assert!(!same_user("Bob smith", "Bob Smith"));
    }
}
