use std::ops::Range;

use regex::Regex;

use super::timestamp::TimestampParser;
use crate::error::ParseError;

/// Uncompiled entry of the signature pattern table.
///
/// `template` is a regular expression in which `{timestamp}` stands for the
/// locale's timestamp pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternSpec {
    pub name: String,
    pub template: String,
    pub author_group: Option<String>,
    pub date_group: Option<String>,
    /// Matches come from an "unsigned comment" template rather than a
    /// signature typed by the author.
    pub unsigned: bool,
}

/// The built-in table, highest priority first.
pub fn default_patterns() -> Vec<PatternSpec> {
    vec![
        PatternSpec {
            name: "unsigned".to_string(),
            template: r"(?:—|--|-)?\s*Preceding unsigned comment added by (?P<author>[^()\n]+?)\s*(?:\([^()\n]*\)\s*)*(?P<date>{timestamp})".to_string(),
            author_group: Some("author".to_string()),
            date_group: Some("date".to_string()),
            unsigned: true,
        },
        PatternSpec {
            name: "timestamp".to_string(),
            template: r"(?P<date>{timestamp})".to_string(),
            author_group: None,
            date_group: Some("date".to_string()),
            unsigned: false,
        },
    ]
}

#[derive(Debug, Clone)]
pub struct SignaturePattern {
    pub name: String,
    regex: Regex,
    author_group: Option<String>,
    date_group: Option<String>,
    unsigned: bool,
}

/// One hit of a pattern inside a block's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub range: Range<usize>,
    pub author: Option<Range<usize>>,
    pub date: Option<Range<usize>>,
    pub unsigned: bool,
}

impl SignaturePattern {
    pub fn compile(spec: &PatternSpec, timestamp: &TimestampParser) -> Result<Self, ParseError> {
        let source = spec.template.replace("{timestamp}", timestamp.pattern());
        let regex = Regex::new(&source).map_err(|e| ParseError::InvalidPattern {
            name: spec.name.clone(),
            message: e.to_string(),
        })?;

        for group in spec.author_group.iter().chain(spec.date_group.iter()) {
            if !regex.capture_names().flatten().any(|name| name == group) {
                return Err(ParseError::InvalidPattern {
                    name: spec.name.clone(),
                    message: format!("missing capture group {group:?}"),
                });
            }
        }

        Ok(Self {
            name: spec.name.clone(),
            regex,
            author_group: spec.author_group.clone(),
            date_group: spec.date_group.clone(),
            unsigned: spec.unsigned,
        })
    }

    pub fn matches(&self, text: &str) -> Vec<PatternMatch> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let group = |name: &Option<String>| {
                    name.as_deref()
                        .and_then(|n| caps.name(n))
                        .map(|m| m.range())
                        .filter(|r| !r.is_empty())
                };
                Some(PatternMatch {
                    range: whole.range(),
                    author: group(&self.author_group),
                    date: group(&self.date_group),
                    unsigned: self.unsigned,
                })
            })
            .collect()
    }
}

/// Runs the table over `text`. A match is kept only if no higher-priority
/// pattern already claimed any of its bytes. Results are in text order.
pub fn scan_table(patterns: &[SignaturePattern], text: &str) -> Vec<PatternMatch> {
    let mut accepted: Vec<PatternMatch> = Vec::new();
    for pattern in patterns {
        for candidate in pattern.matches(text) {
            let overlaps = accepted
                .iter()
                .any(|m| candidate.range.start < m.range.end && m.range.start < candidate.range.end);
            if !overlaps {
                accepted.push(candidate);
            }
        }
    }
    accepted.sort_by_key(|m| m.range.start);
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::timestamp::Locale;
    use pretty_assertions::assert_eq;

    fn table() -> Vec<SignaturePattern> {
        let ts = TimestampParser::new(&Locale::default()).unwrap();
        default_patterns()
            .iter()
            .map(|spec| SignaturePattern::compile(spec, &ts).unwrap())
            .collect()
    }

    #[test]
    fn unsigned_template_wins_over_bare_timestamp() {
        let text = "Question? — Preceding unsigned comment added by 192.0.2.1 (talk) 12:00, 1 January 2020 (UTC)";
        let found = scan_table(&table(), text);
        assert_eq!(found.len(), 1);
        assert!(found[0].unsigned);
        assert_eq!(&text[found[0].author.clone().unwrap()], "192.0.2.1");
        assert_eq!(
            &text[found[0].date.clone().unwrap()],
            "12:00, 1 January 2020 (UTC)"
        );
    }

    #[test]
    fn bare_timestamps_are_found_in_order() {
        let text = "A 12:00, 1 January 2020 (UTC) B 13:00, 1 January 2020 (UTC)";
        let found = scan_table(&table(), text);
        let dates: Vec<_> = found
            .iter()
            .map(|m| &text[m.date.clone().unwrap()])
            .collect();
        assert_eq!(
            dates,
            ["12:00, 1 January 2020 (UTC)", "13:00, 1 January 2020 (UTC)"]
        );
        assert!(found.iter().all(|m| m.author.is_none() && !m.unsigned));
    }

    #[test]
    fn missing_group_is_rejected() {
        let ts = TimestampParser::new(&Locale::default()).unwrap();
        let spec = PatternSpec {
            name: "broken".to_string(),
            template: "{timestamp}".to_string(),
            author_group: None,
            date_group: Some("date".to_string()),
            unsigned: false,
        };
        assert!(matches!(
            SignaturePattern::compile(&spec, &ts),
            Err(ParseError::InvalidPattern { name, .. }) if name == "broken"
        ));
    }
}
