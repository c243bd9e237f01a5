use std::sync::LazyLock;

use regex::Regex;

static MARKERS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[:*#]+").unwrap());

/// List-marker runs of a comment's source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indentation {
    /// Markers opening the comment's first line.
    pub markers: String,
    /// Markers a reply to the comment should use.
    pub reply: String,
    /// Bytes consumed from the start of the code: the markers plus following blanks.
    pub consumed: usize,
}

/// Leading list markers of `code`.
///
/// For replies, a marker run on a later line that is no deeper than the first
/// line's run is the comment's real indentation; the deeper first run then
/// becomes the reply indentation.
pub fn indentation(code: &str, is_reply: bool) -> Indentation {
    let markers = MARKERS
        .find(code)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    let blanks = code[markers.len()..]
        .bytes()
        .take_while(|b| matches!(b, b' ' | b'\t'))
        .count();
    let consumed = markers.len() + blanks;

    let later = if is_reply && !markers.is_empty() {
        code.lines()
            .skip(1)
            .filter_map(|line| MARKERS.find(line).map(|m| m.as_str()))
            .find(|run| run.len() <= markers.len())
    } else {
        None
    };

    match later {
        Some(run) if run.len() < markers.len() => Indentation {
            reply: markers.clone(),
            markers: run.to_string(),
            consumed,
        },
        Some(run) => Indentation {
            reply: reply_to(run),
            markers: run.to_string(),
            consumed,
        },
        None => Indentation {
            reply: reply_to(&markers),
            markers,
            consumed,
        },
    }
}

/// Markers one level deeper than `markers`.
pub fn reply_to(markers: &str) -> String {
    let next = match markers.chars().last() {
        Some('#') | None => ':',
        Some(last) => last,
    };
    format!("{markers}{next}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "", ":")]
    #[case(":", ":", "::")]
    #[case("*", "*", "**")]
    #[case("#", "#", "#:")]
    #[case(":*", ":*", ":**")]
    fn replies_go_one_level_deeper(#[case] code: &str, #[case] markers: &str, #[case] reply: &str) {
        let found = indentation(&format!("{code} text"), false);
        assert_eq!(found.markers, markers);
        assert_eq!(found.reply, reply);
    }

    #[test]
    fn consumed_covers_markers_and_blanks() {
        let found = indentation("::  Hello", true);
        assert_eq!(found.consumed, 4);
    }

    #[test]
    fn shallower_later_line_becomes_canonical_for_replies() {
        let found = indentation(":::Quoted start\n::My answer", true);
        assert_eq!(found.markers, "::");
        assert_eq!(found.reply, ":::");
        assert!(found.reply.len() > found.markers.len());

        let top = indentation(":::Quoted start\n::My answer", false);
        assert_eq!(top.markers, ":::");
    }
}
