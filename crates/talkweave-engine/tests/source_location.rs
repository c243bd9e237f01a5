use pretty_assertions::assert_eq;
use talkweave_engine::discussion::text::overlap;
use talkweave_engine::source::markup::strip_markup;
use talkweave_engine::{
    CommentId, HtmlPage, NotFoundReason, ParseError, ParserConfig, SourceLocator, parse_discussion,
};

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap()
}

#[test]
fn reply_chain_indentation() {
    let page = HtmlPage::parse(&fixture("reply_chain.html"));
    let config = ParserConfig::default();
    let discussion = parse_discussion(&page, page.content_root(), &config);
    let source = fixture("reply_chain.wikitext");
    let locator = SourceLocator::new(&discussion, &config, source.as_str()).unwrap();

    let alice = locator.locate(CommentId(0)).unwrap();
    assert_eq!(alice.indentation, "*");
    assert_eq!(alice.reply_indentation, "**");
    assert_eq!(alice.code, "Hello.");
    assert_eq!(
        alice.signature_literal,
        " --[[User:Alice|Alice]] 12:00, 1 January 2020 (UTC)"
    );

    let bob = locator.locate(CommentId(1)).unwrap();
    assert_eq!(bob.indentation, "**");
    assert_eq!(bob.reply_indentation, "***");
    assert_eq!(bob.code, "Reply.");
    assert_eq!(&source[bob.line_start..bob.start], "** ");
}

#[test]
fn talk_page_round_trip() {
    let page = HtmlPage::parse(&fixture("talk_page.html"));
    let config = ParserConfig::default();
    let discussion = parse_discussion(&page, page.content_root(), &config);
    let source = fixture("talk_page.wikitext");
    let locator = SourceLocator::new(&discussion, &config, source.as_str()).unwrap();

    let mut indentation = Vec::new();
    for comment in discussion.comments() {
        let location = locator.locate(comment.id).unwrap();
        assert!(location.start <= location.end && location.end <= source.len());
        assert!(location.line_start <= location.start);
        assert_eq!(&source[location.start..location.end], location.code);
        assert!(
            overlap(&strip_markup(&location.code), &comment.text) >= 0.67,
            "{}: {:?} vs {:?}",
            comment.id,
            location.code,
            comment.text
        );
        assert!(location.warnings.is_empty(), "{:?}", location.warnings);
        indentation.push(location.indentation);
    }
    assert_eq!(indentation, ["", ":", "::", "", ""]);

    let sources = locator.locate(CommentId(4)).unwrap();
    assert_eq!(
        sources.heading.map(|h| (h.level, h.text)),
        Some((2, "Sources".to_string()))
    );
    assert!(
        sources
            .signature_literal
            .starts_with(" {{unsigned IP|192.0.2.44|")
    );
}

#[test]
fn chained_context_disambiguates_reworded_comment() {
    let page = HtmlPage::parse(&fixture("reply_chain.html"));
    let config = ParserConfig::default();
    let discussion = parse_discussion(&page, page.content_root(), &config);
    // Bob rewrote his reply after the page was rendered.
    let source = "* Hello. --[[User:Alice|Alice]] 12:00, 1 January 2020 (UTC)\n** Entirely different wording now. --[[User:Bob|Bob]] 13:00, 1 January 2020 (UTC)\n";
    let locator = SourceLocator::new(&discussion, &config, source).unwrap();

    let bob = locator.locate(CommentId(1)).unwrap();
    assert_eq!(bob.code, "Entirely different wording now.");
    assert!(bob.overlap < 0.67);
}

#[test]
fn unknown_signature_reports_no_match_and_is_cached() {
    let page = HtmlPage::parse(&fixture("reply_chain.html"));
    let config = ParserConfig::default();
    let discussion = parse_discussion(&page, page.content_root(), &config);
    // Bob's reply now follows someone else's comment and shares no words.
    let source = "* Hello. --[[User:Alice|Alice]] 12:00, 1 January 2020 (UTC)\n* Other. --[[User:Eve|Eve]] 12:30, 1 January 2020 (UTC)\n** Something else. --[[User:Bob|Bob]] 13:00, 1 January 2020 (UTC)\n";
    let locator = SourceLocator::new(&discussion, &config, source).unwrap();

    let expected = Err(ParseError::SourceNotFound {
        comment: CommentId(1),
        reason: NotFoundReason::NoMatch,
    });
    assert_eq!(locator.locate(CommentId(1)), expected);
    assert_eq!(locator.locate(CommentId(1)), expected);
}
