use criterion::{Criterion, criterion_group, criterion_main};
use talkweave_engine::{CommentId, HtmlPage, ParserConfig, SourceLocator, parse_discussion};

/// A page of `sections` topics, each a reply chain `depth` deep, plus its wikitext.
fn generate_talk_page(sections: usize, depth: usize) -> (String, String) {
    let mut html = String::from(r#"<div class="mw-parser-output">"#);
    let mut source = String::new();
    let mut minute = 0;
    for section in 0..sections {
        html.push_str(&format!("<h2>Topic {section}</h2>"));
        source.push_str(&format!("== Topic {section} ==\n"));
        for level in 0..depth {
            minute += 1;
            let user = format!("User{}", minute % 7);
            let date = format!(
                "{:02}:{:02}, 1 January 2020 (UTC)",
                minute / 60 % 24,
                minute % 60
            );
            let body = format!("Comment number {minute} about topic {section}.");
            let open = if level == 0 { "<p>" } else { "<dl><dd>" };
            html.push_str(&format!(
                r#"{open}{body} <a href="/wiki/User:{user}" title="User:{user}">{user}</a> {date}"#
            ));
            source.push_str(&format!(
                "{}{body} [[User:{user}|{user}]] {date}\n",
                ":".repeat(level)
            ));
            if level == 0 {
                html.push_str("</p>");
            }
        }
        html.push_str(&"</dd></dl>".repeat(depth.saturating_sub(1)));
    }
    html.push_str("</div>");
    (html, source)
}

fn bench_full_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("discussion");
    group.sample_size(10);

    let (html, source) = generate_talk_page(50, 6);
    let page = HtmlPage::parse(&html);
    let config = ParserConfig::default();

    group.bench_function("parse_discussion", |b| {
        b.iter(|| {
            let discussion =
                parse_discussion(&page, page.content_root(), std::hint::black_box(&config));
            std::hint::black_box(discussion);
        });
    });

    let discussion = parse_discussion(&page, page.content_root(), &config);
    group.bench_function("locate_all", |b| {
        b.iter(|| {
            let locator = SourceLocator::new(&discussion, &config, source.as_str()).unwrap();
            for i in 0..discussion.comments().len() {
                std::hint::black_box(locator.locate(CommentId(i)).ok());
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_full_pass);
criterion_main!(benches);
