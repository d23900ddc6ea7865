//! End-to-end behaviour of `Formatter::format_post`.

use std::sync::{Arc, LazyLock};

use postbake::{ChartExport, ChartExports, FormatError, PostType, TocHeading, slugify};
use regex::Regex;

mod prelude;
use prelude::*;

static DEEP_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##"<a class="deep-link" href="#([^"]+)"></a>"##).expect("deep link pattern")
});

const OUTLINE: &str = "Intro text[ref]First note[/ref]
<h2>Alpha</h2>
Body[ref]Second note[/ref]
<h3>One</h3>
More
<h3>Two</h3>
<h2>Beta</h2>
<h3>Three</h3>
<h2 id=\"footnotes\">Notes</h2>";

fn toc(text: &str, slug: &str, is_subheading: bool) -> TocHeading {
    TocHeading {
        text: text.into(),
        slug: slug.into(),
        is_subheading,
    }
}

#[tokio::test]
async fn footnotes_are_numbered_and_linked() {
    let out = formatter()
        .format_post(&post(PostType::Post, "hunger", OUTLINE), None)
        .await
        .expect("post should format");
    let ordinals: Vec<usize> = out.footnotes.iter().map(|n| n.ordinal).collect();
    assert_eq!(ordinals, vec![1, 2]);
    assert_eq!(out.footnotes[1].body, "Second note");
    for i in 1..=2 {
        assert!(out.html.contains(&format!(
            r##"<a id="ref-{i}" class="ref" href="#note-{i}"><sup>{i}</sup></a>"##
        )));
    }
}

#[tokio::test]
async fn page_headings_are_numbered_into_the_contents() {
    let out = formatter()
        .format_post(&post(PostType::Page, "hunger", OUTLINE), None)
        .await
        .expect("page should format");
    assert_eq!(
        out.toc_headings,
        vec![
            toc("I. Alpha", "alpha", false),
            toc("I.1 One", "one", true),
            toc("I.2 Two", "two", true),
            toc("II. Beta", "beta", false),
            toc("II.1 Three", "three", true),
            toc("Notes", "footnotes", false),
        ]
    );
    assert!(out.html.contains("</a>II.1 Three</h3>"));
}

#[rstest]
#[case(PostType::Post, "hunger")]
#[case(PostType::Page, "about")]
#[tokio::test]
async fn ineligible_documents_get_no_contents(#[case] post_type: PostType, #[case] slug: &str) {
    let out = formatter()
        .format_post(&post(post_type, slug, OUTLINE), None)
        .await
        .expect("post should format");
    assert!(out.toc_headings.is_empty());
    assert!(out.html.contains(r##"<h2 id="alpha"><a class="deep-link" href="#alpha"></a>Alpha</h2>"##));
}

#[tokio::test]
async fn every_deep_link_targets_a_heading_id() {
    let content = "<h2>Data</h2>\n<h3>Data</h3>\n<h4>Sources &amp; notes</h4>";
    let out = formatter()
        .format_post(&post(PostType::Page, "hunger", content), None)
        .await
        .expect("page should format");
    let targets: Vec<&str> = DEEP_LINK_RE
        .captures_iter(&out.html)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();
    assert_eq!(targets, vec!["data", "data-1", "sources-notes"]);
    for target in targets {
        assert!(out.html.contains(&format!("id=\"{target}\"")));
        assert_eq!(slugify(target), target);
    }
}

#[tokio::test]
async fn headings_without_words_still_get_link_targets() {
    let content = "<h2></h2>\n<h2>!!</h2>";
    let out = formatter()
        .format_post(&post(PostType::Page, "hunger", content), None)
        .await
        .expect("page should format");
    let targets: Vec<&str> = DEEP_LINK_RE
        .captures_iter(&out.html)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();
    assert_eq!(targets, vec!["section", "section-1"]);
    assert!(!out.html.contains("href=\"#\""));
    let slugs: Vec<&str> = out.toc_headings.iter().map(|h| h.slug.as_str()).collect();
    assert_eq!(slugs, vec!["section", "section-1"]);
}

#[tokio::test]
async fn uppercase_block_tags_open_a_section() {
    let out = formatter()
        .format_post(&post(PostType::Page, "hunger", "<H2>Title</H2>\n\nBody"), None)
        .await
        .expect("page should format");
    assert!(out.html.starts_with("<section><h2 id=\"title\">"));
    assert!(!out.html.contains("<section></section>"));
    assert!(!out.html.contains("<p></p>"));
    assert_eq!(out.toc_headings, vec![toc("I. Title", "title", false)]);
}

#[tokio::test]
async fn content_before_first_section_is_not_numbered() {
    let content = "<h3>Preface</h3>\nText\n<h2>Main</h2>";
    let out = formatter()
        .format_post(&post(PostType::Page, "hunger", content), None)
        .await
        .expect("page should format");
    assert_eq!(out.toc_headings, vec![toc("I. Main", "main", false)]);
    assert!(out.html.contains("</a>Preface</h3>"));
    assert!(out.html.starts_with("<section><h3"));
}

#[tokio::test]
async fn raw_posts_pass_through() {
    let content = "<!--raw--><p>[ref]kept[/ref] <a href=\"https://owid.cloud/x\">x</a></p>";
    let out = formatter()
        .format_post(&post(PostType::Page, "hunger", content), None)
        .await
        .expect("raw post should format");
    assert_eq!(
        out.html,
        "<!--raw--><p>[ref]kept[/ref] <a href=\"https://ourworldindata.org/x\">x</a></p>"
    );
    assert!(out.footnotes.is_empty());
    assert!(out.toc_headings.is_empty());
    assert_eq!(out.excerpt, "");
}

#[tokio::test]
async fn tables_are_rendered_and_wrapped_once() {
    let content = "Intro\n[table id=1 /]\n[table id=9 /]";
    let out = formatter()
        .format_post(&post(PostType::Post, "hunger", content), None)
        .await
        .expect("post should format");
    assert_eq!(out.html.matches("<table").count(), 1);
    assert_eq!(out.html.matches("class=\"tableContainer\"").count(), 1);
    assert!(out.html.contains("<div class=\"tableContainer\"><table class=\"tablepress\">"));
    assert!(out.html.contains("<th>Country</th>"));
    assert!(out.html.contains("UNKNOWN TABLE"));
}

#[tokio::test]
async fn uploaded_images_become_responsive() {
    let content = "<img src=\"https://ourworldindata.org/wp-content/uploads/2018/photo.png\">";
    let out = formatter()
        .format_post(&post(PostType::Post, "hunger", content), None)
        .await
        .expect("post should format");
    assert!(out.html.contains("srcset=\"photo-400.png 400w, photo-800.png 800w\""));
    assert!(out.html.contains("sizes=\"(min-width: 800px) 50vw, 100vw\""));
    assert!(out.html.contains(
        "<a href=\"https://ourworldindata.org/wp-content/uploads/2018/photo.png\" target=\"_blank\"><img"
    ));
}

#[tokio::test]
async fn math_is_typeset_in_source_order() {
    let content = "[latex]a[/latex] [latex]\\bad[/latex] [latex]$$x^2+y^2$$[/latex]";
    let out = formatter()
        .format_post(&post(PostType::Post, "hunger", content), None)
        .await
        .expect("post should format");
    let first = out
        .html
        .find("<svg class=\"latex\" data-tex=\"a\"></svg>")
        .expect("first block");
    let failed = out
        .html
        .find("\\bad (parse error: undefined control sequence)")
        .expect("failed block keeps its source");
    let last = out
        .html
        .find("<svg class=\"latex\" data-tex=\"x^2+y^2\"></svg>")
        .expect("delimiters are stripped");
    assert!(first < failed && failed < last);
}

#[tokio::test]
async fn chart_embeds_become_previews() {
    let charts: ChartExports = [(
        "https://ourworldindata.org/grapher/gdp",
        ChartExport {
            preview_url: "/exports/gdp.svg".into(),
        },
    )]
    .into_iter()
    .collect();
    let content = "<iframe src=\"https://ourworldindata.org/grapher/gdp\"></iframe>\n\
                   <iframe src=\"http://www.youtube.com/embed/1\"></iframe>";
    let out = formatter()
        .format_post(&post(PostType::Post, "hunger", content), Some(&charts))
        .await
        .expect("post should format");
    assert!(out.html.contains(
        "<figure data-grapher-src=\"https://ourworldindata.org/grapher/gdp\" class=\"grapherPreview\">"
    ));
    assert!(out.html.contains("<img src=\"/exports/gdp.svg\">"));
    assert!(out.html.contains("<iframe src=\"https://www.youtube.com/embed/1\"></iframe>"));
    assert_eq!(out.html.matches("<iframe").count(), 1);
    assert!(!out.html.contains("<p></p>"));
}

#[rstest]
#[case(None, "First paragraph")]
#[case(Some(""), "First paragraph")]
#[case(Some("Given summary"), "Given summary")]
#[tokio::test]
async fn excerpt_falls_back_to_first_paragraph(
    #[case] excerpt: Option<&str>,
    #[case] expected: &str,
) {
    let mut record = post(PostType::Post, "hunger", "First paragraph\n\nSecond paragraph");
    record.excerpt = excerpt.map(str::to_string);
    let out = formatter()
        .format_post(&record, None)
        .await
        .expect("post should format");
    assert_eq!(out.excerpt, expected);
}

#[tokio::test]
async fn missing_identity_fails_only_that_post() {
    let formatter = formatter();
    let mut broken = post(PostType::Post, "hunger", "x");
    broken.id = None;
    let good = post(PostType::Post, "other", "y");
    let (broken, good) = tokio::join!(
        formatter.format_post(&broken, None),
        formatter.format_post(&good, None)
    );
    assert_eq!(broken, Err(FormatError::MissingField("id")));
    assert_eq!(good.expect("good post should format").slug, "other");
}

#[tokio::test]
async fn posts_format_on_separate_tasks() {
    let formatter = Arc::new(formatter());
    let handles: Vec<_> = ["a", "b", "c"]
        .into_iter()
        .map(|slug| {
            let formatter = Arc::clone(&formatter);
            let record = post(PostType::Page, slug, OUTLINE);
            tokio::spawn(async move { formatter.format_post(&record, None).await })
        })
        .collect();
    for handle in handles {
        let out = handle
            .await
            .expect("task should not panic")
            .expect("post should format");
        assert_eq!(out.toc_headings.len(), 6);
    }
}

#[tokio::test]
async fn record_serializes_with_camel_case_fields() {
    let out = formatter()
        .format_post(&post(PostType::Page, "hunger", OUTLINE), None)
        .await
        .expect("page should format");
    let json = serde_json::to_value(&out).expect("record should serialize");
    assert_eq!(json["type"], "page");
    assert_eq!(json["modifiedDate"], "2018-01-05T09:30:00Z");
    assert_eq!(json["tocHeadings"][0]["isSubheading"], false);
    assert!(json.get("imageUrl").is_none());
}
