//! Paragraph normalisation.
//!
//! Authors write loosely formatted prose: bare newlines, stray whitespace,
//! block tags mixed with text. [`autop`] follows the WordPress `wpautop`
//! convention to turn that into explicit `<p>` and `<br />` markup, leaving
//! content inside block-level elements alone.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Block-level elements that are never wrapped in a paragraph.
const ALL_BLOCKS: &str = "(?:table|thead|tfoot|caption|col|colgroup|tbody|tr|td|th|div|dl|dd|dt|\
                          ul|ol|li|pre|form|map|area|blockquote|address|math|style|p|h[1-6]|hr|\
                          fieldset|legend|section|article|aside|hgroup|header|footer|nav|figure|\
                          figcaption|details|menu|summary)";

static COMMENT_RE: LazyLock<Regex> =
    lazy_regex!(r"<!--[^>]+-->", "comment pattern should compile");
static NEWLINES_RE: LazyLock<Regex> = lazy_regex!(r"\n+", "newline run pattern should compile");

static DOUBLE_BR_RE: LazyLock<Regex> =
    lazy_regex!(r"<br\s*/?>\s*<br\s*/?>", "double br pattern should compile");
static BLOCK_OPEN_RE: LazyLock<Regex> = lazy_regex!(
    &format!(r"(?i)(<{ALL_BLOCKS}[\s/>])"),
    "block opening pattern should compile",
);
static BLOCK_CLOSE_RE: LazyLock<Regex> = lazy_regex!(
    &format!(r"(?i)(</{ALL_BLOCKS}>)"),
    "block closing pattern should compile",
);
static BREAKS_RE: LazyLock<Regex> = lazy_regex!(r"\n\n+", "break run pattern should compile");
static PARAGRAPH_SPLIT_RE: LazyLock<Regex> =
    lazy_regex!(r"\n\s*\n", "paragraph split pattern should compile");
static EMPTY_P_RE: LazyLock<Regex> = lazy_regex!(r"<p>\s*</p>", "empty p pattern should compile");
static TEXT_BEFORE_CLOSE_RE: LazyLock<Regex> = lazy_regex!(
    r"(?i)<p>([^<]+)</(div|address|form)>",
    "unclosed text pattern should compile",
);
static P_AROUND_BLOCK_RE: LazyLock<Regex> = lazy_regex!(
    &format!(r"(?i)<p>\s*(</?{ALL_BLOCKS}[^>]*>)\s*</p>"),
    "wrapped block pattern should compile",
);
static P_AROUND_LI_RE: LazyLock<Regex> =
    lazy_regex!(r"(?i)<p>(<li.+?)</p>", "wrapped li pattern should compile");
static P_BLOCKQUOTE_RE: LazyLock<Regex> = lazy_regex!(
    r"(?i)<p><blockquote([^>]*)>",
    "blockquote opening pattern should compile",
);
static P_BEFORE_BLOCK_RE: LazyLock<Regex> = lazy_regex!(
    &format!(r"(?i)<p>\s*(</?{ALL_BLOCKS}[^>]*>)"),
    "leading block pattern should compile",
);
static P_AFTER_BLOCK_RE: LazyLock<Regex> = lazy_regex!(
    &format!(r"(?i)(</?{ALL_BLOCKS}[^>]*>)\s*</p>"),
    "trailing block pattern should compile",
);
static SCRIPT_STYLE_RE: LazyLock<Regex> = lazy_regex!(
    r"(?s)<script.*?</script>|<style.*?</style>",
    "script/style pattern should compile",
);
static LINE_END_RE: LazyLock<Regex> = lazy_regex!(r"\s*\n", "line end pattern should compile");
static BR_AFTER_BLOCK_RE: LazyLock<Regex> = lazy_regex!(
    &format!(r"(?i)(</?{ALL_BLOCKS}[^>]*>)\s*<br />"),
    "br after block pattern should compile",
);
static BR_BEFORE_BLOCK_RE: LazyLock<Regex> = lazy_regex!(
    r"(?i)<br />(\s*</?(?:p|li|div|dl|dd|dt|th|pre|td|ul|ol)[^>]*>)",
    "br before block pattern should compile",
);
static TRAILING_NEWLINE_P_RE: LazyLock<Regex> =
    lazy_regex!(r"\n</p>$", "trailing paragraph pattern should compile");

const PRESERVED_NEWLINE: &str = "<WPPreserveNewline />";
const BR: &str = "<br />";

/// Canonicalise whitespace before paragraph detection.
///
/// Comments and `&nbsp;` entities are removed, line endings are folded to
/// `\n` and every run of newlines becomes one blank line, so each authored
/// line ends up as its own paragraph.
#[must_use]
pub fn standardize_whitespace(html: &str) -> String {
    let html = COMMENT_RE.replace_all(html, "");
    let html = html.replace("&nbsp;", "").replace("\r\n", "\n");
    NEWLINES_RE.replace_all(&html, "\n\n").into_owned()
}

/// Swap every `<pre>` block for a numbered stub so its whitespace survives.
fn protect_pre(text: &str) -> (String, Vec<(String, String)>) {
    if !text.contains("<pre") {
        return (text.to_string(), Vec::new());
    }
    let mut chunks: Vec<&str> = text.split("</pre>").collect();
    let last = chunks.pop().unwrap_or_default();
    let mut out = String::with_capacity(text.len());
    let mut saved = Vec::new();
    for (i, chunk) in chunks.into_iter().enumerate() {
        match chunk.find("<pre") {
            Some(start) => {
                let name = format!("<pre wp-pre-tag-{i}></pre>");
                saved.push((name.clone(), format!("{}</pre>", &chunk[start..])));
                out.push_str(&chunk[..start]);
                out.push_str(&name);
            }
            None => {
                out.push_str(chunk);
                out.push_str("</pre>");
            }
        }
    }
    out.push_str(last);
    (out, saved)
}

fn break_lines(text: &str) -> String {
    let text = SCRIPT_STYLE_RE.replace_all(text, |caps: &Captures<'_>| {
        caps[0].replace('\n', PRESERVED_NEWLINE)
    });
    let text = LINE_END_RE.replace_all(&text, |caps: &Captures<'_>| {
        let start = caps.get(0).map_or(0, |m| m.start());
        if text[..start].ends_with(BR) {
            caps[0].to_string()
        } else {
            format!("{BR}\n")
        }
    });
    text.replace(PRESERVED_NEWLINE, "\n")
}

/// Make implicit paragraphs explicit.
///
/// Blank lines delimit paragraphs, single newlines inside a paragraph become
/// `<br />`, and block-level markup is passed through unwrapped. Blank input
/// yields an empty string.
#[must_use]
pub fn autop(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let padded = format!("{text}\n");
    let (text, pre_tags) = protect_pre(&padded);

    let text = DOUBLE_BR_RE.replace_all(&text, "\n\n");
    let text = BLOCK_OPEN_RE.replace_all(&text, "\n$1");
    let text = BLOCK_CLOSE_RE.replace_all(&text, "$1\n\n");
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = BREAKS_RE.replace_all(&text, "\n\n");

    let mut out = String::with_capacity(text.len() + 64);
    for para in PARAGRAPH_SPLIT_RE.split(&text).filter(|p| !p.is_empty()) {
        out.push_str("<p>");
        out.push_str(para.trim_matches('\n'));
        out.push_str("</p>\n");
    }

    let out = EMPTY_P_RE.replace_all(&out, "");
    let out = TEXT_BEFORE_CLOSE_RE.replace_all(&out, "<p>$1</p></$2>");
    let out = P_AROUND_BLOCK_RE.replace_all(&out, "$1");
    let out = P_AROUND_LI_RE.replace_all(&out, "$1");
    let out = P_BLOCKQUOTE_RE.replace_all(&out, "<blockquote$1><p>");
    let out = out.replace("</blockquote></p>", "</p></blockquote>");
    let out = P_BEFORE_BLOCK_RE.replace_all(&out, "$1");
    let out = P_AFTER_BLOCK_RE.replace_all(&out, "$1");
    let out = break_lines(&out);
    let out = BR_AFTER_BLOCK_RE.replace_all(&out, "$1");
    let out = BR_BEFORE_BLOCK_RE.replace_all(&out, "$1");
    let mut out = TRAILING_NEWLINE_P_RE.replace_all(&out, "</p>").into_owned();

    for (name, block) in pre_tags {
        out = out.replace(&name, &block);
    }
    out
}
