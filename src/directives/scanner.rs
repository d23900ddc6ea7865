//! Textual scanner for bracket directives.
//!
//! Directives may sit inside or across HTML tags, so the scanner works on
//! the raw string and never looks at markup structure.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static TABLE_RE: LazyLock<Regex> = lazy_regex!(
    r"^\[table\s+id=(\d+)\s*/\]",
    "table directive pattern should compile",
);

/// The directive kinds that are replaced by placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// `[latex]...[/latex]`
    Math,
    /// `[ref]...[/ref]`
    Footnote,
    /// `[table id=N /]`
    Table,
}

impl DirectiveKind {
    pub(crate) fn tag(self) -> &'static str {
        match self {
            Self::Math => "latex",
            Self::Footnote => "ref",
            Self::Table => "table",
        }
    }

    pub(crate) fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "latex" => Some(Self::Math),
            "ref" => Some(Self::Footnote),
            "table" => Some(Self::Table),
            _ => None,
        }
    }
}

/// A directive found by [`scan_directives`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive<'a> {
    pub kind: DirectiveKind,
    /// Inner source for math, note body for footnotes, numeric id for tables.
    pub payload: &'a str,
    /// Byte range of the whole directive in the scanned text.
    pub span: Range<usize>,
}

/// Matches an `open ... close` pair at the start of `rest`, returning the
/// payload range and the total length. The first `close` wins.
fn paired(rest: &str, open: &str, close: &str) -> Option<(Range<usize>, usize)> {
    let body = rest.strip_prefix(open)?;
    let end = body.find(close)?;
    Some((open.len()..open.len() + end, open.len() + end + close.len()))
}

fn match_at(rest: &str, kind: DirectiveKind) -> Option<(Range<usize>, usize)> {
    match kind {
        DirectiveKind::Math => paired(rest, "[latex]", "[/latex]"),
        DirectiveKind::Footnote => paired(rest, "[ref]", "[/ref]"),
        DirectiveKind::Table => {
            let caps = TABLE_RE.captures(rest)?;
            let id = caps.get(1)?;
            Some((id.range(), caps.get(0)?.end()))
        }
    }
}

/// Scan `text` left to right for directives of the requested `kinds`.
///
/// Unterminated or malformed directives are not reported; the scanner moves
/// past their opening bracket and they stay literal text.
#[must_use]
pub fn scan_directives<'a>(text: &'a str, kinds: &[DirectiveKind]) -> Vec<Directive<'a>> {
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(offset) = text[pos..].find('[') {
        let start = pos + offset;
        let rest = &text[start..];
        let found = kinds
            .iter()
            .find_map(|&kind| match_at(rest, kind).map(|m| (kind, m)));
        match found {
            Some((kind, (payload, len))) => {
                out.push(Directive {
                    kind,
                    payload: &rest[payload],
                    span: start..start + len,
                });
                pos = start + len;
            }
            None => pos = start + 1,
        }
    }
    out
}
