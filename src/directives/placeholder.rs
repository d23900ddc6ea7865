//! Indexed placeholder tokens.
//!
//! A placeholder names its directive kind and its index within that kind, so
//! substitution never depends on the order in which resolutions complete.
//! Tokens are delimited by private-use characters that authored content does
//! not contain.

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::warn;

use super::DirectiveKind;

const OPEN: char = '\u{E000}';
const CLOSE: char = '\u{E001}';

/// Marker emitted for a placeholder nothing resolved.
pub const UNKNOWN_REFERENCE: &str = "UNKNOWN REFERENCE";

static PLACEHOLDER_RE: LazyLock<Regex> = lazy_regex!(
    concat!("\u{E000}", r"(latex|ref|table):(\d+)", "\u{E001}"),
    "placeholder pattern should compile",
);

/// Stand-in for the `index`-th directive of `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placeholder {
    pub kind: DirectiveKind,
    pub index: usize,
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{OPEN}{}:{}{CLOSE}", self.kind.tag(), self.index)
    }
}

fn parse(caps: &Captures<'_>) -> Option<Placeholder> {
    Some(Placeholder {
        kind: DirectiveKind::from_tag(&caps[1])?,
        index: caps[2].parse().ok()?,
    })
}

/// Replace every placeholder of `kind` in `text` with `resolve(index)`.
///
/// Placeholders of other kinds are left in place. An index `resolve` has no
/// answer for becomes [`UNKNOWN_REFERENCE`].
pub fn substitute<F>(text: &str, kind: DirectiveKind, mut resolve: F) -> String
where
    F: FnMut(usize) -> Option<String>,
{
    PLACEHOLDER_RE
        .replace_all(text, |caps: &Captures<'_>| match parse(caps) {
            Some(p) if p.kind == kind => resolve(p.index).unwrap_or_else(|| {
                warn!(kind = kind.tag(), index = p.index, "unresolved placeholder");
                UNKNOWN_REFERENCE.to_string()
            }),
            _ => caps[0].to_string(),
        })
        .into_owned()
}
