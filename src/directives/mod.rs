//! Extraction of bracket directives from raw post content.
//!
//! Each directive kind is pulled out into its own ordered payload list and
//! replaced with an indexed [`Placeholder`]. Later stages resolve the
//! payloads and put the results back with [`substitute`].

mod placeholder;
mod scanner;

pub use placeholder::{Placeholder, UNKNOWN_REFERENCE, substitute};
pub use scanner::{Directive, DirectiveKind, scan_directives};

/// Marker an author places anywhere in a post to bypass formatting.
pub const RAW_MARKER: &str = "<!--raw-->";

/// Content with directives replaced by placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction<'a> {
    pub text: String,
    pub directives: Vec<Directive<'a>>,
}

impl Extraction<'_> {
    /// Payloads of one kind, in placeholder index order.
    #[must_use]
    pub fn payloads(&self, kind: DirectiveKind) -> Vec<&str> {
        self.directives
            .iter()
            .filter(|d| d.kind == kind)
            .map(|d| d.payload)
            .collect()
    }
}

/// Replace every directive of `kinds` in `text` with its placeholder.
#[must_use]
pub fn extract<'a>(text: &'a str, kinds: &[DirectiveKind]) -> Extraction<'a> {
    let directives = scan_directives(text, kinds);
    let mut out = String::with_capacity(text.len());
    let mut counts = [0usize; 3];
    let mut last = 0;
    for directive in &directives {
        out.push_str(&text[last..directive.span.start]);
        let slot = &mut counts[directive.kind as usize];
        let placeholder = Placeholder {
            kind: directive.kind,
            index: *slot,
        };
        *slot += 1;
        out.push_str(&placeholder.to_string());
        last = directive.span.end;
    }
    out.push_str(&text[last..]);
    Extraction {
        text: out,
        directives,
    }
}

/// Whether the author asked for the content to be passed through verbatim.
#[must_use]
pub fn is_raw(text: &str) -> bool {
    text.contains(RAW_MARKER)
}

/// Strip display-math delimiters the typesetter does not expect.
///
/// Only the first `\[` and the first `\]` are removed; every `$$` goes.
#[must_use]
pub fn clean_math(source: &str) -> String {
    source
        .replacen("\\[", "", 1)
        .replacen("\\]", "", 1)
        .replace("$$", "")
}
