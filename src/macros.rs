//! Helper macros used across the crate.

/// Lazily compile a [`Regex`] with a custom panic message.
///
/// Only meant for patterns known at compile time; a failure here is a bug in
/// the pattern, not in the input.
///
/// # Examples
///
/// ```
/// use std::sync::LazyLock;
///
/// use regex::Regex;
/// static RE: LazyLock<Regex> = postbake::lazy_regex!(r"\[ref\]", "footnote opener");
/// assert!(RE.is_match("text[ref]note[/ref]"));
/// ```
#[macro_export]
macro_rules! lazy_regex {
    ($pattern:expr, $msg:expr $(,)?) => {
        LazyLock::new(|| Regex::new($pattern).expect($msg))
    };
}
