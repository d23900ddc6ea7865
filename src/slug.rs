//! URL slugs for heading anchors.

use std::collections::HashSet;

const EMPTY_SLUG: &str = "section";

/// Turn free text into a lowercase, hyphen-separated slug.
///
/// Words are split on anything that is not alphanumeric and on
/// lower-to-upper case transitions, so `"GDP perCapita (2018)"` becomes
/// `"gdp-per-capita-2018"`. Applying it to its own output is a no-op.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in text.chars() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.extend(ch.to_lowercase());
        prev_lower = ch.is_lowercase() || ch.is_numeric();
    }
    if !current.is_empty() {
        words.push(current);
    }
    words.join("-")
}

/// Hands out slugs that are unique within one document.
///
/// The first use of a slug is returned as is; repeats get `-1`, `-2`, …
/// appended, skipping any suffix already taken.
#[derive(Debug, Default)]
pub struct Slugger {
    seen: HashSet<String>,
}

impl Slugger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a slug verbatim so later headings cannot claim it.
    pub fn reserve(&mut self, slug: &str) {
        self.seen.insert(slug.to_string());
    }

    /// Slugify `text` and make the result unique. Text with nothing to slug
    /// falls back to `section`.
    pub fn slug(&mut self, text: &str) -> String {
        let mut base = slugify(text);
        if base.is_empty() {
            base.push_str(EMPTY_SLUG);
        }
        if self.seen.insert(base.clone()) {
            return base;
        }
        let mut n = 1usize;
        loop {
            let candidate = format!("{base}-{n}");
            if self.seen.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}
