//! Heading numbering, table of contents and deep links.

use markup5ever_rcdom::Handle;

use super::{attr, elements, new_element, new_text, prepend, set_attr, tag_name, text_content};
use crate::post::TocHeading;
use crate::slug::Slugger;

/// Fixed id of the heading above the footnote list.
const FOOTNOTES_ID: &str = "footnotes";

const NUMERALS: [(usize, &str); 13] = [
    (1000, "M"),
    (900, "CM"),
    (500, "D"),
    (400, "CD"),
    (100, "C"),
    (90, "XC"),
    (50, "L"),
    (40, "XL"),
    (10, "X"),
    (9, "IX"),
    (5, "V"),
    (4, "IV"),
    (1, "I"),
];

/// Upper-case Roman numeral for `n`; zero yields an empty string.
#[must_use]
pub fn romanize(mut n: usize) -> String {
    let mut out = String::new();
    for (value, numeral) in NUMERALS {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}

/// Give every `h1`–`h4` an id and a deep link, numbering `h2`/`h3` and
/// collecting the table of contents when `toc_eligible` is set.
///
/// `h2` headings count sections and reset the subsection counter; `h3`
/// headings count subsections. Nothing is numbered before the first `h2`.
/// The footnotes heading is listed in the contents whenever the document
/// has footnotes.
pub(super) fn number_headings(
    body: &Handle,
    toc_eligible: bool,
    has_footnotes: bool,
) -> Vec<TocHeading> {
    let headings = elements(body, &["h1", "h2", "h3", "h4"]);
    let mut slugger = Slugger::new();
    if headings.iter().any(is_footnotes_heading) {
        slugger.reserve(FOOTNOTES_ID);
    }

    let mut section = 0usize;
    let mut subsection = 0usize;
    let mut toc = Vec::new();
    for heading in headings {
        let text = text_content(&heading);
        let footnotes = is_footnotes_heading(&heading);
        let slug = if footnotes {
            FOOTNOTES_ID.to_string()
        } else {
            slugger.slug(&text)
        };

        if toc_eligible {
            if footnotes && has_footnotes {
                toc.push(TocHeading {
                    text: text.clone(),
                    slug: slug.clone(),
                    is_subheading: false,
                });
            } else if let Some(level @ ("h2" | "h3")) = tag_name(&heading) {
                let is_subheading = level == "h3";
                if is_subheading {
                    subsection += 1;
                } else {
                    section += 1;
                    subsection = 0;
                }
                if section > 0 {
                    let prefix = if is_subheading {
                        format!("{}.{subsection} ", romanize(section))
                    } else {
                        format!("{}. ", romanize(section))
                    };
                    prepend(&heading, new_text(&prefix));
                    toc.push(TocHeading {
                        text: format!("{prefix}{text}"),
                        slug: slug.clone(),
                        is_subheading,
                    });
                }
            }
        }

        set_attr(&heading, "id", &slug);
        let href = format!("#{slug}");
        prepend(
            &heading,
            new_element("a", &[("class", "deep-link"), ("href", &href)]),
        );
    }
    toc
}

fn is_footnotes_heading(heading: &Handle) -> bool {
    attr(heading, "id").as_deref() == Some(FOOTNOTES_ID)
}
