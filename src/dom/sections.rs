//! Grouping of top-level content into `<section>` elements.

use std::rc::Rc;

use markup5ever_rcdom::Handle;

use super::{append, elements, insert_before, is_element, is_tag, new_element, parent};

/// Wrap each run of siblings that starts at a section start in a
/// `<section>`.
///
/// Section starts are the first element of the body and every `<h2>`. A run
/// covers the start and every following sibling node up to the next `<h2>`.
pub(super) fn wrap_sections(body: &Handle) {
    let mut starts: Vec<Handle> = body
        .children
        .borrow()
        .iter()
        .find(|child| is_element(child))
        .cloned()
        .into_iter()
        .collect();
    for heading in elements(body, &["h2"]) {
        if !starts.iter().any(|start| Rc::ptr_eq(start, &heading)) {
            starts.push(heading);
        }
    }

    for start in starts {
        let Some(container) = parent(&start) else { continue };
        let run: Vec<Handle> = {
            let siblings = container.children.borrow();
            let Some(index) = siblings.iter().position(|c| Rc::ptr_eq(c, &start)) else {
                continue;
            };
            std::iter::once(start.clone())
                .chain(
                    siblings[index + 1..]
                        .iter()
                        .take_while(|c| !is_tag(c, "h2"))
                        .cloned(),
                )
                .collect()
        };
        let section = new_element("section", &[]);
        insert_before(&start, section.clone());
        for node in run {
            append(&section, node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::serialize_children;
    use crate::dom::test_support::parse_body;

    fn sectioned(html: &str) -> String {
        let (_dom, body) = parse_body(html);
        wrap_sections(&body);
        serialize_children(&body)
    }

    #[test]
    fn content_before_first_heading_gets_its_own_section() {
        assert_eq!(
            sectioned("<p>Intro</p><h2>A</h2><p>a</p><h2>B</h2><p>b</p>"),
            concat!(
                "<section><p>Intro</p></section>",
                "<section><h2>A</h2><p>a</p></section>",
                "<section><h2>B</h2><p>b</p></section>"
            )
        );
    }

    #[test]
    fn leading_heading_is_not_wrapped_twice() {
        assert_eq!(
            sectioned("<h2>A</h2><p>a</p>"),
            "<section><h2>A</h2><p>a</p></section>"
        );
    }

    #[test]
    fn text_between_blocks_moves_with_its_section() {
        assert_eq!(
            sectioned("<p>x</p>\n<h2>A</h2>\n<p>a</p>"),
            "<section><p>x</p>\n</section><section><h2>A</h2>\n<p>a</p></section>"
        );
    }

    #[test]
    fn empty_body_is_left_alone() {
        assert_eq!(sectioned(""), "");
    }
}
