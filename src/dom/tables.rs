//! Paragraph cleanup and table scroll containers.

use markup5ever_rcdom::Handle;

use super::{append, detach, elements, insert_after, new_element};

const TABLE_CONTAINER_CLASS: &str = "tableContainer";

/// Drop `<p>` elements that have no child nodes at all.
pub(super) fn remove_empty_paragraphs(body: &Handle) {
    for p in elements(body, &["p"]) {
        if p.children.borrow().is_empty() {
            detach(&p);
        }
    }
}

/// Move every `<table>` into its own `<div class="tableContainer">`.
pub(super) fn wrap_tables(body: &Handle) {
    for table in elements(body, &["table"]) {
        let container = new_element("div", &[("class", TABLE_CONTAINER_CLASS)]);
        insert_after(&table, container.clone());
        append(&container, table);
    }
}
