//! Structural rewriting of the assembled post markup.
//!
//! The markup is parsed with `html5ever` into an `RcDom`, rewritten in
//! place and serialized back. Trees are `Rc`-based, so every function here
//! builds and drops its tree before returning.

mod charts;
mod headings;
mod images;
mod sections;
mod tables;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use html5ever::driver::ParseOpts;
use html5ever::serialize::{SerializeOpts, TraversalScope, serialize};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{Attribute, LocalName, QualName, namespace_url, ns, parse_document};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};
use tracing::{debug, warn};

use crate::post::TocHeading;
use crate::sources::{ChartExports, UploadedImage};

pub use charts::is_chart_url;
pub use headings::romanize;

/// Lookups resolved ahead of the transformation.
#[derive(Debug, Default)]
pub struct Assets<'a> {
    /// Uploads keyed by image basename.
    pub uploads: HashMap<String, UploadedImage>,
    pub charts: Option<&'a ChartExports>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformOptions {
    /// Number headings and collect a table of contents.
    pub toc_eligible: bool,
    /// Upgrade `http://` iframe sources.
    pub https_only: bool,
    pub has_footnotes: bool,
}

/// Output of [`transform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    /// Inner markup of the document body.
    pub html: String,
    pub toc: Vec<TocHeading>,
    /// Text of the first paragraph, or empty.
    pub excerpt: String,
}

/// Run every structural rewrite over `html`, in order: sectioning, chart
/// previews, iframe protocol upgrade, empty paragraph removal, table
/// wrapping, image enrichment, then heading numbering and deep links.
#[must_use]
pub fn transform(html: &str, assets: &Assets<'_>, options: &TransformOptions) -> Transformed {
    let dom = parse(html);
    let Some(body) = find_body(&dom) else {
        warn!("parsed document has no body");
        return Transformed {
            html: html.to_string(),
            toc: Vec::new(),
            excerpt: String::new(),
        };
    };

    sections::wrap_sections(&body);
    if let Some(charts) = assets.charts {
        charts::replace_chart_embeds(&body, charts);
    }
    if options.https_only {
        charts::upgrade_iframes(&body);
    }
    tables::remove_empty_paragraphs(&body);
    tables::wrap_tables(&body);
    images::enrich_images(&body, &assets.uploads);
    let toc = headings::number_headings(&body, options.toc_eligible, options.has_footnotes);
    debug!(toc_entries = toc.len(), "transformed document");

    let excerpt = elements(&body, &["p"])
        .first()
        .map(text_content)
        .unwrap_or_default();
    Transformed {
        html: serialize_children(&body),
        toc,
        excerpt,
    }
}

/// `src` of every `<img>`, in document order.
#[must_use]
pub fn image_sources(html: &str) -> Vec<String> {
    let dom = parse(html);
    elements(&dom.document, &["img"])
        .iter()
        .filter_map(|img| attr(img, "src"))
        .collect()
}

/// Chart embed URLs of every grapher `<iframe>`, in document order.
#[must_use]
pub fn chart_urls(html: &str) -> Vec<String> {
    let dom = parse(html);
    elements(&dom.document, &["iframe"])
        .iter()
        .filter_map(|iframe| attr(iframe, "src"))
        .filter(|src| is_chart_url(src))
        .collect()
}

pub(crate) fn parse(html: &str) -> RcDom {
    parse_document(RcDom::default(), ParseOpts::default()).one(html)
}

fn find_body(dom: &RcDom) -> Option<Handle> {
    elements(&dom.document, &["body"]).into_iter().next()
}

/// Local name of an element node.
pub(crate) fn tag_name(handle: &Handle) -> Option<&str> {
    match &handle.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

pub(crate) fn is_tag(handle: &Handle, tag: &str) -> bool {
    tag_name(handle) == Some(tag)
}

pub(crate) fn is_element(handle: &Handle) -> bool {
    matches!(handle.data, NodeData::Element { .. })
}

pub(crate) fn attr(handle: &Handle, name: &str) -> Option<String> {
    match &handle.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.as_ref() == name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

/// Set an attribute, replacing any existing value.
pub(crate) fn set_attr(handle: &Handle, name: &str, value: &str) {
    let NodeData::Element { attrs, .. } = &handle.data else {
        return;
    };
    let mut attrs = attrs.borrow_mut();
    if let Some(existing) = attrs.iter_mut().find(|a| a.name.local.as_ref() == name) {
        existing.value = StrTendril::from_slice(value);
    } else {
        attrs.push(Attribute {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: StrTendril::from_slice(value),
        });
    }
}

/// Walks the tree under `handle` collecting elements named in `tags`, in
/// document order.
pub(crate) fn elements(handle: &Handle, tags: &[&str]) -> Vec<Handle> {
    fn walk(handle: &Handle, tags: &[&str], out: &mut Vec<Handle>) {
        if tag_name(handle).is_some_and(|t| tags.iter().any(|tag| *tag == t)) {
            out.push(handle.clone());
        }
        for child in handle.children.borrow().iter() {
            walk(child, tags, out);
        }
    }
    let mut out = Vec::new();
    walk(handle, tags, &mut out);
    out
}

/// Concatenated text of all descendant text nodes, skipping scripts and
/// styles.
pub(crate) fn text_content(handle: &Handle) -> String {
    fn walk(handle: &Handle, out: &mut String) {
        match &handle.data {
            NodeData::Text { contents } => out.push_str(&contents.borrow()),
            NodeData::Element { name, .. }
                if matches!(name.local.as_ref(), "script" | "style" | "template") => {}
            _ => {
                for child in handle.children.borrow().iter() {
                    walk(child, out);
                }
            }
        }
    }
    let mut out = String::new();
    walk(handle, &mut out);
    out
}

pub(crate) fn parent(handle: &Handle) -> Option<Handle> {
    let weak = handle.parent.take()?;
    let parent = weak.upgrade();
    handle.parent.set(Some(weak));
    parent
}

/// Nearest element named `tag`, starting with `handle` itself.
pub(crate) fn closest(handle: &Handle, tag: &str) -> Option<Handle> {
    let mut current = Some(handle.clone());
    while let Some(node) = current {
        if is_tag(&node, tag) {
            return Some(node);
        }
        current = parent(&node);
    }
    None
}

/// Remove `node` from its parent, if it has one.
pub(crate) fn detach(node: &Handle) {
    if let Some(parent) = parent(node) {
        parent
            .children
            .borrow_mut()
            .retain(|child| !Rc::ptr_eq(child, node));
    }
    node.parent.set(None);
}

fn insert_at(parent: &Handle, index: usize, node: Handle) {
    node.parent.set(Some(Rc::downgrade(parent)));
    let mut children = parent.children.borrow_mut();
    let index = index.min(children.len());
    children.insert(index, node);
}

fn position(parent: &Handle, node: &Handle) -> Option<usize> {
    parent
        .children
        .borrow()
        .iter()
        .position(|child| Rc::ptr_eq(child, node))
}

/// Move `node` to sit right before `anchor`.
pub(crate) fn insert_before(anchor: &Handle, node: Handle) {
    detach(&node);
    let Some(parent) = parent(anchor) else { return };
    if let Some(index) = position(&parent, anchor) {
        insert_at(&parent, index, node);
    }
}

/// Move `node` to sit right after `anchor`.
pub(crate) fn insert_after(anchor: &Handle, node: Handle) {
    detach(&node);
    let Some(parent) = parent(anchor) else { return };
    if let Some(index) = position(&parent, anchor) {
        insert_at(&parent, index + 1, node);
    }
}

/// Move `node` to the end of `parent`'s children.
pub(crate) fn append(parent: &Handle, node: Handle) {
    detach(&node);
    let len = parent.children.borrow().len();
    insert_at(parent, len, node);
}

/// Move `node` to the start of `parent`'s children.
pub(crate) fn prepend(parent: &Handle, node: Handle) {
    detach(&node);
    insert_at(parent, 0, node);
}

/// Detached HTML element with the given attributes.
pub(crate) fn new_element(tag: &str, attrs: &[(&str, &str)]) -> Handle {
    let attrs = attrs
        .iter()
        .map(|(name, value)| Attribute {
            name: QualName::new(None, ns!(), LocalName::from(*name)),
            value: StrTendril::from_slice(value),
        })
        .collect();
    Node::new(NodeData::Element {
        name: QualName::new(None, ns!(html), LocalName::from(tag)),
        attrs: RefCell::new(attrs),
        template_contents: RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
    })
}

pub(crate) fn new_text(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from_slice(text)),
    })
}

/// Serialize the children of `handle`, without the element itself.
pub(crate) fn serialize_children(handle: &Handle) -> String {
    let mut bytes = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::ChildrenOnly(None),
        ..SerializeOpts::default()
    };
    if let Err(err) = serialize(&mut bytes, &SerializableHandle::from(handle.clone()), opts) {
        warn!(error = %err, "failed to serialize document");
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Parse `html` and hand back the tree together with its body.
    pub(crate) fn parse_body(html: &str) -> (RcDom, Handle) {
        let dom = parse(html);
        let body = find_body(&dom).expect("parsed documents always have a body");
        (dom, body)
    }
}
