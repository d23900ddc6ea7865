//! Embedded chart previews and iframe protocol upgrades.

use markup5ever_rcdom::Handle;
use tracing::debug;

use super::{append, attr, closest, detach, elements, insert_after, new_element, set_attr};
use crate::sources::ChartExports;

/// Whether an iframe `src` points at an interactive chart.
#[must_use]
pub fn is_chart_url(src: &str) -> bool {
    src.contains("/grapher/")
}

/// `<figure data-grapher-src class="grapherPreview"><a><div><img></div></a></figure>`
fn preview_figure(src: &str, preview_url: &str) -> Handle {
    let figure = new_element(
        "figure",
        &[("data-grapher-src", src), ("class", "grapherPreview")],
    );
    let link = new_element("a", &[("href", src), ("target", "_blank")]);
    let frame = new_element("div", &[]);
    append(&frame, new_element("img", &[("src", preview_url)]));
    append(&link, frame);
    append(&figure, link);
    figure
}

/// Replace chart iframes that have an export with a static preview.
///
/// The preview goes right after the paragraph holding the iframe, or right
/// after the iframe when it is not inside a paragraph. Iframes without an
/// export are kept.
pub(super) fn replace_chart_embeds(body: &Handle, charts: &ChartExports) {
    for iframe in elements(body, &["iframe"]) {
        let Some(src) = attr(&iframe, "src") else { continue };
        if !is_chart_url(&src) {
            continue;
        }
        let Some(export) = charts.get(&src) else {
            debug!(%src, "no export for chart, keeping embed");
            continue;
        };
        let anchor = closest(&iframe, "p").unwrap_or_else(|| iframe.clone());
        insert_after(&anchor, preview_figure(&src, &export.preview_url));
        detach(&iframe);
    }
}

/// Rewrite `http://` iframe sources to `https://`.
pub(super) fn upgrade_iframes(body: &Handle) {
    for iframe in elements(body, &["iframe"]) {
        if let Some(src) = attr(&iframe, "src") {
            if src.contains("http://") {
                set_attr(&iframe, "src", &src.replacen("http://", "https://", 1));
            }
        }
    }
}
