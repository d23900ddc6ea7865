//! Responsive image attributes and full-size links.

use std::collections::HashMap;

use markup5ever_rcdom::Handle;

use super::{append, attr, elements, insert_after, is_tag, new_element, parent, set_attr};
use crate::sources::{ImageVariant, UploadedImage, basename};

const IMAGE_SIZES: &str = "(min-width: 800px) 50vw, 100vw";

fn srcset(variants: &[ImageVariant]) -> String {
    variants
        .iter()
        .map(|v| format!("{} {}w", v.url, v.width))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Enrich every `<img>`.
///
/// An image inside a link opens that link in a new tab. An image whose
/// basename has uploaded variants gets `srcset` and `sizes`, and is wrapped
/// in a link to the original when it is not already linked.
pub(super) fn enrich_images(body: &Handle, uploads: &HashMap<String, UploadedImage>) {
    for img in elements(body, &["img"]) {
        let link = parent(&img).filter(|p| is_tag(p, "a"));
        if let Some(link) = &link {
            set_attr(link, "target", "_blank");
        }

        let src = attr(&img, "src").unwrap_or_default();
        let Some(upload) = uploads
            .get(basename(&src))
            .filter(|upload| !upload.variants.is_empty())
        else {
            continue;
        };
        set_attr(&img, "srcset", &srcset(&upload.variants));
        set_attr(&img, "sizes", IMAGE_SIZES);
        if link.is_none() {
            let wrapper = new_element(
                "a",
                &[("href", upload.original_url.as_str()), ("target", "_blank")],
            );
            insert_after(&img, wrapper.clone());
            append(&wrapper, img);
        }
    }
}
