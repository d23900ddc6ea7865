//! Fakes and builders shared across integration tests.
#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use chrono::{TimeZone, Utc};
use futures::future::BoxFuture;
use postbake::{
    Formatter, ImageVariant, MemoryTables, MemoryUploads, PostType, RawPost, Settings, TableData,
    TypesetError, Typesetter, UploadedImage,
};

/// Renders `<svg data-tex="…"></svg>` and rejects sources containing
/// `\bad`. Shorter sources finish later, so completion order is the reverse
/// of source order for sources of increasing length.
pub struct FakeTypesetter;

impl Typesetter for FakeTypesetter {
    fn typeset<'a>(&'a self, tex: &'a str) -> BoxFuture<'a, Result<String, TypesetError>> {
        Box::pin(async move {
            let delay = 30u64.saturating_sub(tex.len() as u64 * 5);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if tex.contains("\\bad") {
                return Err(TypesetError::Engine("undefined control sequence".into()));
            }
            Ok(format!("<svg data-tex=\"{tex}\"></svg>"))
        })
    }
}

/// One known table, id 1, with a header row and one data row.
pub fn tables() -> MemoryTables {
    [TableData {
        id: 1,
        rows: vec![
            vec!["Country".into(), "Share".into()],
            vec!["Chad".into(), "39%".into()],
        ],
    }]
    .into_iter()
    .collect()
}

/// One known upload, `photo.png`, with two renditions.
pub fn uploads() -> MemoryUploads {
    [UploadedImage {
        original_url: "https://ourworldindata.org/wp-content/uploads/2018/photo.png".into(),
        variants: vec![
            ImageVariant {
                url: "photo-800.png".into(),
                width: 800,
            },
            ImageVariant {
                url: "photo-400.png".into(),
                width: 400,
            },
        ],
    }]
    .into_iter()
    .collect()
}

/// Formatter with the fakes above and default settings.
pub fn formatter() -> Formatter {
    Formatter::new(Settings::default())
        .with_typesetter(Arc::new(FakeTypesetter))
        .with_tables(Arc::new(tables()))
        .with_uploads(Arc::new(uploads()))
}

/// A complete post record of the given type and slug.
pub fn post(post_type: PostType, slug: &str, content: &str) -> RawPost {
    let date = Utc
        .with_ymd_and_hms(2018, 1, 5, 9, 30, 0)
        .single()
        .expect("valid fixture date");
    RawPost {
        id: Some(29),
        post_type: Some(post_type),
        slug: Some(slug.to_string()),
        title: "Hunger and Undernourishment".into(),
        date,
        modified_date: date,
        authors: vec!["Max Roser".into(), "Hannah Ritchie".into()],
        content: content.to_string(),
        excerpt: None,
        image_url: None,
    }
}
