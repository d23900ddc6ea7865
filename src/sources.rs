//! Collaborators the pipeline consults while formatting.
//!
//! Tables and uploads live in an external store and are looked up
//! asynchronously, one key at a time. Chart exports are precomputed by the
//! caller and handed over as a map. The in-memory implementations back the
//! command-line tool and the tests.

use std::collections::HashMap;

use futures::future::BoxFuture;
use serde::Deserialize;

/// A data table as stored by the table plugin; the first row is the header.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableData {
    pub id: u64,
    pub rows: Vec<Vec<String>>,
}

/// One resized rendition of an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageVariant {
    pub url: String,
    pub width: u32,
}

/// An uploaded image and its renditions, ordered by width.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub original_url: String,
    #[serde(default)]
    pub variants: Vec<ImageVariant>,
}

/// Static preview of an interactive chart.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartExport {
    pub preview_url: String,
}

/// Looks up tables referenced by `[table id=N /]`.
pub trait TableSource: Send + Sync {
    fn table_by_id(&self, id: u64) -> BoxFuture<'_, Option<TableData>>;
}

/// Looks up uploaded images by file name.
pub trait UploadIndex: Send + Sync {
    fn uploaded_image<'a>(&'a self, basename: &'a str) -> BoxFuture<'a, Option<UploadedImage>>;
}

/// Last path segment of a URL or path.
#[must_use]
pub fn basename(src: &str) -> &str {
    src.rsplit('/').next().unwrap_or(src)
}

/// Tables held in memory, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct MemoryTables(HashMap<u64, TableData>);

impl FromIterator<TableData> for MemoryTables {
    fn from_iter<I: IntoIterator<Item = TableData>>(iter: I) -> Self {
        Self(iter.into_iter().map(|t| (t.id, t)).collect())
    }
}

impl TableSource for MemoryTables {
    fn table_by_id(&self, id: u64) -> BoxFuture<'_, Option<TableData>> {
        let table = self.0.get(&id).cloned();
        Box::pin(async move { table })
    }
}

/// Uploads held in memory, keyed by the basename of their original URL.
#[derive(Debug, Clone, Default)]
pub struct MemoryUploads(HashMap<String, UploadedImage>);

impl FromIterator<UploadedImage> for MemoryUploads {
    fn from_iter<I: IntoIterator<Item = UploadedImage>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|mut upload| {
                    upload.variants.sort_by_key(|v| v.width);
                    (basename(&upload.original_url).to_string(), upload)
                })
                .collect(),
        )
    }
}

impl UploadIndex for MemoryUploads {
    fn uploaded_image<'a>(&'a self, basename: &'a str) -> BoxFuture<'a, Option<UploadedImage>> {
        let upload = self.0.get(basename).cloned();
        Box::pin(async move { upload })
    }
}

/// Chart previews keyed by the exact embed URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartExports(HashMap<String, ChartExport>);

impl ChartExports {
    #[must_use]
    pub fn get(&self, url: &str) -> Option<&ChartExport> {
        self.0.get(url)
    }

    pub fn insert(&mut self, url: impl Into<String>, export: ChartExport) {
        self.0.insert(url.into(), export);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, ChartExport)> for ChartExports {
    fn from_iter<I: IntoIterator<Item = (S, ChartExport)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartRecord {
    url: String,
    preview_url: String,
}

/// Fixture file contents: `{ "tables": [...], "uploads": [...], "charts": [...] }`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourceBundle {
    tables: Vec<TableData>,
    uploads: Vec<UploadedImage>,
    charts: Vec<ChartRecord>,
}

impl SourceBundle {
    /// Split the bundle into the three collaborators.
    #[must_use]
    pub fn into_parts(self) -> (MemoryTables, MemoryUploads, ChartExports) {
        let charts = self
            .charts
            .into_iter()
            .map(|c| {
                (
                    c.url,
                    ChartExport {
                        preview_url: c.preview_url,
                    },
                )
            })
            .collect();
        (
            self.tables.into_iter().collect(),
            self.uploads.into_iter().collect(),
            charts,
        )
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("https://example.org/uploads/2018/photo.png", "photo.png")]
    #[case("photo.png", "photo.png")]
    #[case("/a/b/", "")]
    fn extracts_basename(#[case] src: &str, #[case] expected: &str) {
        assert_eq!(basename(src), expected);
    }

    #[tokio::test]
    async fn uploads_are_keyed_by_basename_with_sorted_variants() {
        let uploads: MemoryUploads = [UploadedImage {
            original_url: "/uploads/photo.png".into(),
            variants: vec![
                ImageVariant { url: "photo-800.png".into(), width: 800 },
                ImageVariant { url: "photo-400.png".into(), width: 400 },
            ],
        }]
        .into_iter()
        .collect();
        let found = uploads.uploaded_image("photo.png").await.expect("indexed upload");
        let widths: Vec<u32> = found.variants.iter().map(|v| v.width).collect();
        assert_eq!(widths, vec![400, 800]);
        assert!(uploads.uploaded_image("other.png").await.is_none());
    }

    #[tokio::test]
    async fn bundle_splits_into_collaborators() {
        let bundle: SourceBundle = serde_json::from_str(
            r#"{
                "tables": [{"id": 42, "rows": [["A"], ["1"]]}],
                "charts": [{"url": "https://x.org/grapher/gdp", "previewUrl": "/exports/gdp.svg"}]
            }"#,
        )
        .expect("valid bundle");
        let (tables, uploads, charts) = bundle.into_parts();
        assert!(tables.table_by_id(42).await.is_some());
        assert!(uploads.uploaded_image("a.png").await.is_none());
        assert_eq!(
            charts.get("https://x.org/grapher/gdp").map(|c| c.preview_url.as_str()),
            Some("/exports/gdp.svg")
        );
    }
}
