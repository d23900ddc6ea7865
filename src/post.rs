//! Input and output records of the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// Kind of content; only pages are eligible for a table of contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Post,
    Page,
}

/// A post as handed over by the content store.
///
/// Identity fields are optional here so that a malformed record can be
/// rejected with a precise [`FormatError`] instead of a deserialization
/// failure for the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawPost {
    pub id: Option<u64>,
    #[serde(rename = "type")]
    pub post_type: Option<PostType>,
    pub slug: Option<String>,
    pub title: String,
    pub date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
    pub authors: Vec<String>,
    pub content: String,
    pub excerpt: Option<String>,
    pub image_url: Option<String>,
}

/// Identity fields of a [`RawPost`] after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PostIdentity {
    pub id: u64,
    pub post_type: PostType,
    pub slug: String,
}

impl RawPost {
    /// Check that `id`, `type` and a non-empty `slug` are present.
    pub(crate) fn identity(&self) -> Result<PostIdentity, FormatError> {
        let id = self.id.ok_or(FormatError::MissingField("id"))?;
        let post_type = self.post_type.ok_or(FormatError::MissingField("type"))?;
        let slug = self
            .slug
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(FormatError::MissingField("slug"))?;
        Ok(PostIdentity {
            id,
            post_type,
            slug: slug.to_string(),
        })
    }
}

/// A footnote collected from a `[ref]` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Footnote {
    /// 1-based position in encounter order.
    pub ordinal: usize,
    /// Markup of the note body.
    pub body: String,
}

/// One entry of a page's table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TocHeading {
    pub text: String,
    pub slug: String,
    pub is_subheading: bool,
}

/// The publish-ready record handed to the page renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedPost {
    pub id: u64,
    #[serde(rename = "type")]
    pub post_type: PostType,
    pub slug: String,
    pub title: String,
    pub date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
    pub authors: Vec<String>,
    pub html: String,
    pub footnotes: Vec<Footnote>,
    pub excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub toc_headings: Vec<TocHeading>,
}
