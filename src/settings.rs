//! Site-wide settings for the formatting pipeline.

use serde::Deserialize;

/// Directories under `wp-content/uploads` that only the legacy host still serves.
pub(crate) const LEGACY_UPLOAD_DIRS: [&str; 2] = ["nvd3", "datamaps"];

/// Knobs that differ between deployments of the same site.
///
/// Every field has a default, so a settings file only needs to name the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Canonical public origin, without a trailing slash.
    pub baked_url: String,
    /// Origin of the authoring backend; links to it are rewritten to `baked_url`.
    pub wordpress_url: String,
    /// Further hosts whose `http://` and `https://` links become `baked_url`.
    pub legacy_domains: Vec<String>,
    /// Host that still serves the legacy interactive uploads.
    pub legacy_uploads_host: String,
    /// Upgrade `http://` iframe embeds to `https://`.
    pub https_only: bool,
    /// Slug of the page that never gets a table of contents.
    pub about_slug: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            baked_url: "https://ourworldindata.org".to_string(),
            wordpress_url: "https://owid.cloud".to_string(),
            legacy_domains: vec!["ourworldindata.org".to_string()],
            legacy_uploads_host: "https://www.maxroser.com".to_string(),
            https_only: true,
            about_slug: "about".to_string(),
        }
    }
}

impl Settings {
    /// Pairs of `(from, to)` prefixes for uploads that must be linked through
    /// to the legacy host.
    #[must_use]
    pub fn link_through_prefixes(&self) -> Vec<(String, String)> {
        LEGACY_UPLOAD_DIRS
            .iter()
            .map(|dir| {
                (
                    format!("{}/wp-content/uploads/{dir}", self.baked_url),
                    format!("{}/owidUploads/{dir}", self.legacy_uploads_host),
                )
            })
            .collect()
    }
}
