//! The formatting pipeline for a single post.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use regex::{NoExpand, Regex};
use tracing::{debug, instrument, warn};

use crate::autop::{autop, standardize_whitespace};
use crate::directives::{DirectiveKind, clean_math, extract, is_raw, substitute};
use crate::dom::{self, Assets, TransformOptions};
use crate::error::FormatError;
use crate::post::{Footnote, FormattedPost, PostIdentity, PostType, RawPost, TocHeading};
use crate::references::{Resolved, resolve_references};
use crate::settings::Settings;
use crate::sources::{
    ChartExports, MemoryTables, MemoryUploads, TableSource, UploadIndex, UploadedImage, basename,
};
use crate::typeset::{CommandTypesetter, Typesetter, engine, typeset_all};

/// Turns raw post records into publish-ready ones.
///
/// A `Formatter` holds no per-document state, so one instance can format
/// many posts concurrently.
#[derive(Clone)]
pub struct Formatter {
    settings: Settings,
    legacy_origins: Vec<Regex>,
    typesetter: Arc<dyn Typesetter>,
    tables: Arc<dyn TableSource>,
    uploads: Arc<dyn UploadIndex>,
}

impl std::fmt::Debug for Formatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Formatter")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Formatter {
    /// A formatter that typesets with the process-wide engine and knows no
    /// tables or uploads.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        let legacy_origins = settings
            .legacy_domains
            .iter()
            .filter(|domain| !domain.is_empty())
            .filter_map(|domain| {
                Regex::new(&format!("https?://{}", regex::escape(domain)))
                    .inspect_err(|err| warn!(%domain, error = %err, "ignoring legacy domain"))
                    .ok()
            })
            .collect();
        Self {
            settings,
            legacy_origins,
            typesetter: Arc::new(CommandTypesetter::new()),
            tables: Arc::new(MemoryTables::default()),
            uploads: Arc::new(MemoryUploads::default()),
        }
    }

    #[must_use]
    pub fn with_typesetter(mut self, typesetter: Arc<dyn Typesetter>) -> Self {
        self.typesetter = typesetter;
        self
    }

    #[must_use]
    pub fn with_tables(mut self, tables: Arc<dyn TableSource>) -> Self {
        self.tables = tables;
        self
    }

    #[must_use]
    pub fn with_uploads(mut self, uploads: Arc<dyn UploadIndex>) -> Self {
        self.uploads = uploads;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Format one post.
    ///
    /// Posts containing the raw marker are passed through with only their
    /// domains rewritten. Everything else runs through math typesetting,
    /// paragraph normalisation, reference resolution and the structural
    /// rewrites. Reference and typesetting failures degrade to visible
    /// markers; the only error is a record missing its identity.
    ///
    /// # Errors
    /// Returns [`FormatError::MissingField`] when `id`, `type` or `slug` is
    /// absent.
    #[instrument(skip_all, fields(id = ?post.id, slug = ?post.slug))]
    pub async fn format_post(
        &self,
        post: &RawPost,
        charts: Option<&ChartExports>,
    ) -> Result<FormattedPost, FormatError> {
        let identity = post.identity()?;
        let html = self.rewrite_domains(&post.content);

        if is_raw(&html) {
            debug!("raw post, skipping formatting");
            let excerpt = post.excerpt.clone().unwrap_or_default();
            return Ok(assemble(post, identity, html, excerpt, Vec::new(), Vec::new()));
        }

        let html = standardize_whitespace(&html);
        let html = self.paragraphs_with_math(&html).await;
        let Resolved { html, footnotes } = resolve_references(&html, self.tables.as_ref()).await;
        let html = self.link_through(html);
        let uploads = self.prefetch_uploads(&html).await;

        let options = TransformOptions {
            toc_eligible: identity.post_type == PostType::Page
                && identity.slug != self.settings.about_slug,
            https_only: self.settings.https_only,
            has_footnotes: !footnotes.is_empty(),
        };
        let transformed = dom::transform(&html, &Assets { uploads, charts }, &options);
        let excerpt = post
            .excerpt
            .clone()
            .filter(|excerpt| !excerpt.is_empty())
            .unwrap_or(transformed.excerpt);
        Ok(assemble(
            post,
            identity,
            transformed.html,
            excerpt,
            footnotes,
            transformed.toc,
        ))
    }

    /// Point links at the authoring backend and legacy domains to the
    /// public origin.
    fn rewrite_domains(&self, content: &str) -> String {
        let baked = self.settings.baked_url.as_str();
        let mut html = if self.settings.wordpress_url.is_empty() {
            content.to_string()
        } else {
            content.replace(&self.settings.wordpress_url, baked)
        };
        for origin in &self.legacy_origins {
            html = origin.replace_all(&html, NoExpand(baked)).into_owned();
        }
        html
    }

    /// Typeset math, normalise paragraphs around the placeholders, then put
    /// the rendered math back.
    async fn paragraphs_with_math(&self, html: &str) -> String {
        let extraction = extract(html, &[DirectiveKind::Math]);
        let sources: Vec<String> = extraction
            .payloads(DirectiveKind::Math)
            .into_iter()
            .map(clean_math)
            .collect();
        let rendered = if sources.is_empty() {
            Vec::new()
        } else {
            typeset_all(self.typesetter.as_ref(), &sources, engine().timeout).await
        };
        let html = autop(&extraction.text);
        substitute(&html, DirectiveKind::Math, |i| rendered.get(i).cloned())
    }

    fn link_through(&self, mut html: String) -> String {
        for (from, to) in self.settings.link_through_prefixes() {
            html = html.replace(&from, &to);
        }
        html
    }

    /// Look up every distinct image basename before the tree is built.
    async fn prefetch_uploads(&self, html: &str) -> HashMap<String, UploadedImage> {
        let mut names: Vec<String> = dom::image_sources(html)
            .iter()
            .map(|src| basename(src).to_string())
            .filter(|name| !name.is_empty())
            .collect();
        names.sort_unstable();
        names.dedup();
        let found = join_all(names.iter().map(|name| self.uploads.uploaded_image(name))).await;
        debug!(images = names.len(), "looked up uploads");
        names
            .into_iter()
            .zip(found)
            .filter_map(|(name, upload)| upload.map(|upload| (name, upload)))
            .collect()
    }
}

fn assemble(
    post: &RawPost,
    identity: PostIdentity,
    html: String,
    excerpt: String,
    footnotes: Vec<Footnote>,
    toc_headings: Vec<TocHeading>,
) -> FormattedPost {
    FormattedPost {
        id: identity.id,
        post_type: identity.post_type,
        slug: identity.slug,
        title: post.title.clone(),
        date: post.date,
        modified_date: post.modified_date,
        authors: post.authors.clone(),
        html,
        footnotes,
        excerpt,
        image_url: post.image_url.clone(),
        toc_headings,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn formatter() -> Formatter {
        Formatter::new(Settings::default())
    }

    #[rstest]
    #[case("<a href=\"https://owid.cloud/x\">", "<a href=\"https://ourworldindata.org/x\">")]
    #[case("http://ourworldindata.org/y", "https://ourworldindata.org/y")]
    #[case("https://example.org/z", "https://example.org/z")]
    fn rewrites_internal_domains(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(formatter().rewrite_domains(input), expected);
    }

    #[test]
    fn legacy_domain_is_matched_literally() {
        let formatter = Formatter::new(Settings {
            legacy_domains: vec!["a.b".into()],
            ..Settings::default()
        });
        assert_eq!(formatter.rewrite_domains("http://axb"), "http://axb");
    }

    #[test]
    fn links_legacy_uploads_through() {
        let html = "<iframe src=\"https://ourworldindata.org/wp-content/uploads/nvd3/x.html\">";
        assert_eq!(
            formatter().link_through(html.to_string()),
            "<iframe src=\"https://www.maxroser.com/owidUploads/nvd3/x.html\">"
        );
    }

    #[tokio::test]
    async fn missing_slug_is_the_only_error() {
        let post = RawPost {
            id: Some(1),
            post_type: Some(PostType::Post),
            ..RawPost::default()
        };
        let err = formatter()
            .format_post(&post, None)
            .await
            .expect_err("slug is missing");
        assert_eq!(err, FormatError::MissingField("slug"));
    }
}
