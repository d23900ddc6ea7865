//! Library for turning authored post content into publish-ready records.
//!
//! Content arrives as loosely formatted HTML sprinkled with bracket
//! directives: `[latex]` math, `[ref]` footnotes and `[table id=N /]` table
//! references. [`Formatter::format_post`] typesets the math, makes
//! paragraphs explicit, resolves the references and restructures the
//! markup into sections with numbered, deep-linkable headings.
//!
//! Modules are organised as follows:
//! - `directives` extracts directives into indexed placeholders.
//! - `typeset` drives the external math engine.
//! - `autop` normalises whitespace and paragraphs.
//! - `references` resolves footnotes and tables.
//! - `dom` performs the structural rewrites.
//! - `format` sequences the stages.

#[macro_use]
mod macros;

pub mod autop;
pub mod byline;
pub mod directives;
pub mod dom;
mod error;
mod format;
mod post;
pub mod references;
mod settings;
pub mod slug;
pub mod sources;
pub mod typeset;

pub use autop::{autop, standardize_whitespace};
pub use byline::{format_authors, format_date};
pub use dom::{chart_urls, image_sources, romanize};
pub use error::{FormatError, TypesetError};
pub use format::Formatter;
pub use post::{Footnote, FormattedPost, PostType, RawPost, TocHeading};
pub use references::{UNKNOWN_TABLE, render_table, resolve_references};
pub use settings::Settings;
pub use slug::slugify;
pub use sources::{
    ChartExport, ChartExports, ImageVariant, MemoryTables, MemoryUploads, SourceBundle,
    TableData, TableSource, UploadIndex, UploadedImage,
};
pub use typeset::{CommandTypesetter, EngineConfig, Typesetter, init_engine, typeset_all};
