//! Footnote and table references.
//!
//! Both directive kinds are extracted in one pass so that a table directive
//! quoted inside a footnote body stays part of that body.

use std::fmt::Write;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::directives::{DirectiveKind, extract, substitute};
use crate::post::Footnote;
use crate::sources::{TableData, TableSource};

/// Marker emitted for a table id the table source does not know.
pub const UNKNOWN_TABLE: &str = "UNKNOWN TABLE";

/// Content with references substituted, plus the collected footnotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub html: String,
    pub footnotes: Vec<Footnote>,
}

/// Superscript link from the text to the note with the same ordinal.
#[must_use]
pub fn footnote_anchor(ordinal: usize) -> String {
    format!(r##"<a id="ref-{ordinal}" class="ref" href="#note-{ordinal}"><sup>{ordinal}</sup></a>"##)
}

/// Render a table with the first row as header. Cell markup is trusted and
/// passed through as is.
#[must_use]
pub fn render_table(table: &TableData) -> String {
    let mut out = String::from(r#"<table class="tablepress">"#);
    let mut rows = table.rows.iter();
    if let Some(header) = rows.next() {
        out.push_str("<thead><tr>");
        for cell in header {
            write!(out, "<th>{cell}</th>").expect("write to string cannot fail");
        }
        out.push_str("</tr></thead>");
    }
    out.push_str("<tbody>");
    for row in rows {
        out.push_str("<tr>");
        for cell in row {
            write!(out, "<td>{cell}</td>").expect("write to string cannot fail");
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
    out
}

async fn lookup(source: &dyn TableSource, raw_id: &str) -> Option<TableData> {
    let id = raw_id.parse::<u64>().ok()?;
    source.table_by_id(id).await
}

/// Replace `[ref]` directives with numbered anchors and `[table]` directives
/// with rendered tables.
///
/// Footnote ordinals follow encounter order starting at 1. Unknown tables
/// become [`UNKNOWN_TABLE`]; the document is never rejected.
pub async fn resolve_references(text: &str, tables: &dyn TableSource) -> Resolved {
    let extraction = extract(text, &[DirectiveKind::Footnote, DirectiveKind::Table]);

    let footnotes: Vec<Footnote> = extraction
        .payloads(DirectiveKind::Footnote)
        .into_iter()
        .enumerate()
        .map(|(i, body)| Footnote {
            ordinal: i + 1,
            body: body.to_string(),
        })
        .collect();

    let table_ids = extraction.payloads(DirectiveKind::Table);
    let found = join_all(table_ids.iter().map(|id| lookup(tables, id))).await;
    let rendered: Vec<String> = found
        .iter()
        .zip(&table_ids)
        .map(|(table, id)| match table {
            Some(table) => render_table(table),
            None => {
                warn!(table_id = %id, "unknown table");
                UNKNOWN_TABLE.to_string()
            }
        })
        .collect();
    debug!(
        footnotes = footnotes.len(),
        tables = rendered.len(),
        "resolved references"
    );

    let html = substitute(&extraction.text, DirectiveKind::Footnote, |i| {
        footnotes.get(i).map(|note| footnote_anchor(note.ordinal))
    });
    let html = substitute(&html, DirectiveKind::Table, |i| rendered.get(i).cloned());
    Resolved { html, footnotes }
}
