//! Handlers for the document viewer.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use serde::Deserialize;
use tracing::warn;

use crate::store::{document_repo, download_repo, Database, DocumentFilter, ProcessedDocument};

use super::AppState;

/// Query parameters shared by the HTML page and the JSON API.
#[derive(Debug, Default, Deserialize)]
pub struct DocumentsQuery {
    /// Keyword the document's keyword list must contain.
    pub keyword: Option<String>,
    /// Status filter; absent means `processed`, `all` means no filter.
    pub status: Option<String>,
}

impl DocumentsQuery {
    /// The viewer shows successfully processed documents unless asked
    /// otherwise; `status=all` drops the filter entirely.
    fn to_filter(&self) -> DocumentFilter {
        let status = match self.status.as_deref() {
            None => Some("processed".to_string()),
            Some(s) if s.eq_ignore_ascii_case("all") => None,
            Some(s) => Some(s.to_string()),
        };

        DocumentFilter {
            keyword: self.keyword.clone().filter(|k| !k.trim().is_empty()),
            status,
        }
    }
}

/// GET / - filterable HTML table of documents.
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<DocumentsQuery>,
) -> Html<String> {
    let filter = params.to_filter();
    match document_repo::query(&state.db, &filter) {
        Ok(docs) => {
            let rows: Vec<(ProcessedDocument, Option<String>)> = docs
                .into_iter()
                .map(|doc| {
                    let source = source_url(&state.db, &doc.filename);
                    (doc, source)
                })
                .collect();
            Html(render_page(&rows, &params, None))
        }
        Err(e) => {
            warn!(error = %e, "Document query failed");
            Html(render_page(&[], &params, Some("Could not load documents")))
        }
    }
}

/// Download provenance for the table's Source column. Lookup failures
/// just leave the column blank.
fn source_url(db: &Database, filename: &str) -> Option<String> {
    download_repo::find_by_filename(db, filename)
        .ok()
        .flatten()
        .map(|row| row.source_url)
}

/// GET /api/documents - the same listing as JSON.
pub async fn api_documents(
    State(state): State<AppState>,
    Query(params): Query<DocumentsQuery>,
) -> Response {
    let filter = params.to_filter();
    match document_repo::query(&state.db, &filter) {
        Ok(docs) => Json(docs).into_response(),
        Err(e) => {
            warn!(error = %e, "Document query failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /download/:filename - the stored PDF bytes.
pub async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Response {
    // The filename must be a bare name; anything path-like is rejected
    // before touching the filesystem.
    if !is_safe_filename(&filename) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let path = state.download_dir.join(&filename);
    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("inline; filename=\"{}\"", filename),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Bare `.pdf` filenames only. No separators, no parent references.
fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
        && name.to_ascii_lowercase().ends_with(".pdf")
}

fn render_page(
    docs: &[(ProcessedDocument, Option<String>)],
    params: &DocumentsQuery,
    error: Option<&str>,
) -> String {
    let mut rows = String::new();
    for (doc, source) in docs {
        let keywords = doc
            .keywords
            .iter()
            .map(|k| format!("{} ({})", k.word, k.frequency))
            .collect::<Vec<_>>()
            .join(", ");
        let source_cell = match source {
            Some(url) => format!(
                "<a href=\"{url}\">{url}</a>",
                url = escape_html(url)
            ),
            None => String::new(),
        };
        rows.push_str(&format!(
            "<tr><td><a href=\"/download/{name}\">{name}</a></td>\
             <td>{status}</td><td>{pages}</td><td>{version}</td>\
             <td>{keywords}</td><td>{summary}</td><td>{source}</td></tr>\n",
            name = escape_html(&doc.filename),
            status = escape_html(doc.status.as_str()),
            pages = doc.metadata.page_count,
            version = doc.version,
            keywords = escape_html(&keywords),
            summary = escape_html(&doc.summary),
            source = source_cell,
        ));
    }

    let banner = match error {
        Some(msg) => format!("<p class=\"error\">{}</p>", escape_html(msg)),
        None => String::new(),
    };

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>PDF Harvest</title>\n\
         <style>\n\
         body {{ font-family: sans-serif; margin: 2em; }}\n\
         table {{ border-collapse: collapse; width: 100%; }}\n\
         th, td {{ border: 1px solid #ccc; padding: 0.4em; text-align: left; }}\n\
         .error {{ color: #a00; }}\n\
         </style>\n</head>\n<body>\n\
         <h1>Processed documents</h1>\n\
         {banner}\
         <form method=\"get\" action=\"/\">\n\
         <label>Keyword <input name=\"keyword\" value=\"{keyword}\"></label>\n\
         <label>Status <select name=\"status\">\n\
         <option value=\"processed\"{sel_processed}>processed</option>\n\
         <option value=\"failed\"{sel_failed}>failed</option>\n\
         <option value=\"pending\"{sel_pending}>pending</option>\n\
         <option value=\"all\"{sel_all}>all</option>\n\
         </select></label>\n\
         <button type=\"submit\">Filter</button>\n\
         </form>\n\
         <p>{count} document(s)</p>\n\
         <table>\n\
         <tr><th>File</th><th>Status</th><th>Pages</th><th>Version</th>\
         <th>Keywords</th><th>Summary</th><th>Source</th></tr>\n\
         {rows}</table>\n</body>\n</html>\n",
        banner = banner,
        keyword = escape_html(params.keyword.as_deref().unwrap_or("")),
        sel_processed = selected(params, "processed"),
        sel_failed = selected(params, "failed"),
        sel_pending = selected(params, "pending"),
        sel_all = selected(params, "all"),
        count = docs.len(),
        rows = rows,
    )
}

fn selected(params: &DocumentsQuery, value: &str) -> &'static str {
    let current = params.status.as_deref().unwrap_or("processed");
    if current.eq_ignore_ascii_case(value) {
        " selected"
    } else {
        ""
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
