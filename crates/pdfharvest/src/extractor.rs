//! PDF text extraction via lopdf.

use crate::error::ExtractError;

/// Extraction result: concatenated page text and the page count.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: usize,
}

/// Extracts text from a PDF byte stream. All parser faults are mapped
/// onto the typed error; malformed input never panics.
pub fn extract(pdf_bytes: &[u8]) -> Result<ExtractedText, ExtractError> {
    let _span = tracing::info_span!("extractor.extract").entered();

    let doc = lopdf::Document::load_mem(pdf_bytes)
        .map_err(|e| ExtractError::Corrupt(e.to_string()))?;

    extract_document(&doc)
}

fn extract_document(doc: &lopdf::Document) -> Result<ExtractedText, ExtractError> {
    if doc.is_encrypted() {
        return Err(ExtractError::Encrypted);
    }

    let pages = doc.get_pages();
    let page_count = pages.len();

    let mut text = String::new();
    for (page_num, _) in pages {
        // Pages that fail individually are skipped; a single bad page
        // should not discard the rest of the document.
        if let Ok(page_text) = doc.extract_text(&[page_num]) {
            text.push_str(&page_text);
            text.push('\n');
        }
    }

    if text.trim().is_empty() {
        return Err(ExtractError::Empty);
    }

    Ok(ExtractedText { text, page_count })
}
