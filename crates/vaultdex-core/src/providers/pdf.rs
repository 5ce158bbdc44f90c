//! PDF text extraction

use crate::error::{Result, VaultdexError};

/// Text of one PDF page split into ordered items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfPage {
    /// 1-based page number
    pub number: u32,
    /// Text items in reading order; the index is the item's stable key
    pub items: Vec<String>,
}

/// Page-segmented text extraction
pub trait PdfExtractor: Send + Sync {
    /// `path` is the vault path of `bytes`, used in error reports
    fn extract_pages(&self, path: &str, bytes: &[u8]) -> Result<Vec<PdfPage>>;
}

/// Extractor backed by the `pdf-extract` crate. Each non-blank line of a
/// page's text becomes one item.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractBackend;

impl PdfExtractBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PdfExtractor for PdfExtractBackend {
    fn extract_pages(&self, path: &str, bytes: &[u8]) -> Result<Vec<PdfPage>> {
        let pages = pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| {
            VaultdexError::PdfExtraction {
                path: path.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(pages
            .iter()
            .enumerate()
            .map(|(idx, text)| PdfPage {
                number: idx as u32 + 1,
                items: split_items(text),
            })
            .collect())
    }
}

/// Split page text into trimmed, non-empty line items
pub fn split_items(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
