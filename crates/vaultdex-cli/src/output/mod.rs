//! Output formatters

pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use vaultdex_core::{IndexReport, SearchPage, Snippet};

/// Format one page of search results; `snippets` runs parallel to the
/// page items and is empty when highlighting is off
pub fn format_search_page(page: &SearchPage, snippets: &[Option<Snippet>], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_search_page(page, snippets),
        OutputFormat::Cli => terminal::format_search_page(page, snippets),
    }
}

/// Format the snippet of a single document
pub fn format_snippet(path: &str, snippet: &Snippet, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_snippet(path, snippet),
        OutputFormat::Cli => terminal::format_snippet(snippet),
    }
}

/// Format an indexing report
pub fn format_report(report: &IndexReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::to_pretty(report),
        OutputFormat::Cli => terminal::format_report(report),
    }
}
