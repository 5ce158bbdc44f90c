//! JSON output formatter

use serde::Serialize;
use vaultdex_core::{SearchPage, Snippet};

pub fn to_pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string()) + "\n"
}

pub fn format_search_page(page: &SearchPage, snippets: &[Option<Snippet>]) -> String {
    let results: Vec<serde_json::Value> = page
        .results
        .items
        .iter()
        .enumerate()
        .map(|(idx, r)| {
            serde_json::json!({
                "path": r.document.path,
                "file_name": r.document.file_name,
                "score": r.score,
                "keywords_matched": r.keywords_matched,
                "tags": r.document.tags,
                "snippet": snippets.get(idx).cloned().flatten(),
            })
        })
        .collect();

    to_pretty(&serde_json::json!({
        "results": results,
        "total_count": page.results.total_count,
        "page": page.results.page,
        "limit": page.results.limit,
        "total_pages": page.results.total_pages,
        "failures": page.failures,
    }))
}

pub fn format_snippet(path: &str, snippet: &Snippet) -> String {
    to_pretty(&serde_json::json!({
        "path": path,
        "snippet": snippet,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultdex_core::search::{paginate, HighlightedLine};

    #[test]
    fn test_empty_page_is_valid_json() {
        let page = SearchPage {
            results: paginate(&[], 1, 20),
            failures: Vec::new(),
        };
        let value: serde_json::Value = serde_json::from_str(&format_search_page(&page, &[])).unwrap();
        assert_eq!(value["total_count"], 0);
        assert_eq!(value["results"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_snippet_kind_tag() {
        let snippet = Snippet::Text {
            lines: vec![HighlightedLine {
                highlighted_text: "==cat==".to_string(),
                line_number: 0,
                term_matches: Vec::new(),
            }],
        };
        let value: serde_json::Value =
            serde_json::from_str(&format_snippet("a.md", &snippet)).unwrap();
        assert_eq!(value["snippet"]["kind"], "text");
        assert_eq!(value["snippet"]["lines"][0]["highlighted_text"], "==cat==");
    }
}
