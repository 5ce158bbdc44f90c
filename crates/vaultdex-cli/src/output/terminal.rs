//! Terminal output formatter

use vaultdex_core::{IndexReport, SearchPage, Snippet};

/// Highlighted lines shown per text result
const MAX_LINES: usize = 3;

pub fn format_search_page(page: &SearchPage, snippets: &[Option<Snippet>]) -> String {
    let mut output = String::new();

    for failure in &page.failures {
        output.push_str(&format!("! operation {}: {}\n", failure.index, failure.error));
    }

    if page.results.items.is_empty() {
        output.push_str("No results\n");
        return output;
    }

    for (idx, result) in page.results.items.iter().enumerate() {
        output.push_str(&format!("{:>7.2} {}", result.score, result.document.path));
        if !result.keywords_matched.is_empty() {
            output.push_str(&format!("  [{}]", result.keywords_matched.join(", ")));
        }
        output.push('\n');

        if let Some(Some(snippet)) = snippets.get(idx) {
            for line in snippet_lines(snippet, MAX_LINES) {
                output.push_str(&format!("        {}\n", line));
            }
        }
    }

    output.push_str(&format!(
        "\nPage {}/{} ({} results)\n",
        page.results.page,
        page.results.total_pages.max(1),
        page.results.total_count
    ));
    output
}

pub fn format_snippet(snippet: &Snippet) -> String {
    let lines = snippet_lines(snippet, usize::MAX);
    if lines.is_empty() {
        return "No matches\n".to_string();
    }
    lines.into_iter().map(|l| l + "\n").collect()
}

fn snippet_lines(snippet: &Snippet, max: usize) -> Vec<String> {
    match snippet {
        Snippet::Text { lines } => lines
            .iter()
            .take(max)
            .map(|l| format!("{:>4}: {}", l.line_number + 1, l.highlighted_text))
            .collect(),
        Snippet::Pdf {
            snippet: Some(s),
            link,
            ..
        } => {
            let mut out = vec![s.text.clone()];
            if let Some(link) = link {
                out.push(format!("#{}", link));
            }
            out
        }
        Snippet::Pdf { snippet: None, .. } => Vec::new(),
    }
}

pub fn format_report(report: &IndexReport) -> String {
    let mut output = String::new();
    if report.cancelled {
        output.push_str("Indexing cancelled\n");
    }
    output.push_str(&format!("Indexed:    {}\n", report.indexed));
    output.push_str(&format!("Unchanged:  {}\n", report.unchanged));
    output.push_str(&format!("Skipped:    {}\n", report.skipped));
    output.push_str(&format!("Removed:    {}\n", report.removed));
    output.push_str(&format!("Failed:     {}\n", report.failed.len()));
    for item in &report.failed {
        output.push_str(&format!("  {}: {}\n", item.path, item.error));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultdex_core::index::FailedItem;

    #[test]
    fn test_report_lists_failures() {
        let report = IndexReport {
            indexed: 2,
            failed: vec![FailedItem {
                path: "bad.md".to_string(),
                error: "invalid UTF-8".to_string(),
            }],
            ..Default::default()
        };
        let text = format_report(&report);
        assert!(text.contains("Indexed:    2"));
        assert!(text.contains("  bad.md: invalid UTF-8"));
    }

    #[test]
    fn test_pdf_snippet_without_match() {
        let snippet = Snippet::Pdf {
            page: 1,
            snippet: None,
            link: None,
        };
        assert_eq!(format_snippet(&snippet), "No matches\n");
    }
}
