//! Snippets for PDF pages
//!
//! Rebuilds a page's word sequence from its stored surface terms, picks the
//! densest window of matched stems and reports a selection range that a
//! viewer can use as a deep link.

use super::highlight::HIGHLIGHT_MARKER;
use crate::analysis::{query_terms, TokenizerConfig};
use crate::db::{Term, TermSource};
use crate::index::PdfPosition;
use serde::Serialize;
use std::collections::HashSet;
use std::ops::Range;

/// Occurrences considered per snippet
pub const WINDOW_SIZE: usize = 21;

/// One surface word on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub text: String,
    pub position: PdfPosition,
    /// Analyzed form, compared against the query stems
    pub stem: String,
    pub matched: bool,
}

impl Occurrence {
    fn end_offset(&self) -> u32 {
        self.position.char_offset + self.text.chars().count() as u32
    }
}

/// Character range on a page, `(item, offset)` to `(item, offset)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PdfSelection {
    pub start_item: u32,
    pub start_offset: u32,
    pub end_item: u32,
    pub end_offset: u32,
}

impl PdfSelection {
    /// Deep-link fragment: `page=N&selection=a,b,c,d`
    pub fn link_fragment(&self, page: u32) -> String {
        format!(
            "page={}&selection={},{},{},{}",
            page, self.start_item, self.start_offset, self.end_item, self.end_offset
        )
    }
}

/// Best window of a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdfSnippet {
    /// Window text with matched words wrapped in `==`
    pub text: String,
    /// From the first to the last matched word inside the window
    pub selection: PdfSelection,
    /// Distinct matched stems in the window
    pub matched_terms: usize,
}

/// Ordered surface-word occurrences of a page, flagged against `keywords`
pub fn occurrences(terms: &[Term], keywords: &[String], config: &TokenizerConfig) -> Vec<Occurrence> {
    let stems: HashSet<String> = keywords
        .iter()
        .filter(|k| !k.trim_start().starts_with('#'))
        .flat_map(|k| query_terms(k, config))
        .collect();

    let mut out: Vec<Occurrence> = terms
        .iter()
        .filter(|t| t.is_original && t.source == TermSource::PdfContent)
        .flat_map(|t| {
            t.positions.iter().map(move |p| (t.term.as_str(), PdfPosition::unpack(*p)))
        })
        .map(|(text, position)| {
            let stem = config.analyze_term(text);
            let matched = stems.contains(&stem);
            Occurrence {
                text: text.to_string(),
                position,
                stem,
                matched,
            }
        })
        .collect();

    out.sort_by_key(|o| o.position);
    out
}

/// Window of at most [`WINDOW_SIZE`] occurrences with the most distinct
/// matched stems; the earliest wins a tie. `None` when nothing matches.
pub fn best_window(occurrences: &[Occurrence], size: usize) -> Option<Range<usize>> {
    let size = size.min(occurrences.len());
    if size == 0 {
        return None;
    }

    let mut best: Option<(usize, usize)> = None;
    for start in 0..=occurrences.len() - size {
        let distinct: HashSet<&str> = occurrences[start..start + size]
            .iter()
            .filter(|o| o.matched)
            .map(|o| o.stem.as_str())
            .collect();
        let score = distinct.len();
        if score > 0 && best.map_or(true, |(_, s)| score > s) {
            best = Some((start, score));
        }
    }

    best.map(|(start, _)| start..start + size)
}

/// Build the snippet for one page from its stored terms
pub fn pdf_snippet(terms: &[Term], keywords: &[String], config: &TokenizerConfig) -> Option<PdfSnippet> {
    let occurrences = occurrences(terms, keywords, config);
    let range = best_window(&occurrences, WINDOW_SIZE)?;
    let window = &occurrences[range];

    let first = window.iter().find(|o| o.matched)?;
    let last = window.iter().rev().find(|o| o.matched)?;
    let matched_terms = window
        .iter()
        .filter(|o| o.matched)
        .map(|o| o.stem.as_str())
        .collect::<HashSet<_>>()
        .len();

    Some(PdfSnippet {
        text: render(window),
        selection: PdfSelection {
            start_item: first.position.item_index,
            start_offset: first.position.char_offset,
            end_item: last.position.item_index,
            end_offset: last.end_offset(),
        },
        matched_terms,
    })
}

/// Join words, gluing pieces of one split word back together
fn render(window: &[Occurrence]) -> String {
    let mut out = String::new();
    let mut previous: Option<&Occurrence> = None;
    for occurrence in window {
        if let Some(prev) = previous {
            let glued = prev.position.item_index == occurrence.position.item_index
                && prev.end_offset() == occurrence.position.char_offset;
            if !glued {
                out.push(' ');
            }
        }
        if occurrence.matched {
            out.push_str(HIGHLIGHT_MARKER);
            out.push_str(&occurrence.text);
            out.push_str(HIGHLIGHT_MARKER);
        } else {
            out.push_str(&occurrence.text);
        }
        previous = Some(occurrence);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occ(stem: &str, item: u32, matched: bool) -> Occurrence {
        Occurrence {
            text: stem.to_string(),
            position: PdfPosition::new(item, 0).unwrap(),
            stem: stem.to_string(),
            matched,
        }
    }

    #[test]
    fn test_best_window_prefers_distinct_matches() {
        // 100 occurrences; positions 60..=75 hold four distinct matched
        // stems, elsewhere at most two repeated ones
        let mut list: Vec<Occurrence> = (0..100).map(|i| occ(&format!("w{i}"), i, false)).collect();
        for i in [5, 6, 7, 8] {
            list[i] = occ("alpha", i as u32, true);
        }
        list[10] = occ("beta", 10, true);
        for (i, stem) in [(60, "alpha"), (65, "beta"), (70, "gamma"), (75, "delta")] {
            list[i] = occ(stem, i as u32, true);
        }

        let window = best_window(&list, WINDOW_SIZE).unwrap();
        assert_eq!(window.len(), WINDOW_SIZE);
        assert!(window.start <= 60 && window.end > 75);
        assert_eq!(window.start, 55, "earliest window with the best score");
    }

    #[test]
    fn test_no_match_no_window() {
        let list: Vec<Occurrence> = (0..30).map(|i| occ("x", i, false)).collect();
        assert!(best_window(&list, WINDOW_SIZE).is_none());
        assert!(best_window(&[], WINDOW_SIZE).is_none());
    }

    #[test]
    fn test_short_page_uses_whole_page() {
        let list = vec![occ("a", 0, false), occ("b", 0, true)];
        assert_eq!(best_window(&list, WINDOW_SIZE), Some(0..2));
    }

    fn original(term: &str, positions: &[(u32, u32)]) -> Term {
        Term {
            term: term.to_string(),
            document_id: 1,
            source: TermSource::PdfContent,
            is_original: true,
            positions: positions
                .iter()
                .map(|(i, o)| PdfPosition::new(*i, *o).unwrap().pack())
                .collect(),
        }
    }

    #[test]
    fn test_snippet_selection_and_text() {
        // item 0: "The dog walked", item 1: "into the park"
        let terms = vec![
            original("The", &[(0, 0)]),
            original("dog", &[(0, 4)]),
            original("walked", &[(0, 8)]),
            original("into", &[(1, 0)]),
            original("the", &[(1, 5)]),
            original("park", &[(1, 9)]),
        ];
        let keywords = vec!["walking in the park".to_string()];
        let snippet = pdf_snippet(&terms, &keywords, &TokenizerConfig::default()).unwrap();

        assert_eq!(snippet.text, "The dog ==walked== into the ==park==");
        assert_eq!(
            snippet.selection,
            PdfSelection {
                start_item: 0,
                start_offset: 8,
                end_item: 1,
                end_offset: 13,
            }
        );
        assert_eq!(snippet.matched_terms, 2);
        assert_eq!(
            snippet.selection.link_fragment(3),
            "page=3&selection=0,8,1,13"
        );
    }

    #[test]
    fn test_split_word_rendered_glued() {
        let terms = vec![original("parse", &[(0, 0)]), original("Config", &[(0, 5)])];
        let keywords = vec!["config".to_string()];
        let snippet = pdf_snippet(&terms, &keywords, &TokenizerConfig::default()).unwrap();
        assert_eq!(snippet.text, "parse==Config==");
    }

    #[test]
    fn test_stems_and_other_sources_ignored() {
        let mut stem = original("walk", &[(0, 0)]);
        stem.is_original = false;
        let mut other = original("walk", &[(0, 0)]);
        other.source = TermSource::Content;
        let keywords = vec!["walk".to_string()];
        assert!(pdf_snippet(&[stem, other], &keywords, &TokenizerConfig::default()).is_none());
    }
}
