//! Line highlighting for text documents
//!
//! Maps matched keywords back to the surface words of a document. Each
//! keyword is stemmed, each stem is resolved to every normalized term in
//! the content that shares it, and each term to the original words it was
//! read from. Those words are then highlighted line by line.

use crate::analysis::{is_word_char, normalize, tokenize, TokenizerConfig};
use crate::error::Result;
use crate::index::normalize_tag;
use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::ops::Range;

lazy_static! {
    static ref MARKDOWN_LINK_RE: Regex = Regex::new(r"\[[^\]]*\]\(([^)]*)\)").unwrap();
}

/// Marker wrapped around highlighted runs
pub const HIGHLIGHT_MARKER: &str = "==";

/// Matches separated by at most this many bytes of whitespace merge
const MAX_MERGE_GAP: usize = 3;

/// A highlighted run within a line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermMatch {
    /// Text of the run as it appears in the line
    pub term: String,
    /// Byte offsets into the line
    pub start: usize,
    pub end: usize,
}

/// A line with at least one highlighted run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightedLine {
    pub highlighted_text: String,
    /// 0-based
    pub line_number: usize,
    pub term_matches: Vec<TermMatch>,
}

/// Surface words and stems of one document
struct ContentIndex {
    /// normalized term -> lowercase surface words it was read from
    term_to_words: HashMap<String, BTreeSet<String>>,
    /// stem -> normalized terms sharing it
    stemming: HashMap<String, BTreeSet<String>>,
}

impl ContentIndex {
    fn build(content: &str, config: &TokenizerConfig) -> Self {
        let mut term_to_words: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut stemming: HashMap<String, BTreeSet<String>> = HashMap::new();

        for token in tokenize(content, &config.with_stopword_removal(false)) {
            // A compound piece maps to the whole word it was split from
            term_to_words
                .entry(token.normalized.clone())
                .or_default()
                .insert(content[token.word.clone()].to_lowercase());
            stemming.entry(token.term).or_default().insert(token.normalized);
        }

        Self {
            term_to_words,
            stemming,
        }
    }

    fn words_for_stem(&self, stem: &str) -> BTreeSet<String> {
        let mut words = BTreeSet::new();
        let direct = self.term_to_words.get(stem).into_iter();
        let shared = self
            .stemming
            .get(stem)
            .into_iter()
            .flatten()
            .filter_map(|term| self.term_to_words.get(term));
        for set in direct.chain(shared) {
            words.extend(set.iter().cloned());
        }
        words
    }
}

#[derive(Debug, Clone)]
struct Hit {
    range: Range<usize>,
    stopword: bool,
}

/// Highlight `keywords` in `content`.
///
/// Keywords starting with `#` match tags literally; other keywords match
/// every word sharing one of their stems. Matches inside markdown link
/// targets are ignored, lines whose only matches are stopwords are
/// dropped, and matches separated only by a little whitespace merge into
/// one run. Lines come back ordered by number of runs, most first, then by
/// line number.
pub fn highlight(
    content: &str,
    keywords: &[String],
    config: &TokenizerConfig,
) -> Result<Vec<HighlightedLine>> {
    let index = ContentIndex::build(content, config);
    let analyzer = config.with_stopword_removal(false);

    let mut words = BTreeSet::new();
    let mut tags = BTreeSet::new();
    for keyword in keywords {
        let keyword = keyword.trim();
        if keyword.starts_with('#') {
            let tag = normalize_tag(keyword);
            if !tag.is_empty() {
                tags.insert(tag);
            }
            continue;
        }
        for token in tokenize(keyword, &analyzer) {
            words.extend(index.words_for_stem(&token.term));
        }
    }

    let word_re = alternation(&words, |w| format!("(?:{})", w))?;
    let tag_re = alternation(&tags, |t| format!("#(?:{})", t))?;
    if word_re.is_none() && tag_re.is_none() {
        return Ok(Vec::new());
    }

    let mut lines = Vec::new();
    for (line_number, line) in content.split('\n').enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let excluded: Vec<Range<usize>> = MARKDOWN_LINK_RE
            .captures_iter(line)
            .filter_map(|caps| caps.get(1).map(|m| m.range()))
            .collect();

        let mut hits = Vec::new();
        if let Some(re) = &word_re {
            for m in re.find_iter(line).filter(|m| is_word_boundary(line, m.range())) {
                hits.push(Hit {
                    stopword: config.is_stopword(&normalize(m.as_str())),
                    range: m.range(),
                });
            }
        }
        if let Some(re) = &tag_re {
            for m in re.find_iter(line) {
                if is_tag_boundary(line, m.range()) {
                    hits.push(Hit {
                        range: m.range(),
                        stopword: false,
                    });
                }
            }
        }

        hits.retain(|hit| !excluded.iter().any(|ex| overlaps(ex, &hit.range)));
        if hits.iter().all(|hit| hit.stopword) {
            continue;
        }

        let runs = merge_runs(line, hits);
        lines.push(HighlightedLine {
            highlighted_text: mark(line, &runs),
            line_number,
            term_matches: runs
                .into_iter()
                .map(|r| TermMatch {
                    term: line[r.clone()].to_string(),
                    start: r.start,
                    end: r.end,
                })
                .collect(),
        });
    }

    lines.sort_by(|a, b| {
        b.term_matches
            .len()
            .cmp(&a.term_matches.len())
            .then(a.line_number.cmp(&b.line_number))
    });
    Ok(lines)
}

/// Case-insensitive alternation of escaped values, longest first
fn alternation(values: &BTreeSet<String>, wrap: impl Fn(&str) -> String) -> Result<Option<Regex>> {
    if values.is_empty() {
        return Ok(None);
    }
    let mut sorted: Vec<&String> = values.iter().collect();
    sorted.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    let body = sorted
        .iter()
        .map(|v| regex::escape(v))
        .collect::<Vec<_>>()
        .join("|");
    let re = RegexBuilder::new(&wrap(&body)).case_insensitive(true).build()?;
    Ok(Some(re))
}

/// Words end where the tokenizer splits them, so `_` separates `black`
/// from `cat`
fn is_word_boundary(line: &str, range: Range<usize>) -> bool {
    let before_ok = line[..range.start].chars().next_back().map_or(true, |c| !is_word_char(c));
    let after_ok = line[range.end..].chars().next().map_or(true, |c| !is_word_char(c));
    before_ok && after_ok
}

fn is_tag_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '/'
}

/// Tags do not obey `\b`: check by hand that the match is not glued to a
/// preceding word or followed by more tag characters
fn is_tag_boundary(line: &str, range: Range<usize>) -> bool {
    let before_ok = line[..range.start]
        .chars()
        .next_back()
        .map_or(true, |c| !c.is_alphanumeric() && c != '#');
    let after_ok = line[range.end..].chars().next().map_or(true, |c| !is_tag_char(c));
    before_ok && after_ok
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

/// Sort, drop overlaps and merge hits separated by short whitespace
fn merge_runs(line: &str, mut hits: Vec<Hit>) -> Vec<Range<usize>> {
    hits.sort_by_key(|h| (h.range.start, std::cmp::Reverse(h.range.end)));

    let mut runs: Vec<Range<usize>> = Vec::new();
    for hit in hits {
        if let Some(last) = runs.last_mut() {
            if hit.range.start <= last.end {
                last.end = last.end.max(hit.range.end);
                continue;
            }
            let gap = &line[last.end..hit.range.start];
            if gap.len() <= MAX_MERGE_GAP && gap.chars().all(char::is_whitespace) {
                last.end = hit.range.end;
                continue;
            }
        }
        runs.push(hit.range);
    }
    runs
}

fn mark(line: &str, runs: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(line.len() + runs.len() * 2 * HIGHLIGHT_MARKER.len());
    let mut cursor = 0;
    for run in runs {
        out.push_str(&line[cursor..run.start]);
        out.push_str(HIGHLIGHT_MARKER);
        out.push_str(&line[run.clone()]);
        out.push_str(HIGHLIGHT_MARKER);
        cursor = run.end;
    }
    out.push_str(&line[cursor..]);
    out
}
