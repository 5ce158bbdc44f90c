//! Text tokenizer
//!
//! Pipeline: split into surface words -> split compounds on case boundaries
//!           -> NFD + strip combining marks -> lowercase
//!           -> drop stopwords (optional) -> stem (optional)
//!
//! Every token keeps the byte range it came from, so a term can always be
//! traced back to the original substring for highlighting.

use super::stemmer::stem;
use super::stopwords;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Range;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Tokenizer settings. A plain value: derive a variant with the `with_*`
/// methods instead of mutating a shared instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Drop stopwords from the output
    pub remove_stopwords: bool,

    /// Reduce terms to their Porter root
    pub stem: bool,

    /// Split camelCase / PascalCase words into separate terms
    pub split_compounds: bool,

    /// Additional stopwords on top of the built-in English list
    pub extra_stopwords: Vec<String>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            remove_stopwords: true,
            stem: true,
            split_compounds: true,
            extra_stopwords: Vec::new(),
        }
    }
}

impl TokenizerConfig {
    /// Same settings with stopword removal switched on or off
    pub fn with_stopword_removal(&self, enabled: bool) -> Self {
        Self {
            remove_stopwords: enabled,
            ..self.clone()
        }
    }

    /// Same settings with stemming switched on or off
    pub fn with_stemming(&self, enabled: bool) -> Self {
        Self {
            stem: enabled,
            ..self.clone()
        }
    }

    /// Check a normalized term against the built-in and extra stopwords
    pub fn is_stopword(&self, term: &str) -> bool {
        stopwords::is_stopword(term) || self.extra_stopwords.iter().any(|w| w == term)
    }

    /// Normalize and optionally stem a single term the same way
    /// [`tokenize`] would.
    pub fn analyze_term(&self, term: &str) -> String {
        let normalized = normalize(term);
        if self.stem {
            stem(&normalized)
        } else {
            normalized
        }
    }
}

/// One analyzed term with its origin in the input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Searchable form (stemmed when stemming is on)
    pub term: String,
    /// Lowercase, diacritic-free form before stemming
    pub normalized: String,
    /// Byte range of this term in the input
    pub span: Range<usize>,
    /// Byte range of the whole surface word the term was split from
    pub word: Range<usize>,
    /// Ordinal of the term in the input, counted before stopword removal
    pub position: usize,
}

impl Token {
    /// Byte offset of the term in the input
    pub fn offset(&self) -> usize {
        self.span.start
    }
}

/// Tokenize text into an ordered list of terms.
///
/// Pure and deterministic: the same input and config always produce the
/// same output.
pub fn tokenize(text: &str, config: &TokenizerConfig) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut position = 0;

    for word in split_words(text) {
        let pieces = if config.split_compounds {
            split_compound(text, &word)
        } else {
            vec![word.clone()]
        };

        for piece in pieces {
            let normalized = normalize(&text[piece.clone()]);
            if normalized.is_empty() {
                continue;
            }
            let current = position;
            position += 1;

            if config.remove_stopwords && config.is_stopword(&normalized) {
                continue;
            }

            let term = if config.stem {
                stem(&normalized)
            } else {
                normalized.clone()
            };

            tokens.push(Token {
                term,
                normalized,
                span: piece,
                word: word.clone(),
                position: current,
            });
        }
    }

    tokens
}

/// Distinct terms of `text`, in first-seen order.
pub fn unique_terms(text: &str, config: &TokenizerConfig) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(text, config)
        .into_iter()
        .map(|t| t.term)
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Search terms for a query keyword. A keyword made only of stopwords is
/// analyzed with stopwords kept, so it still yields terms.
pub fn query_terms(keyword: &str, config: &TokenizerConfig) -> Vec<String> {
    let terms = unique_terms(keyword, config);
    if terms.is_empty() && config.remove_stopwords {
        unique_terms(keyword, &config.with_stopword_removal(false))
    } else {
        terms
    }
}

/// Lowercase and strip diacritics (canonical decomposition, then drop
/// combining marks).
pub fn normalize(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || is_combining_mark(c)
}

/// Maximal runs of letters, digits and combining marks.
fn split_words(text: &str) -> Vec<Range<usize>> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        if is_word_char(c) {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            words.push(s..i);
        }
    }
    if let Some(s) = start {
        words.push(s..text.len());
    }

    words
}

/// Split a word at lower->upper transitions ("camelCase") and before the
/// last capital of an acronym run ("HTMLParser" -> "HTML", "Parser").
fn split_compound(text: &str, word: &Range<usize>) -> Vec<Range<usize>> {
    let chars: Vec<(usize, char)> = text[word.clone()].char_indices().collect();
    let mut pieces = Vec::new();
    let mut start = 0;

    for idx in 1..chars.len() {
        let (offset, cur) = chars[idx];
        let prev = chars[idx - 1].1;
        let next = chars.get(idx + 1).map(|(_, c)| *c);

        let boundary = (prev.is_lowercase() && cur.is_uppercase())
            || (prev.is_uppercase()
                && cur.is_uppercase()
                && next.is_some_and(|n| n.is_lowercase()));

        if boundary {
            pieces.push(word.start + start..word.start + offset);
            start = offset;
        }
    }
    pieces.push(word.start + start..word.end);

    pieces
}
