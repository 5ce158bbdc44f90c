//! Text analysis
//!
//! Tokenization, stopword filtering and stemming. Everything here is pure:
//! the indexer, the query evaluator and the highlighter all run the same
//! functions with the same [`TokenizerConfig`], which is what makes stem
//! equivalence hold between index time and query time.

mod stemmer;
pub mod stopwords;
mod tokenizer;

pub use stemmer::stem;
pub(crate) use tokenizer::is_word_char;
pub use tokenizer::{normalize, query_terms, tokenize, unique_terms, Token, TokenizerConfig};
