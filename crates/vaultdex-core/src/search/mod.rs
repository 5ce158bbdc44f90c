//! Search module
//!
//! Provides:
//! - Query operations over keywords, filenames, folders and properties
//! - Batch evaluation with per-operation failures and score ordering
//! - Pagination
//! - Line highlighting for text documents and densest-window snippets for
//!   PDF pages

mod evaluator;
mod highlight;
mod operation;
mod paginate;
mod pdf_snippet;

pub use evaluator::{
    score, sort_results, ConditionResult, Evaluation, OperationFailure, QueryEvaluator,
};
pub use highlight::{highlight, HighlightedLine, TermMatch, HIGHLIGHT_MARKER};
pub use operation::{MatchMode, Operation, PropertyFilter, ROOT_FOLDER};
pub use paginate::{paginate, PaginatedResult};
pub use pdf_snippet::{
    best_window, occurrences, pdf_snippet, Occurrence, PdfSelection, PdfSnippet, WINDOW_SIZE,
};
