//! Indexing pipeline
//!
//! Note parsing, per-file indexing and batch reindexing.

mod batch;
mod indexer;
mod parser;
pub mod position;

pub use batch::{
    BatchIndexer, CancellationFlag, FailedItem, IndexProgress, IndexReport, ReindexRequest,
};
pub use indexer::{IndexOutcome, Indexer};
pub use parser::{normalize_tag, parse_note, property_term, ParsedNote};
pub use position::PdfPosition;
