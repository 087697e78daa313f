//! Query resolution over a documentation search index.
//!
//! This module provides tokenization, query parsing, scoring and the search
//! engine that combines them.

// Module declarations
pub mod engine;
pub mod query;
pub mod scoring;
pub mod tokenize;

pub use engine::{
    DEFAULT_MIN_PARTIAL_LEN, DocumentHit, ObjectFilter, ObjectHit, SearchEngine, SearchResults,
};
pub use query::{ParsedQuery, QueryWord, parse_query};
pub use scoring::{Scorer, relative_relevance};
