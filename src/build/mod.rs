//! Building search indexes from documentation sources.

pub mod builder;
pub mod source;

pub use builder::{DocumentSpec, IndexBuilder, ObjectSpec, SCHEMA_VERSION, section_anchor};
pub use source::{SourcePage, build_index_from_dir, collect_sources, parse_source};
