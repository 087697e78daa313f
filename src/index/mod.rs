//! The generated documentation search index: data model, file format and
//! structural validation.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    load_index, parse_index, parse_index_bytes, parse_index_checked, read_index_bytes,
    render_index, write_index,
};
pub use model::{
    DocRefs, DocumentRef, IndexStats, ObjName, ObjectEntry, ObjectType, SearchIndex,
    full_object_name,
};
pub use validate::{ValidationReport, Violation, validate};
