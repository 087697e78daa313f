pub mod list_objects;
pub mod load_index;
pub mod lookup_term;
pub mod search;
pub mod validate_index;

pub use list_objects::*;
pub use load_index::*;
pub use lookup_term::*;
pub use search::*;
pub use validate_index::*;
