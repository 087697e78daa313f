//! Loading, validating, querying and regenerating Sphinx documentation search
//! indexes (`searchindex.js`), with an MCP server front end.

pub mod build;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod schema;
pub mod search;
pub mod server;
pub mod snapshot;
pub mod state;
pub mod tools;
pub mod tracing;

pub use build::IndexBuilder;
pub use config::Config;
pub use error::{ConfigError, IndexError, Result};
pub use index::{SearchIndex, ValidationReport, load_index, parse_index, validate};
pub use search::{SearchEngine, SearchResults};
pub use server::IndexServer;
pub use state::{IndexState, LoadedIndex, SearchSettings};
