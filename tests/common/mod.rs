//! Shared test fixtures and utilities for integration tests.
//!
//! # Test Isolation Strategy
//!
//! Every test copies the reference index into its own temporary directory and
//! gets a fresh `IndexState` with an empty LRU cache and no snapshot store, so
//! tests can run in parallel without sharing cached state.
//!
//! # Available Fixtures
//!
//! - `fixture_index`: the reference `searchindex.js`, parsed
//! - `isolated_index`: a temp copy of the reference index plus its own state

use rstest::fixture;
use searchindex_mcp::{IndexState, SearchIndex, SearchSettings, parse_index};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Returns the project root directory (where Cargo.toml lives).
pub fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// The reference index generated from the PySpecTcl documentation.
pub fn fixture_path() -> PathBuf {
    project_root().join("tests/fixtures/searchindex.js")
}

/// A temporary directory for test isolation.
///
/// Cleaned up automatically when dropped.
#[allow(dead_code)] // Methods used across different integration test crates
pub struct TempWorkspace {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl TempWorkspace {
    /// Creates a new empty temporary workspace.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    /// Returns the root path of this workspace.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates a file with the given content within this workspace.
    ///
    /// Parent directories are created automatically if they don't exist.
    ///
    /// # Panics
    /// Panics if file creation fails.
    pub fn create_file(&self, path: &str, content: &str) -> PathBuf {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent directory for '{}': {}", path, e)
            });
        }
        std::fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", path, e));
        full_path
    }

    /// Copies a file from the real filesystem into this workspace.
    ///
    /// # Panics
    /// Panics if copying fails.
    pub fn copy_file(&self, source: &Path, dest_relative: &str) -> PathBuf {
        let dest = self.root.join(dest_relative);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!(
                    "Failed to create parent directory for '{}': {}",
                    dest_relative, e
                )
            });
        }
        std::fs::copy(source, &dest).unwrap_or_else(|e| {
            panic!(
                "Failed to copy '{}' to '{}': {}",
                source.display(),
                dest_relative,
                e
            )
        });
        dest
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// A temp copy of the reference index with its own [`IndexState`].
///
/// Keep the value alive for the duration of the test; dropping it removes
/// the directory.
#[allow(dead_code)] // Fields used across different integration test crates
pub struct IsolatedIndex {
    pub workspace: TempWorkspace,
    pub path: PathBuf,
    pub state: Arc<IndexState>,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl IsolatedIndex {
    pub fn new() -> Self {
        let workspace = TempWorkspace::new();
        let path = workspace.copy_file(&fixture_path(), "html/searchindex.js");
        let state = Arc::new(IndexState::new(4, None, SearchSettings::default()));
        Self {
            workspace,
            path,
            state,
        }
    }

    /// The index path as a tool argument.
    pub fn path_arg(&self) -> Option<String> {
        Some(self.path.display().to_string())
    }
}

impl Default for IsolatedIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[fixture]
pub fn fixture_index() -> SearchIndex {
    let text = std::fs::read_to_string(fixture_path()).expect("Failed to read fixture index");
    parse_index(&text).expect("Fixture index should parse")
}

#[fixture]
pub fn isolated_index() -> IsolatedIndex {
    IsolatedIndex::new()
}
