//! Reading and writing the `Search.setIndex(...)` artifact.

use super::model::SearchIndex;
use super::validate::validate;
use crate::error::IndexError;
use std::path::Path;

const WRAPPER_PREFIX: &str = "Search.setIndex(";

/// Parses a search index from either the `Search.setIndex(...)` script form or
/// bare JSON.
pub fn parse_index(text: &str) -> Result<SearchIndex, IndexError> {
    let payload = strip_wrapper(text)?;
    Ok(serde_json::from_str(payload)?)
}

/// Parses and rejects indexes that break their structural invariants.
pub fn parse_index_checked(text: &str) -> Result<SearchIndex, IndexError> {
    let index = parse_index(text)?;
    let report = validate(&index);
    if report.is_valid() {
        Ok(index)
    } else {
        Err(IndexError::Invalid(report))
    }
}

fn strip_wrapper(text: &str) -> Result<&str, IndexError> {
    let trimmed = text.trim_start_matches('\u{feff}').trim();
    if let Some(rest) = trimmed.strip_prefix(WRAPPER_PREFIX) {
        let rest = rest.trim_end_matches(|c: char| c == ';' || c.is_whitespace());
        rest.strip_suffix(')')
            .ok_or(IndexError::Wrapper("missing closing parenthesis"))
    } else if trimmed.starts_with('{') {
        Ok(trimmed)
    } else {
        Err(IndexError::Wrapper(
            "expected `Search.setIndex(` or a JSON object",
        ))
    }
}

/// Renders the index in the script form consumed by the documentation site.
pub fn render_index(index: &SearchIndex) -> Result<String, IndexError> {
    let json = serde_json::to_string(index)?;
    Ok(format!("{WRAPPER_PREFIX}{json})"))
}

/// Reads the raw bytes of an index file.
pub async fn read_index_bytes(path: &Path) -> Result<Vec<u8>, IndexError> {
    tokio::fs::read(path).await.map_err(|source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses index bytes already read from disk.
pub fn parse_index_bytes(bytes: &[u8]) -> Result<SearchIndex, IndexError> {
    let text = String::from_utf8_lossy(bytes);
    parse_index(&text)
}

/// Loads an index file from disk.
pub async fn load_index(path: &Path) -> Result<SearchIndex, IndexError> {
    let start = std::time::Instant::now();
    let bytes = read_index_bytes(path).await?;
    let index = parse_index_bytes(&bytes)?;
    tracing::debug!(
        "Parsed search index {} ({} documents, {} terms) in {:?}",
        path.display(),
        index.document_count(),
        index.terms().len(),
        start.elapsed()
    );
    Ok(index)
}

/// Writes an index file, creating parent directories if needed.
pub async fn write_index(path: &Path, index: &SearchIndex) -> Result<(), IndexError> {
    let rendered = render_index(index)?;
    let io_err = |source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    tokio::fs::write(path, rendered).await.map_err(io_err)?;
    tracing::info!("Wrote search index to {}", path.display());
    Ok(())
}
