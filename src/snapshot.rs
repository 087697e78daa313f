//! Fingerprints and on-disk snapshots of parsed indexes.
//!
//! Parsing a large `searchindex.js` is dominated by JSON decoding. Snapshots
//! store the parsed form as postcard, keyed by an xxh3 fingerprint of the
//! source bytes, so an unchanged file is never parsed twice.

use crate::error::IndexError;
use crate::index::{DocRefs, ObjName, ObjectEntry, SearchIndex};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use xxhash_rust::xxh3::xxh3_64;

/// Bumped whenever the snapshot layout changes.
const SNAPSHOT_FORMAT: u32 = 2;

/// Content hash of an index file.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub fn of(bytes: &[u8]) -> Self {
        Self(xxh3_64(bytes))
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns the fingerprint as 16 lowercase hex digits.
    pub fn as_hex(&self) -> String {
        format!("{:016x}", self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_hex())
    }
}

/// Error type for fingerprint parsing failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFingerprintError {
    #[error("invalid hexadecimal characters in fingerprint")]
    InvalidHex,
    #[error("invalid fingerprint length: expected 16 hex characters, got {0}")]
    InvalidLength(usize),
}

impl FromStr for Fingerprint {
    type Err = ParseFingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 16 {
            return Err(ParseFingerprintError::InvalidLength(s.len()));
        }
        u64::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| ParseFingerprintError::InvalidHex)
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(Self)
    }
}

/// Postcard-friendly mirror of [`SearchIndex`].
///
/// Postcard is not self-describing, so the untagged shapes of the JSON form
/// get explicit tags and free-form index entries travel as JSON text.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    format: u32,
    fingerprint: Fingerprint,
    docnames: Vec<String>,
    filenames: Vec<String>,
    titles: Vec<String>,
    terms: Vec<(String, SnapshotRefs)>,
    titleterms: Vec<(String, SnapshotRefs)>,
    objects: Vec<(String, Vec<SnapshotObject>)>,
    objtypes: Vec<(u32, String)>,
    objnames: Vec<(u32, (String, String, String))>,
    envversion: Vec<(String, u32)>,
    alltitles: Vec<(String, Vec<(usize, Option<String>)>)>,
    indexentries: String,
}

/// Tagged twin of [`DocRefs`]; keeps `0` and `[0]` apart.
#[derive(Debug, Serialize, Deserialize)]
enum SnapshotRefs {
    One(usize),
    Many(Vec<usize>),
}

impl From<&DocRefs> for SnapshotRefs {
    fn from(docs: &DocRefs) -> Self {
        match docs {
            DocRefs::One(doc) => Self::One(*doc),
            DocRefs::Many(docs) => Self::Many(docs.clone()),
        }
    }
}

impl From<SnapshotRefs> for DocRefs {
    fn from(docs: SnapshotRefs) -> Self {
        match docs {
            SnapshotRefs::One(doc) => Self::One(doc),
            SnapshotRefs::Many(docs) => Self::Many(docs),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotObject {
    name: String,
    doc: usize,
    objtype: u32,
    priority: i32,
    anchor: String,
}

fn flatten_postings(postings: &BTreeMap<String, DocRefs>) -> Vec<(String, SnapshotRefs)> {
    postings
        .iter()
        .map(|(term, docs)| (term.clone(), docs.into()))
        .collect()
}

fn restore_postings(postings: Vec<(String, SnapshotRefs)>) -> BTreeMap<String, DocRefs> {
    postings
        .into_iter()
        .map(|(term, docs)| (term, docs.into()))
        .collect()
}

impl Snapshot {
    fn capture(index: &SearchIndex, fingerprint: Fingerprint) -> Result<Self, IndexError> {
        Ok(Self {
            format: SNAPSHOT_FORMAT,
            fingerprint,
            docnames: index.docnames.clone(),
            filenames: index.filenames.clone(),
            titles: index.titles.clone(),
            terms: flatten_postings(&index.terms),
            titleterms: flatten_postings(&index.titleterms),
            objects: index
                .objects
                .iter()
                .map(|(ns, entries)| {
                    let entries = entries
                        .iter()
                        .map(|e| SnapshotObject {
                            name: e.name.clone(),
                            doc: e.doc,
                            objtype: e.objtype,
                            priority: e.priority,
                            anchor: e.anchor.clone(),
                        })
                        .collect();
                    (ns.clone(), entries)
                })
                .collect(),
            objtypes: index.objtypes.iter().map(|(k, v)| (*k, v.clone())).collect(),
            objnames: index
                .objnames
                .iter()
                .map(|(k, n)| (*k, (n.0.clone(), n.1.clone(), n.2.clone())))
                .collect(),
            envversion: index.envversion.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            alltitles: index
                .alltitles
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            indexentries: serde_json::to_string(&index.indexentries)?,
        })
    }

    fn restore(self) -> Result<SearchIndex, IndexError> {
        Ok(SearchIndex {
            docnames: self.docnames,
            filenames: self.filenames,
            titles: self.titles,
            terms: restore_postings(self.terms),
            titleterms: restore_postings(self.titleterms),
            objects: self
                .objects
                .into_iter()
                .map(|(ns, entries)| {
                    let entries = entries
                        .into_iter()
                        .map(|e| ObjectEntry {
                            name: e.name,
                            doc: e.doc,
                            objtype: e.objtype,
                            priority: e.priority,
                            anchor: e.anchor,
                        })
                        .collect();
                    (ns, entries)
                })
                .collect(),
            objtypes: self.objtypes.into_iter().collect(),
            objnames: self
                .objnames
                .into_iter()
                .map(|(k, (domain, role, label))| (k, ObjName(domain, role, label)))
                .collect(),
            envversion: self.envversion.into_iter().collect(),
            alltitles: self.alltitles.into_iter().collect(),
            indexentries: serde_json::from_str(&self.indexentries)?,
        })
    }
}

/// Encodes `index` as a snapshot stamped with `fingerprint`.
pub fn encode_snapshot(index: &SearchIndex, fingerprint: Fingerprint) -> Result<Vec<u8>, IndexError> {
    let snapshot = Snapshot::capture(index, fingerprint)?;
    Ok(postcard::to_allocvec(&snapshot)?)
}

/// Decodes a snapshot, returning `None` when it was taken from different
/// source bytes or by an incompatible version.
pub fn decode_snapshot(bytes: &[u8], expected: Fingerprint) -> Result<Option<SearchIndex>, IndexError> {
    let snapshot: Snapshot = postcard::from_bytes(bytes)?;
    if snapshot.format != SNAPSHOT_FORMAT || snapshot.fingerprint != expected {
        return Ok(None);
    }
    snapshot.restore().map(Some)
}

/// Directory holding snapshot files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, fingerprint: Fingerprint) -> PathBuf {
        self.root.join(format!("{fingerprint}.idx"))
    }

    /// Loads the snapshot for `fingerprint`. Missing, stale or corrupt
    /// snapshots yield `None`.
    pub async fn load(&self, fingerprint: Fingerprint) -> Option<SearchIndex> {
        let path = self.path_for(fingerprint);
        let bytes = tokio::fs::read(&path).await.ok()?;

        let decoded =
            tokio::task::spawn_blocking(move || decode_snapshot(&bytes, fingerprint)).await;
        match decoded {
            Ok(Ok(Some(index))) => {
                tracing::debug!("Using cached snapshot {}", path.display());
                Some(index)
            }
            Ok(Ok(None)) => {
                tracing::info!("Snapshot {} is stale, removing", path.display());
                let _ = tokio::fs::remove_file(&path).await;
                None
            }
            Ok(Err(e)) => {
                tracing::warn!("Failed to decode snapshot {}: {}", path.display(), e);
                let _ = tokio::fs::remove_file(&path).await;
                None
            }
            Err(e) => {
                tracing::warn!("Snapshot decoding task failed: {}", e);
                None
            }
        }
    }

    /// Persists a snapshot. Failures are logged and otherwise ignored.
    pub async fn store(&self, index: &SearchIndex, fingerprint: Fingerprint) {
        let path = self.path_for(fingerprint);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!("Snapshot already exists at {}", path.display());
            return;
        }

        let bytes = match encode_snapshot(index, fingerprint) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Failed to encode snapshot for {}: {}", fingerprint, e);
                return;
            }
        };

        if let Err(e) = tokio::fs::create_dir_all(&self.root).await {
            tracing::warn!("Failed to create snapshot directory {}: {}", self.root.display(), e);
            return;
        }

        // Write to a sibling file first so readers never observe a partial snapshot
        let partial = path.with_extension("idx.partial");
        let written = async {
            tokio::fs::write(&partial, &bytes).await?;
            tokio::fs::rename(&partial, &path).await
        }
        .await;

        match written {
            Ok(()) => tracing::debug!("Cached snapshot to {}", path.display()),
            Err(e) => {
                tracing::warn!("Failed to write snapshot to {}: {}", path.display(), e);
                let _ = tokio::fs::remove_file(&partial).await;
            }
        }
    }
}
