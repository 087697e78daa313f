//! Deterministic search index generation.

use crate::index::{DocRefs, ObjName, ObjectEntry, SearchIndex};
use crate::search::tokenize::{english_stemmer, index_terms};
use rust_stemmers::Stemmer;
use std::collections::{BTreeMap, BTreeSet};

/// Schema version recorded in `envversion` for indexes produced here.
pub const SCHEMA_VERSION: u32 = 1;

/// One page to index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSpec {
    pub docname: String,
    pub filename: String,
    pub title: String,
    /// Section headings below the page title, in page order.
    pub sections: Vec<String>,
    pub body: String,
}

/// One API object to catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSpec {
    pub namespace: String,
    pub name: String,
    /// `domain:role`, e.g. `py:class`.
    pub role: String,
    /// Display label; derived from the role when absent.
    pub label: Option<String>,
    pub priority: i32,
    /// Empty when the anchor equals the full name.
    pub anchor: String,
    pub docname: String,
}

struct PendingDocument {
    filename: String,
    title: String,
    sections: Vec<String>,
    terms: BTreeSet<String>,
    title_terms: BTreeSet<String>,
}

/// Accumulates documents and objects and freezes them into a [`SearchIndex`].
///
/// Output depends only on the set of inputs, never on insertion order:
/// documents are ordered by docname and every posting list is sorted.
pub struct IndexBuilder {
    documents: BTreeMap<String, PendingDocument>,
    objects: BTreeMap<(String, String), ObjectSpec>,
    envversion: BTreeMap<String, u32>,
    stemmer: Stemmer,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        let mut envversion = BTreeMap::new();
        envversion.insert(env!("CARGO_PKG_NAME").to_string(), SCHEMA_VERSION);
        Self {
            documents: BTreeMap::new(),
            objects: BTreeMap::new(),
            envversion,
            stemmer: english_stemmer(),
        }
    }
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an extra `envversion` entry.
    pub fn envversion(&mut self, name: impl Into<String>, version: u32) -> &mut Self {
        self.envversion.insert(name.into(), version);
        self
    }

    /// Adds a page. A later page with the same docname replaces the earlier one.
    pub fn add_document(&mut self, doc: DocumentSpec) -> &mut Self {
        let mut title_terms: BTreeSet<String> =
            index_terms(&doc.title, &self.stemmer).into_iter().collect();
        for section in &doc.sections {
            title_terms.extend(index_terms(section, &self.stemmer));
        }
        let terms = index_terms(&doc.body, &self.stemmer).into_iter().collect();

        let pending = PendingDocument {
            filename: doc.filename,
            title: doc.title,
            sections: doc.sections,
            terms,
            title_terms,
        };
        if self.documents.insert(doc.docname.clone(), pending).is_some() {
            tracing::warn!("Document '{}' added twice, keeping the latest", doc.docname);
        }
        self
    }

    /// Adds an object. Objects are keyed by `(namespace, name)`; a duplicate
    /// replaces the earlier entry.
    pub fn add_object(&mut self, object: ObjectSpec) -> &mut Self {
        let key = (object.namespace.clone(), object.name.clone());
        if self.objects.insert(key, object).is_some() {
            tracing::debug!("Duplicate object description replaced");
        }
        self
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Freezes the accumulated input into an immutable index.
    pub fn finish(self) -> SearchIndex {
        let start = std::time::Instant::now();

        let positions: BTreeMap<&str, usize> = self
            .documents
            .keys()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        let mut terms: BTreeMap<String, BTreeSet<usize>> = BTreeMap::new();
        let mut titleterms: BTreeMap<String, BTreeSet<usize>> = BTreeMap::new();
        let mut alltitles: BTreeMap<String, Vec<(usize, Option<String>)>> = BTreeMap::new();

        for (doc, pending) in self.documents.values().enumerate() {
            for term in &pending.terms {
                terms.entry(term.clone()).or_default().insert(doc);
            }
            for term in &pending.title_terms {
                titleterms.entry(term.clone()).or_default().insert(doc);
            }
            alltitles
                .entry(pending.title.clone())
                .or_default()
                .push((doc, None));
            for section in &pending.sections {
                alltitles
                    .entry(section.clone())
                    .or_default()
                    .push((doc, Some(section_anchor(section))));
            }
        }

        // Type codes follow the sorted order of the roles in use.
        let roles: BTreeSet<&str> = self.objects.values().map(|o| o.role.as_str()).collect();
        let codes: BTreeMap<&str, u32> = roles
            .iter()
            .enumerate()
            .map(|(code, role)| (*role, code as u32))
            .collect();

        let mut objtypes = BTreeMap::new();
        let mut objnames = BTreeMap::new();
        for (&role, &code) in &codes {
            objtypes.insert(code, role.to_string());
            let label = self
                .objects
                .values()
                .find(|o| o.role == role)
                .and_then(|o| o.label.clone());
            objnames.insert(code, object_name(role, label));
        }

        let mut objects: BTreeMap<String, Vec<ObjectEntry>> = BTreeMap::new();
        for ((namespace, name), spec) in &self.objects {
            let Some(&doc) = positions.get(spec.docname.as_str()) else {
                tracing::warn!(
                    "Object '{}.{}' refers to unknown document '{}', skipping",
                    namespace,
                    name,
                    spec.docname
                );
                continue;
            };
            objects.entry(namespace.clone()).or_default().push(ObjectEntry {
                name: name.clone(),
                doc,
                objtype: codes[spec.role.as_str()],
                priority: spec.priority,
                anchor: spec.anchor.clone(),
            });
        }

        let (docnames, (filenames, titles)): (Vec<_>, (Vec<_>, Vec<_>)) = self
            .documents
            .into_iter()
            .map(|(name, pending)| (name, (pending.filename, pending.title)))
            .unzip();

        let index = SearchIndex {
            docnames,
            filenames,
            titles,
            terms: freeze(terms),
            objects,
            objtypes,
            objnames,
            titleterms: freeze(titleterms),
            envversion: self.envversion,
            alltitles,
            indexentries: BTreeMap::new(),
        };

        let stats = index.stats();
        tracing::info!(
            "Built search index: {} documents, {} terms, {} title terms, {} objects in {:?}",
            stats.documents,
            stats.terms,
            stats.title_terms,
            stats.objects,
            start.elapsed()
        );

        index
    }
}

fn freeze(postings: BTreeMap<String, BTreeSet<usize>>) -> BTreeMap<String, DocRefs> {
    postings
        .into_iter()
        .map(|(term, docs)| (term, DocRefs::from_sorted(docs.into_iter().collect())))
        .collect()
}

fn object_name(role: &str, label: Option<String>) -> ObjName {
    let (domain, kind) = role.split_once(':').unwrap_or(("", role));
    let label = label.unwrap_or_else(|| match domain_label(domain) {
        Some(prefix) => format!("{prefix} {kind}"),
        None => kind.to_string(),
    });
    ObjName(domain.to_string(), kind.to_string(), label)
}

fn domain_label(domain: &str) -> Option<&'static str> {
    match domain {
        "py" => Some("Python"),
        "c" => Some("C"),
        "cpp" => Some("C++"),
        "js" => Some("JavaScript"),
        "rst" => Some("reStructuredText"),
        "rs" | "rust" => Some("Rust"),
        _ => None,
    }
}

/// Anchor generated for a section heading: lowercase words joined by `-`.
pub fn section_anchor(heading: &str) -> String {
    heading
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
