//! In-memory representation of a generated documentation search index.
//!
//! Field names match the serialized artifact one to one, so an index read from
//! `searchindex.js` can be written back without a translation layer.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Document references for a single term.
///
/// Generators write a bare integer when only one document mentions a term and
/// a list otherwise; both shapes are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocRefs {
    One(usize),
    Many(Vec<usize>),
}

impl DocRefs {
    /// Builds the most compact representation for a sorted list of documents.
    pub fn from_sorted(docs: Vec<usize>) -> Self {
        match docs.as_slice() {
            [single] => Self::One(*single),
            _ => Self::Many(docs),
        }
    }

    pub fn as_slice(&self) -> &[usize] {
        match self {
            Self::One(doc) => std::slice::from_ref(doc),
            Self::Many(docs) => docs,
        }
    }
}

/// A catalogued API entity (class, method, function, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    /// Member name relative to its namespace.
    pub name: String,
    /// Index into `docnames` of the page documenting the object.
    pub doc: usize,
    /// Key into `objtypes` / `objnames`.
    pub objtype: u32,
    /// Search priority: 0 important, 1 default, 2 unimportant, -1 hidden.
    pub priority: i32,
    /// Anchor on the page. Empty means the anchor equals the full name, `-`
    /// means the page itself.
    pub anchor: String,
}

impl ObjectEntry {
    /// Negative priorities keep an object out of search results and listings.
    pub const fn is_hidden(&self) -> bool {
        self.priority < 0
    }
}

/// Human-readable name of an object type: `(domain, role, label)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjName(pub String, pub String, pub String);

impl ObjName {
    pub fn domain(&self) -> &str {
        &self.0
    }

    pub fn role(&self) -> &str {
        &self.1
    }

    pub fn label(&self) -> &str {
        &self.2
    }
}

/// Resolved view of one object type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectType<'a> {
    pub code: u32,
    /// `domain:role` as stored in `objtypes`, e.g. `py:class`.
    pub qualified: &'a str,
    /// Display label from `objnames`, e.g. `Python class`.
    pub label: Option<&'a str>,
}

/// One document identified by its position in `docnames`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentRef<'a> {
    pub index: usize,
    pub docname: &'a str,
    pub filename: &'a str,
    pub title: &'a str,
}

/// Summary counts reported by the CLI and the `load_index` tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub documents: usize,
    pub terms: usize,
    pub title_terms: usize,
    pub namespaces: usize,
    pub objects: usize,
    pub object_types: usize,
}

/// The complete search index.
///
/// Produced once per documentation build and read-only afterwards: there are no
/// mutating accessors, a changed build produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchIndex {
    pub(crate) docnames: Vec<String>,
    pub(crate) filenames: Vec<String>,
    pub(crate) titles: Vec<String>,
    pub(crate) terms: BTreeMap<String, DocRefs>,
    #[serde(
        serialize_with = "serialize_objects",
        deserialize_with = "deserialize_objects"
    )]
    pub(crate) objects: BTreeMap<String, Vec<ObjectEntry>>,
    pub(crate) objtypes: BTreeMap<u32, String>,
    pub(crate) objnames: BTreeMap<u32, ObjName>,
    pub(crate) titleterms: BTreeMap<String, DocRefs>,
    #[serde(default)]
    pub(crate) envversion: BTreeMap<String, u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) alltitles: BTreeMap<String, Vec<(usize, Option<String>)>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) indexentries: BTreeMap<String, Vec<serde_json::Value>>,
}

impl SearchIndex {
    pub fn docnames(&self) -> &[String] {
        &self.docnames
    }

    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn terms(&self) -> &BTreeMap<String, DocRefs> {
        &self.terms
    }

    pub fn titleterms(&self) -> &BTreeMap<String, DocRefs> {
        &self.titleterms
    }

    pub fn objtypes(&self) -> &BTreeMap<u32, String> {
        &self.objtypes
    }

    pub fn objnames(&self) -> &BTreeMap<u32, ObjName> {
        &self.objnames
    }

    pub fn envversion(&self) -> &BTreeMap<String, u32> {
        &self.envversion
    }

    pub fn alltitles(&self) -> &BTreeMap<String, Vec<(usize, Option<String>)>> {
        &self.alltitles
    }

    pub fn indexentries(&self) -> &BTreeMap<String, Vec<serde_json::Value>> {
        &self.indexentries
    }

    pub fn document_count(&self) -> usize {
        self.docnames.len()
    }

    /// Returns the document at `index`, or `None` when out of range.
    pub fn doc(&self, index: usize) -> Option<DocumentRef<'_>> {
        Some(DocumentRef {
            index,
            docname: self.docnames.get(index)?,
            filename: self.filenames.get(index).map_or("", String::as_str),
            title: self.titles.get(index).map_or("", String::as_str),
        })
    }

    /// Finds a document by its docname.
    pub fn doc_by_name(&self, docname: &str) -> Option<DocumentRef<'_>> {
        let index = self.docnames.iter().position(|d| d == docname)?;
        self.doc(index)
    }

    /// Documents whose body mentions `term`. Unknown terms yield an empty slice.
    pub fn term_docs(&self, term: &str) -> &[usize] {
        self.terms.get(term).map_or(&[], DocRefs::as_slice)
    }

    /// Documents whose title mentions `term`. Unknown terms yield an empty slice.
    pub fn title_docs(&self, term: &str) -> &[usize] {
        self.titleterms.get(term).map_or(&[], DocRefs::as_slice)
    }

    /// Iterates every object as `(namespace, entry)` in namespace order.
    pub fn objects(&self) -> impl Iterator<Item = (&str, &ObjectEntry)> {
        self.objects
            .iter()
            .flat_map(|(ns, entries)| entries.iter().map(move |e| (ns.as_str(), e)))
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    pub fn object_type(&self, code: u32) -> Option<ObjectType<'_>> {
        let qualified = self.objtypes.get(&code)?;
        Some(ObjectType {
            code,
            qualified,
            label: self.objnames.get(&code).map(ObjName::label),
        })
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            documents: self.docnames.len(),
            terms: self.terms.len(),
            title_terms: self.titleterms.len(),
            namespaces: self.objects.len(),
            objects: self.objects.values().map(Vec::len).sum(),
            object_types: self.objtypes.len(),
        }
    }
}

/// Joins a namespace and member name the way the documentation renders it.
pub fn full_object_name(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}.{name}")
    }
}

/// Accepts both the list form (`[doc, type, prio, anchor, name]`) and the
/// older map form (`{"name": [doc, type, prio, anchor]}`).
#[derive(Deserialize)]
#[serde(untagged)]
enum RawMembers {
    List(Vec<(usize, u32, i32, String, String)>),
    Map(BTreeMap<String, (usize, u32, i32, String)>),
}

fn deserialize_objects<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<ObjectEntry>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, RawMembers>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(namespace, members)| {
            let entries = match members {
                RawMembers::List(list) => list
                    .into_iter()
                    .map(|(doc, objtype, priority, anchor, name)| ObjectEntry {
                        name,
                        doc,
                        objtype,
                        priority,
                        anchor,
                    })
                    .collect(),
                RawMembers::Map(map) => map
                    .into_iter()
                    .map(|(name, (doc, objtype, priority, anchor))| ObjectEntry {
                        name,
                        doc,
                        objtype,
                        priority,
                        anchor,
                    })
                    .collect(),
            };
            (namespace, entries)
        })
        .collect())
}

fn serialize_objects<S>(
    objects: &BTreeMap<String, Vec<ObjectEntry>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let raw: BTreeMap<&str, Vec<(usize, u32, i32, &str, &str)>> = objects
        .iter()
        .map(|(namespace, entries)| {
            let list = entries
                .iter()
                .map(|e| (e.doc, e.objtype, e.priority, e.anchor.as_str(), e.name.as_str()))
                .collect();
            (namespace.as_str(), list)
        })
        .collect();
    raw.serialize(serializer)
}
