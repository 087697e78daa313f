//! Structural checks for a loaded search index.

use super::model::{DocRefs, SearchIndex};
use std::collections::BTreeMap;
use std::fmt;

/// One broken invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A per-document array has a different length than `docnames`.
    MisalignedArray {
        field: &'static str,
        len: usize,
        expected: usize,
    },
    /// A document index points past the end of `docnames`.
    DocOutOfBounds {
        container: &'static str,
        key: String,
        doc: usize,
    },
    /// An object references a type code absent from `objtypes`.
    UnknownObjectType {
        namespace: String,
        name: String,
        code: u32,
    },
    /// A type code is listed in `objtypes` without a matching `objnames` entry.
    MissingObjectName { code: u32 },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MisalignedArray {
                field,
                len,
                expected,
            } => write!(
                f,
                "`{}` has {} entries but `docnames` has {}",
                field, len, expected
            ),
            Self::DocOutOfBounds {
                container,
                key,
                doc,
            } => write!(
                f,
                "`{}` entry '{}' references document {} which does not exist",
                container, key, doc
            ),
            Self::UnknownObjectType {
                namespace,
                name,
                code,
            } => write!(
                f,
                "object '{}.{}' uses type code {} missing from `objtypes`",
                namespace, name, code
            ),
            Self::MissingObjectName { code } => {
                write!(f, "type code {} has no `objnames` entry", code)
            }
        }
    }
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.violations.is_empty() {
            return write!(f, "index is valid");
        }
        writeln!(f, "{} violation(s):", self.violations.len())?;
        for violation in &self.violations {
            writeln!(f, "  - {}", violation)?;
        }
        Ok(())
    }
}

/// Checks every invariant of the index and collects all violations.
pub fn validate(index: &SearchIndex) -> ValidationReport {
    let mut violations = Vec::new();
    let doc_count = index.docnames.len();

    for (field, len) in [
        ("filenames", index.filenames.len()),
        ("titles", index.titles.len()),
    ] {
        if len != doc_count {
            violations.push(Violation::MisalignedArray {
                field,
                len,
                expected: doc_count,
            });
        }
    }

    check_postings("terms", &index.terms, doc_count, &mut violations);
    check_postings("titleterms", &index.titleterms, doc_count, &mut violations);

    for (title, locations) in &index.alltitles {
        for &(doc, _) in locations {
            if doc >= doc_count {
                violations.push(Violation::DocOutOfBounds {
                    container: "alltitles",
                    key: title.clone(),
                    doc,
                });
            }
        }
    }

    for (namespace, entry) in index.objects() {
        if entry.doc >= doc_count {
            violations.push(Violation::DocOutOfBounds {
                container: "objects",
                key: format!("{}.{}", namespace, entry.name),
                doc: entry.doc,
            });
        }
        if !index.objtypes.contains_key(&entry.objtype) {
            violations.push(Violation::UnknownObjectType {
                namespace: namespace.to_string(),
                name: entry.name.clone(),
                code: entry.objtype,
            });
        }
    }

    for code in index.objtypes.keys() {
        if !index.objnames.contains_key(code) {
            violations.push(Violation::MissingObjectName { code: *code });
        }
    }

    if !violations.is_empty() {
        tracing::debug!("Index validation found {} violation(s)", violations.len());
    }

    ValidationReport { violations }
}

fn check_postings(
    container: &'static str,
    postings: &BTreeMap<String, DocRefs>,
    doc_count: usize,
    violations: &mut Vec<Violation>,
) {
    for (term, refs) in postings {
        for &doc in refs.as_slice() {
            if doc >= doc_count {
                violations.push(Violation::DocOutOfBounds {
                    container,
                    key: term.clone(),
                    doc,
                });
            }
        }
    }
}
