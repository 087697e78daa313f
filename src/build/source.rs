//! Reading documentation sources from disk.
//!
//! Supports reStructuredText, Markdown and plain-text pages. reStructuredText
//! object directives (`.. py:class:: Name`) are turned into catalogued objects.

use super::builder::{DocumentSpec, IndexBuilder, ObjectSpec};
use crate::error::Result;
use crate::index::SearchIndex;
use anyhow::Context;
use ignore::WalkBuilder;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const SOURCE_EXTENSIONS: &[&str] = &["rst", "txt", "md"];

/// Characters docutils accepts as section adornment.
const ADORNMENT_CHARS: &str = "=-~^\"'`#*+_:.";

static OBJECT_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)\.\.\s+([a-z]+):([a-z]+)::\s*(.+?)\s*$").expect("valid directive regex")
});

static MODULE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\.\.\s+(?:py:)?(module|currentmodule)::\s*(\S+)\s*$")
        .expect("valid module regex")
});

/// A parsed source page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePage {
    pub document: DocumentSpec,
    pub objects: Vec<ObjectSpec>,
}

/// Collects every documentation source below `root`, sorted by path.
///
/// The walk honours `.gitignore`-style ignore files.
pub fn collect_sources(root: &Path) -> Result<Vec<SourcePage>> {
    let mut paths: Vec<PathBuf> = WalkBuilder::new(root)
        .build()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_some_and(|t| t.is_file()))
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
        })
        .collect();
    paths.sort();

    let mut pages = Vec::with_capacity(paths.len());
    for path in paths {
        let relative = path
            .strip_prefix(root)
            .with_context(|| format!("{} is outside {}", path.display(), root.display()))?;
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        pages.push(parse_source(relative, &text));
    }

    tracing::debug!("Collected {} source pages under {}", pages.len(), root.display());
    Ok(pages)
}

/// Walks `root` and builds an index from every page found.
pub async fn build_index_from_dir(root: &Path) -> Result<SearchIndex> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let pages = collect_sources(&root)?;
        if pages.is_empty() {
            anyhow::bail!("No documentation sources found under {}", root.display());
        }
        let mut builder = IndexBuilder::new();
        for page in pages {
            builder.add_document(page.document);
            for object in page.objects {
                builder.add_object(object);
            }
        }
        Ok(builder.finish())
    })
    .await
    .context("Index build task panicked")?
}

/// Parses one page. `relative` is the path below the source root.
pub fn parse_source(relative: &Path, text: &str) -> SourcePage {
    let filename = relative.to_string_lossy().replace('\\', "/");
    let docname = match filename.rsplit_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => filename.clone(),
    };
    let extension = relative.extension().and_then(|e| e.to_str()).unwrap_or("");

    let (headings, body, objects) = match extension {
        "rst" => parse_rst(text, &docname),
        "md" => parse_markdown(text),
        _ => parse_plain(text),
    };

    let mut headings = headings.into_iter();
    let title = headings.next().unwrap_or_else(|| docname.clone());

    SourcePage {
        document: DocumentSpec {
            docname,
            filename,
            title,
            sections: headings.collect(),
            body,
        },
        objects,
    }
}

fn is_adornment(line: &str) -> bool {
    let trimmed = line.trim_end();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) if ADORNMENT_CHARS.contains(first) => {
            trimmed.chars().count() >= 2 && chars.all(|c| c == first)
        }
        _ => false,
    }
}

fn parse_rst(text: &str, docname: &str) -> (Vec<String>, String, Vec<ObjectSpec>) {
    let lines: Vec<&str> = text.lines().collect();
    let mut headings = vec![];
    let mut body = String::new();
    let mut objects = vec![];
    let mut module = String::new();
    // (indent, full name) of enclosing class directives
    let mut scopes: Vec<(usize, String)> = vec![];

    for (i, line) in lines.iter().enumerate() {
        if is_adornment(line) {
            continue;
        }

        let next_is_underline = lines.get(i + 1).is_some_and(|next| {
            is_adornment(next) && next.trim_end().chars().count() >= line.trim().chars().count()
        });
        if !line.trim().is_empty() && !line.starts_with(' ') && next_is_underline {
            headings.push(line.trim().to_string());
            continue;
        }

        if let Some(caps) = MODULE_DIRECTIVE.captures(line) {
            module = caps[2].to_string();
            scopes.clear();
            continue;
        }

        if let Some(caps) = OBJECT_DIRECTIVE.captures(line) {
            let indent = caps[1].chars().count();
            let domain = &caps[2];
            let role = &caps[3];
            let signature = &caps[4];

            while scopes.last().is_some_and(|(depth, _)| *depth >= indent) {
                scopes.pop();
            }

            let target = signature
                .split(|c: char| c == '(' || c.is_whitespace())
                .next()
                .unwrap_or(signature);
            let (prefix, name) = match target.rsplit_once('.') {
                Some((prefix, name)) => (Some(prefix), name),
                None => (None, target),
            };
            if name.is_empty() {
                continue;
            }

            let namespace = match (scopes.last(), prefix) {
                (Some((_, class)), _) => class.clone(),
                (None, Some(prefix)) if module.is_empty() || prefix.starts_with(&module) => {
                    prefix.to_string()
                }
                (None, Some(prefix)) => format!("{module}.{prefix}"),
                (None, None) => module.clone(),
            };

            if matches!(role, "class" | "exception") {
                let fullname = crate::index::full_object_name(&namespace, name);
                scopes.push((indent, fullname));
            }

            objects.push(ObjectSpec {
                namespace,
                name: name.to_string(),
                role: format!("{domain}:{role}"),
                label: None,
                priority: 1,
                anchor: String::new(),
                docname: docname.to_string(),
            });

            body.push_str(signature);
            body.push('\n');
            continue;
        }

        body.push_str(line);
        body.push('\n');
    }

    (headings, body, objects)
}

fn parse_markdown(text: &str) -> (Vec<String>, String, Vec<ObjectSpec>) {
    let mut headings = vec![];
    let mut body = String::new();
    for line in text.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix('#') {
            let heading = rest.trim_start_matches('#').trim();
            if !heading.is_empty() {
                headings.push(heading.to_string());
                continue;
            }
        }
        body.push_str(line);
        body.push('\n');
    }
    (headings, body, vec![])
}

fn parse_plain(text: &str) -> (Vec<String>, String, Vec<ObjectSpec>) {
    let mut lines = text.lines().skip_while(|l| l.trim().is_empty());
    let headings = lines.next().map(|l| vec![l.trim().to_string()]).unwrap_or_default();
    let body = lines.collect::<Vec<_>>().join("\n");
    (headings, body, vec![])
}
