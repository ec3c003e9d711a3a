//! Corpus loading: walks the generated-documentation tree and produces the
//! chunk records consumed by the vector index.
//!
//! The corpus is a directory of markdown files generated from a codebase,
//! named `<OriginalName>_<ext>.md` (e.g. `Subscription_php.md` describes
//! `Subscription.php`). The original extension drives category assignment.

pub mod split;

use anyhow::Result;
use std::path::Path;
use walkdir::WalkDir;

use crate::models::{Category, Chunk};

/// Maximum characters per chunk.
pub const MAX_CHUNK_CHARS: usize = 2_000;
/// Characters carried over from the previous chunk of the same document, so
/// context survives chunk boundaries.
pub const CHUNK_OVERLAP: usize = 200;

/// Metadata derived from a documentation file's name and location.
#[derive(Debug, Clone)]
struct FileMeta {
    file_name: String,
    source_path: String,
    category: Category,
}

/// Load every markdown file under `docs_dir` and split into chunks.
///
/// Chunk ids are assigned by position in the returned vector; callers must
/// treat the whole vector as one index build (ids are not stable across
/// loads if the corpus changes).
pub fn load_corpus(docs_dir: &Path) -> Result<Vec<Chunk>> {
    if !docs_dir.exists() {
        anyhow::bail!("documentation path not found: {}", docs_dir.display());
    }

    let mut chunks = Vec::new();
    let mut files_processed = 0usize;
    let mut errors = 0usize;

    for entry in WalkDir::new(docs_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().map(|e| e != "md").unwrap_or(true) {
            continue;
        }

        let meta = parse_file_meta(path, docs_dir);

        let content = match std::fs::read_to_string(path) {
            Ok(c) => clean_content(&c),
            Err(e) => {
                tracing::warn!("Skipping unreadable file {}: {e}", path.display());
                errors += 1;
                continue;
            }
        };
        if content.is_empty() {
            tracing::debug!("Empty file: {}", path.display());
            continue;
        }

        for (chunk_index, text) in split::split_document(&content, MAX_CHUNK_CHARS, CHUNK_OVERLAP)
            .into_iter()
            .enumerate()
        {
            chunks.push(Chunk {
                id: chunks.len(),
                text,
                source_path: meta.source_path.clone(),
                file_name: meta.file_name.clone(),
                category: meta.category,
                chunk_index,
            });
        }
        files_processed += 1;
    }

    tracing::info!(
        "Loaded {} chunks from {} files ({} errors)",
        chunks.len(),
        files_processed,
        errors
    );

    if chunks.is_empty() {
        anyhow::bail!(
            "no documentation chunks found under {}",
            docs_dir.display()
        );
    }
    Ok(chunks)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_string_lossy()
            .starts_with('.')
}

fn parse_file_meta(path: &Path, docs_dir: &Path) -> FileMeta {
    let relative = path
        .strip_prefix(docs_dir)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let original_ext = extract_original_extension(&stem);
    let mut category = Category::from_extension(&original_ext);
    if category == Category::Other {
        category = category_from_name_patterns(&stem);
    }

    FileMeta {
        file_name: stem.replace('_', "."),
        source_path: relative,
        category,
    }
}

/// Recover the described file's extension from the generated filename stem,
/// e.g. `Subscription_php` -> `.php`. Stems without a plausible extension
/// marker map to `.unknown`.
fn extract_original_extension(stem: &str) -> String {
    if let Some((_, ext)) = stem.rsplit_once('_') {
        if !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return format!(".{}", ext.to_lowercase());
        }
    }
    ".unknown".to_string()
}

/// Fallback categorization for files whose extension gave no signal, based
/// on naming conventions in the generated corpus.
fn category_from_name_patterns(stem: &str) -> Category {
    let lower = stem.to_lowercase();

    const BACKEND_PATTERNS: &[&str] = &[
        "config_", "entity_", "repository_", "controller_", "service_", "command_", "handler_",
        "listener_", "doctrine", "messenger",
    ];
    const FRONTEND_PATTERNS: &[&str] = &[
        "component_",
        "composable_",
        "store_",
        "plugin_",
        "middleware_",
        "layout_",
        "page_",
        "storybook",
    ];

    if BACKEND_PATTERNS.iter().any(|p| lower.contains(p)) {
        Category::Backend
    } else if FRONTEND_PATTERNS.iter().any(|p| lower.contains(p)) {
        Category::Frontend
    } else {
        Category::Other
    }
}

/// Normalize line endings and collapse runaway blank-line runs.
fn clean_content(content: &str) -> String {
    let normalized = content.replace("\r\n", "\n");

    let mut out = String::with_capacity(normalized.len());
    let mut newline_run = 0usize;
    for c in normalized.chars() {
        if c == '\n' {
            newline_run += 1;
            if newline_run > 3 {
                continue;
            }
        } else {
            newline_run = 0;
        }
        out.push(c);
    }
    out.trim().to_string()
}
