//! Local document loading
//!
//! Reads files from disk into [`Document`]s. HTML is reduced to readable
//! text, PDFs go through `pdf-extract`, everything else is read as UTF-8.

use crate::error::{Result, SleuthError};
use crate::scrape::html_to_text;
use glob::Pattern;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Directories to exclude from scanning
const EXCLUDE_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    ".cache",
    "vendor",
    "dist",
    "build",
    "__pycache__",
    ".venv",
    "target",
];

/// A unit of research material
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub content: String,
    /// Where the content came from (URL or file path)
    pub source: Option<String>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Load a single file
pub fn load_file(path: &Path) -> Result<Document> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let content = match extension.as_deref() {
        Some("html") | Some("htm") => html_to_text(&read_text(path)?),
        Some("pdf") => {
            let bytes = std::fs::read(path)?;
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
                SleuthError::Parse(format!("Failed to extract text from PDF {:?}: {}", path, e))
            })?
        }
        _ => read_text(path)?,
    };

    if content.trim().is_empty() {
        return Err(SleuthError::Parse(format!(
            "{:?} contains no extractable text",
            path
        )));
    }

    Ok(Document::new(content).with_source(path.display().to_string()))
}

/// Load every file under `root` whose relative path matches `pattern`
///
/// Hidden entries and common build/vendor directories are skipped. Files with
/// no extractable text are logged and left out.
pub fn load_dir(root: &Path, pattern: &str) -> Result<Vec<Document>> {
    let pattern = Pattern::new(pattern)?;
    let mut documents = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !should_skip(e));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path
            .strip_prefix(root)
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|_| path.to_string_lossy().to_string());

        if !pattern.matches(&relative) {
            continue;
        }

        match load_file(path) {
            Ok(doc) => documents.push(doc),
            Err(SleuthError::Parse(msg)) => tracing::warn!("Skipping {}: {}", relative, msg),
            Err(e) => return Err(e),
        }
    }

    tracing::info!("Loaded {} documents from {}", documents.len(), root.display());
    Ok(documents)
}

/// Read a UTF-8 file; binary content is a parse failure, not an I/O one
fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::InvalidData => {
            SleuthError::Parse(format!("{:?} is not UTF-8 text", path))
        }
        _ => SleuthError::Io(e),
    })
}

fn should_skip(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return true;
    }
    entry.file_type().is_dir() && EXCLUDE_DIRS.iter().any(|d| name == *d)
}
