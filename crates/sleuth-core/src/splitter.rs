//! Recursive character splitting for embedding
//!
//! Text is split on the coarsest separator that occurs in it (paragraphs,
//! then lines, then words, then characters). Pieces that still exceed the
//! chunk size are split again with the finer separators, and small pieces are
//! merged back together so that neighbouring chunks share up to
//! `chunk_overlap` characters. All lengths are measured in characters.

use crate::error::{Result, SleuthError};
use crate::loader::Document;
use std::collections::VecDeque;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Document chunk
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    /// Source of the document the chunk was cut from
    pub source: Option<String>,
    /// Index of the chunk within its document
    pub position: usize,
}

/// Splitter that recurses through a list of separators
#[derive(Debug, Clone)]
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl Default for RecursiveCharacterSplitter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl RecursiveCharacterSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(SleuthError::InvalidInput(
                "chunk size must be positive".to_string(),
            ));
        }
        if chunk_overlap > chunk_size {
            return Err(SleuthError::InvalidInput(format!(
                "Got a larger chunk overlap ({}) than chunk size ({}), should be smaller.",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            ..Self::default()
        })
    }

    /// Split a single text into chunks
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    /// Split documents, keeping each chunk's source
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.content)
                    .into_iter()
                    .enumerate()
                    .map(|(position, text)| Chunk {
                        text,
                        source: doc.source.clone(),
                        position,
                    })
            })
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut finer: &[String] = &[];

        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = candidate.as_str();
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate.as_str();
                finer = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut pending: Vec<String> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge_splits(&pending, ""));
                pending.clear();
            }
            if finer.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_recursive(&piece, finer));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge_splits(&pending, ""));
        }
        chunks
    }

    /// Greedily combine pieces into chunks of at most `chunk_size`,
    /// carrying up to `chunk_overlap` trailing characters into the next chunk.
    fn merge_splits(&self, splits: &[String], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        let joiner_len = |current: &VecDeque<&str>| {
            if current.is_empty() {
                0
            } else {
                separator_len
            }
        };

        for split in splits {
            let len = char_len(split);

            if total + len + joiner_len(&current) > self.chunk_size {
                if total > self.chunk_size {
                    tracing::warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total,
                        self.chunk_size
                    );
                }
                if !current.is_empty() {
                    if let Some(doc) = join_docs(&current, separator) {
                        docs.push(doc);
                    }
                    while total > self.chunk_overlap
                        || (total + len + joiner_len(&current) > self.chunk_size && total > 0)
                    {
                        let Some(first) = current.pop_front() else {
                            break;
                        };
                        total = total.saturating_sub(char_len(first) + joiner_len(&current));
                    }
                }
            }

            current.push_back(split.as_str());
            total += len + if current.len() > 1 { separator_len } else { 0 };
        }

        if let Some(doc) = join_docs(&current, separator) {
            docs.push(doc);
        }
        docs
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split on `separator`, attaching it to the start of each following piece.
/// The empty separator splits into characters. Empty pieces are dropped.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut parts = text.split(separator);
    let mut pieces = Vec::new();
    if let Some(first) = parts.next() {
        pieces.push(first.to_string());
    }
    pieces.extend(parts.map(|p| format!("{}{}", separator, p)));
    pieces.retain(|p| !p.is_empty());
    pieces
}

fn join_docs(docs: &VecDeque<&str>, separator: &str) -> Option<String> {
    let joined = docs.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_small_content_single_chunk() {
        let splitter = RecursiveCharacterSplitter::default();
        let chunks = splitter.split_text("Small content.");
        assert_eq!(chunks, vec!["Small content."]);
    }

    #[test]
    fn test_empty_content() {
        let splitter = RecursiveCharacterSplitter::default();
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text("  \n\n  ").is_empty());
    }

    #[test]
    fn test_recursive_split_with_overlap() {
        let text = "Hi.\n\nI'm Harrison.\n\nHow? Are? You?\nOkay then f f f f.\nThis is a weird text to write, but gotta test the splittingggg some how.\n\nBye!\n\n-H.";
        let splitter = RecursiveCharacterSplitter::new(10, 1).unwrap();
        let chunks = splitter.split_text(text);
        let expected = vec![
            "Hi.",
            "I'm",
            "Harrison.",
            "How? Are?",
            "You?",
            "Okay then",
            "f f f f.",
            "This is a",
            "weird",
            "text to",
            "write,",
            "but gotta",
            "test the",
            "splitting",
            "gggg",
            "some how.",
            "Bye!",
            "-H.",
        ];
        assert_eq!(chunks, expected);
    }

    #[test]
    fn test_overlap_carries_words() {
        let splitter = RecursiveCharacterSplitter::new(11, 6).unwrap();
        let chunks = splitter.split_text("one two three four five");
        assert_eq!(chunks, vec!["one two", "two three", "three four", "four five"]);
    }

    #[test]
    fn test_paragraphs_preferred() {
        let splitter = RecursiveCharacterSplitter::new(20, 0).unwrap();
        let chunks = splitter.split_text("First paragraph.\n\nSecond paragraph.");
        assert_eq!(chunks, vec!["First paragraph.", "Second paragraph."]);
    }

    #[test]
    fn test_unicode_counts_chars() {
        let splitter = RecursiveCharacterSplitter::new(4, 0).unwrap();
        let chunks = splitter.split_text("日本語テキスト");
        assert_eq!(chunks, vec!["日本語テ", "キスト"]);
    }

    #[test]
    fn test_rejects_overlap_larger_than_size() {
        assert!(RecursiveCharacterSplitter::new(100, 200).is_err());
        assert!(RecursiveCharacterSplitter::new(0, 0).is_err());
    }

    #[test]
    fn test_split_documents_keeps_source() {
        let splitter = RecursiveCharacterSplitter::new(10, 0).unwrap();
        let docs = vec![
            Document::new("alpha beta gamma").with_source("a.txt"),
            Document::new("delta"),
        ];
        let chunks = splitter.split_documents(&docs);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].source.as_deref(), Some("a.txt"));
        assert_eq!(chunks[1].position, 1);
        assert_eq!(chunks[2].text, "delta");
        assert_eq!(chunks[2].source, None);
        assert_eq!(chunks[2].position, 0);
    }

    #[test]
    fn test_split_keeping_separator() {
        assert_eq!(
            split_keeping_separator("a\n\nb\n\nc", "\n\n"),
            vec!["a", "\n\nb", "\n\nc"]
        );
        assert_eq!(split_keeping_separator("ab", ""), vec!["a", "b"]);
        assert_eq!(split_keeping_separator("\n\nx", "\n\n"), vec!["\n\nx"]);
    }

    proptest! {
        #[test]
        fn chunks_never_exceed_size(
            text in "[a-z \n]{0,400}",
            size in 2usize..60,
            overlap_pct in 0usize..100,
        ) {
            let overlap = size * overlap_pct / 100;
            let splitter = RecursiveCharacterSplitter::new(size, overlap).unwrap();
            for chunk in splitter.split_text(&text) {
                prop_assert!(chunk.chars().count() <= size);
                prop_assert!(!chunk.trim().is_empty());
            }
        }
    }
}
