//! Splits a textual representation into chunks. Character offsets are
//! 0-indexed UTF-8 byte offsets into the original text, stable across
//! multi-byte content, per chunk-identity requirements downstream.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub start_index: usize,
    pub end_index: usize,
}

const DEFAULT_MAX_CHUNK_CHARS: usize = 1000;

/// Splits on blank-line paragraph boundaries, packing paragraphs into
/// chunks up to `max_chars`; a single paragraph longer than `max_chars` is
/// hard-split on a char boundary.
pub fn chunk_semantic(text: &str) -> Vec<Chunk> {
    chunk_semantic_with_max(text, DEFAULT_MAX_CHUNK_CHARS)
}

pub fn chunk_semantic_with_max(text: &str, max_chars: usize) -> Vec<Chunk> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut cursor = 0usize;

    while cursor < text.len() {
        let remaining = &text[cursor..];
        let take = if remaining.len() <= max_chars {
            remaining.len()
        } else {
            // Back off to the nearest preceding char boundary.
            let mut end = max_chars;
            while !remaining.is_char_boundary(end) {
                end -= 1;
            }
            // Prefer to break at the last blank-line boundary within the window.
            remaining[..end]
                .rfind("\n\n")
                .map(|p| p + 2)
                .filter(|&p| p > 0)
                .unwrap_or(end)
        };
        let piece = &remaining[..take];
        if !piece.trim().is_empty() {
            chunks.push(Chunk {
                text: piece.to_string(),
                start_index: cursor,
                end_index: cursor + take,
            });
        }
        cursor += take;
    }
    chunks
}

/// A pluggable AST-aware chunker for code files. Connectors or embedders
/// for specific languages provide the real tree-sitter-backed
/// implementation; this crate only defines the seam.
pub trait CodeChunker: Send + Sync {
    fn supports(&self, language: &str) -> bool;
    fn chunk(&self, text: &str) -> Vec<Chunk>;
}

/// Falls back to `chunk_semantic` with a smaller window (code reads denser
/// than prose). Returns `None` for a language the chunker doesn't
/// recognize — callers must count that entity `skipped`.
pub fn chunk_code(chunker: &dyn CodeChunker, language: Option<&str>, text: &str) -> Option<Vec<Chunk>> {
    let language = language?;
    if !chunker.supports(language) {
        return None;
    }
    Some(chunker.chunk(text))
}
