#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

/// A fixed-size window of a record's text, the unit of embedding and retrieval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// The chunk text
    pub content: String,
    /// Position of this chunk within its source record
    pub chunk_index: usize,
}

/// Configuration for fixed-window chunking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window length in characters
    pub window: usize,
    /// Overlap in characters between adjacent windows
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            window: 500,
            overlap: 100,
        }
    }
}

/// Split text into fixed-size overlapping windows.
///
/// The first chunk starts at offset 0 and each subsequent chunk starts exactly
/// `window - overlap` characters after the previous one, so adjacent chunks
/// share `overlap` characters. The final chunk may be shorter than the window.
/// Offsets are measured in characters, never bytes, so multi-byte text cannot
/// be split mid-scalar.
#[inline]
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<TextChunk> {
    let chars: Vec<char> = text.chars().collect();
    // overlap < window is enforced by config validation; keep the step
    // positive for any input so the loop always terminates
    let step = config.window.saturating_sub(config.overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + config.window).min(chars.len());
        chunks.push(TextChunk {
            content: chars[start..end].iter().collect(),
            chunk_index: chunks.len(),
        });
        start += step;
    }

    chunks
}

/// Synthetic key for a chunk, composed of the source record's position and
/// the chunk's position within that record
#[inline]
pub fn chunk_id(record_index: usize, chunk_index: usize) -> String {
    format!("doc_{}_chunk_{}", record_index, chunk_index)
}
