// Embeddings module
// Handles Ollama integration and record chunking

pub mod chunking;
pub mod ollama;

pub use chunking::{ChunkingConfig, TextChunk, chunk_id, chunk_text};
pub use ollama::OllamaClient;
