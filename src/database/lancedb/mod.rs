// LanceDB vector database module
// Handles vector storage and similarity search for embedded record chunks

pub mod vector_store;

use serde::{Deserialize, Serialize};

/// Embedding record stored in LanceDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Synthetic chunk key, `doc_{record_index}_chunk_{chunk_index}`
    pub id: String,
    /// The vector embedding
    pub vector: Vec<f32>,
    /// Metadata about the chunk this embedding represents
    pub metadata: ChunkMetadata,
}

/// Metadata stored alongside each embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Name of the source database table
    pub source_table: String,
    /// Position of the source record in the fetched sequence
    pub record_index: u32,
    /// Position of this chunk within its source record
    pub chunk_index: u32,
    /// The chunk text
    pub content: String,
    /// Timestamp when this embedding was created
    pub created_at: String,
}
