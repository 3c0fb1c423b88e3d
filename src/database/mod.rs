// Database integrations: the source MySQL schema and the LanceDB vector index

pub mod lancedb;
pub mod mysql;

pub use lancedb::{ChunkMetadata, EmbeddingRecord, vector_store::VectorStore};
pub use mysql::{MySqlDatabase, Record};
