
use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::database::lancedb::{ChunkMetadata, EmbeddingRecord};
use crate::database::{Record, VectorStore};
use crate::embeddings::chunking::{ChunkingConfig, chunk_id, chunk_text};
use crate::embeddings::ollama::OllamaClient;

/// Number of chunks returned per query unless the caller asks otherwise
pub const DEFAULT_TOP_K: usize = 3;

/// Walks fetched records through chunking and embedding into the vector
/// store, and answers queries with the nearest stored chunk texts.
pub struct Retriever {
    ollama: OllamaClient,
    store: VectorStore,
    chunking: ChunkingConfig,
}

impl Retriever {
    #[inline]
    pub fn new(ollama: OllamaClient, store: VectorStore, chunking: ChunkingConfig) -> Self {
        Self {
            ollama,
            store,
            chunking,
        }
    }

    /// Chunk, embed, and store the given records additively.
    ///
    /// Returns the number of chunks written. Chunk keys restart at
    /// `doc_0_chunk_0` on every call, so callers refreshing the index should
    /// use [`rebuild`](Self::rebuild) instead of stacking calls.
    #[inline]
    pub async fn add_records(&mut self, records: &[Record]) -> Result<usize> {
        let mut texts = Vec::new();
        let mut keys = Vec::new();

        for (record_index, record) in records.iter().enumerate() {
            for chunk in chunk_text(&record.text, &self.chunking) {
                keys.push((record_index, chunk.chunk_index, record.table.clone()));
                texts.push(chunk.content);
            }
        }

        if texts.is_empty() {
            debug!("No chunks produced from {} records", records.len());
            return Ok(0);
        }

        debug!(
            "Embedding {} chunks from {} records",
            texts.len(),
            records.len()
        );

        let client = self.ollama.clone();
        let chunk_texts = texts.clone();
        let embeddings =
            tokio::task::spawn_blocking(move || client.generate_embeddings_batch(&chunk_texts))
                .await
                .context("Embedding task failed")?
                .context("Failed to embed record chunks")?;

        let created_at = Utc::now().to_rfc3339();
        let embedding_records = keys
            .into_iter()
            .zip(texts)
            .zip(embeddings)
            .map(
                |(((record_index, chunk_index, source_table), content), vector)| EmbeddingRecord {
                    id: chunk_id(record_index, chunk_index),
                    vector,
                    metadata: ChunkMetadata {
                        source_table,
                        record_index: record_index as u32,
                        chunk_index: chunk_index as u32,
                        content,
                        created_at: created_at.clone(),
                    },
                },
            )
            .collect::<Vec<_>>();

        let chunk_count = embedding_records.len();
        self.store
            .store_embeddings_batch(embedding_records)
            .await
            .context("Failed to store embeddings")?;

        info!("Indexed {} chunks from {} records", chunk_count, records.len());
        Ok(chunk_count)
    }

    /// Wipe the index and re-add every record, so the stored chunks always
    /// mirror the latest successful fetch. Repeated rebuilds over unchanged
    /// data leave the chunk count unchanged.
    #[inline]
    pub async fn rebuild(&mut self, records: &[Record]) -> Result<usize> {
        self.store.clear().await.context("Failed to clear index")?;
        self.add_records(records).await
    }

    /// Return the top-k most similar chunk texts, best first.
    ///
    /// Degrades to an empty result on embedding or search failure, and when
    /// nothing has been indexed yet.
    #[inline]
    pub async fn query(&self, text: &str, k: usize) -> Vec<String> {
        let client = self.ollama.clone();
        let query_text = text.to_string();
        let embedding = match tokio::task::spawn_blocking(move || {
            client.generate_embedding(&query_text)
        })
        .await
        {
            Ok(Ok(embedding)) => embedding,
            Ok(Err(e)) => {
                warn!("Failed to embed query: {e:#}");
                return Vec::new();
            }
            Err(e) => {
                warn!("Embedding task failed: {e}");
                return Vec::new();
            }
        };

        match self.store.search_similar(&embedding, k).await {
            Ok(results) => results
                .into_iter()
                .map(|result| result.metadata.content)
                .collect(),
            Err(e) => {
                warn!("Vector search failed: {e:#}");
                Vec::new()
            }
        }
    }

    /// Number of chunks currently stored in the index
    #[inline]
    pub async fn indexed_chunks(&self) -> Result<u64> {
        self.store
            .count_embeddings()
            .await
            .context("Failed to count indexed chunks")
    }
}
