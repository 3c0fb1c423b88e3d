
use super::{ChunkMetadata, EmbeddingRecord};
use crate::DbChatError;
use crate::config::Config;
use arrow::array::{
    Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection, Table,
    query::{ExecutableQuery, QueryBase},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Persistent vector index over record chunks, backed by a LanceDB directory.
///
/// The table is created lazily on the first insert, once the embedding
/// dimension is known. Deleting the directory fully resets retrieval state.
pub struct VectorStore {
    connection: Connection,
    table_name: String,
}

/// Search result from vector similarity search, nearest first
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub metadata: ChunkMetadata,
    pub distance: f32,
}

impl VectorStore {
    #[inline]
    pub async fn new(config: &Config) -> Result<Self, DbChatError> {
        let db_path = config.vector_database_path();
        debug!("Initializing LanceDB at path: {:?}", db_path);

        std::fs::create_dir_all(&db_path).map_err(|e| {
            DbChatError::Database(format!("Failed to create vector database directory: {}", e))
        })?;

        let uri = format!("file://{}", db_path.display());
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| DbChatError::Database(format!("Failed to connect to LanceDB: {}", e)))?;

        info!("Vector store initialized at {:?}", db_path);
        Ok(Self {
            connection,
            table_name: config.index.collection.clone(),
        })
    }

    /// Store a batch of embeddings, creating the table on first use.
    ///
    /// All vectors in one batch must share one dimension; a dimension change
    /// relative to an existing table (a different embedding model) drops and
    /// recreates the table.
    #[inline]
    pub async fn store_embeddings_batch(
        &mut self,
        records: Vec<EmbeddingRecord>,
    ) -> Result<(), DbChatError> {
        if records.is_empty() {
            debug!("No embeddings to store");
            return Ok(());
        }

        let vector_dim = records[0].vector.len();
        if let Some(record) = records.iter().find(|r| r.vector.len() != vector_dim) {
            return Err(DbChatError::Embedding(format!(
                "Inconsistent embedding dimensions in batch: {} vs {}",
                vector_dim,
                record.vector.len()
            )));
        }

        debug!("Storing batch of {} embeddings", records.len());

        let table = self.ensure_table(vector_dim).await?;
        let record_batch = create_record_batch(&records, vector_dim)?;
        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);

        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| DbChatError::Database(format!("Failed to insert embeddings: {}", e)))?;

        info!("Successfully stored {} embeddings", records.len());
        Ok(())
    }

    /// Nearest-neighbor search over stored vectors.
    ///
    /// Returns an empty result when nothing has been indexed yet.
    #[inline]
    pub async fn search_similar(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>, DbChatError> {
        debug!("Searching for similar vectors with limit: {}", limit);

        let Some(table) = self.open_table_if_exists().await? else {
            debug!("Vector table does not exist yet, returning no results");
            return Ok(Vec::new());
        };

        let results = table
            .vector_search(query_vector)
            .map_err(|e| DbChatError::Database(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .limit(limit)
            .execute()
            .await
            .map_err(|e| DbChatError::Database(format!("Failed to execute search: {}", e)))?;

        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .map_err(|e| DbChatError::Database(format!("Failed to read result stream: {}", e)))?;

        let mut search_results = Vec::new();
        for batch in &batches {
            search_results.extend(parse_search_batch(batch)?);
        }

        debug!("Parsed {} search results", search_results.len());
        Ok(search_results)
    }

    /// Total number of stored embeddings; zero when the table does not exist
    #[inline]
    pub async fn count_embeddings(&self) -> Result<u64, DbChatError> {
        let Some(table) = self.open_table_if_exists().await? else {
            return Ok(0);
        };

        let count = table
            .count_rows(None)
            .await
            .map_err(|e| DbChatError::Database(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }

    /// Drop all stored embeddings so the next refresh rebuilds from scratch
    #[inline]
    pub async fn clear(&mut self) -> Result<(), DbChatError> {
        if !self.table_exists().await? {
            return Ok(());
        }

        info!("Dropping vector table '{}'", self.table_name);
        self.connection
            .drop_table(&self.table_name)
            .await
            .map_err(|e| DbChatError::Database(format!("Failed to drop table: {}", e)))?;

        Ok(())
    }

    async fn table_exists(&self) -> Result<bool, DbChatError> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| DbChatError::Database(format!("Failed to list tables: {}", e)))?;

        Ok(table_names.contains(&self.table_name))
    }

    async fn open_table_if_exists(&self) -> Result<Option<Table>, DbChatError> {
        if !self.table_exists().await? {
            return Ok(None);
        }

        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| DbChatError::Database(format!("Failed to open table: {}", e)))?;

        Ok(Some(table))
    }

    /// Open the table, creating or recreating it for the given dimension
    async fn ensure_table(&self, vector_dim: usize) -> Result<Table, DbChatError> {
        if let Some(table) = self.open_table_if_exists().await? {
            let existing_dim = existing_vector_dimension(&table).await?;
            if existing_dim == vector_dim {
                return Ok(table);
            }

            warn!(
                "Vector dimension changed from {} to {}, recreating table",
                existing_dim, vector_dim
            );
            self.connection
                .drop_table(&self.table_name)
                .await
                .map_err(|e| DbChatError::Database(format!("Failed to drop table: {}", e)))?;
        }

        info!(
            "Creating vector table '{}' with {} dimensions",
            self.table_name, vector_dim
        );

        let schema = create_schema(vector_dim);
        self.connection
            .create_empty_table(&self.table_name, schema)
            .execute()
            .await
            .map_err(|e| DbChatError::Database(format!("Failed to create table: {}", e)))
    }
}

/// Read the vector dimension from an existing table's schema
async fn existing_vector_dimension(table: &Table) -> Result<usize, DbChatError> {
    let schema = table
        .schema()
        .await
        .map_err(|e| DbChatError::Database(format!("Failed to get table schema: {}", e)))?;

    for field in schema.fields() {
        if field.name() == "vector" {
            if let DataType::FixedSizeList(_, size) = field.data_type() {
                return Ok(*size as usize);
            }
        }
    }

    Err(DbChatError::Database(
        "Could not find vector column or determine dimension".to_string(),
    ))
}

fn create_schema(vector_dim: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, false)),
                vector_dim as i32,
            ),
            false,
        ),
        Field::new("content", DataType::Utf8, false),
        Field::new("source_table", DataType::Utf8, false),
        Field::new("record_index", DataType::UInt32, false),
        Field::new("chunk_index", DataType::UInt32, false),
        Field::new("created_at", DataType::Utf8, false),
    ]))
}

fn create_record_batch(
    records: &[EmbeddingRecord],
    vector_dim: usize,
) -> Result<RecordBatch, DbChatError> {
    let len = records.len();

    let mut ids = Vec::with_capacity(len);
    let mut contents = Vec::with_capacity(len);
    let mut source_tables = Vec::with_capacity(len);
    let mut record_indices = Vec::with_capacity(len);
    let mut chunk_indices = Vec::with_capacity(len);
    let mut created_ats = Vec::with_capacity(len);
    let mut flat_values = Vec::with_capacity(len * vector_dim);

    for record in records {
        ids.push(record.id.as_str());
        contents.push(record.metadata.content.as_str());
        source_tables.push(record.metadata.source_table.as_str());
        record_indices.push(record.metadata.record_index);
        chunk_indices.push(record.metadata.chunk_index);
        created_ats.push(record.metadata.created_at.as_str());
        flat_values.extend_from_slice(&record.vector);
    }

    let values_array = Float32Array::from(flat_values);
    let item_field = Arc::new(Field::new("item", DataType::Float32, false));
    let vector_array =
        FixedSizeListArray::try_new(item_field, vector_dim as i32, Arc::new(values_array), None)
            .map_err(|e| DbChatError::Database(format!("Failed to create vector array: {}", e)))?;

    let arrays: Vec<Arc<dyn Array>> = vec![
        Arc::new(StringArray::from(ids)),
        Arc::new(vector_array),
        Arc::new(StringArray::from(contents)),
        Arc::new(StringArray::from(source_tables)),
        Arc::new(UInt32Array::from(record_indices)),
        Arc::new(UInt32Array::from(chunk_indices)),
        Arc::new(StringArray::from(created_ats)),
    ];

    RecordBatch::try_new(create_schema(vector_dim), arrays)
        .map_err(|e| DbChatError::Database(format!("Failed to create record batch: {}", e)))
}

fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<SearchResult>, DbChatError> {
    fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, DbChatError> {
        batch
            .column_by_name(name)
            .ok_or_else(|| DbChatError::Database(format!("Missing {} column", name)))?
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| DbChatError::Database(format!("Invalid {} column type", name)))
    }

    fn u32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt32Array, DbChatError> {
        batch
            .column_by_name(name)
            .ok_or_else(|| DbChatError::Database(format!("Missing {} column", name)))?
            .as_any()
            .downcast_ref::<UInt32Array>()
            .ok_or_else(|| DbChatError::Database(format!("Invalid {} column type", name)))
    }

    let contents = string_column(batch, "content")?;
    let source_tables = string_column(batch, "source_table")?;
    let created_ats = string_column(batch, "created_at")?;
    let record_indices = u32_column(batch, "record_index")?;
    let chunk_indices = u32_column(batch, "chunk_index")?;

    let distances = batch
        .column_by_name("_distance")
        .map(|col| col.as_any().downcast_ref::<Float32Array>());

    let mut search_results = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let metadata = ChunkMetadata {
            source_table: source_tables.value(row).to_string(),
            record_index: record_indices.value(row),
            chunk_index: chunk_indices.value(row),
            content: contents.value(row).to_string(),
            created_at: created_ats.value(row).to_string(),
        };

        let distance = distances
            .flatten()
            .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

        search_results.push(SearchResult { metadata, distance });
    }

    Ok(search_results)
}
