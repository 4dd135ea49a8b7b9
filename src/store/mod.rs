//! Persistent vector store with an in-memory search cache.
//!
//! Records are `(id, text, metadata, vector)` tuples persisted to a single
//! binary file. The full record set is cached in memory on first use and
//! every search runs a brute-force cosine scan over the cache. At the
//! target corpus size (~100K verses of 384-dim vectors, ~150MB) this is
//! well within memory and far faster than per-query file access.
//!
//! Durability: every mutation rewrites the file to a temp path and renames
//! it over the old one, so concurrent readers observe either the old or
//! the new store, never a partial write.

mod file;

use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// A persisted embedding record.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    /// Opaque record id, unique within the store
    pub id: String,
    /// The exact text that was embedded
    pub text: String,
    /// Optional metadata string (the verse key, when indexed from a corpus)
    pub metadata: Option<String>,
    /// The embedding vector; same length for every record in a store
    pub vector: Vec<f32>,
}

/// A single search hit from the store.
#[derive(Debug, Clone)]
pub struct SearchMatch {
    /// Record id
    pub id: String,
    /// The stored text (join key back to the source document)
    pub text: String,
    /// Cosine similarity against the query vector
    pub score: f32,
}

/// Errors raised by store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("Version mismatch: file version {0}, supported version {1}")]
    VersionMismatch(u8, u8),

    #[error("Model mismatch: file uses a different embedding model")]
    ModelMismatch,

    #[error("Checksum mismatch: file may be corrupted")]
    ChecksumMismatch,

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// File-backed vector store.
///
/// Thread-safe: searches take a read lock on the cache, mutations take a
/// write lock. The cache is immutable between mutations, so concurrent
/// queries never block each other.
pub struct VectorStore {
    path: PathBuf,
    model_id: [u8; 32],
    dimensions: usize,
    cache: RwLock<Option<Vec<StoredRecord>>>,
}

impl VectorStore {
    /// Create a new empty store file at `path`, replacing any existing file.
    pub fn create(
        path: impl Into<PathBuf>,
        model_id: [u8; 32],
        dimensions: usize,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        atomic_write(&path, &model_id, dimensions, &[])?;
        log::info!("Created empty vector store: {}", path.display());

        Ok(Self {
            path,
            model_id,
            dimensions,
            cache: RwLock::new(Some(Vec::new())),
        })
    }

    /// Open an existing store file, validating its header.
    ///
    /// Fails with a `StoreError` if the file is missing, corrupt, written
    /// by a different model, or has a different dimensionality. Records are
    /// not read until [`VectorStore::load_cache`] or the first search.
    pub fn open(
        path: impl Into<PathBuf>,
        model_id: [u8; 32],
        dimensions: usize,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        let header = file::read_header_from(&path)?;
        file::validate_header(&header, &model_id, dimensions)?;

        log::info!(
            "Opened vector store {} ({} records, {} dims)",
            path.display(),
            header.record_count,
            header.dimensions
        );

        Ok(Self {
            path,
            model_id,
            dimensions,
            cache: RwLock::new(None),
        })
    }

    /// The vector dimensionality this store was opened with.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Load every record into the in-memory cache.
    ///
    /// Idempotent: calling again after a successful load is a no-op.
    pub fn load_cache(&self) -> Result<usize, StoreError> {
        {
            let cache = self.read_cache()?;
            if let Some(records) = cache.as_ref() {
                return Ok(records.len());
            }
        }

        let mut cache = self.write_cache()?;
        // Another thread may have warmed the cache while we waited
        if let Some(records) = cache.as_ref() {
            return Ok(records.len());
        }

        let records = self.read_all_records()?;
        let count = records.len();
        log::info!("Loaded {} records into store cache", count);
        *cache = Some(records);
        Ok(count)
    }

    /// Insert or replace a record by id.
    ///
    /// The durable file is rewritten atomically and the cache updated, so
    /// cache and storage stay consistent.
    pub fn upsert(
        &self,
        id: &str,
        text: &str,
        metadata: Option<&str>,
        vector: Vec<f32>,
    ) -> Result<(), StoreError> {
        if vector.len() != self.dimensions {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimensions,
                got: vector.len(),
            });
        }

        self.load_cache()?;
        let mut cache = self.write_cache()?;
        let records = cache
            .as_mut()
            .ok_or_else(|| StoreError::Internal("cache vanished during upsert".to_string()))?;

        let record = StoredRecord {
            id: id.to_string(),
            text: text.to_string(),
            metadata: metadata.map(|m| m.to_string()),
            vector,
        };

        match records.iter_mut().find(|r| r.id == id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }

        atomic_write(&self.path, &self.model_id, self.dimensions, records)
    }

    /// Insert a batch of `(vector, text)` pairs with generated ids, as a
    /// single all-or-nothing unit.
    ///
    /// The batch is staged into a temp file and published with one rename;
    /// on any failure the store's prior state is untouched.
    pub fn bulk_upsert(
        &self,
        items: Vec<(Vec<f32>, String, Option<String>)>,
    ) -> Result<Vec<String>, StoreError> {
        for (vector, _, _) in &items {
            if vector.len() != self.dimensions {
                return Err(StoreError::DimensionMismatch {
                    expected: self.dimensions,
                    got: vector.len(),
                });
            }
        }

        self.load_cache()?;
        let mut cache = self.write_cache()?;
        let records = cache
            .as_mut()
            .ok_or_else(|| StoreError::Internal("cache vanished during bulk upsert".to_string()))?;

        let mut staged = records.clone();
        let mut next = staged.len() as u64;
        let mut ids = Vec::with_capacity(items.len());

        for (vector, text, metadata) in items {
            let id = format!("rec-{:08}", next);
            next += 1;
            ids.push(id.clone());
            staged.push(StoredRecord {
                id,
                text,
                metadata,
                vector,
            });
        }

        atomic_write(&self.path, &self.model_id, self.dimensions, &staged)?;
        *records = staged;
        log::debug!("Bulk upsert committed {} records", ids.len());

        Ok(ids)
    }

    /// Cosine-similarity search over the cached records.
    ///
    /// Warms the cache on first use. Results are filtered by
    /// `score >= min_score`, sorted descending by score (stable, so ties
    /// keep insertion order) and truncated to `max_results`.
    pub fn search(
        &self,
        query: &[f32],
        max_results: usize,
        min_score: f32,
    ) -> Result<Vec<SearchMatch>, StoreError> {
        if query.len() != self.dimensions {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimensions,
                got: query.len(),
            });
        }

        self.load_cache()?;
        let cache = self.read_cache()?;
        let records = cache
            .as_ref()
            .ok_or_else(|| StoreError::Internal("cache vanished during search".to_string()))?;

        let query_norm = l2_norm(query);

        let mut matches: Vec<SearchMatch> = records
            .iter()
            .filter_map(|record| {
                let score = cosine_similarity(query, &record.vector, query_norm);
                if score >= min_score {
                    Some(SearchMatch {
                        id: record.id.clone(),
                        text: record.text.clone(),
                        score,
                    })
                } else {
                    None
                }
            })
            .collect();

        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(max_results);

        Ok(matches)
    }

    /// Number of stored records: from the cache when warm, otherwise from
    /// the file header.
    pub fn count(&self) -> Result<usize, StoreError> {
        {
            let cache = self.read_cache()?;
            if let Some(records) = cache.as_ref() {
                return Ok(records.len());
            }
        }
        let header = file::read_header_from(&self.path)?;
        Ok(header.record_count as usize)
    }

    /// Whether the store holds at least one record.
    pub fn is_populated(&self) -> Result<bool, StoreError> {
        Ok(self.count()? > 0)
    }

    /// Read all records from durable storage, bypassing the cache.
    pub fn get_all(&self) -> Result<Vec<StoredRecord>, StoreError> {
        self.read_all_records()
    }

    /// Release the in-memory cache. The store remains usable; the next
    /// search re-warms from the file.
    pub fn close(&self) {
        if let Ok(mut cache) = self.cache.write() {
            *cache = None;
        }
        log::info!("Vector store closed: {}", self.path.display());
    }

    fn read_all_records(&self) -> Result<Vec<StoredRecord>, StoreError> {
        let file = std::fs::File::open(&self.path)?;
        let mut reader = std::io::BufReader::new(file);
        let header = file::read_header(&mut reader)?;
        file::validate_header(&header, &self.model_id, self.dimensions)?;
        file::read_records(&mut reader, &header)
    }

    fn read_cache(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, Option<Vec<StoredRecord>>>, StoreError> {
        self.cache
            .read()
            .map_err(|e| StoreError::Internal(format!("cache lock poisoned: {}", e)))
    }

    fn write_cache(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, Option<Vec<StoredRecord>>>, StoreError> {
        self.cache
            .write()
            .map_err(|e| StoreError::Internal(format!("cache lock poisoned: {}", e)))
    }
}

/// Write a full store file atomically: temp file, fsync, rename.
fn atomic_write(
    path: &Path,
    model_id: &[u8; 32],
    dimensions: usize,
    records: &[StoredRecord],
) -> Result<(), StoreError> {
    let temp_path = path.with_extension("tmp");

    if let Err(e) = file::write_store(&temp_path, model_id, dimensions, records) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e);
    }

    std::fs::rename(&temp_path, path)?;
    Ok(())
}

/// Cosine similarity between two vectors of equal length.
///
/// Returns 0.0 when either vector has zero norm.
pub fn cosine_similarity(query: &[f32], target: &[f32], query_norm: f32) -> f32 {
    let target_norm = l2_norm(target);
    if query_norm == 0.0 || target_norm == 0.0 {
        return 0.0;
    }

    let dot_product: f32 = query.iter().zip(target.iter()).map(|(a, b)| a * b).sum();
    dot_product / (query_norm * target_norm)
}

/// L2 norm of a vector.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity without a precomputed norm. Convenience for callers
/// comparing two arbitrary vectors (classifier prototypes, tests).
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    cosine_similarity(a, b, l2_norm(a))
}
