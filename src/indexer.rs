//! Corpus indexing: embed every verse and load the vector store.
//!
//! A one-shot batch job run at startup or as an offline build step. Texts
//! are embedded in fixed-size batches; the store is populated with a single
//! atomic bulk upsert, so a failed run leaves the store exactly as it was.
//! Indexing errors are fatal by design: a half-built index must never be
//! served from.

use indicatif::{ProgressBar, ProgressStyle};

use crate::corpus::Corpus;
use crate::embedding::{Embedder, EmbeddingError};
use crate::store::{StoreError, VectorStore};

/// Number of texts embedded per batch call.
const BATCH_SIZE: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Embed the whole corpus into `store`. Returns the number of records
/// written.
pub fn index_corpus(
    embedder: &dyn Embedder,
    store: &VectorStore,
    corpus: &Corpus,
) -> Result<usize, IndexError> {
    let verses = corpus.all();
    if verses.is_empty() {
        log::warn!("No verses to index");
        return Ok(0);
    }

    log::info!("Generating embeddings for {} verses...", verses.len());

    let progress = ProgressBar::new(verses.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("[{bar:40}] {pos}/{len} ({percent}%) {msg}")
            .expect("progress template is valid")
            .progress_chars("█░ "),
    );

    let mut items: Vec<(Vec<f32>, String, Option<String>)> = Vec::with_capacity(verses.len());

    for batch in verses.chunks(BATCH_SIZE) {
        let texts: Vec<String> = batch.iter().map(|v| v.embedding_text()).collect();
        let vectors = embedder.embed_batch(&texts)?;

        for ((vector, text), verse) in vectors.into_iter().zip(texts).zip(batch) {
            items.push((vector, text, Some(verse.key())));
        }
        progress.inc(batch.len() as u64);
    }

    progress.finish_with_message("embedded");

    // One atomic commit: readers see the old store until the rename lands
    let ids = store.bulk_upsert(items)?;
    log::info!("Indexed {} verses into the vector store", ids.len());

    Ok(ids.len())
}
