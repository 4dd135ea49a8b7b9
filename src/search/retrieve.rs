//! Stage 1: candidate retrieval.
//!
//! Embeds the query and runs a permissive top-K similarity search against
//! the vector store, resolving each hit's stored text back to its verse.
//! Precision filtering is Stage 2's job; the low floor here keeps recall
//! high.

use crate::corpus::Corpus;
use crate::embedding::Embedder;
use crate::store::VectorStore;

use super::rerank::ScoredCandidate;
use super::SearchError;

/// Low similarity floor for candidates. Stage 2 and the caller's threshold
/// do the real filtering.
pub const CANDIDATE_MIN_SCORE: f32 = 0.1;

/// Retrieve up to `top_k` scored candidates for a query.
///
/// Store hits whose text no longer resolves to a verse indicate an index
/// built against a different corpus; they are logged and dropped rather
/// than failing the query.
pub fn retrieve_candidates<'a>(
    embedder: &dyn Embedder,
    store: &VectorStore,
    corpus: &'a Corpus,
    query: &str,
    top_k: usize,
) -> Result<Vec<ScoredCandidate<'a>>, SearchError> {
    let query_vector = embedder.embed(query)?;
    let matches = store.search(&query_vector, top_k, CANDIDATE_MIN_SCORE)?;

    let mut candidates = Vec::with_capacity(matches.len());
    for hit in matches {
        match corpus.verse_by_embedding_text(&hit.text) {
            Some(verse) => candidates.push(ScoredCandidate {
                verse,
                base_score: hit.score,
            }),
            None => {
                log::warn!(
                    "Store record {} does not resolve to a verse; dropping (stale index?)",
                    hit.id
                );
            }
        }
    }

    Ok(candidates)
}
