//! Two-stage search engine.
//!
//! The outer [`SearchEngine::search`] boundary never fails: every pipeline
//! error is converted into an error-flagged [`SearchResponse`]. The flow is
//! context extraction (strip scope) -> intent classification (cleaned
//! query) -> dispatch to keyword / semantic / hybrid search -> response
//! assembly.

pub mod rerank;
pub mod response;
pub mod retrieve;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::context::{ContextClassifier, ContextResult};
use crate::corpus::{Corpus, CorpusStats};
use crate::embedding::{Embedder, EmbeddingError};
use crate::intent::{Intent, IntentClassifier, SearchIntent};
use crate::store::{StoreError, VectorStore};

use response::{SearchResponse, VerseHit};

/// Errors inside the query path. All of them are caught at the `search`
/// boundary and flattened into an error response.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Engine tuning knobs, normally sourced from config.
#[derive(Debug, Clone)]
pub struct EngineTuning {
    /// Stage-1 candidate pool size
    pub candidate_count: usize,
    /// Default number of final results
    pub result_count: usize,
    /// Default minimum re-ranked score
    pub min_score: f32,
}

impl Default for EngineTuning {
    fn default() -> Self {
        Self {
            candidate_count: 50,
            result_count: 5,
            min_score: 0.3,
        }
    }
}

/// Per-request options; `None` falls back to the engine defaults.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub max_results: Option<usize>,
    pub min_score: Option<f32>,
    pub version: Option<String>,
}

/// Engine statistics for observability.
#[derive(Debug, Serialize)]
pub struct EngineStats {
    pub indexed_records: usize,
    pub candidate_count: usize,
    pub result_count: usize,
    pub min_score: f32,
    pub corpus: CorpusStats,
}

/// The assembled search pipeline.
///
/// Every collaborator is injected at construction; the engine holds no
/// global state. Queries are read-only and safe to run concurrently.
pub struct SearchEngine {
    embedder: Arc<dyn Embedder>,
    store: Arc<VectorStore>,
    corpus: Arc<Corpus>,
    intent_classifier: IntentClassifier,
    context_classifier: ContextClassifier,
    tuning: EngineTuning,
}

impl SearchEngine {
    /// Build an engine with the default curated classifier prototypes.
    ///
    /// Embeds both prototype sets once; this is the startup cost that makes
    /// per-query classification cheap.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<VectorStore>,
        corpus: Arc<Corpus>,
        tuning: EngineTuning,
    ) -> Result<Self, EmbeddingError> {
        let intent_classifier = IntentClassifier::new(embedder.clone())?;
        let context_classifier = ContextClassifier::new(embedder.clone())?;
        Ok(Self::with_classifiers(
            embedder,
            store,
            corpus,
            intent_classifier,
            context_classifier,
            tuning,
        ))
    }

    /// Build an engine with pre-built classifiers.
    pub fn with_classifiers(
        embedder: Arc<dyn Embedder>,
        store: Arc<VectorStore>,
        corpus: Arc<Corpus>,
        intent_classifier: IntentClassifier,
        context_classifier: ContextClassifier,
        tuning: EngineTuning,
    ) -> Self {
        Self {
            embedder,
            store,
            corpus,
            intent_classifier,
            context_classifier,
            tuning,
        }
    }

    /// Perform a search. Never fails: errors come back as an error-flagged
    /// response with zero results.
    pub fn search(&self, query: &str, options: &SearchOptions) -> SearchResponse {
        let start = Instant::now();

        match self.run(query, options) {
            Ok((results, intent, context)) => {
                let elapsed = start.elapsed().as_millis() as u64;
                let context_desc = if context.has_scope() {
                    context.description().unwrap_or_default()
                } else {
                    "none".to_string()
                };
                log::info!(
                    "Search completed in {}ms: '{}' [{}] -> {} results (context: {})",
                    elapsed,
                    query,
                    intent.intent.kind(),
                    results.len(),
                    context_desc
                );
                SearchResponse::success(query, results, elapsed, &intent, &context)
            }
            Err(e) => {
                log::error!("Search failed for query '{}': {}", query, e);
                SearchResponse::error(query, e.to_string())
            }
        }
    }

    fn run(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<(Vec<VerseHit>, SearchIntent, ContextResult), SearchError> {
        let max_results = options.max_results.unwrap_or(self.tuning.result_count);
        let min_score = options.min_score.unwrap_or(self.tuning.min_score);
        let version = options.version.as_deref();

        validate(query, max_results, min_score)?;

        // Step 1: strip any book/testament scope from the query
        let context = self.context_classifier.extract(query)?;
        log::info!(
            "Context extracted: {} -> '{}' (type: {}, books: {:?})",
            query,
            context.search_query(),
            context.scope.kind(),
            context.scope.books()
        );

        // Step 2: classify intent on the cleaned query
        let intent = self.intent_classifier.classify(context.search_query())?;
        log::info!(
            "Classified intent: {} for query '{}' (keyword: {:?}) - {}",
            intent.intent.kind(),
            context.search_query(),
            intent.intent.keyword(),
            intent.reason
        );

        // Step 3: dispatch
        let results = match &intent.intent {
            Intent::Keyword { keyword } => {
                self.keyword_search(keyword.as_deref(), version, &context, max_results, min_score)
            }
            Intent::Hybrid { keyword } => self.hybrid_search(
                context.search_query(),
                keyword.as_deref(),
                version,
                &context,
                max_results,
                min_score,
            )?,
            Intent::Semantic => self.semantic_search(
                context.search_query(),
                version,
                &context,
                max_results,
                min_score,
            )?,
        };

        Ok((results, intent, context))
    }

    /// Exact-match keyword search. An exact hit is a perfect score.
    fn keyword_search(
        &self,
        keyword: Option<&str>,
        version: Option<&str>,
        context: &ContextResult,
        max_results: usize,
        min_score: f32,
    ) -> Vec<VerseHit> {
        let keyword = match keyword {
            Some(k) if !k.is_empty() => k,
            _ => {
                log::debug!("Keyword search with no extracted keyword: zero results");
                return Vec::new();
            }
        };

        log::debug!("Performing keyword search for: {}", keyword);

        self.corpus
            .search_keyword(keyword)
            .into_iter()
            .filter(|v| rerank::matches_version(&v.version, version))
            .filter(|v| context.matches_verse(&v.book_short, v.testament))
            .filter(|_| 1.0 >= min_score)
            .take(max_results)
            .map(|v| VerseHit::from_verse(v, 1.0, 1.0))
            .collect()
    }

    /// Two-stage semantic search.
    fn semantic_search(
        &self,
        query: &str,
        version: Option<&str>,
        context: &ContextResult,
        max_results: usize,
        min_score: f32,
    ) -> Result<Vec<VerseHit>, SearchError> {
        log::debug!("Performing semantic search for: {}", query);

        let candidates = retrieve::retrieve_candidates(
            self.embedder.as_ref(),
            &self.store,
            &self.corpus,
            query,
            self.tuning.candidate_count,
        )?;

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let ranked =
            rerank::rerank_and_filter(candidates, query, min_score, version, context, max_results);

        Ok(ranked
            .into_iter()
            .map(|r| VerseHit::from_verse(r.verse, r.base_score, r.reranked_score))
            .collect())
    }

    /// Hybrid search: exact keyword hits first, semantic fill after.
    fn hybrid_search(
        &self,
        query: &str,
        keyword: Option<&str>,
        version: Option<&str>,
        context: &ContextResult,
        max_results: usize,
        min_score: f32,
    ) -> Result<Vec<VerseHit>, SearchError> {
        log::debug!("Performing hybrid search: keyword={:?}, query='{}'", keyword, query);

        let keyword_matches = match keyword {
            Some(k) if !k.is_empty() => self.corpus.search_keyword(k),
            _ => Vec::new(),
        };

        let keyword_keys: HashSet<String> = keyword_matches
            .iter()
            .filter(|v| context.matches_verse(&v.book_short, v.testament))
            .map(|v| v.key())
            .collect();

        let mut results: Vec<VerseHit> = keyword_matches
            .iter()
            .filter(|v| rerank::matches_version(&v.version, version))
            .filter(|v| context.matches_verse(&v.book_short, v.testament))
            .filter(|_| 1.0 >= min_score)
            .take(max_results)
            .map(|v| VerseHit::from_verse(v, 1.0, 1.0))
            .collect();

        if results.len() < max_results {
            let candidates = retrieve::retrieve_candidates(
                self.embedder.as_ref(),
                &self.store,
                &self.corpus,
                query,
                self.tuning.candidate_count,
            )?;

            let fresh: Vec<_> = candidates
                .into_iter()
                .filter(|c| !keyword_keys.contains(&c.verse.key()))
                .collect();

            let remaining = max_results - results.len();
            let ranked =
                rerank::rerank_and_filter(fresh, query, min_score, version, context, remaining);

            results.extend(
                ranked
                    .into_iter()
                    .map(|r| VerseHit::from_verse(r.verse, r.base_score, r.reranked_score)),
            );
        }

        Ok(results)
    }

    /// Engine statistics for the stats surface.
    pub fn stats(&self) -> Result<EngineStats, SearchError> {
        Ok(EngineStats {
            indexed_records: self.store.count()?,
            candidate_count: self.tuning.candidate_count,
            result_count: self.tuning.result_count,
            min_score: self.tuning.min_score,
            corpus: self.corpus.statistics(),
        })
    }
}

/// Reject invalid requests before any embedding or store work.
fn validate(query: &str, max_results: usize, min_score: f32) -> Result<(), SearchError> {
    if query.trim().is_empty() {
        return Err(SearchError::Validation("Query cannot be empty".to_string()));
    }
    if max_results == 0 {
        return Err(SearchError::Validation(
            "max_results must be greater than zero".to_string(),
        ));
    }
    if min_score.is_nan() || min_score < 0.0 {
        return Err(SearchError::Validation(format!(
            "min_score must be a non-negative number, got {}",
            min_score
        )));
    }
    Ok(())
}
