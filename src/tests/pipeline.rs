//! End-to-end pipeline tests: index a small bilingual corpus with the
//! deterministic test embedder, then exercise the full search boundary.

use std::sync::Arc;

use crate::context::ContextClassifier;
use crate::corpus::Corpus;
use crate::embedding::{model_id_hash, Embedder};
use crate::indexer;
use crate::intent::IntentClassifier;
use crate::search::{EngineTuning, SearchEngine, SearchOptions};
use crate::store::VectorStore;

use super::{sample_corpus, BagOfWordsEmbedder, FailingEmbedder};

const DIMS: usize = 256;

fn build_engine_with(embedder_for_queries: Arc<dyn Embedder>) -> (SearchEngine, Vec<tempfile::TempDir>) {
    let embedder: Arc<dyn Embedder> = Arc::new(BagOfWordsEmbedder::new(DIMS));
    let (corpus, corpus_tmp) = sample_corpus();
    let corpus = Arc::new(corpus);

    let store_tmp = tempfile::tempdir().expect("failed to create temp dir");
    let store = Arc::new(
        VectorStore::create(
            store_tmp.path().join("vectors.bin"),
            model_id_hash(embedder.model_name()),
            DIMS,
        )
        .expect("failed to create store"),
    );

    indexer::index_corpus(embedder.as_ref(), &store, &corpus).expect("indexing failed");

    // Small prototype sets keep classification deterministic under the
    // bag-of-words embedder
    let intent = IntentClassifier::with_prototypes(
        embedder.clone(),
        &["모세가 나오는 구절", "다윗이 나오는 구절"],
        &["사랑에 대한 말씀", "용서에 관한 말씀"],
    )
    .expect("intent classifier init failed");

    let context = ContextClassifier::with_prototypes(
        embedder.clone(),
        &["신약에서 나오는 구절", "구약에서 언급된 말씀"],
        &["사랑에 대한 말씀", "용서에 관한 구절"],
    )
    .expect("context classifier init failed");

    let engine = SearchEngine::with_classifiers(
        embedder_for_queries,
        store,
        corpus,
        intent,
        context,
        EngineTuning::default(),
    );
    (engine, vec![corpus_tmp, store_tmp])
}

fn build_engine() -> (SearchEngine, Vec<tempfile::TempDir>) {
    build_engine_with(Arc::new(BagOfWordsEmbedder::new(DIMS)))
}

#[test]
fn test_end_to_end_love_neighbor() {
    let (engine, _tmp) = build_engine();

    let options = SearchOptions {
        max_results: Some(5),
        min_score: Some(0.3),
        version: None,
    };
    let response = engine.search("love your neighbor", &options);

    assert!(response.success, "error: {:?}", response.error);
    assert!(!response.results.is_empty());
    assert_eq!(response.total_results, response.results.len());

    let hit = response
        .results
        .iter()
        .find(|r| r.reference == "Matthew 22:39")
        .expect("Matthew 22:39 should be found");
    assert!(hit.reranked_score >= 0.3);
    assert_eq!(hit.version, "ASV");
}

#[test]
fn test_semantic_path_end_to_end() {
    let (engine, _tmp) = build_engine();

    let response = engine.search("사랑에 대한 말씀", &SearchOptions::default());

    assert!(response.success, "error: {:?}", response.error);
    assert_eq!(response.search_method.as_deref(), Some("SEMANTIC"));
    assert!(!response.results.is_empty());
    assert!(response
        .results
        .iter()
        .any(|r| r.book_short == "요일"));
    // Base and reranked score both populated and in range
    for hit in &response.results {
        assert!((0.0..=1.0).contains(&hit.score));
        assert!((0.0..=1.0).contains(&hit.reranked_score));
    }
}

#[test]
fn test_testament_scope_filters_results() {
    let (engine, _tmp) = build_engine();

    let response = engine.search("신약에서 바벨론", &SearchOptions::default());

    assert!(response.success, "error: {:?}", response.error);
    assert_eq!(response.detected_context_type.as_deref(), Some("TESTAMENT"));
    assert_eq!(response.search_query.as_deref(), Some("바벨론"));
    assert_eq!(response.search_method.as_deref(), Some("HYBRID"));
    assert_eq!(response.extracted_keyword.as_deref(), Some("바벨론"));

    // Both testaments contain 바벨론, only the NT verse may come back
    assert!(!response.results.is_empty());
    for hit in &response.results {
        assert_eq!(hit.book_short, "마");
    }
}

#[test]
fn test_unmatched_version_filter_is_empty_success() {
    let (engine, _tmp) = build_engine();

    let options = SearchOptions {
        max_results: Some(5),
        min_score: Some(0.3),
        version: Some("WEB".to_string()),
    };
    let response = engine.search("love your neighbor", &options);

    assert!(response.success);
    assert!(response.results.is_empty());
    assert_eq!(response.total_results, 0);
    assert!(response.error.is_none());
}

#[test]
fn test_min_score_above_one_is_empty_success() {
    let (engine, _tmp) = build_engine();

    let options = SearchOptions {
        min_score: Some(1.1),
        ..Default::default()
    };
    let response = engine.search("love your neighbor", &options);

    assert!(response.success);
    assert!(response.results.is_empty());
}

#[test]
fn test_blank_query_rejected() {
    let (engine, _tmp) = build_engine();

    let response = engine.search("   ", &SearchOptions::default());

    assert!(!response.success);
    assert!(response.error.unwrap().contains("empty"));
    assert!(response.results.is_empty());
}

#[test]
fn test_zero_max_results_rejected() {
    let (engine, _tmp) = build_engine();

    let options = SearchOptions {
        max_results: Some(0),
        ..Default::default()
    };
    let response = engine.search("love", &options);

    assert!(!response.success);
    assert!(response.error.unwrap().contains("max_results"));
}

#[test]
fn test_negative_min_score_rejected() {
    let (engine, _tmp) = build_engine();

    let options = SearchOptions {
        min_score: Some(-0.5),
        ..Default::default()
    };
    let response = engine.search("love", &options);

    assert!(!response.success);
    assert!(response.error.unwrap().contains("min_score"));
}

#[test]
fn test_embedding_failure_becomes_error_response() {
    // Classifiers are built with a working embedder; the query-path
    // embedder fails, so the semantic stage surfaces an error response.
    let (engine, _tmp) = build_engine_with(Arc::new(FailingEmbedder::new(DIMS)));

    let response = engine.search("love your neighbor", &SearchOptions::default());

    assert!(!response.success);
    assert!(response.error.unwrap().contains("model unavailable"));
    assert!(response.results.is_empty());
}

#[test]
fn test_max_results_truncates() {
    let (engine, _tmp) = build_engine();

    let options = SearchOptions {
        max_results: Some(1),
        min_score: Some(0.0),
        version: None,
    };
    let response = engine.search("바벨론", &options);

    assert!(response.success);
    assert!(response.results.len() <= 1);
}

#[test]
fn test_stats_reflects_index() {
    let (engine, _tmp) = build_engine();

    let stats = engine.stats().unwrap();
    assert_eq!(stats.indexed_records, 6);
    assert_eq!(stats.corpus.total_verses, 6);
    assert_eq!(stats.corpus.versions.get("ASV"), Some(&3));
    assert_eq!(stats.corpus.versions.get("KRV"), Some(&3));
    assert_eq!(stats.candidate_count, 50);
}

#[test]
fn test_response_serializes_to_json() {
    let (engine, _tmp) = build_engine();

    let response = engine.search("love your neighbor", &SearchOptions::default());
    let json = serde_json::to_string(&response).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["success"], serde_json::json!(true));
    assert!(value["results"].is_array());
    assert!(value["search_method"].is_string());
}

/// Re-indexing into a fresh store handle yields identical search results:
/// the store round-trips vectors bit-exactly.
#[test]
fn test_reopened_store_searches_identically() {
    let embedder: Arc<dyn Embedder> = Arc::new(BagOfWordsEmbedder::new(DIMS));
    let (corpus, _corpus_tmp) = sample_corpus();

    let store_tmp = tempfile::tempdir().unwrap();
    let path = store_tmp.path().join("vectors.bin");
    let model_id = model_id_hash(embedder.model_name());

    let store = VectorStore::create(&path, model_id, DIMS).unwrap();
    indexer::index_corpus(embedder.as_ref(), &store, &corpus).unwrap();

    let query = embedder.embed("love thy neighbor").unwrap();
    let warm = store.search(&query, 10, 0.1).unwrap();

    let reopened = VectorStore::open(&path, model_id, DIMS).unwrap();
    let cold = reopened.search(&query, 10, 0.1).unwrap();

    assert_eq!(warm.len(), cold.len());
    for (a, b) in warm.iter().zip(cold.iter()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.score.to_bits(), b.score.to_bits());
    }
}
