//! Search response types.

use serde::Serialize;

use crate::context::ContextResult;
use crate::corpus::Verse;
use crate::intent::SearchIntent;

/// One verse in a search response.
#[derive(Debug, Clone, Serialize)]
pub struct VerseHit {
    /// Full reference string, e.g. "Genesis 1:1" or "창세기 1:1"
    pub reference: String,
    pub book_name: String,
    pub book_short: String,
    pub chapter: u32,
    pub verse: u32,
    pub title: Option<String>,
    pub text: String,
    pub version: String,
    /// Relevance score from embedding similarity
    pub score: f32,
    /// Re-ranked score after Stage 2
    pub reranked_score: f32,
}

impl VerseHit {
    pub fn from_verse(verse: &Verse, score: f32, reranked_score: f32) -> Self {
        Self {
            reference: verse.reference(),
            book_name: verse.book_name.clone(),
            book_short: verse.book_short.clone(),
            chapter: verse.chapter,
            verse: verse.verse_number,
            title: verse.title.clone(),
            text: verse.text.clone(),
            version: verse.version.clone(),
            score,
            reranked_score,
        }
    }
}

/// Complete response for one search call.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    /// The original query as submitted
    pub query: String,
    /// Matching verses, sorted by relevance
    pub results: Vec<VerseHit>,
    pub total_results: usize,
    pub search_time_ms: u64,
    pub success: bool,
    pub error: Option<String>,
    /// Which search method served the query: KEYWORD, SEMANTIC or HYBRID
    pub search_method: Option<String>,
    pub extracted_keyword: Option<String>,
    pub intent_reason: Option<String>,
    /// Detected scope type: NONE, TESTAMENT, BOOK_GROUP, SINGLE_BOOK, MULTIPLE_BOOKS
    pub detected_context_type: Option<String>,
    pub detected_context: Option<String>,
    pub context_books: Option<Vec<String>>,
    /// The cleaned query that was actually searched
    pub search_query: Option<String>,
}

impl SearchResponse {
    /// Build a successful response with full intent/context observability.
    pub fn success(
        query: &str,
        results: Vec<VerseHit>,
        search_time_ms: u64,
        intent: &SearchIntent,
        context: &ContextResult,
    ) -> Self {
        Self {
            query: query.to_string(),
            total_results: results.len(),
            results,
            search_time_ms,
            success: true,
            error: None,
            search_method: Some(intent.intent.kind().to_string()),
            extracted_keyword: intent.intent.keyword().map(|k| k.to_string()),
            intent_reason: Some(intent.reason.clone()),
            detected_context_type: Some(context.scope.kind().to_string()),
            detected_context: context.description(),
            context_books: context.scope.books(),
            search_query: Some(context.search_query().to_string()),
        }
    }

    /// Build an error response. The caller sees zero results plus the
    /// error description; nothing is thrown past the search boundary.
    pub fn error(query: &str, message: impl Into<String>) -> Self {
        Self {
            query: query.to_string(),
            results: Vec::new(),
            total_results: 0,
            search_time_ms: 0,
            success: false,
            error: Some(message.into()),
            search_method: None,
            extracted_keyword: None,
            intent_reason: None,
            detected_context_type: None,
            detected_context: None,
            context_books: None,
            search_query: None,
        }
    }
}
