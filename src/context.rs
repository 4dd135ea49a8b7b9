//! Scope (context) detection and extraction.
//!
//! Detects constraints like "신약에서 ...", "사복음서에서 ...",
//! "in Romans about ..." embedded in a query, strips them, and produces a
//! verse-matching predicate for the re-ranker.
//!
//! Detection is two-phase: embedding similarity against "has scope" /
//! "no scope" prototype sets decides whether to even try extraction, and a
//! structural marker pattern (Korean postpositions, English prepositions)
//! does the actual extraction. Similarity alone is never enough: without a
//! structural match the query passes through unchanged, which avoids false
//! positives on thematically scope-ish queries.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::books;
use crate::embedding::{Embedder, EmbeddingError};
use crate::store::cosine;

/// Minimum similarity margin for the no-scope early exit.
const DIFFERENCE_THRESHOLD: f32 = 0.08;

/// Prototype phrases that HAVE a scope constraint.
const SCOPE_PROTOTYPES: &[&str] = &[
    // Testament constraints - Korean
    "신약에서 나오는 구절",
    "구약에서 언급된 말씀",
    "신약성경에서 사랑에 대한",
    "구약성서에서 예언된",
    // Testament constraints - English
    "verses from the new testament",
    "passages in the old testament",
    "in the NT about love",
    "OT prophecies about",
    // Book groups - Korean
    "사복음서에서 사랑이 나온 구절",
    "복음서에서 예수님의 말씀",
    "모세오경에서 율법에 대한",
    "바울서신에서 믿음에 관한",
    "시가서에서 찬양에 대해",
    "대선지서에서 예언",
    "소선지서에서 심판",
    // Book groups - English
    "in the four gospels about",
    "from the pentateuch about",
    "pauline epistles on faith",
    "wisdom books about",
    // Single book - Korean
    "로마서에서 복음의 정의",
    "창세기에서 창조에 대한",
    "요한복음에서 영생에 관한",
    "시편에서 위로의 말씀",
    "잠언에서 지혜에 대해",
    "이사야에서 메시아 예언",
    // Single book - English
    "in Romans about justification",
    "in Genesis about creation",
    "from John about eternal life",
    "in Psalms about comfort",
    // Multiple books - Korean
    "이사야, 예레미야에서 구원이 언급된",
    "마태복음과 요한복음에서 기적",
    "고린도전서와 후서에서 교회에 대해",
    "에베소서, 빌립보서에서 기쁨",
];

/// Prototype phrases with NO scope constraint (general searches).
const NO_SCOPE_PROTOTYPES: &[&str] = &[
    "사랑에 대한 말씀",
    "용서에 관한 구절",
    "하나님의 은혜",
    "믿음의 의미",
    "소망에 대해",
    "평안을 주는 말씀",
    "위로의 구절",
    "verses about love",
    "what does the Bible say about forgiveness",
    "comfort in suffering",
    "faith and trust",
    "모세가 나오는 구절",
    "다윗이 언급된",
    "예루살렘이 나오는",
];

/// Korean: "XXX에서 ...", "XXX에 ...", "XXX의 ..."
static KOREAN_SCOPE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?)(?:에서|에|의|에서 나오는|에 있는|에 나오는)\s+(.+)$")
        .expect("korean scope pattern is valid")
});

/// English: "in XXX ...", "from XXX ..."
static ENGLISH_SCOPE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:in|from|in the|from the)\s+(.+?)\s+(?:about|on|concerning|regarding)?\s*(.+)$")
        .expect("english scope pattern is valid")
});

static KOREAN_OT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"구약(?:성경|성서)?").expect("pattern is valid"));
static KOREAN_NT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"신약(?:성경|성서)?").expect("pattern is valid"));
static ENGLISH_OT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:old testament|OT)").expect("pattern is valid"));
static ENGLISH_NT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:new testament|NT)").expect("pattern is valid"));

/// Separators for multiple book names: comma, 과/와, "and", "&".
static MULTI_BOOK_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,과와]|\s+and\s+|\s*&\s*").expect("pattern is valid"));

/// The detected scope constraint.
///
/// Each variant carries exactly the data that is valid for it; there is no
/// "books list that is only meaningful for some types".
#[derive(Debug, Clone, PartialEq)]
pub enum Scope {
    /// No constraint: search all books
    None,
    /// Old (1) or New (2) Testament
    Testament(u8),
    /// A named book group, e.g. the four gospels
    BookGroup { name: String, books: Vec<String> },
    /// One specific book
    SingleBook { name: String, book: String },
    /// Several specific books
    MultipleBooks { books: Vec<String> },
}

impl Scope {
    /// Wire name of the scope type, used in responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Scope::None => "NONE",
            Scope::Testament(_) => "TESTAMENT",
            Scope::BookGroup { .. } => "BOOK_GROUP",
            Scope::SingleBook { .. } => "SINGLE_BOOK",
            Scope::MultipleBooks { .. } => "MULTIPLE_BOOKS",
        }
    }

    /// Book codes this scope restricts to, if it is book-based.
    pub fn books(&self) -> Option<Vec<String>> {
        match self {
            Scope::BookGroup { books, .. } | Scope::MultipleBooks { books } => Some(books.clone()),
            Scope::SingleBook { book, .. } => Some(vec![book.clone()]),
            Scope::None | Scope::Testament(_) => None,
        }
    }
}

/// Result of scope extraction: the scope plus the cleaned query to search.
#[derive(Debug, Clone)]
pub struct ContextResult {
    pub scope: Scope,
    pub cleaned_query: String,
    pub original_query: String,
    /// Similarity score behind the detection (1.0 for trivially-no-scope)
    pub confidence: f32,
}

impl ContextResult {
    fn no_scope(query: &str) -> Self {
        Self {
            scope: Scope::None,
            cleaned_query: query.to_string(),
            original_query: query.to_string(),
            confidence: 1.0,
        }
    }

    pub fn has_scope(&self) -> bool {
        self.scope != Scope::None
    }

    /// The query to actually search with.
    pub fn search_query(&self) -> &str {
        if self.cleaned_query.trim().is_empty() {
            &self.original_query
        } else {
            &self.cleaned_query
        }
    }

    /// Human-readable description of the detected scope.
    pub fn description(&self) -> Option<String> {
        match &self.scope {
            Scope::None => None,
            Scope::Testament(1) => Some("구약 (Old Testament)".to_string()),
            Scope::Testament(_) => Some("신약 (New Testament)".to_string()),
            Scope::BookGroup { name, .. } => Some(name.clone()),
            Scope::SingleBook { name, .. } => Some(name.clone()),
            Scope::MultipleBooks { books } => Some(books.join(", ")),
        }
    }

    /// Whether a verse falls inside this scope.
    pub fn matches_verse(&self, book_short: &str, testament: u8) -> bool {
        match &self.scope {
            Scope::None => true,
            Scope::Testament(wanted) => *wanted == testament,
            Scope::BookGroup { books, .. } | Scope::MultipleBooks { books } => books
                .iter()
                .any(|b| b.eq_ignore_ascii_case(book_short)),
            Scope::SingleBook { book, .. } => book.eq_ignore_ascii_case(book_short),
        }
    }
}

/// Embedding-similarity scope classifier.
///
/// Prototype embeddings are computed once in the constructor and shared
/// immutably across concurrent queries.
pub struct ContextClassifier {
    embedder: Arc<dyn Embedder>,
    scope_prototypes: Vec<Vec<f32>>,
    no_scope_prototypes: Vec<Vec<f32>>,
}

impl ContextClassifier {
    /// Build a classifier over the default curated prototype sets.
    pub fn new(embedder: Arc<dyn Embedder>) -> Result<Self, EmbeddingError> {
        Self::with_prototypes(embedder, SCOPE_PROTOTYPES, NO_SCOPE_PROTOTYPES)
    }

    /// Build a classifier over custom prototype sets.
    pub fn with_prototypes(
        embedder: Arc<dyn Embedder>,
        scope_prototypes: &[&str],
        no_scope_prototypes: &[&str],
    ) -> Result<Self, EmbeddingError> {
        log::info!(
            "Initializing context classifier with {} scope and {} no-scope prototypes",
            scope_prototypes.len(),
            no_scope_prototypes.len()
        );

        let scope_texts: Vec<String> = scope_prototypes.iter().map(|s| s.to_string()).collect();
        let no_scope_texts: Vec<String> =
            no_scope_prototypes.iter().map(|s| s.to_string()).collect();

        Ok(Self {
            scope_prototypes: embedder.embed_batch(&scope_texts)?,
            no_scope_prototypes: embedder.embed_batch(&no_scope_texts)?,
            embedder,
        })
    }

    /// Extract a scope constraint from a query.
    pub fn extract(&self, query: &str) -> Result<ContextResult, EmbeddingError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Ok(ContextResult::no_scope(query));
        }

        // Phase 1: does this query look scoped at all?
        let query_embedding = self.embedder.embed(trimmed)?;
        let scope_sim = mean_similarity(&query_embedding, &self.scope_prototypes);
        let no_scope_sim = mean_similarity(&query_embedding, &self.no_scope_prototypes);
        let difference = scope_sim - no_scope_sim;

        log::debug!(
            "Context scores for '{}': scope={:.3}, no-scope={:.3}, diff={:.3}",
            trimmed,
            scope_sim,
            no_scope_sim,
            difference
        );

        if no_scope_sim > scope_sim && -difference > DIFFERENCE_THRESHOLD {
            log::debug!("No context detected for query: '{}'", trimmed);
            return Ok(ContextResult::no_scope(trimmed));
        }

        // Phase 2: structural extraction. Similarity without a structural
        // match is not evidence enough, so failure falls through to NONE.
        if let Some(result) = try_extract_scope(trimmed, scope_sim) {
            log::info!(
                "Context extracted: {} -> {} (confidence: {:.0}%)",
                trimmed,
                result.description().unwrap_or_default(),
                result.confidence * 100.0
            );
            return Ok(result);
        }

        Ok(ContextResult::no_scope(trimmed))
    }
}

fn mean_similarity(query: &[f32], prototypes: &[Vec<f32>]) -> f32 {
    if prototypes.is_empty() {
        return 0.0;
    }
    let total: f32 = prototypes.iter().map(|p| cosine(query, p)).sum();
    total / prototypes.len() as f32
}

/// Try the structural marker patterns, Korean first.
fn try_extract_scope(query: &str, confidence: f32) -> Option<ContextResult> {
    if let Some(captures) = KOREAN_SCOPE_PATTERN.captures(query) {
        let scope_part = captures.get(1)?.as_str().trim();
        let search_part = captures.get(2)?.as_str().trim();
        if let Some(result) = parse_scope_part(scope_part, search_part, query, confidence, true) {
            return Some(result);
        }
    }

    if let Some(captures) = ENGLISH_SCOPE_PATTERN.captures(query) {
        let scope_part = captures.get(1)?.as_str().trim();
        let search_part = captures.get(2)?.as_str().trim();
        if let Some(result) = parse_scope_part(scope_part, search_part, query, confidence, false) {
            return Some(result);
        }
    }

    None
}

/// Resolve a scope fragment in priority order:
/// testament -> book group -> multiple books -> single book.
fn parse_scope_part(
    scope_part: &str,
    search_part: &str,
    original_query: &str,
    confidence: f32,
    korean: bool,
) -> Option<ContextResult> {
    let result = |scope: Scope| ContextResult {
        scope,
        cleaned_query: search_part.to_string(),
        original_query: original_query.to_string(),
        confidence,
    };

    let (ot, nt) = if korean {
        (&*KOREAN_OT_PATTERN, &*KOREAN_NT_PATTERN)
    } else {
        (&*ENGLISH_OT_PATTERN, &*ENGLISH_NT_PATTERN)
    };

    if ot.is_match(scope_part) {
        return Some(result(Scope::Testament(1)));
    }
    if nt.is_match(scope_part) {
        return Some(result(Scope::Testament(2)));
    }

    if let Some((name, group_books)) = books::find_group(scope_part, korean) {
        return Some(result(Scope::BookGroup {
            name: name.to_string(),
            books: group_books.iter().map(|b| b.to_string()).collect(),
        }));
    }

    let multiple = parse_multiple_books(scope_part, korean);
    if multiple.len() > 1 {
        return Some(result(Scope::MultipleBooks { books: multiple }));
    }

    if let Some((name, book)) = books::find_book(scope_part, korean) {
        return Some(result(Scope::SingleBook {
            name: name.to_string(),
            book: book.to_string(),
        }));
    }

    None
}

/// Parse multiple book names out of a scope fragment.
/// Handles "이사야, 예레미야", "마태복음과 요한복음", "Isaiah and Jeremiah".
fn parse_multiple_books(scope_part: &str, korean: bool) -> Vec<String> {
    MULTI_BOOK_SEPARATOR
        .split(scope_part)
        .filter_map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }
            books::find_book(part, korean).map(|(_, short)| short.to_string())
        })
        .collect()
}
