//! Search intent classification.
//!
//! Decides whether a query wants exact keyword lookup, meaning-based
//! lookup, or both. Instead of hand-written regex routing, this is
//! few-shot classification with embeddings: a curated set of prototype
//! phrases per intent is embedded once at startup, and each query is
//! compared to the prototype sets by mean cosine similarity. Regexes are
//! only used afterwards, to pull the keyword out of a keyword-style query.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::embedding::{Embedder, EmbeddingError};
use crate::store::cosine;

/// Minimum mean similarity to classify as KEYWORD
const KEYWORD_THRESHOLD: f32 = 0.45;
/// Minimum mean similarity to classify as SEMANTIC
const SEMANTIC_THRESHOLD: f32 = 0.45;
/// Minimum similarity difference to prefer one intent over the other
const DIFFERENCE_THRESHOLD: f32 = 0.05;

/// Single-token queries at or below this length skip embedding
/// classification entirely: too short and ambiguous to classify reliably.
const SHORT_TOKEN_MAX_CHARS: usize = 6;

/// Longest accepted extracted keyword, in characters.
const MAX_KEYWORD_CHARS: usize = 20;

/// Prototype phrases for KEYWORD intent (exact word match queries).
const KEYWORD_PROTOTYPES: &[&str] = &[
    // Korean patterns - looking for specific words
    "가사라는 지명이 나오는 구절",
    "모세가 등장하는 구절을 찾아줘",
    "다윗이라는 이름이 나오는 성경 구절",
    "아브라함이 언급된 부분",
    "예루살렘이 나오는 곳",
    "바울이라는 단어가 포함된 구절",
    "베드로가 나오는 성경",
    "시온이라는 지명",
    "갈릴리가 언급되는 구절",
    "여리고가 등장하는",
    // English patterns - looking for specific words
    "verses containing the word shepherd",
    "find verses that mention Moses",
    "passages where David appears",
    "verses with the name Abraham",
    "scriptures mentioning Jerusalem",
    "verses that contain the word love",
    "find where Paul is mentioned",
    "passages with the word faith",
    "verses including the term righteousness",
    "scriptures containing Galilee",
];

/// Prototype phrases for SEMANTIC intent (meaning-based queries).
const SEMANTIC_PROTOTYPES: &[&str] = &[
    // Korean patterns - conceptual/thematic
    "사랑에 대한 말씀",
    "용서에 관한 구절",
    "믿음의 의미를 알려주는 성경",
    "힘든 시간에 위로가 되는 말씀",
    "하나님의 사랑을 느낄 수 있는 구절",
    "소망과 희망에 대해",
    "감사에 관련된 성경 구절",
    "평안을 주는 말씀",
    "지혜로운 삶에 대한 가르침",
    "겸손함에 대해 말하는 구절",
    // English patterns - conceptual/thematic
    "verses about God's love",
    "what does the Bible say about forgiveness",
    "comfort in times of suffering",
    "passages about faith and trust",
    "scriptures on hope and encouragement",
    "teachings about wisdom",
    "verses related to peace and rest",
    "passages concerning eternal life",
    "what the Bible teaches about humility",
    "scriptures about gratitude and thanksgiving",
];

/// Keyword extraction patterns, tried in order. First capture group wins.
static KEYWORD_EXTRACTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"["'](.+?)["']"#,
        r"(.+?)(?:라는|이라는)\s*(?:단어|말|지명|이름|인물|사람|곳|장소)",
        r"(.+?)(?:가|이)\s*(?:나오는|나온|등장하는|언급된|포함된)",
        r"(.+?)(?:을|를)\s*(?:포함한|포함하는|담은|담고)",
        r#"(?i)(?:containing|with|mentions?)\s+(?:the\s+word\s+)?["']?([\w가-힣]+)["']?"#,
        r#"(?i)(?:the word|the name|the place)\s+["']?([\w가-힣]+)["']?"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("keyword extraction pattern is valid"))
    .collect()
});

/// Words too generic to serve as an extracted keyword.
const STOP_WORDS: &[&str] = &[
    // English stop words
    "the", "a", "an", "is", "are", "was", "were", "be", "been",
    "find", "search", "show", "get", "verses", "verse", "passages",
    "containing", "with", "about", "for", "in", "on", "at",
    // Korean stop words
    "를", "을", "이", "가", "에", "의", "와", "과", "로", "으로",
    "구절", "말씀", "성경", "찾아", "줘", "주세요",
];

/// The classified intent of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Exact keyword/word match wanted
    Keyword { keyword: Option<String> },
    /// Meaning-based search wanted
    Semantic,
    /// Ambiguous or too short: run both and merge
    Hybrid { keyword: Option<String> },
}

impl Intent {
    /// Wire name of the intent, used in responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Intent::Keyword { .. } => "KEYWORD",
            Intent::Semantic => "SEMANTIC",
            Intent::Hybrid { .. } => "HYBRID",
        }
    }

    pub fn keyword(&self) -> Option<&str> {
        match self {
            Intent::Keyword { keyword } | Intent::Hybrid { keyword } => keyword.as_deref(),
            Intent::Semantic => None,
        }
    }
}

/// Classification outcome: the intent plus a human-readable reason for it.
#[derive(Debug, Clone)]
pub struct SearchIntent {
    pub intent: Intent,
    pub reason: String,
}

/// Embedding-similarity intent classifier.
///
/// Prototype embeddings are computed once in the constructor and immutable
/// afterwards, so a classifier can be shared across concurrent queries.
pub struct IntentClassifier {
    embedder: Arc<dyn Embedder>,
    keyword_prototypes: Vec<Vec<f32>>,
    semantic_prototypes: Vec<Vec<f32>>,
}

impl IntentClassifier {
    /// Build a classifier over the default curated prototype sets.
    pub fn new(embedder: Arc<dyn Embedder>) -> Result<Self, EmbeddingError> {
        Self::with_prototypes(embedder, KEYWORD_PROTOTYPES, SEMANTIC_PROTOTYPES)
    }

    /// Build a classifier over custom prototype sets.
    pub fn with_prototypes(
        embedder: Arc<dyn Embedder>,
        keyword_prototypes: &[&str],
        semantic_prototypes: &[&str],
    ) -> Result<Self, EmbeddingError> {
        log::info!(
            "Initializing intent classifier with {} keyword and {} semantic prototypes",
            keyword_prototypes.len(),
            semantic_prototypes.len()
        );

        let keyword_texts: Vec<String> = keyword_prototypes.iter().map(|s| s.to_string()).collect();
        let semantic_texts: Vec<String> =
            semantic_prototypes.iter().map(|s| s.to_string()).collect();

        Ok(Self {
            keyword_prototypes: embedder.embed_batch(&keyword_texts)?,
            semantic_prototypes: embedder.embed_batch(&semantic_texts)?,
            embedder,
        })
    }

    /// Classify the intent of a search query.
    pub fn classify(&self, query: &str) -> Result<SearchIntent, EmbeddingError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Ok(SearchIntent {
                intent: Intent::Semantic,
                reason: "Empty query defaults to semantic".to_string(),
            });
        }

        // Only very short single-word queries default to HYBRID; multi-word
        // queries go through the embedding classifier.
        let words: Vec<&str> = trimmed.split_whitespace().collect();
        if words.len() == 1 && trimmed.chars().count() <= SHORT_TOKEN_MAX_CHARS {
            return Ok(SearchIntent {
                intent: Intent::Hybrid {
                    keyword: Some(trimmed.to_string()),
                },
                reason: format!(
                    "Single short word ({} chars): using hybrid search",
                    trimmed.chars().count()
                ),
            });
        }

        let query_embedding = self.embedder.embed(trimmed)?;
        let keyword_sim = mean_similarity(&query_embedding, &self.keyword_prototypes);
        let semantic_sim = mean_similarity(&query_embedding, &self.semantic_prototypes);

        log::debug!(
            "Intent scores for '{}': keyword={:.3}, semantic={:.3}",
            trimmed,
            keyword_sim,
            semantic_sim
        );

        let difference = keyword_sim - semantic_sim;

        if keyword_sim > KEYWORD_THRESHOLD && difference > DIFFERENCE_THRESHOLD {
            Ok(SearchIntent {
                intent: Intent::Keyword {
                    keyword: extract_keyword(trimmed),
                },
                reason: format!(
                    "Keyword intent detected (score: {:.0}% vs {:.0}%)",
                    keyword_sim * 100.0,
                    semantic_sim * 100.0
                ),
            })
        } else if semantic_sim > SEMANTIC_THRESHOLD && -difference > DIFFERENCE_THRESHOLD {
            Ok(SearchIntent {
                intent: Intent::Semantic,
                reason: format!(
                    "Semantic intent detected (score: {:.0}% vs {:.0}%)",
                    semantic_sim * 100.0,
                    keyword_sim * 100.0
                ),
            })
        } else {
            Ok(SearchIntent {
                intent: Intent::Hybrid {
                    keyword: extract_keyword(trimmed),
                },
                reason: format!(
                    "Ambiguous intent (keyword: {:.0}%, semantic: {:.0}%): using hybrid",
                    keyword_sim * 100.0,
                    semantic_sim * 100.0
                ),
            })
        }
    }
}

/// Mean cosine similarity between a query vector and a prototype set.
fn mean_similarity(query: &[f32], prototypes: &[Vec<f32>]) -> f32 {
    if prototypes.is_empty() {
        return 0.0;
    }
    let total: f32 = prototypes.iter().map(|p| cosine(query, p)).sum();
    total / prototypes.len() as f32
}

/// Extract the keyword/name/place a keyword-style query is asking about.
///
/// Pattern priority: quoted text, then Korean "X라는/X가 나오는/X를 포함한"
/// forms, then English "containing/the word X" forms, then the first
/// non-stopword token when the query is three words or fewer.
pub fn extract_keyword(query: &str) -> Option<String> {
    for pattern in KEYWORD_EXTRACTION_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(query) {
            if let Some(group) = captures.get(1) {
                let keyword = group
                    .as_str()
                    .trim()
                    .trim_end_matches(['"', '\'', ' '])
                    .trim();
                if !keyword.is_empty() && keyword.chars().count() <= MAX_KEYWORD_CHARS {
                    return Some(keyword.to_string());
                }
            }
        }
    }

    // Fallback: short queries use their first significant word
    let words: Vec<&str> = query.split_whitespace().collect();
    if words.len() <= 3 {
        for word in words {
            if word.chars().count() >= 2 && !is_stop_word(word) {
                return Some(word.to_string());
            }
        }
    }

    None
}

fn is_stop_word(word: &str) -> bool {
    let lower = word.to_lowercase();
    STOP_WORDS.contains(&lower.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::BagOfWordsEmbedder;

    fn test_classifier() -> IntentClassifier {
        let embedder = Arc::new(BagOfWordsEmbedder::new(256));
        IntentClassifier::with_prototypes(
            embedder,
            &["모세가 나오는 구절", "다윗이 나오는 구절"],
            &["사랑에 대한 말씀", "용서에 관한 말씀"],
        )
        .unwrap()
    }

    #[test]
    fn test_empty_query_is_semantic() {
        let classifier = test_classifier();
        let result = classifier.classify("   ").unwrap();
        assert_eq!(result.intent, Intent::Semantic);
    }

    #[test]
    fn test_short_single_token_is_hybrid() {
        let classifier = test_classifier();
        let result = classifier.classify("바벨론").unwrap();
        assert_eq!(
            result.intent,
            Intent::Hybrid {
                keyword: Some("바벨론".to_string())
            }
        );
        assert!(result.reason.contains("hybrid"));
    }

    #[test]
    fn test_keyword_style_query_classified_keyword() {
        let classifier = test_classifier();
        let result = classifier.classify("\"가사\"가 나오는 구절").unwrap();
        assert_eq!(
            result.intent,
            Intent::Keyword {
                keyword: Some("가사".to_string())
            }
        );
        assert!(result.reason.contains("Keyword intent"));
    }

    #[test]
    fn test_semantic_style_query_classified_semantic() {
        let classifier = test_classifier();
        let result = classifier.classify("사랑에 대한 말씀").unwrap();
        assert_eq!(result.intent, Intent::Semantic);
        assert!(result.reason.contains("Semantic intent"));
    }

    #[test]
    fn test_ambiguous_query_is_hybrid() {
        let classifier = test_classifier();
        // Shares no tokens with either prototype set
        let result = classifier.classify("완전히 무관한 임의의 문장").unwrap();
        assert!(matches!(result.intent, Intent::Hybrid { .. }));
        assert!(result.reason.contains("Ambiguous"));
    }

    #[test]
    fn test_extract_keyword_quoted_first() {
        assert_eq!(extract_keyword("\"가사\"가 나오는 구절"), Some("가사".to_string()));
        assert_eq!(extract_keyword("'shepherd' appears where"), Some("shepherd".to_string()));
    }

    #[test]
    fn test_extract_keyword_korean_patterns() {
        assert_eq!(
            extract_keyword("가사라는 지명이 나오는 구절"),
            Some("가사".to_string())
        );
        assert_eq!(extract_keyword("모세가 나오는 구절"), Some("모세".to_string()));
        assert_eq!(extract_keyword("소망을 담은 말씀"), Some("소망".to_string()));
    }

    #[test]
    fn test_extract_keyword_english_patterns() {
        assert_eq!(
            extract_keyword("verses containing the word shepherd"),
            Some("shepherd".to_string())
        );
        assert_eq!(
            extract_keyword("verses with the word faith"),
            Some("faith".to_string())
        );
    }

    #[test]
    fn test_extract_keyword_fallback_skips_stopwords() {
        assert_eq!(extract_keyword("find shepherd"), Some("shepherd".to_string()));
        // Four words and no pattern match: nothing extracted
        assert_eq!(extract_keyword("one two three four"), None);
    }

    #[test]
    fn test_extract_keyword_length_cap() {
        let long = "아".repeat(30);
        let query = format!("\"{}\"가 나오는 구절", long);
        // Quoted capture is too long; the 가-나오는 pattern then catches the
        // quoted token, still over the cap, so the 3-word fallback applies.
        let extracted = extract_keyword(&query);
        assert_ne!(extracted, Some(long));
    }

    #[test]
    fn test_intent_kind_names() {
        assert_eq!(Intent::Semantic.kind(), "SEMANTIC");
        assert_eq!(Intent::Keyword { keyword: None }.kind(), "KEYWORD");
        assert_eq!(Intent::Hybrid { keyword: None }.kind(), "HYBRID");
    }
}
