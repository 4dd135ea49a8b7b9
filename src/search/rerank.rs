//! Stage 2: re-ranking and filtering.
//!
//! Candidates from Stage 1 are filtered by version and scope, scored with
//! keyword-overlap and length signals on top of the base similarity, then
//! threshold-filtered, sorted and truncated.

use crate::context::ContextResult;
use crate::corpus::Verse;

/// Boost per query word found in the verse text.
const KEYWORD_BOOST_PER_WORD: f32 = 0.05;
/// Cap on the total keyword boost.
const KEYWORD_BOOST_CAP: f32 = 0.2;
/// Query words at or below this length are ignored for boosting.
const MIN_BOOST_WORD_LEN: usize = 2;

/// Version aliases for flexible filtering.
const VERSION_ALIASES: &[(&str, &[&str])] = &[
    ("KRV", &["KRV", "개역개정", "개역한글", "krv"]),
    ("ASV", &["ASV", "asv", "American Standard Version"]),
    ("개역개정", &["KRV", "개역개정", "개역한글", "krv"]),
];

/// A Stage-1 candidate: a verse with its embedding similarity.
#[derive(Debug, Clone)]
pub struct ScoredCandidate<'a> {
    pub verse: &'a Verse,
    pub base_score: f32,
}

/// A re-ranked candidate ready for response assembly.
#[derive(Debug, Clone)]
pub struct RankedCandidate<'a> {
    pub verse: &'a Verse,
    pub base_score: f32,
    pub reranked_score: f32,
}

/// Check if a verse version matches the requested filter.
///
/// No filter matches everything; otherwise the comparison is
/// case-insensitive and alias-aware in both directions.
pub fn matches_version(verse_version: &str, filter: Option<&str>) -> bool {
    let filter = match filter {
        Some(f) if !f.trim().is_empty() => f,
        _ => return true,
    };

    if filter.eq_ignore_ascii_case(verse_version) {
        return true;
    }

    let aliases_of = |version: &str| {
        VERSION_ALIASES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(version) || *name == version)
            .map(|(_, aliases)| *aliases)
    };

    if let Some(aliases) = aliases_of(filter) {
        if aliases.iter().any(|a| a.eq_ignore_ascii_case(verse_version)) {
            return true;
        }
    }

    // Reverse direction: the verse's version may alias the filter
    if let Some(aliases) = aliases_of(verse_version) {
        if aliases.iter().any(|a| a.eq_ignore_ascii_case(filter)) {
            return true;
        }
    }

    false
}

/// Split a query into lowercase words for keyword boosting.
pub fn query_words(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(|w| w.to_string())
        .collect()
}

/// Re-ranked score for one candidate.
///
/// `(base + keyword_boost) * length_factor`, clamped to [0, 1].
/// The boost rewards query words literally present in the verse; the
/// length factor slightly prefers concise, focused verses.
pub fn rerank_score(base_score: f32, words: &[String], verse_text: &str) -> f32 {
    let text_lower = verse_text.to_lowercase();

    let mut keyword_boost = 0.0f32;
    for word in words {
        if word.chars().count() > MIN_BOOST_WORD_LEN && text_lower.contains(word.as_str()) {
            keyword_boost += KEYWORD_BOOST_PER_WORD;
        }
    }
    keyword_boost = keyword_boost.min(KEYWORD_BOOST_CAP);

    let text_length = verse_text.chars().count();
    let length_factor = if text_length <= 300 {
        1.0
    } else if text_length <= 500 {
        0.95
    } else {
        0.9
    };

    ((base_score + keyword_boost) * length_factor).clamp(0.0, 1.0)
}

/// Run the full Stage-2 pipeline over Stage-1 candidates.
///
/// An empty return is success with zero results, not an error.
pub fn rerank_and_filter<'a>(
    candidates: Vec<ScoredCandidate<'a>>,
    query: &str,
    min_score: f32,
    version_filter: Option<&str>,
    context: &ContextResult,
    max_results: usize,
) -> Vec<RankedCandidate<'a>> {
    let words = query_words(query);

    let mut ranked: Vec<RankedCandidate<'a>> = candidates
        .into_iter()
        .filter(|c| matches_version(&c.verse.version, version_filter))
        .filter(|c| context.matches_verse(&c.verse.book_short, c.verse.testament))
        .map(|c| RankedCandidate {
            reranked_score: rerank_score(c.base_score, &words, &c.verse.text),
            verse: c.verse,
            base_score: c.base_score,
        })
        .filter(|c| c.reranked_score >= min_score)
        .collect();

    // Stable sort: ties keep Stage-1 order
    ranked.sort_by(|a, b| {
        b.reranked_score
            .partial_cmp(&a.reranked_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(max_results);

    ranked
}
