//! Shared test fixtures.
//!
//! Tests never download a real model: [`BagOfWordsEmbedder`] is a
//! deterministic stand-in that hashes tokens into buckets, so texts that
//! share words get similar vectors. That is enough signal to exercise the
//! whole retrieval pipeline with predictable outcomes.

mod pipeline;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::corpus::Corpus;
use crate::embedding::{Embedder, EmbeddingError};

/// Deterministic bag-of-words embedder for tests.
pub struct BagOfWordsEmbedder {
    dimensions: usize,
}

impl BagOfWordsEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Embed without the Result wrapper, for fixture-building code.
    pub fn embed_infallible(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let bucket = (hasher.finish() % self.dimensions as u64) as usize;
            vector[bucket] += 1.0;
        }
        vector
    }
}

impl Embedder for BagOfWordsEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.embed_infallible(text))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_infallible(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        "bag-of-words-test"
    }
}

/// An embedder that always fails, for error-path tests.
pub struct FailingEmbedder {
    dimensions: usize,
}

impl FailingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Embedder for FailingEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::EmbeddingFailed("model unavailable".to_string()))
    }

    fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::EmbeddingFailed("model unavailable".to_string()))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        "failing-test"
    }
}

const ASV_JSON: &str = r#"{
    "version": "ASV",
    "books": [
        {
            "bookName": "Genesis",
            "bookShort": "Gen",
            "testament": 1,
            "bookNumber": 1,
            "chapters": [
                {
                    "chapter": 1,
                    "verses": [
                        { "verse": 1, "text": "In the beginning God created the heavens and the earth." }
                    ]
                }
            ]
        },
        {
            "bookName": "Matthew",
            "bookShort": "Matt",
            "testament": 2,
            "bookNumber": 40,
            "chapters": [
                {
                    "chapter": 22,
                    "verses": [
                        { "verse": 39, "text": "Thou shalt love thy neighbor as thyself." },
                        { "verse": 40, "text": "On these two commandments the whole law hangeth." }
                    ]
                }
            ]
        }
    ]
}"#;

const KRV_JSON: &str = r#"{
    "version": "KRV",
    "books": [
        {
            "bookName": "창세기",
            "bookShort": "창",
            "testament": 1,
            "bookNumber": 1,
            "chapters": [
                {
                    "chapter": 11,
                    "verses": [
                        { "verse": 9, "text": "그러므로 그 이름을 바벨론이라 하니라" }
                    ]
                }
            ]
        },
        {
            "bookName": "마태복음",
            "bookShort": "마",
            "testament": 2,
            "bookNumber": 40,
            "chapters": [
                {
                    "chapter": 1,
                    "verses": [
                        { "verse": 11, "text": "바벨론으로 사로잡혀 갈 때에 요시야는 여고냐와 그의 형제들을 낳으니라" }
                    ]
                }
            ]
        },
        {
            "bookName": "요한일서",
            "bookShort": "요일",
            "testament": 2,
            "bookNumber": 62,
            "chapters": [
                {
                    "chapter": 4,
                    "verses": [
                        { "verse": 16, "text": "사랑에 거하는 자는 말씀 안에 거하느니라" }
                    ]
                }
            ]
        }
    ]
}"#;

/// A small bilingual corpus: one OT and one NT book per language.
pub fn sample_corpus() -> (Corpus, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let asv_path = tmp.path().join("bible_asv.json");
    let krv_path = tmp.path().join("bible_krv.json");
    std::fs::write(&asv_path, ASV_JSON).expect("failed to write ASV fixture");
    std::fs::write(&krv_path, KRV_JSON).expect("failed to write KRV fixture");

    let corpus = Corpus::load(&[(asv_path, "ASV"), (krv_path, "KRV")])
        .expect("failed to load sample corpus");
    (corpus, tmp)
}
