//! Verse corpus loading and lookup.
//!
//! Parses per-version Bible JSON documents into immutable [`Verse`] records
//! and serves the lookup maps the search pipeline needs: by unique key and
//! by embedding text (the exact string that gets embedded is the join key
//! from a vector store hit back to its verse).

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

/// Errors raised while loading the corpus.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed Bible JSON in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A single Bible verse. Created once at corpus load, immutable after.
#[derive(Debug, Clone, PartialEq)]
pub struct Verse {
    pub version: String,
    pub book_name: String,
    pub book_short: String,
    /// 1 = Old Testament, 2 = New Testament
    pub testament: u8,
    pub book_number: u32,
    pub chapter: u32,
    pub verse_number: u32,
    pub title: Option<String>,
    pub text: String,
}

impl Verse {
    /// Unique key: `version:book_short:chapter:verse`.
    pub fn key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.version, self.book_short, self.chapter, self.verse_number
        )
    }

    /// Human-readable reference, e.g. "Matthew 22:39" or "창세기 1:1".
    pub fn reference(&self) -> String {
        format!("{} {}:{}", self.book_name, self.chapter, self.verse_number)
    }

    /// The exact string that gets embedded for this verse.
    /// Format: `[VERSION] BookName Chapter:Verse <Title> Text`
    pub fn embedding_text(&self) -> String {
        let mut out = format!(
            "[{}] {} {}:{}",
            self.version, self.book_name, self.chapter, self.verse_number
        );
        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            out.push_str(" <");
            out.push_str(title);
            out.push('>');
        }
        out.push(' ');
        out.push_str(&self.text);
        out
    }
}

// On-disk document shape: { version, books: [{ bookName, bookShort,
// testament, bookNumber, chapters: [{ chapter, verses: [{ verse, text,
// title? }] }] }] }

#[derive(Debug, Deserialize)]
struct BibleDocument {
    version: Option<String>,
    #[serde(default)]
    books: Vec<BookDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookDocument {
    book_name: String,
    book_short: String,
    #[serde(default)]
    testament: u8,
    #[serde(default)]
    book_number: u32,
    #[serde(default)]
    chapters: Vec<ChapterDocument>,
}

#[derive(Debug, Deserialize)]
struct ChapterDocument {
    chapter: u32,
    #[serde(default)]
    verses: Vec<VerseDocument>,
}

#[derive(Debug, Deserialize)]
struct VerseDocument {
    verse: u32,
    #[serde(default)]
    text: String,
    title: Option<String>,
}

/// Per-version verse counts.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CorpusStats {
    pub total_verses: usize,
    pub versions: HashMap<String, usize>,
}

/// The loaded verse corpus, read-shared by every pipeline component.
pub struct Corpus {
    verses: Vec<Verse>,
    by_key: HashMap<String, usize>,
    by_embedding_text: HashMap<String, usize>,
}

impl Corpus {
    /// Build a corpus from one or more Bible JSON files.
    ///
    /// Each entry is `(path, default_version)`; the default is used when
    /// the document carries no `version` field.
    pub fn load(files: &[(impl AsRef<Path>, &str)]) -> Result<Self, CorpusError> {
        let mut corpus = Self {
            verses: Vec::new(),
            by_key: HashMap::new(),
            by_embedding_text: HashMap::new(),
        };

        for (path, default_version) in files {
            corpus.load_file(path.as_ref(), default_version)?;
        }

        log::info!("Loaded {} total verses from Bible data", corpus.verses.len());
        Ok(corpus)
    }

    fn load_file(&mut self, path: &Path, default_version: &str) -> Result<(), CorpusError> {
        let bytes = std::fs::read(path).map_err(|source| CorpusError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let document: BibleDocument =
            serde_json::from_slice(&bytes).map_err(|source| CorpusError::Parse {
                path: path.display().to_string(),
                source,
            })?;

        let version = document
            .version
            .unwrap_or_else(|| default_version.to_string());

        let mut book_count = 0usize;
        let mut verse_count = 0usize;

        for book in document.books {
            for chapter in &book.chapters {
                for verse_doc in &chapter.verses {
                    let verse = Verse {
                        version: version.clone(),
                        book_name: book.book_name.clone(),
                        book_short: book.book_short.clone(),
                        testament: book.testament,
                        book_number: book.book_number,
                        chapter: chapter.chapter,
                        verse_number: verse_doc.verse,
                        title: verse_doc
                            .title
                            .as_deref()
                            .filter(|t| !t.is_empty())
                            .map(|t| t.to_string()),
                        text: verse_doc.text.clone(),
                    };

                    let index = self.verses.len();
                    self.by_key.insert(verse.key(), index);
                    self.by_embedding_text.insert(verse.embedding_text(), index);
                    self.verses.push(verse);
                    verse_count += 1;
                }
            }
            book_count += 1;
        }

        log::info!(
            "Loaded {} books, {} verses from {} Bible",
            book_count,
            verse_count,
            version
        );
        Ok(())
    }

    /// All verses, in load order.
    pub fn all(&self) -> &[Verse] {
        &self.verses
    }

    pub fn len(&self) -> usize {
        self.verses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    /// Look up a verse by its unique key (`version:book:chapter:verse`).
    pub fn verse_by_key(&self, key: &str) -> Option<&Verse> {
        self.by_key.get(key).map(|&i| &self.verses[i])
    }

    /// Resolve a stored embedding text back to its verse.
    pub fn verse_by_embedding_text(&self, text: &str) -> Option<&Verse> {
        self.by_embedding_text.get(text).map(|&i| &self.verses[i])
    }

    /// Exact substring keyword search over verse text.
    pub fn search_keyword(&self, keyword: &str) -> Vec<&Verse> {
        if keyword.is_empty() {
            return Vec::new();
        }
        self.verses
            .iter()
            .filter(|v| v.text.contains(keyword))
            .collect()
    }

    /// All verses of a chapter, ordered by verse number.
    pub fn chapter_verses(&self, book_short: &str, chapter: u32, version: Option<&str>) -> Vec<&Verse> {
        let mut verses: Vec<&Verse> = self
            .verses
            .iter()
            .filter(|v| v.book_short.eq_ignore_ascii_case(book_short))
            .filter(|v| v.chapter == chapter)
            .filter(|v| match version {
                Some(wanted) if !wanted.is_empty() => {
                    crate::search::rerank::matches_version(&v.version, Some(wanted))
                }
                _ => true,
            })
            .collect();
        verses.sort_by_key(|v| v.verse_number);
        verses
    }

    /// Verse count statistics, per version.
    pub fn statistics(&self) -> CorpusStats {
        let mut versions: HashMap<String, usize> = HashMap::new();
        for verse in &self.verses {
            *versions.entry(verse.version.clone()).or_insert(0) += 1;
        }
        CorpusStats {
            total_verses: self.verses.len(),
            versions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) const SAMPLE_JSON: &str = r#"{
        "version": "ASV",
        "books": [
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
                            { "verse": 40, "text": "On these two commandments the whole law hangeth.", "title": "The Greatest Commandment" }
                        ]
                    }
                ]
            }
        ]
    }"#;

    fn sample_corpus() -> (Corpus, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bible_asv.json");
        std::fs::write(&path, SAMPLE_JSON).unwrap();
        let corpus = Corpus::load(&[(path, "ASV")]).unwrap();
        (corpus, tmp)
    }

    #[test]
    fn test_load_and_lookup_by_key() {
        let (corpus, _tmp) = sample_corpus();
        assert_eq!(corpus.len(), 2);

        let verse = corpus.verse_by_key("ASV:Matt:22:39").unwrap();
        assert_eq!(verse.reference(), "Matthew 22:39");
        assert_eq!(verse.testament, 2);
        assert!(verse.title.is_none());
    }

    #[test]
    fn test_embedding_text_format() {
        let (corpus, _tmp) = sample_corpus();

        let plain = corpus.verse_by_key("ASV:Matt:22:39").unwrap();
        assert_eq!(
            plain.embedding_text(),
            "[ASV] Matthew 22:39 Thou shalt love thy neighbor as thyself."
        );

        let titled = corpus.verse_by_key("ASV:Matt:22:40").unwrap();
        assert_eq!(
            titled.embedding_text(),
            "[ASV] Matthew 22:40 <The Greatest Commandment> On these two commandments the whole law hangeth."
        );
    }

    #[test]
    fn test_embedding_text_resolves_back() {
        let (corpus, _tmp) = sample_corpus();
        let verse = corpus.verse_by_key("ASV:Matt:22:39").unwrap();
        let resolved = corpus.verse_by_embedding_text(&verse.embedding_text()).unwrap();
        assert_eq!(resolved.key(), verse.key());
    }

    #[test]
    fn test_keyword_search_exact_substring() {
        let (corpus, _tmp) = sample_corpus();
        assert_eq!(corpus.search_keyword("neighbor").len(), 1);
        assert_eq!(corpus.search_keyword("commandments").len(), 1);
        assert!(corpus.search_keyword("Moses").is_empty());
        assert!(corpus.search_keyword("").is_empty());
    }

    #[test]
    fn test_chapter_verses_ordered() {
        let (corpus, _tmp) = sample_corpus();
        let verses = corpus.chapter_verses("matt", 22, None);
        assert_eq!(verses.len(), 2);
        assert_eq!(verses[0].verse_number, 39);
        assert_eq!(verses[1].verse_number, 40);
    }

    #[test]
    fn test_statistics() {
        let (corpus, _tmp) = sample_corpus();
        let stats = corpus.statistics();
        assert_eq!(stats.total_verses, 2);
        assert_eq!(stats.versions.get("ASV"), Some(&2));
    }

    #[test]
    fn test_missing_file_errors() {
        let result = Corpus::load(&[(std::path::PathBuf::from("/nonexistent/bible.json"), "KRV")]);
        assert!(matches!(result, Err(CorpusError::Io { .. })));
    }

    #[test]
    fn test_malformed_json_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let result = Corpus::load(&[(path, "KRV")]);
        assert!(matches!(result, Err(CorpusError::Parse { .. })));
    }
}
