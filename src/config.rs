use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default embedding model: multilingual, since the corpus and queries mix
/// Korean and English (384-dim output).
const DEFAULT_MODEL: &str = "paraphrase-multilingual-MiniLM-L12-v2";
/// Default Stage-1 candidate pool size
const DEFAULT_CANDIDATE_COUNT: usize = 50;
/// Default number of final results
const DEFAULT_RESULT_COUNT: usize = 5;
/// Default minimum re-ranked score
const DEFAULT_MIN_SCORE: f32 = 0.3;
/// Default model download timeout in seconds
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300;
/// Default vector store file name, relative to the data directory
const DEFAULT_STORE_FILE: &str = "vectors.bin";

/// One corpus input file and the version tag to use when the document
/// carries none.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BibleFile {
    pub path: String,
    pub version: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Embedding model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Stage-1 candidate pool size
    #[serde(default = "default_candidate_count")]
    pub candidate_count: usize,

    /// Default number of final results
    #[serde(default = "default_result_count")]
    pub result_count: usize,

    /// Default minimum re-ranked score [0.0, 1.0]
    #[serde(default = "default_min_score")]
    pub min_score: f32,

    /// Timeout for model download in seconds
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    /// Vector store file name, relative to the data directory
    #[serde(default = "default_store_file")]
    pub store_file: String,

    /// Corpus input files, relative to the data directory
    #[serde(default = "default_bible_files")]
    pub bible_files: Vec<BibleFile>,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            candidate_count: DEFAULT_CANDIDATE_COUNT,
            result_count: DEFAULT_RESULT_COUNT,
            min_score: DEFAULT_MIN_SCORE,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            store_file: DEFAULT_STORE_FILE.to_string(),
            bible_files: default_bible_files(),
            base_path: String::new(),
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_candidate_count() -> usize {
    DEFAULT_CANDIDATE_COUNT
}

fn default_result_count() -> usize {
    DEFAULT_RESULT_COUNT
}

fn default_min_score() -> f32 {
    DEFAULT_MIN_SCORE
}

fn default_download_timeout_secs() -> u64 {
    DEFAULT_DOWNLOAD_TIMEOUT_SECS
}

fn default_store_file() -> String {
    DEFAULT_STORE_FILE.to_string()
}

fn default_bible_files() -> Vec<BibleFile> {
    vec![
        BibleFile {
            path: "bible/bible_krv.json".to_string(),
            version: "KRV".to_string(),
        },
        BibleFile {
            path: "bible/bible_asv.json".to_string(),
            version: "ASV".to_string(),
        },
    ]
}

impl Config {
    fn validate(&self) {
        if !(0.0..=1.0).contains(&self.min_score) {
            panic!(
                "min_score must be between 0.0 and 1.0, got {}",
                self.min_score
            );
        }
        if self.candidate_count == 0 {
            panic!("candidate_count must be greater than 0");
        }
        if self.result_count == 0 {
            panic!("result_count must be greater than 0");
        }
        if self.download_timeout_secs == 0 {
            panic!("download_timeout_secs must be greater than 0");
        }
        if self.bible_files.is_empty() {
            panic!("at least one bible file must be configured");
        }
    }

    /// Load config.yaml from `base_path`, creating a default one if it does
    /// not exist. Validates and resaves in case a config upgrade added
    /// fields.
    pub fn load_with(base_path: &str) -> Self {
        let config_path = Path::new(base_path).join("config.yaml");

        if !config_path.exists() {
            std::fs::create_dir_all(base_path).expect("failed to create data directory");
            std::fs::write(
                &config_path,
                serde_yml::to_string(&Self::default()).expect("default config serializes"),
            )
            .expect("failed to write default config");
        }

        let config_str =
            std::fs::read_to_string(&config_path).expect("config file is not readable");
        let mut config: Self = serde_yml::from_str(&config_str).expect("config is malformed");
        config.base_path = base_path.to_string();

        config.validate();

        // resave in case config version needs an upgrade
        let resaved = serde_yml::to_string(&config).expect("config serializes");
        if config_str != resaved {
            std::fs::write(&config_path, resaved).expect("failed to resave config");
        }

        config
    }

    /// Absolute path of the vector store file.
    pub fn store_path(&self) -> PathBuf {
        Path::new(&self.base_path).join(&self.store_file)
    }

    /// Absolute paths of the corpus input files with their version tags.
    pub fn bible_paths(&self) -> Vec<(PathBuf, String)> {
        self.bible_files
            .iter()
            .map(|f| (Path::new(&self.base_path).join(&f.path), f.version.clone()))
            .collect()
    }

    /// The data directory this config was loaded from.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_creates_default_config() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().to_str().unwrap();

        let config = Config::load_with(base);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.candidate_count, 50);
        assert_eq!(config.result_count, 5);
        assert!((config.min_score - 0.3).abs() < f32::EPSILON);
        assert!(tmp.path().join("config.yaml").exists());
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("config.yaml"), "result_count: 10\n").unwrap();

        let config = Config::load_with(tmp.path().to_str().unwrap());
        assert_eq!(config.result_count, 10);
        assert_eq!(config.candidate_count, 50);
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    #[should_panic(expected = "min_score")]
    fn test_invalid_min_score_panics() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("config.yaml"), "min_score: 1.5\n").unwrap();
        Config::load_with(tmp.path().to_str().unwrap());
    }

    #[test]
    fn test_store_path_joins_base() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load_with(tmp.path().to_str().unwrap());
        assert_eq!(config.store_path(), tmp.path().join("vectors.bin"));
    }
}
