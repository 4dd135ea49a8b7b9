use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;

mod books;
mod cli;
mod config;
mod context;
mod corpus;
mod embedding;
mod indexer;
mod intent;
mod search;
mod store;
#[cfg(test)]
mod tests;

use cli::Command;
use config::Config;
use corpus::Corpus;
use embedding::{model_id_hash, Embedder, FastembedEmbedder};
use search::{EngineStats, EngineTuning, SearchEngine, SearchOptions};
use store::VectorStore;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = cli::Args::parse();
    let config = Config::load_with(&args.data_dir);

    match args.command {
        Command::Index {} => {
            let embedder = load_embedder(&config)?;
            let corpus = load_corpus(&config)?;
            if corpus.is_empty() {
                bail!("corpus is empty; check the configured bible files");
            }

            let store = VectorStore::create(
                config.store_path(),
                model_id_hash(embedder.model_name()),
                embedder.dimensions(),
            )
            .context("failed to create vector store")?;

            let written = indexer::index_corpus(embedder.as_ref(), &store, &corpus)
                .context("indexing failed")?;

            println!(
                "Indexed {} verses into {}",
                written,
                config.store_path().display()
            );
            Ok(())
        }

        Command::Search {
            query,
            max,
            min_score,
            version,
        } => {
            let embedder = load_embedder(&config)?;
            let corpus = Arc::new(load_corpus(&config)?);
            let store = Arc::new(open_store(&config, embedder.as_ref())?);

            let engine = SearchEngine::new(embedder, store.clone(), corpus, tuning(&config))
                .context("failed to initialize search engine")?;

            let options = SearchOptions {
                max_results: max,
                min_score,
                version,
            };
            let response = engine.search(&query, &options);

            println!("{}", serde_json::to_string_pretty(&response)?);
            store.close();
            Ok(())
        }

        Command::Stats {} => {
            let embedder = load_embedder(&config)?;
            let corpus = load_corpus(&config)?;
            let store = open_store(&config, embedder.as_ref())?;

            let stats = EngineStats {
                indexed_records: store.count().context("failed to count store records")?,
                candidate_count: config.candidate_count,
                result_count: config.result_count,
                min_score: config.min_score,
                corpus: corpus.statistics(),
            };

            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }

        Command::Chapter {
            book,
            chapter,
            version,
        } => {
            let corpus = load_corpus(&config)?;
            let verses = corpus.chapter_verses(&book, chapter, version.as_deref());

            if verses.is_empty() {
                bail!("no verses found for {} chapter {}", book, chapter);
            }

            let hits: Vec<search::response::VerseHit> = verses
                .into_iter()
                .map(|v| search::response::VerseHit::from_verse(v, 1.0, 1.0))
                .collect();

            println!("{}", serde_json::to_string_pretty(&hits)?);
            Ok(())
        }
    }
}

fn load_embedder(config: &Config) -> anyhow::Result<Arc<dyn Embedder>> {
    let embedder = FastembedEmbedder::new(
        &config.model,
        std::path::PathBuf::from(config.base_path()),
        Some(Duration::from_secs(config.download_timeout_secs)),
    )
    .with_context(|| format!("failed to load embedding model '{}'", config.model))?;
    Ok(Arc::new(embedder))
}

fn load_corpus(config: &Config) -> anyhow::Result<Corpus> {
    let files: Vec<(std::path::PathBuf, String)> = config.bible_paths();
    let refs: Vec<(&std::path::Path, &str)> = files
        .iter()
        .map(|(path, version)| (path.as_path(), version.as_str()))
        .collect();
    Corpus::load(&refs).context("failed to load bible corpus")
}

fn open_store(config: &Config, embedder: &dyn Embedder) -> anyhow::Result<VectorStore> {
    VectorStore::open(
        config.store_path(),
        model_id_hash(embedder.model_name()),
        embedder.dimensions(),
    )
    .with_context(|| {
        format!(
            "failed to open vector store {} (run `versefinder index` first?)",
            config.store_path().display()
        )
    })
}

fn tuning(config: &Config) -> EngineTuning {
    EngineTuning {
        candidate_count: config.candidate_count,
        result_count: config.result_count,
        min_score: config.min_score,
    }
}
