use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Data directory holding config.yaml, the bible JSON files and the
    /// vector store.
    #[clap(short, long, default_value = "data")]
    pub data_dir: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the vector store by embedding the whole corpus.
    /// Replaces any existing store.
    Index {},

    /// Search the indexed corpus.
    Search {
        /// The free-text query (Korean or English)
        query: String,

        /// Maximum number of results
        #[clap(short, long)]
        max: Option<usize>,

        /// Minimum re-ranked score
        #[clap(long)]
        min_score: Option<f32>,

        /// Restrict to one Bible version (e.g. "KRV", "ASV")
        #[clap(short, long)]
        version: Option<String>,
    },

    /// Print index and corpus statistics.
    Stats {},

    /// Print all verses of a chapter.
    Chapter {
        /// Book short code (e.g. "Matt", "창")
        book: String,

        /// Chapter number
        chapter: u32,

        /// Restrict to one Bible version
        #[clap(short, long)]
        version: Option<String>,
    },
}
