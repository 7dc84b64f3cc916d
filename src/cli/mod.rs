use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bengdict")]
#[command(author, version, about = "English to Bengali dictionary with AI fallback", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Look up one or more English words
    Lookup(LookupArgs),

    /// Show usage statistics
    Stats(StatsArgs),

    /// List recent successful lookups
    Recent(RecentArgs),

    /// List words available in the local dictionary
    Words(WordsArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Initialize configuration file with defaults
    Init {
        /// Overwrite existing config
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., api.openai_api_key)
        key: String,
        /// Value to set
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Show config file path
    Path,

    /// Edit config file with default editor
    Edit,
}

/// Model provider overrides shared by commands that may call the fallback.
#[derive(Args, Debug, Default, Clone)]
pub struct ProviderArgs {
    /// API provider (openai, claude, ollama)
    #[arg(long)]
    pub api: Option<String>,

    /// API key (can also be set via environment variable)
    #[arg(long)]
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    #[arg(long)]
    pub api_base: Option<String>,

    /// Model name to use
    #[arg(long)]
    pub model: Option<String>,
}

#[derive(Parser, Debug)]
pub struct LookupArgs {
    /// Words or short phrases to look up (quote phrases)
    #[arg(required = true)]
    pub words: Vec<String>,

    /// Print results as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Database file for generated entries and statistics
    #[arg(long)]
    pub db: Option<PathBuf>,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

#[derive(Parser, Debug)]
pub struct StatsArgs {
    /// Print statistics as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Database file for generated entries and statistics
    #[arg(long)]
    pub db: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct RecentArgs {
    /// Maximum number of entries to show
    #[arg(short, long, default_value_t = 50)]
    pub limit: usize,

    /// Print entries as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Database file for generated entries and statistics
    #[arg(long)]
    pub db: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct WordsArgs {
    /// Show the translation next to each word
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}
