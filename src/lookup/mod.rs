pub mod dictionary;
pub mod error;
pub mod llm;
pub mod record;
pub mod resolver;
pub mod schema;
pub mod store;

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::{LookupArgs, ProviderArgs, RecentArgs, StatsArgs, WordsArgs};
use crate::config::Config;
use crate::utils::truncate_display;
use dictionary::LocalDictionary;
use error::LookupError;
use llm::{GenerativeResolver, LlmClient, LlmConfig, LlmProvider};
use record::{Tier, TranslationRecord};
use resolver::{Resolution, Resolver};
use store::SqliteStore;

pub fn run_lookup(args: LookupArgs) -> Result<()> {
    let cfg = Config::load().unwrap_or_default();
    let resolver = build_resolver(&cfg, &args.provider, args.db.clone())?;

    let results: Vec<(String, Result<Resolution, LookupError>)> = if args.words.len() > 1 {
        let pb = ProgressBar::new(args.words.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len}")?
                .progress_chars("=>-"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));

        let results: Vec<_> = args
            .words
            .par_iter()
            .map(|word| {
                let result = resolver.resolve(word);
                pb.inc(1);
                (word.clone(), result)
            })
            .collect();

        pb.finish_and_clear();
        results
    } else {
        args.words
            .iter()
            .map(|word| (word.clone(), resolver.resolve(word)))
            .collect()
    };

    let failures = results.iter().filter(|(_, r)| r.is_err()).count();

    if args.json {
        print_json_results(&results)?;
    } else {
        for (query, result) in &results {
            match result {
                Ok(resolution) => print_record(&resolution.record, resolution.tier),
                Err(e) => eprintln!(
                    "{}",
                    format!("[ERROR] Translation failed for '{}': {}", query, e).red()
                ),
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} lookup(s) failed", failures, results.len());
    }

    Ok(())
}

pub fn run_stats(args: StatsArgs) -> Result<()> {
    let cfg = Config::load().unwrap_or_default();
    let resolver = build_resolver(&cfg, &ProviderArgs::default(), args.db)?;
    let stats = resolver.statistics()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "[Stats]".green());
    println!("  Total lookups:      {}", stats.total_lookups);
    println!("  Local hits:         {}", stats.local_hits);
    println!("  Cached hits:        {}", stats.cache_hits);
    println!("  Generated entries:  {}", stats.generated_count);
    println!("  Stored entries:     {}", stats.stored_records);
    println!("  Local dictionary:   {}", stats.local_entries);
    println!(
        "  Unique words known: {}",
        stats.local_entries + stats.stored_records
    );

    Ok(())
}

pub fn run_recent(args: RecentArgs) -> Result<()> {
    let cfg = Config::load().unwrap_or_default();
    let resolver = build_resolver(&cfg, &ProviderArgs::default(), args.db)?;
    let entries = resolver.recent(args.limit)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("{}", "[WARN] No lookups recorded yet".yellow());
        return Ok(());
    }

    for entry in entries {
        println!(
            "{}  {}  {}",
            entry.looked_up_at.format("%Y-%m-%d %H:%M:%S"),
            entry.word.bold(),
            format!("[{}]", entry.source).dimmed()
        );
    }

    Ok(())
}

pub fn run_words(args: WordsArgs) -> Result<()> {
    let cfg = Config::load().unwrap_or_default();
    let dictionary = load_dictionary(&cfg)?;

    println!(
        "{}",
        format!("[Dictionary] {} local word(s)", dictionary.len()).green()
    );

    for word in dictionary.words() {
        if args.verbose {
            if let Some(record) = dictionary.lookup(word) {
                println!("  {:<16} {}", word, record.translated_text);
            }
        } else {
            println!("  {}", word);
        }
    }

    Ok(())
}

fn build_resolver(
    cfg: &Config,
    provider_args: &ProviderArgs,
    db: Option<PathBuf>,
) -> Result<Resolver> {
    let dictionary = Arc::new(load_dictionary(cfg)?);

    let db_path = match db.or_else(|| cfg.storage.database.as_ref().map(PathBuf::from)) {
        Some(path) => path,
        None => SqliteStore::default_path()?,
    };
    let store = SqliteStore::open(&db_path)
        .context(format!("Failed to open database: {}", db_path.display()))?;
    tracing::debug!("Using database {}", db_path.display());

    let fallback = create_fallback(cfg, provider_args)?;

    Ok(Resolver::new(dictionary, Arc::new(store), Box::new(fallback)))
}

fn load_dictionary(cfg: &Config) -> Result<LocalDictionary> {
    let mut dictionary = LocalDictionary::seeded();

    if let Some(ref path) = cfg.dictionary.extra_entries {
        let merged = dictionary.load_extra(path)?;
        tracing::info!("Loaded {} extra dictionary entries from {}", merged, path);
    }

    Ok(dictionary)
}

/// CLI arg > config > default.
fn create_fallback(
    cfg: &Config,
    args: &ProviderArgs,
) -> Result<GenerativeResolver<LlmClient>> {
    let provider_str = args
        .api
        .clone()
        .unwrap_or_else(|| cfg.api.provider.clone());
    let provider = LlmProvider::from_str(&provider_str);

    let api_key = args
        .api_key
        .clone()
        .or_else(|| cfg.get_api_key(provider.name()));

    if api_key.is_none() && provider.requires_api_key() {
        tracing::debug!(
            "No API key for {}; only local and stored entries will resolve",
            provider.name()
        );
    }

    let api_base = args
        .api_base
        .clone()
        .or_else(|| cfg.get_api_base(provider.name()));
    let model = args.model.clone().or_else(|| cfg.get_model(provider.name()));

    let config = LlmConfig::new(provider)
        .with_api_key(api_key)
        .with_base_url(api_base)
        .with_model(model)
        .with_timeout(Duration::from_secs(cfg.lookup.timeout_secs.max(1)));

    let client = LlmClient::new(config)?;

    Ok(GenerativeResolver::new(client, &cfg.lookup.target_language).with_retry(
        cfg.lookup.retry,
        Duration::from_millis(cfg.lookup.retry_delay_ms),
    ))
}

fn print_json_results(results: &[(String, Result<Resolution, LookupError>)]) -> Result<()> {
    let values: Vec<serde_json::Value> = results
        .iter()
        .map(|(query, result)| match result {
            Ok(resolution) => serde_json::to_value(&resolution.record)
                .unwrap_or_else(|e| json!({ "word": query, "error": "encoding", "message": e.to_string() })),
            Err(e) => json!({ "word": query, "error": e.kind(), "message": e.to_string() }),
        })
        .collect();

    let output = match values.as_slice() {
        [single] => serde_json::to_string_pretty(single)?,
        _ => serde_json::to_string_pretty(&values)?,
    };
    println!("{}", output);

    Ok(())
}

fn print_record(record: &TranslationRecord, tier: Tier) {
    let badge = match tier {
        Tier::Local => "[local]".cyan(),
        Tier::Persisted => "[cached]".blue(),
        Tier::Generated => "[generated]".magenta(),
    };

    println!("{} {}", record.word.bold().green(), badge);
    println!("  {}", record.translated_text.bold());
    if !record.pronunciation.is_empty() {
        println!("  /{}/", record.pronunciation);
    }
    println!("  {} {}", record.part_of_speech.italic(), record.definition);
    for example in &record.examples {
        println!("  {} {}", "-".dimmed(), truncate_display(example, 120));
    }
    println!();
}
