//! Config command handlers

use anyhow::{Context, Result};
use colored::Colorize;

use super::Config;
use crate::cli::{ConfigAction, ConfigArgs};

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Show => show_config(),
        ConfigAction::Init { force } => init_config(force),
        ConfigAction::Set { key, value } => set_config(&key, &value),
        ConfigAction::Get { key } => get_config(&key),
        ConfigAction::Path => show_path(),
        ConfigAction::Edit => edit_config(),
    }
}

fn show_config() -> Result<()> {
    let mut config = Config::load()?;
    config.api.openai_api_key = config.api.openai_api_key.map(|k| mask_key(&k));
    config.api.anthropic_api_key = config.api.anthropic_api_key.map(|k| mask_key(&k));
    let content = toml::to_string_pretty(&config)?;

    println!("{}", "[Config]".green());
    println!("{}", content);

    Ok(())
}

fn init_config(force: bool) -> Result<()> {
    let path = Config::config_path().context("Could not determine config path")?;

    if path.exists() && !force {
        println!(
            "{}",
            format!("Config file already exists: {}", path.display()).yellow()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    let config = Config::default();
    let saved_path = config.save()?;

    println!("{}", "[Config] Initialized".green());
    println!("  Created: {}", saved_path.display());
    println!();
    println!("Edit the config file to set your API keys:");
    println!("  bengdict config edit");

    Ok(())
}

fn set_config(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?;
    apply_setting(&mut config, key, value)?;
    config.save()?;

    let shown = if key.ends_with("_api_key") {
        mask_key(value)
    } else {
        value.to_string()
    };
    println!("{}", format!("[Config] Set {} = {}", key, shown).green());

    Ok(())
}

fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    // Parse key path (e.g., "api.openai_api_key")
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "verbose"] => config.general.verbose = parse_bool(key, value)?,
        ["api", "provider"] => match value.to_lowercase().as_str() {
            "openai" | "claude" | "anthropic" | "ollama" => {
                config.api.provider = value.to_lowercase();
            }
            _ => anyhow::bail!("Unknown provider: {} (expected openai, claude or ollama)", value),
        },
        ["api", "openai_api_key"] => config.api.openai_api_key = optional(value),
        ["api", "openai_api_base"] => config.api.openai_api_base = optional(value),
        ["api", "openai_model"] => config.api.openai_model = optional(value),
        ["api", "anthropic_api_key"] => config.api.anthropic_api_key = optional(value),
        ["api", "anthropic_api_base"] => config.api.anthropic_api_base = optional(value),
        ["api", "anthropic_model"] => config.api.anthropic_model = optional(value),
        ["api", "ollama_api_base"] => config.api.ollama_api_base = value.to_string(),
        ["api", "ollama_model"] => config.api.ollama_model = value.to_string(),
        ["lookup", "target_language"] => config.lookup.target_language = value.to_string(),
        ["lookup", "timeout_secs"] => {
            let secs: u64 = value
                .parse()
                .context(format!("Invalid number for {}: {}", key, value))?;
            if secs == 0 {
                anyhow::bail!("{} must be at least 1", key);
            }
            config.lookup.timeout_secs = secs;
        }
        ["lookup", "retry"] => config.lookup.retry = parse_bool(key, value)?,
        ["lookup", "retry_delay_ms"] => {
            config.lookup.retry_delay_ms = value
                .parse()
                .context(format!("Invalid number for {}: {}", key, value))?;
        }
        ["storage", "database"] => config.storage.database = optional(value),
        ["dictionary", "extra_entries"] => config.dictionary.extra_entries = optional(value),
        _ => {
            anyhow::bail!("Unknown config key: {}", key);
        }
    }

    Ok(())
}

fn get_config(key: &str) -> Result<()> {
    let config = Config::load()?;
    let parts: Vec<&str> = key.split('.').collect();

    let value: Option<String> = match parts.as_slice() {
        ["general", "verbose"] => Some(config.general.verbose.to_string()),
        ["api", "provider"] => Some(config.api.provider),
        ["api", "openai_api_key"] => config.api.openai_api_key.map(|k| mask_key(&k)),
        ["api", "openai_api_base"] => config.api.openai_api_base,
        ["api", "openai_model"] => config.api.openai_model,
        ["api", "anthropic_api_key"] => config.api.anthropic_api_key.map(|k| mask_key(&k)),
        ["api", "anthropic_api_base"] => config.api.anthropic_api_base,
        ["api", "anthropic_model"] => config.api.anthropic_model,
        ["api", "ollama_api_base"] => Some(config.api.ollama_api_base),
        ["api", "ollama_model"] => Some(config.api.ollama_model),
        ["lookup", "target_language"] => Some(config.lookup.target_language),
        ["lookup", "timeout_secs"] => Some(config.lookup.timeout_secs.to_string()),
        ["lookup", "retry"] => Some(config.lookup.retry.to_string()),
        ["lookup", "retry_delay_ms"] => Some(config.lookup.retry_delay_ms.to_string()),
        ["storage", "database"] => config.storage.database,
        ["dictionary", "extra_entries"] => config.dictionary.extra_entries,
        _ => {
            anyhow::bail!("Unknown config key: {}", key);
        }
    };

    match value {
        Some(v) => println!("{} = {}", key, v),
        None => println!("{} = (not set)", key),
    }

    Ok(())
}

fn show_path() -> Result<()> {
    match Config::config_path() {
        Some(path) => {
            println!("{}", path.display());
            if path.exists() {
                println!("{}", "(exists)".green());
            } else {
                println!("{}", "(not created)".yellow());
            }
        }
        None => {
            println!("{}", "Could not determine config path".red());
        }
    }
    Ok(())
}

fn edit_config() -> Result<()> {
    let path = Config::config_path().context("Could not determine config path")?;

    // Create default config if it doesn't exist
    if !path.exists() {
        let config = Config::default();
        config.save()?;
        println!("{}", "[Config] Created default config".green());
    }

    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| {
            if cfg!(windows) {
                "notepad".to_string()
            } else {
                "nano".to_string()
            }
        });

    println!("Opening config with: {}", editor);
    println!("Path: {}", path.display());

    std::process::Command::new(&editor)
        .arg(&path)
        .status()
        .context(format!("Failed to open editor: {}", editor))?;

    Ok(())
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value
        .parse()
        .context(format!("Invalid boolean for {}: {} (expected true or false)", key, value))
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}
