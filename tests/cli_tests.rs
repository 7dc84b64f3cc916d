//! CLI interface tests

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Binary with config and data directories isolated under `home`.
fn bengdict(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_bengdict"));
    cmd.env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env_remove("RUST_LOG");
    cmd
}

fn run(home: &Path, args: &[&str]) -> Output {
    bengdict(home)
        .args(args)
        .output()
        .expect("Failed to run bengdict")
}

fn json_stdout(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn test_help_command() {
    let temp_dir = TempDir::new().unwrap();
    let output = run(temp_dir.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("lookup"), "Should list lookup command");
    assert!(stdout.contains("stats"), "Should list stats command");
    assert!(stdout.contains("recent"), "Should list recent command");
    assert!(stdout.contains("words"), "Should list words command");
    assert!(stdout.contains("config"), "Should list config command");
}

#[test]
fn test_version_command() {
    let temp_dir = TempDir::new().unwrap();
    let output = run(temp_dir.path(), &["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("bengdict"), "Should show program name");
}

#[test]
fn test_lookup_help() {
    let temp_dir = TempDir::new().unwrap();
    let output = run(temp_dir.path(), &["lookup", "--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--json"), "Should have json option");
    assert!(stdout.contains("--db"), "Should have db option");
    assert!(stdout.contains("--api"), "Should have api option");
    assert!(stdout.contains("--model"), "Should have model option");
}

#[test]
fn test_lookup_requires_word() {
    let temp_dir = TempDir::new().unwrap();
    let output = run(temp_dir.path(), &["lookup"]);
    assert!(!output.status.success(), "Should fail without a word");
}

#[test]
fn test_lookup_local_word() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("dict.db");

    let output = run(
        temp_dir.path(),
        &["lookup", "  Hello ", "--json", "--db", db.to_str().unwrap()],
    );

    assert!(
        output.status.success(),
        "Lookup should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let record = json_stdout(&output);
    assert_eq!(record["word"], "hello");
    assert_eq!(record["bengaliTranslation"], "হ্যালো / নমস্কার");
    assert_eq!(record["partOfSpeech"], "interjection");
    assert_eq!(record["source"], "local");
    assert_eq!(record["examples"].as_array().unwrap().len(), 2);
    assert!(record["timestamp"].is_string());
}

#[test]
fn test_lookup_blank_word_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("dict.db");

    let output = run(
        temp_dir.path(),
        &["lookup", "   ", "--json", "--db", db.to_str().unwrap()],
    );

    assert!(!output.status.success(), "Blank word should fail");
    let error = json_stdout(&output);
    assert_eq!(error["error"], "invalid_input");
    assert!(error.get("bengaliTranslation").is_none());
}

#[test]
fn test_unreachable_model_persists_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("dict.db");
    let db = db.to_str().unwrap();

    let output = run(
        temp_dir.path(),
        &[
            "lookup",
            "serendipity",
            "--json",
            "--db",
            db,
            "--api",
            "ollama",
            "--api-base",
            "http://127.0.0.1:9",
        ],
    );

    assert!(!output.status.success(), "Unreachable model should fail");
    let error = json_stdout(&output);
    assert_eq!(error["error"], "upstream_unavailable");

    let stats = json_stdout(&run(temp_dir.path(), &["stats", "--json", "--db", db]));
    assert_eq!(stats["storedRecords"], 0);
    assert_eq!(stats["totalLookups"], 0);
}

#[test]
fn test_batch_lookup() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("dict.db");

    let output = run(
        temp_dir.path(),
        &["lookup", "water", "BOOK", "--json", "--db", db.to_str().unwrap()],
    );

    assert!(output.status.success());
    let records = json_stdout(&output);
    let records = records.as_array().expect("Batch output should be an array");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["word"], "water");
    assert_eq!(records[1]["word"], "book");
}

#[test]
fn test_stats_and_recent_track_lookups() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("dict.db");
    let db = db.to_str().unwrap();

    assert!(run(temp_dir.path(), &["lookup", "hello", "--db", db]).status.success());
    assert!(run(temp_dir.path(), &["lookup", "Family", "--db", db]).status.success());

    let stats = json_stdout(&run(temp_dir.path(), &["stats", "--json", "--db", db]));
    assert_eq!(stats["totalLookups"], 2);
    assert_eq!(stats["localHits"], 2);
    assert_eq!(stats["generatedCount"], 0);
    assert_eq!(stats["localEntries"], 15);

    let recent = json_stdout(&run(temp_dir.path(), &["recent", "--json", "--db", db]));
    let recent = recent.as_array().unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0]["word"], "family");
    assert_eq!(recent[0]["source"], "local");
}

#[test]
fn test_default_database_location() {
    let temp_dir = TempDir::new().unwrap();

    let output = run(temp_dir.path(), &["lookup", "time"]);
    assert!(output.status.success());

    let db = temp_dir.path().join("data").join("bengdict").join("dictionary.db");
    assert!(db.exists(), "Database should be created in the data dir");
}

#[test]
fn test_words_lists_local_dictionary() {
    let temp_dir = TempDir::new().unwrap();
    let output = run(temp_dir.path(), &["words", "--verbose"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("15 local word(s)"));
    assert!(stdout.contains("beautiful"));
    assert!(stdout.contains("সুন্দর"));
}

#[test]
fn test_extra_entries_from_config() {
    let temp_dir = TempDir::new().unwrap();
    let extra = temp_dir.path().join("extra.json");
    std::fs::write(
        &extra,
        r#"[{"word": "rain", "bengali": "বৃষ্টি", "part_of_speech": "noun",
             "definition": "Water falling from clouds"}]"#,
    )
    .unwrap();

    let set = run(
        temp_dir.path(),
        &["config", "set", "dictionary.extra_entries", extra.to_str().unwrap()],
    );
    assert!(set.status.success());

    let db = temp_dir.path().join("dict.db");
    let output = run(
        temp_dir.path(),
        &["lookup", "rain", "--json", "--db", db.to_str().unwrap()],
    );
    assert!(output.status.success());
    assert_eq!(json_stdout(&output)["bengaliTranslation"], "বৃষ্টি");
}

#[test]
fn test_config_set_and_get() {
    let temp_dir = TempDir::new().unwrap();

    let set = run(temp_dir.path(), &["config", "set", "lookup.timeout_secs", "3"]);
    assert!(set.status.success());

    let get = run(temp_dir.path(), &["config", "get", "lookup.timeout_secs"]);
    assert!(get.status.success());
    assert!(String::from_utf8_lossy(&get.stdout).contains("lookup.timeout_secs = 3"));

    let bad = run(temp_dir.path(), &["config", "set", "paths.python", "x"]);
    assert!(!bad.status.success(), "Unknown key should fail");
}

#[test]
fn test_invalid_command() {
    let temp_dir = TempDir::new().unwrap();
    let output = run(temp_dir.path(), &["invalid_command"]);
    assert!(!output.status.success(), "Should fail on invalid command");
}
