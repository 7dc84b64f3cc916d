//! Persisted entries and usage counters using SQLite

use anyhow::Context;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::error::StoreError;
use super::record::{Source, Tier, TranslationRecord};

const APP_NAME: &str = "bengdict";
const DATABASE_FILE_NAME: &str = "dictionary.db";
const TOTAL_LOOKUPS: &str = "total_lookups";
/// Oldest history rows beyond this count are pruned on insert.
const HISTORY_LIMIT: i64 = 10_000;

/// Aggregate usage counters. `local_entries` is filled in by the resolver,
/// the store itself knows nothing about the local dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_lookups: u64,
    pub local_hits: u64,
    pub cache_hits: u64,
    pub generated_count: u64,
    pub stored_records: u64,
    pub local_entries: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub word: String,
    pub source: Source,
    pub looked_up_at: DateTime<Utc>,
}

/// Durable storage keyed by normalized word.
pub trait RecordStore: Send + Sync {
    fn get(&self, word: &str) -> Result<Option<TranslationRecord>, StoreError>;

    /// Insert or overwrite the record for `record.word`.
    fn upsert(&self, record: &TranslationRecord) -> Result<(), StoreError>;

    /// Count one successful lookup served by `tier` and append it to history.
    fn record_lookup(&self, word: &str, tier: Tier) -> Result<(), StoreError>;

    fn statistics(&self) -> Result<Statistics, StoreError>;

    /// Most recent successful lookups, newest first.
    fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError>;
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
    history_limit: i64,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    pub fn default_path() -> anyhow::Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .context("Failed to find data directory")?
            .join(APP_NAME);
        Ok(data_dir.join(DATABASE_FILE_NAME))
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS entries (
                word TEXT PRIMARY KEY,
                translated_text TEXT NOT NULL,
                pronunciation TEXT NOT NULL DEFAULT '',
                part_of_speech TEXT NOT NULL,
                definition TEXT NOT NULL,
                examples TEXT NOT NULL DEFAULT '[]',
                source TEXT NOT NULL,
                resolved_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS counters (
                name TEXT PRIMARY KEY,
                value INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY,
                word TEXT NOT NULL,
                source TEXT NOT NULL,
                looked_up_at TEXT NOT NULL
            );",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            history_limit: HISTORY_LIMIT,
        })
    }

    #[cfg(test)]
    fn with_history_limit(mut self, limit: i64) -> Self {
        self.history_limit = limit;
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl RecordStore for SqliteStore {
    fn get(&self, word: &str) -> Result<Option<TranslationRecord>, StoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT word, translated_text, pronunciation, part_of_speech,
                        definition, examples, source, resolved_at
                 FROM entries WHERE word = ?1",
                params![word],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, String>(7)?,
                    ))
                },
            )
            .optional()?;

        let Some((
            word,
            translated_text,
            pronunciation,
            part_of_speech,
            definition,
            examples,
            source,
            resolved_at,
        )) = row
        else {
            return Ok(None);
        };

        Ok(Some(TranslationRecord {
            word,
            translated_text,
            pronunciation,
            part_of_speech,
            definition,
            examples: serde_json::from_str(&examples)?,
            source: Source::parse(&source)
                .ok_or_else(|| StoreError::Corrupt(format!("unknown source '{}'", source)))?,
            resolved_at: parse_timestamp(&resolved_at)?,
        }))
    }

    fn upsert(&self, record: &TranslationRecord) -> Result<(), StoreError> {
        let examples = serde_json::to_string(&record.examples)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO entries
                (word, translated_text, pronunciation, part_of_speech,
                 definition, examples, source, resolved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.word,
                record.translated_text,
                record.pronunciation,
                record.part_of_speech,
                record.definition,
                examples,
                record.source.as_str(),
                record.resolved_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn record_lookup(&self, word: &str, tier: Tier) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        for name in [TOTAL_LOOKUPS, tier.counter_name()] {
            tx.execute(
                "INSERT INTO counters (name, value) VALUES (?1, 1)
                 ON CONFLICT(name) DO UPDATE SET value = value + 1",
                params![name],
            )?;
        }

        tx.execute(
            "INSERT INTO history (word, source, looked_up_at) VALUES (?1, ?2, ?3)",
            params![word, tier.source().as_str(), Utc::now().to_rfc3339()],
        )?;
        tx.execute(
            "DELETE FROM history WHERE id <= (SELECT MAX(id) FROM history) - ?1",
            params![self.history_limit],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn statistics(&self) -> Result<Statistics, StoreError> {
        let conn = self.lock()?;
        let mut stats = Statistics::default();

        let mut stmt = conn.prepare("SELECT name, value FROM counters")?;
        let counters = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        for counter in counters {
            let (name, value) = counter?;
            let value = value.max(0) as u64;
            match name.as_str() {
                TOTAL_LOOKUPS => stats.total_lookups = value,
                "local_hits" => stats.local_hits = value,
                "cache_hits" => stats.cache_hits = value,
                "generated_count" => stats.generated_count = value,
                other => tracing::debug!("Ignoring unknown counter '{}'", other),
            }
        }

        let stored: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        stats.stored_records = stored.max(0) as u64;

        Ok(stats)
    }

    fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT word, source, looked_up_at FROM history ORDER BY id DESC LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (word, source, looked_up_at) = row?;
            entries.push(HistoryEntry {
                word,
                source: Source::parse(&source)
                    .ok_or_else(|| StoreError::Corrupt(format!("unknown source '{}'", source)))?,
                looked_up_at: parse_timestamp(&looked_up_at)?,
            });
        }
        Ok(entries)
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp '{}': {}", s, e)))
}
