//! Two-tier word resolution
//!
//! A lookup walks the tiers in a fixed order and stops at the first hit:
//!
//! 1. local dictionary (`Tier::Local`)
//! 2. previously generated entries in the store (`Tier::Persisted`)
//! 3. the generative fallback, written through to the store (`Tier::Generated`)
//!
//! Normalization happens before any tier is touched. A failure anywhere is
//! surfaced as a [`LookupError`]; no placeholder record is ever produced.
//! Two concurrent misses on the same word may both reach the fallback; the
//! later upsert wins.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::dictionary::LocalDictionary;
use super::error::LookupError;
use super::llm::Fallback;
use super::record::{Source, Tier, TranslationRecord};
use super::store::{HistoryEntry, RecordStore, Statistics};
use crate::utils::normalize_word;

#[derive(Debug, Clone)]
pub struct Resolution {
    pub record: TranslationRecord,
    pub tier: Tier,
}

pub struct Resolver {
    dictionary: Arc<LocalDictionary>,
    store: Arc<dyn RecordStore>,
    fallback: Box<dyn Fallback>,
}

impl Resolver {
    pub fn new(
        dictionary: Arc<LocalDictionary>,
        store: Arc<dyn RecordStore>,
        fallback: Box<dyn Fallback>,
    ) -> Self {
        Self {
            dictionary,
            store,
            fallback,
        }
    }

    pub fn resolve(&self, query: &str) -> Result<Resolution, LookupError> {
        let word = normalize_word(query);
        if word.is_empty() {
            return Err(LookupError::InvalidInput("word cannot be empty".to_string()));
        }

        let resolution = self.resolve_normalized(&word)?;
        debug!("Resolved '{}' via {} tier", word, resolution.tier);

        // Counters are bookkeeping; the caller still gets the record.
        if let Err(e) = self.store.record_lookup(&word, resolution.tier) {
            warn!("Failed to record lookup of '{}': {}", word, e);
        }

        Ok(resolution)
    }

    fn resolve_normalized(&self, word: &str) -> Result<Resolution, LookupError> {
        if let Some(record) = self.dictionary.lookup(word) {
            return Ok(Resolution {
                record,
                tier: Tier::Local,
            });
        }

        if let Some(record) = self.read_persisted(word)? {
            return Ok(Resolution {
                record,
                tier: Tier::Persisted,
            });
        }

        let record = self.generate(word)?;
        Ok(Resolution {
            record,
            tier: Tier::Generated,
        })
    }

    fn read_persisted(&self, word: &str) -> Result<Option<TranslationRecord>, LookupError> {
        self.store.get(word).map_err(|e| {
            error!("Store read for '{}' failed, not falling back: {}", word, e);
            LookupError::from(e)
        })
    }

    fn generate(&self, word: &str) -> Result<TranslationRecord, LookupError> {
        info!("'{}' not found locally, invoking generative fallback", word);

        let mut record = self.fallback.resolve(word).map_err(|e| {
            warn!("Generation failed for '{}': {}", word, e);
            LookupError::from(e)
        })?;

        // The store key and provenance belong to this tier, not the fallback.
        if record.word != word || record.source != Source::Generated {
            debug!(
                "Fallback returned word='{}' source={} for '{}', overriding",
                record.word, record.source, word
            );
        }
        record.word = word.to_string();
        record.source = Source::Generated;

        self.store.upsert(&record).map_err(|e| {
            error!("Failed to persist generated entry for '{}': {}", word, e);
            LookupError::from(e)
        })?;

        Ok(record)
    }

    /// Store counters plus the local dictionary size.
    pub fn statistics(&self) -> Result<Statistics, LookupError> {
        let mut stats = self.store.statistics()?;
        stats.local_entries = self.dictionary.len() as u64;
        Ok(stats)
    }

    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>, LookupError> {
        Ok(self.store.recent(limit)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::error::{GenerationError, StoreError};
    use crate::lookup::schema::{self, SchemaError};
    use crate::lookup::store::SqliteStore;
    use chrono::Utc;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behavior {
        WellFormed,
        TimesOut,
        MissingDefinition,
    }

    struct MockFallback {
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
    }

    impl Fallback for MockFallback {
        fn resolve(&self, word: &str) -> Result<TranslationRecord, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let payload = match self.behavior {
                Behavior::WellFormed => json!({
                    "translation": "আকস্মিক সৌভাগ্য",
                    "pronunciation": "ˌserənˈdɪpɪti",
                    "part_of_speech": "noun",
                    "definition": "Finding good things by chance.",
                    "examples": ["Meeting her was pure serendipity."]
                }),
                Behavior::TimesOut => {
                    return Err(GenerationError::Upstream("timed out".to_string()));
                }
                Behavior::MissingDefinition => json!({
                    "translation": "আকস্মিক সৌভাগ্য",
                    "part_of_speech": "noun"
                }),
            };
            Ok(schema::validate(word, &payload, Source::Generated, Utc::now())?)
        }
    }

    struct Harness {
        resolver: Resolver,
        store: Arc<SqliteStore>,
        calls: Arc<AtomicUsize>,
    }

    fn harness(behavior: Behavior) -> Harness {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let calls = Arc::new(AtomicUsize::new(0));
        let fallback = MockFallback {
            behavior,
            calls: Arc::clone(&calls),
        };
        let resolver = Resolver::new(
            Arc::new(LocalDictionary::seeded()),
            store.clone(),
            Box::new(fallback),
        );
        Harness {
            resolver,
            store,
            calls,
        }
    }

    /// Store whose reads and writes always fail.
    struct BrokenStore;

    impl RecordStore for BrokenStore {
        fn get(&self, _word: &str) -> Result<Option<TranslationRecord>, StoreError> {
            Err(StoreError::Corrupt("disk on fire".to_string()))
        }
        fn upsert(&self, _record: &TranslationRecord) -> Result<(), StoreError> {
            Err(StoreError::Corrupt("disk on fire".to_string()))
        }
        fn record_lookup(&self, _word: &str, _tier: Tier) -> Result<(), StoreError> {
            Err(StoreError::Corrupt("disk on fire".to_string()))
        }
        fn statistics(&self) -> Result<Statistics, StoreError> {
            Err(StoreError::Corrupt("disk on fire".to_string()))
        }
        fn recent(&self, _limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
            Err(StoreError::Corrupt("disk on fire".to_string()))
        }
    }

    #[test]
    fn test_local_word_never_reaches_fallback() {
        let h = harness(Behavior::WellFormed);
        let resolution = h.resolver.resolve("hello").unwrap();

        assert_eq!(resolution.tier, Tier::Local);
        assert_eq!(resolution.record.source, Source::Local);
        assert_eq!(resolution.record.translated_text, "হ্যালো / নমস্কার");
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
        assert!(h.store.get("hello").unwrap().is_none());
    }

    #[test]
    fn test_every_local_word_returns_its_record() {
        let h = harness(Behavior::WellFormed);
        let dict = LocalDictionary::seeded();

        for word in dict.words() {
            let expected = dict.lookup(word).unwrap();
            let got = h.resolver.resolve(word).unwrap().record;
            assert_eq!(
                TranslationRecord {
                    resolved_at: expected.resolved_at,
                    ..got
                },
                expected
            );
        }
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unknown_word_is_generated_and_persisted() {
        let h = harness(Behavior::WellFormed);
        let resolution = h.resolver.resolve("serendipity").unwrap();

        assert_eq!(resolution.tier, Tier::Generated);
        assert_eq!(resolution.record.source, Source::Generated);
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);

        let stored = h.store.get("serendipity").unwrap().unwrap();
        assert_eq!(stored.translated_text, "আকস্মিক সৌভাগ্য");
    }

    #[test]
    fn test_second_lookup_hits_store() {
        let h = harness(Behavior::WellFormed);
        let first = h.resolver.resolve("serendipity").unwrap();
        let second = h.resolver.resolve("serendipity").unwrap();

        assert_eq!(second.tier, Tier::Persisted);
        assert_eq!(second.record.source, Source::Generated);
        assert_eq!(second.record.translated_text, first.record.translated_text);
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_variants_share_one_entry() {
        let h = harness(Behavior::WellFormed);
        h.resolver.resolve("Serendipity").unwrap();
        let padded = h.resolver.resolve("  SERENDIPITY \t").unwrap();

        assert_eq!(padded.tier, Tier::Persisted);
        assert_eq!(padded.record.word, "serendipity");
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);

        let local = h.resolver.resolve("  HeLLo ").unwrap();
        assert_eq!(local.tier, Tier::Local);
    }

    #[test]
    fn test_blank_input_rejected_before_any_tier() {
        let h = harness(Behavior::WellFormed);
        let err = h.resolver.resolve("   ").unwrap_err();

        assert!(matches!(err, LookupError::InvalidInput(_)));
        assert_eq!(err.kind(), "invalid_input");
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.resolver.statistics().unwrap().total_lookups, 0);
    }

    #[test]
    fn test_blank_input_never_touches_store() {
        let resolver = Resolver::new(
            Arc::new(LocalDictionary::seeded()),
            Arc::new(BrokenStore),
            Box::new(MockFallback {
                behavior: Behavior::WellFormed,
                calls: Arc::new(AtomicUsize::new(0)),
            }),
        );
        assert!(matches!(
            resolver.resolve("\n\t ").unwrap_err(),
            LookupError::InvalidInput(_)
        ));
    }

    #[test]
    fn test_upstream_failure_persists_nothing() {
        let h = harness(Behavior::TimesOut);
        let err = h.resolver.resolve("serendipity").unwrap_err();

        assert!(matches!(err, LookupError::UpstreamUnavailable(_)));
        assert_eq!(err.kind(), "upstream_unavailable");
        assert!(h.store.get("serendipity").unwrap().is_none());
        assert_eq!(h.resolver.statistics().unwrap().total_lookups, 0);
    }

    #[test]
    fn test_schema_failure_persists_nothing() {
        let h = harness(Behavior::MissingDefinition);
        let err = h.resolver.resolve("serendipity").unwrap_err();

        match &err {
            LookupError::SchemaValidation(SchemaError { issues }) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].field, "definition");
            }
            other => panic!("expected schema error, got {:?}", other),
        }
        assert!(h.store.get("serendipity").unwrap().is_none());
    }

    #[test]
    fn test_store_read_failure_does_not_fall_back() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = Resolver::new(
            Arc::new(LocalDictionary::seeded()),
            Arc::new(BrokenStore),
            Box::new(MockFallback {
                behavior: Behavior::WellFormed,
                calls: Arc::clone(&calls),
            }),
        );

        let err = resolver.resolve("serendipity").unwrap_err();
        assert!(matches!(err, LookupError::Persistence(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // Local hits do not depend on the store; counter failures are only logged.
        let local = resolver.resolve("water").unwrap();
        assert_eq!(local.tier, Tier::Local);
    }

    /// Echoes the query back un-normalized and mislabels the provenance.
    struct SloppyFallback {
        calls: Arc<AtomicUsize>,
    }

    impl Fallback for SloppyFallback {
        fn resolve(&self, word: &str) -> Result<TranslationRecord, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TranslationRecord {
                word: format!("{} ", word.to_uppercase()),
                translated_text: "আকস্মিক সৌভাগ্য".to_string(),
                pronunciation: String::new(),
                part_of_speech: "noun".to_string(),
                definition: "Finding good things by chance.".to_string(),
                examples: Vec::new(),
                source: Source::Local,
                resolved_at: Utc::now(),
            })
        }
    }

    #[test]
    fn test_generated_record_keyed_and_labelled_by_resolver() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = Resolver::new(
            Arc::new(LocalDictionary::seeded()),
            store.clone(),
            Box::new(SloppyFallback {
                calls: Arc::clone(&calls),
            }),
        );

        let first = resolver.resolve("serendipity").unwrap();
        assert_eq!(first.record.word, "serendipity");
        assert_eq!(first.record.source, Source::Generated);

        let second = resolver.resolve("serendipity").unwrap();
        assert_eq!(second.tier, Tier::Persisted);
        assert_eq!(second.record.source, Source::Generated);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stored = store.get("serendipity").unwrap().unwrap();
        assert_eq!(stored.source, Source::Generated);
        assert_eq!(store.statistics().unwrap().stored_records, 1);
    }

    #[test]
    fn test_statistics_track_tiers() {
        let h = harness(Behavior::WellFormed);
        h.resolver.resolve("hello").unwrap();
        h.resolver.resolve("book").unwrap();
        h.resolver.resolve("serendipity").unwrap();
        h.resolver.resolve("serendipity").unwrap();

        let stats = h.resolver.statistics().unwrap();
        assert_eq!(stats.total_lookups, 4);
        assert_eq!(stats.local_hits, 2);
        assert_eq!(stats.generated_count, 1);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.stored_records, 1);
        assert_eq!(stats.local_entries, 15);

        let recent = h.resolver.recent(10).unwrap();
        assert_eq!(recent.len(), 4);
        assert_eq!(recent[0].word, "serendipity");
        assert_eq!(recent[3].word, "hello");
    }

    #[test]
    fn test_parallel_lookups_of_distinct_words() {
        use rayon::prelude::*;

        let h = harness(Behavior::WellFormed);
        let words = ["alpha", "beta", "gamma", "delta", "hello", "water"];
        let results: Vec<_> = words.par_iter().map(|w| h.resolver.resolve(w)).collect();

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(h.calls.load(Ordering::SeqCst), 4);
        assert_eq!(h.resolver.statistics().unwrap().stored_records, 4);
    }
}
