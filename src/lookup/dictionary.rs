//! Local dictionary of curated entries
//!
//! Built once at startup from the seed list (optionally extended from a
//! curated JSON file) and handed to the resolver. There is no mutation API
//! once it has been shared.

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::record::{Source, TranslationRecord};
use super::schema;
use crate::utils::normalize_word;

struct SeedEntry {
    word: &'static str,
    bengali: &'static str,
    pronunciation: &'static str,
    definition: &'static str,
    part_of_speech: &'static str,
    examples: &'static [&'static str],
}

const SEED_ENTRIES: &[SeedEntry] = &[
    SeedEntry {
        word: "hello",
        bengali: "হ্যালো / নমস্কার",
        pronunciation: "hæloʊ",
        definition: "A greeting; an expression of welcome or salutation",
        part_of_speech: "interjection",
        examples: &[
            "Hello, how are you today?",
            "She said hello to everyone at the party.",
        ],
    },
    SeedEntry {
        word: "book",
        bengali: "বই / পুস্তক",
        pronunciation: "bʊk",
        definition: "A written or printed work consisting of pages bound together",
        part_of_speech: "noun",
        examples: &[
            "I love reading a good book before bed.",
            "The library has thousands of books.",
        ],
    },
    SeedEntry {
        word: "water",
        bengali: "পানি / জল",
        pronunciation: "ˈwɔːtər",
        definition: "A clear, colorless, odorless liquid essential for life",
        part_of_speech: "noun",
        examples: &[
            "Drink plenty of water to stay hydrated.",
            "The water in the lake is crystal clear.",
        ],
    },
    SeedEntry {
        word: "food",
        bengali: "খাবার / আহার",
        pronunciation: "fuːd",
        definition: "Any nutritious substance consumed to sustain life and growth",
        part_of_speech: "noun",
        examples: &[
            "The food at this restaurant is delicious.",
            "We need to buy food for dinner.",
        ],
    },
    SeedEntry {
        word: "home",
        bengali: "বাড়ি / ঘর",
        pronunciation: "hoʊm",
        definition: "The place where one lives permanently",
        part_of_speech: "noun",
        examples: &["There's no place like home.", "I'm going home after work."],
    },
    SeedEntry {
        word: "love",
        bengali: "ভালোবাসা / প্রেম",
        pronunciation: "lʌv",
        definition: "An intense feeling of deep affection",
        part_of_speech: "noun/verb",
        examples: &[
            "I love spending time with my family.",
            "Love conquers all obstacles.",
        ],
    },
    SeedEntry {
        word: "friend",
        bengali: "বন্ধু / বান্ধব",
        pronunciation: "frend",
        definition: "A person whom one knows and with whom one has a bond of mutual affection",
        part_of_speech: "noun",
        examples: &[
            "She is my best friend since childhood.",
            "A true friend is always there for you.",
        ],
    },
    SeedEntry {
        word: "school",
        bengali: "স্কুল / বিদ্যালয়",
        pronunciation: "skuːl",
        definition: "An institution for educating children",
        part_of_speech: "noun",
        examples: &[
            "Children go to school to learn.",
            "My school has excellent teachers.",
        ],
    },
    SeedEntry {
        word: "work",
        bengali: "কাজ / শ্রম",
        pronunciation: "wɜːrk",
        definition: "Activity involving mental or physical effort to achieve a purpose",
        part_of_speech: "noun/verb",
        examples: &[
            "I have a lot of work to finish today.",
            "Hard work pays off in the end.",
        ],
    },
    SeedEntry {
        word: "happy",
        bengali: "খুশি / আনন্দিত",
        pronunciation: "ˈhæpi",
        definition: "Feeling or showing pleasure or contentment",
        part_of_speech: "adjective",
        examples: &[
            "I am happy to see you again.",
            "The children look happy playing in the park.",
        ],
    },
    SeedEntry {
        word: "beautiful",
        bengali: "সুন্দর / রূপবান",
        pronunciation: "ˈbjuːtɪfəl",
        definition: "Pleasing the senses or mind aesthetically",
        part_of_speech: "adjective",
        examples: &["The sunset is absolutely beautiful.", "She has a beautiful voice."],
    },
    SeedEntry {
        word: "time",
        bengali: "সময় / কাল",
        pronunciation: "taɪm",
        definition: "The indefinite continued progress of existence",
        part_of_speech: "noun",
        examples: &["Time flies when you're having fun.", "What time is it now?"],
    },
    SeedEntry {
        word: "money",
        bengali: "টাকা / অর্থ",
        pronunciation: "ˈmʌni",
        definition: "A current medium of exchange in the form of coins and banknotes",
        part_of_speech: "noun",
        examples: &[
            "Money can't buy happiness.",
            "I need to save money for my vacation.",
        ],
    },
    SeedEntry {
        word: "family",
        bengali: "পরিবার / কুটুম্ব",
        pronunciation: "ˈfæməli",
        definition: "A group consisting of parents and children living together",
        part_of_speech: "noun",
        examples: &[
            "Family is the most important thing in life.",
            "We're having a family dinner tonight.",
        ],
    },
    SeedEntry {
        word: "health",
        bengali: "স্বাস্থ্য / আরোগ্য",
        pronunciation: "helθ",
        definition: "The state of being free from illness or injury",
        part_of_speech: "noun",
        examples: &[
            "Good health is more valuable than wealth.",
            "Regular exercise improves your health.",
        ],
    },
];

#[derive(Debug, Clone, Default)]
pub struct LocalDictionary {
    entries: HashMap<String, TranslationRecord>,
}

impl LocalDictionary {
    /// Dictionary holding only the built-in seed entries.
    pub fn seeded() -> Self {
        let now = Utc::now();
        let entries = SEED_ENTRIES
            .iter()
            .map(|seed| {
                let record = TranslationRecord {
                    word: seed.word.to_string(),
                    translated_text: seed.bengali.to_string(),
                    pronunciation: seed.pronunciation.to_string(),
                    part_of_speech: seed.part_of_speech.to_string(),
                    definition: seed.definition.to_string(),
                    examples: seed.examples.iter().map(|s| s.to_string()).collect(),
                    source: Source::Local,
                    resolved_at: now,
                };
                (seed.word.to_string(), record)
            })
            .collect();

        Self { entries }
    }

    /// Merge a curated entry file into the dictionary. The file holds a JSON
    /// array of objects, each with a `word` key plus the record fields.
    /// Entries failing validation are skipped. Returns the number merged.
    pub fn load_extra<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .context(format!("Failed to read dictionary file: {}", path.display()))?;
        let value: Value =
            serde_json::from_str(&content).context("Failed to parse dictionary file")?;
        let items = value
            .as_array()
            .context("Dictionary file must contain a JSON array of entries")?;

        let now = Utc::now();
        let mut merged = 0;

        for (idx, item) in items.iter().enumerate() {
            let word = item
                .get("word")
                .and_then(Value::as_str)
                .map(normalize_word)
                .unwrap_or_default();

            match schema::validate(&word, item, Source::Local, now) {
                Ok(record) => {
                    self.entries.insert(word, record);
                    merged += 1;
                }
                Err(e) => {
                    tracing::warn!("Skipping dictionary entry #{} ({}): {}", idx + 1, word, e);
                }
            }
        }

        Ok(merged)
    }

    /// Exact match on an already normalized word.
    pub fn lookup(&self, word: &str) -> Option<TranslationRecord> {
        self.entries.get(word).map(|record| TranslationRecord {
            resolved_at: Utc::now(),
            ..record.clone()
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Headwords in alphabetical order.
    pub fn words(&self) -> Vec<&str> {
        let mut words: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        words.sort_unstable();
        words
    }
}
