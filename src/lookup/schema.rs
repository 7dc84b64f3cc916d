//! Entry schema validation for untrusted payloads
//!
//! Model output and curated dictionary files both arrive as loosely shaped
//! JSON. Everything passes through [`validate`] before it can become a
//! [`TranslationRecord`]; required fields are never filled in with guesses.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::LazyLock;

use super::record::{Source, TranslationRecord};

const TRANSLATION_KEYS: &[&str] = &["translatedText", "bengaliTranslation", "translation", "bengali"];
const PART_OF_SPEECH_KEYS: &[&str] = &["partOfSpeech", "part_of_speech"];
const DEFINITION_KEYS: &[&str] = &["definition"];
const PRONUNCIATION_KEYS: &[&str] = &["pronunciation"];
const EXAMPLES_KEYS: &[&str] = &["examples"];

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Problem {
    Missing,
    Empty,
    WrongType,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("missing"),
            Self::Empty => f.write_str("empty"),
            Self::WrongType => f.write_str("wrong type"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub problem: Problem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub issues: Vec<FieldIssue>,
}

impl SchemaError {
    fn single(field: &'static str, problem: Problem) -> Self {
        Self {
            issues: vec![FieldIssue { field, problem }],
        }
    }

    #[cfg(test)]
    pub fn fields(&self) -> Vec<&'static str> {
        self.issues.iter().map(|i| i.field).collect()
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .issues
            .iter()
            .map(|i| format!("{} ({})", i.field, i.problem))
            .collect();
        write!(f, "schema validation failed: {}", parts.join(", "))
    }
}

impl std::error::Error for SchemaError {}

/// Check `payload` against the canonical record shape and build a record for
/// `word`. All invalid fields are reported together.
pub fn validate(
    word: &str,
    payload: &Value,
    source: Source,
    resolved_at: DateTime<Utc>,
) -> Result<TranslationRecord, SchemaError> {
    let Some(obj) = payload.as_object() else {
        return Err(SchemaError::single("payload", Problem::WrongType));
    };

    let mut issues = Vec::new();

    if word.trim().is_empty() {
        issues.push(FieldIssue {
            field: "word",
            problem: Problem::Empty,
        });
    }

    let mut required = |field: &'static str, keys: &[&str]| -> String {
        match coerce_text(first_present(obj, keys)) {
            Ok(text) => text,
            Err(problem) => {
                issues.push(FieldIssue { field, problem });
                String::new()
            }
        }
    };

    let translated_text = required("translatedText", TRANSLATION_KEYS);
    let part_of_speech = required("partOfSpeech", PART_OF_SPEECH_KEYS);
    let definition = required("definition", DEFINITION_KEYS);

    if !issues.is_empty() {
        return Err(SchemaError { issues });
    }

    let pronunciation = coerce_text(first_present(obj, PRONUNCIATION_KEYS)).unwrap_or_default();
    let examples = coerce_examples(first_present(obj, EXAMPLES_KEYS));

    Ok(TranslationRecord {
        word: word.to_string(),
        translated_text,
        pronunciation,
        part_of_speech,
        definition,
        examples,
        source,
        resolved_at,
    })
}

/// Pull the first JSON object out of free-form model text. Accepts bare JSON,
/// fenced code blocks, and objects embedded in surrounding prose.
pub fn extract_json(text: &str) -> Result<Value, SchemaError> {
    let text = text.trim();

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(text) {
        return Ok(value);
    }

    if let Some(caps) = FENCED_JSON.captures(text) {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(&caps[1]) {
            return Ok(value);
        }
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(&text[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err(SchemaError::single("payload", Problem::WrongType))
}

fn first_present<'a>(obj: &'a serde_json::Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

fn coerce_text(value: Option<&Value>) -> Result<String, Problem> {
    match value {
        None | Some(Value::Null) => Err(Problem::Missing),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                Err(Problem::Empty)
            } else {
                Ok(s.to_string())
            }
        }
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(Value::Array(_)) | Some(Value::Object(_)) => Err(Problem::WrongType),
    }
}

fn coerce_examples(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| coerce_text(Some(item)).ok())
            .collect(),
        Some(single @ Value::String(_)) => coerce_text(Some(single)).into_iter().collect(),
        _ => Vec::new(),
    }
}
