//! Generative fallback: LLM API client and dictionary-entry synthesis

use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;

use super::error::GenerationError;
use super::record::{Source, TranslationRecord};
use super::schema;

/// One call plus at most one retry.
const MAX_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LlmProvider {
    OpenAI,
    Claude,
    Ollama,
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "openai" => Self::OpenAI,
            "claude" | "anthropic" => Self::Claude,
            "ollama" => Self::Ollama,
            _ => Self::OpenAI,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Claude => "claude",
            Self::Ollama => "ollama",
        }
    }

    pub fn default_base_url(&self) -> &str {
        match self {
            Self::OpenAI => "https://api.openai.com/v1",
            Self::Claude => "https://api.anthropic.com/v1",
            Self::Ollama => "http://localhost:11434",
        }
    }

    pub fn default_model(&self) -> &str {
        match self {
            Self::OpenAI => "gpt-4o-mini",
            Self::Claude => "claude-sonnet-4-20250514",
            Self::Ollama => "llama3",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl LlmConfig {
    pub fn new(provider: LlmProvider) -> Self {
        Self {
            base_url: provider.default_base_url().to_string(),
            model: provider.default_model().to_string(),
            provider,
            api_key: None,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    pub fn with_base_url(mut self, url: Option<String>) -> Self {
        if let Some(u) = url {
            self.base_url = u.trim_end_matches('/').to_string();
        }
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        if let Some(m) = model {
            self.model = m;
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Opaque text-in/text-out boundary to a generative model.
pub trait CompletionModel: Send + Sync {
    fn complete(&self, system: &str, user: &str) -> Result<String, GenerationError>;
}

/// Anything that can synthesize a record for a word the local tiers missed.
pub trait Fallback: Send + Sync {
    fn resolve(&self, word: &str) -> Result<TranslationRecord, GenerationError>;
}

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

pub struct LlmClient {
    config: LlmConfig,
    client: reqwest::blocking::Client,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    fn complete_openai_compatible(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        let api_key = self.config.api_key.as_ref().ok_or_else(|| {
            GenerationError::Misconfigured(format!(
                "no API key configured for {}",
                self.config.provider.name()
            ))
        })?;

        let request = OpenAIRequest {
            model: self.config.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: 0.3,
            response_format: (self.config.provider == LlmProvider::OpenAI)
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        let url = format!("{}/chat/completions", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .header("Authorization", format!("Bearer {}", api_key))
            .send()
            .map_err(|e| upstream("request to LLM API failed", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(GenerationError::Upstream(format!(
                "API request failed ({}): {}",
                status, body
            )));
        }

        let result: OpenAIResponse = response
            .json()
            .map_err(|e| upstream("failed to parse API response", e))?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| GenerationError::Upstream("no choices in API response".to_string()))
    }

    fn complete_ollama(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        let request = OllamaRequest {
            model: self.config.model.clone(),
            prompt: format!("{}\n\n{}", system, user),
            stream: false,
            format: "json",
        };

        let url = format!("{}/api/generate", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .map_err(|e| upstream("request to Ollama failed", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(GenerationError::Upstream(format!(
                "Ollama request failed ({}): {}",
                status, body
            )));
        }

        let result: OllamaResponse = response
            .json()
            .map_err(|e| upstream("failed to parse Ollama response", e))?;

        Ok(result.response)
    }
}

impl CompletionModel for LlmClient {
    fn complete(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        match self.config.provider {
            LlmProvider::OpenAI | LlmProvider::Claude => self.complete_openai_compatible(system, user),
            LlmProvider::Ollama => self.complete_ollama(system, user),
        }
    }
}

fn upstream(what: &str, err: reqwest::Error) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Upstream(format!("{}: timed out", what))
    } else {
        GenerationError::Upstream(format!("{}: {}", what, err))
    }
}

/// Builds dictionary entries by prompting a [`CompletionModel`] and
/// validating whatever comes back.
pub struct GenerativeResolver<M> {
    model: M,
    target_language: String,
    retry: bool,
    retry_delay: Duration,
}

impl<M: CompletionModel> GenerativeResolver<M> {
    pub fn new(model: M, target_language: &str) -> Self {
        Self {
            model,
            target_language: target_language.to_string(),
            retry: true,
            retry_delay: Duration::from_millis(250),
        }
    }

    pub fn with_retry(mut self, retry: bool, delay: Duration) -> Self {
        self.retry = retry;
        self.retry_delay = delay;
        self
    }

    fn build_system_prompt(&self) -> String {
        format!(
            "You are an expert English to {lang} dictionary. \
             Respond with a single JSON object and nothing else, using exactly these fields:\n\
             {{\n\
               \"translation\": \"{lang} translation in native script (common variants separated by ' / ')\",\n\
               \"pronunciation\": \"IPA pronunciation of the English word\",\n\
               \"part_of_speech\": \"grammatical category, e.g. noun, verb, adjective\",\n\
               \"definition\": \"one-sentence English definition\",\n\
               \"examples\": [\"1 to 3 short example sentences using the word\"]\n\
             }}",
            lang = self.target_language
        )
    }

    fn build_user_prompt(&self, word: &str) -> String {
        format!(
            "Create the dictionary entry for the English word or phrase \"{}\".",
            word
        )
    }

    fn call_with_retry(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        let attempts = if self.retry { MAX_ATTEMPTS } else { 1 };
        let mut attempt = 1;

        loop {
            match self.model.complete(system, user) {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    tracing::warn!("Model call failed (attempt {}/{}): {}", attempt, attempts, e);
                    thread::sleep(self.retry_delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl<M: CompletionModel> Fallback for GenerativeResolver<M> {
    fn resolve(&self, word: &str) -> Result<TranslationRecord, GenerationError> {
        let system = self.build_system_prompt();
        let user = self.build_user_prompt(word);

        let text = self.call_with_retry(&system, &user)?;
        let payload = schema::extract_json(&text)?;
        let record = schema::validate(word, &payload, Source::Generated, Utc::now())?;

        tracing::info!("Generated entry for '{}'", word);
        Ok(record)
    }
}
