use crate::core::error::StoryError;
use anyhow::Result;
use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;

pub mod gemini;
pub mod koboldcpp;
pub mod ollama;
pub mod openai;
pub mod retry;
pub mod tgi;

pub use retry::RetryingGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A text-generation backend.
///
/// The whole conversation is sent on every call. An empty string is how a
/// failed generation surfaces once retries are exhausted.
#[async_trait]
pub trait TextGenerator: Send + Sync + Debug {
    async fn generate(&self, conversation: &[Message]) -> Result<String>;
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LlmConfig {
    pub provider: String, // "openai", "ollama", "gemini", "tgi" or "koboldcpp"
    #[serde(default = "default_retry_count")]
    pub retry_count: usize,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    pub openai: Option<openai::OpenAIConfig>,
    pub ollama: Option<ollama::OllamaConfig>,
    pub gemini: Option<gemini::GeminiConfig>,
    pub tgi: Option<tgi::TgiConfig>,
    pub koboldcpp: Option<koboldcpp::KoboldCppConfig>,
}

fn default_retry_count() -> usize {
    3
}
fn default_retry_delay() -> u64 {
    5
}
fn default_request_timeout() -> u64 {
    120
}

pub fn create_generator(config: &LlmConfig) -> Result<Box<dyn TextGenerator>> {
    info!("Initializing text generator for provider: {}", config.provider);
    let timeout = Duration::from_secs(config.request_timeout_seconds);
    let backend: Box<dyn TextGenerator> = match config.provider.as_str() {
        "openai" => {
            let cfg = config.openai.as_ref().ok_or_else(|| missing("OpenAI"))?;
            Box::new(openai::OpenAIClient::new(cfg, timeout)?)
        }
        "ollama" => {
            let cfg = config.ollama.as_ref().ok_or_else(|| missing("Ollama"))?;
            Box::new(ollama::OllamaClient::new(cfg, timeout)?)
        }
        "gemini" => {
            let cfg = config.gemini.as_ref().ok_or_else(|| missing("Gemini"))?;
            Box::new(gemini::GeminiClient::new(cfg, timeout)?)
        }
        "tgi" => {
            let cfg = config.tgi.as_ref().ok_or_else(|| missing("TGI"))?;
            Box::new(tgi::TgiClient::new(cfg, timeout)?)
        }
        "koboldcpp" => {
            let cfg = config.koboldcpp.as_ref().ok_or_else(|| missing("KoboldCpp"))?;
            Box::new(koboldcpp::KoboldCppClient::new(cfg, timeout)?)
        }
        other => return Err(StoryError::UnknownBackend(other.to_string()).into()),
    };

    Ok(Box::new(RetryingGenerator::new(
        backend,
        config.retry_count,
        Duration::from_secs(config.retry_delay_seconds),
    )))
}

fn missing(name: &str) -> anyhow::Error {
    StoryError::MissingBackendConfig(name.to_string()).into()
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Checks a configured base URL and strips its trailing slash.
pub(crate) fn base_url(raw: &str) -> Result<String> {
    url::Url::parse(raw).map_err(|e| StoryError::InvalidBackendUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    Ok(raw.trim_end_matches('/').to_string())
}

/// Flattens a conversation into the `### USER:` / `### ASSISTANT:` layout
/// used by plain completion endpoints. System turns are left out.
pub(crate) fn instruct_prompt(conversation: &[Message]) -> String {
    let mut prompt = String::new();
    for message in conversation {
        let tag = match message.role {
            Role::User => "### USER: ",
            Role::Assistant => "### ASSISTANT: ",
            Role::System => continue,
        };
        prompt.push_str(tag);
        prompt.push_str(&message.content);
        prompt.push('\n');
    }
    prompt.push_str("### ASSISTANT: ");
    prompt
}
