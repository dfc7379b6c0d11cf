//! KoboldCpp native generate API. Its OpenAI-compatible `/v1` route is
//! served by the `openai` provider instead.

use super::{base_url, http_client, instruct_prompt, Message, TextGenerator};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KoboldCppConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_max_length")]
    pub max_length: u32,
    #[serde(default = "default_max_context_length")]
    pub max_context_length: u32,
}

fn default_base_url() -> String {
    "http://localhost:5001".to_string()
}
fn default_max_length() -> u32 {
    1024
}
fn default_max_context_length() -> u32 {
    8192
}

#[derive(Debug)]
pub struct KoboldCppClient {
    base_url: String,
    max_length: u32,
    max_context_length: u32,
    client: reqwest::Client,
}

impl KoboldCppClient {
    pub fn new(config: &KoboldCppConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url(&config.base_url)?,
            max_length: config.max_length,
            max_context_length: config.max_context_length,
            client: http_client(timeout)?,
        })
    }
}

#[derive(Serialize)]
struct KoboldRequest {
    prompt: String,
    max_length: u32,
    max_context_length: u32,
}

#[derive(Deserialize)]
struct KoboldResponse {
    results: Vec<KoboldResult>,
}

#[derive(Deserialize)]
struct KoboldResult {
    text: String,
}

#[async_trait]
impl TextGenerator for KoboldCppClient {
    async fn generate(&self, conversation: &[Message]) -> Result<String> {
        let url = format!("{}/api/v1/generate", self.base_url);

        let request_body = KoboldRequest {
            prompt: instruct_prompt(conversation),
            max_length: self.max_length,
            max_context_length: self.max_context_length,
        };

        let resp = self.client.post(&url).json(&request_body).send().await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await?;
            return Err(anyhow!("KoboldCpp API error: {}", error_text));
        }

        let result: KoboldResponse = resp.json().await?;
        result
            .results
            .into_iter()
            .next()
            .map(|r| r.text)
            .ok_or_else(|| anyhow!("KoboldCpp response contained no results"))
    }
}
