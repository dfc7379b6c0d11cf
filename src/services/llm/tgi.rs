//! Hugging Face text-generation-inference endpoint.

use super::{base_url, http_client, instruct_prompt, Message, TextGenerator};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TgiConfig {
    /// Full generation URL, e.g. `http://127.0.0.1:8080/generate`.
    pub endpoint: String,
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,
}

fn default_max_new_tokens() -> u32 {
    2048
}

#[derive(Debug)]
pub struct TgiClient {
    endpoint: String,
    max_new_tokens: u32,
    client: reqwest::Client,
}

impl TgiClient {
    pub fn new(config: &TgiConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            endpoint: base_url(&config.endpoint)?,
            max_new_tokens: config.max_new_tokens,
            client: http_client(timeout)?,
        })
    }
}

#[derive(Serialize)]
struct TgiRequest {
    inputs: String,
    parameters: TgiParameters,
}

#[derive(Serialize)]
struct TgiParameters {
    max_new_tokens: u32,
    do_sample: bool,
}

#[derive(Deserialize)]
struct TgiGenerated {
    generated_text: String,
}

/// `/generate` answers with an object, the root route with a list.
#[derive(Deserialize)]
#[serde(untagged)]
enum TgiResponse {
    Single(TgiGenerated),
    Batch(Vec<TgiGenerated>),
}

impl TgiResponse {
    fn into_text(self) -> Option<String> {
        match self {
            TgiResponse::Single(g) => Some(g.generated_text),
            TgiResponse::Batch(list) => list.into_iter().next().map(|g| g.generated_text),
        }
    }
}

#[async_trait]
impl TextGenerator for TgiClient {
    async fn generate(&self, conversation: &[Message]) -> Result<String> {
        let request_body = TgiRequest {
            inputs: instruct_prompt(conversation),
            parameters: TgiParameters {
                max_new_tokens: self.max_new_tokens,
                do_sample: true,
            },
        };

        let resp = self.client.post(&self.endpoint).json(&request_body).send().await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await?;
            return Err(anyhow!("TGI API error: {}", error_text));
        }

        let result: TgiResponse = resp.json().await?;
        result
            .into_text()
            .ok_or_else(|| anyhow!("TGI response contained no generations"))
    }
}
