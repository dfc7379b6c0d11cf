use super::{base_url, http_client, Message, TextGenerator};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub stream: bool,
}

#[derive(Debug)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    stream: bool,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(config: &OllamaConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url(&config.base_url)?,
            model: config.model.clone(),
            stream: config.stream,
            client: http_client(timeout)?,
        })
    }
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    message: OllamaMessageResponse,
}

#[derive(Deserialize)]
struct OllamaMessageResponse {
    content: String,
}

/// One NDJSON line of a streamed chat response.
#[derive(Deserialize)]
struct OllamaChunk {
    message: Option<OllamaMessageResponse>,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

/// Appends the content of one streamed line. Returns true once the stream
/// reports it is done.
fn push_chunk(line: &[u8], output: &mut String) -> Result<bool> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return Ok(false);
    }
    let chunk: OllamaChunk =
        serde_json::from_slice(line).context("Failed to parse Ollama stream chunk")?;
    if let Some(err) = chunk.error {
        return Err(anyhow!("Ollama stream error: {}", err));
    }
    if let Some(message) = chunk.message {
        output.push_str(&message.content);
    }
    Ok(chunk.done)
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, conversation: &[Message]) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);

        let request_body = OllamaRequest {
            model: &self.model,
            messages: conversation,
            stream: self.stream,
        };

        let resp = self.client.post(&url).json(&request_body).send().await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await?;
            return Err(anyhow!("Ollama API error: {}", error_text));
        }

        if !self.stream {
            let result: OllamaResponse = resp.json().await?;
            return Ok(result.message.content);
        }

        let mut output = String::new();
        let mut buffer: Vec<u8> = Vec::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            buffer.extend_from_slice(&chunk?);
            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                if push_chunk(&line, &mut output)? {
                    return Ok(output);
                }
            }
        }
        push_chunk(&buffer, &mut output)?;
        Ok(output)
    }
}
