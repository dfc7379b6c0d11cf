use super::{Message, TextGenerator};
use anyhow::Result;
use async_trait::async_trait;
use log::{error, warn};
use std::time::Duration;

/// Retries transient backend failures with a fixed delay.
///
/// After `retry_count + 1` failed attempts the call resolves to an empty
/// string instead of an error.
#[derive(Debug)]
pub struct RetryingGenerator {
    inner: Box<dyn TextGenerator>,
    retry_count: usize,
    retry_delay: Duration,
}

impl RetryingGenerator {
    pub fn new(inner: Box<dyn TextGenerator>, retry_count: usize, retry_delay: Duration) -> Self {
        Self {
            inner,
            retry_count,
            retry_delay,
        }
    }
}

#[async_trait]
impl TextGenerator for RetryingGenerator {
    async fn generate(&self, conversation: &[Message]) -> Result<String> {
        let attempts = self.retry_count + 1;
        for attempt in 1..=attempts {
            match self.inner.generate(conversation).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!("Generation attempt {}/{} failed: {:#}", attempt, attempts, e);
                    if attempt < attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }
        error!("Generation failed after {} attempts, returning empty text", attempts);
        Ok(String::new())
    }
}
