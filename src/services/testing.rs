//! Scripted text generator shared by the service tests.

use crate::services::llm::{Message, Role, TextGenerator};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Answers by keyword found in the last user turn.
///
/// Each rule holds a queue of replies; the final reply repeats once the
/// queue is drained. Turns matching no rule get an empty string, the same
/// thing a backend that ran out of retries returns.
#[derive(Debug, Default)]
pub struct MockGenerator {
    rules: Mutex<Vec<(String, VecDeque<String>)>>,
    pub calls: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<I, S>(self, keyword: &str, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules
            .lock()
            .unwrap()
            .push((keyword.to_string(), replies.into_iter().map(Into::into).collect()));
        self
    }

    pub fn call_count(calls: &Arc<Mutex<Vec<Vec<Message>>>>, keyword: &str) -> usize {
        calls
            .lock()
            .unwrap()
            .iter()
            .filter(|conversation| last_user(conversation).contains(keyword))
            .count()
    }
}

fn last_user(conversation: &[Message]) -> &str {
    conversation
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .unwrap_or_default()
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, conversation: &[Message]) -> Result<String> {
        self.calls.lock().unwrap().push(conversation.to_vec());
        let prompt = last_user(conversation);
        let mut rules = self.rules.lock().unwrap();
        let reply = rules
            .iter_mut()
            .find(|(keyword, _)| prompt.contains(keyword.as_str()))
            .and_then(|(_, replies)| {
                if replies.len() > 1 {
                    replies.pop_front()
                } else {
                    replies.front().cloned()
                }
            });
        Ok(reply.unwrap_or_default())
    }
}
