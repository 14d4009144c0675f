//! A [`Generator`] that replays scripted results.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use reskill_core::genai::{GenerationError, Generator};

/// Replays queued results in order and records every prompt.
///
/// An exhausted script answers with a 500 status error.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<(String, bool)>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let generator = Self::new();
        for reply in replies {
            generator.push_ok(reply);
        }
        generator
    }

    pub fn push_ok(&self, text: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
    }

    pub fn push_status(&self, status: u16, body: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Err(GenerationError::Status {
            status,
            body: body.into(),
        }));
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }

    /// How many calls asked for JSON output.
    pub fn json_calls(&self) -> usize {
        self.prompts.lock().unwrap().iter().filter(|(_, json)| *json).count()
    }

    fn next(&self, prompt: &str, json: bool) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push((prompt.to_string(), json));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(GenerationError::Status {
                    status: 500,
                    body: "script exhausted".to_string(),
                })
            })
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.next(prompt, false)
    }

    async fn generate_json(&self, prompt: &str) -> Result<String, GenerationError> {
        self.next(prompt, true)
    }
}
