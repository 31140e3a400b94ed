//! Answer generation
use std::sync::Arc;
use tracing::debug;

use crate::errors::{BakeError, Result};
use crate::llm::client::{ChatModel, ChatRequest};
use crate::types::UsageRecord;

/// Turns an assembled prompt into the recipe answer
pub struct AnswerGenerator {
    chat: Arc<dyn ChatModel>,
}

impl AnswerGenerator {
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }

    /// Ask `model` to answer `prompt`. The answer is the model text as is;
    /// a response without text is an error, never an empty answer.
    pub async fn generate(&self, prompt: &str, model: &str) -> Result<(String, UsageRecord)> {
        let completion = self.chat.complete(ChatRequest::prompt(model, prompt)).await?;

        let answer = completion
            .content
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| BakeError::EmptyCompletion {
                model: model.to_string(),
            })?;

        debug!(
            model,
            prompt_tokens = completion.usage.prompt_tokens,
            completion_tokens = completion.usage.completion_tokens,
            "answer generated"
        );
        Ok((answer, completion.usage))
    }
}
