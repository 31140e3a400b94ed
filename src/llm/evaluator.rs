//! LLM-as-a-judge relevance evaluation
//!
//! The judge must answer with a JSON object holding exactly `Relevance`
//! and `Explanation`. Anything else becomes an UNKNOWN verdict; the call's
//! usage is kept either way.

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::errors::Result;
use crate::llm::client::{ChatModel, ChatRequest};
use crate::types::{Evaluation, Relevance, UsageRecord};

/// Explanation attached to an UNKNOWN verdict
pub const PARSE_FAILURE_EXPLANATION: &str = "Failed to parse evaluation";

/// The three verdicts a judge may give
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum JudgedRelevance {
    Relevant,
    PartlyRelevant,
    NonRelevant,
}

impl From<JudgedRelevance> for Relevance {
    fn from(judged: JudgedRelevance) -> Self {
        match judged {
            JudgedRelevance::Relevant => Relevance::Relevant,
            JudgedRelevance::PartlyRelevant => Relevance::PartlyRelevant,
            JudgedRelevance::NonRelevant => Relevance::NonRelevant,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JudgeVerdict {
    #[serde(rename = "Relevance")]
    relevance: JudgedRelevance,
    #[serde(rename = "Explanation")]
    explanation: String,
}

/// Render the judge prompt; question and answer go in verbatim
pub fn judge_prompt(question: &str, answer: &str) -> String {
    format!(
        r#"
You are an evaluator for a RAG system.
Classify the generated answer’s relevance to the question as "NON_RELEVANT", "PARTLY_RELEVANT", or "RELEVANT".

Input:

Question: {question}

Answer: {answer}

Output (JSON, no code block):

{{
  "Relevance": "NON_RELEVANT" | "PARTLY_RELEVANT" | "RELEVANT",
  "Explanation": "[Brief reason for classification]"
}}
"#
    )
}

/// Strictly parse a judge reply: a JSON object with exactly the two
/// expected fields
pub fn parse_verdict(raw: &str) -> Option<Evaluation> {
    let value: Value = serde_json::from_str(raw).ok()?;
    if !value.is_object() {
        return None;
    }

    serde_json::from_value::<JudgeVerdict>(value)
        .ok()
        .map(|verdict| Evaluation {
            relevance: verdict.relevance.into(),
            explanation: verdict.explanation,
        })
}

fn unknown_verdict() -> Evaluation {
    Evaluation {
        relevance: Relevance::Unknown,
        explanation: PARSE_FAILURE_EXPLANATION.to_string(),
    }
}

pub struct RelevanceEvaluator {
    chat: Arc<dyn ChatModel>,
}

impl RelevanceEvaluator {
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }

    /// Judge `answer` against `question`. Only endpoint failures are
    /// errors; unparseable replies yield UNKNOWN.
    pub async fn evaluate(
        &self,
        question: &str,
        answer: &str,
        model: &str,
    ) -> Result<(Evaluation, UsageRecord)> {
        let prompt = judge_prompt(question, answer);
        let completion = self
            .chat
            .complete(ChatRequest::prompt(model, &prompt).json())
            .await?;

        let evaluation = completion
            .content
            .as_deref()
            .and_then(parse_verdict)
            .unwrap_or_else(|| {
                warn!(model, "judge output could not be parsed, verdict UNKNOWN");
                unknown_verdict()
            });

        Ok((evaluation, completion.usage))
    }
}
