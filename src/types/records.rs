//! Records produced by the pipeline: token usage, verdicts, conversations
//! and feedback.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{BakeError, Result};

/// Token usage of one model call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UsageRecord {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl UsageRecord {
    /// Build a usage record; the total is derived.
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Accept counts reported by a model endpoint, rejecting an
    /// inconsistent total.
    pub fn from_reported(
        prompt_tokens: u64,
        completion_tokens: u64,
        total_tokens: u64,
    ) -> Result<Self> {
        let usage = Self::new(prompt_tokens, completion_tokens);
        if usage.total_tokens != total_tokens {
            return Err(BakeError::MalformedResponse(format!(
                "usage total {} != prompt {} + completion {}",
                total_tokens, prompt_tokens, completion_tokens
            )));
        }
        Ok(usage)
    }
}

/// Judge classification of an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Relevance {
    Relevant,
    PartlyRelevant,
    NonRelevant,
    /// Judge output could not be parsed
    Unknown,
}

impl Relevance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relevance::Relevant => "RELEVANT",
            Relevance::PartlyRelevant => "PARTLY_RELEVANT",
            Relevance::NonRelevant => "NON_RELEVANT",
            Relevance::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Relevance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict plus the judge's reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub relevance: Relevance,
    pub explanation: String,
}

/// Everything recorded about one answered question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: String,
    pub question: String,
    pub answer: String,
    /// Evaluator model, which is also the per-call override
    pub model_used: String,
    pub answer_model: String,
    /// Wall-clock seconds for the whole pipeline
    pub response_time: f64,
    pub relevance: Relevance,
    pub relevance_explanation: String,
    pub answer_usage: UsageRecord,
    pub evaluation_usage: UsageRecord,
    pub answer_cost: f64,
    pub evaluation_cost: f64,
    pub total_cost: f64,
    pub timestamp: DateTime<Utc>,
}

/// User reaction to an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedbackSignal {
    Helpful,
    NotHelpful,
    Neutral,
}

impl FeedbackSignal {
    /// Integer stored in the feedback table
    pub fn value(&self) -> i32 {
        match self {
            FeedbackSignal::Helpful => 1,
            FeedbackSignal::NotHelpful => -1,
            FeedbackSignal::Neutral => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub conversation_id: String,
    pub feedback: i32,
    pub timestamp: DateTime<Utc>,
}

impl FeedbackRecord {
    pub fn new(conversation_id: impl Into<String>, signal: FeedbackSignal) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            feedback: signal.value(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_total_is_derived() {
        let usage = UsageRecord::new(120, 80);
        assert_eq!(usage.total_tokens, 200);
    }

    #[test]
    fn test_reported_usage_rejects_bad_total() {
        assert!(UsageRecord::from_reported(10, 5, 15).is_ok());
        let err = UsageRecord::from_reported(10, 5, 16).unwrap_err();
        assert!(matches!(err, BakeError::MalformedResponse(_)));
    }

    #[test]
    fn test_relevance_wire_names() {
        assert_eq!(
            serde_json::to_string(&Relevance::PartlyRelevant).unwrap(),
            "\"PARTLY_RELEVANT\""
        );
        assert_eq!(Relevance::Unknown.to_string(), "UNKNOWN");
    }

    #[test]
    fn test_feedback_values() {
        assert_eq!(FeedbackSignal::Helpful.value(), 1);
        assert_eq!(FeedbackSignal::NotHelpful.value(), -1);
        assert_eq!(FeedbackSignal::Neutral.value(), 0);

        let record = FeedbackRecord::new("abc", FeedbackSignal::NotHelpful);
        assert_eq!(record.conversation_id, "abc");
        assert_eq!(record.feedback, -1);
    }
}
