// Conversation and feedback logging
pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::errors::Result;
use crate::types::{ConversationRecord, FeedbackRecord};

/// Append-only sink for answered questions and user feedback
pub trait ConversationStore: Send + Sync {
    fn insert_conversation(&self, record: &ConversationRecord) -> Result<()>;

    /// Fails when the conversation is unknown or already has feedback
    fn insert_feedback(&self, feedback: &FeedbackRecord) -> Result<()>;
}
