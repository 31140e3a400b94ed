//! Core data types shared across the pipeline

pub mod recipe;
pub mod records;

pub use recipe::RecipeDocument;
pub use records::{
    ConversationRecord, Evaluation, FeedbackRecord, FeedbackSignal, Relevance, UsageRecord,
};
