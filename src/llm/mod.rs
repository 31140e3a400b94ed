//! Language model access: chat client, answer generation, relevance judging

pub mod client;
pub mod evaluator;
pub mod generator;

pub use client::{ChatMessage, ChatModel, ChatRequest, Completion, OpenAiChatClient, Role};
pub use evaluator::{RelevanceEvaluator, PARSE_FAILURE_EXPLANATION};
pub use generator::AnswerGenerator;
