//! Terminal output for the chat loop
//!
//! Spinner while the pipeline runs, colored answers and run summaries.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::types::{ConversationRecord, Relevance};

pub struct DisplayManager {
    spinner: Option<ProgressBar>,
    tick_interval: Duration,
    enabled: bool,
}

impl DisplayManager {
    pub fn new() -> Self {
        DisplayManager {
            spinner: None,
            tick_interval: Duration::from_millis(100),
            enabled: true,
        }
    }

    /// Display manager that never draws a spinner
    pub fn without_progress() -> Self {
        DisplayManager {
            enabled: false,
            ..Self::new()
        }
    }

    pub fn show_banner(&self, version: &str, model: &str) {
        let width = 64;
        println!("\n{}", "=".repeat(width).cyan());
        println!("{}", format!("  BakeBuddy {} - Your Smart Recipe Chat", version).bold().cyan());
        println!("{}", format!("  Answer model: {}", model).dimmed());
        println!("{}\n", "=".repeat(width).cyan());
        println!("Ready to whip up something sweet?");
        println!(
            "Type a baking question (or {} for commands, {} to quit)\n",
            "/help".green(),
            "/exit".green()
        );
    }

    /// Start the "thinking" spinner
    pub fn start_spinner(&mut self, message: &str) {
        self.finish_spinner();
        if !self.enabled {
            return;
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.magenta} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(self.tick_interval);
        self.spinner = Some(pb);
    }

    pub fn finish_spinner(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }

    pub fn spinner_active(&self) -> bool {
        self.spinner.is_some()
    }

    pub fn show_answer(&mut self, record: &ConversationRecord) {
        self.finish_spinner();
        println!("\n{}\n", record.answer);
        println!("{}", summary_line(record).dimmed());
        println!();
    }

    pub fn show_error(&mut self, error: &str) {
        self.finish_spinner();
        println!("{} {}", "Error:".red().bold(), error.red());
    }

    pub fn show_info(&self, info: &str) {
        println!("{} {}", "Info:".cyan(), info);
    }

    pub fn show_help(&self) {
        println!("\n{}", "Commands".bold().cyan());
        println!("{}", "-".repeat(60).cyan());
        println!("  {}   show this help", "/help".green());
        println!("  {}   leave the chat", "/exit".green());
        println!("  Anything else is sent as a baking question.\n");
    }

    pub fn show_feedback_thanks(&self) {
        println!("{}", "Thanks for your feedback!".green());
    }
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}

fn relevance_label(relevance: Relevance) -> ColoredString {
    match relevance {
        Relevance::Relevant => relevance.as_str().green(),
        Relevance::PartlyRelevant => relevance.as_str().yellow(),
        Relevance::NonRelevant => relevance.as_str().red(),
        Relevance::Unknown => relevance.as_str().dimmed(),
    }
}

/// One-line summary printed under each answer
pub fn summary_line(record: &ConversationRecord) -> String {
    format!(
        "{} | {:.1}s | {} tokens | ${:.6} | id {}",
        relevance_label(record.relevance),
        record.response_time,
        record.answer_usage.total_tokens + record.evaluation_usage.total_tokens,
        record.total_cost,
        record.id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UsageRecord;
    use chrono::Utc;

    fn record() -> ConversationRecord {
        ConversationRecord {
            id: "abc".to_string(),
            question: "scones?".to_string(),
            answer: "Bake them.".to_string(),
            model_used: "gpt-5-nano".to_string(),
            answer_model: "gpt-5-mini".to_string(),
            response_time: 2.345,
            relevance: Relevance::PartlyRelevant,
            relevance_explanation: String::new(),
            answer_usage: UsageRecord::new(100, 20),
            evaluation_usage: UsageRecord::new(30, 5),
            answer_cost: 0.0001,
            evaluation_cost: 0.00002,
            total_cost: 0.00012,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_summary_line() {
        colored::control::set_override(false);
        let line = summary_line(&record());
        assert_eq!(line, "PARTLY_RELEVANT | 2.3s | 155 tokens | $0.000120 | id abc");
    }

    #[test]
    fn test_spinner_disabled() {
        let mut display = DisplayManager::without_progress();
        display.start_spinner("Mixing ideas in the kitchen...");
        assert!(!display.spinner_active());
    }

    #[test]
    fn test_spinner_lifecycle() {
        let mut display = DisplayManager::new();
        display.start_spinner("Mixing ideas in the kitchen...");
        assert!(display.spinner_active());
        display.finish_spinner();
        assert!(!display.spinner_active());
    }
}
