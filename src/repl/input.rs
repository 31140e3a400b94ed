//! Input handler for the chat loop using rustyline
//!
//! Provides line editing, persistent history and the feedback question.

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

use crate::types::FeedbackSignal;

const DEFAULT_PROMPT: &str = "bakebuddy> ";

/// What the user typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Line(String),
    /// Ctrl-C: abandon the current line, keep the session
    Interrupted,
    /// Ctrl-D
    Eof,
}

pub struct InputHandler {
    editor: DefaultEditor,
    history_path: Option<PathBuf>,
}

impl InputHandler {
    pub fn new() -> Result<Self> {
        Ok(InputHandler {
            editor: DefaultEditor::new()?,
            history_path: None,
        })
    }

    /// Create input handler with persistent history
    pub fn with_history(history_file: PathBuf) -> Result<Self> {
        let mut editor = DefaultEditor::new()?;

        if history_file.exists() {
            let _ = editor.load_history(&history_file);
        }

        Ok(InputHandler {
            editor,
            history_path: Some(history_file),
        })
    }

    /// Read a trimmed line from the user
    pub fn read_line(&mut self) -> Result<InputEvent> {
        self.read_with_prompt(DEFAULT_PROMPT, true)
    }

    /// Ask whether the last answer helped; `None` when skipped
    pub fn ask_feedback(&mut self) -> Result<Option<FeedbackSignal>> {
        match self.read_with_prompt("Was this recipe helpful? [y]es / [n]o / [m]eh / enter to skip: ", false)? {
            InputEvent::Line(reply) => Ok(parse_feedback_reply(&reply)),
            InputEvent::Interrupted | InputEvent::Eof => Ok(None),
        }
    }

    fn read_with_prompt(&mut self, prompt: &str, record: bool) -> Result<InputEvent> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if record && !trimmed.is_empty() {
                    let _ = self.editor.add_history_entry(trimmed);
                }
                Ok(InputEvent::Line(trimmed.to_string()))
            }
            Err(ReadlineError::Interrupted) => Ok(InputEvent::Interrupted),
            Err(ReadlineError::Eof) => Ok(InputEvent::Eof),
            Err(err) => Err(anyhow::anyhow!("Readline error: {}", err)),
        }
    }

    /// Save history to disk
    pub fn save_history(&mut self) -> Result<()> {
        if let Some(ref path) = self.history_path {
            self.editor.save_history(path)?;
        }
        Ok(())
    }
}

/// Map a free-form reply onto a feedback signal
pub fn parse_feedback_reply(reply: &str) -> Option<FeedbackSignal> {
    match reply.trim().to_lowercase().as_str() {
        "y" | "yes" | "helpful" | "+" | "1" => Some(FeedbackSignal::Helpful),
        "n" | "no" | "not helpful" | "not-helpful" | "-" | "-1" => Some(FeedbackSignal::NotHelpful),
        "m" | "meh" | "neutral" | "0" => Some(FeedbackSignal::Neutral),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustyline::history::History;
    use tempfile::TempDir;

    #[test]
    fn test_input_handler_creation() {
        let handler = InputHandler::new().unwrap();
        assert!(handler.history_path.is_none());
    }

    #[test]
    fn test_history_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let history_path = temp_dir.path().join("history");

        {
            let mut handler = InputHandler::with_history(history_path.clone()).unwrap();
            let _ = handler.editor.add_history_entry("scones");
            let _ = handler.editor.add_history_entry("brownies");
            handler.save_history().unwrap();
        }

        assert!(history_path.exists());
        let handler = InputHandler::with_history(history_path).unwrap();
        assert_eq!(handler.editor.history().len(), 2);
    }

    #[test]
    fn test_parse_feedback_reply() {
        assert_eq!(parse_feedback_reply("Y"), Some(FeedbackSignal::Helpful));
        assert_eq!(parse_feedback_reply(" no "), Some(FeedbackSignal::NotHelpful));
        assert_eq!(parse_feedback_reply("meh"), Some(FeedbackSignal::Neutral));
        assert_eq!(parse_feedback_reply(""), None);
        assert_eq!(parse_feedback_reply("maybe later"), None);
    }
}
