//! Interactive chat loop
//!
//! Each line is an independent question; nothing carries over between
//! turns. After an answer the user is occasionally asked for feedback.

pub mod commands;
pub mod display;
pub mod input;

use anyhow::Result;
use rand::Rng;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::rag::Pipeline;
use crate::repl::commands::Command;
pub use crate::repl::display::DisplayManager;
use crate::repl::input::{InputEvent, InputHandler};
use crate::store::ConversationStore;
use crate::types::FeedbackRecord;

/// Share of answers followed by a feedback question
pub const FEEDBACK_PROBABILITY: f64 = 0.1;

const THINKING_MESSAGE: &str = "Mixing ideas in the kitchen...";

/// Decides when to ask for feedback
#[derive(Debug, Clone, Copy)]
pub struct FeedbackSampler {
    probability: f64,
}

impl FeedbackSampler {
    pub fn new(probability: f64) -> Self {
        Self {
            probability: if probability.is_finite() {
                probability.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn should_ask<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen_bool(self.probability)
    }
}

impl Default for FeedbackSampler {
    fn default() -> Self {
        Self::new(FEEDBACK_PROBABILITY)
    }
}

/// Chat session coordinator
pub struct ChatSession {
    input: InputHandler,
    display: DisplayManager,
    sampler: FeedbackSampler,
    store: Option<Arc<dyn ConversationStore>>,
}

impl ChatSession {
    pub fn new(display: DisplayManager) -> Result<Self> {
        Ok(Self {
            input: InputHandler::new()?,
            display,
            sampler: FeedbackSampler::default(),
            store: None,
        })
    }

    /// Chat session with persistent line history
    pub fn with_history(display: DisplayManager, history_path: PathBuf) -> Result<Self> {
        Ok(Self {
            input: InputHandler::with_history(history_path)?,
            display,
            sampler: FeedbackSampler::default(),
            store: None,
        })
    }

    /// Feedback is only asked for when a store is attached
    pub fn with_store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_sampler(mut self, sampler: FeedbackSampler) -> Self {
        self.sampler = sampler;
        self
    }

    /// Run until `/exit` or Ctrl-D
    pub async fn run(&mut self, pipeline: &Pipeline) -> Result<()> {
        self.display
            .show_banner(env!("CARGO_PKG_VERSION"), &pipeline.config().answer_model);

        loop {
            let line = match self.input.read_line()? {
                InputEvent::Line(line) => line,
                InputEvent::Interrupted => {
                    self.display.show_info("Type /exit or press Ctrl-D to quit");
                    continue;
                }
                InputEvent::Eof => break,
            };

            match commands::parse(&line) {
                Command::Empty => continue,
                Command::Help => self.display.show_help(),
                Command::Exit => break,
                Command::Unknown(input) => {
                    self.display.show_info(&format!("Unknown command: {}", input));
                }
                Command::Ask(question) => self.answer(pipeline, &question).await?,
            }
        }

        self.input.save_history()?;
        Ok(())
    }

    async fn answer(&mut self, pipeline: &Pipeline, question: &str) -> Result<()> {
        self.display.start_spinner(THINKING_MESSAGE);
        let record = match pipeline.run(question, None).await {
            Ok(record) => record,
            Err(e) => {
                self.display.show_error(&e.to_string());
                return Ok(());
            }
        };
        self.display.show_answer(&record);

        let Some(store) = self.store.clone() else {
            return Ok(());
        };
        let ask = self.sampler.should_ask(&mut rand::thread_rng());
        if !ask {
            return Ok(());
        }

        if let Some(signal) = self.input.ask_feedback()? {
            let feedback = FeedbackRecord::new(record.id.clone(), signal);
            if record_feedback(store, feedback).await {
                self.display.show_feedback_thanks();
            }
        }
        Ok(())
    }
}

/// Write feedback on the blocking pool. False when the store refused it.
pub async fn record_feedback(
    store: Arc<dyn ConversationStore>,
    feedback: FeedbackRecord,
) -> bool {
    let id = feedback.conversation_id.clone();
    match tokio::task::spawn_blocking(move || store.insert_feedback(&feedback)).await {
        Ok(Ok(())) => {
            debug!(id = %id, "feedback stored");
            true
        }
        Ok(Err(e)) => {
            warn!(id = %id, error = %e, "failed to store feedback");
            false
        }
        Err(e) => {
            warn!(id = %id, error = %e, "feedback store task failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{BakeError, Result as StoreResult};
    use crate::types::{ConversationRecord, FeedbackSignal};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FeedbackLog {
        accepted: Mutex<Vec<FeedbackRecord>>,
    }

    impl ConversationStore for FeedbackLog {
        fn insert_conversation(&self, _record: &ConversationRecord) -> StoreResult<()> {
            Ok(())
        }

        fn insert_feedback(&self, feedback: &FeedbackRecord) -> StoreResult<()> {
            let mut accepted = self.accepted.lock().unwrap();
            if accepted
                .iter()
                .any(|f| f.conversation_id == feedback.conversation_id)
            {
                return Err(BakeError::StoreError("feedback already recorded".to_string()));
            }
            accepted.push(feedback.clone());
            Ok(())
        }
    }

    #[test]
    fn test_sampler_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let never = FeedbackSampler::new(0.0);
        let always = FeedbackSampler::new(1.0);
        for _ in 0..100 {
            assert!(!never.should_ask(&mut rng));
            assert!(always.should_ask(&mut rng));
        }
    }

    #[test]
    fn test_sampler_clamps() {
        assert_eq!(FeedbackSampler::new(3.0).probability(), 1.0);
        assert_eq!(FeedbackSampler::new(-1.0).probability(), 0.0);
        assert_eq!(FeedbackSampler::new(f64::NAN).probability(), 0.0);
    }

    #[test]
    fn test_default_rate_is_about_ten_percent() {
        let mut rng = StdRng::seed_from_u64(42);
        let sampler = FeedbackSampler::default();
        let asked = (0..10_000).filter(|_| sampler.should_ask(&mut rng)).count();
        assert!((800..1200).contains(&asked), "asked {} times", asked);
    }

    #[tokio::test]
    async fn test_record_feedback_stores_once() {
        let log = Arc::new(FeedbackLog::default());
        let store: Arc<dyn ConversationStore> = log.clone();

        let first = FeedbackRecord::new("c1", FeedbackSignal::Helpful);
        assert!(record_feedback(store.clone(), first).await);

        let second = FeedbackRecord::new("c1", FeedbackSignal::NotHelpful);
        assert!(!record_feedback(store, second).await);

        let accepted = log.accepted.lock().unwrap();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].feedback, 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_record_feedback_on_single_threaded_runtime() {
        let store: Arc<dyn ConversationStore> = Arc::new(FeedbackLog::default());
        let feedback = FeedbackRecord::new("c2", FeedbackSignal::Neutral);
        assert!(record_feedback(store, feedback).await);
    }
}
