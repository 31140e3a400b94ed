// SQLite-backed conversation store
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::errors::{BakeError, Result};
use crate::store::ConversationStore;
use crate::types::{ConversationRecord, FeedbackRecord};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS conversations (
      id TEXT PRIMARY KEY,
      question TEXT NOT NULL,
      answer TEXT NOT NULL,
      model_used TEXT NOT NULL,
      answer_model TEXT NOT NULL,
      response_time REAL NOT NULL,
      relevance TEXT NOT NULL,
      relevance_explanation TEXT NOT NULL,
      ans_prompt_tokens INTEGER NOT NULL,
      ans_completion_tokens INTEGER NOT NULL,
      ans_total_tokens INTEGER NOT NULL,
      eval_prompt_tokens INTEGER NOT NULL,
      eval_completion_tokens INTEGER NOT NULL,
      eval_total_tokens INTEGER NOT NULL,
      ans_cost REAL NOT NULL,
      eval_cost REAL NOT NULL,
      total_cost REAL NOT NULL,
      timestamp TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS feedback (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      conversation_id TEXT NOT NULL UNIQUE REFERENCES conversations(id),
      feedback INTEGER NOT NULL,
      timestamp TEXT NOT NULL
    );
";

pub struct SqliteStore {
    connection: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file and make sure the tables exist
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let connection = Connection::open(path)?;
        debug!(path = %path.display(), "opened conversation store");
        Self::from_connection(connection)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> Result<Self> {
        connection.pragma_update(None, "foreign_keys", "ON")?;
        connection.execute_batch(SCHEMA)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Drop both tables and recreate them empty
    pub fn reset(&self) -> Result<()> {
        let connection = self.lock()?;
        connection.execute_batch(
            "
            DROP TABLE IF EXISTS feedback;
            DROP TABLE IF EXISTS conversations;
            ",
        )?;
        connection.execute_batch(SCHEMA)?;
        debug!("conversation store reset");
        Ok(())
    }

    pub fn conversation_count(&self) -> Result<u64> {
        let connection = self.lock()?;
        let count: i64 =
            connection.query_row("SELECT COUNT(*) FROM conversations", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// Stored feedback value for a conversation, if any
    pub fn feedback_for(&self, conversation_id: &str) -> Result<Option<i32>> {
        let connection = self.lock()?;
        let value = connection
            .query_row(
                "SELECT feedback FROM feedback WHERE conversation_id = ?1",
                params![conversation_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| BakeError::StoreError("connection lock poisoned".to_string()))
    }
}

impl ConversationStore for SqliteStore {
    fn insert_conversation(&self, record: &ConversationRecord) -> Result<()> {
        let connection = self.lock()?;
        connection.execute(
            "INSERT INTO conversations (
               id, question, answer, model_used, answer_model, response_time,
               relevance, relevance_explanation,
               ans_prompt_tokens, ans_completion_tokens, ans_total_tokens,
               eval_prompt_tokens, eval_completion_tokens, eval_total_tokens,
               ans_cost, eval_cost, total_cost, timestamp
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            params![
                record.id,
                record.question,
                record.answer,
                record.model_used,
                record.answer_model,
                record.response_time,
                record.relevance.as_str(),
                record.relevance_explanation,
                record.answer_usage.prompt_tokens as i64,
                record.answer_usage.completion_tokens as i64,
                record.answer_usage.total_tokens as i64,
                record.evaluation_usage.prompt_tokens as i64,
                record.evaluation_usage.completion_tokens as i64,
                record.evaluation_usage.total_tokens as i64,
                record.answer_cost,
                record.evaluation_cost,
                record.total_cost,
                record.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn insert_feedback(&self, feedback: &FeedbackRecord) -> Result<()> {
        let connection = self.lock()?;
        connection.execute(
            "INSERT INTO feedback (conversation_id, feedback, timestamp) VALUES (?1, ?2, ?3)",
            params![
                feedback.conversation_id,
                feedback.feedback,
                feedback.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FeedbackSignal, Relevance, UsageRecord};
    use chrono::Utc;
    use tempfile::TempDir;

    fn record(id: &str) -> ConversationRecord {
        ConversationRecord {
            id: id.to_string(),
            question: "How do I make scones?".to_string(),
            answer: "Rub the butter into the flour...".to_string(),
            model_used: "gpt-5-nano".to_string(),
            answer_model: "gpt-5-mini".to_string(),
            response_time: 1.25,
            relevance: Relevance::Relevant,
            relevance_explanation: "Answers the question".to_string(),
            answer_usage: UsageRecord::new(100, 50),
            evaluation_usage: UsageRecord::new(40, 10),
            answer_cost: 0.000125,
            evaluation_cost: 0.000006,
            total_cost: 0.000131,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_insert_conversation_and_feedback() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_conversation(&record("c1")).unwrap();
        store
            .insert_feedback(&FeedbackRecord::new("c1", FeedbackSignal::NotHelpful))
            .unwrap();

        assert_eq!(store.conversation_count().unwrap(), 1);
        assert_eq!(store.feedback_for("c1").unwrap(), Some(-1));
    }

    #[test]
    fn test_feedback_for_unknown_conversation_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store
            .insert_feedback(&FeedbackRecord::new("missing", FeedbackSignal::Helpful))
            .unwrap_err();
        assert!(matches!(err, BakeError::StoreError(_)));
        assert_eq!(store.feedback_for("missing").unwrap(), None);
    }

    #[test]
    fn test_second_feedback_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_conversation(&record("c1")).unwrap();
        store
            .insert_feedback(&FeedbackRecord::new("c1", FeedbackSignal::Helpful))
            .unwrap();

        let second = store.insert_feedback(&FeedbackRecord::new("c1", FeedbackSignal::Neutral));
        assert!(second.is_err());
        assert_eq!(store.feedback_for("c1").unwrap(), Some(1));
    }

    #[test]
    fn test_duplicate_conversation_id_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_conversation(&record("c1")).unwrap();
        assert!(store.insert_conversation(&record("c1")).is_err());
    }

    #[test]
    fn test_reset_empties_tables() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_conversation(&record("c1")).unwrap();
        store.reset().unwrap();
        assert_eq!(store.conversation_count().unwrap(), 0);
        store.insert_conversation(&record("c1")).unwrap();
    }

    #[test]
    fn test_file_store_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("conversations.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert_conversation(&record("c1")).unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.conversation_count().unwrap(), 1);
    }
}
