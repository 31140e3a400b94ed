use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cost::{CostTable, ModelPricing};
use crate::index::embedding::{DEFAULT_EMBEDDING_MODEL, DEFAULT_EMBEDDING_URL};
use crate::index::ingestion::DEFAULT_BATCH_SIZE;
use crate::llm::client::{DEFAULT_ANSWER_MODEL, DEFAULT_CHAT_URL, DEFAULT_EVALUATOR_MODEL};
use crate::rag::retrieval::{SearchParams, DEFAULT_CANDIDATE_MULTIPLIER, DEFAULT_RRF_K};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub store: StoreConfig,
    /// Extra or overriding model prices, per 1000 tokens
    #[serde(default)]
    pub pricing: HashMap<String, ModelPricing>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub url: String,
    pub collection: String,
    pub dense_vector: String,
    pub sparse_vector: String,
    pub dense_dim: u64,
    /// Environment variable holding the Qdrant API key, if any
    pub api_key_env: Option<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            collection: "baking_recipes_description".to_string(),
            dense_vector: "dense".to_string(),
            sparse_vector: "bm25".to_string(),
            dense_dim: 768,
            api_key_env: None,
        }
    }
}

impl IndexConfig {
    pub fn api_key(&self) -> Option<String> {
        read_key(self.api_key_env.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub api_key_env: Option<String>,
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_EMBEDDING_URL.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            api_key_env: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl EmbeddingConfig {
    pub fn api_key(&self) -> Option<String> {
        read_key(self.api_key_env.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key_env: Option<String>,
    pub answer_model: String,
    pub evaluator_model: String,
    /// Sampling temperature; omitted from requests when unset
    pub temperature: Option<f32>,
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CHAT_URL.to_string(),
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            answer_model: DEFAULT_ANSWER_MODEL.to_string(),
            evaluator_model: DEFAULT_EVALUATOR_MODEL.to_string(),
            temperature: None,
            request_timeout_secs: 120,
        }
    }
}

impl LlmConfig {
    pub fn api_key(&self) -> Option<String> {
        read_key(self.api_key_env.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Recipes passed to the prompt
    pub limit: usize,
    /// RRF smoothing constant
    pub rrf_k: f64,
    /// Candidates requested per source, as a multiple of `limit`
    pub candidate_multiplier: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            limit: 5,
            rrf_k: DEFAULT_RRF_K,
            candidate_multiplier: DEFAULT_CANDIDATE_MULTIPLIER,
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.rrf_k.is_finite() || self.rrf_k < SearchParams::MIN_RRF_K {
            bail!(
                "retrieval.rrf_k must be a number >= {}, got {}",
                SearchParams::MIN_RRF_K,
                self.rrf_k
            );
        }
        if self.candidate_multiplier == 0 {
            bail!("retrieval.candidate_multiplier must be at least 1");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite file; `~/.bakebuddy/conversations.db` when unset
    pub database_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load from an explicit path, creating the default file if missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Config::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;
        config
            .retrieval
            .validate()
            .with_context(|| format!("Invalid config file {}", config_path.display()))?;

        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, toml_string).context("Failed to write config file")?;

        Ok(())
    }

    /// Directory holding the config file and the default database
    pub fn home_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".bakebuddy"))
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("config.toml"))
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.store.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::home_dir()?.join("conversations.db")),
        }
    }

    /// Built-in prices with the configured ones merged on top
    pub fn cost_table(&self) -> CostTable {
        let mut table = CostTable::default();
        table.extend(&self.pricing);
        table
    }
}

fn read_key(env_name: Option<&str>) -> Option<String> {
    env_name
        .and_then(|name| std::env::var(name).ok())
        .filter(|value| !value.is_empty())
}
