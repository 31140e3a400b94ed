// End-to-end question answering: retrieve, prompt, answer, judge, price
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::cost::CostTable;
use crate::errors::Result;
use crate::index::embedding::{Embedder, HttpEmbedder};
use crate::index::sparse::Bm25Encoder;
use crate::index::vector_db::{QdrantIndex, RecipeIndex};
use crate::llm::client::{
    ChatModel, OpenAiChatClient, DEFAULT_ANSWER_MODEL, DEFAULT_EVALUATOR_MODEL,
};
use crate::llm::{AnswerGenerator, RelevanceEvaluator};
use crate::rag::context::PromptAssembler;
use crate::rag::reranking::FusedResult;
use crate::rag::retrieval::{FusionRetriever, SearchParams};
use crate::rag::state::PipelineStage;
use crate::store::ConversationStore;
use crate::types::{ConversationRecord, Evaluation, UsageRecord};

/// Models and retrieval depth for a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub answer_model: String,
    /// Judge model used when a run gives no override
    pub evaluator_model: String,
    /// Recipes passed to the prompt
    pub limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            answer_model: DEFAULT_ANSWER_MODEL.to_string(),
            evaluator_model: DEFAULT_EVALUATOR_MODEL.to_string(),
            limit: 5,
        }
    }
}

/// Output of the generation stage
#[derive(Debug, Clone)]
struct Answered {
    answer: String,
    usage: UsageRecord,
}

/// Output of the evaluation stage
#[derive(Debug, Clone)]
struct Judged {
    evaluation: Evaluation,
    usage: UsageRecord,
}

/// Per-query pipeline
pub struct Pipeline {
    retriever: FusionRetriever,
    assembler: PromptAssembler,
    generator: AnswerGenerator,
    evaluator: RelevanceEvaluator,
    costs: CostTable,
    store: Option<Arc<dyn ConversationStore>>,
    config: PipelineConfig,
}

impl Pipeline {
    /// One chat endpoint serves both the answer and the judge model
    pub fn new(
        retriever: FusionRetriever,
        chat: Arc<dyn ChatModel>,
        costs: CostTable,
        config: PipelineConfig,
    ) -> Self {
        Self {
            retriever,
            assembler: PromptAssembler::new(),
            generator: AnswerGenerator::new(chat.clone()),
            evaluator: RelevanceEvaluator::new(chat),
            costs,
            store: None,
            config,
        }
    }

    /// Build the Qdrant-backed hybrid pipeline described by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let index: Arc<dyn RecipeIndex> = Arc::new(QdrantIndex::new(&config.index)?);
        let embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(
            &config.embedding.base_url,
            &config.embedding.model,
            config.embedding.api_key(),
        )?);
        let chat: Arc<dyn ChatModel> = Arc::new(OpenAiChatClient::with_config(
            &config.llm.base_url,
            config.llm.api_key(),
            config.llm.temperature,
            Duration::from_secs(config.llm.request_timeout_secs),
        )?);

        let params = SearchParams {
            rrf_k: config.retrieval.rrf_k,
            candidate_multiplier: config.retrieval.candidate_multiplier,
        };
        let retriever = FusionRetriever::hybrid(embedder, Bm25Encoder::new(), index, params);

        let pipeline_config = PipelineConfig {
            answer_model: config.llm.answer_model.clone(),
            evaluator_model: config.llm.evaluator_model.clone(),
            limit: config.retrieval.limit,
        };

        Ok(Self::new(retriever, chat, config.cost_table(), pipeline_config))
    }

    /// Log every completed run to `store`
    pub fn with_store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_assembler(mut self, assembler: PromptAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Answer `question`, judging with `evaluator_model` or the configured
    /// default. Retrieval, generation and judge endpoint failures abort
    /// the run; an unparseable verdict does not.
    pub async fn run(
        &self,
        question: &str,
        evaluator_model: Option<&str>,
    ) -> Result<ConversationRecord> {
        let started = Instant::now();
        let evaluator_model = evaluator_model.unwrap_or(&self.config.evaluator_model);
        let answer_model = self.config.answer_model.as_str();
        let mut stage = PipelineStage::Start;

        stage.advance(PipelineStage::Retrieve)?;
        let results = self.retrieve(question).await?;

        stage.advance(PipelineStage::Assemble)?;
        let prompt = self.assembler.assemble(question, &results)?;
        debug!(stage = stage.display_name(), chars = prompt.len(), "prompt assembled");

        stage.advance(PipelineStage::Generate)?;
        let answered = self.generate(&prompt, answer_model).await?;

        stage.advance(PipelineStage::Evaluate)?;
        let judged = self.judge(question, &answered.answer, evaluator_model).await?;

        stage.advance(PipelineStage::Cost)?;
        let answer_cost = self.costs.cost(&answered.usage, answer_model);
        let evaluation_cost = self.costs.cost(&judged.usage, evaluator_model);

        stage.advance(PipelineStage::Done)?;
        let record = ConversationRecord {
            id: Uuid::new_v4().to_string(),
            question: question.to_string(),
            answer: answered.answer,
            model_used: evaluator_model.to_string(),
            answer_model: answer_model.to_string(),
            response_time: started.elapsed().as_secs_f64(),
            relevance: judged.evaluation.relevance,
            relevance_explanation: judged.evaluation.explanation,
            answer_usage: answered.usage,
            evaluation_usage: judged.usage,
            answer_cost,
            evaluation_cost,
            total_cost: answer_cost + evaluation_cost,
            timestamp: Utc::now(),
        };

        info!(
            id = %record.id,
            relevance = %record.relevance,
            response_time = record.response_time,
            total_cost = record.total_cost,
            "question answered"
        );

        self.log_conversation(&record).await;
        Ok(record)
    }

    async fn retrieve(&self, question: &str) -> Result<Vec<FusedResult>> {
        let results = self.retriever.search(question, self.config.limit).await?;
        debug!(
            stage = PipelineStage::Retrieve.display_name(),
            results = results.len(),
            "retrieval finished"
        );
        Ok(results)
    }

    async fn generate(&self, prompt: &str, model: &str) -> Result<Answered> {
        let (answer, usage) = self.generator.generate(prompt, model).await?;
        debug!(
            stage = PipelineStage::Generate.display_name(),
            model,
            total_tokens = usage.total_tokens,
            "answer generated"
        );
        Ok(Answered { answer, usage })
    }

    async fn judge(&self, question: &str, answer: &str, model: &str) -> Result<Judged> {
        let (evaluation, usage) = self.evaluator.evaluate(question, answer, model).await?;
        debug!(
            stage = PipelineStage::Evaluate.display_name(),
            model,
            relevance = %evaluation.relevance,
            "answer judged"
        );
        Ok(Judged { evaluation, usage })
    }

    async fn log_conversation(&self, record: &ConversationRecord) {
        let Some(store) = self.store.clone() else {
            return;
        };

        let owned = record.clone();
        match tokio::task::spawn_blocking(move || store.insert_conversation(&owned)).await {
            Ok(Ok(())) => debug!(id = %record.id, "conversation stored"),
            Ok(Err(e)) => warn!(id = %record.id, error = %e, "failed to store conversation"),
            Err(e) => warn!(id = %record.id, error = %e, "conversation store task failed"),
        }
    }
}
