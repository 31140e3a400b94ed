//! Integration tests for the question pipeline
//!
//! Runs the full retrieve → prompt → answer → judge → cost sequence against
//! in-process fakes; no index or model endpoint required.

use async_trait::async_trait;
use bakebuddy::{
    cost::CostTable,
    errors::{BakeError, Result},
    llm::{ChatModel, ChatRequest, Completion, PARSE_FAILURE_EXPLANATION},
    rag::{
        retrieval::{Candidate, SourceKind},
        FusionRetriever, Pipeline, PipelineConfig, RankedSource, NO_RECIPE_FALLBACK,
    },
    store::{ConversationStore, SqliteStore},
    types::{ConversationRecord, FeedbackRecord, FeedbackSignal, Relevance, UsageRecord},
};
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};

/// Chat endpoint with one scripted reply for answers and one for the judge
struct ScriptedChat {
    answer: Option<&'static str>,
    answer_usage: UsageRecord,
    verdict: &'static str,
    verdict_usage: UsageRecord,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChat {
    fn new(answer: Option<&'static str>, verdict: &'static str) -> Arc<Self> {
        Arc::new(Self {
            answer,
            answer_usage: UsageRecord::new(1000, 500),
            verdict,
            verdict_usage: UsageRecord::new(200, 50),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn complete(&self, request: ChatRequest) -> Result<Completion> {
        let judge = request.json_response;
        self.requests.lock().unwrap().push(request);

        Ok(if judge {
            Completion {
                content: Some(self.verdict.to_string()),
                usage: self.verdict_usage,
            }
        } else {
            Completion {
                content: self.answer.map(str::to_string),
                usage: self.answer_usage,
            }
        })
    }
}

struct UnreachableChat;

#[async_trait]
impl ChatModel for UnreachableChat {
    async fn complete(&self, _request: ChatRequest) -> Result<Completion> {
        Err(BakeError::ModelApiError("connection refused".to_string()))
    }
}

struct FixedSource {
    kind: SourceKind,
    ids: Vec<&'static str>,
}

#[async_trait]
impl RankedSource for FixedSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn candidates(&self, _query: &str, count: usize) -> Result<Vec<Candidate>> {
        Ok(self
            .ids
            .iter()
            .take(count)
            .map(|id| Candidate {
                id: id.to_string(),
                payload: recipe_payload(id),
            })
            .collect())
    }
}

struct FailingStore;

impl ConversationStore for FailingStore {
    fn insert_conversation(&self, _record: &ConversationRecord) -> Result<()> {
        Err(BakeError::StoreError("disk full".to_string()))
    }

    fn insert_feedback(&self, _feedback: &FeedbackRecord) -> Result<()> {
        Err(BakeError::StoreError("disk full".to_string()))
    }
}

fn recipe_payload(id: &str) -> Map<String, Value> {
    match json!({
        "id": id,
        "name": format!("Recipe {}", id),
        "difficult": "Easy",
        "total_cooking_min": 30,
        "kcal": 250,
        "ingredients": ["flour", "butter", "sugar"],
        "steps": ["Cream", "Fold", "Bake"]
    }) {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn retriever(dense: Vec<&'static str>, sparse: Vec<&'static str>) -> FusionRetriever {
    FusionRetriever::new(vec![
        Arc::new(FixedSource {
            kind: SourceKind::Dense,
            ids: dense,
        }) as Arc<dyn RankedSource>,
        Arc::new(FixedSource {
            kind: SourceKind::Sparse,
            ids: sparse,
        }) as Arc<dyn RankedSource>,
    ])
}

const GOOD_VERDICT: &str =
    r#"{"Relevance": "RELEVANT", "Explanation": "Gives a complete cookie recipe."}"#;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-12
}

#[tokio::test]
async fn test_full_run_produces_priced_record() {
    let chat = ScriptedChat::new(Some("Chocolate chip cookies: ..."), GOOD_VERDICT);
    let pipeline = Pipeline::new(
        retriever(vec!["A", "B", "C"], vec!["B", "A", "D"]),
        chat.clone(),
        CostTable::default(),
        PipelineConfig::default(),
    );

    let record = pipeline.run("chocolate chip cookies", None).await.unwrap();

    assert_eq!(record.answer, "Chocolate chip cookies: ...");
    assert_eq!(record.relevance, Relevance::Relevant);
    assert_eq!(record.model_used, "gpt-5-nano");
    assert_eq!(record.answer_model, "gpt-5-mini");
    assert_eq!(record.answer_usage.total_tokens, 1500);
    assert_eq!(record.evaluation_usage.total_tokens, 250);
    assert!(approx(record.answer_cost, 0.00125));
    assert!(approx(record.evaluation_cost, 0.00003));
    assert!(approx(record.total_cost, record.answer_cost + record.evaluation_cost));
    assert!(record.response_time >= 0.0);
    assert!(!record.id.is_empty());

    let requests = chat.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].model, "gpt-5-mini");
    assert!(!requests[0].json_response);
    assert_eq!(requests[1].model, "gpt-5-nano");
    assert!(requests[1].json_response);

    // Fused order A, B, C, D with the default limit of 5
    let prompt = &requests[0].messages[0].content;
    assert!(prompt.contains("Here are the top 4 potentially relevant recipes"));
    let positions: Vec<usize> = ["Recipe A", "Recipe B", "Recipe C", "Recipe D"]
        .iter()
        .map(|name| prompt.find(name).unwrap())
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
}

#[tokio::test]
async fn test_empty_retrieval_still_generates() {
    let chat = ScriptedChat::new(Some(NO_RECIPE_FALLBACK), GOOD_VERDICT);
    let pipeline = Pipeline::new(
        retriever(vec![], vec![]),
        chat.clone(),
        CostTable::default(),
        PipelineConfig::default(),
    );

    let record = pipeline.run("how do I fix my bike?", None).await.unwrap();

    assert_eq!(record.answer, NO_RECIPE_FALLBACK);
    let requests = chat.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].messages[0]
        .content
        .contains("Here are the top 0 potentially relevant recipes"));
}

#[tokio::test]
async fn test_unparseable_verdict_is_unknown() {
    let chat = ScriptedChat::new(Some("Bake at 180C."), "Looks relevant to me!");
    let pipeline = Pipeline::new(
        retriever(vec!["A"], vec!["A"]),
        chat,
        CostTable::default(),
        PipelineConfig::default(),
    );

    let record = pipeline.run("scones", None).await.unwrap();

    assert_eq!(record.relevance, Relevance::Unknown);
    assert_eq!(record.relevance_explanation, PARSE_FAILURE_EXPLANATION);
    assert_eq!(record.evaluation_usage.total_tokens, 250);
    assert!(record.evaluation_cost > 0.0);
}

#[tokio::test]
async fn test_unknown_evaluator_model_costs_zero() {
    let chat = ScriptedChat::new(Some("Knead for ten minutes."), GOOD_VERDICT);
    let pipeline = Pipeline::new(
        retriever(vec!["A"], vec![]),
        chat.clone(),
        CostTable::default(),
        PipelineConfig::default(),
    );

    let record = pipeline.run("bread", Some("mystery-model")).await.unwrap();

    assert_eq!(record.model_used, "mystery-model");
    assert_eq!(record.evaluation_cost, 0.0);
    assert!(approx(record.total_cost, record.answer_cost));
    assert_eq!(chat.requests()[1].model, "mystery-model");
}

#[tokio::test]
async fn test_empty_answer_aborts_run() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let chat = ScriptedChat::new(None, GOOD_VERDICT);
    let pipeline = Pipeline::new(
        retriever(vec!["A"], vec!["A"]),
        chat.clone(),
        CostTable::default(),
        PipelineConfig::default(),
    )
    .with_store(store.clone());

    let err = pipeline.run("scones", None).await.unwrap_err();

    assert!(matches!(err, BakeError::EmptyCompletion { .. }));
    assert_eq!(chat.requests().len(), 1);
    assert_eq!(store.conversation_count().unwrap(), 0);
}

#[tokio::test]
async fn test_unreachable_model_is_upstream_error() {
    let pipeline = Pipeline::new(
        retriever(vec!["A"], vec![]),
        Arc::new(UnreachableChat),
        CostTable::default(),
        PipelineConfig::default(),
    );

    let err = pipeline.run("scones", None).await.unwrap_err();
    assert!(err.is_upstream());
}

#[tokio::test]
async fn test_completed_run_is_stored_once() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let pipeline = Pipeline::new(
        retriever(vec!["A", "B"], vec!["B"]),
        ScriptedChat::new(Some("Brownies: ..."), GOOD_VERDICT),
        CostTable::default(),
        PipelineConfig::default(),
    )
    .with_store(store.clone());

    let record = pipeline.run("fudgy brownies", None).await.unwrap();

    assert_eq!(store.conversation_count().unwrap(), 1);
    store
        .insert_feedback(&FeedbackRecord::new(record.id.clone(), FeedbackSignal::Helpful))
        .unwrap();
    assert_eq!(store.feedback_for(&record.id).unwrap(), Some(1));
}

#[tokio::test]
async fn test_store_failure_does_not_fail_run() {
    let pipeline = Pipeline::new(
        retriever(vec!["A"], vec![]),
        ScriptedChat::new(Some("Flapjacks: ..."), GOOD_VERDICT),
        CostTable::default(),
        PipelineConfig::default(),
    )
    .with_store(Arc::new(FailingStore));

    let record = pipeline.run("flapjacks", None).await.unwrap();
    assert_eq!(record.relevance, Relevance::Relevant);
}

#[tokio::test]
async fn test_limit_caps_prompt_recipes() {
    let chat = ScriptedChat::new(Some("Muffins: ..."), GOOD_VERDICT);
    let config = PipelineConfig {
        limit: 2,
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::new(
        retriever(vec!["A", "B", "C"], vec!["B", "A", "D"]),
        chat.clone(),
        CostTable::default(),
        config,
    );

    pipeline.run("muffins", None).await.unwrap();

    let prompt = &chat.requests()[0].messages[0].content;
    assert!(prompt.contains("Here are the top 2 potentially relevant recipes"));
    assert!(prompt.contains("Recipe A"));
    assert!(prompt.contains("Recipe B"));
    assert!(!prompt.contains("Recipe C"));
}
