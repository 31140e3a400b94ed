// Retrieval-augmented answering over the recipe index
//
// Components:
// - Retrieval: dense and sparse ranked sources queried concurrently
// - Re-ranking: reciprocal rank fusion by recipe id
// - Context: prompt assembly from the fused recipes
// - Pipeline: per-question stage machine from retrieval to pricing

pub mod context;
pub mod pipeline;
pub mod reranking;
pub mod retrieval;
pub mod state;

pub use context::{PromptAssembler, NO_RECIPE_FALLBACK};
pub use pipeline::{Pipeline, PipelineConfig};
pub use reranking::{reciprocal_rank_fusion, FusedResult};
pub use retrieval::{FusionRetriever, RankedSource, SearchParams};
pub use state::PipelineStage;
