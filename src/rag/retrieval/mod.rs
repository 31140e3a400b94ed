// Hybrid retrieval over the recipe index
pub mod engine;
pub mod sources;

pub use engine::{FusionRetriever, SearchParams, DEFAULT_CANDIDATE_MULTIPLIER, DEFAULT_RRF_K};
pub use sources::{Candidate, DenseSource, RankedSource, SourceKind, SparseSource};
