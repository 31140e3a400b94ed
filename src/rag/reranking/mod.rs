// Rank fusion of the per-source candidate lists
pub mod rrf;

pub use rrf::{reciprocal_rank_fusion, FusedResult, RankedCandidate, SourceResults};
