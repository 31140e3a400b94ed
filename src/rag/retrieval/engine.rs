// Hybrid retrieval: query every ranked source concurrently, fuse with RRF
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::errors::{BakeError, Result};
use crate::index::embedding::Embedder;
use crate::index::sparse::Bm25Encoder;
use crate::index::vector_db::RecipeIndex;
use crate::rag::reranking::{reciprocal_rank_fusion, FusedResult, SourceResults};
use crate::rag::retrieval::sources::{DenseSource, RankedSource, SparseSource};

/// RRF smoothing constant
pub const DEFAULT_RRF_K: f64 = 60.0;

/// Candidates fetched per source for every result returned
pub const DEFAULT_CANDIDATE_MULTIPLIER: usize = 3;

/// Fusion parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    pub rrf_k: f64,
    pub candidate_multiplier: usize,
}

impl SearchParams {
    /// Smallest accepted smoothing constant
    pub const MIN_RRF_K: f64 = 1.0;

    /// Params with `rrf_k` clamped to `MIN_RRF_K` (non-finite falls back to
    /// the default) and at least one candidate per result
    pub fn sanitized(self) -> Self {
        let rrf_k = if self.rrf_k.is_finite() {
            self.rrf_k.max(Self::MIN_RRF_K)
        } else {
            DEFAULT_RRF_K
        };
        Self {
            rrf_k,
            candidate_multiplier: self.candidate_multiplier.max(1),
        }
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            rrf_k: DEFAULT_RRF_K,
            candidate_multiplier: DEFAULT_CANDIDATE_MULTIPLIER,
        }
    }
}

/// Retriever fusing several ranked sources by document id
pub struct FusionRetriever {
    sources: Vec<Arc<dyn RankedSource>>,
    params: SearchParams,
}

impl FusionRetriever {
    /// Create retriever over the given sources (fusion tie-breaks follow
    /// their order)
    pub fn new(sources: Vec<Arc<dyn RankedSource>>) -> Self {
        Self::with_params(sources, SearchParams::default())
    }

    pub fn with_params(sources: Vec<Arc<dyn RankedSource>>, params: SearchParams) -> Self {
        Self {
            sources,
            params: params.sanitized(),
        }
    }

    /// Dense + sparse retriever over one index
    pub fn hybrid(
        embedder: Arc<dyn Embedder>,
        encoder: Bm25Encoder,
        index: Arc<dyn RecipeIndex>,
        params: SearchParams,
    ) -> Self {
        let dense: Arc<dyn RankedSource> = Arc::new(DenseSource::new(embedder, index.clone()));
        let sparse: Arc<dyn RankedSource> = Arc::new(SparseSource::new(encoder, index));
        Self::with_params(vec![dense, sparse], params)
    }

    /// Top `limit` fused results. Empty when every source comes back empty;
    /// an error when any source fails.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<FusedResult>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let count = limit.saturating_mul(self.params.candidate_multiplier);
        let lists = try_join_all(self.sources.iter().map(|source| async move {
            let candidates = source.candidates(query, count).await?;
            debug!(source = %source.kind(), candidates = candidates.len(), "source answered");
            Ok::<_, BakeError>(SourceResults::new(source.kind(), candidates))
        }))
        .await?;

        let fused = reciprocal_rank_fusion(lists, self.params.rrf_k, limit);
        debug!(limit, results = fused.len(), "fused retrieval results");
        Ok(fused)
    }
}
