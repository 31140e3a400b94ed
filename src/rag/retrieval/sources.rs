// Ranked candidate sources backed by the recipe index
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::errors::Result;
use crate::index::embedding::Embedder;
use crate::index::sparse::Bm25Encoder;
use crate::index::vector_db::{IndexHit, RecipeIndex};

/// Which representation a candidate list was ranked by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Dense,
    Sparse,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Dense => f.write_str("dense"),
            SourceKind::Sparse => f.write_str("sparse"),
        }
    }
}

/// A retrieved document, identified by its point id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub payload: Map<String, Value>,
}

impl From<IndexHit> for Candidate {
    fn from(hit: IndexHit) -> Self {
        Self {
            id: hit.id,
            payload: hit.payload,
        }
    }
}

/// Anything that returns candidates best-first for a query
#[async_trait]
pub trait RankedSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// At most `count` candidates, best first
    async fn candidates(&self, query: &str, count: usize) -> Result<Vec<Candidate>>;
}

/// Cosine similarity over embedded recipes
pub struct DenseSource {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn RecipeIndex>,
}

impl DenseSource {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn RecipeIndex>) -> Self {
        Self { embedder, index }
    }
}

#[async_trait]
impl RankedSource for DenseSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Dense
    }

    async fn candidates(&self, query: &str, count: usize) -> Result<Vec<Candidate>> {
        let vector = self.embedder.embed_one(query).await?;
        let hits = self.index.query_dense(vector, count).await?;
        Ok(hits.into_iter().map(Candidate::from).collect())
    }
}

/// BM25 over the sparse term vectors
pub struct SparseSource {
    encoder: Bm25Encoder,
    index: Arc<dyn RecipeIndex>,
}

impl SparseSource {
    pub fn new(encoder: Bm25Encoder, index: Arc<dyn RecipeIndex>) -> Self {
        Self { encoder, index }
    }
}

#[async_trait]
impl RankedSource for SparseSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Sparse
    }

    async fn candidates(&self, query: &str, count: usize) -> Result<Vec<Candidate>> {
        let vector = self.encoder.encode_query(query);
        // Nothing to match on (only stop words)
        if vector.is_empty() {
            return Ok(Vec::new());
        }
        let hits = self.index.query_sparse(vector, count).await?;
        Ok(hits.into_iter().map(Candidate::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::sparse::SparseVector;
    use crate::index::vector_db::IndexedRecipe;
    use std::sync::Mutex;

    struct OneHotEmbedder;

    #[async_trait]
    impl Embedder for OneHotEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    #[derive(Default)]
    struct RecordingIndex {
        dense_calls: Mutex<Vec<usize>>,
        sparse_calls: Mutex<Vec<SparseVector>>,
    }

    fn hit(id: &str) -> IndexHit {
        IndexHit {
            id: id.to_string(),
            score: 0.5,
            payload: Map::new(),
        }
    }

    #[async_trait]
    impl RecipeIndex for RecordingIndex {
        async fn ensure_collection(&self) -> Result<()> {
            Ok(())
        }

        async fn upsert(&self, _recipes: Vec<IndexedRecipe>) -> Result<()> {
            Ok(())
        }

        async fn query_dense(&self, _vector: Vec<f32>, limit: usize) -> Result<Vec<IndexHit>> {
            self.dense_calls.lock().unwrap().push(limit);
            Ok(vec![hit("1"), hit("2")])
        }

        async fn query_sparse(&self, vector: SparseVector, _limit: usize) -> Result<Vec<IndexHit>> {
            self.sparse_calls.lock().unwrap().push(vector);
            Ok(vec![hit("2")])
        }

        async fn point_count(&self) -> Result<u64> {
            Ok(2)
        }
    }

    #[tokio::test]
    async fn test_dense_source_passes_count() {
        let index = Arc::new(RecordingIndex::default());
        let source = DenseSource::new(Arc::new(OneHotEmbedder), index.clone());

        let candidates = source.candidates("lemon drizzle", 9).await.unwrap();
        assert_eq!(source.kind(), SourceKind::Dense);
        assert_eq!(candidates.len(), 2);
        assert_eq!(*index.dense_calls.lock().unwrap(), vec![9]);
    }

    #[tokio::test]
    async fn test_sparse_source_encodes_query() {
        let index = Arc::new(RecordingIndex::default());
        let source = SparseSource::new(Bm25Encoder::new(), index.clone());

        let candidates = source.candidates("lemon drizzle cake", 3).await.unwrap();
        assert_eq!(candidates[0].id, "2");

        let calls = index.sparse_calls.lock().unwrap();
        assert_eq!(calls[0].len(), 3);
    }

    #[tokio::test]
    async fn test_sparse_source_skips_stop_word_query() {
        let index = Arc::new(RecordingIndex::default());
        let source = SparseSource::new(Bm25Encoder::new(), index.clone());

        let candidates = source.candidates("what is the", 3).await.unwrap();
        assert!(candidates.is_empty());
        assert!(index.sparse_calls.lock().unwrap().is_empty());
    }
}
