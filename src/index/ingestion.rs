//! Recipe ingestion: dataset -> dense + sparse points in the index

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::{BakeError, Result};
use crate::index::embedding::Embedder;
use crate::index::sparse::Bm25Encoder;
use crate::index::vector_db::{IndexedRecipe, RecipeIndex};
use crate::types::RecipeDocument;

/// Default number of recipes embedded and upserted per request
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Outcome of one ingestion run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestReport {
    pub recipes: usize,
    pub batches: usize,
    /// Points in the collection once the run finished
    pub indexed: u64,
}

/// Read the recipe dataset (a JSON array)
pub fn load_recipes(path: &Path) -> Result<Vec<RecipeDocument>> {
    let contents = std::fs::read_to_string(path)?;
    let recipes: Vec<RecipeDocument> = serde_json::from_str(&contents)?;
    Ok(recipes)
}

/// Writes recipes into the index with both representations
pub struct Ingestor {
    embedder: Arc<dyn Embedder>,
    encoder: Bm25Encoder,
    index: Arc<dyn RecipeIndex>,
    batch_size: usize,
}

impl Ingestor {
    pub fn new(embedder: Arc<dyn Embedder>, encoder: Bm25Encoder, index: Arc<dyn RecipeIndex>) -> Self {
        Self {
            embedder,
            encoder,
            index,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Embed, encode and upsert every recipe. A recipe only becomes
    /// visible once its batch is written with both vectors.
    pub async fn ingest(&self, recipes: &[RecipeDocument]) -> Result<IngestReport> {
        self.index.ensure_collection().await?;

        let mut report = IngestReport::default();
        for batch in recipes.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(RecipeDocument::index_text).collect();
            let dense = self.embedder.embed(&texts).await?;
            if dense.len() != batch.len() {
                return Err(BakeError::EmbeddingError(format!(
                    "expected {} vectors, got {}",
                    batch.len(),
                    dense.len()
                )));
            }

            let points: Vec<IndexedRecipe> = batch
                .iter()
                .zip(texts.iter())
                .zip(dense)
                .map(|((recipe, text), vector)| IndexedRecipe {
                    id: recipe.id,
                    dense: vector,
                    sparse: self.encoder.encode_document(text),
                    payload: recipe.payload(),
                })
                .collect();

            self.index.upsert(points).await?;
            report.recipes += batch.len();
            report.batches += 1;
            debug!(written = report.recipes, total = recipes.len(), "batch upserted");
        }

        report.indexed = self.index.point_count().await?;
        info!(
            recipes = report.recipes,
            batches = report.batches,
            indexed = report.indexed,
            "ingestion finished"
        );
        Ok(report)
    }
}
