// Recipe index: embeddings, BM25 encoding, Qdrant storage and ingestion
//
// Every recipe is stored once with a dense vector and a sparse vector
// under the same point id, which is what lets retrieval fuse the two
// candidate lists by id.

pub mod embedding;
pub mod ingestion;
pub mod sparse;
pub mod vector_db;

pub use embedding::{Embedder, HttpEmbedder};
pub use ingestion::{load_recipes, IngestReport, Ingestor};
pub use sparse::{Bm25Encoder, Bm25Params, SparseVector};
pub use vector_db::{IndexHit, IndexedRecipe, QdrantIndex, RecipeIndex};
