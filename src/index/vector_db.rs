//! Qdrant recipe index
//!
//! One collection, one point per recipe. Each point carries a named dense
//! vector and a named sparse vector under the same id, plus the recipe
//! payload.
use async_trait::async_trait;
use qdrant_client::qdrant::{
    point_id::PointIdOptions, value::Kind, CreateCollectionBuilder, Distance, ListValue,
    Modifier, NamedVectors, PointId, PointStruct, ScoredPoint, SearchPointsBuilder,
    SparseIndices, SparseVectorParamsBuilder, SparseVectorsConfigBuilder, Struct,
    UpsertPointsBuilder, Value as QdrantValue, Vector, VectorParamsBuilder, VectorsConfigBuilder,
};
use qdrant_client::Qdrant;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::IndexConfig;
use crate::errors::Result;
use crate::index::sparse::SparseVector;

/// A recipe ready to be written: both representations share `id`
#[derive(Debug, Clone)]
pub struct IndexedRecipe {
    pub id: u64,
    pub dense: Vec<f32>,
    pub sparse: SparseVector,
    pub payload: Map<String, JsonValue>,
}

/// One point returned by a search, in index order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexHit {
    pub id: String,
    pub score: f32,
    pub payload: Map<String, JsonValue>,
}

/// Read/write access to the recipe index
#[async_trait]
pub trait RecipeIndex: Send + Sync {
    /// Create the collection if it does not exist yet
    async fn ensure_collection(&self) -> Result<()>;

    async fn upsert(&self, recipes: Vec<IndexedRecipe>) -> Result<()>;

    /// Cosine-similarity search over the dense vectors
    async fn query_dense(&self, vector: Vec<f32>, limit: usize) -> Result<Vec<IndexHit>>;

    /// BM25 search over the sparse vectors
    async fn query_sparse(&self, vector: SparseVector, limit: usize) -> Result<Vec<IndexHit>>;

    /// Number of indexed recipes
    async fn point_count(&self) -> Result<u64>;
}

/// Qdrant-backed recipe index
pub struct QdrantIndex {
    client: Qdrant,
    config: IndexConfig,
}

impl QdrantIndex {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        let mut builder = Qdrant::from_url(&config.url);
        if let Some(key) = config.api_key() {
            builder = builder.api_key(key);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    pub fn collection(&self) -> &str {
        &self.config.collection
    }
}

#[async_trait]
impl RecipeIndex for QdrantIndex {
    async fn ensure_collection(&self) -> Result<()> {
        let collection = &self.config.collection;
        if self.client.collection_exists(collection.clone()).await? {
            debug!(collection = %collection, "collection already exists");
            return Ok(());
        }

        let mut vectors = VectorsConfigBuilder::default();
        vectors.add_named_vector_params(
            &self.config.dense_vector,
            VectorParamsBuilder::new(self.config.dense_dim, Distance::Cosine),
        );

        let mut sparse = SparseVectorsConfigBuilder::default();
        sparse.add_named_vector_params(
            &self.config.sparse_vector,
            SparseVectorParamsBuilder::default().modifier(Modifier::Idf),
        );

        self.client
            .create_collection(
                CreateCollectionBuilder::new(collection)
                    .vectors_config(vectors)
                    .sparse_vectors_config(sparse),
            )
            .await?;

        info!(collection = %collection, dim = self.config.dense_dim, "created collection");
        Ok(())
    }

    async fn upsert(&self, recipes: Vec<IndexedRecipe>) -> Result<()> {
        if recipes.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = recipes
            .into_iter()
            .map(|recipe| {
                let vectors = NamedVectors::default()
                    .add_vector(&self.config.dense_vector, Vector::new_dense(recipe.dense))
                    .add_vector(
                        &self.config.sparse_vector,
                        Vector::new_sparse(recipe.sparse.indices, recipe.sparse.values),
                    );

                let payload: HashMap<String, QdrantValue> = recipe
                    .payload
                    .into_iter()
                    .map(|(key, value)| (key, json_to_qdrant_value(value)))
                    .collect();

                PointStruct::new(recipe.id, vectors, payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.config.collection, points).wait(true))
            .await?;

        Ok(())
    }

    async fn query_dense(&self, vector: Vec<f32>, limit: usize) -> Result<Vec<IndexHit>> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.config.collection, vector, limit as u64)
                    .vector_name(&self.config.dense_vector)
                    .with_payload(true),
            )
            .await?;

        Ok(response.result.into_iter().map(scored_point_to_hit).collect())
    }

    async fn query_sparse(&self, vector: SparseVector, limit: usize) -> Result<Vec<IndexHit>> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.config.collection, vector.values, limit as u64)
                    .vector_name(&self.config.sparse_vector)
                    .sparse_indices(SparseIndices {
                        data: vector.indices,
                    })
                    .with_payload(true),
            )
            .await?;

        Ok(response.result.into_iter().map(scored_point_to_hit).collect())
    }

    async fn point_count(&self) -> Result<u64> {
        let info = self.client.collection_info(self.config.collection.clone()).await?;
        Ok(info.result.and_then(|r| r.points_count).unwrap_or(0))
    }
}

fn scored_point_to_hit(point: ScoredPoint) -> IndexHit {
    let payload = point
        .payload
        .into_iter()
        .map(|(key, value)| (key, qdrant_to_json_value(&value)))
        .collect();

    IndexHit {
        id: point_id_to_string(&point.id),
        score: point.score,
        payload,
    }
}

// Helper functions for type conversions
fn json_to_qdrant_value(json: JsonValue) -> QdrantValue {
    let kind = match json {
        JsonValue::Null => Kind::NullValue(0),
        JsonValue::Bool(b) => Kind::BoolValue(b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Kind::IntegerValue(i),
            None => Kind::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        JsonValue::String(s) => Kind::StringValue(s),
        JsonValue::Array(items) => Kind::ListValue(ListValue {
            values: items.into_iter().map(json_to_qdrant_value).collect(),
        }),
        JsonValue::Object(map) => Kind::StructValue(Struct {
            fields: map
                .into_iter()
                .map(|(key, value)| (key, json_to_qdrant_value(value)))
                .collect(),
        }),
    };

    QdrantValue { kind: Some(kind) }
}

fn qdrant_to_json_value(value: &QdrantValue) -> JsonValue {
    match &value.kind {
        Some(Kind::NullValue(_)) | None => JsonValue::Null,
        Some(Kind::BoolValue(b)) => JsonValue::Bool(*b),
        Some(Kind::IntegerValue(i)) => JsonValue::Number((*i).into()),
        Some(Kind::DoubleValue(f)) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Some(Kind::StringValue(s)) => JsonValue::String(s.clone()),
        Some(Kind::ListValue(list)) => {
            JsonValue::Array(list.values.iter().map(qdrant_to_json_value).collect())
        }
        Some(Kind::StructValue(object)) => JsonValue::Object(
            object
                .fields
                .iter()
                .map(|(key, value)| (key.clone(), qdrant_to_json_value(value)))
                .collect(),
        ),
    }
}

fn point_id_to_string(point_id: &Option<PointId>) -> String {
    point_id
        .as_ref()
        .and_then(|id| match &id.point_id_options {
            Some(PointIdOptions::Num(n)) => Some(n.to_string()),
            Some(PointIdOptions::Uuid(u)) => Some(u.clone()),
            None => None,
        })
        .unwrap_or_else(|| "unknown".to_string())
}
