use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const PINECONE_CONTROL_PLANE: &str = "https://api.pinecone.io";

/// Client for an OpenAI-compatible `/embeddings` endpoint.
#[derive(Clone)]
pub struct EmbeddingClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl EmbeddingClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: OPENAI_BASE_URL.to_string(),
            api_key: config.openai_api_key.clone(),
            model: config.embedding_model.clone(),
            dimension: config.embedding_dimension,
        }
    }

    pub async fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let body = json!({
            "model": self.model,
            "input": texts,
            "dimensions": self.dimension,
        });

        let resp = self
            .http
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<EmbeddingResponse>()
            .await?;

        Ok(resp.data.into_iter().map(|d| d.embedding).collect())
    }

    pub async fn embed_one(&self, text: &str) -> AppResult<Vec<f32>> {
        let input = [text.to_string()];
        let mut vectors = self.embed(&input).await?;
        vectors.pop().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("embeddings endpoint returned no vectors"))
        })
    }
}

/// A vector plus its metadata, as stored in the index.
#[derive(Debug, Clone, Serialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoredMatch {
    pub id: String,
    pub score: f64,
    #[serde(default)]
    pub metadata: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<ScoredMatch>,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
}

/// Client for the Pinecone REST data plane of a single index.
#[derive(Clone)]
pub struct PineconeClient {
    http: reqwest::Client,
    api_key: String,
    pub index_name: String,
    data_url: String,
}

impl PineconeClient {
    /// Resolve the index host, creating the index when it does not exist yet.
    /// Returns `None` when no API key is configured.
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Option<Self>> {
        if config.pinecone_api_key.is_empty() {
            return Ok(None);
        }

        let http = reqwest::Client::new();
        let describe_url = format!(
            "{PINECONE_CONTROL_PLANE}/indexes/{}",
            config.pinecone_index_name
        );

        let resp = http
            .get(&describe_url)
            .header("Api-Key", &config.pinecone_api_key)
            .send()
            .await?;

        let description = if resp.status() == reqwest::StatusCode::NOT_FOUND {
            let body = json!({
                "name": config.pinecone_index_name,
                "dimension": config.embedding_dimension,
                "metric": "cosine",
                "spec": {
                    "serverless": {
                        "cloud": config.pinecone_cloud,
                        "region": config.pinecone_region,
                    }
                }
            });
            tracing::info!(index = %config.pinecone_index_name, "creating vector index");
            http.post(format!("{PINECONE_CONTROL_PLANE}/indexes"))
                .header("Api-Key", &config.pinecone_api_key)
                .json(&body)
                .send()
                .await?
                .error_for_status()?
                .json::<IndexDescription>()
                .await?
        } else {
            resp.error_for_status()?.json::<IndexDescription>().await?
        };

        Ok(Some(Self {
            http,
            api_key: config.pinecone_api_key.clone(),
            index_name: config.pinecone_index_name.clone(),
            data_url: format!("https://{}", description.host),
        }))
    }

    pub async fn upsert(&self, vectors: &[VectorRecord]) -> AppResult<()> {
        if vectors.is_empty() {
            return Ok(());
        }
        self.http
            .post(format!("{}/vectors/upsert", self.data_url))
            .header("Api-Key", &self.api_key)
            .json(&json!({ "vectors": vectors }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn query(
        &self,
        values: &[f32],
        top_k: usize,
        filter: Option<Value>,
    ) -> AppResult<Vec<ScoredMatch>> {
        let mut body = json!({
            "vector": values,
            "topK": top_k,
            "includeMetadata": true,
        });
        if let Some(filter) = filter {
            body["filter"] = filter;
        }

        let resp = self
            .http
            .post(format!("{}/query", self.data_url))
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<QueryResponse>()
            .await?;

        Ok(resp.matches)
    }

    pub async fn delete(&self, ids: &[String]) -> AppResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.http
            .post(format!("{}/vectors/delete", self.data_url))
            .header("Api-Key", &self.api_key)
            .json(&json!({ "ids": ids }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Build a Pinecone metadata filter from search parameters. Price bounds are
/// merged into a single range clause when both are present.
pub fn build_metadata_filter(
    category: Option<&str>,
    min_price: Option<f64>,
    max_price: Option<f64>,
) -> Option<Value> {
    let mut filter = serde_json::Map::new();

    if let Some(category) = category.filter(|c| !c.is_empty()) {
        filter.insert("category".to_string(), json!({ "$eq": category }));
    }

    match (min_price, max_price) {
        (Some(min), Some(max)) => {
            filter.insert("price".to_string(), json!({ "$gte": min, "$lte": max }));
        }
        (Some(min), None) => {
            filter.insert("price".to_string(), json!({ "$gte": min }));
        }
        (None, Some(max)) => {
            filter.insert("price".to_string(), json!({ "$lte": max }));
        }
        (None, None) => {}
    }

    if filter.is_empty() {
        None
    } else {
        Some(Value::Object(filter))
    }
}
