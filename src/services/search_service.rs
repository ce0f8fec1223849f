use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::search::{IndexReport, RecommendationList, SearchRequest, SearchResponse, SearchResultDto},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::{ApiResponse, Meta},
    state::AppState,
    vectors::{PineconeClient, VectorRecord, build_metadata_filter},
};

const INDEX_BATCH_SIZE: usize = 100;
const MAX_SEARCH_LIMIT: usize = 50;
/// Looser threshold for similar-product lookups, matching the search default's
/// intent of filtering noise without starving recommendations.
const RECOMMENDATION_MIN_SCORE: f64 = 0.2;

fn require_vectors(state: &AppState) -> AppResult<&PineconeClient> {
    state
        .vectors
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("Semantic search is not configured".to_string()))
}

/// Searchable text representation of a product, empty parts skipped.
pub fn product_to_text(product: &Product) -> String {
    let price = format!("price ${}", product.price);
    let parts = [
        product.name.as_str(),
        product.description.as_deref().unwrap_or(""),
        product.category.as_str(),
        product.brand.as_deref().unwrap_or(""),
        price.as_str(),
    ];
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Metadata stored alongside the product vector.
pub fn product_to_metadata(product: &Product) -> Value {
    json!({
        "product_id": product.id,
        "name": product.name,
        "category": product.category,
        "brand": product.brand.as_deref().unwrap_or(""),
        "price": product.price,
        "stock_quantity": product.stock_quantity,
        "is_active": product.is_active,
    })
}

pub async fn index_product(state: &AppState, product: &Product) -> AppResult<()> {
    let vectors = require_vectors(state)?;
    let embedding = state.embedder.embed_one(&product_to_text(product)).await?;
    vectors
        .upsert(&[VectorRecord {
            id: product.id.to_string(),
            values: embedding,
            metadata: product_to_metadata(product),
        }])
        .await
}

pub async fn remove_product(state: &AppState, product_id: Uuid) -> AppResult<()> {
    let vectors = require_vectors(state)?;
    vectors.delete(&[product_id.to_string()]).await
}

/// Re-embed and upsert every active product, in batches.
pub async fn index_all_products(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<IndexReport>> {
    ensure_admin(user)?;
    let vectors = require_vectors(state)?;

    let products: Vec<Product> =
        sqlx::query_as("SELECT * FROM products WHERE is_active = TRUE ORDER BY created_at")
            .fetch_all(&state.pool)
            .await?;

    for batch in products.chunks(INDEX_BATCH_SIZE) {
        let texts: Vec<String> = batch.iter().map(product_to_text).collect();
        let embeddings = state.embedder.embed(&texts).await?;
        let records: Vec<VectorRecord> = batch
            .iter()
            .zip(embeddings)
            .map(|(product, values)| VectorRecord {
                id: product.id.to_string(),
                values,
                metadata: product_to_metadata(product),
            })
            .collect();
        vectors.upsert(&records).await?;
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "index_products",
        Some("products"),
        Some(json!({ "indexed": products.len() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let indexed = products.len();
    Ok(ApiResponse::success(
        format!("Successfully indexed {indexed} products"),
        IndexReport { indexed },
        Some(Meta::empty()),
    ))
}

/// Core nearest-neighbor lookup: embed the query, filter by metadata, then
/// hydrate surviving matches from the database. Inactive products and hits
/// below `min_score` are dropped.
pub async fn search_results(
    state: &AppState,
    query: &str,
    top_k: usize,
    category: Option<&str>,
    min_price: Option<f64>,
    max_price: Option<f64>,
    min_score: f64,
) -> AppResult<Vec<SearchResultDto>> {
    let vectors = require_vectors(state)?;

    let embedding = state.embedder.embed_one(query).await?;
    let filter = build_metadata_filter(category, min_price, max_price);
    let matches = vectors.query(&embedding, top_k, filter).await?;

    let mut results = Vec::with_capacity(matches.len());
    for m in matches {
        if m.score < min_score {
            continue;
        }
        let Ok(product_id) = Uuid::parse_str(&m.id) else {
            tracing::warn!(vector_id = %m.id, "non-uuid id in vector index, skipping");
            continue;
        };
        let product: Option<Product> =
            sqlx::query_as("SELECT * FROM products WHERE id = $1 AND is_active = TRUE")
                .bind(product_id)
                .fetch_optional(&state.pool)
                .await?;
        if let Some(product) = product {
            results.push(SearchResultDto {
                product,
                similarity: (m.score * 10_000.0).round() / 10_000.0,
            });
        }
    }

    Ok(results)
}

pub async fn search(
    state: &AppState,
    payload: SearchRequest,
) -> AppResult<ApiResponse<SearchResponse>> {
    if payload.query.trim().is_empty() {
        return Err(AppError::BadRequest("query must not be empty".to_string()));
    }

    let top_k = payload
        .limit
        .unwrap_or(state.config.search_top_k)
        .clamp(1, MAX_SEARCH_LIMIT);

    let results = search_results(
        state,
        &payload.query,
        top_k,
        payload.category.as_deref(),
        payload.min_price,
        payload.max_price,
        state.config.search_min_score,
    )
    .await?;

    let total = results.len();
    Ok(ApiResponse::success(
        "Search results",
        SearchResponse { results, total },
        Some(Meta::empty()),
    ))
}

/// Similar products for a given product: embed its own text and query around
/// it, dropping the product itself from the hits. Unknown products yield an
/// empty list rather than an error.
pub async fn similar_products(
    state: &AppState,
    product_id: Uuid,
    limit: usize,
) -> AppResult<Vec<SearchResultDto>> {
    let product: Option<Product> = sqlx::query_as("SELECT * FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(&state.pool)
        .await?;

    let Some(product) = product else {
        return Ok(Vec::new());
    };

    let results = search_results(
        state,
        &product_to_text(&product),
        limit + 1,
        None,
        None,
        None,
        RECOMMENDATION_MIN_SCORE,
    )
    .await?;

    Ok(results
        .into_iter()
        .filter(|r| r.product.id != product_id)
        .take(limit)
        .collect())
}

pub async fn recommendations(
    state: &AppState,
    product_id: Uuid,
    limit: usize,
) -> AppResult<ApiResponse<RecommendationList>> {
    let recommendations = similar_products(state, product_id, limit).await?;
    Ok(ApiResponse::success(
        "Recommendations",
        RecommendationList { recommendations },
        Some(Meta::empty()),
    ))
}
