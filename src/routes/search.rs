use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::search::{SearchRequest, SearchResponse},
    error::AppResult,
    response::ApiResponse,
    services::search_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(search_products))
}

#[utoipa::path(
    post,
    path = "/api/search",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Semantic product search", body = ApiResponse<SearchResponse>),
        (status = 400, description = "Empty query or semantic search not configured"),
        (status = 502, description = "Vector store or embeddings endpoint unavailable"),
    ),
    tag = "Search"
)]
pub async fn search_products(
    State(state): State<AppState>,
    Json(payload): Json<SearchRequest>,
) -> AppResult<Json<ApiResponse<SearchResponse>>> {
    let resp = search_service::search(&state, payload).await?;
    Ok(Json(resp))
}
