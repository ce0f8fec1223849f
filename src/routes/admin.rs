use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::search::IndexReport,
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::search_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/index-products", post(index_products))
}

#[utoipa::path(
    post,
    path = "/api/admin/index-products",
    responses(
        (status = 200, description = "Re-index all active products", body = ApiResponse<IndexReport>),
        (status = 400, description = "Semantic search is not configured"),
        (status = 403, description = "Forbidden"),
        (status = 502, description = "Vector store or embeddings endpoint unavailable"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn index_products(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<IndexReport>>> {
    let resp = search_service::index_all_products(&state, &user).await?;
    Ok(Json(resp))
}
