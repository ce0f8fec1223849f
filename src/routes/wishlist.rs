use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    dto::wishlist::WishlistProductList,
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::wishlist_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_wishlist))
        .route("/{product_id}", post(add_to_wishlist))
        .route("/{product_id}", delete(remove_from_wishlist))
}

#[utoipa::path(
    get,
    path = "/api/wishlist",
    responses(
        (status = 200, description = "List wishlist products", body = ApiResponse<WishlistProductList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn list_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<WishlistProductList>>> {
    let resp = wishlist_service::list_wishlist(&state.pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/wishlist/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Added to wishlist", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = wishlist_service::add_to_wishlist(&state.pool, &user, product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/wishlist/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Removed from wishlist", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Wishlist item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = wishlist_service::remove_from_wishlist(&state.pool, &user, product_id).await?;
    Ok(Json(resp))
}
