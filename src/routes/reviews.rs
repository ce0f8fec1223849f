use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::reviews::{CreateReviewRequest, ReviewDto},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::review_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_review))
}

#[utoipa::path(
    post,
    path = "/api/reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Create review", body = ApiResponse<ReviewDto>),
        (status = 400, description = "Invalid rating, unknown product or duplicate review"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn create_review(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateReviewRequest>,
) -> AppResult<Json<ApiResponse<ReviewDto>>> {
    let resp = review_service::create_review(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}
