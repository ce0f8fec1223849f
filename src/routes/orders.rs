use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::orders::{CreateOrderRequest, OrderList, OrderWithItems},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_orders).post(create_order))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Create order from item list", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Empty order, unknown product or insufficient stock"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::create_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "List caller's orders with items", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user).await?;
    Ok(Json(resp))
}
