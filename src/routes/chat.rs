use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::chat::{AgentChatRequest, AgentChatResponse},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::agent_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(chat))
        .route("/authenticated", post(chat_authenticated))
}

#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = AgentChatRequest,
    responses(
        (status = 200, description = "Chat with the shopping agent", body = ApiResponse<AgentChatResponse>),
    ),
    tag = "Chat"
)]
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<AgentChatRequest>,
) -> AppResult<Json<ApiResponse<AgentChatResponse>>> {
    let resp = agent_service::process_message(&state, payload, None).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/chat/authenticated",
    request_body = AgentChatRequest,
    responses(
        (status = 200, description = "Chat with the shopping agent as the caller", body = ApiResponse<AgentChatResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Chat"
)]
pub async fn chat_authenticated(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AgentChatRequest>,
) -> AppResult<Json<ApiResponse<AgentChatResponse>>> {
    let resp = agent_service::process_message(&state, payload, Some(user.user_id)).await?;
    Ok(Json(resp))
}
