use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::chat::ConversationHistory,
    error::AppResult,
    response::ApiResponse,
    services::agent_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{session_id}", get(get_conversation))
}

#[utoipa::path(
    get,
    path = "/api/conversations/{session_id}",
    params(
        ("session_id" = Uuid, Path, description = "Conversation session ID")
    ),
    responses(
        (status = 200, description = "Conversation transcript", body = ApiResponse<ConversationHistory>),
        (status = 404, description = "Session not found"),
    ),
    tag = "Chat"
)]
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ConversationHistory>>> {
    let resp = agent_service::get_conversation(&state, session_id).await?;
    Ok(Json(resp))
}
