use axum::{
    Json, Router,
    extract::State,
    routing::{get, post, put},
};

use crate::{
    dto::auth::{
        ChangePasswordRequest, LoginRequest, RegisterRequest, TokenResponse,
        UpdateProfileRequest, UserResponse,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/update-profile", put(update_profile))
        .route("/change-password", put(change_password))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Register user", body = ApiResponse<UserResponse>),
        (status = 400, description = "Email already registered")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let resp = auth_service::register_user(&state.pool, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<TokenResponse>),
        (status = 401, description = "Incorrect email or password")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<TokenResponse>>> {
    let resp = auth_service::login_user(&state.pool, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current profile", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let resp = auth_service::current_profile(&state.pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/auth/update-profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Email already registered")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let resp = auth_service::update_profile(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Current password is incorrect")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = auth_service::change_password(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}
