use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::auth::{
        ChangePasswordRequest, Claims, LoginRequest, RegisterRequest, TokenResponse,
        UpdateProfileRequest, UserResponse,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
};

const ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 30;

pub async fn register_user(
    pool: &DbPool,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<UserResponse>> {
    let RegisterRequest {
        email,
        password,
        full_name,
    } = payload;

    let exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(pool)
        .await?;

    if exist.is_some() {
        return Err(AppError::BadRequest("Email already registered".to_string()));
    }

    let password_hash = hash_password(&password)?;
    let id = Uuid::new_v4();

    let user: User = sqlx::query_as(
        "INSERT INTO users (id, email, password_hash, full_name) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(id)
    .bind(email.as_str())
    .bind(password_hash)
    .bind(full_name.as_str())
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.id),
        "user_register",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("User created", user.into(), None))
}

pub async fn login_user(
    pool: &DbPool,
    payload: LoginRequest,
) -> AppResult<ApiResponse<TokenResponse>> {
    let LoginRequest { email, password } = payload;
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(pool)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::Unauthorized("Incorrect email or password".into())),
    };

    verify_password(&password, &user.password_hash)
        .map_err(|_| AppError::Unauthorized("Incorrect email or password".into()))?;

    let token = issue_token(&user)?;

    if let Err(err) = log_audit(
        pool,
        Some(user.id),
        "user_login",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Logged in",
        TokenResponse {
            access_token: token,
            token_type: "bearer".to_string(),
        },
        Some(Meta::empty()),
    ))
}

pub async fn current_profile(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = fetch_user(pool, user.user_id).await?;
    Ok(ApiResponse::success("Profile", user.into(), None))
}

pub async fn update_profile(
    pool: &DbPool,
    auth: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = fetch_user(pool, auth.user_id).await?;

    if payload.email != user.email {
        let taken: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
            .bind(payload.email.as_str())
            .fetch_optional(pool)
            .await?;
        if taken.is_some() {
            return Err(AppError::BadRequest("Email already registered".to_string()));
        }
    }

    let password_hash = match payload.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => hash_password(password)?,
        None => user.password_hash,
    };

    let updated: User = sqlx::query_as(
        r#"
        UPDATE users
        SET email = $2, full_name = $3, password_hash = $4, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(auth.user_id)
    .bind(payload.email.as_str())
    .bind(payload.full_name.as_str())
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(auth.user_id),
        "profile_update",
        Some("users"),
        Some(serde_json::json!({ "user_id": auth.user_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Profile updated", updated.into(), None))
}

pub async fn change_password(
    pool: &DbPool,
    auth: &AuthUser,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let user = fetch_user(pool, auth.user_id).await?;

    verify_password(&payload.current_password, &user.password_hash)
        .map_err(|_| AppError::BadRequest("Current password is incorrect".into()))?;

    let password_hash = hash_password(&payload.new_password)?;
    sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
        .bind(auth.user_id)
        .bind(password_hash)
        .execute(pool)
        .await?;

    if let Err(err) = log_audit(
        pool,
        Some(auth.user_id),
        "password_change",
        Some("users"),
        Some(serde_json::json!({ "user_id": auth.user_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Password changed successfully",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn fetch_user(pool: &DbPool, id: Uuid) -> AppResult<User> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    user.ok_or(AppError::NotFound)
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<(), AppError> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::BadRequest("Invalid password".into()))
}

fn issue_token(user: &User) -> AppResult<String> {
    let secret = std::env::var("SECRET_KEY")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("SECRET_KEY is not set")))?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::minutes(ACCESS_TOKEN_EXPIRE_MINUTES))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.clone(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}
