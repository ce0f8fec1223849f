use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::{
        auth::UserResponse,
        reviews::{CreateReviewRequest, ReviewDto, ReviewList},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Review,
    response::{ApiResponse, Meta},
};

#[derive(FromRow)]
struct ReviewWithUserRow {
    id: Uuid,
    user_id: Uuid,
    product_id: Uuid,
    rating: i32,
    comment: Option<String>,
    created_at: DateTime<Utc>,
    email: String,
    full_name: String,
    user_is_active: bool,
}

pub async fn create_review(
    pool: &DbPool,
    user: &AuthUser,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<ReviewDto>> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::BadRequest(
            "rating must be between 1 and 5".to_string(),
        ));
    }

    let product_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(pool)
        .await?;
    if product_exists.is_none() {
        return Err(AppError::BadRequest("Product not found".to_string()));
    }

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM reviews WHERE user_id = $1 AND product_id = $2")
            .bind(user.user_id)
            .bind(payload.product_id)
            .fetch_optional(pool)
            .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest(
            "You have already reviewed this product".to_string(),
        ));
    }

    let review: Review = sqlx::query_as(
        r#"
        INSERT INTO reviews (id, user_id, product_id, rating, comment)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.product_id)
    .bind(payload.rating)
    .bind(payload.comment.as_deref())
    .fetch_one(pool)
    .await?;

    let author: crate::models::User = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_one(pool)
        .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "review_create",
        Some("reviews"),
        Some(serde_json::json!({ "product_id": payload.product_id, "rating": payload.rating })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let dto = ReviewDto {
        id: review.id,
        user_id: review.user_id,
        product_id: review.product_id,
        rating: review.rating,
        comment: review.comment,
        created_at: review.created_at,
        user: author.into(),
    };

    Ok(ApiResponse::success("Review created", dto, None))
}

pub async fn product_reviews(
    pool: &DbPool,
    product_id: Uuid,
) -> AppResult<ApiResponse<ReviewList>> {
    let rows = sqlx::query_as::<_, ReviewWithUserRow>(
        r#"
        SELECT r.id, r.user_id, r.product_id, r.rating, r.comment, r.created_at,
               u.email, u.full_name, u.is_active AS user_is_active
        FROM reviews r
        JOIN users u ON u.id = r.user_id
        WHERE r.product_id = $1
        ORDER BY r.created_at DESC
        "#,
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    let total = rows.len() as i64;
    let items = rows
        .into_iter()
        .map(|row| ReviewDto {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
            user: UserResponse {
                id: row.user_id,
                email: row.email,
                full_name: row.full_name,
                is_active: row.user_is_active,
            },
        })
        .collect();

    let meta = Meta::new(1, total, total);
    Ok(ApiResponse::success("Reviews", ReviewList { items }, Some(meta)))
}
