use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::wishlist::WishlistProductList,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    response::{ApiResponse, Meta},
};

pub async fn add_to_wishlist(
    pool: &DbPool,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let product_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(pool)
        .await?;
    if product_exists.is_none() {
        return Err(AppError::BadRequest("Product not found".to_string()));
    }

    // Adding twice is a no-op.
    sqlx::query(
        r#"
        INSERT INTO wishlist_items (user_id, product_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, product_id) DO NOTHING
        "#,
    )
    .bind(user.user_id)
    .bind(product_id)
    .execute(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "wishlist_add",
        Some("wishlist_items"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Added to wishlist",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn remove_from_wishlist(
    pool: &DbPool,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND product_id = $2")
        .bind(user.user_id)
        .bind(product_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "wishlist_remove",
        Some("wishlist_items"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Removed from wishlist",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_wishlist(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<WishlistProductList>> {
    let products = sqlx::query_as::<_, Product>(
        r#"
        SELECT p.*
        FROM wishlist_items w
        JOIN products p ON p.id = w.product_id
        WHERE w.user_id = $1
        ORDER BY w.created_at DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(pool)
    .await?;

    let total = products.len() as i64;
    let meta = Meta::new(1, total, total);
    Ok(ApiResponse::success(
        "Wishlist",
        WishlistProductList { items: products },
        Some(meta),
    ))
}
