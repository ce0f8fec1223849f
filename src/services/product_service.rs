use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::ProductListQuery,
    services::search_service,
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductListQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all().add(Column::IsActive.eq(true));
    if let Some(category) = query.category.as_ref().filter(|c| !c.is_empty()) {
        condition = condition.add(Column::Category.eq(category.clone()));
    }

    let finder = Products::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let result = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(product_from_entity);
    let result = match result {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Product", result, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;

    let id = Uuid::new_v4();
    let active = ActiveModel {
        id: Set(id),
        name: Set(payload.name),
        description: Set(payload.description),
        price: Set(payload.price),
        category: Set(payload.category),
        brand: Set(payload.brand),
        image_url: Set(payload.image_url),
        stock_quantity: Set(payload.stock_quantity),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let product = product_from_entity(active.insert(&state.orm).await?);

    // Indexing is best effort; a vector store outage must not fail the write.
    if let Err(err) = search_service::index_product(state, &product).await {
        tracing::warn!(error = %err, product_id = %product.id, "product indexing failed");
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product created",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;

    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(category) = payload.category {
        active.category = Set(category);
    }
    if let Some(brand) = payload.brand {
        active.brand = Set(Some(brand));
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }
    if let Some(stock_quantity) = payload.stock_quantity {
        active.stock_quantity = Set(stock_quantity);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());

    let product = product_from_entity(active.update(&state.orm).await?);

    if product.is_active {
        if let Err(err) = search_service::index_product(state, &product).await {
            tracing::warn!(error = %err, product_id = %product.id, "product re-indexing failed");
        }
    } else if let Err(err) = search_service::remove_product(state, product.id).await {
        tracing::warn!(error = %err, product_id = %product.id, "product index removal failed");
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Updated",
        product,
        Some(Meta::empty()),
    ))
}

/// Products referenced by orders and reviews are deactivated, not dropped.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let mut active: ActiveModel = existing.into();
    active.is_active = Set(false);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    if let Err(err) = search_service::remove_product(state, id).await {
        tracing::warn!(error = %err, product_id = %id, "product index removal failed");
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        category: model.category,
        brand: model.brand,
        image_url: model.image_url,
        stock_quantity: model.stock_quantity,
        is_active: model.is_active,
        created_at: model.created_at.with_timezone(&chrono::Utc),
        updated_at: model.updated_at.with_timezone(&chrono::Utc),
    }
}
