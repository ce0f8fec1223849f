use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{CreateOrderRequest, OrderItemDto, OrderList, OrderWithItems},
    email,
    entity::{
        orders::ActiveModel as OrderActive,
        order_items::ActiveModel as OrderItemActive,
        products::{
            ActiveModel as ProductActive, Column as ProdCol, Entity as Products,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, Product},
    response::{ApiResponse, Meta},
    services::product_service::product_from_entity,
    state::AppState,
};

#[derive(FromRow)]
struct OrderItemWithProductRow {
    item_id: Uuid,
    quantity: i32,
    item_price: f64,
    product_id: Uuid,
    name: String,
    description: Option<String>,
    price: f64,
    category: String,
    brand: Option<String>,
    image_url: Option<String>,
    stock_quantity: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Create an order from an item list: price each line at the current product
/// price, validate and decrement stock, all inside one transaction. A
/// confirmation email goes out afterwards, best effort.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("Order has no items".into()));
    }

    let txn = state.orm.begin().await?;

    let mut total_amount: f64 = 0.0;
    let mut priced_items: Vec<(Uuid, i32, f64, Product)> = Vec::with_capacity(payload.items.len());

    for item in &payload.items {
        if item.quantity <= 0 {
            return Err(AppError::BadRequest(
                "quantity must be greater than 0".into(),
            ));
        }

        let product = Products::find_by_id(item.product_id)
            .filter(ProdCol::IsActive.eq(true))
            .lock(LockType::Update)
            .one(&txn)
            .await?;
        let product = match product {
            Some(p) => p,
            None => {
                return Err(AppError::BadRequest(format!(
                    "Product {} not found",
                    item.product_id
                )));
            }
        };

        if product.stock_quantity < item.quantity {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for product {}",
                item.product_id
            )));
        }

        let new_stock = product.stock_quantity - item.quantity;
        let price = product.price;
        total_amount += price * f64::from(item.quantity);

        let mut active: ProductActive = product.clone().into();
        active.stock_quantity = Set(new_stock);
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?;

        priced_items.push((
            item.product_id,
            item.quantity,
            price,
            product_from_entity(product),
        ));
    }

    let order_id = Uuid::new_v4();
    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        total_amount: Set(total_amount),
        status: Set("pending".into()),
        shipping_address: Set(payload.shipping_address),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItemDto> = Vec::with_capacity(priced_items.len());
    for (product_id, quantity, price, product) in priced_items {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            price: Set(price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        items.push(OrderItemDto {
            id: item.id,
            product_id,
            quantity,
            price,
            product,
        });
    }

    txn.commit().await?;

    let order = Order {
        id: order.id,
        user_id: order.user_id,
        total_amount: order.total_amount,
        status: order.status,
        shipping_address: order.shipping_address,
        created_at: order.created_at.with_timezone(&Utc),
        updated_at: order.updated_at.with_timezone(&Utc),
    };

    // Email failures are logged, never surfaced to the buyer.
    match user_email(state, user.user_id).await {
        Ok(to) => {
            if let Err(err) = email::send_order_confirmation(&state.mailer, &to, &order).await {
                tracing::warn!(error = %err, order_id = %order.id, "order confirmation email failed");
            }
        }
        Err(err) => tracing::warn!(error = %err, "could not resolve buyer email"),
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_create",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total_amount": order.total_amount })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order created",
        OrderWithItems { order, items },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    let orders: Vec<Order> =
        sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user.user_id)
            .fetch_all(&state.pool)
            .await?;

    let total = orders.len() as i64;
    let mut items = Vec::with_capacity(orders.len());
    for order in orders {
        let lines = order_items_with_products(state, order.id).await?;
        items.push(OrderWithItems {
            order,
            items: lines,
        });
    }

    let meta = Meta::new(1, total, total);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

async fn order_items_with_products(
    state: &AppState,
    order_id: Uuid,
) -> AppResult<Vec<OrderItemDto>> {
    let rows = sqlx::query_as::<_, OrderItemWithProductRow>(
        r#"
        SELECT oi.id AS item_id, oi.quantity, oi.price AS item_price,
               p.id AS product_id, p.name, p.description, p.price, p.category, p.brand,
               p.image_url, p.stock_quantity, p.is_active, p.created_at, p.updated_at
        FROM order_items oi
        JOIN products p ON p.id = oi.product_id
        WHERE oi.order_id = $1
        ORDER BY oi.created_at
        "#,
    )
    .bind(order_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| OrderItemDto {
            id: row.item_id,
            product_id: row.product_id,
            quantity: row.quantity,
            price: row.item_price,
            product: Product {
                id: row.product_id,
                name: row.name,
                description: row.description,
                price: row.price,
                category: row.category,
                brand: row.brand,
                image_url: row.image_url,
                stock_quantity: row.stock_quantity,
                is_active: row.is_active,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        })
        .collect())
}

async fn user_email(state: &AppState, user_id: Uuid) -> AppResult<String> {
    let row: Option<(String,)> = sqlx::query_as("SELECT email FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.pool)
        .await?;
    row.map(|(email,)| email).ok_or(AppError::NotFound)
}
