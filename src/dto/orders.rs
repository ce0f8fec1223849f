use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, Product};

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemCreate {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemCreate>,
    pub shipping_address: String,
}

/// Order line with the product snapshot it was priced against.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemDto {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: f64,
    pub product: Product,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItemDto>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<OrderWithItems>)]
    pub items: Vec<OrderWithItems>,
}
