use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::auth::UserResponse;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    pub product_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ReviewList {
    #[schema(value_type = Vec<ReviewDto>)]
    pub items: Vec<ReviewDto>,
}
