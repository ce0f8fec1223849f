use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

/// Classified intent of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ProductSearch,
    ProductRecommendation,
    ProductDetails,
    OrderHelp,
    OrderStatus,
    GeneralQuestion,
    Greeting,
    Farewell,
    Complaint,
    #[serde(other)]
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::ProductSearch => "product_search",
            Intent::ProductRecommendation => "product_recommendation",
            Intent::ProductDetails => "product_details",
            Intent::OrderHelp => "order_help",
            Intent::OrderStatus => "order_status",
            Intent::GeneralQuestion => "general_question",
            Intent::Greeting => "greeting",
            Intent::Farewell => "farewell",
            Intent::Complaint => "complaint",
            Intent::Unknown => "unknown",
        }
    }
}

/// Entities the classifier pulled out of the user message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ExtractedEntities {
    pub product_names: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub brands: Option<Vec<String>>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub order_id: Option<Uuid>,
    pub quantity: Option<i64>,
    #[schema(value_type = Option<Object>)]
    pub attributes: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IntentClassification {
    pub intent: Intent,
    pub confidence: f64,
    pub entities: ExtractedEntities,
    pub requires_clarification: bool,
    pub clarification_question: Option<String>,
}

/// Outcome of a single agent tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToolResult {
    pub call_id: String,
    pub tool_name: String,
    #[schema(value_type = Option<Object>)]
    pub result: Option<Value>,
    pub success: bool,
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AgentChatRequest {
    pub message: String,
    pub session_id: Option<Uuid>,
    /// Only honored on the anonymous endpoint; the authenticated endpoint
    /// always binds the caller.
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AgentChatResponse {
    pub response: String,
    pub session_id: Uuid,
    pub intent: Intent,
    pub entities: ExtractedEntities,
    pub suggestions: Option<Vec<Product>>,
    pub tool_calls_made: Option<Vec<String>>,
    pub follow_up_questions: Option<Vec<String>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationMessageView {
    pub role: String,
    pub content: String,
    pub intent: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationHistory {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<ConversationMessageView>,
}
