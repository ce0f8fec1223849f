use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    dto::chat::{
        AgentChatRequest, AgentChatResponse, ConversationHistory, ConversationMessageView, Intent,
        ToolResult,
    },
    dto::search::SearchResultDto,
    entity::{
        conversation_messages::{
            ActiveModel as MessageActive, Column as MessageCol, Entity as ConversationMessages,
        },
        conversation_sessions::{
            ActiveModel as SessionActive, Column as SessionCol, Entity as ConversationSessions,
            Model as SessionModel,
        },
    },
    error::{AppError, AppResult},
    llm::ChatMessage,
    models::{Order, Product},
    response::{ApiResponse, Meta},
    services::search_service,
    state::AppState,
};

const MAX_TOOL_ITERATIONS: usize = 3;
const HISTORY_LIMIT: u64 = 20;

pub const SYSTEM_PROMPT: &str = r#"You are an intelligent e-commerce shopping assistant for our online store.

Your capabilities:
1. Help customers search and discover products using semantic search
2. Provide detailed product information and comparisons
3. Give personalized recommendations based on preferences
4. Help with order-related queries
5. Answer general questions about the store

Guidelines:
- Be friendly, helpful, and concise
- When searching for products, use the search_products tool
- When users ask about specific products, get the details first
- Provide relevant suggestions and follow-up questions
- If you're unsure, ask clarifying questions
- Always format prices with $ and two decimal places
- When showing products, mention key details: name, price, and relevant features

You have access to tools - use them when needed to provide accurate, up-to-date information."#;

/// Tool definitions in OpenAI function-calling format.
pub fn toolkit() -> Value {
    json!([
        {
            "type": "function",
            "function": {
                "name": "search_products",
                "description": "Search for products using semantic search. Use this when the user wants to find or browse products.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The search query describing what products to find"
                        },
                        "category": {
                            "type": "string",
                            "description": "Optional category to filter by (e.g., 'electronics', 'clothing')"
                        },
                        "min_price": {
                            "type": "number",
                            "description": "Optional minimum price filter"
                        },
                        "max_price": {
                            "type": "number",
                            "description": "Optional maximum price filter"
                        },
                        "limit": {
                            "type": "integer",
                            "description": "Number of results to return (default 5, max 10)"
                        }
                    },
                    "required": ["query"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "get_product_details",
                "description": "Get detailed information about a specific product by ID or name.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "product_id": {
                            "type": "string",
                            "description": "The product ID (UUID)"
                        },
                        "product_name": {
                            "type": "string",
                            "description": "The product name to search for"
                        }
                    }
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "get_recommendations",
                "description": "Get product recommendations based on a product, category, or user preferences.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "product_id": {
                            "type": "string",
                            "description": "Product ID (UUID) to find similar products for"
                        },
                        "category": {
                            "type": "string",
                            "description": "Category to get recommendations from"
                        },
                        "preferences": {
                            "type": "string",
                            "description": "Description of user preferences"
                        },
                        "limit": {
                            "type": "integer",
                            "description": "Number of recommendations (default 5)"
                        }
                    }
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "check_order_status",
                "description": "Check the status of an order by order ID.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "order_id": {
                            "type": "string",
                            "description": "The order ID (UUID) to check"
                        }
                    },
                    "required": ["order_id"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "get_user_orders",
                "description": "Get all orders for the current authenticated user.",
                "parameters": {
                    "type": "object",
                    "properties": {}
                }
            }
        }
    ])
}

/// Contextual follow-ups offered after product-centric turns.
pub fn follow_up_questions(intent: Intent) -> Option<Vec<String>> {
    match intent {
        Intent::ProductSearch | Intent::ProductRecommendation => Some(vec![
            "Would you like me to filter by price range?".to_string(),
            "Should I show more options?".to_string(),
            "Want details about any of these products?".to_string(),
        ]),
        Intent::ProductDetails => Some(vec![
            "Would you like to see similar products?".to_string(),
            "Any questions about this product?".to_string(),
        ]),
        _ => None,
    }
}

/// Process a chat turn: classify, run the bounded tool loop when the intent
/// calls for it, persist both sides of the exchange.
pub async fn process_message(
    state: &AppState,
    payload: AgentChatRequest,
    authenticated_user: Option<Uuid>,
) -> AppResult<ApiResponse<AgentChatResponse>> {
    let user_id = authenticated_user.or(payload.user_id);
    let message = payload.message;

    let session = get_or_create_session(state, payload.session_id, user_id).await?;
    let history = conversation_history(state, session.id).await?;
    let classification = state.llm.classify_intent(&message, &history).await;

    save_message(
        state,
        session.id,
        "user",
        &message,
        Some(classification.intent.as_str().to_string()),
        serde_json::to_value(&classification.entities).ok(),
        None,
        None,
    )
    .await?;

    let mut tool_calls_made: Vec<String> = Vec::new();
    let mut tool_results: Vec<ToolResult> = Vec::new();
    let mut accumulated: Vec<Value> = Vec::new();
    let mut suggestions: Vec<Product> = Vec::new();
    let mut response = String::new();

    match classification.intent {
        Intent::Greeting | Intent::Farewell => {
            response = state
                .llm
                .generate_response(&message, SYSTEM_PROMPT, &history, &[])
                .await;
        }

        Intent::ProductSearch | Intent::ProductRecommendation | Intent::ProductDetails => {
            let tools = toolkit();
            let mut iteration = 0;

            while iteration < MAX_TOOL_ITERATIONS {
                let mut context_history = history.clone();
                if !accumulated.is_empty() {
                    let rendered = serde_json::to_string(&accumulated)
                        .unwrap_or_else(|_| "[]".to_string());
                    context_history.push(ChatMessage::new(
                        "assistant",
                        format!("Tool results so far: {rendered}"),
                    ));
                }

                let reply = state
                    .llm
                    .call_with_tools(&message, &tools, SYSTEM_PROMPT, &context_history)
                    .await;

                if reply.tool_calls.is_empty() {
                    if !reply.content.is_empty() {
                        response = reply.content;
                    }
                    break;
                }

                for call in reply.tool_calls {
                    let result =
                        execute_tool(state, &call.tool_name, &call.arguments, user_id).await;

                    accumulated.push(json!({
                        "tool": result.tool_name.clone(),
                        "result": result.result.clone(),
                    }));
                    tool_calls_made.push(call.tool_name);

                    if result.success {
                        collect_suggestions(state, &result, &mut suggestions).await?;
                    }
                    tool_results.push(result);
                }
                iteration += 1;
            }

            if response.is_empty() {
                response = state
                    .llm
                    .generate_response(&message, SYSTEM_PROMPT, &history, &accumulated)
                    .await;
            }
        }

        Intent::OrderHelp | Intent::OrderStatus => {
            if let Some(order_id) = classification.entities.order_id {
                let result = execute_tool(
                    state,
                    "check_order_status",
                    &json!({ "order_id": order_id }),
                    user_id,
                )
                .await;
                accumulated.push(json!({
                    "tool": "check_order_status",
                    "result": result.result.clone(),
                }));
                tool_calls_made.push("check_order_status".to_string());
                tool_results.push(result);
            } else if user_id.is_some() {
                let result = execute_tool(state, "get_user_orders", &json!({}), user_id).await;
                accumulated.push(json!({
                    "tool": "get_user_orders",
                    "result": result.result.clone(),
                }));
                tool_calls_made.push("get_user_orders".to_string());
                tool_results.push(result);
            }

            response = state
                .llm
                .generate_response(&message, SYSTEM_PROMPT, &history, &accumulated)
                .await;
        }

        _ => {
            response = state
                .llm
                .generate_response(&message, SYSTEM_PROMPT, &history, &[])
                .await;
        }
    }

    save_message(
        state,
        session.id,
        "assistant",
        &response,
        None,
        None,
        (!tool_calls_made.is_empty()).then(|| json!(tool_calls_made)),
        (!tool_results.is_empty())
            .then(|| serde_json::to_value(&tool_results).ok())
            .flatten(),
    )
    .await?;

    suggestions.truncate(5);
    let data = AgentChatResponse {
        response,
        session_id: session.id,
        intent: classification.intent,
        entities: classification.entities,
        suggestions: (!suggestions.is_empty()).then_some(suggestions),
        tool_calls_made: (!tool_calls_made.is_empty()).then_some(tool_calls_made),
        follow_up_questions: follow_up_questions(classification.intent),
    };

    Ok(ApiResponse::success(
        "Chat response",
        data,
        Some(Meta::empty()),
    ))
}

/// Run one tool; failures become failed results, never HTTP errors.
pub async fn execute_tool(
    state: &AppState,
    tool_name: &str,
    arguments: &Value,
    user_id: Option<Uuid>,
) -> ToolResult {
    let call_id = Uuid::new_v4().to_string()[..8].to_string();
    match run_tool(state, tool_name, arguments, user_id).await {
        Ok(result) => ToolResult {
            call_id,
            tool_name: tool_name.to_string(),
            result: Some(result),
            success: true,
            error_message: None,
        },
        Err(message) => ToolResult {
            call_id,
            tool_name: tool_name.to_string(),
            result: None,
            success: false,
            error_message: Some(message),
        },
    }
}

async fn run_tool(
    state: &AppState,
    tool_name: &str,
    args: &Value,
    user_id: Option<Uuid>,
) -> Result<Value, String> {
    match tool_name {
        "search_products" => {
            let query = args.get("query").and_then(Value::as_str).unwrap_or("");
            let top_k = args
                .get("limit")
                .and_then(Value::as_u64)
                .unwrap_or(5)
                .min(10) as usize;
            let results = search_service::search_results(
                state,
                query,
                top_k,
                args.get("category").and_then(Value::as_str),
                args.get("min_price").and_then(Value::as_f64),
                args.get("max_price").and_then(Value::as_f64),
                state.config.search_min_score,
            )
            .await
            .map_err(|e| e.to_string())?;
            Ok(Value::Array(
                results.iter().map(search_result_to_value).collect(),
            ))
        }

        "get_product_details" => {
            let mut product: Option<Product> = None;
            if let Some(id) = parse_uuid_arg(args, "product_id") {
                product = sqlx::query_as(
                    "SELECT * FROM products WHERE id = $1 AND is_active = TRUE",
                )
                .bind(id)
                .fetch_optional(&state.pool)
                .await
                .map_err(|e| e.to_string())?;
            } else if let Some(name) = args.get("product_name").and_then(Value::as_str) {
                let results = search_service::search_results(
                    state,
                    name,
                    1,
                    None,
                    None,
                    None,
                    state.config.search_min_score,
                )
                .await
                .map_err(|e| e.to_string())?;
                product = results.into_iter().next().map(|r| r.product);
            }

            match product {
                Some(p) => serde_json::to_value(&p).map_err(|e| e.to_string()),
                None => Err("Product not found".to_string()),
            }
        }

        "get_recommendations" => {
            let limit = args.get("limit").and_then(Value::as_u64).unwrap_or(5) as usize;
            let category = args.get("category").and_then(Value::as_str);
            let preferences = args.get("preferences").and_then(Value::as_str);

            let results: Vec<SearchResultDto> = if let Some(id) = parse_uuid_arg(args, "product_id")
            {
                search_service::similar_products(state, id, limit)
                    .await
                    .map_err(|e| e.to_string())?
            } else if preferences.is_some() || category.is_some() {
                let query = preferences.or(category).unwrap_or("");
                search_service::search_results(
                    state,
                    query,
                    limit,
                    category,
                    None,
                    None,
                    state.config.search_min_score,
                )
                .await
                .map_err(|e| e.to_string())?
            } else {
                // No anchor at all: fall back to the newest active products.
                let products: Vec<Product> = sqlx::query_as(
                    "SELECT * FROM products WHERE is_active = TRUE ORDER BY created_at DESC LIMIT 5",
                )
                .fetch_all(&state.pool)
                .await
                .map_err(|e| e.to_string())?;
                products
                    .into_iter()
                    .map(|product| SearchResultDto {
                        product,
                        similarity: 1.0,
                    })
                    .collect()
            };

            Ok(Value::Array(
                results.iter().map(search_result_to_value).collect(),
            ))
        }

        "check_order_status" => {
            let order_id =
                parse_uuid_arg(args, "order_id").ok_or_else(|| "Order not found".to_string())?;
            let order: Option<Order> = sqlx::query_as("SELECT * FROM orders WHERE id = $1")
                .bind(order_id)
                .fetch_optional(&state.pool)
                .await
                .map_err(|e| e.to_string())?;

            match order {
                Some(order) => Ok(json!({
                    "order_id": order.id,
                    "status": order.status,
                    "total_amount": order.total_amount,
                    "created_at": order.created_at.to_rfc3339(),
                    "shipping_address": order.shipping_address,
                })),
                None => Err("Order not found".to_string()),
            }
        }

        "get_user_orders" => {
            let user_id =
                user_id.ok_or_else(|| "Please log in to view your orders".to_string())?;
            let orders: Vec<Order> = sqlx::query_as(
                "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
            )
            .bind(user_id)
            .fetch_all(&state.pool)
            .await
            .map_err(|e| e.to_string())?;

            Ok(Value::Array(
                orders
                    .into_iter()
                    .map(|order| {
                        json!({
                            "order_id": order.id,
                            "status": order.status,
                            "total_amount": order.total_amount,
                            "created_at": order.created_at.to_rfc3339(),
                        })
                    })
                    .collect(),
            ))
        }

        other => Err(format!("Unknown tool: {other}")),
    }
}

/// Flatten a search hit into a product object with a `similarity` key, the
/// shape the model sees in tool output.
pub fn search_result_to_value(result: &SearchResultDto) -> Value {
    let mut value = serde_json::to_value(&result.product).unwrap_or_else(|_| json!({}));
    if let Value::Object(map) = &mut value {
        map.insert("similarity".to_string(), json!(result.similarity));
    }
    value
}

fn parse_uuid_arg(args: &Value, key: &str) -> Option<Uuid> {
    args.get(key)
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
}

/// Pull product suggestions out of a list-shaped tool result.
async fn collect_suggestions(
    state: &AppState,
    result: &ToolResult,
    suggestions: &mut Vec<Product>,
) -> AppResult<()> {
    let Some(Value::Array(items)) = &result.result else {
        return Ok(());
    };
    for item in items.iter().take(5) {
        let Some(id) = item
            .get("id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
        else {
            continue;
        };
        let product: Option<Product> = sqlx::query_as("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;
        if let Some(product) = product {
            suggestions.push(product);
        }
    }
    Ok(())
}

async fn get_or_create_session(
    state: &AppState,
    session_id: Option<Uuid>,
    user_id: Option<Uuid>,
) -> AppResult<SessionModel> {
    if let Some(id) = session_id {
        let existing = ConversationSessions::find()
            .filter(
                Condition::all()
                    .add(SessionCol::Id.eq(id))
                    .add(SessionCol::IsActive.eq(true)),
            )
            .one(&state.orm)
            .await?;
        if let Some(session) = existing {
            return Ok(session);
        }
    }

    let session = SessionActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(session)
}

/// Last `HISTORY_LIMIT` messages, oldest first, as LLM context.
async fn conversation_history(
    state: &AppState,
    session_id: Uuid,
) -> AppResult<Vec<ChatMessage>> {
    let mut messages = ConversationMessages::find()
        .filter(MessageCol::SessionId.eq(session_id))
        .order_by_desc(MessageCol::CreatedAt)
        .limit(HISTORY_LIMIT)
        .all(&state.orm)
        .await?;
    messages.reverse();

    Ok(messages
        .into_iter()
        .map(|m| ChatMessage::new(m.role, m.content))
        .collect())
}

#[allow(clippy::too_many_arguments)]
async fn save_message(
    state: &AppState,
    session_id: Uuid,
    role: &str,
    content: &str,
    intent: Option<String>,
    entities: Option<Value>,
    tool_calls: Option<Value>,
    tool_results: Option<Value>,
) -> AppResult<()> {
    MessageActive {
        id: Set(Uuid::new_v4()),
        session_id: Set(session_id),
        role: Set(role.to_string()),
        content: Set(content.to_string()),
        intent: Set(intent),
        entities: Set(entities),
        tool_calls: Set(tool_calls),
        tool_results: Set(tool_results),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(())
}

pub async fn get_conversation(
    state: &AppState,
    session_id: Uuid,
) -> AppResult<ApiResponse<ConversationHistory>> {
    let session = ConversationSessions::find_by_id(session_id)
        .one(&state.orm)
        .await?;
    let session = match session {
        Some(s) => s,
        None => return Err(AppError::NotFound),
    };

    let messages = ConversationMessages::find()
        .filter(MessageCol::SessionId.eq(session_id))
        .order_by_asc(MessageCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|m| ConversationMessageView {
            role: m.role,
            content: m.content,
            intent: m.intent,
            created_at: m.created_at.with_timezone(&Utc),
        })
        .collect();

    let data = ConversationHistory {
        session_id: session.id,
        created_at: session.created_at.with_timezone(&Utc),
        messages,
    };

    Ok(ApiResponse::success("Conversation", data, None))
}
