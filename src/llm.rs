use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    config::AppConfig,
    dto::chat::{ExtractedEntities, Intent, IntentClassification},
    error::AppResult,
};

const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Canned reply when the chat completion call fails outright.
pub const FALLBACK_RESPONSE: &str =
    "I apologize, but I encountered an error processing your request. Please try again.";

const CLASSIFIER_PROMPT: &str = r#"You are an intent classification system for an e-commerce shopping platform.

Analyze the user message and respond with a JSON object containing:
1. "intent": One of these exact values:
   - "product_search" - User wants to find/search for products
   - "product_recommendation" - User wants suggestions/recommendations
   - "product_details" - User asks about a specific product
   - "order_help" - User needs help with orders
   - "order_status" - User wants to check order status
   - "general_question" - General questions about the store
   - "greeting" - Hello, hi, etc.
   - "farewell" - Goodbye, thanks, etc.
   - "complaint" - User is unhappy or complaining
   - "unknown" - Cannot determine intent

2. "confidence": A float between 0.0 and 1.0 indicating how confident you are

3. "entities": An object that may contain:
   - "product_names": Array of product names mentioned
   - "categories": Array of categories (e.g., "electronics", "clothing", "shoes")
   - "brands": Array of brand names mentioned
   - "price_min": Minimum price if mentioned (number)
   - "price_max": Maximum price if mentioned (number)
   - "order_id": Order ID if mentioned (UUID string)
   - "quantity": Quantity if mentioned (number)
   - "attributes": Object with other attributes (color, size, etc.)

4. "requires_clarification": Boolean, true if the intent is unclear

5. "clarification_question": If requires_clarification is true, suggest a question to ask

Respond ONLY with valid JSON, no other text."#;

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// A tool invocation the model asked for.
#[derive(Debug, Clone)]
pub struct ToolCallRequest {
    pub call_id: String,
    pub tool_name: String,
    pub arguments: Value,
}

/// Either assistant text or a batch of tool calls; never both.
#[derive(Debug, Clone, Default)]
pub struct LlmReply {
    pub content: String,
    pub tool_calls: Vec<ToolCallRequest>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    // The API ships tool arguments as a JSON-encoded string.
    arguments: String,
}

#[derive(Clone)]
pub struct GroqClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl GroqClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: GROQ_BASE_URL.to_string(),
            api_key: config.groq_api_key.clone(),
            model: config.groq_model.clone(),
            max_tokens: config.groq_max_tokens,
        }
    }

    async fn complete(&self, body: Value) -> AppResult<ChatCompletion> {
        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatCompletion>()
            .await?;
        Ok(resp)
    }

    /// Classify the user's intent and extract entities via a JSON-mode
    /// completion. Any API or parse failure degrades to `unknown`.
    pub async fn classify_intent(
        &self,
        message: &str,
        history: &[ChatMessage],
    ) -> IntentClassification {
        let mut messages = vec![ChatMessage::new("system", CLASSIFIER_PROMPT)];
        let tail = history.len().saturating_sub(5);
        messages.extend_from_slice(&history[tail..]);
        messages.push(ChatMessage::new(
            "user",
            format!("Classify this message: {message}"),
        ));

        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0.1,
            "max_tokens": 1000,
            "response_format": { "type": "json_object" },
        });

        match self.complete(body).await {
            Ok(completion) => {
                let raw = completion
                    .choices
                    .first()
                    .and_then(|c| c.message.content.as_deref())
                    .unwrap_or_default();
                parse_intent_classification(raw)
            }
            Err(err) => {
                tracing::warn!(error = %err, "intent classification call failed");
                fallback_classification()
            }
        }
    }

    /// Plain conversational completion, optionally grounded in tool results.
    pub async fn generate_response(
        &self,
        message: &str,
        system_prompt: &str,
        history: &[ChatMessage],
        tool_results: &[Value],
    ) -> String {
        let tool_context = build_tool_context(tool_results);
        let messages = build_messages(system_prompt, message, history, tool_context);

        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0.7,
            "max_tokens": self.max_tokens,
        });

        match self.complete(body).await {
            Ok(completion) => completion
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_else(|| FALLBACK_RESPONSE.to_string()),
            Err(err) => {
                tracing::warn!(error = %err, "chat completion call failed");
                FALLBACK_RESPONSE.to_string()
            }
        }
    }

    /// Completion with function calling enabled.
    pub async fn call_with_tools(
        &self,
        message: &str,
        tools: &Value,
        system_prompt: &str,
        history: &[ChatMessage],
    ) -> LlmReply {
        let messages = build_messages(system_prompt, message, history, None);

        let body = json!({
            "model": self.model,
            "messages": messages,
            "tools": tools,
            "tool_choice": "auto",
            "temperature": 0.7,
            "max_tokens": self.max_tokens,
        });

        match self.complete(body).await {
            Ok(completion) => {
                let Some(choice) = completion.choices.into_iter().next() else {
                    return LlmReply::default();
                };
                if let Some(calls) = choice.message.tool_calls {
                    let tool_calls = calls
                        .into_iter()
                        .map(|call| ToolCallRequest {
                            call_id: call.id,
                            tool_name: call.function.name,
                            arguments: serde_json::from_str(&call.function.arguments)
                                .unwrap_or_else(|_| json!({})),
                        })
                        .collect();
                    LlmReply {
                        content: String::new(),
                        tool_calls,
                    }
                } else {
                    LlmReply {
                        content: choice.message.content.unwrap_or_default(),
                        tool_calls: Vec::new(),
                    }
                }
            }
            Err(err) => LlmReply {
                content: format!("I encountered an error: {err}"),
                tool_calls: Vec::new(),
            },
        }
    }
}

/// Assemble the message list for a completion: system prompt, the last ten
/// history turns, optional tool context as a second system message, then the
/// user message.
pub fn build_messages(
    system_prompt: &str,
    user_message: &str,
    history: &[ChatMessage],
    tool_context: Option<String>,
) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::new("system", system_prompt)];
    let tail = history.len().saturating_sub(10);
    messages.extend_from_slice(&history[tail..]);
    if let Some(context) = tool_context {
        messages.push(ChatMessage::new("system", context));
    }
    messages.push(ChatMessage::new("user", user_message));
    messages
}

/// Render accumulated tool results into a context block for the final answer.
pub fn build_tool_context(tool_results: &[Value]) -> Option<String> {
    if tool_results.is_empty() {
        return None;
    }
    let mut context = String::from(
        "Here are the results from the tools I used to help answer your question:\n\n",
    );
    for result in tool_results {
        let tool = result
            .get("tool")
            .and_then(Value::as_str)
            .unwrap_or("tool");
        let payload = result.get("result").cloned().unwrap_or(Value::Null);
        let rendered =
            serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string());
        context.push_str(&format!("**{tool}**:\n```json\n{rendered}\n```\n\n"));
    }
    Some(context)
}

/// Parse the classifier's JSON output, degrading field by field rather than
/// rejecting the whole classification on a malformed entity.
pub fn parse_intent_classification(raw: &str) -> IntentClassification {
    let Ok(value) = serde_json::from_str::<Value>(raw) else {
        return fallback_classification();
    };

    let intent = value
        .get("intent")
        .cloned()
        .and_then(|v| serde_json::from_value::<Intent>(v).ok())
        .unwrap_or(Intent::Unknown);

    let entities = value
        .get("entities")
        .cloned()
        .map(|v| serde_json::from_value::<ExtractedEntities>(v).unwrap_or_default())
        .unwrap_or_default();

    IntentClassification {
        intent,
        confidence: value
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(0.5),
        entities,
        requires_clarification: value
            .get("requires_clarification")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        clarification_question: value
            .get("clarification_question")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

pub fn fallback_classification() -> IntentClassification {
    IntentClassification {
        intent: Intent::Unknown,
        confidence: 0.0,
        entities: ExtractedEntities::default(),
        requires_clarification: true,
        clarification_question: Some(
            "I'm not sure I understood that. Could you please rephrase?".to_string(),
        ),
    }
}
