use serde_json::json;

use shopai_api::dto::chat::Intent;
use shopai_api::llm::{
    ChatMessage, build_messages, build_tool_context, parse_intent_classification,
};
use shopai_api::services::agent_service::{follow_up_questions, toolkit};

#[test]
fn classifier_output_parses_cleanly() {
    let raw = r#"{
        "intent": "product_search",
        "confidence": 0.92,
        "entities": {
            "categories": ["electronics"],
            "price_max": 200.0
        },
        "requires_clarification": false
    }"#;

    let result = parse_intent_classification(raw);
    assert_eq!(result.intent, Intent::ProductSearch);
    assert!((result.confidence - 0.92).abs() < f64::EPSILON);
    assert_eq!(
        result.entities.categories.as_deref(),
        Some(&["electronics".to_string()][..])
    );
    assert_eq!(result.entities.price_max, Some(200.0));
    assert!(!result.requires_clarification);
}

#[test]
fn unknown_intent_string_degrades_to_unknown() {
    let raw = r#"{"intent": "buy_a_boat", "confidence": 0.4, "entities": {}}"#;
    let result = parse_intent_classification(raw);
    assert_eq!(result.intent, Intent::Unknown);
}

#[test]
fn malformed_json_falls_back_with_clarification() {
    let result = parse_intent_classification("not json at all");
    assert_eq!(result.intent, Intent::Unknown);
    assert_eq!(result.confidence, 0.0);
    assert!(result.requires_clarification);
    assert!(result.clarification_question.is_some());
}

#[test]
fn malformed_entities_do_not_sink_the_classification() {
    // order_id is not a UUID string; entities degrade to default while the
    // intent survives.
    let raw = r#"{"intent": "order_status", "entities": {"order_id": 12345}}"#;
    let result = parse_intent_classification(raw);
    assert_eq!(result.intent, Intent::OrderStatus);
    assert!(result.entities.order_id.is_none());
}

#[test]
fn message_history_is_truncated_to_last_ten() {
    let history: Vec<ChatMessage> = (0..15)
        .map(|i| ChatMessage::new("user", format!("message {i}")))
        .collect();

    let messages = build_messages("system prompt", "latest", &history, None);

    // 1 system + 10 history + 1 user message.
    assert_eq!(messages.len(), 12);
    assert_eq!(messages[0].role, "system");
    assert_eq!(messages[1].content, "message 5");
    assert_eq!(messages.last().map(|m| m.content.as_str()), Some("latest"));
}

#[test]
fn tool_context_is_injected_as_second_system_message() {
    let history = vec![ChatMessage::new("user", "hi")];
    let results = vec![json!({"tool": "search_products", "result": [{"name": "Widget"}]})];
    let context = build_tool_context(&results).expect("context");
    let messages = build_messages("prompt", "question", &history, Some(context.clone()));

    assert_eq!(messages.len(), 4);
    assert_eq!(messages[2].role, "system");
    assert!(messages[2].content.contains("search_products"));
    assert!(context.contains("```json"));
}

#[test]
fn empty_tool_results_produce_no_context() {
    assert!(build_tool_context(&[]).is_none());
}

#[test]
fn toolkit_exposes_the_five_agent_tools() {
    let tools = toolkit();
    let names: Vec<&str> = tools
        .as_array()
        .expect("tool array")
        .iter()
        .map(|t| t["function"]["name"].as_str().expect("tool name"))
        .collect();

    assert_eq!(
        names,
        [
            "search_products",
            "get_product_details",
            "get_recommendations",
            "check_order_status",
            "get_user_orders",
        ]
    );
}

#[test]
fn follow_ups_depend_on_intent() {
    assert!(follow_up_questions(Intent::ProductSearch).is_some());
    assert_eq!(
        follow_up_questions(Intent::ProductDetails).map(|q| q.len()),
        Some(2)
    );
    assert!(follow_up_questions(Intent::Greeting).is_none());
    assert!(follow_up_questions(Intent::Unknown).is_none());
}
