use serde_json::json;
use uuid::Uuid;

use shopai_api::{
    config::AppConfig,
    dto::{
        auth::RegisterRequest,
        orders::{CreateOrderRequest, OrderItemCreate},
        products::CreateProductRequest,
        reviews::CreateReviewRequest,
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::{
        agent_service, auth_service, order_service, product_service, review_service,
        wishlist_service,
    },
    state::AppState,
};

// Integration flow: register -> admin seeds a product -> order with stock
// decrement -> review -> wishlist -> agent tools against the same data.
#[tokio::test]
async fn order_review_wishlist_and_agent_tool_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(database_url).await?;

    let buyer = register(&state, "buyer@example.com", "Buyer One").await?;
    let admin = register(&state, "admin@example.com", "Store Admin").await?;
    let admin = promote_to_admin(&state, admin).await?;

    // Product CRUD requires the admin role.
    let forbidden = product_service::create_product(
        &state,
        &buyer,
        product_request("Nope", 1.0, 1),
    )
    .await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    let product = product_service::create_product(
        &state,
        &admin,
        product_request("Portable Bluetooth Speaker", 79.99, 40),
    )
    .await?
    .data
    .expect("created product");

    // Order two units; the line is priced at the current product price.
    let order_resp = order_service::create_order(
        &state,
        &buyer,
        CreateOrderRequest {
            items: vec![OrderItemCreate {
                product_id: product.id,
                quantity: 2,
            }],
            shipping_address: "1 Example Street".to_string(),
        },
    )
    .await?
    .data
    .expect("order with items");

    assert_eq!(order_resp.order.status, "pending");
    assert!((order_resp.order.total_amount - 159.98).abs() < 1e-9);
    assert_eq!(order_resp.items.len(), 1);
    assert_eq!(order_resp.items[0].quantity, 2);

    // Stock was decremented inside the same transaction.
    let reloaded = product_service::get_product(&state, product.id)
        .await?
        .data
        .expect("product");
    assert_eq!(reloaded.stock_quantity, 38);

    // Over-ordering fails before any write.
    let too_many = order_service::create_order(
        &state,
        &buyer,
        CreateOrderRequest {
            items: vec![OrderItemCreate {
                product_id: product.id,
                quantity: 1000,
            }],
            shipping_address: "1 Example Street".to_string(),
        },
    )
    .await;
    assert!(matches!(too_many, Err(AppError::BadRequest(_))));

    let orders = order_service::list_orders(&state, &buyer)
        .await?
        .data
        .expect("order list");
    assert_eq!(orders.items.len(), 1);
    assert_eq!(orders.items[0].items[0].product.id, product.id);

    // One review per user per product.
    let review = review_service::create_review(
        &state.pool,
        &buyer,
        CreateReviewRequest {
            product_id: product.id,
            rating: 5,
            comment: Some("Great sound".to_string()),
        },
    )
    .await?
    .data
    .expect("review");
    assert_eq!(review.user.email, "buyer@example.com");

    let duplicate = review_service::create_review(
        &state.pool,
        &buyer,
        CreateReviewRequest {
            product_id: product.id,
            rating: 4,
            comment: None,
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::BadRequest(_))));

    let reviews = review_service::product_reviews(&state.pool, product.id)
        .await?
        .data
        .expect("reviews");
    assert_eq!(reviews.items.len(), 1);
    assert_eq!(reviews.items[0].rating, 5);

    // Wishlist add is idempotent; removing twice 404s.
    wishlist_service::add_to_wishlist(&state.pool, &buyer, product.id).await?;
    wishlist_service::add_to_wishlist(&state.pool, &buyer, product.id).await?;
    let wishlist = wishlist_service::list_wishlist(&state.pool, &buyer)
        .await?
        .data
        .expect("wishlist");
    assert_eq!(wishlist.items.len(), 1);

    wishlist_service::remove_from_wishlist(&state.pool, &buyer, product.id).await?;
    let gone = wishlist_service::remove_from_wishlist(&state.pool, &buyer, product.id).await;
    assert!(matches!(gone, Err(AppError::NotFound)));

    // Agent tools run against the database directly, no LLM involved.
    let status = agent_service::execute_tool(
        &state,
        "check_order_status",
        &json!({ "order_id": order_resp.order.id }),
        None,
    )
    .await;
    assert!(status.success);
    let status_result = status.result.expect("order status payload");
    assert_eq!(status_result["status"], json!("pending"));

    let my_orders = agent_service::execute_tool(
        &state,
        "get_user_orders",
        &json!({}),
        Some(buyer.user_id),
    )
    .await;
    assert!(my_orders.success);
    assert_eq!(
        my_orders.result.and_then(|v| v.as_array().map(|a| a.len())),
        Some(1)
    );

    let anonymous_orders =
        agent_service::execute_tool(&state, "get_user_orders", &json!({}), None).await;
    assert!(!anonymous_orders.success);
    assert_eq!(
        anonymous_orders.error_message.as_deref(),
        Some("Please log in to view your orders")
    );

    // Without a vector store configured, search tools fail soft.
    let search = agent_service::execute_tool(
        &state,
        "search_products",
        &json!({ "query": "speaker" }),
        None,
    )
    .await;
    assert!(!search.success);

    let unknown = agent_service::execute_tool(&state, "definitely_not_a_tool", &json!({}), None).await;
    assert!(!unknown.success);
    assert_eq!(
        unknown.error_message.as_deref(),
        Some("Unknown tool: definitely_not_a_tool")
    );

    // Conversation lookup for a session that never existed.
    let missing = agent_service::get_conversation(&state, Uuid::new_v4()).await;
    assert!(matches!(missing, Err(AppError::NotFound)));

    Ok(())
}

async fn setup_state(database_url: String) -> anyhow::Result<AppState> {
    let state = AppState::build(test_config(database_url)).await?;
    sqlx::migrate!("./migrations").run(&state.pool).await?;

    // Clean tables between runs.
    sqlx::query(
        "TRUNCATE TABLE conversation_messages, conversation_sessions, order_items, orders, \
         reviews, wishlist_items, audit_logs, products, users CASCADE",
    )
    .execute(&state.pool)
    .await?;

    Ok(state)
}

fn test_config(database_url: String) -> AppConfig {
    AppConfig {
        database_url,
        host: "127.0.0.1".to_string(),
        port: 0,
        frontend_origin: "http://localhost:3000".to_string(),
        groq_api_key: String::new(),
        groq_model: "llama-3.3-70b-versatile".to_string(),
        groq_max_tokens: 4096,
        openai_api_key: String::new(),
        embedding_model: "text-embedding-3-small".to_string(),
        embedding_dimension: 384,
        pinecone_api_key: String::new(),
        pinecone_index_name: "shop-ai-products".to_string(),
        pinecone_cloud: "aws".to_string(),
        pinecone_region: "us-east-1".to_string(),
        search_top_k: 10,
        search_min_score: 0.3,
        smtp_server: "smtp.gmail.com".to_string(),
        smtp_port: 587,
        email_user: String::new(),
        email_password: String::new(),
    }
}

fn product_request(name: &str, price: f64, stock: i32) -> CreateProductRequest {
    CreateProductRequest {
        name: name.to_string(),
        description: Some("A product for testing".to_string()),
        price,
        category: "Audio".to_string(),
        brand: Some("SoundWave".to_string()),
        image_url: None,
        stock_quantity: stock,
    }
}

async fn register(state: &AppState, email: &str, full_name: &str) -> anyhow::Result<AuthUser> {
    let resp = auth_service::register_user(
        &state.pool,
        RegisterRequest {
            email: email.to_string(),
            password: "password123".to_string(),
            full_name: full_name.to_string(),
        },
    )
    .await?;
    let user = resp.data.expect("registered user");
    Ok(AuthUser {
        user_id: user.id,
        role: "user".to_string(),
    })
}

async fn promote_to_admin(state: &AppState, user: AuthUser) -> anyhow::Result<AuthUser> {
    sqlx::query("UPDATE users SET role = 'admin' WHERE id = $1")
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;
    Ok(AuthUser {
        user_id: user.user_id,
        role: "admin".to_string(),
    })
}
