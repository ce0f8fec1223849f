use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{
            ChangePasswordRequest, LoginRequest, RegisterRequest, TokenResponse,
            UpdateProfileRequest, UserResponse,
        },
        chat::{
            AgentChatRequest, AgentChatResponse, ConversationHistory, ConversationMessageView,
            ExtractedEntities, Intent,
        },
        orders::{CreateOrderRequest, OrderItemCreate, OrderItemDto, OrderList, OrderWithItems},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        reviews::{CreateReviewRequest, ReviewDto, ReviewList},
        search::{IndexReport, RecommendationList, SearchRequest, SearchResponse, SearchResultDto},
        wishlist::WishlistProductList,
    },
    models::{Order, Product, Review},
    response::{ApiResponse, Meta},
    routes::{
        admin, auth, chat, conversations, health, orders, params,
        products as product_routes, reviews, search, wishlist,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::me,
        auth::update_profile,
        auth::change_password,
        product_routes::list_products,
        product_routes::get_product,
        product_routes::create_product,
        product_routes::update_product,
        product_routes::delete_product,
        product_routes::product_reviews,
        product_routes::product_recommendations,
        orders::create_order,
        orders::list_orders,
        reviews::create_review,
        wishlist::list_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
        search::search_products,
        chat::chat,
        chat::chat_authenticated,
        conversations::get_conversation,
        admin::index_products
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            TokenResponse,
            UpdateProfileRequest,
            ChangePasswordRequest,
            UserResponse,
            Product,
            ProductList,
            CreateProductRequest,
            UpdateProductRequest,
            Order,
            OrderItemCreate,
            CreateOrderRequest,
            OrderItemDto,
            OrderWithItems,
            OrderList,
            Review,
            CreateReviewRequest,
            ReviewDto,
            ReviewList,
            WishlistProductList,
            SearchRequest,
            SearchResultDto,
            SearchResponse,
            RecommendationList,
            IndexReport,
            Intent,
            ExtractedEntities,
            AgentChatRequest,
            AgentChatResponse,
            ConversationMessageView,
            ConversationHistory,
            params::Pagination,
            params::ProductListQuery,
            params::RecommendationQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<SearchResponse>,
            ApiResponse<AgentChatResponse>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication and profile endpoints"),
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Reviews", description = "Review endpoints"),
        (name = "Wishlist", description = "Wishlist endpoints"),
        (name = "Search", description = "Semantic search endpoints"),
        (name = "Chat", description = "Shopping agent endpoints"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
