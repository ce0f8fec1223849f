use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod chat;
pub mod conversations;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod reviews;
pub mod search;
pub mod wishlist;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .nest("/reviews", reviews::router())
        .nest("/wishlist", wishlist::router())
        .nest("/search", search::router())
        .nest("/chat", chat::router())
        .nest("/conversations", conversations::router())
        .nest("/admin", admin::router())
}
