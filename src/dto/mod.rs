pub mod auth;
pub mod chat;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod search;
pub mod wishlist;
