pub mod conversation_messages;
pub mod conversation_sessions;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod users;

pub use conversation_messages::Entity as ConversationMessages;
pub use conversation_sessions::Entity as ConversationSessions;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use users::Entity as Users;
