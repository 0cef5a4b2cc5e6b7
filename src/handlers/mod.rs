// Handlers module

pub mod chat;
pub mod health;
pub mod index;

pub use chat::{chat_handler, chat_stream_handler};
pub use health::{health_handler, status_handler};
pub use index::index_handler;

/// Error text returned while the chat service is unavailable
pub const NOT_INITIALIZED: &str = "chat service is not initialized";
