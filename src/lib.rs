// Configuration
pub mod config;

// HTTP Server modules
pub mod handlers;
pub mod models;
pub mod routes;
pub mod server;
pub mod sse;
pub mod state;

// Chat service and weather tools
pub mod chat;
pub mod weather;

// LLM abstraction layer
pub mod llm;
