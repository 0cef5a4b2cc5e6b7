//! Tool execution framework
//!
//! The `ToolExecutor` trait is what the agent calls; `FunctionRegistry` is
//! the implementation that dispatches to registered Rust functions.

pub mod declaration;
pub mod executor;
pub mod registry;

pub use declaration::create_tool_declaration;
pub use executor::ToolExecutor;
pub use registry::{FunctionRegistry, RegistryError};
