//! Function registry for tool execution

use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::executor::ToolExecutor;
use crate::llm::core::types::ToolDeclaration;

/// Type alias for boxed async functions
type AsyncToolFn =
    Box<dyn Fn(serde_json::Value) -> BoxFuture<'static, Result<String, String>> + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),
}

/// Registry for managing tool functions
///
/// Registered functions take a deserializable argument struct and return a
/// serializable result; the registry converts from and to JSON. Tools
/// registered together with a [`ToolDeclaration`] are advertised to the
/// model through [`FunctionRegistry::declarations`].
///
/// # Example
///
/// ```ignore
/// let mut registry = FunctionRegistry::new();
/// registry.register_async_tool(
///     move |args: GetWeatherArgs| {
///         let client = client.clone();
///         async move { client.current(&args.city, None).await.map_err(|e| e.to_string()) }
///     },
///     create_tool_declaration::<GetWeatherArgs>("get_weather", "Current weather"),
/// )?;
/// ```
pub struct FunctionRegistry {
    functions: HashMap<String, AsyncToolFn>,
    declarations: Vec<ToolDeclaration>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
            declarations: Vec::new(),
        }
    }

    /// Register an async function together with its declaration
    ///
    /// # Errors
    ///
    /// Returns `DuplicateTool` if a tool with the declaration's name exists.
    pub fn register_async_tool<F, Args, R, Fut>(
        &mut self,
        func: F,
        declaration: ToolDeclaration,
    ) -> Result<(), RegistryError>
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Args: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        Fut: Future<Output = Result<R, String>> + Send + 'static,
    {
        if self.contains(&declaration.name) {
            return Err(RegistryError::DuplicateTool(declaration.name));
        }

        self.functions
            .insert(declaration.name.clone(), wrap_async(func));
        self.declarations.push(declaration);
        Ok(())
    }

    /// Declarations of tools registered through `register_async_tool`, in
    /// registration order
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.declarations.clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    async fn execute_function(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<String, String> {
        match self.functions.get(name) {
            Some(func) => func(arguments).await,
            None => Err(format!("Unknown tool: {}", name)),
        }
    }
}

/// Box `func` behind the JSON-in, JSON-out calling convention
fn wrap_async<F, Args, R, Fut>(func: F) -> AsyncToolFn
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Args: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    Fut: Future<Output = Result<R, String>> + Send + 'static,
{
    Box::new(move |args_json: serde_json::Value| {
        let args = match serde_json::from_value::<Args>(args_json) {
            Ok(args) => args,
            Err(e) => {
                let err_msg = format!("Failed to deserialize arguments: {}", e);
                return Box::pin(async move { Err(err_msg) }) as BoxFuture<'static, _>;
            }
        };

        let future = func(args);

        Box::pin(async move { serialize_result(future.await) }) as BoxFuture<'static, _>
    })
}

fn serialize_result<R: Serialize>(result: Result<R, String>) -> Result<String, String> {
    result.and_then(|value| {
        serde_json::to_string(&value).map_err(|e| format!("Failed to serialize result: {}", e))
    })
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolExecutor for FunctionRegistry {
    async fn execute(
        &self,
        tool_use_id: String,
        name: String,
        arguments: serde_json::Value,
    ) -> Result<String, String> {
        debug!(tool_use_id = %tool_use_id, tool = %name, "Executing tool");
        self.execute_function(&name, arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::tools::declaration::create_tool_declaration;
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct CityArgs {
        city: String,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Temperature {
        city: String,
        celsius: f64,
    }

    fn lookup(args: CityArgs) -> Result<Temperature, String> {
        match args.city.as_str() {
            "Beijing" => Ok(Temperature {
                city: args.city,
                celsius: 21.5,
            }),
            other => Err(format!("city not found: {}", other)),
        }
    }

    fn lookup_declaration() -> ToolDeclaration {
        create_tool_declaration::<CityArgs>("lookup", "Temperature lookup")
    }

    fn registry_with_lookup() -> FunctionRegistry {
        let mut registry = FunctionRegistry::new();
        registry
            .register_async_tool(|args: CityArgs| async move { lookup(args) }, lookup_declaration())
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn test_execute_async_function() {
        let mut registry = FunctionRegistry::new();
        registry
            .register_async_tool(
                |args: CityArgs| async move {
                    tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
                    lookup(args)
                },
                lookup_declaration(),
            )
            .unwrap();

        let result = registry
            .execute_function("lookup", serde_json::json!({"city": "Beijing"}))
            .await
            .unwrap();
        let parsed: Temperature = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed.celsius, 21.5);
    }

    #[tokio::test]
    async fn test_function_error_is_passed_through() {
        let registry = registry_with_lookup();

        let result = registry
            .execute_function("lookup", serde_json::json!({"city": "Atlantis"}))
            .await;
        assert_eq!(result.unwrap_err(), "city not found: Atlantis");
    }

    #[tokio::test]
    async fn test_deserialization_error() {
        let registry = registry_with_lookup();

        let result = registry.execute_function("lookup", serde_json::json!({})).await;
        assert!(result.unwrap_err().contains("Failed to deserialize arguments"));
    }

    #[tokio::test]
    async fn test_unknown_function() {
        let registry = FunctionRegistry::new();
        let result = registry.execute_function("missing", serde_json::json!({})).await;
        assert_eq!(result.unwrap_err(), "Unknown tool: missing");
    }

    #[tokio::test]
    async fn test_register_tool_with_declaration() {
        let registry = registry_with_lookup();

        let declarations = registry.declarations();
        assert_eq!(declarations.len(), 1);
        assert_eq!(declarations[0].name, "lookup");

        let executor: &dyn ToolExecutor = &registry;
        let result = executor
            .execute(
                "call-1".to_string(),
                "lookup".to_string(),
                serde_json::json!({"city": "Beijing"}),
            )
            .await
            .unwrap();
        assert!(result.contains("Beijing"));
    }

    #[tokio::test]
    async fn test_duplicate_tool_keeps_first_registration() {
        let mut registry = registry_with_lookup();

        let err = registry
            .register_async_tool(
                |_: CityArgs| async move { Ok::<_, String>("replacement".to_string()) },
                create_tool_declaration::<CityArgs>("lookup", "Another lookup"),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateTool(name) if name == "lookup"));

        assert_eq!(registry.len(), 1);
        let declarations = registry.declarations();
        assert_eq!(declarations.len(), 1);
        assert_eq!(declarations[0].description, "Temperature lookup");

        let result = registry
            .execute_function("lookup", serde_json::json!({"city": "Beijing"}))
            .await
            .unwrap();
        assert!(result.contains("21.5"));
        assert!(!result.contains("replacement"));
    }
}
