//! Tool declaration helpers using JSON Schema generation

use schemars::{schema_for, JsonSchema};

use crate::llm::core::types::ToolDeclaration;

/// Create a tool declaration from an argument type that implements JsonSchema
///
/// Doc comments on the fields become parameter descriptions. The `$schema`
/// and `title` keys are dropped because function-calling APIs expect a bare
/// object schema.
///
/// # Example
///
/// ```ignore
/// #[derive(Deserialize, JsonSchema)]
/// struct WeatherArgs {
///     /// City name, e.g. "Beijing"
///     city: String,
/// }
///
/// let decl = create_tool_declaration::<WeatherArgs>("get_weather", "Current weather for a city");
/// ```
pub fn create_tool_declaration<T: JsonSchema>(
    name: impl Into<String>,
    description: impl Into<String>,
) -> ToolDeclaration {
    let mut input_schema = serde_json::to_value(schema_for!(T))
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}));

    if let Some(schema) = input_schema.as_object_mut() {
        schema.remove("$schema");
        schema.remove("title");
    }

    ToolDeclaration {
        name: name.into(),
        description: description.into(),
        input_schema,
    }
}
