//! JSON schemas for MCP tool parameters.

use rmcp::model::JsonObject;
use rmcp::schemars::{self, JsonSchema, generate::SchemaSettings};
use std::sync::Arc;

/// Generates an inline JSON schema for a tool's parameters.
///
/// rmcp's default `schema_for_type()` emits `$ref` definitions for enums such
/// as [`SearchScope`](crate::tools::search::SearchScope). Inlining them lets
/// MCP clients render the choices directly.
pub fn inline_schema_for_type<T: JsonSchema>() -> Arc<JsonObject> {
    let mut settings = SchemaSettings::draft07();
    settings.transforms = vec![Box::new(schemars::transform::AddNullable::default())];
    settings.inline_subschemas = true;

    let schema = settings.into_generator().into_root_schema_for::<T>();
    match serde_json::to_value(schema) {
        Ok(serde_json::Value::Object(object)) => Arc::new(object),
        Ok(other) => {
            tracing::error!("Schema for {} is not an object: {}", std::any::type_name::<T>(), other);
            Arc::new(JsonObject::new())
        }
        Err(e) => {
            tracing::error!("Failed to serialize schema for {}: {}", std::any::type_name::<T>(), e);
            Arc::new(JsonObject::new())
        }
    }
}
