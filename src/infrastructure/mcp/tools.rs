//! MCP Tool Helpers
//!
//! Conversions between rmcp tool/result types and the gateway's own.

use crate::domain::backend::ToolDescriptor;
use rmcp::model::{CallToolResult, RawContent, Tool};
use serde_json::Value;

/// Build a descriptor from an rmcp tool definition
pub fn descriptor_from_tool(tool: &Tool) -> ToolDescriptor {
    ToolDescriptor {
        name: tool.name.to_string(),
        description: tool
            .description
            .as_ref()
            .map(std::string::ToString::to_string),
        input_schema: serde_json::to_value(&*tool.input_schema).unwrap_or(Value::Null),
    }
}

/// Collapse a tool result into one JSON value.
///
/// Structured content wins when present. Otherwise a single text item is
/// parsed as JSON (falling back to the raw string), several items become
/// an array, and no content is `null`. An error result yields its text.
pub fn result_to_value(result: &CallToolResult) -> Result<Value, String> {
    if result.is_error.unwrap_or(false) {
        let text = text_parts(result).join("\n");
        return Err(if text.is_empty() {
            "tool reported an error".to_string()
        } else {
            text
        });
    }

    if let Some(structured) = &result.structured_content {
        return Ok(structured.clone());
    }

    let mut values: Vec<Value> = result.content.iter().map(|item| content_value(&item.raw)).collect();
    Ok(match values.len() {
        0 => Value::Null,
        1 => values.remove(0),
        _ => Value::Array(values),
    })
}

fn content_value(raw: &RawContent) -> Value {
    match raw {
        RawContent::Text(t) => {
            serde_json::from_str(&t.text).unwrap_or_else(|_| Value::String(t.text.clone()))
        }
        // Non-text content keeps its MCP wire shape (`{"type": "image", ...}`)
        other => serde_json::to_value(other).unwrap_or(Value::Null),
    }
}

fn text_parts(result: &CallToolResult) -> Vec<String> {
    result
        .content
        .iter()
        .filter_map(|item| match &item.raw {
            RawContent::Text(t) => Some(t.text.clone()),
            _ => None,
        })
        .collect()
}
