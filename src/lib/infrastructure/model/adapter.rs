//! Message adapter - converts transcripts to and from the Converse wire format

use super::types::{ModelError, ModelRequest, ModelResponse, ModelToolSpec, TokenUsage};
use crate::types::{ContentItem, Role, ToolResult, ToolResultContent, ToolUse, Turn};
use serde_json::{Map as JsonMap, Value, json};
use tracing::debug;

/// Adapter between domain turns and Bedrock Converse JSON
pub struct ConverseAdapter;

impl ConverseAdapter {
    /// Build the request body. `toolConfig` is omitted entirely when the
    /// request carries no tool configuration.
    pub fn to_request_body(request: &ModelRequest) -> Value {
        let mut body = JsonMap::new();
        body.insert(
            "messages".to_string(),
            Value::Array(request.messages.iter().map(Self::encode_turn).collect()),
        );
        if let Some(config) = &request.tool_config {
            body.insert(
                "toolConfig".to_string(),
                json!({ "tools": config.tools.iter().map(Self::encode_tool).collect::<Vec<_>>() }),
            );
        }
        Value::Object(body)
    }

    /// Convert one turn to `{"role": ..., "content": [...]}`
    pub fn encode_turn(turn: &Turn) -> Value {
        json!({
            "role": turn.role.as_str(),
            "content": turn.content.iter().map(Self::encode_item).collect::<Vec<_>>()
        })
    }

    fn encode_item(item: &ContentItem) -> Value {
        match item {
            ContentItem::Text(text) => json!({ "text": text }),
            ContentItem::ToolUse(tool_use) => json!({
                "toolUse": {
                    "toolUseId": tool_use.tool_use_id,
                    "name": tool_use.name,
                    "input": tool_use.input,
                }
            }),
            ContentItem::ToolResult(result) => {
                let mut block = JsonMap::new();
                block.insert("toolUseId".to_string(), json!(result.tool_use_id));
                block.insert(
                    "content".to_string(),
                    Value::Array(
                        result
                            .content
                            .iter()
                            .map(|content| json!({ "text": content.text() }))
                            .collect(),
                    ),
                );
                if result.is_error {
                    block.insert("status".to_string(), json!("error"));
                }
                json!({ "toolResult": Value::Object(block) })
            }
            ContentItem::Opaque(block) => block.clone(),
        }
    }

    fn encode_tool(spec: &ModelToolSpec) -> Value {
        json!({
            "toolSpec": {
                "name": spec.name,
                "description": spec.description,
                "inputSchema": { "json": spec.input_schema },
            }
        })
    }

    /// Decode a Converse response body. Anything other than
    /// `{"output": {"message": {...}}}` is a protocol error.
    pub fn decode_response(provider: &str, body: &Value) -> Result<ModelResponse, ModelError> {
        let message = body
            .get("output")
            .and_then(|output| output.get("message"))
            .ok_or_else(|| ModelError::invalid_response(provider, "missing output.message"))?;
        let turn = Self::decode_turn(provider, message)?;

        let usage = body.get("usage").map(|usage| TokenUsage {
            input_tokens: usage.get("inputTokens").and_then(Value::as_u64).unwrap_or(0),
            output_tokens: usage.get("outputTokens").and_then(Value::as_u64).unwrap_or(0),
        });

        Ok(ModelResponse {
            message: turn,
            stop_reason: body
                .get("stopReason")
                .and_then(Value::as_str)
                .map(str::to_string),
            usage,
        })
    }

    pub fn decode_turn(provider: &str, message: &Value) -> Result<Turn, ModelError> {
        let role = message
            .get("role")
            .and_then(Value::as_str)
            .and_then(Role::from_str)
            .ok_or_else(|| ModelError::invalid_response(provider, "missing or unknown role"))?;
        let items = match message.get("content") {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(ModelError::invalid_response(
                    provider,
                    "message content is not an array",
                ));
            }
            None => return Ok(Turn::new(role, Vec::new())),
        };

        let content = items
            .iter()
            .map(|item| Self::decode_item(provider, item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Turn::new(role, content))
    }

    fn decode_item(provider: &str, item: &Value) -> Result<ContentItem, ModelError> {
        if let Some(text) = item.get("text") {
            let text = text
                .as_str()
                .ok_or_else(|| ModelError::invalid_response(provider, "text block is not a string"))?;
            return Ok(ContentItem::text(text));
        }

        if let Some(tool_use) = item.get("toolUse") {
            let field = |key: &str| {
                tool_use
                    .get(key)
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        ModelError::invalid_response(provider, format!("toolUse is missing '{key}'"))
                    })
            };
            return Ok(ContentItem::ToolUse(ToolUse {
                tool_use_id: field("toolUseId")?,
                name: field("name")?,
                input: tool_use.get("input").cloned().unwrap_or(Value::Null),
            }));
        }

        if let Some(result) = item.get("toolResult") {
            let tool_use_id = result
                .get("toolUseId")
                .and_then(Value::as_str)
                .ok_or_else(|| ModelError::invalid_response(provider, "toolResult is missing 'toolUseId'"))?;
            let content = result
                .get("content")
                .and_then(Value::as_array)
                .map(|blocks| {
                    blocks
                        .iter()
                        .filter_map(|block| block.get("text").and_then(Value::as_str))
                        .map(|text| ToolResultContent::Text(text.to_string()))
                        .collect()
                })
                .unwrap_or_default();
            return Ok(ContentItem::ToolResult(ToolResult {
                tool_use_id: tool_use_id.to_string(),
                content,
                is_error: result.get("status").and_then(Value::as_str) == Some("error"),
            }));
        }

        match item.as_object() {
            Some(object) if !object.is_empty() => {
                let kind = object.keys().next().map(String::as_str).unwrap_or_default();
                debug!(provider, kind, "keeping unrecognised content block");
                Ok(ContentItem::Opaque(item.clone()))
            }
            _ => Err(ModelError::invalid_response(
                provider,
                "content block is not a non-empty object",
            )),
        }
    }
}
