//! Tool-provider side types, as reported by an MCP server.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// A tool advertised by the provider in its `tools/list` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "inputSchema", default)]
    pub input_schema: Value,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: Option<&str>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.map(str::to_string),
            input_schema,
        }
    }
}

/// One block of a tool's output.
///
/// Binary payloads (image and audio data, resource blobs) are dropped at this
/// boundary; only their descriptive metadata is kept.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum ContentBlock {
    Text { text: String },
    Image { mime_type: String },
    Audio { mime_type: String },
    Resource { uri: Option<String>, text: Option<String> },
    Other { kind: String, raw: Value },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn kind(&self) -> &str {
        match self {
            ContentBlock::Text { .. } => "text",
            ContentBlock::Image { .. } => "image",
            ContentBlock::Audio { .. } => "audio",
            ContentBlock::Resource { .. } => "resource",
            ContentBlock::Other { kind, .. } => kind,
        }
    }
}

impl From<Value> for ContentBlock {
    fn from(value: Value) -> Self {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let string_field = |source: &Value, key: &str| {
            source.get(key).and_then(Value::as_str).map(str::to_string)
        };
        let mime_type = string_field(&value, "mimeType").unwrap_or_else(|| "unknown".to_string());

        match kind.as_str() {
            "text" => match string_field(&value, "text") {
                Some(text) => ContentBlock::Text { text },
                None => ContentBlock::Other { kind, raw: value },
            },
            "image" => ContentBlock::Image { mime_type },
            "audio" => ContentBlock::Audio { mime_type },
            "resource" => {
                let resource = value.get("resource").cloned().unwrap_or(Value::Null);
                ContentBlock::Resource {
                    uri: string_field(&resource, "uri"),
                    text: string_field(&resource, "text"),
                }
            }
            "resource_link" => ContentBlock::Other { kind, raw: value },
            _ => {
                warn!(kind = kind.as_str(), "unrecognised content block from tool provider");
                ContentBlock::Other { kind, raw: value }
            }
        }
    }
}

/// The raw result of a `tools/call` request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolExecutionResult {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl ToolExecutionResult {
    pub fn success(content: Vec<ContentBlock>) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    pub fn failure(content: Vec<ContentBlock>) -> Self {
        Self {
            content,
            is_error: true,
        }
    }
}
