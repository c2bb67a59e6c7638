use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// A model-issued request to run a named tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUse {
    pub tool_use_id: String,
    pub name: String,
    pub input: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolResultContent {
    Text(String),
}

impl ToolResultContent {
    pub fn text(&self) -> &str {
        match self {
            ToolResultContent::Text(text) => text,
        }
    }
}

/// The answer to one [`ToolUse`], carried back to the model in a user turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_use_id: String,
    pub content: Vec<ToolResultContent>,
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContentItem {
    Text(String),
    ToolUse(ToolUse),
    ToolResult(ToolResult),
    /// A model block this crate does not interpret (reasoning, citations).
    /// Kept as received and sent back unchanged.
    Opaque(Value),
}

impl ContentItem {
    pub fn text(value: impl Into<String>) -> Self {
        ContentItem::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentItem::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_tool_use(&self) -> Option<&ToolUse> {
        match self {
            ContentItem::ToolUse(tool_use) => Some(tool_use),
            _ => None,
        }
    }
}

/// One role-tagged message of the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: Vec<ContentItem>,
}

impl Turn {
    pub fn new(role: Role, content: Vec<ContentItem>) -> Self {
        Self { role, content }
    }

    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentItem::text(text)])
    }

    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![ContentItem::text(text)])
    }

    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self::new(
            Role::User,
            results.into_iter().map(ContentItem::ToolResult).collect(),
        )
    }

    pub fn tool_uses(&self) -> impl Iterator<Item = &ToolUse> {
        self.content.iter().filter_map(ContentItem::as_tool_use)
    }

    pub fn has_tool_use(&self) -> bool {
        self.tool_uses().next().is_some()
    }
}
