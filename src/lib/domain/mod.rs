pub mod tool;
pub mod types;

pub use tool::{ContentBlock, ToolDescriptor, ToolExecutionResult};
pub use types::{ContentItem, Role, ToolResult, ToolResultContent, ToolUse, Turn};
