//! Conversion between tool-provider output and model content.

use crate::domain::{ContentBlock, ToolExecutionResult};
use crate::types::{ToolResultContent, Turn};
use tracing::debug;

/// Returned by the orchestrator when the model answers without any text
pub const NO_ANSWER: &str = "No response generated";

/// Map each block of a tool result to a model-side text item, in order.
///
/// Binary payloads are never forwarded; images and audio become a short
/// placeholder naming their MIME type.
pub fn tool_result_to_model_content(result: &ToolExecutionResult) -> Vec<ToolResultContent> {
    result.content.iter().map(block_to_content).collect()
}

fn block_to_content(block: &ContentBlock) -> ToolResultContent {
    let text = match block {
        ContentBlock::Text { text } => text.clone(),
        ContentBlock::Image { mime_type } => format!("[Image: {mime_type}]"),
        ContentBlock::Audio { mime_type } => format!("[Audio: {mime_type}]"),
        ContentBlock::Resource { text: Some(text), .. } => text.clone(),
        ContentBlock::Resource { uri: Some(uri), .. } => format!("[Resource: {uri}]"),
        ContentBlock::Resource { .. } => "[Resource]".to_string(),
        ContentBlock::Other { kind, raw } => {
            debug!(kind = kind.as_str(), "rendering unrecognised tool content as JSON");
            render_other(kind, raw)
        }
    };
    ToolResultContent::Text(text)
}

fn render_other(kind: &str, raw: &serde_json::Value) -> String {
    match serde_json::to_string(raw) {
        Ok(rendered) if !rendered.is_empty() && rendered != "null" => rendered,
        _ if kind.is_empty() => "[Unknown content]".to_string(),
        _ => format!("[{kind}]"),
    }
}

/// First text item of `turn`, if any. Tool-use items are never consulted.
pub fn extract_answer_text(turn: &Turn) -> Option<&str> {
    turn.content.iter().find_map(|item| item.as_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentItem, Role, ToolUse};
    use serde_json::json;

    fn texts(content: &[ToolResultContent]) -> Vec<&str> {
        content.iter().map(ToolResultContent::text).collect()
    }

    #[test]
    fn text_blocks_map_one_to_one() {
        let result = ToolExecutionResult::success(vec![
            ContentBlock::text("first"),
            ContentBlock::text("second"),
        ]);
        assert_eq!(texts(&tool_result_to_model_content(&result)), ["first", "second"]);
    }

    #[test]
    fn image_becomes_single_placeholder() {
        let result = ToolExecutionResult::success(vec![ContentBlock::Image {
            mime_type: "image/png".into(),
        }]);
        let content = tool_result_to_model_content(&result);
        assert_eq!(texts(&content), ["[Image: image/png]"]);
    }

    #[test]
    fn mixed_blocks_keep_order() {
        let result: ToolExecutionResult = serde_json::from_value(json!({
            "content": [
                {"type": "text", "text": "chart below"},
                {"type": "image", "data": "AAAA", "mimeType": "image/jpeg"},
                {"type": "resource", "resource": {"uri": "file:///r.csv", "text": "a,b\n1,2"}},
                {"type": "resource", "resource": {"uri": "file:///blob.bin", "blob": "AAAA"}}
            ],
            "isError": true
        }))
        .expect("tool result");

        let content = tool_result_to_model_content(&result);
        assert_eq!(
            texts(&content),
            [
                "chart below",
                "[Image: image/jpeg]",
                "a,b\n1,2",
                "[Resource: file:///blob.bin]"
            ]
        );
    }

    #[test]
    fn unknown_blocks_are_never_empty() {
        let blocks = vec![
            ContentBlock::Other {
                kind: "hologram".into(),
                raw: json!({"type": "hologram", "depth": 3}),
            },
            ContentBlock::Other {
                kind: String::new(),
                raw: serde_json::Value::Null,
            },
        ];
        let content = tool_result_to_model_content(&ToolExecutionResult::success(blocks));
        assert_eq!(content.len(), 2);
        assert!(content[0].text().contains("hologram"));
        assert_eq!(content[1].text(), "[Unknown content]");
    }

    #[test]
    fn answer_is_first_text_item() {
        let turn = Turn::new(
            Role::Assistant,
            vec![
                ContentItem::ToolUse(ToolUse {
                    tool_use_id: "t1".into(),
                    name: "search".into(),
                    input: json!({"q": "not an answer"}),
                }),
                ContentItem::text("first"),
                ContentItem::text("second"),
            ],
        );
        let before = turn.clone();
        assert_eq!(extract_answer_text(&turn), Some("first"));
        assert_eq!(extract_answer_text(&turn), Some("first"));
        assert_eq!(turn, before);
    }

    #[test]
    fn no_text_gives_none() {
        let turn = Turn::new(
            Role::Assistant,
            vec![ContentItem::ToolUse(ToolUse {
                tool_use_id: "t1".into(),
                name: "search".into(),
                input: json!({"text": "hidden"}),
            })],
        );
        assert_eq!(extract_answer_text(&turn), None);
    }
}
