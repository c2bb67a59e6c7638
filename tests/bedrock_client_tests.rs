// Bedrock Converse client tests against an in-process axum endpoint.

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use mcp_chatbot::config::BedrockConfig;
use mcp_chatbot::model::{
    BedrockClient, ModelError, ModelProvider, ModelRequest, ModelToolSpec, ToolConfiguration,
};
use mcp_chatbot::types::{ContentItem, Role, ToolResult, ToolResultContent, ToolUse, Turn};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

const MODEL_ID: &str = "us.anthropic.claude-sonnet-4-5-20250929-v1:0";
const TOKEN: &str = "bedrock-api-key";

#[derive(Clone, Default)]
struct Captured {
    model_id: Arc<Mutex<Option<String>>>,
    body: Arc<Mutex<Option<Value>>>,
}

async fn converse(
    State(captured): State<Captured>,
    Path(model_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> axum::response::Response {
    let expected = format!("Bearer {TOKEN}");
    let authorized = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        == Some(expected.as_str());
    if !authorized {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"message": "The security token included in the request is invalid."})),
        )
            .into_response();
    }

    *captured.model_id.lock().expect("lock") = Some(model_id);
    let has_tools = body.get("toolConfig").is_some();
    *captured.body.lock().expect("lock") = Some(body);

    let content = if has_tools {
        json!([
            {"text": "Looking that up."},
            {"toolUse": {"toolUseId": "tooluse_1", "name": "list-datasources", "input": {"limit": 5}}}
        ])
    } else {
        json!([{"text": "Hello!"}])
    };
    Json(json!({
        "output": {"message": {"role": "assistant", "content": content}},
        "stopReason": if has_tools { "tool_use" } else { "end_turn" },
        "usage": {"inputTokens": 12, "outputTokens": 7, "totalTokens": 19}
    }))
    .into_response()
}

async fn spawn_endpoint(captured: Captured) -> String {
    let app = Router::new()
        .route("/model/{model_id}/converse", post(converse))
        .with_state(captured);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}")
}

fn config(endpoint: String, token: &str) -> BedrockConfig {
    BedrockConfig {
        region: "us-east-1".to_string(),
        model_id: MODEL_ID.to_string(),
        bearer_token: token.to_string(),
        endpoint_override: Some(endpoint),
    }
}

#[tokio::test]
async fn sends_transcript_and_tools_and_decodes_tool_use() {
    let captured = Captured::default();
    let endpoint = spawn_endpoint(captured.clone()).await;
    let client = BedrockClient::from_config(&config(endpoint, TOKEN));

    let request = ModelRequest {
        model_id: MODEL_ID.to_string(),
        messages: vec![
            Turn::user_text("Which data sources exist?"),
            Turn::new(
                Role::Assistant,
                vec![ContentItem::ToolUse(ToolUse {
                    tool_use_id: "tooluse_0".into(),
                    name: "list-datasources".into(),
                    input: json!({}),
                })],
            ),
            Turn::tool_results(vec![ToolResult {
                tool_use_id: "tooluse_0".into(),
                content: vec![ToolResultContent::Text("permission denied".into())],
                is_error: true,
            }]),
        ],
        tool_config: Some(ToolConfiguration {
            tools: vec![ModelToolSpec {
                name: "list-datasources".into(),
                description: String::new(),
                input_schema: json!({"type": "object"}),
            }],
        }),
    };

    let response = client.converse(request).await.expect("converse");
    assert_eq!(response.message.role, Role::Assistant);
    let tool_use = response.message.tool_uses().next().expect("tool use");
    assert_eq!(tool_use.tool_use_id, "tooluse_1");
    assert_eq!(tool_use.input, json!({"limit": 5}));
    assert_eq!(response.stop_reason.as_deref(), Some("tool_use"));
    assert_eq!(response.usage.map(|u| u.output_tokens), Some(7));

    assert_eq!(captured.model_id.lock().expect("lock").as_deref(), Some(MODEL_ID));
    let body = captured.body.lock().expect("lock").clone().expect("body");
    assert_eq!(body["messages"][0]["content"][0]["text"], "Which data sources exist?");
    assert_eq!(body["messages"][1]["content"][0]["toolUse"]["name"], "list-datasources");
    assert_eq!(body["messages"][2]["content"][0]["toolResult"]["status"], "error");
    let spec = &body["toolConfig"]["tools"][0]["toolSpec"];
    assert_eq!(spec["name"], "list-datasources");
    assert_eq!(spec["description"], "");
    assert_eq!(spec["inputSchema"]["json"], json!({"type": "object"}));
}

#[tokio::test]
async fn omits_tool_config_without_tools() {
    let captured = Captured::default();
    let endpoint = spawn_endpoint(captured.clone()).await;
    let client = BedrockClient::from_config(&config(endpoint, TOKEN));

    let response = client
        .converse(ModelRequest {
            model_id: MODEL_ID.to_string(),
            messages: vec![Turn::user_text("hi")],
            tool_config: None,
        })
        .await
        .expect("converse");
    assert_eq!(response.message, Turn::assistant_text("Hello!"));

    let body = captured.body.lock().expect("lock").clone().expect("body");
    assert!(body.get("toolConfig").is_none());
}

#[tokio::test]
async fn rejected_token_surfaces_service_message() {
    let endpoint = spawn_endpoint(Captured::default()).await;
    let client = BedrockClient::from_config(&config(endpoint, "wrong"));

    let err = client
        .converse(ModelRequest {
            model_id: MODEL_ID.to_string(),
            messages: vec![Turn::user_text("hi")],
            tool_config: None,
        })
        .await
        .expect_err("forbidden");
    match &err {
        ModelError::Api {
            status, message, ..
        } => {
            assert_eq!(status.as_u16(), 403);
            assert!(message.contains("security token"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.user_message().contains("refused the credentials"));
}
