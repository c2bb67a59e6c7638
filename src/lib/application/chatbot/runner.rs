use super::errors::ChatError;
use crate::application::catalog::to_model_tools;
use crate::application::gateway::{self, SessionHandle};
use crate::application::tooling::ToolSession;
use crate::application::translate::{NO_ANSWER, extract_answer_text, tool_result_to_model_content};
use crate::config::ChatSettings;
use crate::domain::ToolDescriptor;
use crate::model::{ModelProvider, ModelRequest, ToolConfiguration};
use crate::types::{ToolResult, ToolResultContent, ToolUse, Turn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub struct ChatBot<P: ModelProvider> {
    provider: P,
    model_id: String,
    transcript: Vec<Turn>,
    tools: Vec<ToolDescriptor>,
    tool_config: Option<ToolConfiguration>,
    session: SessionHandle,
    conversation_id: String,
    call_timeout: Option<Duration>,
    max_tool_rounds: Option<usize>,
}

impl<P: ModelProvider> ChatBot<P> {
    /// `tools` is the catalogue captured at connect time; it is not refreshed.
    pub fn new(provider: P, model_id: impl Into<String>, tools: Vec<ToolDescriptor>) -> Self {
        let tool_config = if tools.is_empty() {
            None
        } else {
            Some(ToolConfiguration {
                tools: to_model_tools(&tools),
            })
        };
        Self {
            provider,
            model_id: model_id.into(),
            transcript: Vec::new(),
            tools,
            tool_config,
            session: SessionHandle::detached(),
            conversation_id: Uuid::new_v4().to_string(),
            call_timeout: None,
            max_tool_rounds: None,
        }
    }

    /// Bound every model and tool call
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Give up on a `chat` after `rounds` rounds of tool calls
    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = Some(rounds);
        self
    }

    pub fn with_settings(mut self, settings: ChatSettings) -> Self {
        self.call_timeout = settings.call_timeout;
        self.max_tool_rounds = settings.max_tool_rounds;
        self
    }

    pub fn attach(&mut self, session: Arc<dyn ToolSession>) {
        info!(
            conversation = %self.conversation_id,
            server = session.server_name(),
            "tool session attached"
        );
        self.session.attach(session);
    }

    /// Detach the session and hand it back for shutdown
    pub fn detach(&mut self) -> Option<Arc<dyn ToolSession>> {
        self.session.release()
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Answer one user utterance. Never fails: errors are logged and turned
    /// into an apology, and the transcript keeps whatever was appended.
    ///
    /// An empty `user_text` continues the conversation without a new user turn.
    pub async fn chat(&mut self, user_text: &str) -> String {
        match self.converse(user_text).await {
            Ok(answer) => answer,
            Err(err) => {
                error!(
                    conversation = %self.conversation_id,
                    %err,
                    turns = self.transcript.len(),
                    "chat request failed"
                );
                format!("Sorry, an error occurred: {}", err.user_message())
            }
        }
    }

    async fn converse(&mut self, user_text: &str) -> Result<String, ChatError> {
        if !user_text.is_empty() {
            self.transcript.push(Turn::user_text(user_text));
        }

        let mut rounds = 0usize;
        loop {
            let reply = self.request_reply().await?;
            let tool_uses: Vec<ToolUse> = reply.tool_uses().cloned().collect();
            let answer = extract_answer_text(&reply).map(str::to_string);
            self.transcript.push(reply);

            if tool_uses.is_empty() {
                return Ok(answer.unwrap_or_else(|| {
                    debug!(conversation = %self.conversation_id, "model reply carried no text");
                    NO_ANSWER.to_string()
                }));
            }

            if let Some(limit) = self.max_tool_rounds {
                if rounds >= limit {
                    warn!(conversation = %self.conversation_id, limit, "tool round limit reached");
                    let err = ChatError::ToolRoundLimit { limit };
                    // each toolUse must be answered by a toolResult
                    let skipped = tool_uses
                        .iter()
                        .map(|tool_use| ToolResult {
                            tool_use_id: tool_use.tool_use_id.clone(),
                            content: vec![ToolResultContent::Text(err.to_string())],
                            is_error: true,
                        })
                        .collect();
                    self.transcript.push(Turn::tool_results(skipped));
                    return Err(err);
                }
            }
            rounds += 1;

            let mut results = Vec::with_capacity(tool_uses.len());
            for tool_use in &tool_uses {
                results.push(self.run_tool(tool_use).await?);
            }
            self.transcript.push(Turn::tool_results(results));
        }
    }

    async fn request_reply(&self) -> Result<Turn, ChatError> {
        let request = ModelRequest {
            model_id: self.model_id.clone(),
            messages: self.transcript.clone(),
            tool_config: self.tool_config.clone(),
        };
        debug!(
            conversation = %self.conversation_id,
            model = %self.model_id,
            messages = request.messages.len(),
            tools = self.tools.len(),
            "sending converse request"
        );
        let response = self
            .bounded("model call", self.provider.converse(request))
            .await??;
        if let Some(usage) = response.usage {
            debug!(
                conversation = %self.conversation_id,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                stop_reason = response.stop_reason.as_deref(),
                "model replied"
            );
        }
        Ok(response.message)
    }

    async fn run_tool(&self, tool_use: &ToolUse) -> Result<ToolResult, ChatError> {
        info!(
            conversation = %self.conversation_id,
            tool = %tool_use.name,
            tool_use_id = %tool_use.tool_use_id,
            "calling tool"
        );
        let outcome = self
            .bounded(
                "tool call",
                gateway::invoke(&self.session, &tool_use.name, tool_use.input.clone()),
            )
            .await?
            .map_err(|source| ChatError::Tool {
                tool: tool_use.name.clone(),
                source,
            })?;

        if outcome.is_error {
            warn!(tool = %tool_use.name, "tool reported failure");
        }
        Ok(ToolResult {
            tool_use_id: tool_use.tool_use_id.clone(),
            content: tool_result_to_model_content(&outcome),
            is_error: outcome.is_error,
        })
    }

    async fn bounded<F: Future>(
        &self,
        operation: &'static str,
        call: F,
    ) -> Result<F::Output, ChatError> {
        match self.call_timeout {
            Some(after) => tokio::time::timeout(after, call)
                .await
                .map_err(|_| ChatError::Timeout { operation, after }),
            None => Ok(call.await),
        }
    }
}
