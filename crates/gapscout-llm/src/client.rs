use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use gapscout_core::config::ModelConfig;
use gapscout_core::error::{GapscoutError, Result};
use gapscout_core::traits::Reasoner;
use gapscout_core::types::*;

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// OpenAI-compatible chat client. Works with Groq, OpenAI, Ollama, vLLM, etc.
///
/// Requests are non-streaming: the workflow engine treats every Reasoner
/// call as a blocking step and only needs the completed message.
pub struct GroqClient {
    http: Client,
    config: ModelConfig,
}

impl GroqClient {
    pub fn new(config: ModelConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| GapscoutError::Reasoner(e.to_string()))?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        match &self.config.base_url {
            Some(base) => format!("{}/chat/completions", base.trim_end_matches('/')),
            None => GROQ_API_URL.to_string(),
        }
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        json_mode: bool,
    ) -> Result<ChatMessage> {
        let request = ChatRequest {
            model: self.config.model_id.clone(),
            messages: convert_messages(messages),
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            tools: convert_tools(tools),
            response_format: json_mode.then(|| ResponseFormat {
                r#type: "json_object".to_string(),
            }),
        };

        debug!(model = %self.config.model_id, json_mode, tools = tools.len(), "Sending chat request");

        let mut req = self.http.post(self.endpoint()).json(&request);
        if let Some(key) = &self.config.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| GapscoutError::Reasoner(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Chat request rejected");
            return Err(GapscoutError::Reasoner(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.chars().take(500).collect::<String>()
            )));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| GapscoutError::Reasoner(format!("response parse error: {}", e)))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GapscoutError::Reasoner("response contained no choices".into()))?;

        Ok(into_chat_message(choice.message))
    }
}

impl Reasoner for GroqClient {
    fn respond(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> BoxFuture<'_, Result<ChatMessage>> {
        let messages = messages.to_vec();
        let tools = tools.to_vec();
        Box::pin(async move { self.complete(&messages, &tools, false).await })
    }

    fn respond_structured(
        &self,
        messages: &[ChatMessage],
        schema_hint: &str,
    ) -> BoxFuture<'_, Result<ChatMessage>> {
        let mut messages = messages.to_vec();
        // JSON mode requires the shape to be named in the conversation.
        messages.push(ChatMessage::system(format!(
            "Respond with a single JSON object matching: {}",
            schema_hint
        )));
        Box::pin(async move {
            let msg = self.complete(&messages, &[], true).await?;
            let body = msg.text();
            if serde_json::from_str::<serde_json::Value>(&body).is_err() {
                return Err(GapscoutError::StructuredOutput(format!(
                    "not valid JSON: {}",
                    body.chars().take(200).collect::<String>()
                )));
            }
            Ok(msg)
        })
    }
}

// Request types

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<OaiMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OaiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    r#type: String,
}

#[derive(Serialize)]
struct OaiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OaiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct OaiToolCall {
    id: String,
    r#type: String,
    function: OaiFunction,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct OaiFunction {
    name: String,
    arguments: String,
}

#[derive(Serialize)]
struct OaiTool {
    r#type: String,
    function: OaiToolDef,
}

#[derive(Serialize)]
struct OaiToolDef {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

// Response types

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OaiToolCall>>,
}

fn convert_tools(tools: &[ToolDefinition]) -> Vec<OaiTool> {
    tools
        .iter()
        .map(|t| OaiTool {
            r#type: "function".to_string(),
            function: OaiToolDef {
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.input_schema.clone(),
            },
        })
        .collect()
}

fn convert_messages(messages: &[ChatMessage]) -> Vec<OaiMessage> {
    let mut oai_msgs = Vec::new();

    for msg in messages {
        match msg.role {
            Role::System => oai_msgs.push(OaiMessage {
                role: "system".to_string(),
                content: Some(msg.text()),
                tool_calls: None,
                tool_call_id: None,
            }),
            Role::User => oai_msgs.push(OaiMessage {
                role: "user".to_string(),
                content: Some(msg.text()),
                tool_calls: None,
                tool_call_id: None,
            }),
            Role::Assistant => {
                let tool_calls: Vec<OaiToolCall> = msg
                    .tool_requests()
                    .into_iter()
                    .map(|req| OaiToolCall {
                        id: req.id,
                        r#type: "function".to_string(),
                        function: OaiFunction {
                            name: req.name,
                            arguments: req.arguments.to_string(),
                        },
                    })
                    .collect();
                let text = msg.text();
                oai_msgs.push(OaiMessage {
                    role: "assistant".to_string(),
                    content: (!text.is_empty()).then_some(text),
                    tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                    tool_call_id: None,
                });
            }
            Role::Tool => {
                // One wire message per tool-result block.
                for block in &msg.content {
                    if let ContentBlock::ToolResult {
                        tool_use_id,
                        content,
                    } = block
                    {
                        oai_msgs.push(OaiMessage {
                            role: "tool".to_string(),
                            content: Some(content.clone()),
                            tool_calls: None,
                            tool_call_id: Some(tool_use_id.clone()),
                        });
                    }
                }
            }
        }
    }

    oai_msgs
}

fn into_chat_message(msg: ResponseMessage) -> ChatMessage {
    let requests: Vec<ToolRequest> = msg
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| ToolRequest {
            id: tc.id,
            name: tc.function.name,
            arguments: serde_json::from_str(&tc.function.arguments)
                .unwrap_or(serde_json::Value::Null),
        })
        .collect();

    ChatMessage::assistant_with_tools(msg.content.unwrap_or_default(), requests)
}
