//! Concrete OpenAI-compatible chat-completions transport, grounded on the
//! same request/error-handling shape as
//! `providers::anthropic::AnthropicProvider`, adapted to the
//! `role`/`tool_calls`/`tool_call_id` wire format OpenAI-compatible APIs
//! use instead of Anthropic's `content`-block tool_use/tool_result pairs.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Error;
use crate::process::{Content, ContentBlock, Message, Role};
use crate::providers::provider_trait::LLMProvider;
use crate::providers::types::{LLMRequest, LLMResponse, StopReason, ToolCall, Usage};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn messages_to_wire(system_prompt: &str, messages: &[Message]) -> Vec<Value> {
        let mut wire = vec![json!({ "role": "system", "content": system_prompt })];
        for m in messages {
            wire.extend(message_to_wire(m));
        }
        wire
    }
}

fn message_to_wire(m: &Message) -> Vec<Value> {
    match &m.content {
        Content::Text(text) => vec![json!({ "role": openai_role(m.role), "content": text })],
        Content::Blocks(blocks) => {
            let mut text = String::new();
            let mut tool_calls = Vec::new();
            let mut tool_results = Vec::new();
            for block in blocks {
                match block {
                    ContentBlock::Text { text: t } => text.push_str(t),
                    ContentBlock::ToolUse { id, name, input } => tool_calls.push(json!({
                        "id": id,
                        "type": "function",
                        "function": { "name": name, "arguments": input.to_string() },
                    })),
                    ContentBlock::ToolResult {
                        tool_use_id,
                        content,
                        is_error,
                    } => tool_results.push((tool_use_id.clone(), content.clone(), *is_error)),
                }
            }

            if !tool_results.is_empty() {
                return tool_results
                    .into_iter()
                    .map(|(id, content, is_error)| {
                        let prefixed = if is_error { format!("[error] {content}") } else { content };
                        json!({ "role": "tool", "tool_call_id": id, "content": prefixed })
                    })
                    .collect();
            }

            let mut msg = json!({ "role": openai_role(m.role), "content": text });
            if !tool_calls.is_empty() {
                msg["tool_calls"] = json!(tool_calls);
            }
            vec![msg]
        }
    }
}

fn openai_role(role: Role) -> &'static str {
    match role {
        Role::User | Role::ToolResultBundle => "user",
        Role::Assistant => "assistant",
    }
}

#[async_trait]
impl LLMProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: LLMRequest<'_>) -> Result<LLMResponse, Error> {
        let tools: Vec<Value> = request
            .tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": { "name": t.name, "description": t.description, "parameters": t.parameters },
                })
            })
            .collect();

        let mut body = json!({
            "model": request.model_id,
            "messages": Self::messages_to_wire(request.system_prompt, request.messages),
            "tools": tools,
        });
        if let Value::Object(ref mut map) = body {
            if let Value::Object(params) = request.parameters {
                for (k, v) in params {
                    map.insert(k.clone(), v.clone());
                }
            }
        }

        let mut req = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body);
        for (name, value) in request.extra_headers {
            req = req.header(name, value);
        }

        let response = req
            .send()
            .await
            .map_err(|e| Error::Provider(format!("openai request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!("openai returned {status}: {body}")));
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("failed to decode openai response: {e}")))?;

        parse_openai_response(raw)
    }
}

fn parse_openai_response(raw: Value) -> Result<LLMResponse, Error> {
    let choice = raw
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|a| a.first())
        .ok_or_else(|| Error::Provider("openai response had no choices".to_string()))?;

    let message = choice.get("message").cloned().unwrap_or(json!({}));
    let text = message.get("content").and_then(Value::as_str).map(str::to_string);

    let tool_calls = message
        .get("tool_calls")
        .and_then(Value::as_array)
        .map(|calls| {
            calls
                .iter()
                .filter_map(|c| {
                    let id = c.get("id")?.as_str()?.to_string();
                    let function = c.get("function")?;
                    let name = function.get("name")?.as_str()?.to_string();
                    let arguments_str = function.get("arguments")?.as_str().unwrap_or("{}");
                    let arguments = serde_json::from_str(arguments_str).unwrap_or(json!({}));
                    Some(ToolCall { id, name, arguments })
                })
                .collect()
        })
        .unwrap_or_default();

    let stop_reason = match choice.get("finish_reason").and_then(Value::as_str) {
        Some("tool_calls") => StopReason::ToolUse,
        Some("length") => StopReason::MaxTokens,
        Some("stop") => StopReason::EndTurn,
        _ => StopReason::EndTurn,
    };

    let usage = raw
        .get("usage")
        .map(|u| Usage {
            input_tokens: u.get("prompt_tokens").and_then(Value::as_u64).unwrap_or(0),
            output_tokens: u.get("completion_tokens").and_then(Value::as_u64).unwrap_or(0),
        })
        .unwrap_or_default();

    Ok(LLMResponse {
        text,
        tool_calls,
        stop_reason,
        usage,
        raw,
    })
}
