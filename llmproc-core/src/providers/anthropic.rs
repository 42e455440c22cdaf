//! Concrete Anthropic Messages API transport, grounded on
//! `vtcode-core/src/llm/providers/anthropic.rs` (client construction,
//! header assembly, error mapping).

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Error;
use crate::process::ContentBlock;
use crate::providers::provider_trait::LLMProvider;
use crate::providers::types::{role_str, LLMRequest, LLMResponse, StopReason, ToolCall, Usage};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
/// Token-efficient tool-use beta header (spec §4.I.1).
const TOKEN_EFFICIENT_BETA: &str = "token-efficient-tools-2025-02-19";

pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
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

    fn messages_to_wire(messages: &[crate::process::Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|m| {
                let content = match &m.content {
                    crate::process::Content::Text(text) => json!(text),
                    crate::process::Content::Blocks(blocks) => {
                        json!(blocks.iter().map(block_to_wire).collect::<Vec<_>>())
                    }
                };
                json!({ "role": role_str(m.role), "content": content })
            })
            .collect()
    }
}

fn block_to_wire(block: &ContentBlock) -> Value {
    match block {
        ContentBlock::Text { text } => json!({ "type": "text", "text": text }),
        ContentBlock::ToolUse { id, name, input } => {
            json!({ "type": "tool_use", "id": id, "name": name, "input": input })
        }
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => json!({
            "type": "tool_result",
            "tool_use_id": tool_use_id,
            "content": content,
            "is_error": is_error,
        }),
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn token_efficient_header(&self) -> Option<(&'static str, &'static str)> {
        Some(("anthropic-beta", TOKEN_EFFICIENT_BETA))
    }

    async fn generate(&self, request: LLMRequest<'_>) -> Result<LLMResponse, Error> {
        let tools: Vec<Value> = request
            .tools
            .iter()
            .map(|t| json!({ "name": t.name, "description": t.description, "input_schema": t.parameters }))
            .collect();

        let system = if request.automatic_caching {
            json!([{ "type": "text", "text": request.system_prompt, "cache_control": { "type": "ephemeral" } }])
        } else {
            json!(request.system_prompt)
        };

        let mut body = json!({
            "model": request.model_id,
            "system": system,
            "messages": Self::messages_to_wire(request.messages),
            "tools": tools,
        });
        if let Value::Object(ref mut map) = body {
            if let Value::Object(params) = request.parameters {
                for (k, v) in params {
                    map.insert(k.clone(), v.clone());
                }
            }
            map.entry("max_tokens").or_insert(json!(4096));
        }

        let mut req = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body);
        for (name, value) in request.extra_headers {
            req = req.header(name, value);
        }

        let response = req
            .send()
            .await
            .map_err(|e| Error::Provider(format!("anthropic request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!("anthropic returned {status}: {body}")));
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("failed to decode anthropic response: {e}")))?;

        parse_anthropic_response(raw)
    }
}

fn parse_anthropic_response(raw: Value) -> Result<LLMResponse, Error> {
    let content = raw.get("content").and_then(Value::as_array).cloned().unwrap_or_default();

    let mut text_parts = Vec::new();
    let mut tool_calls = Vec::new();
    for block in &content {
        match block.get("type").and_then(Value::as_str) {
            Some("text") => {
                if let Some(t) = block.get("text").and_then(Value::as_str) {
                    text_parts.push(t.to_string());
                }
            }
            Some("tool_use") => {
                tool_calls.push(ToolCall {
                    id: block.get("id").and_then(Value::as_str).unwrap_or_default().to_string(),
                    name: block.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                    arguments: block.get("input").cloned().unwrap_or(json!({})),
                });
            }
            _ => {}
        }
    }

    let stop_reason = match raw.get("stop_reason").and_then(Value::as_str) {
        Some("tool_use") => StopReason::ToolUse,
        Some("max_tokens") => StopReason::MaxTokens,
        Some("stop_sequence") => StopReason::StopSequence,
        _ => StopReason::EndTurn,
    };

    let usage = raw
        .get("usage")
        .map(|u| Usage {
            input_tokens: u.get("input_tokens").and_then(Value::as_u64).unwrap_or(0),
            output_tokens: u.get("output_tokens").and_then(Value::as_u64).unwrap_or(0),
        })
        .unwrap_or_default();

    Ok(LLMResponse {
        text: if text_parts.is_empty() {
            None
        } else {
            Some(text_parts.join(""))
        },
        tool_calls,
        stop_reason,
        usage,
        raw,
    })
}
