//! Provider-agnostic request/response types (spec §6).
//!
//! Kept deliberately thin and provider-independent, mirroring
//! `vtcode-core/src/llm/provider/message.rs`'s separation of a neutral
//! wire-ish model from any one vendor's JSON shape.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::process::{Content, Message, Role};
use crate::tools::ToolSchema;

/// A pending tool invocation surfaced by the provider inside an assistant
/// turn (spec §4.I).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// Why the provider stopped generating (spec §6). Iteration exhaustion is
/// deliberately not a member here: it is reported by the executor, not the
/// provider (spec §4.I, SPEC_FULL.md resolved-ambiguities).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// A completed provider turn (spec §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LLMResponse {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub stop_reason: StopReason,
    pub usage: Usage,
    /// Raw provider JSON, retained for providers (OpenAI in particular)
    /// that need to echo an assistant turn's exact shape back on the next
    /// request.
    pub raw: Value,
}

impl LLMResponse {
    pub fn assistant_content_blocks(&self) -> Content {
        use crate::process::ContentBlock;
        let mut blocks = Vec::new();
        if let Some(text) = &self.text {
            if !text.is_empty() {
                blocks.push(ContentBlock::text(text.clone()));
            }
        }
        for call in &self.tool_calls {
            blocks.push(ContentBlock::ToolUse {
                id: call.id.clone(),
                name: call.name.clone(),
                input: call.arguments.clone(),
            });
        }
        Content::Blocks(blocks)
    }
}

/// One outbound call to a provider (spec §6).
#[derive(Debug, Clone)]
pub struct LLMRequest<'a> {
    pub model_id: &'a str,
    pub system_prompt: &'a str,
    pub messages: &'a [Message],
    pub tools: &'a [ToolSchema],
    pub parameters: &'a Value,
    /// Caller-supplied headers merged with any provider opt-in header the
    /// executor adds, without duplicating a key the caller already set
    /// (spec §4.I.1).
    pub extra_headers: &'a HashMap<String, String>,
    /// Whether the system prompt should be marked cacheable (spec §6
    /// `[model] disable_automatic_caching`, inverted).
    pub automatic_caching: bool,
}

pub(crate) fn role_str(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::ToolResultBundle => "user",
    }
}
