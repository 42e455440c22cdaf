//! Provider-agnostic request/response types and concrete transports (spec
//! §6; SPEC_FULL.md adds the concrete Anthropic/OpenAI transports so the
//! workspace is runnable end to end).

pub mod anthropic;
pub mod openai;
mod provider_trait;
pub mod types;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;
pub use provider_trait::LLMProvider;
pub use types::{LLMRequest, LLMResponse, StopReason, ToolCall, Usage};
