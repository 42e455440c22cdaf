//! The provider abstraction (spec §4.I), grounded on
//! `vtcode-core/src/llm/provider/provider_trait.rs`'s `LLMProvider` trait:
//! an async-trait object with a capability surface, generalized down to
//! exactly what the iteration loop needs.

use async_trait::async_trait;

use crate::error::Error;
use crate::providers::types::{LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMProvider: Send + Sync {
    fn name(&self) -> &str;

    /// The header this provider merges into outbound requests when a
    /// Program opts into token-efficient tool encoding (spec §4.I.1).
    /// `None` for providers with no such opt-in.
    fn token_efficient_header(&self) -> Option<(&'static str, &'static str)> {
        None
    }

    async fn generate(&self, request: LLMRequest<'_>) -> Result<LLMResponse, Error>;
}
