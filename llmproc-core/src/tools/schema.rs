//! Tool schemas and the context-free / context-aware handler split (spec
//! §3, §4.C, §4.D).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::tool_result::ToolResult;
use crate::tools::context::RuntimeContext;

pub type ToolArgs = Value;
pub type ToolFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;

/// JSON-Schema-shaped tool description handed to the provider (spec §4.C).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A tool's implementation. Context-free handlers receive only their
/// arguments; context-aware handlers additionally receive a
/// [`RuntimeContext`] snapshot assembled by the registry at call time (spec
/// §4.D). The distinction is fixed at registration — a handler never
/// negotiates it at call time.
#[derive(Clone)]
pub enum ToolHandler {
    ContextFree(Arc<dyn Fn(ToolArgs) -> ToolFuture + Send + Sync>),
    ContextAware(Arc<dyn Fn(ToolArgs, RuntimeContext) -> ToolFuture + Send + Sync>),
}

impl ToolHandler {
    pub fn context_free<F, Fut>(f: F) -> Self
    where
        F: Fn(ToolArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult> + Send + 'static,
    {
        Self::ContextFree(Arc::new(move |args| Box::pin(f(args))))
    }

    pub fn context_aware<F, Fut>(f: F) -> Self
    where
        F: Fn(ToolArgs, RuntimeContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult> + Send + 'static,
    {
        Self::ContextAware(Arc::new(move |args, ctx| Box::pin(f(args, ctx))))
    }

    pub fn is_context_aware(&self) -> bool {
        matches!(self, Self::ContextAware(_))
    }
}
