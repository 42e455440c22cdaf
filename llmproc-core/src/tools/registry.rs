//! Tool Registry: name resolution, alias rewriting, and dispatch (spec
//! §4.C).
//!
//! Grounded on the tool-lookup shape of
//! `vtcode-core/src/tools/registry` (dispatch by name, enrich errors with
//! the set of available names) but generalized to the two-mode handler
//! split this runtime requires.

use std::collections::HashMap;

use crate::error::Error;
use crate::tool_result::ToolResult;
use crate::tools::context::RuntimeContext;
use crate::tools::schema::{ToolArgs, ToolHandler, ToolSchema};

/// Tools whose name the `fork` special-case in the executor must be able to
/// recognize without a registry lookup (spec §4.E: `fork` is dispatched
/// from the executor directly, never through `call_tool`).
pub const FORK_TOOL_NAME: &str = "fork";

pub struct ToolRegistry {
    handlers: HashMap<String, ToolHandler>,
    schemas: HashMap<String, ToolSchema>,
    /// exposed name -> target handler name (spec §4.C: aliases are a
    /// name-rewriting layer applied before lookup).
    aliases: HashMap<String, String>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            schemas: HashMap::new(),
            aliases: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Registers a tool under its canonical (target) name.
    pub fn register_tool(&mut self, name: impl Into<String>, handler: ToolHandler, schema: ToolSchema) {
        let name = name.into();
        if !self.handlers.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.handlers.insert(name.clone(), handler);
        self.schemas.insert(name, schema);
    }

    /// Exposes `target` to the model under `alias` instead of its own name.
    /// Does not remove `target`'s handler; only affects which name the
    /// schema is advertised under and which name `call_tool` accepts.
    pub fn register_alias(&mut self, alias: impl Into<String>, target: impl Into<String>) {
        self.aliases.insert(alias.into(), target.into());
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.handlers.contains_key(name) || self.aliases.contains_key(name)
    }

    fn resolve(&self, name: &str) -> Option<&str> {
        self.aliases
            .get(name)
            .map(String::as_str)
            .or_else(|| self.handlers.contains_key(name).then_some(name))
    }

    /// Alias targets currently registered (used by the compiler's
    /// injectivity check — spec §8 invariant 5).
    pub fn alias_targets(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(a, t)| (a.as_str(), t.as_str()))
    }

    pub fn available_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.order.clone();
        names.extend(self.aliases.keys().cloned());
        names
    }

    /// Schemas in registration order, with an alias's schema advertised
    /// under the alias name rather than its target's.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        let reverse: HashMap<&str, &str> = self
            .aliases
            .iter()
            .map(|(alias, target)| (target.as_str(), alias.as_str()))
            .collect();

        self.order
            .iter()
            .filter_map(|name| self.schemas.get(name))
            .map(|schema| {
                if let Some(alias) = reverse.get(schema.name.as_str()) {
                    ToolSchema {
                        name: (*alias).to_string(),
                        ..schema.clone()
                    }
                } else {
                    schema.clone()
                }
            })
            .collect()
    }

    pub fn handler(&self, name: &str) -> Option<&ToolHandler> {
        self.resolve(name).and_then(|target| self.handlers.get(target))
    }

    /// Dispatches `name` to its handler. `ctx` is only consulted for
    /// context-aware handlers; context-free handlers ignore it entirely.
    pub async fn call_tool(&self, name: &str, args: ToolArgs, ctx: RuntimeContext) -> Result<ToolResult, Error> {
        let target = self.resolve(name).ok_or_else(|| Error::ToolNotFound {
            name: name.to_string(),
            available: self.available_names().join(", "),
        })?;

        let handler = self.handlers.get(target).expect("resolve() only returns registered names");
        let result = match handler {
            ToolHandler::ContextFree(f) => f(args).await,
            ToolHandler::ContextAware(f) => f(args, ctx).await,
        };
        Ok(result)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::schema::ToolHandler;

    fn echo_schema(name: &str) -> ToolSchema {
        ToolSchema::new(name, "echoes input", serde_json::json!({"type": "object"}))
    }

    #[tokio::test]
    async fn alias_resolves_to_target_handler() {
        let mut registry = ToolRegistry::new();
        registry.register_tool(
            "real_name",
            ToolHandler::context_free(|_args| async { ToolResult::from_success("ok") }),
            echo_schema("real_name"),
        );
        registry.register_alias("nice_name", "real_name");

        let ctx_free_dummy = test_ctx();
        let result = registry.call_tool("nice_name", serde_json::json!({}), ctx_free_dummy).await.unwrap();
        assert_eq!(result.content, "ok");
    }

    #[tokio::test]
    async fn unknown_tool_lists_available_names() {
        let mut registry = ToolRegistry::new();
        registry.register_tool(
            "calculator",
            ToolHandler::context_free(|_args| async { ToolResult::from_success("4") }),
            echo_schema("calculator"),
        );
        let err = registry
            .call_tool("nonexistent", serde_json::json!({}), test_ctx())
            .await
            .unwrap_err();
        match err {
            Error::ToolNotFound { name, available } => {
                assert_eq!(name, "nonexistent");
                assert!(available.contains("calculator"));
            }
            other => panic!("expected ToolNotFound, got {other:?}"),
        }
    }

    fn test_ctx() -> RuntimeContext {
        use crate::program::Program;
        use std::collections::HashMap;
        use std::sync::Arc;
        use tokio::sync::Mutex;

        RuntimeContext {
            process: Arc::new(Mutex::new(crate::process::ProcessState::empty())),
            fd_manager: None,
            linked_programs: Arc::new(Mutex::new(HashMap::new())),
            linked_program_descriptions: Arc::new(HashMap::new()),
            program: Arc::new(Program::minimal_for_tests()),
            allow_fork: false,
        }
    }
}
