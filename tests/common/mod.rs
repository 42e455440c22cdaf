//! Shared scaffolding for the end-to-end scenario tests in this directory.
//!
//! None of these helpers ever touch a real provider transport: every test
//! drives the executor against a [`ScriptedProvider`] so the suite stays
//! fast and network-free while still exercising the real compile -> start ->
//! run path through public API.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use llmproc_core::error::Error;
use llmproc_core::fd::FileDescriptorManager;
use llmproc_core::process::{LinkedProgram, Process};
use llmproc_core::program::Program;
use llmproc_core::providers::{LLMProvider, LLMRequest, LLMResponse, StopReason, ToolCall, Usage};
use llmproc_core::tools::builtin;

/// A provider whose response is computed from the outbound request by a
/// user-supplied closure, so a test can script a whole multi-turn
/// conversation (or a fork branch's own private turn sequence) by pattern
/// matching on `request.messages` rather than a global call counter.
pub struct ScriptedProvider<F>
where
    F: Fn(&LLMRequest<'_>) -> LLMResponse + Send + Sync,
{
    script: F,
}

impl<F> ScriptedProvider<F>
where
    F: Fn(&LLMRequest<'_>) -> LLMResponse + Send + Sync,
{
    pub fn new(script: F) -> Self {
        Self { script }
    }
}

#[async_trait]
impl<F> LLMProvider for ScriptedProvider<F>
where
    F: Fn(&LLMRequest<'_>) -> LLMResponse + Send + Sync,
{
    fn name(&self) -> &str {
        "scripted-test-provider"
    }

    async fn generate(&self, request: LLMRequest<'_>) -> Result<LLMResponse, Error> {
        Ok((self.script)(&request))
    }
}

pub fn text_response(text: &str) -> LLMResponse {
    LLMResponse {
        text: Some(text.to_string()),
        tool_calls: vec![],
        stop_reason: StopReason::EndTurn,
        usage: Usage::default(),
        raw: serde_json::Value::Null,
    }
}

pub fn tool_call_response(id: &str, name: &str, args: serde_json::Value) -> LLMResponse {
    LLMResponse {
        text: None,
        tool_calls: vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: args,
        }],
        stop_reason: StopReason::ToolUse,
        usage: Usage::default(),
        raw: serde_json::Value::Null,
    }
}

/// Flattened text of the most recent `user`-role message in the outbound
/// request, empty if none (used by scripts that branch on the latest
/// prompt rather than on turn count).
pub fn last_user_text(request: &LLMRequest<'_>) -> String {
    use llmproc_core::process::Role;
    request
        .messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.flatten_text())
        .unwrap_or_default()
}

/// Number of tool-result bundles appended so far -- a reliable per-process
/// turn counter to branch a script on ("first call", "second call", ...).
pub fn completed_tool_turns(request: &LLMRequest<'_>) -> usize {
    use llmproc_core::process::Role;
    request.messages.iter().filter(|m| m.role == Role::ToolResultBundle).count()
}

pub fn compile_program(dir: &Path, filename: &str, toml_text: &str) -> Arc<Program> {
    let path = dir.join(filename);
    std::fs::write(&path, toml_text).expect("write program source");
    Program::from_toml_file(&path).expect("program compiles")
}

/// Reimplements the non-provider-specific half of [`Program::start`] so
/// tests can inject a [`ScriptedProvider`] and an explicit linked-program
/// map instead of the real network transport `start()` would build.
pub async fn start_with_provider(
    program: &Arc<Program>,
    provider: Arc<dyn LLMProvider>,
    linked_programs: HashMap<String, LinkedProgram>,
) -> Process {
    let mut preloaded = HashMap::new();
    for rel_path in &program.preload_files {
        let path = program.base_dir.join(rel_path);
        if let Ok(content) = tokio::fs::read_to_string(&path).await {
            preloaded.insert(rel_path.display().to_string(), content);
        }
    }

    let mut fd_manager = program
        .fd_config
        .enabled
        .then(|| FileDescriptorManager::new(program.fd_config.default_page_size, program.fd_config.enable_references));
    if let Some(manager) = fd_manager.as_mut() {
        manager.register_fd_tool("read_fd");
        manager.register_fd_tool("fd_to_file");
    }

    let registry = Arc::new(
        builtin::build_registry(program, fd_manager.is_some())
            .await
            .expect("registry builds from a valid compiled program"),
    );
    let allow_fork = program.tool_config.builtin.iter().any(|t| t == "fork");
    let system_prompt = builtin::env_info::apply(&program.system_prompt, &program.env_info);

    Process::new(
        program.clone(),
        provider,
        registry,
        fd_manager,
        linked_programs,
        HashMap::new(),
        system_prompt,
        preloaded,
        allow_fork,
    )
}

/// Extracts the `fd:<n>` id out of a `<fd_result fd="fd:N" ...>` envelope
/// (spec §4.B auto-wrap).
pub fn extract_fd_id(envelope: &str) -> String {
    let start = envelope.find("fd=\"").expect("envelope carries fd attribute") + 4;
    let rest = &envelope[start..];
    let end = rest.find('"').expect("closing quote");
    rest[..end].to_string()
}
