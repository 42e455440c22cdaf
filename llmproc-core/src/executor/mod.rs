//! Provider Executor: the call -> tool -> call iteration loop every
//! [`crate::process::Process::run`] delegates to (spec §4.I).
//!
//! Shape is provider-independent -- per-vendor request/response details stay
//! behind [`crate::providers::LLMProvider`]; this module only knows the
//! neutral [`crate::providers::LLMRequest`]/[`crate::providers::LLMResponse`]
//! types and the registry/FD/fork machinery every program shares.

mod autowrap;
mod fork;

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::process::{Content, ContentBlock, Process, ProcessEvent, Role};
use crate::program::Program;
use crate::providers::LLMRequest;
use crate::tool_result::ToolResult;
use crate::tools::FORK_TOOL_NAME;

const DEFAULT_MAX_ITERATIONS: usize = 50;

/// Why a `run()` call stopped (spec §4.I). Distinct from a single provider
/// turn's own [`crate::providers::StopReason`] -- iteration exhaustion is
/// reported only here, never by a provider (SPEC_FULL.md resolves the
/// `MaxIterations`-isn't-an-error ambiguity this way).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStopReason {
    EndTurn,
    MaxIterations,
}

/// The outcome of one [`Process::run`] call.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub stop_reason: RunStopReason,
    text: Option<String>,
}

impl RunOutcome {
    /// The last non-empty assistant text seen during the run, or the empty
    /// string if none was produced (e.g. `max_iterations` reached on a turn
    /// that only issued tool calls).
    pub fn text(&self) -> String {
        self.text.clone().unwrap_or_default()
    }
}

pub(crate) async fn run_process(process: &mut Process, input: String, max_iterations: Option<usize>) -> Result<RunOutcome> {
    // Boundary 12 (spec §8): empty user input is rejected before any
    // provider call.
    if input.trim().is_empty() {
        return Err(Error::program_validation("user input must not be empty"));
    }

    let max_iterations = max_iterations.or(process.program.max_iterations).unwrap_or(DEFAULT_MAX_ITERATIONS);

    let input = autowrap::maybe_wrap_input(process, input).await;
    {
        let mut state = process.state.lock().await;
        state.append(Role::User, Content::Text(input));
    }

    let mut turn = 0usize;
    let mut last_text: Option<String> = None;

    loop {
        process.emit(ProcessEvent::TurnStart { turn });

        if turn >= max_iterations {
            process.emit(ProcessEvent::TurnEnd { turn });
            return Ok(RunOutcome {
                stop_reason: RunStopReason::MaxIterations,
                text: last_text,
            });
        }

        let response = call_provider(process).await?;
        {
            let mut state = process.state.lock().await;
            state.turn_count += 1;
        }
        process.emit(ProcessEvent::ApiResponse { usage: response.usage.clone() });

        if let Some(text) = response.text.as_ref().filter(|t| !t.is_empty()) {
            last_text = Some(text.clone());
            process.emit(ProcessEvent::Response { text: text.clone() });
        }

        if response.tool_calls.is_empty() {
            // Boundary 13 (spec §8): a response with neither tool uses nor
            // text is never appended -- it would poison the next request
            // with an empty assistant turn.
            if response.text.as_ref().is_some_and(|t| !t.is_empty()) {
                let mut state = process.state.lock().await;
                state.append(Role::Assistant, response.assistant_content_blocks());
            }
            process.emit(ProcessEvent::TurnEnd { turn });
            return Ok(RunOutcome {
                stop_reason: RunStopReason::EndTurn,
                text: last_text,
            });
        }

        // The assistant turn is appended only after dispatch (spec §4.I:
        // "append assistant message" follows DISPATCH), so that a `fork`
        // dispatched from this turn deep-copies a parent state that still
        // ends at the user turn -- `seed_child` is then the only source of
        // the (stripped) assistant(fork) + tool-result pair a child sees,
        // never a duplicate unstripped copy inherited from the parent log.
        let turn_content = response.assistant_content_blocks();

        let mut result_blocks = Vec::with_capacity(response.tool_calls.len());
        for call in &response.tool_calls {
            process.emit(ProcessEvent::ToolStart {
                name: call.name.clone(),
                args: call.arguments.clone(),
            });

            // `fork` fans out into parallel child processes rather than a
            // single registry dispatch (spec §4.E); every other tool goes
            // through the ordinary registry path.
            let result = if call.name == FORK_TOOL_NAME {
                let prompts = string_array(&call.arguments, "prompts");
                fork::run_fork(process, &turn_content, &call.id, &prompts).await
            } else {
                dispatch_tool(process, &call.name, call.arguments.clone()).await
            };

            process.emit(ProcessEvent::ToolEnd {
                name: call.name.clone(),
                result: result.clone(),
            });

            let result = autowrap::maybe_wrap_result(process, &call.name, result).await;
            result_blocks.push(ContentBlock::ToolResult {
                tool_use_id: call.id.clone(),
                content: result.content,
                is_error: result.is_error,
            });
        }

        {
            let mut state = process.state.lock().await;
            state.append(Role::Assistant, turn_content);
            state.append(Role::ToolResultBundle, Content::Blocks(result_blocks));
        }

        process.emit(ProcessEvent::TurnEnd { turn });
        turn += 1;
    }
}

fn string_array(args: &Value, key: &str) -> Vec<String> {
    args.get(key)
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

/// Dispatches one non-`fork` tool call through the registry. A registry
/// error (unknown tool name, a context-aware handler missing a required
/// runtime-context capability) becomes a local tool error rather than a
/// fatal run error -- the model can see it and try something else (spec §7
/// recovery policy: tool errors are local).
async fn dispatch_tool(process: &Process, name: &str, args: Value) -> ToolResult {
    let ctx = process.runtime_context();
    tokio::select! {
        biased;
        _ = process.cancellation.cancelled() => ToolResult::from_error("run cancelled"),
        result = process.registry.call_tool(name, args, ctx) => match result {
            Ok(result) => result,
            Err(e) => ToolResult::from_error(e.to_string()),
        },
    }
}

async fn call_provider(process: &Process) -> Result<crate::providers::LLMResponse> {
    let messages = {
        let state = process.state.lock().await;
        state.messages.clone()
    };
    let tools = process.registry.schemas();
    let (parameters, mut extra_headers) = split_parameters(&process.program);
    if process.program.token_efficient_tools {
        if let Some((name, value)) = process.provider.token_efficient_header() {
            extra_headers.entry(name.to_string()).or_insert_with(|| value.to_string());
        }
    }

    let request = LLMRequest {
        model_id: &process.program.model_id,
        system_prompt: process.enriched_system_prompt(),
        messages: &messages,
        tools: &tools,
        parameters: &parameters,
        extra_headers: &extra_headers,
        automatic_caching: !process.program.disable_automatic_caching,
    };

    tokio::select! {
        biased;
        _ = process.cancellation.cancelled() => Err(Error::Cancelled),
        response = process.provider.generate(request) => response,
    }
}

/// Splits `[parameters] extra_headers` out of the pass-through API
/// parameters so it reaches the provider as actual HTTP headers rather than
/// leaking into the request body as a stray JSON field (spec §6
/// `[parameters]`).
fn split_parameters(program: &Program) -> (Value, HashMap<String, String>) {
    let mut parameters = program.parameters.clone();
    let mut headers = HashMap::new();
    if let Value::Object(map) = &mut parameters {
        if let Some(Value::Object(header_obj)) = map.remove("extra_headers") {
            for (key, value) in header_obj {
                if let Some(s) = value.as_str() {
                    headers.insert(key, s.to_string());
                }
            }
        }
    }
    (parameters, headers)
}
