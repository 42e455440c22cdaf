//! `fork` (spec §4.E, §8 scenario S3): intercepted by the executor and never
//! dispatched through the tool registry, since it must spawn and run
//! several independent child [`Process`]es rather than call a single
//! handler.

use futures::future::join_all;
use serde_json::{json, Value};

use crate::process::{Content, ContentBlock, Process, Role};
use crate::tool_result::ToolResult;

const TERMINATOR_PROMPT: &str = "Stop calling tools and summarize your findings so far in plain text.";
const EXHAUSTION_MESSAGE: &str = "(this branch exhausted its iteration budget without producing a text response)";

/// Runs `fork(prompts)`: deep-copies the process once per prompt, seeds
/// each copy with the forking turn's content (stripped of sibling tool
/// uses) and a canned tool-result for the fork call itself, then runs every
/// branch in parallel until it produces a text response. Returns a JSON
/// array of `{id, message}` in prompt order as the parent's tool-result
/// content for the fork call (spec §4.E).
pub(super) async fn run_fork(process: &Process, turn_content: &Content, call_id: &str, prompts: &[String]) -> ToolResult {
    if !process.allow_fork {
        return ToolResult::from_error("fork error: forking is not permitted inside a forked child process");
    }
    if prompts.is_empty() {
        return ToolResult::from_error("fork error: 'prompts' must contain at least one entry");
    }

    let forked_content = strip_sibling_tool_uses(turn_content, call_id);

    let branches = prompts.iter().map(|prompt| {
        let forked_content = forked_content.clone();
        let prompt = prompt.clone();
        async move {
            let mut child = process.fork_process().await;
            seed_child(&mut child, forked_content, call_id).await;
            run_branch(&mut child, prompt).await
        }
    });

    let responses = join_all(branches).await;

    ToolResult::from_success_json(&Value::Array(
        responses
            .into_iter()
            .enumerate()
            .map(|(id, message)| json!({ "id": id, "message": message }))
            .collect(),
    ))
}

/// Keeps every `Text` block and only the fork call's own `ToolUse` block,
/// dropping any sibling tool use the same turn issued (spec §4.E: "all
/// sibling tool_use blocks removed except the fork call").
fn strip_sibling_tool_uses(turn_content: &Content, call_id: &str) -> Content {
    match turn_content {
        Content::Text(text) => Content::Text(text.clone()),
        Content::Blocks(blocks) => Content::Blocks(
            blocks
                .iter()
                .filter(|block| match block {
                    ContentBlock::ToolUse { id, .. } => id == call_id,
                    _ => true,
                })
                .cloned()
                .collect(),
        ),
    }
}

async fn seed_child(child: &mut Process, forked_content: Content, call_id: &str) {
    let mut state = child.state.lock().await;
    state.append(Role::Assistant, forked_content);
    state.append(
        Role::ToolResultBundle,
        Content::Blocks(vec![ContentBlock::ToolResult {
            tool_use_id: call_id.to_string(),
            content: "forked: continuing as an independent branch".to_string(),
            is_error: false,
        }]),
    );
}

/// Runs one forked branch to its first text response. `child.run` recurses
/// back into [`super::run_process`]; boxing this call keeps the mutually
/// recursive future's size finite (the branch itself can never reach this
/// path again, since `fork_process` sets `allow_fork = false`).
async fn run_branch(child: &mut Process, prompt: String) -> String {
    let outcome = match Box::pin(child.run(prompt, None)).await {
        Ok(outcome) => outcome,
        Err(e) => return format!("(branch error: {e})"),
    };
    if !outcome.text().is_empty() {
        return outcome.text();
    }

    match Box::pin(child.run(TERMINATOR_PROMPT.to_string(), Some(1))).await {
        Ok(outcome) if !outcome.text().is_empty() => outcome.text(),
        _ => EXHAUSTION_MESSAGE.to_string(),
    }
}
