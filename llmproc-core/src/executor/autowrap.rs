//! Auto-wrap rule (spec §4.B): an oversized non-FD-related tool result, or
//! oversized user input when `page_user_input` is enabled, is paged
//! through a newly created file descriptor instead of inlined verbatim.

use crate::process::Process;
use crate::tool_result::ToolResult;
use crate::tools::FORK_TOOL_NAME;

/// Wraps `input` into a new FD and substitutes its creation envelope when
/// `[file_descriptor] page_user_input` is set and `input` exceeds
/// `max_input_chars` (spec §4.B).
pub(super) async fn maybe_wrap_input(process: &Process, input: String) -> String {
    let fd_config = &process.program.fd_config;
    if !fd_config.enabled || !fd_config.page_user_input || input.len() <= fd_config.max_input_chars {
        return input;
    }
    let Some(fd_manager) = &process.fd_manager else {
        return input;
    };
    let mut manager = fd_manager.lock().await;
    let fd_id = manager.create_fd(input, "user_input");
    manager.creation_envelope(&fd_id).unwrap_or_default()
}

/// Wraps a tool's raw result into a new FD when the tool is not itself
/// FD-related (or `fork`, whose result is a structured JSON array, not
/// prose) and the content exceeds `max_direct_output_chars` (spec §4.B
/// "Auto-wrap rule", §8 invariant 4).
pub(super) async fn maybe_wrap_result(process: &Process, tool_name: &str, result: ToolResult) -> ToolResult {
    if result.is_error {
        return result;
    }
    let fd_config = &process.program.fd_config;
    if !fd_config.enabled || result.len() <= fd_config.max_direct_output_chars {
        return result;
    }
    let Some(fd_manager) = &process.fd_manager else {
        return result;
    };
    let mut manager = fd_manager.lock().await;
    if tool_name == FORK_TOOL_NAME || manager.is_fd_tool(tool_name) {
        return result;
    }
    let fd_id = manager.create_fd(result.content, tool_name);
    match manager.creation_envelope(&fd_id) {
        Ok(envelope) => ToolResult::from_success(envelope),
        Err(e) => ToolResult::from_error(format!("fd_result: failed to wrap oversized output: {e}")),
    }
}
