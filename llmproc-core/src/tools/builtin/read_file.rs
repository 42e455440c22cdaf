//! `read_file`: a context-free, unsandboxed file read (spec §4.E). No
//! runtime-context dependency, so it needs no path-jail relative to a
//! process's working directory — the operator's program file controls
//! what model requests reach the filesystem at all.

use serde_json::Value;

use crate::tool_result::ToolResult;
use crate::tools::schema::{ToolHandler, ToolSchema};

pub fn schema() -> ToolSchema {
    ToolSchema::new(
        "read_file",
        "Reads the full contents of a text file at the given path.",
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": { "type": "string" }
            },
            "required": ["path"]
        }),
    )
}

pub fn handler() -> ToolHandler {
    ToolHandler::context_free(|args: Value| async move {
        let Some(path) = args.get("path").and_then(Value::as_str) else {
            return ToolResult::from_error("read_file error: missing required field 'path'");
        };
        match tokio::fs::read_to_string(path).await {
            Ok(content) => ToolResult::from_success(content),
            Err(e) => ToolResult::from_error(format!("read_file error: could not read '{path}': {e}")),
        }
    })
}
