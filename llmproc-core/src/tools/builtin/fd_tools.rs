//! `read_fd` and `fd_to_file`: context-aware built-ins delegating to
//! [`crate::fd::FileDescriptorManager`] (spec §4.E). Grounded on
//! `original_source/src/llmproc/tools/builtin/fd_tools.py`'s error
//! mapping: a missing `fd_manager` in the runtime context, an unknown fd,
//! and an out-of-range page/line/char each produce a distinct error kind.

use std::path::PathBuf;
use std::str::FromStr;

use serde_json::Value;

use crate::fd::{ReadMode, ReadOutcome, WriteMode};
use crate::tool_result::ToolResult;
use crate::tools::context::Capability;
use crate::tools::schema::{ToolHandler, ToolSchema};
use crate::tools::RuntimeContext;

pub fn read_fd_schema() -> ToolSchema {
    ToolSchema::new(
        "read_fd",
        "Reads a page, line range, or character range from a file descriptor created by an earlier oversized tool result.",
        serde_json::json!({
            "type": "object",
            "properties": {
                "fd": { "type": "string" },
                "mode": { "type": "string", "enum": ["page", "line", "char"], "default": "page" },
                "start": { "type": "integer", "minimum": 0, "default": 1 },
                "count": { "type": "integer", "minimum": 1, "default": 1 },
                "read_all": { "type": "boolean", "default": false },
                "extract_to_new_fd": { "type": "boolean", "default": false }
            },
            "required": ["fd"]
        }),
    )
}

pub fn read_fd_handler() -> ToolHandler {
    ToolHandler::context_aware(|args: Value, ctx: RuntimeContext| async move {
        if let Err(e) = ctx.context_has(&[Capability::FdManager]) {
            return ToolResult::from_error(format!("read_fd error: {e}"));
        }
        let Some(fd_id) = args.get("fd").and_then(Value::as_str) else {
            return ToolResult::from_error("read_fd error: missing required field 'fd'");
        };

        let mode = match ReadMode::from_str(args.get("mode").and_then(Value::as_str).unwrap_or("page")) {
            Ok(m) => m,
            Err(e) => return ToolResult::from_error(e.to_envelope(fd_id)),
        };
        let start = args.get("start").and_then(Value::as_u64).unwrap_or(1) as usize;
        let count = args.get("count").and_then(Value::as_u64).unwrap_or(1) as usize;
        let read_all = args.get("read_all").and_then(Value::as_bool).unwrap_or(false);
        let extract_to_new_fd = args.get("extract_to_new_fd").and_then(Value::as_bool).unwrap_or(false);

        let fd_manager = ctx.fd_manager.expect("checked by context_has above");
        let mut manager = fd_manager.lock().await;
        match manager.read_fd(fd_id, mode, start, count, read_all, extract_to_new_fd) {
            Ok(ReadOutcome::Content(content)) => ToolResult::from_success(content),
            Ok(ReadOutcome::NewFd { preview, .. }) => ToolResult::from_success(preview),
            Err(e) => ToolResult::from_error(e.to_envelope(fd_id)),
        }
    })
}

pub fn fd_to_file_schema() -> ToolSchema {
    ToolSchema::new(
        "fd_to_file",
        "Writes a file descriptor's full content to a file on disk.",
        serde_json::json!({
            "type": "object",
            "properties": {
                "fd": { "type": "string" },
                "path": { "type": "string" },
                "mode": { "type": "string", "enum": ["write", "append"], "default": "write" },
                "create": { "type": "boolean", "default": true },
                "exist_ok": { "type": "boolean", "default": false }
            },
            "required": ["fd", "path"]
        }),
    )
}

pub fn fd_to_file_handler() -> ToolHandler {
    ToolHandler::context_aware(|args: Value, ctx: RuntimeContext| async move {
        if let Err(e) = ctx.context_has(&[Capability::FdManager]) {
            return ToolResult::from_error(format!("fd_to_file error: {e}"));
        }
        let Some(fd_id) = args.get("fd").and_then(Value::as_str) else {
            return ToolResult::from_error("fd_to_file error: missing required field 'fd'");
        };
        let Some(path) = args.get("path").and_then(Value::as_str) else {
            return ToolResult::from_error("fd_to_file error: missing required field 'path'");
        };

        let mode = match WriteMode::from_str(args.get("mode").and_then(Value::as_str).unwrap_or("write")) {
            Ok(m) => m,
            Err(e) => return ToolResult::from_error(e.to_envelope(fd_id)),
        };
        let create = args.get("create").and_then(Value::as_bool).unwrap_or(true);
        let exist_ok = args.get("exist_ok").and_then(Value::as_bool).unwrap_or(false);

        let fd_manager = ctx.fd_manager.expect("checked by context_has above");
        let manager = fd_manager.lock().await;
        match manager.write_fd_to_file(fd_id, &PathBuf::from(path), mode, create, exist_ok).await {
            Ok(message) => ToolResult::from_success(message),
            Err(e) => ToolResult::from_error(e.to_envelope(fd_id)),
        }
    })
}
