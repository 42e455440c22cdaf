//! `spawn`: context-aware dispatch into the linked-program graph (spec
//! §4.E, §4.F). Grounded on `original_source/src/llmproc/tools/spawn.py`'s
//! shape (look up a linked program by name, optionally hand it extra
//! preload files, run it to completion, return its final message) adapted
//! to cache the started child so repeat calls reuse its conversation
//! state instead of re-running preload (SPEC_FULL.md resolved ambiguity).

use serde_json::Value;

use crate::error::Error;
use crate::process::LinkedProgram;
use crate::tool_result::ToolResult;
use crate::tools::context::Capability;
use crate::tools::schema::{ToolHandler, ToolSchema};
use crate::tools::RuntimeContext;

pub fn schema() -> ToolSchema {
    ToolSchema::new(
        "spawn",
        "Runs a prompt against a named linked program and returns its final response. \
         Repeated calls with the same program name resume that program's own conversation.",
        serde_json::json!({
            "type": "object",
            "properties": {
                "program": { "type": "string", "description": "name from [linked_programs]" },
                "query": { "type": "string" },
                "additional_preload_files": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "extra files to preload into the child; ignored for any path already declared in the child program's own [preload]"
                },
                "additional_preload_fds": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "fd ids from this process to copy into the child's FD manager before running"
                }
            },
            "required": ["program", "query"]
        }),
    )
}

pub fn handler() -> ToolHandler {
    ToolHandler::context_aware(|args: Value, ctx: RuntimeContext| async move {
        if let Err(e) = ctx.context_has(&[Capability::LinkedPrograms]) {
            return ToolResult::from_error(format!("spawn error: {e}"));
        }
        let Some(name) = args.get("program").and_then(Value::as_str) else {
            return ToolResult::from_error("spawn error: missing required field 'program'");
        };
        let Some(query) = args.get("query").and_then(Value::as_str) else {
            return ToolResult::from_error("spawn error: missing required field 'query'");
        };
        let extra_files: Vec<String> = string_array(&args, "additional_preload_files");
        let extra_fds: Vec<String> = string_array(&args, "additional_preload_fds");

        match run_spawn(name, query, &extra_files, &extra_fds, &ctx).await {
            Ok(response) => ToolResult::from_success_json(&serde_json::json!({
                "program": name,
                "query": query,
                "response": response,
            })),
            Err(e) => ToolResult::from_error(format!("spawn error: {e}")),
        }
    })
}

fn string_array(args: &Value, key: &str) -> Vec<String> {
    args.get(key)
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

async fn run_spawn(
    name: &str,
    query: &str,
    extra_files: &[String],
    extra_fds: &[String],
    ctx: &RuntimeContext,
) -> Result<String, Error> {
    let mut linked = ctx.linked_programs.lock().await;
    let slot = linked
        .remove(name)
        .ok_or_else(|| Error::program_validation(format!("no linked program named '{name}'")))?;

    let mut process = match slot {
        LinkedProgram::Started(process) => *process,
        LinkedProgram::Uninstantiated(program) => {
            let mut process = program.start().await?;
            for path in extra_files {
                if program.preload_files.iter().any(|p| p.to_string_lossy() == *path) {
                    continue;
                }
                if let Ok(content) = tokio::fs::read_to_string(program.base_dir.join(path)).await {
                    process.add_preloaded_file(path.clone(), content);
                }
            }
            process
        }
    };

    if !extra_fds.is_empty() {
        if let (Some(parent_fds), Some(child_fds)) = (&ctx.fd_manager, &process.fd_manager) {
            let parent = parent_fds.lock().await;
            let mut child = child_fds.lock().await;
            for fd_id in extra_fds {
                if let Ok(fd) = parent.get(fd_id) {
                    child.import_fd(fd_id, fd.content.clone(), "spawn:additional_preload_fds");
                }
            }
        }
    }

    let outcome = process.run(query.to_string(), None).await?;
    linked.insert(name.to_string(), LinkedProgram::Started(Box::new(process)));
    Ok(outcome.text())
}
