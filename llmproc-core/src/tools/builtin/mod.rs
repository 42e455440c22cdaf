//! Built-in tools (spec §4.E): `calculator`, `read_file`, `read_fd`,
//! `fd_to_file`, `spawn`, `goto`. `fork` is deliberately schema-only here —
//! the executor intercepts it by name before it ever reaches
//! [`crate::tools::ToolRegistry::call_tool`] (spec §4.E, §4.I).

pub mod calculator;
pub mod env_info;
pub mod fd_tools;
pub mod goto;
pub mod read_file;
pub mod spawn;

use serde_json::Value;

use crate::error::Result;
use crate::program::Program;
use crate::tool_result::ToolResult;
use crate::tools::registry::FORK_TOOL_NAME;
use crate::tools::schema::{ToolHandler, ToolSchema};
use crate::tools::ToolRegistry;

pub const BUILTIN_TOOL_NAMES: &[&str] = &[
    "calculator",
    "read_file",
    "read_fd",
    "fd_to_file",
    "spawn",
    "goto",
    FORK_TOOL_NAME,
];

fn fork_schema() -> ToolSchema {
    ToolSchema::new(
        FORK_TOOL_NAME,
        "Forks the current process, running one or more prompts as independent continuations in parallel \
         and returning each branch's final response.",
        serde_json::json!({
            "type": "object",
            "properties": {
                "prompts": {
                    "type": "array",
                    "items": { "type": "string" },
                    "minItems": 1
                }
            },
            "required": ["prompts"]
        }),
    )
}

fn fork_placeholder_handler() -> ToolHandler {
    ToolHandler::context_free(|_args: Value| async {
        ToolResult::from_error(
            "fork error: fork must be dispatched by the executor, not the tool registry; this indicates an \
             executor bug if it is ever reached",
        )
    })
}

/// Builds the populated registry for a starting [`Process`](crate::process::Process):
/// every builtin the program's `[tools]` section requests, with alias
/// rewriting applied afterwards (spec §4.C, §4.G).
pub async fn build_registry(program: &Program, fd_enabled: bool) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();

    for name in &program.tool_config.builtin {
        match name.as_str() {
            "calculator" => registry.register_tool("calculator", calculator::handler(), calculator::schema()),
            "read_file" => registry.register_tool("read_file", read_file::handler(), read_file::schema()),
            "read_fd" => {
                registry.register_tool("read_fd", fd_tools::read_fd_handler(), fd_tools::read_fd_schema())
            }
            "fd_to_file" => registry.register_tool(
                "fd_to_file",
                fd_tools::fd_to_file_handler(),
                fd_tools::fd_to_file_schema(),
            ),
            "spawn" => registry.register_tool("spawn", spawn::handler(), spawn::schema()),
            "goto" => registry.register_tool("goto", goto::handler(), goto::schema()),
            FORK_TOOL_NAME => registry.register_tool(FORK_TOOL_NAME, fork_placeholder_handler(), fork_schema()),
            other => {
                return Err(crate::error::Error::program_validation(format!(
                    "unknown builtin tool: {other}"
                )))
            }
        }
    }

    let _ = fd_enabled; // FD tool <-> fd_enabled invariant already checked in Program::validate.

    if let Some(mcp) = &program.mcp {
        crate::tools::external::register_mcp_tools(&mut registry, mcp).await?;
    }

    for (alias, target) in &program.tool_config.aliases {
        registry.register_alias(alias.clone(), target.clone());
    }

    Ok(registry)
}
