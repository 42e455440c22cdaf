//! External-Tool Connector: imports MCP server tools into a
//! [`ToolRegistry`] under `<server>__<tool>` names (spec §4.F).

pub mod connector;
pub mod mcp_client;

pub use connector::ExternalToolConnector;
pub use mcp_client::McpStdioConnector;

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::program::source::{McpSection, McpToolSelection};
use crate::tool_result::ToolResult;
use crate::tools::schema::{ToolHandler, ToolSchema};
use crate::tools::ToolRegistry;

/// Connects every server in `[mcp.servers]`, lists its tools, and registers
/// the ones selected by `[mcp.tools]` (an explicit list, or `"all"`) under
/// `<server>__<tool>` names (spec §4.F).
pub async fn register_mcp_tools(registry: &mut ToolRegistry, mcp: &McpSection) -> Result<()> {
    for (server_name, spec) in &mcp.servers {
        let mut connector = McpStdioConnector::new(
            server_name.clone(),
            spec.command.clone(),
            spec.args.clone(),
            spec.env.clone(),
        );
        connector
            .initialize()
            .await
            .map_err(|e| crate::error::Error::Provider(format!("mcp server '{server_name}': {e}")))?;

        let available = connector.list_tools().await?;
        let selection = mcp.tools.get(server_name);
        let connector = Arc::new(Mutex::new(connector));

        for schema in available {
            let bare_name = schema
                .name
                .strip_prefix(&format!("{server_name}__"))
                .unwrap_or(&schema.name)
                .to_string();

            let included = match selection {
                None => false,
                Some(McpToolSelection::All(marker)) => marker == "all",
                Some(McpToolSelection::Named(names)) => names.iter().any(|n| n == &bare_name),
            };
            if !included {
                continue;
            }

            let full_name = schema.name.clone();
            let connector = connector.clone();
            let handler = ToolHandler::context_free(move |args: Value| {
                let connector = connector.clone();
                let full_name = full_name.clone();
                async move {
                    let connector = connector.lock().await;
                    match connector.call(&full_name, args).await {
                        Ok(content) => ToolResult::from_success(content),
                        Err(e) => ToolResult::from_error(format!("mcp tool error: {e}")),
                    }
                }
            });

            registry.register_tool(schema.name.clone(), handler, schema);
        }
    }

    Ok(())
}
