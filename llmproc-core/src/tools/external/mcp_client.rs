//! An `rmcp`-backed [`ExternalToolConnector`] over a stdio child process
//! (spec §4.F). Grounded on `vtcode-core/src/mcp/rmcp_client.rs`'s
//! connect/list/call shape, simplified to a single stdio transport and the
//! default unit client handler — this runtime needs neither elicitation
//! nor HTTP transports the teacher supports for its own agent use case.

use std::collections::HashMap;

use async_trait::async_trait;
use rmcp::model::CallToolRequestParam;
use rmcp::transport::TokioChildProcess;
use rmcp::{RoleClient, RunningService, ServiceExt};
use serde_json::Value;
use tokio::process::Command;

use crate::error::Error;
use crate::tools::schema::ToolSchema;

use super::connector::ExternalToolConnector;

pub struct McpStdioConnector {
    server_name: String,
    command: String,
    args: Vec<String>,
    env: HashMap<String, String>,
    service: Option<RunningService<RoleClient, ()>>,
}

impl McpStdioConnector {
    pub fn new(server_name: String, command: String, args: Vec<String>, env: HashMap<String, String>) -> Self {
        Self {
            server_name,
            command,
            args,
            env,
            service: None,
        }
    }

    fn service(&self) -> Result<&RunningService<RoleClient, ()>, Error> {
        self.service
            .as_ref()
            .ok_or_else(|| Error::Provider(format!("MCP server '{}' is not initialized", self.server_name)))
    }
}

#[async_trait]
impl ExternalToolConnector for McpStdioConnector {
    fn namespace(&self) -> &str {
        &self.server_name
    }

    async fn initialize(&mut self) -> Result<(), Error> {
        let mut command = Command::new(&self.command);
        command.args(&self.args);
        for (key, value) in &self.env {
            command.env(key, value);
        }

        let transport = TokioChildProcess::new(command)
            .map_err(|e| Error::Provider(format!("failed to spawn MCP server '{}': {e}", self.server_name)))?;

        let service = ()
            .serve(transport)
            .await
            .map_err(|e| Error::Provider(format!("failed to initialize MCP server '{}': {e}", self.server_name)))?;

        self.service = Some(service);
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<ToolSchema>, Error> {
        let service = self.service()?;
        let result = service
            .list_all_tools()
            .await
            .map_err(|e| Error::Provider(format!("MCP tools/list failed for '{}': {e}", self.server_name)))?;

        Ok(result
            .into_iter()
            .map(|tool| {
                ToolSchema::new(
                    format!("{}__{}", self.server_name, tool.name),
                    tool.description.unwrap_or_default().to_string(),
                    Value::Object((*tool.input_schema).clone()),
                )
            })
            .collect())
    }

    async fn call(&self, tool_name: &str, arguments: Value) -> Result<String, Error> {
        let service = self.service()?;
        let bare_name = tool_name
            .strip_prefix(&format!("{}__", self.server_name))
            .unwrap_or(tool_name);

        let arguments = match arguments {
            Value::Object(map) => Some(map),
            _ => None,
        };

        let result = service
            .call_tool(CallToolRequestParam {
                name: bare_name.to_string().into(),
                arguments,
            })
            .await
            .map_err(|e| Error::Provider(format!("MCP tools/call failed for '{tool_name}': {e}")))?;

        Ok(result
            .content
            .into_iter()
            .filter_map(|block| block.as_text().map(|t| t.text.clone()))
            .collect::<Vec<_>>()
            .join(""))
    }
}
