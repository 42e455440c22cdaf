//! The External-Tool Connector abstraction (spec §4.F): a trait any
//! external tool provider implements, so the registry only ever depends on
//! `initialize`/`list_tools`/`call`, not a specific transport.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Error;
use crate::tools::schema::ToolSchema;

#[async_trait]
pub trait ExternalToolConnector: Send + Sync {
    /// Namespace prefix used for every tool this connector exposes, e.g.
    /// `"<server>"` for `<server>__<tool>` naming (spec §4.F).
    fn namespace(&self) -> &str;

    async fn initialize(&mut self) -> Result<(), Error>;

    async fn list_tools(&self) -> Result<Vec<ToolSchema>, Error>;

    async fn call(&self, tool_name: &str, arguments: Value) -> Result<String, Error>;
}
