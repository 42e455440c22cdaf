//! Typed error kinds the engine must distinguish and propagate (spec §7).
//!
//! Tool errors never reach this type — a handler returning `is_error=true`
//! is surfaced into the message log as a tool-result block so the model may
//! recover (see [`crate::tool_result::ToolResult`]). Everything here is
//! fatal to the caller: validation, missing files, an unknown tool name, a
//! provider transport failure, or an unsupported capability combination.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("program validation failed: {0}")]
    ProgramValidation(String),

    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("tool not found: {name} (available: {available})")]
    ToolNotFound { name: String, available: String },

    #[error("provider error: {0}")]
    Provider(String),

    #[error("capability error: {0}")]
    Capability(String),

    #[error("run cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl Error {
    pub fn program_validation(message: impl Into<String>) -> Self {
        Self::ProgramValidation(message.into())
    }

    pub fn capability(message: impl Into<String>) -> Self {
        Self::Capability(message.into())
    }
}
