//! # llmproc-core
//!
//! Core runtime for LLM-backed processes: long-running conversations that
//! call tools, spawn sub-processes from linked program definitions, fork
//! themselves to explore several continuations in parallel, page oversized
//! tool output through file-descriptor handles, and rewind conversation
//! state to an earlier point.
//!
//! ## Architecture
//!
//! - [`program`]: declarative, compiled configuration (model, prompt, tools,
//!   linked programs).
//! - [`process`]: live state for a running [`program::Program`] — message
//!   log, file-descriptor table, populated tool registry.
//! - [`tool_result`]: the uniform success/error envelope every tool returns.
//! - [`fd`]: the file-descriptor manager that pages large content.
//! - [`tools`]: the tool registry, runtime context, and built-in tools.
//! - [`providers`]: the provider-agnostic request/response types and the
//!   concrete Anthropic/OpenAI transports.
//! - [`executor`]: the per-provider call→tool→call iteration loop.
//!
//! ## Quickstart
//!
//! ```rust,ignore
//! use llmproc_core::program::Program;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let program = Program::from_toml_file("agent.toml")?;
//!     let mut process = program.start().await?;
//!     let outcome = process.run("hello".to_string(), None).await?;
//!     println!("{}", outcome.text());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod executor;
pub mod fd;
pub mod process;
pub mod program;
pub mod providers;
pub mod tool_result;
pub mod tools;

pub use error::{Error, Result};
