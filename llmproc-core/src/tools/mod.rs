//! Tool registry, runtime context, and built-in/external tool
//! implementations (spec §4.C, §4.D, §4.E, §4.F).

pub mod builtin;
pub mod context;
pub mod external;
pub mod registry;
pub mod schema;

pub use context::{Capability, RuntimeContext};
pub use registry::{ToolRegistry, FORK_TOOL_NAME};
pub use schema::{ToolArgs, ToolFuture, ToolHandler, ToolSchema};
