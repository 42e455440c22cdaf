//! Runtime Context: the typed dependency bundle injected into context-aware
//! tool handlers (spec §3, §4.D).
//!
//! Ephemeral — constructed per tool invocation from the owning
//! [`crate::process::Process`]. Handlers declared context-free never see it;
//! only handlers declared context-aware receive it (§4.D).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::Error;
use crate::fd::FileDescriptorManager;
use crate::process::{LinkedProgram, ProcessState};
use crate::program::Program;

/// Capability a context-aware handler declares it needs, validated at call
/// time by [`RuntimeContext::context_has`] (spec §4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Process,
    FdManager,
    LinkedPrograms,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Capability::Process => "process",
            Capability::FdManager => "fd_manager",
            Capability::LinkedPrograms => "linked_programs",
        };
        write!(f, "{s}")
    }
}

/// `{ process, fd_manager, linked_programs, linked_program_descriptions }`
/// (spec §3). `process` and `linked_programs` are shared, lock-guarded
/// handles rather than owned values so a handler can mutate the owning
/// process's message log (`goto`) or cache a spawned child (`spawn`)
/// without the borrow-checker fighting the fact that the registry calling
/// the handler is itself owned by that process.
#[derive(Clone)]
pub struct RuntimeContext {
    pub process: Arc<Mutex<ProcessState>>,
    pub fd_manager: Option<Arc<Mutex<FileDescriptorManager>>>,
    pub linked_programs: Arc<Mutex<HashMap<String, LinkedProgram>>>,
    pub linked_program_descriptions: Arc<HashMap<String, Option<String>>>,
    pub program: Arc<Program>,
    pub allow_fork: bool,
}

impl RuntimeContext {
    /// Returns a structured error naming every missing required capability,
    /// rather than failing on the first (spec §4.D).
    pub fn context_has(&self, required: &[Capability]) -> Result<(), Error> {
        let missing: Vec<String> = required
            .iter()
            .filter(|cap| {
                !match cap {
                    Capability::Process => true,
                    Capability::FdManager => self.fd_manager.is_some(),
                    Capability::LinkedPrograms => true,
                }
            })
            .map(|cap| cap.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::capability(format!(
                "tool requires runtime context field(s) not available on this process: {}",
                missing.join(", ")
            )))
        }
    }
}
