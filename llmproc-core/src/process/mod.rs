//! The mutable conversational process (spec §3 "Process", §4.H).

pub mod message;

pub use message::{message_id, parse_message_id, Content, ContentBlock, Message, Role};

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::fd::FileDescriptorManager;
use crate::program::Program;
use crate::providers::{LLMProvider, Usage};
use crate::tool_result::ToolResult;
use crate::tools::{RuntimeContext, ToolRegistry};

/// A `goto` truncation recorded for the time-travel history (spec §4.E).
#[derive(Debug, Clone)]
pub struct TruncationEvent {
    pub target_message_id: String,
    pub truncated_message_count: usize,
}

/// The mutable, append-only-until-`goto` conversation log, isolated from
/// the process's immutable configuration so it can be shared behind an
/// `Arc<Mutex<_>>` with context-aware tool handlers (`goto` in particular
/// needs to mutate it from inside a call the owning [`Process`] itself
/// dispatched).
#[derive(Debug, Clone, Default)]
pub struct ProcessState {
    pub messages: Vec<Message>,
    pub history: Vec<TruncationEvent>,
    pub turn_count: usize,
}

impl ProcessState {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Appends a message, assigning it the next `msg_<n>` id, and returns
    /// that id.
    pub fn append(&mut self, role: Role, content: impl Into<Content>) -> String {
        let id = message_id(self.messages.len());
        self.messages.push(Message {
            role,
            content: content.into(),
            id: id.clone(),
        });
        id
    }

    /// Flattened text of the most recent message, or `None` if the log is
    /// empty (spec §4.H).
    pub fn get_last_message(&self) -> Option<String> {
        self.messages.last().map(|m| m.content.flatten_text())
    }

    /// Truncates the log to end just after `target_id` (inclusive),
    /// recording how many messages were dropped (spec §4.E `goto`).
    pub fn truncate_after(&mut self, target_index: usize, target_id: String) -> usize {
        let dropped = self.messages.len().saturating_sub(target_index + 1);
        self.messages.truncate(target_index + 1);
        self.history.push(TruncationEvent {
            target_message_id: target_id,
            truncated_message_count: dropped,
        });
        dropped
    }
}

/// A linked program slot in the spawn/fork graph: either not yet
/// instantiated, or already running and cached for reuse (spec §4.F;
/// SPEC_FULL.md resolves the open question on spawn reuse in favor of
/// caching the running child rather than re-running preload every call).
pub enum LinkedProgram {
    Uninstantiated(Arc<Program>),
    Started(Box<Process>),
}

impl LinkedProgram {
    pub fn program(&self) -> Arc<Program> {
        match self {
            LinkedProgram::Uninstantiated(p) => p.clone(),
            LinkedProgram::Started(process) => process.program.clone(),
        }
    }
}

/// Events callbacks observe (spec §4.I: `tool_start`, `tool_end`,
/// `response`, `api_response`, `turn_start`, `turn_end`).
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    TurnStart { turn: usize },
    TurnEnd { turn: usize },
    ApiResponse { usage: Usage },
    Response { text: String },
    ToolStart { name: String, args: serde_json::Value },
    ToolEnd { name: String, result: ToolResult },
}

pub type Callback = Arc<dyn Fn(&ProcessEvent) + Send + Sync>;

/// A running instance of a [`Program`] (spec §3).
pub struct Process {
    pub program: Arc<Program>,
    pub state: Arc<Mutex<ProcessState>>,
    pub fd_manager: Option<Arc<Mutex<FileDescriptorManager>>>,
    pub registry: Arc<ToolRegistry>,
    pub linked_programs: Arc<Mutex<HashMap<String, LinkedProgram>>>,
    pub linked_program_descriptions: Arc<HashMap<String, Option<String>>>,
    pub provider: Arc<dyn LLMProvider>,
    pub callbacks: Vec<Callback>,
    /// Whether this process may dispatch `fork` (spec §4.E: a forked
    /// child does not itself allow further forking).
    pub allow_fork: bool,
    /// Propagates into the in-flight provider request and any pending tool
    /// call (spec §5 "Cancellation & timeouts"). Forked/spawned children
    /// get a [`CancellationToken::child_token`] so cancelling the parent
    /// cancels every descendant without a child's own cancellation
    /// reaching back up.
    pub cancellation: CancellationToken,
    base_system_prompt: String,
    preloaded: HashMap<String, String>,
    enriched_system_prompt: String,
}

impl Process {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        program: Arc<Program>,
        provider: Arc<dyn LLMProvider>,
        registry: Arc<ToolRegistry>,
        fd_manager: Option<FileDescriptorManager>,
        linked_programs: HashMap<String, LinkedProgram>,
        linked_program_descriptions: HashMap<String, Option<String>>,
        base_system_prompt: String,
        preloaded: HashMap<String, String>,
        allow_fork: bool,
    ) -> Self {
        let enriched_system_prompt = compute_enriched_prompt(&base_system_prompt, &preloaded, true);
        Self {
            program,
            state: Arc::new(Mutex::new(ProcessState::empty())),
            fd_manager: fd_manager.map(|m| Arc::new(Mutex::new(m))),
            registry,
            linked_programs: Arc::new(Mutex::new(linked_programs)),
            linked_program_descriptions: Arc::new(linked_program_descriptions),
            provider,
            callbacks: Vec::new(),
            allow_fork,
            cancellation: CancellationToken::new(),
            base_system_prompt,
            preloaded,
            enriched_system_prompt,
        }
    }

    pub fn enriched_system_prompt(&self) -> &str {
        &self.enriched_system_prompt
    }

    /// Requests cancellation of any in-flight provider request or tool
    /// call on this process and every descendant it has spawned or forked
    /// (spec §5).
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Adds an extra preloaded file (spawn's `additional_preload_files`,
    /// spec §4.F) and recomputes the enriched system prompt. A path
    /// already present is left untouched — the program's own declared
    /// preload always wins over a caller-supplied override.
    pub fn add_preloaded_file(&mut self, path: String, content: String) {
        self.preloaded.entry(path).or_insert(content);
        self.enriched_system_prompt = compute_enriched_prompt(&self.base_system_prompt, &self.preloaded, true);
    }

    pub fn on_event(&mut self, callback: Callback) {
        self.callbacks.push(callback);
    }

    pub(crate) fn emit(&self, event: ProcessEvent) {
        for cb in &self.callbacks {
            cb(&event);
        }
    }

    /// A snapshot of this process's runtime context, assembled fresh for
    /// each tool dispatch (spec §3, §4.D).
    pub fn runtime_context(&self) -> RuntimeContext {
        RuntimeContext {
            process: self.state.clone(),
            fd_manager: self.fd_manager.clone(),
            linked_programs: self.linked_programs.clone(),
            linked_program_descriptions: self.linked_program_descriptions.clone(),
            program: self.program.clone(),
            allow_fork: self.allow_fork,
        }
    }

    /// Runs the call -> tool -> call loop against `input` until the
    /// provider stops for a non-tool-use reason or `max_iterations` is
    /// exhausted (spec §4.I). Delegates the iteration state machine to the
    /// executor so `Process` stays a data owner, not a control-flow engine.
    pub async fn run(
        &mut self,
        input: impl Into<String>,
        max_iterations: Option<usize>,
    ) -> Result<crate::executor::RunOutcome> {
        crate::executor::run_process(self, input.into(), max_iterations).await
    }

    pub async fn get_last_message(&self) -> Option<String> {
        self.state.lock().await.get_last_message()
    }

    /// Deep-copies this process for `fork` (spec §4.E). The message log,
    /// turn counter, and FD manager are independent copies; any linked
    /// program that is already `Started` is reset back to `Uninstantiated`
    /// so the forked branches cannot observe or mutate each other's
    /// spawned children through a shared cache.
    pub async fn fork_process(&self) -> Process {
        let state = self.state.lock().await.clone();
        let fd_manager = match &self.fd_manager {
            Some(m) => Some(m.lock().await.clone()),
            None => None,
        };
        let linked = self.linked_programs.lock().await;
        let forked_linked: HashMap<String, LinkedProgram> = linked
            .iter()
            .map(|(name, slot)| (name.clone(), LinkedProgram::Uninstantiated(slot.program())))
            .collect();
        drop(linked);

        Process {
            program: self.program.clone(),
            state: Arc::new(Mutex::new(state)),
            fd_manager: fd_manager.map(|m| Arc::new(Mutex::new(m))),
            registry: self.registry.clone(),
            linked_programs: Arc::new(Mutex::new(forked_linked)),
            linked_program_descriptions: self.linked_program_descriptions.clone(),
            provider: self.provider.clone(),
            callbacks: Vec::new(),
            allow_fork: false,
            cancellation: self.cancellation.child_token(),
            base_system_prompt: self.base_system_prompt.clone(),
            preloaded: self.preloaded.clone(),
            enriched_system_prompt: self.enriched_system_prompt.clone(),
        }
    }

    /// Clears the message log and turn counter. `keep_system_prompt` and
    /// `keep_preloaded` control whether the system prompt is recomputed
    /// from scratch or kept at its enriched value (spec §4.H).
    pub async fn reset_state(&mut self, keep_system_prompt: bool, keep_preloaded: bool) {
        *self.state.lock().await = ProcessState::empty();

        if !keep_system_prompt {
            self.enriched_system_prompt = self.base_system_prompt.clone();
            return;
        }
        self.enriched_system_prompt =
            compute_enriched_prompt(&self.base_system_prompt, &self.preloaded, keep_preloaded);
    }
}

fn compute_enriched_prompt(base: &str, preloaded: &HashMap<String, String>, include_preload: bool) -> String {
    if !include_preload || preloaded.is_empty() {
        return base.to_string();
    }
    let mut prompt = base.to_string();
    prompt.push_str("\n\n");
    let mut paths: Vec<&String> = preloaded.keys().collect();
    paths.sort();
    for path in paths {
        prompt.push_str(&format!("<preload path=\"{path}\">\n{}\n</preload>\n", preloaded[path]));
    }
    prompt
}
