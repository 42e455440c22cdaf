//! Declarative, compiled program configuration (spec §3 "Program", §4.G).

mod compiler;
pub mod source;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::fd::FileDescriptorManager;
use crate::process::{LinkedProgram, Process};
use crate::providers::{AnthropicProvider, LLMProvider, OpenAiProvider};
use crate::tools::ToolRegistry;

pub use source::{EnvInfoVariables, LinkedProgramSpec, McpSection, ProgramSource};

#[derive(Debug, Clone)]
pub struct FdConfig {
    pub enabled: bool,
    pub default_page_size: usize,
    pub enable_references: bool,
    pub max_direct_output_chars: usize,
    pub max_input_chars: usize,
    pub page_user_input: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ToolConfig {
    pub builtin: Vec<String>,
    pub aliases: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct EnvInfoConfig {
    pub variables: EnvInfoVariables,
    /// Custom key/value pairs declared alongside `variables` in
    /// `[env_info]` (spec §6), merged into the `<env>` block verbatim.
    pub custom: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct DemoConfig {
    pub prompts: Vec<String>,
    pub pause_between_prompts: bool,
}

/// A compiled program: one node in the linked-program graph (spec §3, §4.G).
pub struct Program {
    pub model_id: String,
    pub provider_id: String,
    pub provider_options: HashMap<String, Value>,
    pub display_name: Option<String>,
    pub disable_automatic_caching: bool,
    pub token_efficient_tools: bool,
    pub system_prompt: String,
    pub parameters: Value,
    pub preload_files: Vec<PathBuf>,
    pub env_info: EnvInfoConfig,
    pub fd_config: FdConfig,
    pub tool_config: ToolConfig,
    pub mcp: Option<McpSection>,
    pub default_prompt: Option<String>,
    pub max_iterations: Option<usize>,
    pub demo: DemoConfig,
    pub base_dir: PathBuf,

    pub(crate) linked_program_specs: HashMap<String, LinkedProgramSpec>,
    pub(crate) linked_programs: HashMap<String, Arc<Program>>,
    compiled: bool,
}

impl Program {
    /// Parses `path` (and, transitively, every program it links to) and
    /// runs the full compilation pipeline (spec §4.G).
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Arc<Program>> {
        let mut stack = Vec::new();
        let mut registry = HashMap::new();
        compiler::compile_from_path(path.as_ref(), &mut stack, &mut registry)
    }

    pub(crate) fn from_source(source: ProgramSource, base_dir: &Path) -> Result<Program> {
        let system_prompt = Self::resolve_prompt(&source.prompt, base_dir)?;
        let parameters = serde_json::to_value(&source.parameters).unwrap_or(Value::Object(Default::default()));

        Ok(Program {
            model_id: source.model.id,
            provider_id: source.model.provider,
            provider_options: source.model.options,
            display_name: source.model.display_name,
            disable_automatic_caching: source.model.disable_automatic_caching,
            token_efficient_tools: source.model.token_efficient_tools,
            system_prompt,
            parameters,
            preload_files: source.preload.files,
            env_info: EnvInfoConfig {
                variables: source.env_info.variables,
                custom: source.env_info.custom,
            },
            fd_config: FdConfig {
                enabled: source.file_descriptor.enabled,
                default_page_size: source.file_descriptor.default_page_size,
                enable_references: source.file_descriptor.enable_references,
                max_direct_output_chars: source.file_descriptor.max_direct_output_chars,
                max_input_chars: source.file_descriptor.max_input_chars,
                page_user_input: source.file_descriptor.page_user_input,
            },
            tool_config: ToolConfig {
                builtin: source.tools.builtin,
                aliases: source.tools.aliases,
            },
            mcp: source.mcp,
            default_prompt: source.default_prompt,
            max_iterations: source.max_iterations,
            demo: DemoConfig {
                prompts: source.demo.prompts,
                pause_between_prompts: source.demo.pause_between_prompts,
            },
            base_dir: base_dir.to_path_buf(),
            linked_program_specs: source.linked_programs,
            linked_programs: HashMap::new(),
            compiled: false,
        })
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    fn build_provider(&self) -> Result<Arc<dyn LLMProvider>> {
        let api_key = |env_var: &str| std::env::var(env_var).unwrap_or_default();
        let provider: Arc<dyn LLMProvider> = match self.provider_id.as_str() {
            "openai" => Arc::new(OpenAiProvider::new(api_key("OPENAI_API_KEY"))),
            _ => Arc::new(AnthropicProvider::new(api_key("ANTHROPIC_API_KEY"))),
        };
        Ok(provider)
    }

    /// Instantiates a running [`Process`] from this compiled program:
    /// preloads files, builds the FD manager, populates the tool registry
    /// with built-ins and MCP tools, and snapshots the linked-program map
    /// (spec §4.H).
    pub async fn start(self: &Arc<Self>) -> Result<Process> {
        let mut preloaded = HashMap::new();
        for rel_path in &self.preload_files {
            let path = self.base_dir.join(rel_path);
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|_| crate::error::Error::FileNotFound { path: path.clone() })?;
            preloaded.insert(rel_path.display().to_string(), content);
        }

        let mut fd_manager = self
            .fd_config
            .enabled
            .then(|| FileDescriptorManager::new(self.fd_config.default_page_size, self.fd_config.enable_references));
        if let Some(manager) = fd_manager.as_mut() {
            // Reading or exporting a file descriptor must never itself create
            // a new wrapping FD (spec §4.B "Auto-wrap rule" recursion guard).
            manager.register_fd_tool("read_fd");
            manager.register_fd_tool("fd_to_file");
        }

        let registry = Arc::new(crate::tools::builtin::build_registry(self, fd_manager.is_some()).await?);

        let linked_programs: HashMap<String, LinkedProgram> = self
            .linked_programs
            .iter()
            .map(|(name, program)| (name.clone(), LinkedProgram::Uninstantiated(program.clone())))
            .collect();
        let linked_program_descriptions: HashMap<String, Option<String>> = self
            .linked_program_specs
            .iter()
            .map(|(name, spec)| (name.clone(), spec.description().map(str::to_string)))
            .collect();

        let provider = self.build_provider()?;
        let system_prompt = crate::tools::builtin::env_info::apply(&self.system_prompt, &self.env_info);
        let allow_fork = self.tool_config.builtin.iter().any(|t| t == "fork");

        Ok(Process::new(
            self.clone(),
            provider,
            registry,
            fd_manager,
            linked_programs,
            linked_program_descriptions,
            system_prompt,
            preloaded,
            allow_fork,
        ))
    }

    /// A minimal, fully valid in-memory program for unit tests that need a
    /// `Program` but not a real provider or file system.
    #[cfg(test)]
    pub fn minimal_for_tests() -> Program {
        Program {
            model_id: "test-model".to_string(),
            provider_id: "anthropic".to_string(),
            provider_options: HashMap::new(),
            display_name: None,
            disable_automatic_caching: false,
            token_efficient_tools: false,
            system_prompt: String::new(),
            parameters: Value::Object(Default::default()),
            preload_files: Vec::new(),
            env_info: EnvInfoConfig::default(),
            fd_config: FdConfig {
                enabled: false,
                default_page_size: 8_000,
                enable_references: false,
                max_direct_output_chars: 8_000,
                max_input_chars: 8_000,
                page_user_input: false,
            },
            tool_config: ToolConfig::default(),
            mcp: None,
            default_prompt: None,
            max_iterations: None,
            demo: DemoConfig::default(),
            base_dir: PathBuf::new(),
            linked_program_specs: HashMap::new(),
            linked_programs: HashMap::new(),
            compiled: true,
        }
    }
}
