//! TOML program source file format (spec §6): `[model]`, `[prompt]`,
//! `[parameters]`, `[preload]`, `[mcp]`, `[mcp.tools]`, `[tools]`,
//! `[env_info]`, `[file_descriptor]`, `[linked_programs]`, `[demo]`.
//!
//! Grounded on the `#[serde(default = "defaults::...")]`-per-field
//! shape of `vtcode-core/src/config/loader`.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_true() -> bool {
    true
}

fn default_page_size() -> usize {
    8_000
}

fn default_max_direct_output_chars() -> usize {
    8_000
}

fn default_max_input_chars() -> usize {
    8_000
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSection {
    pub id: String,
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub options: HashMap<String, Value>,
    /// Anthropic automatically marks the system prompt cacheable unless
    /// this is set (spec §6 `[model]`).
    #[serde(default)]
    pub disable_automatic_caching: bool,
    /// Opt-in to the provider's token-efficient tool-use header, merged by
    /// the executor without duplicating a caller-supplied header of the
    /// same name (spec §4.I.1).
    #[serde(default)]
    pub token_efficient_tools: bool,
}

fn default_provider() -> String {
    "anthropic".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PromptSection {
    #[default]
    Empty,
    Inline(String),
    File {
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreloadSection {
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerSpec {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpSection {
    #[serde(default)]
    pub servers: HashMap<String, McpServerSpec>,
    /// `[mcp.tools]`: server name -> tool names, or `"all"` to import every
    /// tool the server advertises (spec §4.F).
    #[serde(default)]
    pub tools: HashMap<String, McpToolSelection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum McpToolSelection {
    All(String),
    Named(Vec<String>),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsSection {
    #[serde(default)]
    pub builtin: Vec<String>,
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

/// `[env_info] variables = [...] | "all"` (spec §3 "environment-info
/// policy", §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvInfoVariables {
    All(String),
    Named(Vec<String>),
}

impl Default for EnvInfoVariables {
    fn default() -> Self {
        Self::Named(Vec::new())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvInfoSection {
    #[serde(default)]
    pub variables: EnvInfoVariables,
    /// Arbitrary string key/value pairs alongside `variables` (spec §6
    /// "`[env_info]` ... plus arbitrary string key/value pairs"), merged
    /// into the `<env>` block verbatim.
    #[serde(flatten)]
    pub custom: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDescriptorSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    #[serde(default)]
    pub enable_references: bool,
    /// Auto-wrap threshold: a non-FD tool's output longer than this many
    /// characters is wrapped into a new FD instead of inlined (spec §4.B
    /// "Auto-wrap rule").
    #[serde(default = "default_max_direct_output_chars")]
    pub max_direct_output_chars: usize,
    /// Auto-wrap threshold for oversized user input (spec §4.B).
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    /// Whether oversized user input is itself auto-wrapped into an FD
    /// before being appended (spec §4.B).
    #[serde(default)]
    pub page_user_input: bool,
}

impl Default for FileDescriptorSection {
    fn default() -> Self {
        Self {
            enabled: false,
            default_page_size: default_page_size(),
            enable_references: false,
            max_direct_output_chars: default_max_direct_output_chars(),
            max_input_chars: default_max_input_chars(),
            page_user_input: false,
        }
    }
}

/// `[linked_programs] <name> = "<relative-path>" | { path, description }`
/// (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkedProgramSpec {
    Path(PathBuf),
    Table {
        path: PathBuf,
        #[serde(default)]
        description: Option<String>,
    },
}

impl LinkedProgramSpec {
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Path(p) => p,
            Self::Table { path, .. } => path,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Path(_) => None,
            Self::Table { description, .. } => description.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemoSection {
    #[serde(default)]
    pub prompts: Vec<String>,
    #[serde(default)]
    pub pause_between_prompts: bool,
}

/// The on-disk shape of a program source file (spec §6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramSource {
    pub model: ModelSection,
    #[serde(default)]
    pub prompt: PromptSection,
    #[serde(default)]
    pub parameters: HashMap<String, Value>,
    #[serde(default)]
    pub preload: PreloadSection,
    #[serde(default)]
    pub mcp: Option<McpSection>,
    #[serde(default)]
    pub tools: ToolsSection,
    #[serde(default)]
    pub env_info: EnvInfoSection,
    #[serde(default, rename = "file_descriptor")]
    pub file_descriptor: FileDescriptorSection,
    #[serde(default)]
    pub linked_programs: HashMap<String, LinkedProgramSpec>,
    #[serde(default)]
    pub demo: DemoSection,
    #[serde(default)]
    pub default_prompt: Option<String>,
    #[serde(default)]
    pub max_iterations: Option<usize>,
}

impl ProgramSource {
    pub fn parse_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}
