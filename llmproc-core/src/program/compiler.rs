//! Program compilation: system prompt resolution, field validation,
//! FD/tool cross-checks, alias injectivity, and recursive linked-program
//! compilation with cycle detection (spec §4.G).

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::program::source::{McpToolSelection, PromptSection, ProgramSource};
use crate::program::Program;

/// Tools whose presence requires the file-descriptor subsystem to be
/// enabled, and vice versa (spec §8 invariant: FD-enabled iff at least one
/// FD tool is registered).
const FD_TOOLS: &[&str] = &["read_fd", "fd_to_file"];

/// Recursively compiles `path`, deduplicating by canonicalized path and
/// rejecting cycles in the linked-program graph (spec §4.G, §8 invariant
/// 6). `stack` tracks the path currently being compiled (for cycle
/// detection); `registry` caches already-compiled programs (for dedup).
pub fn compile_from_path(
    path: &Path,
    stack: &mut Vec<PathBuf>,
    registry: &mut HashMap<PathBuf, Arc<Program>>,
) -> Result<Arc<Program>> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

    if let Some(cached) = registry.get(&canonical) {
        return Ok(cached.clone());
    }
    if stack.contains(&canonical) {
        let cycle = stack
            .iter()
            .skip_while(|p| *p != &canonical)
            .chain(std::iter::once(&canonical))
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(" -> ");
        return Err(Error::program_validation(format!("linked-program cycle detected: {cycle}")));
    }

    let text = std::fs::read_to_string(&canonical).map_err(|_| Error::FileNotFound { path: canonical.clone() })?;
    let source = ProgramSource::parse_toml(&text).map_err(Error::Toml)?;
    let base_dir = canonical.parent().map(Path::to_path_buf).unwrap_or_default();

    stack.push(canonical.clone());
    let mut program = Program::from_source(source, &base_dir)?;

    let mut linked = HashMap::new();
    for (name, spec) in &program.linked_program_specs {
        let child_path = base_dir.join(spec.path());
        let child = compile_from_path(&child_path, stack, registry)?;
        linked.insert(name.clone(), child);
    }
    program.linked_programs = linked;
    stack.pop();

    program.validate()?;
    program.compiled = true;

    let program = Arc::new(program);
    registry.insert(canonical, program.clone());
    Ok(program)
}

impl Program {
    /// Resolves `[prompt]` to a flat system-prompt string (spec §4.G step
    /// 1): an inline string, a file read relative to the program's
    /// directory, or empty.
    pub(super) fn resolve_prompt(prompt: &PromptSection, base_dir: &Path) -> Result<String> {
        match prompt {
            PromptSection::Empty => Ok(String::new()),
            PromptSection::Inline(text) => Ok(text.clone()),
            PromptSection::File { file } => {
                let path = base_dir.join(file);
                std::fs::read_to_string(&path).map_err(|_| Error::FileNotFound { path })
            }
        }
    }

    /// Ordered validation steps (spec §4.G, §8 invariant 5):
    /// 1. required fields present (`model.id` non-empty).
    /// 2. FD subsystem enabled iff an FD tool (`read_fd`/`fd_to_file`) is
    ///    registered.
    /// 3. every tool referenced by an alias actually exists.
    /// 4. alias targets are injective (no two aliases share a target).
    pub fn validate(&self) -> Result<()> {
        if self.model_id.trim().is_empty() {
            return Err(Error::program_validation("model.id must not be empty"));
        }

        let wants_fd_tools = self
            .tool_config
            .builtin
            .iter()
            .any(|name| FD_TOOLS.contains(&name.as_str()));
        if wants_fd_tools && !self.fd_config.enabled {
            return Err(Error::program_validation(
                "file descriptor tools (read_fd/fd_to_file) are registered but [file_descriptor] is not enabled",
            ));
        }
        if self.fd_config.enabled && !wants_fd_tools {
            return Err(Error::program_validation(
                "[file_descriptor] is enabled but no FD tool (read_fd/fd_to_file) is registered",
            ));
        }

        let known_builtins: HashSet<&str> = crate::tools::builtin::BUILTIN_TOOL_NAMES.iter().copied().collect();
        for name in &self.tool_config.builtin {
            if !known_builtins.contains(name.as_str()) {
                return Err(Error::program_validation(format!("unknown builtin tool: {name}")));
            }
        }

        let wants_spawn = self.tool_config.builtin.iter().any(|name| name == "spawn");
        if wants_spawn && self.linked_program_specs.is_empty() {
            return Err(Error::program_validation(
                "'spawn' is registered but [linked_programs] declares no linked programs",
            ));
        }

        for target in self.tool_config.aliases.values() {
            let is_builtin = self.tool_config.builtin.iter().any(|b| b == target);
            if !is_builtin && !self.mcp_allows(target) {
                return Err(Error::program_validation(format!(
                    "alias target '{target}' is not a registered tool"
                )));
            }
        }

        let mut seen_targets = HashSet::new();
        for target in self.tool_config.aliases.values() {
            if !seen_targets.insert(target) {
                return Err(Error::program_validation(format!(
                    "tool '{target}' has more than one alias pointing at it"
                )));
            }
        }

        Ok(())
    }

    /// Whether `target` (namespaced `<server>__<tool>`) is covered by an
    /// `[mcp.tools]` selection, including an `"all"` wildcard entry whose
    /// member tools are only known once the MCP connector lists them.
    fn mcp_allows(&self, target: &str) -> bool {
        let Some(mcp) = &self.mcp else { return false };
        mcp.tools.iter().any(|(server, selection)| {
            let Some(tool) = target.strip_prefix(&format!("{server}__")) else {
                return false;
            };
            match selection {
                McpToolSelection::All(marker) => marker == "all",
                McpToolSelection::Named(names) => names.iter().any(|n| n == tool),
            }
        })
    }
}
