//! Environment-info injection: appends a small `<env>` block to the system
//! prompt for each variable a program opts into (spec §3 "env-info
//! policy"). Opt-in and enumerable, unlike always-on environment leakage.

use crate::program::{EnvInfoConfig, EnvInfoVariables};

const KNOWN_VARIABLES: &[&str] = &["working_directory", "platform", "date"];

pub fn apply(system_prompt: &str, config: &EnvInfoConfig) -> String {
    let selected: Vec<&str> = match &config.variables {
        EnvInfoVariables::Named(names) => names.iter().map(String::as_str).collect(),
        EnvInfoVariables::All(marker) if marker == "all" => KNOWN_VARIABLES.to_vec(),
        EnvInfoVariables::All(_) => Vec::new(),
    };

    let mut lines = Vec::new();
    for var in selected {
        if let Some(value) = resolve(var) {
            lines.push(format!("{var}: {value}"));
        }
    }
    // Custom `[env_info]` key/value pairs (spec §6) are carried verbatim,
    // independent of the `variables` whitelist.
    let mut custom_keys: Vec<&String> = config.custom.keys().collect();
    custom_keys.sort();
    for key in custom_keys {
        lines.push(format!("{key}: {}", config.custom[key]));
    }

    if lines.is_empty() {
        return system_prompt.to_string();
    }

    format!("{system_prompt}\n\n<env>\n{}\n</env>", lines.join("\n"))
}

fn resolve(var: &str) -> Option<String> {
    match var {
        "working_directory" => std::env::current_dir().ok().map(|p| p.display().to_string()),
        "platform" => Some(std::env::consts::OS.to_string()),
        "date" => std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .ok()
            .map(|d| format!("{} (unix seconds)", d.as_secs())),
        _ => None,
    }
}

pub fn known_variables() -> &'static [&'static str] {
    KNOWN_VARIABLES
}
