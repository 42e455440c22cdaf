//! `{ role, content, id }` message model (spec §3).
//!
//! Modeled as an ordered sequence of tagged blocks rather than any
//! provider-specific object, so `goto`, `fork`, and future persistence stay
//! provider-independent (spec §9 design note).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
    ToolResultBundle,
}

/// A single piece of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ToolUse { id: String, name: String, input: serde_json::Value },
    ToolResult { tool_use_id: String, content: String, is_error: bool },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text.as_str()),
            _ => None,
        }
    }
}

/// Either a plain string or an ordered sequence of blocks (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl Content {
    pub fn is_empty(&self) -> bool {
        match self {
            Content::Text(s) => s.is_empty(),
            Content::Blocks(blocks) => blocks.is_empty(),
        }
    }

    /// Flattens structured content blocks into concatenated text
    /// (used by [`crate::process::Process::get_last_message`]).
    pub fn flatten_text(&self) -> String {
        match self {
            Content::Text(s) => s.clone(),
            Content::Blocks(blocks) => blocks
                .iter()
                .filter_map(ContentBlock::as_text)
                .collect::<Vec<_>>()
                .join(""),
        }
    }

    pub fn tool_uses(&self) -> Vec<&ContentBlock> {
        match self {
            Content::Text(_) => vec![],
            Content::Blocks(blocks) => blocks
                .iter()
                .filter(|b| matches!(b, ContentBlock::ToolUse { .. }))
                .collect(),
        }
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Content::Text(value)
    }
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        Content::Text(value.to_owned())
    }
}

/// `{ role, content, id }` (spec §3). `id` is `msg_<n>`, a monotonic token
/// assigned at append time and used by `goto` for positional addressing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Content,
    pub id: String,
}

/// `msg_<n>` where `n` is the zero-based append index (spec §8 invariant 2).
pub fn message_id(index: usize) -> String {
    format!("msg_{index}")
}

/// Parses a `msg_<n>` token back into its zero-based index.
pub fn parse_message_id(id: &str) -> Option<usize> {
    id.strip_prefix("msg_")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_round_trips() {
        assert_eq!(message_id(0), "msg_0");
        assert_eq!(parse_message_id("msg_0"), Some(0));
        assert_eq!(parse_message_id("msg_17"), Some(17));
        assert_eq!(parse_message_id("bogus"), None);
    }

    #[test]
    fn flatten_concatenates_text_blocks_only() {
        let content = Content::Blocks(vec![
            ContentBlock::text("a"),
            ContentBlock::ToolUse {
                id: "t1".into(),
                name: "calculator".into(),
                input: serde_json::json!({}),
            },
            ContentBlock::text("b"),
        ]);
        assert_eq!(content.flatten_text(), "ab");
    }
}
