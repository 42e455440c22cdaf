//! Uniform success/error envelope for tool outputs (spec §4.A).
//!
//! Every tool handler — built-in, function, or external — returns a
//! [`ToolResult`]. The provider executor translates it into that provider's
//! native tool-result content block; it never inspects `is_error` to decide
//! whether to keep running (tool errors are local, not fatal — spec §7).

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn from_success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            content: message.into(),
            is_error: true,
        }
    }

    /// Convenience for handlers that naturally produce JSON.
    pub fn from_success_json(value: &Value) -> Self {
        Self::from_success(serde_json::to_string_pretty(value).unwrap_or_default())
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_not_an_error() {
        let r = ToolResult::from_success("ok");
        assert!(!r.is_error);
        assert_eq!(r.content, "ok");
    }

    #[test]
    fn error_is_flagged() {
        let r = ToolResult::from_error("boom");
        assert!(r.is_error);
        assert_eq!(r.content, "boom");
    }
}
