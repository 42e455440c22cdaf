//! `goto`: context-aware rewind of the conversation log to an earlier
//! message (spec §4.E, §8 invariant 6, scenario S5).

use serde_json::Value;

use crate::process::{message::parse_message_id, Content, ContentBlock, Role};
use crate::tool_result::ToolResult;
use crate::tools::context::Capability;
use crate::tools::schema::{ToolHandler, ToolSchema};
use crate::tools::RuntimeContext;

const SYSTEM_NOTICE_TAG: &str = "<system_notice>";

pub fn schema() -> ToolSchema {
    ToolSchema::new(
        "goto",
        "Rewinds the conversation to an earlier message, discarding everything after it. \
         Use this to abandon an unproductive line of exploration.",
        serde_json::json!({
            "type": "object",
            "properties": {
                "position": { "type": "string", "description": "a message id, e.g. \"msg_3\"" },
                "message": { "type": "string", "description": "optional new direction to try instead" }
            },
            "required": ["position"]
        }),
    )
}

pub fn handler() -> ToolHandler {
    ToolHandler::context_aware(|args: Value, ctx: RuntimeContext| async move {
        if let Err(e) = ctx.context_has(&[Capability::Process]) {
            return ToolResult::from_error(format!("goto error: {e}"));
        }
        let Some(position) = args.get("position").and_then(Value::as_str) else {
            return ToolResult::from_error("goto error: missing required field 'position'");
        };
        let Some(target_index) = parse_message_id(position) else {
            return ToolResult::from_error(format!("goto error: '{position}' is not a valid message id"));
        };
        let new_direction = args.get("message").and_then(Value::as_str);

        let mut state = ctx.process.lock().await;
        let tail_index = state.messages.len().saturating_sub(1);
        // Invariant: goto succeeds iff position's index is strictly less
        // than the current tail index (spec §8 invariant 6).
        if target_index >= state.messages.len() || target_index >= tail_index {
            return ToolResult::from_error("goto error: cannot go forward".to_string());
        }

        // "the original message being abandoned" (spec §4.E): the first
        // *user* message truncation discards, not just the next message
        // (which is usually the assistant's reply to the target itself).
        let abandoned_text = state
            .messages
            .iter()
            .skip(target_index + 1)
            .find(|m| m.role == Role::User)
            .map(|m| m.content.flatten_text())
            .unwrap_or_default();

        state.truncate_after(target_index, position.to_string());

        if let Some(direction) = new_direction {
            // Already-framed content is used as-is to avoid double-wrapping
            // (spec §4.E).
            let wrapped = if direction.contains(SYSTEM_NOTICE_TAG) {
                direction.to_string()
            } else {
                format!(
                    "{SYSTEM_NOTICE_TAG}Rewound conversation to {position}.</system_notice>\n\
                     <abandoned_message>{abandoned_text}</abandoned_message>\n\
                     <time_travel_message>{direction}</time_travel_message>"
                )
            };
            state.append(Role::User, Content::Blocks(vec![ContentBlock::text(wrapped.clone())]));
            return ToolResult::from_success(wrapped);
        }

        ToolResult::from_success(format!("rewound conversation to {position}"))
    })
}
