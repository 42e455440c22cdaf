//! Scenario S2 (spec §8): a tool whose output exceeds
//! `max_direct_output_chars` is auto-wrapped into a file descriptor instead
//! of being inlined, and the wrapped content round-trips through `read_fd`.

mod common;

use std::sync::Arc;

use serde_json::json;

use llmproc_core::process::{ContentBlock, Role};

const BIG_CONTENT_LEN: usize = 2_000;
const MAX_DIRECT_OUTPUT_CHARS: usize = 100;

fn tool_result_content<'a>(messages: &'a [llmproc_core::process::Message], call_id: &str) -> Option<&'a str> {
    messages.iter().rev().find_map(|m| {
        if m.role != Role::ToolResultBundle {
            return None;
        }
        match &m.content {
            llmproc_core::process::Content::Blocks(blocks) => blocks.iter().find_map(|b| match b {
                ContentBlock::ToolResult { tool_use_id, content, .. } if tool_use_id == call_id => Some(content.as_str()),
                _ => None,
            }),
            _ => None,
        }
    })
}

#[tokio::test]
async fn oversized_tool_output_is_wrapped_and_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let big_content: String = "line of filler text\n".repeat(BIG_CONTENT_LEN / 20);
    assert!(big_content.len() > MAX_DIRECT_OUTPUT_CHARS);
    let big_path = dir.path().join("big.txt");
    std::fs::write(&big_path, &big_content).unwrap();
    let big_path_str = big_path.display().to_string();

    let program = common::compile_program(
        dir.path(),
        "autowrap.toml",
        &format!(
            r#"
[model]
id = "test-model"

[tools]
builtin = ["read_file", "read_fd"]

[file_descriptor]
enabled = true
default_page_size = 8000
max_direct_output_chars = {MAX_DIRECT_OUTPUT_CHARS}
"#
        ),
    );

    let big_path_for_script = big_path_str.clone();
    let provider = Arc::new(common::ScriptedProvider::new(move |req| {
        match common::completed_tool_turns(req) {
            0 => common::tool_call_response("call-read", "read_file", json!({ "path": big_path_for_script })),
            1 => {
                let wrapped = tool_result_content(req.messages, "call-read").expect("read_file result present");
                assert!(
                    wrapped.starts_with("<fd_result"),
                    "expected an fd_result envelope, got: {wrapped}"
                );
                assert!(
                    wrapped.len() < BIG_CONTENT_LEN,
                    "envelope should be far smaller than the raw 2000-char output"
                );
                let fd_id = common::extract_fd_id(wrapped);
                common::tool_call_response("call-readfd", "read_fd", json!({ "fd": fd_id, "read_all": true }))
            }
            _ => common::text_response("confirmed"),
        }
    }));

    let mut process = common::start_with_provider(&program, provider, Default::default()).await;
    let outcome = process.run("read the big file".to_string(), None).await.unwrap();
    assert_eq!(outcome.text(), "confirmed");

    let state = process.state.lock().await;
    let wrapped = tool_result_content(&state.messages, "call-read").expect("wrapped result still in the log");
    assert!(wrapped.starts_with("<fd_result"));

    let extracted = tool_result_content(&state.messages, "call-readfd").expect("read_fd result present");
    assert_eq!(extracted, big_content, "read_fd(read_all=true) must equal the original raw output");
}
