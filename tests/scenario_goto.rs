//! Scenario S5 / invariant 6 (spec §8): `goto` rewinds the message log to an
//! earlier message id, rejects any position at or after the current tail,
//! and -- when given a new direction -- appends one message wrapping the
//! abandoned content and the caller's new direction.

mod common;

use std::sync::Arc;

use serde_json::json;

use llmproc_core::process::{Content, ProcessState, Role};

async fn seed(process: &llmproc_core::process::Process) {
    let mut state = process.state.lock().await;
    *state = ProcessState::empty();
    state.append(Role::User, Content::Text("u1".into())); // msg_0
    state.append(Role::Assistant, Content::Text("a1".into())); // msg_1
    state.append(Role::User, Content::Text("to be abandoned".into())); // msg_2
    state.append(Role::Assistant, Content::Text("a3".into())); // msg_3
}

fn program_dir() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

async fn goto_process() -> llmproc_core::process::Process {
    let dir = program_dir();
    let program = common::compile_program(
        dir.path(),
        "goto.toml",
        r#"
[model]
id = "test-model"

[tools]
builtin = ["goto"]
"#,
    );
    let provider = Arc::new(common::ScriptedProvider::new(|_req| common::text_response("unused")));
    common::start_with_provider(&program, provider, Default::default()).await
}

#[tokio::test]
async fn goto_backward_truncates_to_target() {
    let process = goto_process().await;
    seed(&process).await;

    let ctx = process.runtime_context();
    let result = process
        .registry
        .call_tool("goto", json!({ "position": "msg_0" }), ctx)
        .await
        .unwrap();
    assert!(!result.is_error);

    let state = process.state.lock().await;
    assert_eq!(state.messages.len(), 1);
    assert_eq!(state.messages[0].id, "msg_0");
}

#[tokio::test]
async fn goto_forward_is_rejected() {
    let process = goto_process().await;
    seed(&process).await;

    let ctx = process.runtime_context();
    let result = process
        .registry
        .call_tool("goto", json!({ "position": "msg_3" }), ctx)
        .await
        .unwrap();
    assert!(result.is_error);
    assert!(result.content.contains("cannot go forward"));

    let state = process.state.lock().await;
    assert_eq!(state.messages.len(), 4, "a rejected goto must not mutate the log");
}

#[tokio::test]
async fn goto_with_message_wraps_abandoned_content_and_new_direction() {
    let process = goto_process().await;
    seed(&process).await;

    let ctx = process.runtime_context();
    let result = process
        .registry
        .call_tool("goto", json!({ "position": "msg_0", "message": "try X" }), ctx)
        .await
        .unwrap();
    assert!(!result.is_error);
    assert!(result.content.contains("to be abandoned"));
    assert!(result.content.contains("try X"));

    let state = process.state.lock().await;
    // msg_0 survives the truncation, plus one new user message carrying the
    // time-travel framing (spec §8 invariant 6: length == index + 1 + 1).
    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.messages[0].id, "msg_0");
    let new_message_text = state.messages[1].content.flatten_text();
    assert!(new_message_text.contains("<abandoned_message>to be abandoned</abandoned_message>"));
    assert!(new_message_text.contains("<time_travel_message>try X</time_travel_message>"));
}
