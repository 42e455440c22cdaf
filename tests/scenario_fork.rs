//! Scenario S3 / invariant 5 (spec §8): `fork(prompts)` runs one child
//! process per prompt in parallel, returns their text responses as a JSON
//! array in prompt order, and the parent's own message log never contains
//! anything a child produced.

mod common;

use std::sync::Arc;

use serde_json::{json, Value};

use llmproc_core::process::Role;

#[tokio::test]
async fn fork_runs_branches_in_order_and_isolates_parent_state() {
    let dir = tempfile::tempdir().unwrap();
    let program = common::compile_program(
        dir.path(),
        "fork.toml",
        r#"
[model]
id = "test-model"

[tools]
builtin = ["fork"]
"#,
    );

    let provider = Arc::new(common::ScriptedProvider::new(|req| {
        let prompt = common::last_user_text(req);
        match prompt.as_str() {
            "explore this codebase" => common::tool_call_response("fork-1", "fork", json!({ "prompts": ["A", "B"] })),
            "A" => common::text_response("respA"),
            "B" => common::text_response("respB"),
            other => panic!("unexpected prompt reached the provider: {other}"),
        }
    }));

    let mut process = common::start_with_provider(&program, provider, Default::default()).await;
    let outcome = process.run("explore this codebase".to_string(), None).await.unwrap();

    // The parent's final assistant text is whatever the fork tool-result
    // turn produced; what matters here is the tool-result content itself.
    let _ = outcome;

    let state = process.state.lock().await;
    let fork_result = state
        .messages
        .iter()
        .rev()
        .find_map(|m| match &m.content {
            llmproc_core::process::Content::Blocks(blocks) => blocks.iter().find_map(|b| match b {
                llmproc_core::process::ContentBlock::ToolResult { tool_use_id, content, .. } if tool_use_id == "fork-1" => {
                    Some(content.clone())
                }
                _ => None,
            }),
            _ => None,
        })
        .expect("fork tool-result present in parent's log");

    let parsed: Value = serde_json::from_str(&fork_result).expect("fork result is a JSON array");
    let array = parsed.as_array().expect("array");
    assert_eq!(array.len(), 2);
    assert_eq!(array[0]["id"], 0);
    assert_eq!(array[0]["message"], "respA");
    assert_eq!(array[1]["id"], 1);
    assert_eq!(array[1]["message"], "respB");

    // Parent's log never contains a child's branch-only messages ("A"/"B"
    // as user turns, or "respA"/"respB" as assistant turns) -- only the
    // aggregated tool-result above.
    for message in &state.messages {
        if message.role == Role::User {
            let text = message.content.flatten_text();
            assert_ne!(text, "A");
            assert_ne!(text, "B");
        }
    }
}

#[tokio::test]
async fn forked_children_cannot_themselves_fork() {
    let dir = tempfile::tempdir().unwrap();
    let program = common::compile_program(
        dir.path(),
        "fork_nested.toml",
        r#"
[model]
id = "test-model"

[tools]
builtin = ["fork"]
"#,
    );

    let provider = Arc::new(common::ScriptedProvider::new(|req| {
        let prompt = common::last_user_text(req);
        let turns = common::completed_tool_turns(req);
        match (prompt.as_str(), turns) {
            ("start", 0) => common::tool_call_response("fork-1", "fork", json!({ "prompts": ["child"] })),
            // `turns == 1` is the seeded tool-result bundle the fork
            // machinery appends before handing the branch its prompt; the
            // child's own nested-fork attempt is rejected and appended as a
            // second bundle, after which it summarizes in plain text.
            ("child", 1) => common::tool_call_response("fork-2", "fork", json!({ "prompts": ["grandchild"] })),
            ("child", 2) => common::text_response("no nested fork"),
            (other, turns) => panic!("unexpected provider call: prompt={other:?} turns={turns}"),
        }
    }));

    let mut process = common::start_with_provider(&program, provider, Default::default()).await;
    process.run("start".to_string(), None).await.unwrap();

    let state = process.state.lock().await;
    let fork_result = state
        .messages
        .iter()
        .rev()
        .find_map(|m| match &m.content {
            llmproc_core::process::Content::Blocks(blocks) => blocks.iter().find_map(|b| match b {
                llmproc_core::process::ContentBlock::ToolResult { tool_use_id, content, .. } if tool_use_id == "fork-1" => {
                    Some(content.clone())
                }
                _ => None,
            }),
            _ => None,
        })
        .expect("outer fork tool-result present");

    let parsed: Value = serde_json::from_str(&fork_result).unwrap();
    let branch_text = parsed[0]["message"].as_str().unwrap();
    assert!(
        branch_text.contains("not permitted"),
        "a forked child attempting to fork again must get the forking-disallowed error, got: {branch_text}"
    );
}
