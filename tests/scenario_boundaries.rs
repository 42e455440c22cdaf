//! Boundary behaviors and callback invariants from spec §8: empty input is
//! rejected before any provider call (12), a response with neither tool
//! uses nor text is never appended (13), tool results are bundled in
//! document order (14), and every tool dispatch emits a paired
//! `tool_start`/`tool_end` (invariant 1).

mod common;

use std::sync::{Arc, Mutex};

use serde_json::json;

use llmproc_core::process::{Content, ContentBlock, ProcessEvent, Role};

fn calculator_program(dir: &std::path::Path) -> std::sync::Arc<llmproc_core::program::Program> {
    common::compile_program(
        dir,
        "calc.toml",
        r#"
[model]
id = "test-model"

[tools]
builtin = ["calculator"]
"#,
    )
}

#[tokio::test]
async fn empty_input_is_rejected_before_any_provider_call() {
    let dir = tempfile::tempdir().unwrap();
    let program = calculator_program(dir.path());
    let provider = Arc::new(common::ScriptedProvider::new(|_req| {
        panic!("provider must never be called for empty input")
    }));
    let mut process = common::start_with_provider(&program, provider, Default::default()).await;

    let err = process.run("   ".to_string(), None).await.unwrap_err();
    assert!(matches!(err, llmproc_core::error::Error::ProgramValidation(_)));

    let state = process.state.lock().await;
    assert!(state.messages.is_empty(), "no message should have been appended");
}

#[tokio::test]
async fn empty_assistant_turn_is_never_appended() {
    let dir = tempfile::tempdir().unwrap();
    let program = calculator_program(dir.path());
    let provider = Arc::new(common::ScriptedProvider::new(|_req| llmproc_core::providers::LLMResponse {
        text: None,
        tool_calls: vec![],
        stop_reason: llmproc_core::providers::StopReason::EndTurn,
        usage: llmproc_core::providers::Usage::default(),
        raw: serde_json::Value::Null,
    }));
    let mut process = common::start_with_provider(&program, provider, Default::default()).await;

    let outcome = process.run("hello".to_string(), None).await.unwrap();
    assert_eq!(outcome.text(), "");

    let state = process.state.lock().await;
    assert_eq!(state.messages.len(), 1, "only the user message should be in the log");
    assert_eq!(state.messages[0].role, Role::User);
}

#[tokio::test]
async fn tool_results_are_bundled_in_document_order() {
    let dir = tempfile::tempdir().unwrap();
    let program = calculator_program(dir.path());
    let provider = Arc::new(common::ScriptedProvider::new(|req| match common::completed_tool_turns(req) {
        0 => llmproc_core::providers::LLMResponse {
            text: None,
            tool_calls: vec![
                llmproc_core::providers::ToolCall {
                    id: "c1".into(),
                    name: "calculator".into(),
                    arguments: json!({ "expression": "1 + 1" }),
                },
                llmproc_core::providers::ToolCall {
                    id: "c2".into(),
                    name: "calculator".into(),
                    arguments: json!({ "expression": "2 + 2" }),
                },
            ],
            stop_reason: llmproc_core::providers::StopReason::ToolUse,
            usage: llmproc_core::providers::Usage::default(),
            raw: serde_json::Value::Null,
        },
        _ => common::text_response("done"),
    }));
    let mut process = common::start_with_provider(&program, provider, Default::default()).await;
    process.run("compute both".to_string(), None).await.unwrap();

    let state = process.state.lock().await;
    let bundle = state
        .messages
        .iter()
        .find(|m| m.role == Role::ToolResultBundle)
        .expect("a tool-result bundle was appended");
    let Content::Blocks(blocks) = &bundle.content else {
        panic!("bundle content must be structured blocks");
    };
    let ids: Vec<&str> = blocks
        .iter()
        .map(|b| match b {
            ContentBlock::ToolResult { tool_use_id, .. } => tool_use_id.as_str(),
            other => panic!("unexpected block in tool-result bundle: {other:?}"),
        })
        .collect();
    assert_eq!(ids, vec!["c1", "c2"], "results must appear in the order the tool uses were issued");
}

#[tokio::test]
async fn every_tool_call_gets_a_paired_start_and_end_callback() {
    let dir = tempfile::tempdir().unwrap();
    let program = calculator_program(dir.path());
    let provider = Arc::new(common::ScriptedProvider::new(|req| match common::completed_tool_turns(req) {
        0 => common::tool_call_response("c1", "calculator", json!({ "expression": "3 + 4" })),
        _ => common::text_response("7"),
    }));
    let mut process = common::start_with_provider(&program, provider, Default::default()).await;

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    process.on_event(Arc::new(move |event: &ProcessEvent| {
        let label = match event {
            ProcessEvent::TurnStart { .. } => "turn_start",
            ProcessEvent::TurnEnd { .. } => "turn_end",
            ProcessEvent::ToolStart { .. } => "tool_start",
            ProcessEvent::ToolEnd { .. } => "tool_end",
            ProcessEvent::Response { .. } => "response",
            ProcessEvent::ApiResponse { .. } => "api_response",
        };
        sink.lock().unwrap().push(label);
    }));

    process.run("what is 3 + 4?".to_string(), None).await.unwrap();

    let log = events.lock().unwrap();
    let start_idx = log.iter().position(|e| *e == "tool_start").expect("tool_start emitted");
    let end_idx = log.iter().position(|e| *e == "tool_end").expect("tool_end emitted");
    assert!(start_idx < end_idx, "tool_start must precede tool_end");
    assert!(log.contains(&"turn_start"));
    assert!(log.contains(&"turn_end"));
}
