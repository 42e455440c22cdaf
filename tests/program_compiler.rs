//! Program-compiler invariants (spec §4.G, §8): alias injectivity (S6),
//! linked-program cycle rejection (§9 design note), and the FD/FD-tool
//! bi-implication.

use llmproc_core::error::Error;
use llmproc_core::program::Program;

#[test]
fn alias_uniqueness_is_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aliased.toml");
    std::fs::write(
        &path,
        r#"
[model]
id = "test-model"

[tools]
builtin = ["calculator"]

[tools.aliases]
a = "calculator"
b = "calculator"
"#,
    )
    .unwrap();

    let err = Program::from_toml_file(&path).unwrap_err();
    match err {
        Error::ProgramValidation(message) => assert!(
            message.contains("more than one alias"),
            "unexpected validation message: {message}"
        ),
        other => panic!("expected ProgramValidation, got {other:?}"),
    }
}

#[test]
fn linked_program_cycle_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("a.toml"),
        r#"
[model]
id = "a"

[linked_programs]
b = "b.toml"
"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("b.toml"),
        r#"
[model]
id = "b"

[linked_programs]
a = "a.toml"
"#,
    )
    .unwrap();

    let err = Program::from_toml_file(dir.path().join("a.toml")).unwrap_err();
    match err {
        Error::ProgramValidation(message) => assert!(
            message.contains("cycle"),
            "unexpected validation message: {message}"
        ),
        other => panic!("expected ProgramValidation, got {other:?}"),
    }
}

#[test]
fn fd_tool_without_fd_enabled_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fd_tool_no_fd.toml");
    std::fs::write(
        &path,
        r#"
[model]
id = "test-model"

[tools]
builtin = ["read_fd"]

[file_descriptor]
enabled = false
"#,
    )
    .unwrap();

    let err = Program::from_toml_file(&path).unwrap_err();
    assert!(matches!(err, Error::ProgramValidation(_)));
}

#[test]
fn fd_enabled_without_fd_tool_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fd_no_tool.toml");
    std::fs::write(
        &path,
        r#"
[model]
id = "test-model"

[file_descriptor]
enabled = true
"#,
    )
    .unwrap();

    let err = Program::from_toml_file(&path).unwrap_err();
    assert!(matches!(err, Error::ProgramValidation(_)));
}

#[test]
fn spawn_without_linked_programs_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spawn_no_links.toml");
    std::fs::write(
        &path,
        r#"
[model]
id = "test-model"

[tools]
builtin = ["spawn"]
"#,
    )
    .unwrap();

    let err = Program::from_toml_file(&path).unwrap_err();
    assert!(matches!(err, Error::ProgramValidation(_)));
}

#[test]
fn compiling_a_program_twice_yields_equivalent_results() {
    // Compilation is idempotent (spec §8 invariant 7): recompiling the same
    // source file from scratch must not change its validated fields or
    // leave it uncompiled.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.toml");
    std::fs::write(
        &path,
        r#"
[model]
id = "plain-model"

[tools]
builtin = ["calculator"]
"#,
    )
    .unwrap();

    let first = Program::from_toml_file(&path).unwrap();
    let second = Program::from_toml_file(&path).unwrap();
    assert!(first.is_compiled());
    assert!(second.is_compiled());
    assert_eq!(first.model_id, second.model_id);
    assert_eq!(first.tool_config.builtin, second.tool_config.builtin);
}

#[test]
fn a_linked_program_reached_through_two_parents_compiles_successfully() {
    // Two different parents linking the same child program (spec §4.G's
    // dedup registry) must both compile cleanly rather than conflict.
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("shared.toml"), "[model]\nid = \"shared\"\n").unwrap();
    std::fs::write(
        dir.path().join("left.toml"),
        r#"
[model]
id = "left"

[linked_programs]
shared = "shared.toml"
"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("right.toml"),
        r#"
[model]
id = "right"

[linked_programs]
shared = "shared.toml"
"#,
    )
    .unwrap();

    let left = Program::from_toml_file(dir.path().join("left.toml")).unwrap();
    let right = Program::from_toml_file(dir.path().join("right.toml")).unwrap();
    assert!(left.is_compiled());
    assert!(right.is_compiled());
}
