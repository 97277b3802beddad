// crates/sdm-codegen/tests/generate.rs
// ============================================================================
// Module: Generator Tests
// Description: Orchestration across schema files and messages.
// Purpose: Validate failure isolation, collisions, ordering, and merging.
// Dependencies: sdm-codegen, sdm-core
// ============================================================================

//! ## Overview
//! Drives [`sdm_codegen::Generator`] over multi-message files, including
//! broken siblings and cross-message name clashes.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use sdm_codegen::BackendKind;
use sdm_codegen::CodegenError;
use sdm_codegen::GeneratedFile;
use sdm_codegen::Generator;
use sdm_codegen::merge_extra_files;
use sdm_core::FieldDescriptor;
use sdm_core::MessageDescriptor;
use sdm_core::SchemaError;
use sdm_core::SchemaFile;
use sdm_core::TemplateNaming;
use sdm_core::ValueType;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn keyed(name: &str) -> MessageDescriptor {
    MessageDescriptor::new(name, vec![
        FieldDescriptor::new("id", ValueType::String).primary_key(),
        FieldDescriptor::new("email", ValueType::String).sensitive().hashed(),
    ])
}

fn file(name: &str, messages: Vec<MessageDescriptor>) -> SchemaFile {
    SchemaFile {
        name: name.to_string(),
        package: None,
        messages,
    }
}

fn sql_only() -> Generator {
    Generator::default().with_backends(vec![BackendKind::Sql])
}

// ============================================================================
// SECTION: Selection
// ============================================================================

#[test]
fn generates_requested_files_in_request_then_backend_order() {
    let files = vec![file("a.proto", vec![keyed("Alpha")]), file("b/b.proto", vec![keyed("Beta")])];
    let output = Generator::default()
        .generate(&["b/b.proto".to_string(), "a.proto".to_string()], &files)
        .unwrap();
    let names: Vec<&str> = output.files.iter().map(|file| file.name.as_str()).collect();
    assert_eq!(names, vec!["b/b.sdm.sql", "b/b_sdm_repo.rs", "a.sdm.sql", "a_sdm_repo.rs"]);
    assert!(output.is_complete());
}

#[test]
fn dependency_files_are_not_generated() {
    let files = vec![file("dep.proto", vec![keyed("Dep")]), file("main.proto", vec![keyed("Main")])];
    let output = sql_only().generate(&["main.proto".to_string()], &files).unwrap();
    assert_eq!(output.files.len(), 1);
    assert_eq!(output.files[0].name, "main.sdm.sql");
    assert!(!output.files[0].content.contains("DepPii"));
}

#[test]
fn unknown_requested_file_is_rejected() {
    let err = sql_only().generate(&["missing.proto".to_string()], &[]).unwrap_err();
    assert_eq!(err, CodegenError::MissingFile("missing.proto".to_string()));
}

// ============================================================================
// SECTION: Failure Isolation
// ============================================================================

#[test]
fn broken_message_does_not_suppress_siblings() {
    let broken = MessageDescriptor::new("Broken", vec![FieldDescriptor::new(
        "note",
        ValueType::String,
    )]);
    let files = vec![file("mixed.proto", vec![keyed("First"), broken, keyed("Last")])];
    let output = sql_only().generate_files(&files);

    assert_eq!(output.files.len(), 1);
    let content = &output.files[0].content;
    assert!(content.contains("FirstPii"));
    assert!(content.contains("LastPii"));
    assert!(!content.contains("BrokenPii"));
    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].file, "mixed.proto");
    assert_eq!(output.failures[0].error, SchemaError::MissingPrimaryKey {
        message: "Broken".to_string(),
    });

    let err = output.into_result().unwrap_err();
    assert!(matches!(&err, CodegenError::Messages(failures) if failures.len() == 1));
    assert!(err.to_string().contains("mixed.proto"));
}

#[test]
fn file_without_valid_messages_emits_nothing() {
    let files = vec![file("empty.proto", Vec::new())];
    let output = Generator::default().generate_files(&files);
    assert!(output.files.is_empty());
    assert!(output.is_complete());
}

#[test]
fn later_message_with_clashing_table_name_fails() {
    let naming = TemplateNaming::new("{message}", "{Message}Chain", "{message}_view", "hashed_{field}")
        .unwrap();
    let generator = Generator::new(naming, vec![BackendKind::Sql]);
    let files = vec![file("orders.proto", vec![keyed("Order"), keyed("order_view")])];
    let output = generator.generate_files(&files);

    assert_eq!(output.files.len(), 1);
    assert_eq!(output.failures.len(), 1);
    match &output.failures[0].error {
        SchemaError::TableCollision {
            message,
            name,
            first,
            second,
        } => {
            assert_eq!(message, "order_view");
            assert_eq!(name, "order_view");
            assert_eq!(first, "view of Order");
            assert_eq!(second, "sensitive table");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn case_folded_message_names_clash() {
    let files = vec![file("users.proto", vec![keyed("User"), keyed("USER")])];
    let output = sql_only().generate_files(&files);
    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].error.message(), "USER");
}

// ============================================================================
// SECTION: Ordering
// ============================================================================

#[test]
fn parallel_derivation_keeps_declaration_order() {
    let messages: Vec<MessageDescriptor> =
        (0 .. 12).map(|idx| keyed(&format!("Message{idx}"))).collect();
    let files = vec![file("many.proto", messages)];
    let content = sql_only().generate_files(&files).files.remove(0).content;
    let positions: Vec<usize> = (0 .. 12)
        .map(|idx| content.find(&format!("-- Message: Message{idx}\n")).unwrap())
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
}

// ============================================================================
// SECTION: Extra Files
// ============================================================================

#[test]
fn extra_files_are_appended_unchanged() {
    let own = vec![GeneratedFile::new("user.sdm.sql", "-- sql\n")];
    let extra = vec![
        GeneratedFile::new("user.pb.rs", "// prost\n"),
        GeneratedFile::new("README.md", "docs\n"),
    ];
    let merged = merge_extra_files(own.clone(), extra.clone()).unwrap();
    assert_eq!(merged[0], own[0]);
    assert_eq!(&merged[1 ..], extra.as_slice());
}

#[test]
fn duplicate_extra_file_is_rejected() {
    let own = vec![GeneratedFile::new("user.sdm.sql", "-- sql\n")];
    let extra = vec![GeneratedFile::new("user.sdm.sql", "-- other\n")];
    assert_eq!(
        merge_extra_files(own, extra).unwrap_err(),
        CodegenError::DuplicateFile("user.sdm.sql".to_string())
    );
}
