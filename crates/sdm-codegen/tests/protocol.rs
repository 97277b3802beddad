// crates/sdm-codegen/tests/protocol.rs
// ============================================================================
// Module: Plugin Protocol Tests
// Description: JSON request/response handling over byte streams.
// Purpose: Validate success, failure reporting, and fail-closed parsing.
// Dependencies: sdm-codegen, sdm-core, serde_json
// ============================================================================

//! ## Overview
//! Runs [`sdm_codegen::protocol::run_plugin`] against in-memory streams.

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

use sdm_codegen::GeneratedFile;
use sdm_codegen::Generator;
use sdm_codegen::protocol::GenerateRequest;
use sdm_codegen::protocol::GenerateResponse;
use sdm_codegen::protocol::handle_request;
use sdm_codegen::protocol::run_plugin;
use sdm_core::FieldDescriptor;
use sdm_core::MessageDescriptor;
use sdm_core::SchemaFile;
use sdm_core::ValueType;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn request(messages: Vec<MessageDescriptor>) -> GenerateRequest {
    GenerateRequest {
        files_to_generate: vec!["user.proto".to_string()],
        schema_files: vec![SchemaFile {
            name: "user.proto".to_string(),
            package: None,
            messages,
        }],
        parameter: None,
        extra_files: Vec::new(),
    }
}

fn user() -> MessageDescriptor {
    MessageDescriptor::new("User", vec![
        FieldDescriptor::new("id", ValueType::String).primary_key().audited(),
        FieldDescriptor::new("ssn", ValueType::Int64).sensitive(),
    ])
}

fn run(input: &[u8]) -> (GenerateResponse, GenerateResponse) {
    let mut out = Vec::new();
    let returned = run_plugin(&Generator::default(), input, &mut out).unwrap();
    assert_eq!(out.last(), Some(&b'\n'));
    let written: GenerateResponse = serde_json::from_slice(&out).unwrap();
    (returned, written)
}

// ============================================================================
// SECTION: Success
// ============================================================================

#[test]
fn plugin_round_trip_returns_generated_and_extra_files() {
    let mut req = request(vec![user()]);
    req.extra_files.push(GeneratedFile::new("user.pb.rs", "// prost\n"));
    let (returned, written) = run(&serde_json::to_vec(&req).unwrap());

    assert_eq!(returned, written);
    assert!(written.error.is_none());
    let names: Vec<&str> = written.files.iter().map(|file| file.name.as_str()).collect();
    assert_eq!(names, vec!["user.sdm.sql", "user_sdm_repo.rs", "user.pb.rs"]);
}

#[test]
fn parameter_selects_backends() {
    let mut req = request(vec![user()]);
    req.parameter = Some("rust".to_string());
    let response = handle_request(&Generator::default(), req);
    assert!(response.error.is_none());
    assert_eq!(response.files.len(), 1);
    assert_eq!(response.files[0].name, "user_sdm_repo.rs");
}

#[test]
fn success_response_omits_error_field() {
    let (_, written) = run(&serde_json::to_vec(&request(vec![user()])).unwrap());
    let value = serde_json::to_value(&written).unwrap();
    assert!(value.get("error").is_none());
}

// ============================================================================
// SECTION: Failures
// ============================================================================

#[test]
fn broken_message_fails_whole_response() {
    let broken = MessageDescriptor::new("Broken", vec![
        FieldDescriptor::new("a", ValueType::String).primary_key(),
        FieldDescriptor::new("b", ValueType::String).primary_key(),
    ]);
    let response = handle_request(&Generator::default(), request(vec![user(), broken]));
    assert!(response.files.is_empty());
    let error = response.error.unwrap();
    assert!(error.contains("Broken"));
    assert!(error.contains("user.proto"));
}

#[test]
fn unknown_backend_parameter_is_reported() {
    let mut req = request(vec![user()]);
    req.parameter = Some("sql,cobol".to_string());
    let response = handle_request(&Generator::default(), req);
    assert!(response.files.is_empty());
    assert!(response.error.unwrap().contains("cobol"));
}

#[test]
fn duplicate_extra_file_is_reported() {
    let mut req = request(vec![user()]);
    req.extra_files.push(GeneratedFile::new("user.sdm.sql", "-- other\n"));
    let response = handle_request(&Generator::default(), req);
    assert!(response.files.is_empty());
    assert!(response.error.unwrap().contains("user.sdm.sql"));
}

#[test]
fn malformed_request_yields_error_response() {
    let (returned, written) = run(b"{ not json");
    assert_eq!(returned, written);
    assert!(written.files.is_empty());
    assert!(written.error.is_some());
}

#[test]
fn unknown_request_fields_are_rejected() {
    let (_, written) = run(br#"{"files_to_generate": [], "compiler_version": "3.21"}"#);
    assert!(written.error.is_some());
}

#[test]
fn empty_request_generates_nothing() {
    let (_, written) = run(b"{}");
    assert!(written.error.is_none());
    assert!(written.files.is_empty());
}
