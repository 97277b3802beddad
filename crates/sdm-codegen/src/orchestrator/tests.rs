// crates/sdm-codegen/src/orchestrator/tests.rs
// ============================================================================
// Module: Orchestrator Tests
// Description: Unit tests for derivation thread sizing.
// Purpose: Keep worker counts bounded regardless of message count.
// Dependencies: sdm-codegen, sdm-core
// ============================================================================

//! ## Overview
//! Checks that the worker count never exceeds available parallelism and that
//! batched derivation returns one result per message in order.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use sdm_core::DefaultNaming;
use sdm_core::FieldDescriptor;
use sdm_core::MessageDescriptor;
use sdm_core::ValueType;

use super::derive_parallel;
use super::worker_count;

// ============================================================================
// SECTION: Worker Sizing
// ============================================================================

#[test]
fn worker_count_is_capped_by_available_parallelism() {
    assert_eq!(worker_count(10_000, 8), 8);
    assert_eq!(worker_count(3, 8), 3);
    assert_eq!(worker_count(0, 8), 1);
    assert_eq!(worker_count(5, 0), 1);
}

#[test]
fn batched_derivation_returns_results_in_input_order() {
    let messages: Vec<MessageDescriptor> = (0 .. 1_000)
        .map(|idx| {
            let fields = if idx % 7 == 0 {
                vec![FieldDescriptor::new("id", ValueType::Float).primary_key()]
            } else {
                vec![FieldDescriptor::new("id", ValueType::String).primary_key()]
            };
            MessageDescriptor::new(format!("Message{idx}"), fields)
        })
        .collect();
    let results = derive_parallel(&messages, &DefaultNaming);
    assert_eq!(results.len(), messages.len());
    for (idx, result) in results.iter().enumerate() {
        if idx % 7 == 0 {
            assert!(result.is_err(), "message {idx} should fail");
        } else {
            assert_eq!(result.as_ref().unwrap().message, format!("Message{idx}"));
        }
    }
}
