// crates/sdm-core/src/lib.rs
// ============================================================================
// Module: SDM Core Library
// Description: Public API surface for the SDM schema deriver.
// Purpose: Expose descriptors, classification, hashing, naming, and derivation.
// Dependencies: crate::{classify, descriptor, error, hashing, naming, schema, sql, value}
// ============================================================================

//! ## Overview
//! SDM splits one logical message into a sensitive table, an append-only
//! audit table, and a reconciling read view. This crate owns the part with
//! the design risk: classifying fields from their governance annotations,
//! deriving the three physical schemas, and rendering the SQL every consumer
//! shares. It performs no IO.
//!
//! Data flow: [`MessageDescriptor`] → [`classify_message`] → [`derive`] →
//! [`DerivedSchemas`] → [`sql::Statements`]. Each message is independent.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod classify;
pub mod descriptor;
pub mod error;
pub mod hashing;
pub mod naming;
pub mod schema;
pub mod sql;
pub mod value;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use classify::AuditMode;
pub use classify::Classification;
pub use classify::ClassificationTag;
pub use classify::ClassifiedField;
pub use classify::ClassifiedMessage;
pub use classify::classify;
pub use classify::classify_message;
pub use descriptor::FieldDescriptor;
pub use descriptor::FieldOptions;
pub use descriptor::MessageDescriptor;
pub use descriptor::SchemaFile;
pub use descriptor::ValueType;
pub use error::DescriptorError;
pub use error::RenderError;
pub use error::SchemaError;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::digest;
pub use naming::DefaultNaming;
pub use naming::NamingConvention;
pub use naming::TemplateNaming;
pub use schema::AuditEntry;
pub use schema::AuditTableSchema;
pub use schema::AuditValue;
pub use schema::Column;
pub use schema::DerivedSchemas;
pub use schema::SensitiveTableSchema;
pub use schema::ViewColumn;
pub use schema::ViewSchema;
pub use schema::ViewSource;
pub use schema::derive;
pub use schema::derive_classified;
pub use value::Canonical;
pub use value::FieldValue;
pub use value::render_value;
