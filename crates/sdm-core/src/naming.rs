// crates/sdm-core/src/naming.rs
// ============================================================================
// Module: SDM Naming
// Description: Overridable derivation of storage names from message names.
// Purpose: Keep derived names injectable so collisions are testable.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every derived name (sensitive table, audit table, view, hashed audit field)
//! comes from a [`NamingConvention`]. [`DefaultNaming`] yields
//! `<Message>Pii`, `<Message>Chain`, `<message>_view` and `hashed_<field>`;
//! [`TemplateNaming`] renders the same names from configurable templates.
//!
//! Derived names end up inside SQL and Rust source, so they must pass
//! [`validate_identifier`] before use.

use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum identifier length accepted for any derived name.
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Template placeholder for the message name as declared.
pub const MESSAGE_PLACEHOLDER: &str = "{Message}";
/// Template placeholder for the `snake_case` message name.
pub const SNAKE_MESSAGE_PLACEHOLDER: &str = "{message}";
/// Template placeholder for the field name.
pub const FIELD_PLACEHOLDER: &str = "{field}";

// ============================================================================
// SECTION: Naming Convention
// ============================================================================

/// Pure mapping from logical names to derived storage names.
pub trait NamingConvention: Send + Sync {
    /// Returns the sensitive table name for a message.
    fn sensitive_table(&self, message: &str) -> String;

    /// Returns the audit table name for a message.
    fn audit_table(&self, message: &str) -> String;

    /// Returns the view name for a message.
    fn view(&self, message: &str) -> String;

    /// Returns the audit row name for a hashed field.
    fn hashed_field(&self, field: &str) -> String;
}

/// Built-in naming: `<Message>Pii`, `<Message>Chain`, `<message>_view`, `hashed_<field>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultNaming;

impl NamingConvention for DefaultNaming {
    fn sensitive_table(&self, message: &str) -> String {
        format!("{message}Pii")
    }

    fn audit_table(&self, message: &str) -> String {
        format!("{message}Chain")
    }

    fn view(&self, message: &str) -> String {
        format!("{}_view", snake_case(message))
    }

    fn hashed_field(&self, field: &str) -> String {
        format!("hashed_{field}")
    }
}

// ============================================================================
// SECTION: Template Naming
// ============================================================================

/// Errors raised when a naming template is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamingError {
    /// Template lacks a required placeholder.
    #[error("naming template {template:?} must contain {placeholder}")]
    MissingPlaceholder {
        /// Offending template.
        template: String,
        /// Required placeholder.
        placeholder: String,
    },
}

/// Naming convention rendered from string templates.
///
/// # Invariants
/// - Table and view templates contain `{Message}` or `{message}`.
/// - The hashed field template contains `{field}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateNaming {
    /// Sensitive table template.
    sensitive_table: String,
    /// Audit table template.
    audit_table: String,
    /// View template.
    view: String,
    /// Hashed field template.
    hashed_field: String,
}

impl TemplateNaming {
    /// Builds a template naming convention.
    ///
    /// # Errors
    ///
    /// Returns [`NamingError`] when a template lacks its placeholder.
    pub fn new(
        sensitive_table: impl Into<String>,
        audit_table: impl Into<String>,
        view: impl Into<String>,
        hashed_field: impl Into<String>,
    ) -> Result<Self, NamingError> {
        let naming = Self {
            sensitive_table: sensitive_table.into(),
            audit_table: audit_table.into(),
            view: view.into(),
            hashed_field: hashed_field.into(),
        };
        for template in [&naming.sensitive_table, &naming.audit_table, &naming.view] {
            if !template.contains(MESSAGE_PLACEHOLDER)
                && !template.contains(SNAKE_MESSAGE_PLACEHOLDER)
            {
                return Err(NamingError::MissingPlaceholder {
                    template: template.clone(),
                    placeholder: MESSAGE_PLACEHOLDER.to_string(),
                });
            }
        }
        if !naming.hashed_field.contains(FIELD_PLACEHOLDER) {
            return Err(NamingError::MissingPlaceholder {
                template: naming.hashed_field.clone(),
                placeholder: FIELD_PLACEHOLDER.to_string(),
            });
        }
        Ok(naming)
    }

    /// Renders a message-level template.
    fn render_message(template: &str, message: &str) -> String {
        template
            .replace(MESSAGE_PLACEHOLDER, message)
            .replace(SNAKE_MESSAGE_PLACEHOLDER, &snake_case(message))
    }
}

impl Default for TemplateNaming {
    fn default() -> Self {
        Self {
            sensitive_table: "{Message}Pii".to_string(),
            audit_table: "{Message}Chain".to_string(),
            view: "{message}_view".to_string(),
            hashed_field: "hashed_{field}".to_string(),
        }
    }
}

impl NamingConvention for TemplateNaming {
    fn sensitive_table(&self, message: &str) -> String {
        Self::render_message(&self.sensitive_table, message)
    }

    fn audit_table(&self, message: &str) -> String {
        Self::render_message(&self.audit_table, message)
    }

    fn view(&self, message: &str) -> String {
        Self::render_message(&self.view, message)
    }

    fn hashed_field(&self, field: &str) -> String {
        self.hashed_field.replace(FIELD_PLACEHOLDER, field)
    }
}

// ============================================================================
// SECTION: Case Helpers
// ============================================================================

/// Converts a `PascalCase` or `camelCase` identifier into `snake_case`.
#[must_use]
pub fn snake_case(value: &str) -> String {
    let mut output = String::with_capacity(value.len() + 4);
    let mut prev_lower_or_digit = false;
    for ch in value.chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower_or_digit {
                output.push('_');
            }
            output.push(ch.to_ascii_lowercase());
            prev_lower_or_digit = false;
        } else {
            output.push(ch);
            prev_lower_or_digit = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        }
    }
    output
}

/// Converts a `snake_case` identifier into `PascalCase`.
#[must_use]
pub fn pascal_case(value: &str) -> String {
    let mut output = String::new();
    for segment in value.split('_') {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            output.push(first.to_ascii_uppercase());
            output.extend(chars);
        }
    }
    output
}

/// Checks that a name is safe to embed as a SQL and Rust identifier.
///
/// # Errors
///
/// Returns a human-readable reason when the name is rejected.
pub fn validate_identifier(name: &str) -> Result<(), String> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err("identifier must not be empty".to_string());
    };
    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(format!("identifier exceeds {MAX_IDENTIFIER_LENGTH} characters"));
    }
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err("identifier must start with a letter or underscore".to_string());
    }
    if !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err("identifier may only contain ascii letters, digits, and underscores".to_string());
    }
    Ok(())
}
