// crates/sdm-config/src/template.rs
// ============================================================================
// Module: SDM Config Template
// Description: Commented starter `sdm.toml`.
// Purpose: Give `sdm config` a documented, valid default file to write.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Every key is spelled out with its default value, so the written file
//! loads and validates before any edit.

/// Returns a commented `sdm.toml` that loads with default settings.
#[must_use]
pub fn config_template() -> String {
    String::from(
        r#"# sdm.toml
# Configuration for the sdm repository generator.

# Descriptor JSON files to generate from. Relative paths resolve against
# the directory containing this file.
schema_files = []

# Output directory for generated files.
output = "generated"

# Backends to run: "sql" (DDL) and "rust" (rusqlite repositories).
# An empty list selects every backend.
backends = ["sql", "rust"]

# JSON files holding arrays of {name, content} objects, appended unchanged
# after generated output. Duplicate paths are rejected.
extra_files = []

[naming]
# {Message} is the message name as declared; {message} is its snake_case form.
sensitive_table = "{Message}Pii"
audit_table = "{Message}Chain"
view = "{message}_view"
# {field} is the field name.
hashed_field = "hashed_{field}"
"#,
    )
}
