// system-tests/build.rs
// ============================================================================
// Module: SDM System Tests Build Script
// Description: Renders the ledger fixture into a Rust repository.
// Purpose: Compile generated repository code as part of this crate.
// Dependencies: sdm-codegen, sdm-core
// ============================================================================

//! ## Overview
//! Reads `fixtures/ledger.json`, runs the Rust backend over it, and writes
//! the result into `OUT_DIR`, where `src/lib.rs` includes it.

#![allow(clippy::print_stdout, reason = "Cargo reads build directives from stdout.")]

use std::env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use sdm_codegen::BackendKind;
use sdm_codegen::Generator;
use sdm_core::DefaultNaming;
use sdm_core::SchemaFile;

/// Descriptor fixture rendered by this script.
const FIXTURE: &str = "fixtures/ledger.json";

/// Renders the fixture into `OUT_DIR`.
fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed={FIXTURE}");
    let schema = SchemaFile::from_json_slice(&fs::read(FIXTURE)?)?;
    let generator = Generator::new(DefaultNaming, vec![BackendKind::Rust]);
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    for file in generator.generate_files(&[schema]).into_result()? {
        fs::write(out_dir.join(&file.name), file.content)?;
    }
    Ok(())
}
