// crates/sdm-codegen/src/orchestrator.rs
// ============================================================================
// Module: SDM Orchestrator
// Description: Drives derivation and emission across schema files.
// Purpose: Generate every requested file while isolating per-message failures.
// Dependencies: sdm-core, tracing, crate::{backend, error, output}
// ============================================================================

//! ## Overview
//! For each requested schema file, messages are derived in parallel and
//! collected back in declaration order. Messages are split into contiguous
//! batches, one scoped thread per batch, with at most as many threads as the
//! host reports available parallelism; threads share no mutable state. Derived table and view names must
//! also be unique across the messages of one file; the later message of a
//! clashing pair fails. Each backend then renders one file from the messages
//! that succeeded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::panic;
use std::sync::Arc;
use std::thread;

use sdm_core::DefaultNaming;
use sdm_core::DerivedSchemas;
use sdm_core::MessageDescriptor;
use sdm_core::NamingConvention;
use sdm_core::SchemaError;
use sdm_core::SchemaFile;
use sdm_core::derive;
use tracing::info;
use tracing::warn;

use crate::backend::BackendKind;
use crate::error::CodegenError;
use crate::output::GeneratedFile;
use crate::output::GenerationOutput;
use crate::output::MessageFailure;

// ============================================================================
// SECTION: Generator
// ============================================================================

/// Repository generator configured with a naming convention and backends.
///
/// # Invariants
/// - Output order is request order, then backend order.
/// - Rendering is deterministic for fixed inputs.
///
/// # Examples
/// ```
/// use sdm_codegen::BackendKind;
/// use sdm_codegen::Generator;
/// use sdm_core::FieldDescriptor;
/// use sdm_core::MessageDescriptor;
/// use sdm_core::SchemaFile;
/// use sdm_core::ValueType;
///
/// let file = SchemaFile {
///     name: "user.proto".to_string(),
///     package: None,
///     messages: vec![MessageDescriptor::new(
///         "User",
///         vec![FieldDescriptor::new("id", ValueType::String).primary_key()],
///     )],
/// };
/// let generator = Generator::default().with_backends(vec![BackendKind::Sql]);
/// let output = generator.generate_files(std::slice::from_ref(&file));
/// assert!(output.is_complete());
/// assert_eq!(output.files[0].name, "user.sdm.sql");
/// ```
#[derive(Clone)]
pub struct Generator {
    /// Naming convention for derived tables, views, and hashed fields.
    naming: Arc<dyn NamingConvention>,
    /// Selected backends in output order.
    backends: Vec<BackendKind>,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(DefaultNaming, BackendKind::ALL.to_vec())
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator").field("backends", &self.backends).finish_non_exhaustive()
    }
}

impl Generator {
    /// Creates a generator.
    #[must_use]
    pub fn new(naming: impl NamingConvention + 'static, backends: Vec<BackendKind>) -> Self {
        Self {
            naming: Arc::new(naming),
            backends,
        }
    }

    /// Returns the generator with a different backend selection.
    #[must_use]
    pub fn with_backends(mut self, backends: Vec<BackendKind>) -> Self {
        self.backends = backends;
        self
    }

    /// Returns the selected backends.
    #[must_use]
    pub fn backends(&self) -> &[BackendKind] {
        &self.backends
    }

    /// Generates the files named in `files_to_generate`.
    ///
    /// `schema_files` may include files that are only dependencies; they are
    /// not generated.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::MissingFile`] when a requested file is not
    /// among `schema_files`. Per-message problems are reported in
    /// [`GenerationOutput::failures`] instead.
    pub fn generate(
        &self,
        files_to_generate: &[String],
        schema_files: &[SchemaFile],
    ) -> Result<GenerationOutput, CodegenError> {
        let by_name: BTreeMap<&str, &SchemaFile> =
            schema_files.iter().map(|file| (file.name.as_str(), file)).collect();
        let mut requested = Vec::with_capacity(files_to_generate.len());
        for name in files_to_generate {
            let file = by_name
                .get(name.as_str())
                .ok_or_else(|| CodegenError::MissingFile(name.clone()))?;
            requested.push(*file);
        }
        Ok(self.generate_all(&requested))
    }

    /// Generates every file in `schema_files`.
    #[must_use]
    pub fn generate_files(&self, schema_files: &[SchemaFile]) -> GenerationOutput {
        let requested: Vec<&SchemaFile> = schema_files.iter().collect();
        self.generate_all(&requested)
    }

    /// Generates the given files in order.
    fn generate_all(&self, files: &[&SchemaFile]) -> GenerationOutput {
        let mut output = GenerationOutput::default();
        for file in files {
            let (derived, failures) = self.derive_file(file);
            for failure in &failures {
                warn!(file = %failure.file, error = %failure.error, "message failed derivation");
            }
            output.failures.extend(failures);
            if derived.is_empty() {
                continue;
            }
            for kind in &self.backends {
                let backend = kind.backend();
                let generated =
                    GeneratedFile::new(backend.file_name(file), backend.render_file(file, &derived));
                info!(
                    file = %generated.name,
                    backend = %kind,
                    messages = derived.len(),
                    "generated file"
                );
                output.files.push(generated);
            }
        }
        output
    }

    /// Derives every message of one file, isolating failures.
    fn derive_file(&self, file: &SchemaFile) -> (Vec<DerivedSchemas>, Vec<MessageFailure>) {
        let naming: &dyn NamingConvention = self.naming.as_ref();
        let results = derive_parallel(&file.messages, naming);

        let mut derived = Vec::new();
        let mut failures = Vec::new();
        let mut owners: BTreeMap<String, (String, &'static str)> = BTreeMap::new();
        for result in results {
            let schemas = match result {
                Ok(schemas) => schemas,
                Err(error) => {
                    failures.push(MessageFailure {
                        file: file.name.clone(),
                        error,
                    });
                    continue;
                }
            };
            if let Some(error) = claim_names(&mut owners, &schemas) {
                failures.push(MessageFailure {
                    file: file.name.clone(),
                    error,
                });
                continue;
            }
            derived.push(schemas);
        }
        (derived, failures)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Worker count used when the host cannot report its parallelism.
const FALLBACK_WORKERS: usize = 4;

/// Derives messages on scoped threads, returning results in input order.
fn derive_parallel(
    messages: &[MessageDescriptor],
    naming: &dyn NamingConvention,
) -> Vec<Result<DerivedSchemas, SchemaError>> {
    let available = thread::available_parallelism().map_or(FALLBACK_WORKERS, NonZeroUsize::get);
    let workers = worker_count(messages.len(), available);
    if workers <= 1 {
        return messages.iter().map(|message| derive(message, naming)).collect();
    }
    thread::scope(|scope| {
        let handles: Vec<_> = messages
            .chunks(messages.len().div_ceil(workers))
            .map(|batch| {
                scope.spawn(move || {
                    batch.iter().map(|message| derive(message, naming)).collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
            .collect()
    })
}

/// Returns the number of derivation threads for `messages` inputs.
fn worker_count(messages: usize, available: usize) -> usize {
    available.min(messages).max(1)
}

/// Records the table and view names of `schemas`, reporting a clash with an
/// earlier message of the same file.
fn claim_names(
    owners: &mut BTreeMap<String, (String, &'static str)>,
    schemas: &DerivedSchemas,
) -> Option<SchemaError> {
    let objects = [
        ("sensitive table", &schemas.sensitive.table),
        ("audit table", &schemas.audit.table),
        ("view", &schemas.view.name),
    ];
    for (kind, name) in objects {
        if let Some((owner, owner_kind)) = owners.get(&name.to_ascii_lowercase()) {
            return Some(SchemaError::TableCollision {
                message: schemas.message.clone(),
                name: name.clone(),
                first: format!("{owner_kind} of {owner}"),
                second: kind.to_string(),
            });
        }
    }
    for (kind, name) in objects {
        owners.insert(name.to_ascii_lowercase(), (schemas.message.clone(), kind));
    }
    None
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
