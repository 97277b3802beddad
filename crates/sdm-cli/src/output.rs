// crates/sdm-cli/src/output.rs
// ============================================================================
// Module: SDM CLI Output
// Description: Atomic writing and drift checking of generated files.
// Purpose: Persist generator output without leaving partial files behind.
// Dependencies: sdm-codegen, tracing
// ============================================================================

//! ## Overview
//! Each file is written to a unique temporary sibling, synced, then renamed
//! over the destination. Generated names are relative paths with `/`
//! separators; anything absolute or containing `..` is rejected before any
//! file is touched.

use std::fs;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use sdm_codegen::GeneratedFile;
use tracing::info;

use crate::error::CliError;
use crate::error::CliResult;

// ============================================================================
// SECTION: Batch Operations
// ============================================================================

/// Writes every file under `out_dir`, returning the written paths.
///
/// All destination paths are validated before the first write.
///
/// # Errors
///
/// Returns [`CliError`] on an unsafe name or a filesystem failure.
pub fn write_outputs(out_dir: &Path, files: &[GeneratedFile]) -> CliResult<Vec<PathBuf>> {
    let targets = files
        .iter()
        .map(|file| output_path(out_dir, &file.name))
        .collect::<CliResult<Vec<_>>>()?;
    for (path, file) in targets.iter().zip(files) {
        write_output(path, &file.content)?;
        info!(path = %path.display(), bytes = file.content.len(), "wrote file");
    }
    Ok(targets)
}

/// Compares every file under `out_dir` with freshly generated content.
///
/// # Errors
///
/// Returns [`CliError::Drift`] naming each missing or stale file.
pub fn check_outputs(out_dir: &Path, files: &[GeneratedFile]) -> CliResult<()> {
    let mut drifted = Vec::new();
    for file in files {
        let path = output_path(out_dir, &file.name)?;
        match fs::read_to_string(&path) {
            Ok(existing) if existing == file.content => {}
            Ok(_) => drifted.push(file.name.clone()),
            Err(err) if err.kind() == ErrorKind::NotFound => drifted.push(file.name.clone()),
            Err(err) => return Err(CliError::io(&path, &err)),
        }
    }
    if drifted.is_empty() { Ok(()) } else { Err(CliError::Drift(drifted)) }
}

/// Joins a generated file name onto the output directory.
///
/// # Errors
///
/// Returns [`CliError::UnsafePath`] for empty, absolute, or `..` names.
pub fn output_path(out_dir: &Path, name: &str) -> CliResult<PathBuf> {
    let relative = Path::new(name);
    let mut normal = 0_usize;
    for component in relative.components() {
        match component {
            Component::Normal(_) => normal += 1,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(CliError::UnsafePath(name.to_string()));
            }
        }
    }
    if normal == 0 || name.contains('\\') {
        return Err(CliError::UnsafePath(name.to_string()));
    }
    Ok(out_dir.join(relative))
}

// ============================================================================
// SECTION: Single File
// ============================================================================

/// Writes `contents` to `path` through a temporary file and rename.
///
/// On platforms without atomic replace, this falls back to remove-and-rename.
///
/// # Errors
///
/// Returns [`CliError::Io`] when any filesystem step fails.
pub fn write_output(path: &Path, contents: &str) -> CliResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| CliError::io(parent, &err))?;
    }
    let (temp_path, mut file) = create_temp_output(path)?;
    if let Err(err) = file.write_all(contents.as_bytes()).and_then(|()| file.sync_all()) {
        let _ = fs::remove_file(&temp_path);
        return Err(CliError::io(&temp_path, &err));
    }
    drop(file);
    persist_temp_output(&temp_path, path)
}

/// Attempts made to allocate a unique temporary name.
const TEMP_ATTEMPTS: usize = 16;
/// Per-process counter that keeps temporary names unique.
static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Creates a unique temporary output file alongside the destination.
fn create_temp_output(path: &Path) -> CliResult<(PathBuf, fs::File)> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| CliError::UnsafePath(path.display().to_string()))?;
    for _ in 0 .. TEMP_ATTEMPTS {
        let attempt = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let temp_path = parent.join(format!(".{file_name}.tmp.{}.{attempt}", std::process::id()));
        match OpenOptions::new().write(true).create_new(true).open(&temp_path) {
            Ok(file) => return Ok((temp_path, file)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {}
            Err(err) => return Err(CliError::io(&temp_path, &err)),
        }
    }
    Err(CliError::Io {
        path: path.display().to_string(),
        error: "failed to allocate temporary output path".to_string(),
    })
}

/// Moves the temporary file over the destination.
fn persist_temp_output(temp_path: &Path, path: &Path) -> CliResult<()> {
    match fs::rename(temp_path, path) {
        Ok(()) => Ok(()),
        Err(err) => {
            if path.exists() {
                fs::remove_file(path).map_err(|err| CliError::io(path, &err))?;
                fs::rename(temp_path, path).map_err(|err| CliError::io(path, &err))?;
                return Ok(());
            }
            let _ = fs::remove_file(temp_path);
            Err(CliError::io(path, &err))
        }
    }
}
