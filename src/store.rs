//! Atomic document I/O.
//!
//! All catalog documents are written with temp-file-then-rename so the
//! read-only web layer never observes a half-written document, and are made
//! world-readable after every write. Documents are pretty-printed with
//! 4-space indentation to stay diffable and human-inspectable.

use crate::error::CatalogError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic per-process staging sequence; combined with the pid it makes
/// every staging name unique across processes and threads alike.
static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// Serialize `value` as indented JSON and atomically replace `path` with it.
///
/// Parent directories are created as needed. The staging name carries the
/// writer's pid and a per-process sequence number so concurrent writers of
/// the same document never collide on it.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), CatalogError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|source| CatalogError::SerializeFailed {
            path: path.to_path_buf(),
            source,
        })?;

    let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
    let temp_path =
        path.with_extension(format!("json.{}.{}.tmp", std::process::id(), seq));
    fs::write(&temp_path, &buf)?;

    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }

    make_world_readable(path)?;
    Ok(())
}

/// Read and parse a JSON document. Returns `None` when the file is absent.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, CatalogError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| CatalogError::MalformedDocument {
            path: path.to_path_buf(),
            source,
        })
}

/// Set 0644 so the external web server can serve the document directly.
#[cfg(unix)]
fn make_world_readable(path: &Path) -> Result<(), CatalogError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o644))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_world_readable(_path: &Path) -> Result<(), CatalogError> {
    Ok(())
}
