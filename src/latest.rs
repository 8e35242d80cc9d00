//! "latest" run symlinks.
//!
//! Legacy viewers expect a `latest` symlink at each product's image root
//! pointing at the most recent run's dated directory. Rolling-directory
//! products (empty path extension) already serve from a fixed location and
//! are skipped.

use crate::documents::{ProductDescriptor, RunFrameList};
use crate::error::CatalogError;
use crate::store;
use crate::types::ProductId;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Point `<root>/<productPath>/latest` at the product's most recent run.
///
/// Returns the refreshed link path, or `None` when the product has no
/// published runs or serves from a rolling directory. No-op off unix.
pub fn refresh_latest_link(
    root: &Path,
    product_id: ProductId,
) -> Result<Option<PathBuf>, CatalogError> {
    let metadata_dir = root.join("metadata");
    let descriptor_path = metadata_dir.join(format!("{}.json", product_id));
    let descriptor = match store::read_json::<ProductDescriptor>(&descriptor_path)? {
        Some(descriptor) => descriptor,
        None => return Ok(None),
    };

    let run_dir = metadata_dir.join("products").join(product_id.to_string());
    let latest_run = match latest_run_document(&run_dir)? {
        Some(path) => path,
        None => return Ok(None),
    };
    let run_list = match store::read_json::<RunFrameList>(&latest_run)? {
        Some(list) => list,
        None => return Ok(None),
    };
    if run_list.path_extension.is_empty() {
        return Ok(None);
    }

    let product_root = root.join(&descriptor.path);
    fs::create_dir_all(&product_root)?;
    let link = product_root.join("latest");
    replace_symlink(&run_list.path_extension, &link)?;
    debug!(product = product_id, target = %run_list.path_extension, "refreshed latest link");
    Ok(Some(link))
}

/// The run document with the greatest run key, which is the newest run since
/// keys are zero-padded `YYYYMMDDHH00` stamps.
fn latest_run_document(run_dir: &Path) -> Result<Option<PathBuf>, CatalogError> {
    let entries = match fs::read_dir(run_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    let mut runs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    runs.sort();
    Ok(runs.pop())
}

#[cfg(unix)]
fn replace_symlink(target: &str, link: &Path) -> Result<(), CatalogError> {
    match fs::remove_file(link) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }
    std::os::unix::fs::symlink(target, link)?;
    Ok(())
}

#[cfg(not(unix))]
fn replace_symlink(_target: &str, _link: &Path) -> Result<(), CatalogError> {
    Ok(())
}
