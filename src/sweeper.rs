//! Retention Sweeper
//!
//! Periodic cleanup over one module's catalog root: run frame lists older
//! than the retention threshold are deleted together with the run's frame
//! image directory. Satellite imagery ages out at half the normal
//! retention; long-retention products are kept for a full year. Run files
//! whose names do not parse as run stamps are corrupt state and are deleted
//! outright. Missing target directories are tolerated so a partially
//! cleaned catalog sweeps idempotently.

use crate::documents::{ProductDescriptor, RunFrameList};
use crate::error::CatalogError;
use crate::store;
use crate::types;
use chrono::{DateTime, Duration, Utc};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Sweep parameters.
#[derive(Debug, Clone)]
pub struct SweepOptions {
    /// Base retention for run documents and their frames.
    pub retention: Duration,
    /// Product paths containing this marker are purged at half retention.
    pub satellite_marker: String,
    /// Product descriptions containing this marker are kept for a year.
    pub long_retention_marker: String,
}

impl Default for SweepOptions {
    fn default() -> Self {
        SweepOptions {
            retention: Duration::hours(168),
            satellite_marker: "satellite".to_string(),
            long_retention_marker: "archive".to_string(),
        }
    }
}

/// What one sweep did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub purged_runs: usize,
    pub deleted_garbage: usize,
    pub kept_runs: usize,
}

/// Sweep the catalog under `root` using the current time.
pub fn sweep(root: &Path, options: &SweepOptions) -> Result<SweepReport, CatalogError> {
    sweep_at(root, options, Utc::now())
}

/// Sweep with an explicit "now", which is what the tests use.
pub fn sweep_at(
    root: &Path,
    options: &SweepOptions,
    now: DateTime<Utc>,
) -> Result<SweepReport, CatalogError> {
    let mut report = SweepReport::default();

    let metadata_dir = root.join("metadata");
    let runs_dir = metadata_dir.join("products");
    if !metadata_dir.exists() || !runs_dir.exists() {
        // Nothing published yet, nothing to clean.
        return Ok(report);
    }

    for product_entry in fs::read_dir(&runs_dir)? {
        let product_dir = product_entry?.path();
        if !product_dir.is_dir() {
            continue;
        }
        let product_name = match product_dir.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };

        let descriptor_path = metadata_dir.join(format!("{}.json", product_name));
        let descriptor = match store::read_json::<ProductDescriptor>(&descriptor_path) {
            Ok(descriptor) => descriptor,
            Err(CatalogError::MalformedDocument { .. }) => {
                // One corrupt descriptor must not stall cleanup for the rest
                // of the catalog; sweep this product at base retention.
                warn!(path = %descriptor_path.display(), "ignoring malformed product descriptor");
                None
            }
            Err(err) => return Err(err),
        };
        let threshold = retention_for(descriptor.as_ref(), options);

        for run_entry in fs::read_dir(&product_dir)? {
            let run_path = run_entry?.path();
            let stem = run_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            let run_time = match types::parse_stamp(&stem) {
                Ok(run_time) => run_time,
                Err(_) => {
                    // Not a run stamp at all: corrupt state, delete it.
                    warn!(path = %run_path.display(), "deleting unparsable run file");
                    fs::remove_file(&run_path)?;
                    report.deleted_garbage += 1;
                    continue;
                }
            };

            if run_time >= now - threshold {
                if run_path.extension().and_then(|e| e.to_str()) == Some("json") {
                    report.kept_runs += 1;
                }
                continue;
            }

            match run_path.extension().and_then(|e| e.to_str()) {
                Some("json") => {
                    purge_run(root, descriptor.as_ref(), &run_path)?;
                    report.purged_runs += 1;
                }
                Some("lock") => {
                    // A marker old enough to age past retention was
                    // abandoned by a crashed writer long ago.
                    warn!(path = %run_path.display(), "removing abandoned run lock");
                    fs::remove_file(&run_path)?;
                    report.deleted_garbage += 1;
                }
                _ => {
                    fs::remove_file(&run_path)?;
                    report.deleted_garbage += 1;
                }
            }
        }
    }

    Ok(report)
}

fn retention_for(descriptor: Option<&ProductDescriptor>, options: &SweepOptions) -> Duration {
    let descriptor = match descriptor {
        Some(descriptor) => descriptor,
        None => return options.retention,
    };
    if descriptor
        .description
        .contains(&options.long_retention_marker)
    {
        return Duration::days(365);
    }
    if descriptor.path.contains(&options.satellite_marker) {
        return options.retention / 2;
    }
    options.retention
}

/// Delete one stale run: its frame image directory first, then the run
/// document itself.
fn purge_run(
    root: &Path,
    descriptor: Option<&ProductDescriptor>,
    run_path: &Path,
) -> Result<(), CatalogError> {
    let run_list = match store::read_json::<RunFrameList>(run_path) {
        Ok(list) => list,
        Err(CatalogError::MalformedDocument { .. }) => {
            warn!(path = %run_path.display(), "deleting malformed run document");
            None
        }
        Err(err) => return Err(err),
    };

    if let (Some(descriptor), Some(run_list)) = (descriptor, run_list.as_ref()) {
        // Rolling-directory products share one frame directory across runs;
        // only dated run directories are safe to remove wholesale.
        if !run_list.path_extension.is_empty() {
            let frames_dir = root.join(&descriptor.path).join(&run_list.path_extension);
            match fs::remove_dir_all(&frames_dir) {
                Ok(()) => debug!(path = %frames_dir.display(), "purged frame directory"),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
    }

    fs::remove_file(run_path)?;
    Ok(())
}
