//! Frame Catalog Writer
//!
//! The concurrency-critical core: recording one rendered frame updates three
//! cooperating documents under the catalog root. The product descriptor is
//! an idempotent full overwrite, the per-run frame list is a locked
//! read-modify-write, and the product-type aggregate is refreshed last.
//!
//! Every invocation re-reads the on-disk state before mutating it; the
//! filesystem is the single source of truth and writers carry no state
//! between calls. Producers for different products never contend, but
//! overlapping writers of one (product, run) pair are serialized by the
//! run lock.

use crate::documents::{Frame, ProductDescriptor, ProductTypeAggregate, RunFrameList};
use crate::error::CatalogError;
use crate::lock::{LockOptions, RunLock};
use crate::registry::{self, ProductDescription};
use crate::store;
use crate::types::{self, GeoBounds, ProductId, ProductTypeId};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Everything a producer knows about one freshly rendered frame.
#[derive(Debug, Clone)]
pub struct FrameRecord {
    pub product_id: ProductId,
    /// Run this frame belongs to; truncated to the hour for the run key.
    pub run_time: DateTime<Utc>,
    /// Image filename, unique within the run.
    pub filename: String,
    /// Time the frame is valid for.
    pub valid_time: DateTime<Utc>,
    pub gis_info: GeoBounds,
    /// Seconds before the next frame is expected.
    pub reload_interval: u64,
}

/// Writer bound to one module's catalog root.
#[derive(Debug, Clone)]
pub struct CatalogWriter {
    base: PathBuf,
    lock_options: LockOptions,
}

impl CatalogWriter {
    pub fn new<P: AsRef<Path>>(base: P) -> Self {
        CatalogWriter {
            base: base.as_ref().to_path_buf(),
            lock_options: LockOptions::default(),
        }
    }

    /// Override lock acquisition parameters (deadline, poll interval, stale
    /// policy).
    pub fn with_lock_options(mut self, lock_options: LockOptions) -> Self {
        self.lock_options = lock_options;
        self
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Record one frame in the catalog.
    ///
    /// Fails fast with `UnknownProduct` before any document is touched. Any
    /// error inside the locked section still releases the run lock before
    /// propagating.
    pub fn record_frame(&self, record: &FrameRecord) -> Result<(), CatalogError> {
        let publish_time = Utc::now();
        let desc = registry::describe(record.product_id, record.run_time)?;

        debug!(
            product = record.product_id,
            run = %types::run_key(record.run_time),
            filename = %record.filename,
            "recording frame"
        );

        let descriptor = self.build_descriptor(&desc, record, publish_time);
        let metadata_dir = self.base.join("metadata");

        // Step 1: descriptor overwrite, last-writer-wins.
        let descriptor_path = metadata_dir.join(format!("{}.json", record.product_id));
        store::write_json_atomic(&descriptor_path, &descriptor)?;

        // Step 2: locked run-list read-modify-write.
        self.update_run_list(&metadata_dir, &desc, record, publish_time)?;

        // Step 3: product-type aggregate refresh, under a per-type lock so
        // concurrent writers of sibling products cannot lose updates.
        self.update_aggregate(&metadata_dir, desc.product_type_id, descriptor)?;

        info!(
            product = record.product_id,
            run = %types::run_key(record.run_time),
            filename = %record.filename,
            "frame recorded"
        );
        Ok(())
    }

    fn build_descriptor(
        &self,
        desc: &ProductDescription,
        record: &FrameRecord,
        publish_time: DateTime<Utc>,
    ) -> ProductDescriptor {
        ProductDescriptor {
            product_id: desc.product_id,
            description: desc.description.clone(),
            path: desc.path.clone(),
            reload_interval: record.reload_interval,
            last_reload: publish_time,
            is_forecast: desc.is_forecast,
            is_gis: record.gis_info.is_georeferenced(),
            file_extension: desc.file_extension.clone(),
            display_frames: desc.display_frames,
        }
    }

    fn update_run_list(
        &self,
        metadata_dir: &Path,
        desc: &ProductDescription,
        record: &FrameRecord,
        publish_time: DateTime<Utc>,
    ) -> Result<(), CatalogError> {
        let run_dir = metadata_dir
            .join("products")
            .join(record.product_id.to_string());
        fs::create_dir_all(&run_dir)?;

        let run_key = types::run_key(record.run_time);
        let list_path = run_dir.join(format!("{}.json", run_key));
        let lock_path = run_dir.join(format!("{}.lock", run_key));

        // The guard's Drop removes the marker on success and on every error
        // path out of the critical section below.
        let _lock = RunLock::acquire(&lock_path, &self.lock_options)?;

        let mut list = store::read_json::<RunFrameList>(&list_path)?.unwrap_or_else(|| {
            RunFrameList::new(
                publish_time,
                self.path_extension(desc, record.run_time),
                types::run_label(record.run_time),
            )
        });

        list.publish_time = publish_time;
        list.upsert_frame(Frame {
            forecast_hour: forecast_hour(desc, record),
            filename: record.filename.clone(),
            gis_info: record.gis_info.clone(),
            valid: record.valid_time,
            publish_time,
        });
        list.resolve_total(desc.total_frame_count);

        store::write_json_atomic(&list_path, &list)
    }

    fn update_aggregate(
        &self,
        metadata_dir: &Path,
        product_type_id: ProductTypeId,
        descriptor: ProductDescriptor,
    ) -> Result<(), CatalogError> {
        let types_dir = metadata_dir.join("productTypes");
        fs::create_dir_all(&types_dir)?;

        let aggregate_path = types_dir.join(format!("{}.json", product_type_id));
        let lock_path = types_dir.join(format!("{}.lock", product_type_id));

        let _lock = RunLock::acquire(&lock_path, &self.lock_options)?;

        let mut aggregate =
            store::read_json::<ProductTypeAggregate>(&aggregate_path)?.unwrap_or_else(|| {
                ProductTypeAggregate::new(
                    product_type_id,
                    registry::type_description(product_type_id)
                        .unwrap_or("Unknown")
                        .to_string(),
                )
            });
        aggregate.upsert_product(descriptor);

        store::write_json_atomic(&aggregate_path, &aggregate)
    }

    fn path_extension(&self, desc: &ProductDescription, run_time: DateTime<Utc>) -> String {
        desc.path_extension_override
            .clone()
            .unwrap_or_else(|| types::run_path_extension(run_time))
    }
}

/// Whole hours between run time and valid time, rounded; 0 for
/// non-forecast products.
fn forecast_hour(desc: &ProductDescription, record: &FrameRecord) -> i64 {
    if !desc.is_forecast {
        return 0;
    }
    let minutes = (record.valid_time - record.run_time).num_minutes();
    (minutes as f64 / 60.0).round() as i64
}
