//! Document types served by the catalog.
//!
//! Three JSON documents describe the published state of the pipeline: the
//! per-product descriptor, the per-run frame list, and the per-product-type
//! aggregate. Field names match the wire format the web layer serves, so
//! every struct renames its fields to the published camelCase keys.

use crate::types::{stamp, GeoBounds, ProductId, ProductTypeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-product descriptor, overwritten wholesale on every frame write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDescriptor {
    #[serde(rename = "productID")]
    pub product_id: ProductId,
    #[serde(rename = "productDescription")]
    pub description: String,
    #[serde(rename = "productPath")]
    pub path: String,
    #[serde(rename = "productReloadTime")]
    pub reload_interval: u64,
    #[serde(rename = "lastReloadTime", with = "stamp")]
    pub last_reload: DateTime<Utc>,
    #[serde(rename = "isForecast")]
    pub is_forecast: bool,
    #[serde(rename = "isGIS")]
    pub is_gis: bool,
    #[serde(rename = "fileExtension")]
    pub file_extension: String,
    #[serde(rename = "displayFrames")]
    pub display_frames: u32,
}

/// One rendered image belonging to a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Whole hours between run time and valid time; 0 for non-forecasts.
    #[serde(rename = "fhour")]
    pub forecast_hour: i64,
    pub filename: String,
    #[serde(rename = "gisInfo")]
    pub gis_info: GeoBounds,
    #[serde(rename = "valid", with = "stamp")]
    pub valid: DateTime<Utc>,
    #[serde(rename = "publishTime", with = "stamp")]
    pub publish_time: DateTime<Utc>,
}

/// Per-run frame list, keyed on disk by the hour-truncated run time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFrameList {
    #[serde(rename = "publishTime", with = "stamp")]
    pub publish_time: DateTime<Utc>,
    #[serde(rename = "pathExtension")]
    pub path_extension: String,
    #[serde(rename = "runName")]
    pub run_name: String,
    #[serde(rename = "availableFrameCount")]
    pub available_frame_count: usize,
    /// Expected total frames for this run; -1 means "unknown, equals
    /// availableFrameCount" and is resolved before the document is written.
    #[serde(rename = "totalFrameCount")]
    pub total_frame_count: i64,
    #[serde(rename = "productFrames")]
    pub frames: Vec<Frame>,
}

impl RunFrameList {
    pub fn new(publish_time: DateTime<Utc>, path_extension: String, run_name: String) -> Self {
        RunFrameList {
            publish_time,
            path_extension,
            run_name,
            available_frame_count: 0,
            total_frame_count: -1,
            frames: Vec::new(),
        }
    }

    /// Append a frame, or replace the existing entry with the same filename.
    ///
    /// The list is re-sorted ascending by valid time after every mutation and
    /// `availableFrameCount` is recomputed, so document order is always the
    /// valid-time order rather than insertion order.
    pub fn upsert_frame(&mut self, frame: Frame) {
        self.frames.retain(|existing| existing.filename != frame.filename);
        self.frames.push(frame);
        self.frames.sort_by_key(|f| f.valid);
        self.available_frame_count = self.frames.len();
    }

    /// Replace the -1 sentinel with the live frame count.
    pub fn resolve_total(&mut self, policy_total: i64) {
        self.total_frame_count = if policy_total == -1 {
            self.frames.len() as i64
        } else {
            policy_total
        };
    }
}

/// Per-product-type aggregate: one descriptor snapshot per member product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductTypeAggregate {
    #[serde(rename = "productTypeID")]
    pub product_type_id: ProductTypeId,
    #[serde(rename = "productTypeDescription")]
    pub description: String,
    pub products: Vec<ProductDescriptor>,
}

impl ProductTypeAggregate {
    pub fn new(product_type_id: ProductTypeId, description: String) -> Self {
        ProductTypeAggregate {
            product_type_id,
            description,
            products: Vec::new(),
        }
    }

    /// Replace the entry for this descriptor's product id wholesale, keeping
    /// the list numerically ordered by product id.
    pub fn upsert_product(&mut self, descriptor: ProductDescriptor) {
        self.products
            .retain(|existing| existing.product_id != descriptor.product_id);
        self.products.push(descriptor);
        self.products.sort_by_key(|p| p.product_id);
    }
}
