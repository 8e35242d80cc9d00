//! wxcat: Weather-Product Metadata Catalog
//!
//! Maintains the hierarchy of JSON documents describing which imagery
//! products exist, which runs have produced frames, and where those frames
//! live on disk. Many independent producer processes update the catalog
//! concurrently; per-run lock markers and atomic document writes keep it
//! consistent.

pub mod aggregator;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod documents;
pub mod error;
pub mod latest;
pub mod lock;
pub mod logging;
pub mod registry;
pub mod store;
pub mod sweeper;
pub mod types;
