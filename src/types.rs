//! Core types for the weather-product metadata catalog.
//!
//! Timestamps inside documents are UTC at minute resolution, formatted as
//! 12-digit `YYYYMMDDHHMM` strings. Run documents are keyed by the run time
//! truncated to the hour (`YYYYMMDDHH00`).

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable integer id of a plot/imagery product.
pub type ProductId = u32;

/// Id of a coarse product grouping (one per model family, radar, obs).
pub type ProductTypeId = u32;

const STAMP_FORMAT: &str = "%Y%m%d%H%M";

/// Format a UTC time as the 12-digit document stamp.
pub fn format_stamp(time: DateTime<Utc>) -> String {
    time.format(STAMP_FORMAT).to_string()
}

/// Parse a 12-digit document stamp back into a UTC time.
pub fn parse_stamp(s: &str) -> Result<DateTime<Utc>, crate::error::CatalogError> {
    NaiveDateTime::parse_from_str(s, STAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| crate::error::CatalogError::InvalidStamp(s.to_string()))
}

/// Hour-truncated key used for run document filenames (`YYYYMMDDHH00`).
pub fn run_key(run_time: DateTime<Utc>) -> String {
    run_time.format("%Y%m%d%H00").to_string()
}

/// Dated subpath where a run's frame images live (`YYYY/MM/DD/HH00/`).
pub fn run_path_extension(run_time: DateTime<Utc>) -> String {
    run_time.format("%Y/%m/%d/%H00/").to_string()
}

/// Human-readable run label, e.g. `02 Jan 2024 06Z`.
pub fn run_label(run_time: DateTime<Utc>) -> String {
    run_time.format("%d %b %Y %HZ").to_string()
}

/// Serde adapter for `DateTime<Utc>` fields stored as document stamps.
pub mod stamp {
    use super::*;
    use serde::{de, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &DateTime<Utc>, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&format_stamp(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(de)?;
        NaiveDateTime::parse_from_str(&s, STAMP_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(|_| de::Error::custom(format!("invalid timestamp: {}", s)))
    }
}

/// Geographic bounding corners of a frame, serialized as a two-element array
/// of `lat,lon` strings. The `["0,0", "0,0"]` pair is the sentinel meaning
/// the frame carries no georeference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoBounds(pub String, pub String);

impl GeoBounds {
    const SENTINEL: &'static str = "0,0";

    pub fn new(southwest: impl Into<String>, northeast: impl Into<String>) -> Self {
        GeoBounds(southwest.into(), northeast.into())
    }

    /// The "no georeference" sentinel.
    pub fn none() -> Self {
        GeoBounds(Self::SENTINEL.to_string(), Self::SENTINEL.to_string())
    }

    pub fn is_georeferenced(&self) -> bool {
        !(self.0 == Self::SENTINEL && self.1 == Self::SENTINEL)
    }
}
