//! Product Registry
//!
//! Static lookup from a numeric product id to its fixed descriptive
//! attributes. The table is immutable and compiled in; the lookup index is
//! built once and rejects duplicate ids.
//!
//! A handful of forecast products only run long cycles at synoptic hours, so
//! their expected frame count depends on the run's hour of day. That policy
//! lives here, not in the writer.

use crate::error::CatalogError;
use crate::types::{ProductId, ProductTypeId};
use chrono::{DateTime, Timelike, Utc};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Expected-frame-count policy for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameCountPolicy {
    /// Observational feed: no fixed total, the run list grows as frames
    /// arrive. Serialized as the -1 sentinel until resolved at write time.
    Rolling,
    /// Forecast model with the same frame count on every cycle.
    Fixed(i64),
    /// Forecast model with long runs only at the listed synoptic hours.
    Synoptic {
        hours: &'static [u32],
        on_cycle: i64,
        off_cycle: i64,
    },
}

impl FrameCountPolicy {
    /// Resolve to the document value for a given run. `Rolling` resolves to
    /// the -1 sentinel, replaced by the live frame count at write time.
    pub fn resolve(&self, run_time: DateTime<Utc>) -> i64 {
        match *self {
            FrameCountPolicy::Rolling => -1,
            FrameCountPolicy::Fixed(count) => count,
            FrameCountPolicy::Synoptic {
                hours,
                on_cycle,
                off_cycle,
            } => {
                if hours.contains(&run_time.hour()) {
                    on_cycle
                } else {
                    off_cycle
                }
            }
        }
    }
}

/// One row of the static product table.
#[derive(Debug)]
struct ProductEntry {
    id: ProductId,
    description: &'static str,
    path: &'static str,
    /// Some product families share a path root and disambiguate by id.
    path_appends_id: bool,
    is_forecast: bool,
    file_extension: &'static str,
    display_frames: u32,
    product_type: ProductTypeId,
    frames: FrameCountPolicy,
    /// Fixed run path extension for rolling-directory products (overrides
    /// the dated `YYYY/MM/DD/HH00/` layout). Empty string means frames are
    /// written directly under the product path.
    path_extension: Option<&'static str>,
}

const fn obs(
    id: ProductId,
    description: &'static str,
    path: &'static str,
    display_frames: u32,
    product_type: ProductTypeId,
) -> ProductEntry {
    ProductEntry {
        id,
        description,
        path,
        path_appends_id: false,
        is_forecast: false,
        file_extension: "png",
        display_frames,
        product_type,
        frames: FrameCountPolicy::Rolling,
        path_extension: None,
    }
}

const fn fcst(
    id: ProductId,
    description: &'static str,
    path: &'static str,
    product_type: ProductTypeId,
    frames: FrameCountPolicy,
) -> ProductEntry {
    ProductEntry {
        id,
        description,
        path,
        path_appends_id: false,
        is_forecast: true,
        file_extension: "png",
        display_frames: 0,
        product_type,
        frames,
        path_extension: None,
    }
}

const GFS: FrameCountPolicy = FrameCountPolicy::Fixed(209);
const NAM: FrameCountPolicy = FrameCountPolicy::Fixed(53);
const NAM_NEST: FrameCountPolicy = FrameCountPolicy::Fixed(61);
const HRRR: FrameCountPolicy = FrameCountPolicy::Synoptic {
    hours: &[0, 6, 12, 18],
    on_cycle: 49,
    off_cycle: 19,
};
const ECMWF_HRES: FrameCountPolicy = FrameCountPolicy::Synoptic {
    hours: &[0, 12],
    on_cycle: 61,
    off_cycle: 31,
};

static PRODUCTS: &[ProductEntry] = &[
    // Radar & satellite (product type 0)
    obs(0, "MRMS Reflectivity At Lowest Altitude", "gisproducts/radar/RALA/", 30, 0),
    obs(1, "MRMS National Reflectivity At Lowest Altitude", "products/radar/national/", 30, 0),
    obs(2, "MRMS Regional Reflectivity At Lowest Altitude", "products/radar/regional/", 30, 0),
    obs(3, "MRMS Local Reflectivity At Lowest Altitude", "products/radar/local/", 30, 0),
    obs(8, "GOES-16 CONUS Band 2 Visible", "gisproducts/satellite/goes16ch2/", 30, 0),
    obs(9, "GOES-16 CONUS Band 2 Visible", "products/satellite/goes16ch2/", 30, 0),
    // Local observations (product type 1)
    obs(100, "Mesonet Farm WxCenter", "products/mesonet/Farm/wxcenter/", 1, 1),
    obs(101, "Mesonet Farm Timeseries", "products/mesonet/Farm/timeseries/", 1, 1),
    obs(102, "Mesonet Gardens WxCenter", "products/mesonet/Gardens/wxcenter/", 1, 1),
    obs(103, "Mesonet Gardens Timeseries", "products/mesonet/Gardens/timeseries/", 1, 1),
    ProductEntry {
        path_appends_id: true,
        ..obs(120, "ADRAD 0.5\u{b0} Reflectivity PPI", "gisproducts/radar/ADRAD/", 60, 1)
    },
    ProductEntry {
        path_appends_id: true,
        ..obs(121, "ADRAD 0.5\u{b0} Reflectivity PPI", "products/radar/ADRAD/", 60, 1)
    },
    ProductEntry {
        path_appends_id: true,
        ..obs(122, "ADRAD 0.5\u{b0} Reflectivity PPI (Quality-controlled)", "gisproducts/radar/ADRAD/", 60, 1)
    },
    ProductEntry {
        path_appends_id: true,
        ..obs(123, "ADRAD 0.5\u{b0} Reflectivity PPI (Quality-controlled)", "products/radar/ADRAD/", 60, 1)
    },
    ProductEntry {
        path_appends_id: true,
        ..obs(124, "ADRAD 0.5\u{b0} Signal Quality Index", "products/radar/ADRAD/", 60, 1)
    },
    ProductEntry {
        path_appends_id: true,
        ..obs(125, "ADRAD 0.5\u{b0} Velocity PPI", "gisproducts/radar/ADRAD/", 60, 1)
    },
    ProductEntry {
        path_appends_id: true,
        ..obs(126, "ADRAD 0.5\u{b0} Velocity PPI", "products/radar/ADRAD/", 60, 1)
    },
    obs(140, "HLMA VHF 1-minute Sources", "gisproducts/hlma/vhf-1min/", 60, 1),
    obs(141, "HLMA VHF 1-minute Sources", "products/hlma/vhf-1min/", 60, 1),
    ProductEntry {
        file_extension: "php",
        display_frames: 1,
        path_extension: Some(""),
        ..obs(142, "GR2Analyst HLMA VHF Sources (1 minute)", "gr2a/", 1, 1)
    },
    obs(143, "HLMA VHF 10-minute Sources", "gisproducts/hlma/vhf-10min/", 60, 1),
    obs(144, "HLMA VHF 10-minute Sources", "products/hlma/vhf-10min/", 60, 1),
    ProductEntry {
        file_extension: "php",
        path_extension: Some(""),
        ..obs(145, "GR2Analyst HLMA VHF Sources (10 minutes)", "gr2a/", 60, 1)
    },
    obs(146, "HLMA 1-minute Flash Extent Density", "gisproducts/hlma/flash-1min/", 60, 1),
    obs(147, "HLMA 1-minute Flash Extent Density", "products/hlma/flash-1min/", 60, 1),
    obs(148, "HLMA 10-minute Flash Extent Density", "gisproducts/hlma/flash-10min/", 60, 1),
    obs(149, "HLMA 10-minute Flash Extent Density", "products/hlma/flash-10min/", 60, 1),
    obs(150, "HLMA VHF 1-minute Sources + ADRAD Reflectivity", "products/hlma/adrad-src/", 60, 1),
    obs(151, "HLMA VHF 1-minute Sources + MRMS Reflectivity At Lowest Altitude", "products/hlma/mrms-src/", 30, 1),
    obs(152, "HLMA 1-minute Flash Extent Density + ADRAD Reflectivity", "products/hlma/adrad-flash/", 60, 1),
    obs(153, "HLMA 1-minute Flash Extent Density + MRMS Reflectivity At Lowest Altitude", "products/hlma/mrms-flash/", 30, 1),
    // GFS (product type 3)
    fcst(300, "GFS Surface Temperature", "gisproducts/gfs/sfcT/", 3, GFS),
    fcst(301, "GFS Surface Winds", "gisproducts/gfs/sfcWnd/", 3, GFS),
    fcst(302, "GFS Surface MSLP", "gisproducts/gfs/sfcMSLP/", 3, GFS),
    fcst(303, "GFS Surface Temperature, Winds, MSLP", "products/gfs/sfcTWndMSLP/", 3, GFS),
    fcst(316, "GFS 500 hPa Winds", "gisproducts/gfs/500wind/", 3, GFS),
    fcst(321, "GFS 250 hPa Winds", "gisproducts/gfs/250wind/", 3, GFS),
    fcst(325, "GFS 850 hPa Winds", "gisproducts/gfs/850wind/", 3, GFS),
    fcst(390, "GFS Surface Wind Divergence", "products/gfs/divergence/", 3, GFS),
    // NAM (product type 5)
    fcst(500, "NAM Surface Temperature", "gisproducts/nam/sfcT/", 5, NAM),
    fcst(501, "NAM Surface Winds", "gisproducts/nam/sfcWnd/", 5, NAM),
    fcst(502, "NAM Surface MSLP", "gisproducts/nam/sfcMSLP/", 5, NAM),
    fcst(503, "NAM Surface Temperature, Winds, MSLP", "products/nam/sfcTWndMSLP/", 5, NAM),
    fcst(516, "NAM 500 hPa Winds", "gisproducts/nam/500wind/", 5, NAM),
    fcst(521, "NAM 250 hPa Winds", "gisproducts/nam/250wind/", 5, NAM),
    fcst(525, "NAM 850 hPa Winds", "gisproducts/nam/850wind/", 5, NAM),
    fcst(590, "NAM Surface Wind Divergence", "products/nam/divergence/", 5, NAM),
    // NAM NEST (product type 6)
    fcst(600, "NAM NEST Surface Temperature", "gisproducts/namnest/sfcT/", 6, NAM_NEST),
    fcst(601, "NAM NEST Surface Winds", "gisproducts/namnest/sfcWnd/", 6, NAM_NEST),
    fcst(602, "NAM NEST Surface MSLP", "gisproducts/namnest/sfcMSLP/", 6, NAM_NEST),
    fcst(603, "NAM NEST Surface Temperature, Winds, MSLP", "products/namnest/sfcTWndMSLP/", 6, NAM_NEST),
    fcst(616, "NAM NEST 500 hPa Winds", "gisproducts/namnest/500wind/", 6, NAM_NEST),
    fcst(621, "NAM NEST 250 hPa Winds", "gisproducts/namnest/250wind/", 6, NAM_NEST),
    fcst(625, "NAM NEST 850 hPa Winds", "gisproducts/namnest/850wind/", 6, NAM_NEST),
    fcst(690, "NAM NEST Surface Wind Divergence", "products/namnest/divergence/", 6, NAM_NEST),
    // HRRR (product type 8)
    fcst(800, "HRRR Surface Temperature", "gisproducts/hrrr/sfcT/", 8, HRRR),
    fcst(801, "HRRR Surface Winds", "gisproducts/hrrr/sfcWnd/", 8, HRRR),
    fcst(802, "HRRR Surface MSLP", "gisproducts/hrrr/sfcMSLP/", 8, HRRR),
    fcst(803, "HRRR Surface Temperature, Winds, MSLP", "products/hrrr/sfcTWndMSLP/", 8, HRRR),
    fcst(816, "HRRR 500 hPa Winds", "gisproducts/hrrr/500wind/", 8, HRRR),
    fcst(821, "HRRR 250 hPa Winds", "gisproducts/hrrr/250wind/", 8, HRRR),
    fcst(825, "HRRR 850 hPa Winds", "gisproducts/hrrr/850wind/", 8, HRRR),
    fcst(890, "HRRR Surface Wind Divergence", "products/hrrr/divergence/", 8, HRRR),
    // ECMWF-HRES (product type 10)
    fcst(1000, "ECMWF-HRES Surface Temperature", "gisproducts/ecmwf-hres/sfcT/", 10, ECMWF_HRES),
    fcst(1001, "ECMWF-HRES Surface Winds", "gisproducts/ecmwf-hres/sfcWnd/", 10, ECMWF_HRES),
    fcst(1002, "ECMWF-HRES Surface MSLP", "gisproducts/ecmwf-hres/sfcMSLP/", 10, ECMWF_HRES),
    fcst(1003, "ECMWF-HRES Surface Temperature, Winds, MSLP", "products/ecmwf-hres/sfcTWndMSLP/", 10, ECMWF_HRES),
    fcst(1016, "ECMWF-HRES 500 hPa Winds", "gisproducts/ecmwf-hres/500wind/", 10, ECMWF_HRES),
    fcst(1021, "ECMWF-HRES 250 hPa Winds", "gisproducts/ecmwf-hres/250wind/", 10, ECMWF_HRES),
    fcst(1025, "ECMWF-HRES 850 hPa Winds", "gisproducts/ecmwf-hres/850wind/", 10, ECMWF_HRES),
    fcst(1090, "ECMWF-HRES Surface Wind Divergence", "products/ecmwf-hres/divergence/", 10, ECMWF_HRES),
];

static PRODUCT_TYPES: &[(ProductTypeId, &str)] = &[
    (0, "Radar & Satellite"),
    (1, "TAMU Observations"),
    (3, "GFS"),
    (5, "NAM"),
    (6, "NAM NEST"),
    (8, "HRRR"),
    (10, "ECMWF-HRES"),
];

fn index() -> &'static HashMap<ProductId, &'static ProductEntry> {
    static INDEX: OnceLock<HashMap<ProductId, &'static ProductEntry>> = OnceLock::new();
    INDEX.get_or_init(|| {
        let mut index = HashMap::with_capacity(PRODUCTS.len());
        for entry in PRODUCTS {
            let previous = index.insert(entry.id, entry);
            assert!(
                previous.is_none(),
                "duplicate product id {} in registry table",
                entry.id
            );
        }
        index
    })
}

/// Resolved description of one product for one run.
///
/// `total_frame_count` is already evaluated against the run's hour of day;
/// the -1 sentinel survives here and is replaced with the live frame count
/// when the run list is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDescription {
    pub product_id: ProductId,
    pub description: String,
    pub path: String,
    pub is_forecast: bool,
    pub file_extension: String,
    pub display_frames: u32,
    pub product_type_id: ProductTypeId,
    pub total_frame_count: i64,
    pub path_extension_override: Option<String>,
}

/// Look up a product's fixed attributes, resolving any run-time-dependent
/// frame count policy. Fails with `UnknownProduct` for ids not in the table;
/// callers must not write any document in that case.
pub fn describe(
    product_id: ProductId,
    run_time: DateTime<Utc>,
) -> Result<ProductDescription, CatalogError> {
    let entry = index()
        .get(&product_id)
        .ok_or(CatalogError::UnknownProduct(product_id))?;

    let path = if entry.path_appends_id {
        format!("{}{}", entry.path, entry.id)
    } else {
        entry.path.to_string()
    };

    Ok(ProductDescription {
        product_id: entry.id,
        description: entry.description.to_string(),
        path,
        is_forecast: entry.is_forecast,
        file_extension: entry.file_extension.to_string(),
        display_frames: entry.display_frames,
        product_type_id: entry.product_type,
        total_frame_count: entry.frames.resolve(run_time),
        path_extension_override: entry.path_extension.map(str::to_string),
    })
}

/// Human description of a product type id.
pub fn type_description(product_type_id: ProductTypeId) -> Result<&'static str, CatalogError> {
    PRODUCT_TYPES
        .iter()
        .find(|(id, _)| *id == product_type_id)
        .map(|(_, description)| *description)
        .ok_or(CatalogError::UnknownProductType(product_type_id))
}
