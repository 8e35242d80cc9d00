//! Integration tests for the server-wide catalog aggregator

use chrono::{TimeZone, Utc};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wxcat::aggregator::aggregate;
use wxcat::documents::{ProductDescriptor, ProductTypeAggregate};

fn descriptor(product_id: u32, description: &str) -> ProductDescriptor {
    ProductDescriptor {
        product_id,
        description: description.to_string(),
        path: "products/test/".to_string(),
        reload_interval: 300,
        last_reload: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        is_forecast: false,
        is_gis: false,
        file_extension: "png".to_string(),
        display_frames: 30,
    }
}

fn publish(modules_root: &Path, module: &str, document: &ProductTypeAggregate) {
    let types_dir = modules_root
        .join(module)
        .join("output")
        .join("metadata")
        .join("productTypes");
    fs::create_dir_all(&types_dir).unwrap();
    fs::write(
        types_dir.join(format!("{}.json", document.product_type_id)),
        serde_json::to_vec_pretty(document).unwrap(),
    )
    .unwrap();
}

#[test]
fn test_merges_modules_with_later_module_winning() {
    let modules = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();

    let mut radar = ProductTypeAggregate::new(0, "Radar & Satellite".to_string());
    radar.upsert_product(descriptor(0, "from hdwx-radar"));
    radar.upsert_product(descriptor(2, "regional mosaic"));
    publish(modules.path(), "hdwx-radar", &radar);

    let mut satellite = ProductTypeAggregate::new(0, "Radar & Satellite".to_string());
    satellite.upsert_product(descriptor(0, "from hdwx-satellite"));
    satellite.upsert_product(descriptor(8, "goes-16 visible"));
    publish(modules.path(), "hdwx-satellite", &satellite);

    let mut gfs = ProductTypeAggregate::new(3, "GFS".to_string());
    gfs.upsert_product(descriptor(300, "surface temperature"));
    publish(modules.path(), "hdwx-gfs", &gfs);

    let written = aggregate(modules.path(), target.path()).unwrap();
    assert_eq!(written, 2);

    let merged_path = target
        .path()
        .join("metadata")
        .join("productTypes")
        .join("0.json");
    let merged: ProductTypeAggregate =
        serde_json::from_slice(&fs::read(&merged_path).unwrap()).unwrap();
    let ids: Vec<u32> = merged.products.iter().map(|p| p.product_id).collect();
    assert_eq!(ids, vec![0, 2, 8]);
    // hdwx-satellite sorts after hdwx-radar, so its product 0 wins.
    assert_eq!(merged.products[0].description, "from hdwx-satellite");

    let gfs_path = target
        .path()
        .join("metadata")
        .join("productTypes")
        .join("3.json");
    let merged_gfs: ProductTypeAggregate =
        serde_json::from_slice(&fs::read(&gfs_path).unwrap()).unwrap();
    assert_eq!(merged_gfs.products.len(), 1);
}

#[test]
fn test_modules_without_catalogs_are_skipped() {
    let modules = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();

    fs::create_dir_all(modules.path().join(".git")).unwrap();
    fs::create_dir_all(modules.path().join("hdwx-empty")).unwrap();

    let written = aggregate(modules.path(), target.path()).unwrap();
    assert_eq!(written, 0);
}

#[cfg(unix)]
#[test]
fn test_merged_documents_are_world_readable() {
    use std::os::unix::fs::PermissionsExt;

    let modules = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();

    let mut radar = ProductTypeAggregate::new(0, "Radar & Satellite".to_string());
    radar.upsert_product(descriptor(0, "local mosaic"));
    publish(modules.path(), "hdwx-radar", &radar);

    aggregate(modules.path(), target.path()).unwrap();

    let merged_path = target
        .path()
        .join("metadata")
        .join("productTypes")
        .join("0.json");
    let mode = fs::metadata(&merged_path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o644);
}
