//! Integration tests for the frame catalog writer

use chrono::{DateTime, TimeZone, Utc};
use std::fs;
use tempfile::TempDir;
use wxcat::catalog::{CatalogWriter, FrameRecord};
use wxcat::documents::{ProductTypeAggregate, RunFrameList};
use wxcat::types::{run_key, GeoBounds, ProductId};

fn record(
    product_id: ProductId,
    run: DateTime<Utc>,
    filename: &str,
    valid: DateTime<Utc>,
) -> FrameRecord {
    FrameRecord {
        product_id,
        run_time: run,
        filename: filename.to_string(),
        valid_time: valid,
        gis_info: GeoBounds::none(),
        reload_interval: 300,
    }
}

fn read_run_list(root: &std::path::Path, product_id: ProductId, run: DateTime<Utc>) -> RunFrameList {
    let path = root
        .join("metadata")
        .join("products")
        .join(product_id.to_string())
        .join(format!("{}.json", run_key(run)));
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}

#[test]
fn test_out_of_order_frames_end_up_sorted() {
    let temp_dir = TempDir::new().unwrap();
    let writer = CatalogWriter::new(temp_dir.path());
    let run = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    // Second frame of the run arrives first.
    let late = Utc.with_ymd_and_hms(2024, 1, 1, 0, 10, 0).unwrap();
    writer.record_frame(&record(0, run, "late.png", late)).unwrap();
    writer.record_frame(&record(0, run, "early.png", run)).unwrap();

    let list = read_run_list(temp_dir.path(), 0, run);
    assert_eq!(list.available_frame_count, 2);
    assert_eq!(list.frames.len(), 2);
    assert_eq!(list.frames[0].filename, "early.png");
    assert_eq!(list.frames[1].filename, "late.png");
    // Observational product: the -1 sentinel resolves to the live count.
    assert_eq!(list.total_frame_count, 2);
}

#[test]
fn test_rewriting_a_filename_replaces_the_entry() {
    let temp_dir = TempDir::new().unwrap();
    let writer = CatalogWriter::new(temp_dir.path());
    let run = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    writer.record_frame(&record(0, run, "frame.png", run)).unwrap();

    let mut second = record(
        0,
        run,
        "frame.png",
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 30, 0).unwrap(),
    );
    second.gis_info = GeoBounds::new("30.0,-98.5", "32.5,-94.0");
    writer.record_frame(&second).unwrap();

    let list = read_run_list(temp_dir.path(), 0, run);
    assert_eq!(list.frames.len(), 1);
    assert_eq!(list.available_frame_count, 1);
    assert_eq!(
        list.frames[0].valid,
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 30, 0).unwrap()
    );
    assert!(list.frames[0].gis_info.is_georeferenced());
}

#[test]
fn test_synoptic_total_frame_count() {
    let temp_dir = TempDir::new().unwrap();
    let writer = CatalogWriter::new(temp_dir.path());

    let synoptic = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    writer
        .record_frame(&record(800, synoptic, "f00.png", synoptic))
        .unwrap();
    assert_eq!(read_run_list(temp_dir.path(), 800, synoptic).total_frame_count, 49);

    let off_cycle = Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap();
    writer
        .record_frame(&record(800, off_cycle, "f00.png", off_cycle))
        .unwrap();
    assert_eq!(read_run_list(temp_dir.path(), 800, off_cycle).total_frame_count, 19);
}

#[test]
fn test_forecast_hour_offset_in_run_list() {
    let temp_dir = TempDir::new().unwrap();
    let writer = CatalogWriter::new(temp_dir.path());
    let run = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let valid = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

    writer.record_frame(&record(300, run, "f012.png", valid)).unwrap();

    let list = read_run_list(temp_dir.path(), 300, run);
    assert_eq!(list.frames[0].forecast_hour, 12);
    assert_eq!(list.path_extension, "2024/01/01/1200/");
    assert_eq!(list.run_name, "01 Jan 2024 12Z");
}

#[test]
fn test_descriptor_document_wire_fields() {
    let temp_dir = TempDir::new().unwrap();
    let writer = CatalogWriter::new(temp_dir.path());
    let run = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    let mut rec = record(0, run, "frame.png", run);
    rec.gis_info = GeoBounds::new("30.0,-98.5", "32.5,-94.0");
    writer.record_frame(&rec).unwrap();

    let descriptor_path = temp_dir.path().join("metadata").join("0.json");
    let json: serde_json::Value =
        serde_json::from_slice(&fs::read(descriptor_path).unwrap()).unwrap();
    assert_eq!(json["productID"], 0);
    assert_eq!(json["productDescription"], "MRMS Reflectivity At Lowest Altitude");
    assert_eq!(json["productPath"], "gisproducts/radar/RALA/");
    assert_eq!(json["productReloadTime"], 300);
    assert_eq!(json["isForecast"], false);
    assert_eq!(json["isGIS"], true);
    assert_eq!(json["fileExtension"], "png");
    assert_eq!(json["displayFrames"], 30);
}

#[test]
fn test_aggregate_collects_sibling_products() {
    let temp_dir = TempDir::new().unwrap();
    let writer = CatalogWriter::new(temp_dir.path());
    let run = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    writer.record_frame(&record(2, run, "a.png", run)).unwrap();
    writer.record_frame(&record(0, run, "b.png", run)).unwrap();
    writer.record_frame(&record(1, run, "c.png", run)).unwrap();
    // Rewriting a product must not duplicate its aggregate entry.
    writer.record_frame(&record(0, run, "d.png", run)).unwrap();

    let aggregate_path = temp_dir
        .path()
        .join("metadata")
        .join("productTypes")
        .join("0.json");
    let aggregate: ProductTypeAggregate =
        serde_json::from_slice(&fs::read(aggregate_path).unwrap()).unwrap();
    assert_eq!(aggregate.product_type_id, 0);
    assert_eq!(aggregate.description, "Radar & Satellite");
    let ids: Vec<u32> = aggregate.products.iter().map(|p| p.product_id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
}

#[test]
fn test_no_lock_marker_left_after_write() {
    let temp_dir = TempDir::new().unwrap();
    let writer = CatalogWriter::new(temp_dir.path());
    let run = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    writer.record_frame(&record(0, run, "frame.png", run)).unwrap();

    let run_dir = temp_dir.path().join("metadata").join("products").join("0");
    let leftovers: Vec<_> = fs::read_dir(run_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("lock"))
        .collect();
    assert!(leftovers.is_empty());
}

#[cfg(unix)]
#[test]
fn test_documents_are_world_readable() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let writer = CatalogWriter::new(temp_dir.path());
    let run = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    writer.record_frame(&record(0, run, "frame.png", run)).unwrap();

    for path in [
        temp_dir.path().join("metadata").join("0.json"),
        temp_dir
            .path()
            .join("metadata")
            .join("products")
            .join("0")
            .join(format!("{}.json", run_key(run))),
        temp_dir
            .path()
            .join("metadata")
            .join("productTypes")
            .join("0.json"),
    ] {
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644, "wrong mode for {:?}", path);
    }
}
