//! Concurrency tests for the locked run-list update

use chrono::{TimeZone, Utc};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;
use wxcat::catalog::{CatalogWriter, FrameRecord};
use wxcat::documents::RunFrameList;
use wxcat::error::CatalogError;
use wxcat::lock::{LockOptions, StalePolicy};
use wxcat::types::{run_key, GeoBounds};

fn frame(filename: &str, minute: u32) -> FrameRecord {
    FrameRecord {
        product_id: 0,
        run_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        filename: filename.to_string(),
        valid_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, 0).unwrap(),
        gis_info: GeoBounds::none(),
        reload_interval: 300,
    }
}

fn run_list_path(root: &std::path::Path) -> std::path::PathBuf {
    let run = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    root.join("metadata")
        .join("products")
        .join("0")
        .join(format!("{}.json", run_key(run)))
}

#[test]
fn test_concurrent_writers_never_lose_a_frame() {
    let temp_dir = TempDir::new().unwrap();
    let writer_count = 8;

    let mut handles = Vec::new();
    for i in 0..writer_count {
        let root = temp_dir.path().to_path_buf();
        handles.push(std::thread::spawn(move || {
            let writer = CatalogWriter::new(&root).with_lock_options(LockOptions {
                deadline: Duration::from_secs(30),
                poll_interval: Duration::from_millis(1),
                stale_policy: StalePolicy::Fail,
            });
            writer
                .record_frame(&frame(&format!("frame{:02}.png", i), i as u32))
                .unwrap();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let list: RunFrameList =
        serde_json::from_slice(&fs::read(run_list_path(temp_dir.path())).unwrap()).unwrap();
    assert_eq!(list.frames.len(), writer_count);
    assert_eq!(list.available_frame_count, writer_count);
    for window in list.frames.windows(2) {
        assert!(window[0].valid <= window[1].valid);
    }
}

#[test]
fn test_stale_lock_does_not_hang_writer() {
    let temp_dir = TempDir::new().unwrap();
    let run = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    // Simulate a crashed holder: marker exists, nobody will remove it.
    let run_dir = temp_dir.path().join("metadata").join("products").join("0");
    fs::create_dir_all(&run_dir).unwrap();
    let lock_path = run_dir.join(format!("{}.lock", run_key(run)));
    fs::write(&lock_path, b"").unwrap();

    let writer = CatalogWriter::new(temp_dir.path()).with_lock_options(LockOptions {
        deadline: Duration::from_millis(100),
        poll_interval: Duration::from_millis(5),
        stale_policy: StalePolicy::BreakLock,
    });
    writer.record_frame(&frame("frame.png", 0)).unwrap();

    let list: RunFrameList =
        serde_json::from_slice(&fs::read(run_list_path(temp_dir.path())).unwrap()).unwrap();
    assert_eq!(list.frames.len(), 1);
    // The broken lock was retaken and released.
    assert!(!lock_path.exists());
}

#[test]
fn test_override_policy_leaves_foreign_marker() {
    let temp_dir = TempDir::new().unwrap();
    let run = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    let run_dir = temp_dir.path().join("metadata").join("products").join("0");
    fs::create_dir_all(&run_dir).unwrap();
    let lock_path = run_dir.join(format!("{}.lock", run_key(run)));
    fs::write(&lock_path, b"").unwrap();

    let writer = CatalogWriter::new(temp_dir.path()).with_lock_options(LockOptions {
        deadline: Duration::from_millis(100),
        poll_interval: Duration::from_millis(5),
        stale_policy: StalePolicy::Override,
    });
    writer.record_frame(&frame("frame.png", 0)).unwrap();

    // The run-list write happened, but the abandoned run marker was never
    // ours to remove. (The aggregate's type marker is separate.)
    assert!(run_list_path(temp_dir.path()).exists());
    assert!(lock_path.exists());
}

#[test]
fn test_failure_in_critical_section_releases_lock() {
    let temp_dir = TempDir::new().unwrap();
    let run = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    // Corrupt run list forces an error after the lock is taken.
    let run_dir = temp_dir.path().join("metadata").join("products").join("0");
    fs::create_dir_all(&run_dir).unwrap();
    fs::write(run_list_path(temp_dir.path()), b"{ not json").unwrap();

    let writer = CatalogWriter::new(temp_dir.path());
    let result = writer.record_frame(&frame("frame.png", 0));
    assert!(matches!(
        result,
        Err(CatalogError::MalformedDocument { .. })
    ));

    // The marker must not outlive the failed attempt, or the next writer
    // would block until the stale deadline.
    let lock_path = run_dir.join(format!("{}.lock", run_key(run)));
    assert!(!lock_path.exists());
}
