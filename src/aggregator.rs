//! Catalog Aggregator
//!
//! Merges the per-module product-type documents into one server-wide view.
//! This is a plain read-and-union pass: it only consumes already-published
//! documents and writes to a separate target tree, so it needs no locking.
//! Later modules win when two modules publish the same product id; the
//! first-seen document provides the aggregate's id and description.

use crate::documents::ProductTypeAggregate;
use crate::error::CatalogError;
use crate::store;
use crate::types::ProductTypeId;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Merge every module's `output/metadata/productTypes/*.json` under
/// `modules_root` and write the union to `<target>/metadata/productTypes/`.
///
/// Returns the number of merged documents written.
pub fn aggregate(modules_root: &Path, target_root: &Path) -> Result<usize, CatalogError> {
    let mut merged: BTreeMap<ProductTypeId, ProductTypeAggregate> = BTreeMap::new();

    for module in module_dirs(modules_root) {
        let types_dir = module.join("output").join("metadata").join("productTypes");
        if !types_dir.is_dir() {
            continue;
        }

        let mut documents: Vec<_> = std::fs::read_dir(&types_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        documents.sort();

        for path in documents {
            let document = match store::read_json::<ProductTypeAggregate>(&path)? {
                Some(document) => document,
                None => continue,
            };
            debug!(module = %module.display(), path = %path.display(), "merging product type document");
            merge_into(&mut merged, document);
        }
    }

    let target_dir = target_root.join("metadata").join("productTypes");
    for (product_type_id, document) in &merged {
        let path = target_dir.join(format!("{}.json", product_type_id));
        store::write_json_atomic(&path, document)?;
    }

    if merged.is_empty() {
        warn!(root = %modules_root.display(), "no product type documents found to aggregate");
    }
    Ok(merged.len())
}

/// First-level module directories, in name order so "later module wins" is
/// deterministic. Hidden directories (`.git` and friends) are skipped.
fn module_dirs(modules_root: &Path) -> Vec<std::path::PathBuf> {
    WalkDir::new(modules_root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .map(|entry| entry.into_path())
        .collect()
}

fn merge_into(
    merged: &mut BTreeMap<ProductTypeId, ProductTypeAggregate>,
    document: ProductTypeAggregate,
) {
    match merged.entry(document.product_type_id) {
        std::collections::btree_map::Entry::Vacant(slot) => {
            slot.insert(document);
        }
        std::collections::btree_map::Entry::Occupied(mut slot) => {
            let existing = slot.get_mut();
            for product in document.products {
                existing.upsert_product(product);
            }
        }
    }
}
