//! Listing and deleting saved bundles.
use std::path::PathBuf;

use anyhow::{Context, Result};

use iris_classifier::bundle::BundleInfo;
use iris_classifier::{ArtifactStore, BundleTag};

pub fn list_bundles(store: &ArtifactStore) -> Result<Vec<BundleInfo>> {
    store
        .list()
        .with_context(|| format!("Failed to list bundles in {}", store.root().display()))
}

/// One line per bundle: `Name:version<TAB>path`.
pub fn format_listing(bundles: &[BundleInfo]) -> String {
    bundles
        .iter()
        .map(|b| format!("{}\t{}\n", b.tag, b.path.display()))
        .collect()
}

pub fn delete_bundle(store: &ArtifactStore, tag: &str) -> Result<PathBuf> {
    let tag: BundleTag = tag.parse()?;
    store
        .delete(&tag)
        .with_context(|| format!("Failed to delete bundle {}", tag))
}
