use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use iris_classifier::bundle::METADATA_FILE;
use iris_classifier::{ArtifactStore, BundleTag};

pub fn validate_tsv_or_csv_file(path: &str) -> Result<()> {
    let pb = PathBuf::from(path);

    let ext = pb
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    match ext.as_deref() {
        Some("tsv") | Some("csv") => {}
        _ => anyhow::bail!("File must have a .tsv or .csv extension: {}", path),
    }

    if !pb.exists() {
        anyhow::bail!("File does not exist: {}", path);
    }

    Ok(())
}

/// Artifact store from an explicit `--artifact-home`, else the environment default.
pub fn artifact_store(home: Option<&PathBuf>) -> ArtifactStore {
    match home {
        Some(dir) => ArtifactStore::new(dir),
        None => ArtifactStore::from_env(),
    }
}

/// Turn a bundle argument into a bundle directory.
///
/// Accepts a directory containing `bundle.json`, or a `Name:version` /
/// `Name:latest` tag looked up in `store`.
pub fn resolve_bundle(arg: &str, store: &ArtifactStore) -> Result<PathBuf> {
    let as_path = Path::new(arg);
    if as_path.join(METADATA_FILE).is_file() {
        return Ok(as_path.to_path_buf());
    }
    let tag: BundleTag = arg
        .parse()
        .with_context(|| format!("'{}' is neither a bundle directory nor a tag", arg))?;
    store
        .resolve(&tag)
        .with_context(|| format!("Failed to find bundle {} in {}", tag, store.root().display()))
}
