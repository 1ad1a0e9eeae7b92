//! Artifact bundles and the local artifact store.
//!
//! A bundle is a directory `<root>/<service>/<version>/` holding
//! `bundle.json` (service declaration, version, environment and training
//! summary) and `artifacts/<slot>.json` (the serialized model). Bundles are
//! written once; the metadata file is written last, so a directory without
//! it is not a bundle.
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::SvcClassifier;
use crate::service::{IrisClassifier, ServiceSpec, MODEL_SLOT};
use crate::train::TrainingReport;

pub const METADATA_FILE: &str = "bundle.json";
pub const ARTIFACTS_DIR: &str = "artifacts";
/// Environment variable overriding the default store root.
pub const HOME_ENV: &str = "IRIS_SERVING_HOME";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentInfo {
    pub crate_name: String,
    pub crate_version: String,
    pub os: String,
    pub arch: String,
}

impl EnvironmentInfo {
    pub fn current() -> Self {
        EnvironmentInfo {
            crate_name: env!("CARGO_PKG_NAME").to_string(),
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BundleMetadata {
    pub service: ServiceSpec,
    pub version: String,
    /// RFC 3339 creation time.
    pub created_at: String,
    pub env: EnvironmentInfo,
    #[serde(default)]
    pub training: Option<TrainingReport>,
}

/// Address of a bundle: `Name:version`, or `Name:latest` / `Name` for the
/// newest saved version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleTag {
    pub name: String,
    pub version: Option<String>,
}

impl BundleTag {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        BundleTag {
            name: name.into(),
            version: Some(version.into()),
        }
    }

    pub fn latest(name: impl Into<String>) -> Self {
        BundleTag {
            name: name.into(),
            version: None,
        }
    }
}

impl FromStr for BundleTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, version) = match s.split_once(':') {
            Some((n, v)) => (n, Some(v)),
            None => (s, None),
        };
        if !is_valid_component(name) {
            return Err(Error::InvalidTag(s.to_string()));
        }
        match version {
            None | Some("latest") => Ok(BundleTag::latest(name)),
            Some(v) if is_valid_component(v) => Ok(BundleTag::new(name, v)),
            Some(_) => Err(Error::InvalidTag(s.to_string())),
        }
    }
}

impl fmt::Display for BundleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}:{}", self.name, v),
            None => write!(f, "{}:latest", self.name),
        }
    }
}

fn is_valid_component(s: &str) -> bool {
    !s.is_empty()
        && s != "."
        && s != ".."
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}

/// New version tag: local time `YYYYMMDDHHMMSS` and six random hex digits.
pub fn new_version_tag() -> String {
    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
    let suffix: u32 = rand::thread_rng().gen_range(0..0x100_0000);
    format!("{}_{:06X}", stamp, suffix)
}

/// A saved bundle as found in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleInfo {
    pub tag: BundleTag,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ArtifactStore { root: root.into() }
    }

    /// Store rooted at `$IRIS_SERVING_HOME`, or at the default location.
    pub fn from_env() -> Self {
        match std::env::var_os(HOME_ENV) {
            Some(dir) if !dir.is_empty() => Self::new(dir),
            _ => Self::new(Self::default_root()),
        }
    }

    /// `<home>/iris-serving/repository`, falling back to the working directory.
    pub fn default_root() -> PathBuf {
        directories::BaseDirs::new()
            .map(|d| d.home_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
            .join("iris-serving")
            .join("repository")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bundle_dir(&self, name: &str, version: &str) -> PathBuf {
        self.root.join(name).join(version)
    }

    /// Write `service` as a new bundle. The model slot must be packed.
    pub fn save(&self, service: &IrisClassifier) -> Result<PathBuf> {
        let model = service.model()?;
        let name = service.name();
        if !is_valid_component(name) {
            return Err(Error::InvalidTag(name.to_string()));
        }

        let version = new_version_tag();
        let dir = self.bundle_dir(name, &version);
        let parent = self.root.join(name);
        fs::create_dir_all(&parent).map_err(|e| Error::io(&parent, e))?;

        write_new_dir(&dir, |dir| {
            let artifacts = dir.join(ARTIFACTS_DIR);
            fs::create_dir(&artifacts).map_err(|e| Error::io(&artifacts, e))?;
            let model_path = artifacts.join(format!("{}.json", MODEL_SLOT));
            write_json(&model_path, model)?;

            let metadata = BundleMetadata {
                service: service.spec().clone(),
                version: version.clone(),
                created_at: chrono::Local::now().to_rfc3339(),
                env: EnvironmentInfo::current(),
                training: service.training_report().cloned(),
            };
            write_json(&dir.join(METADATA_FILE), &metadata)
        })?;

        log::info!("Saved bundle {}:{} to {}", name, version, dir.display());
        Ok(dir)
    }

    /// Saved versions of `name`, oldest first.
    ///
    /// Ordered by the `created_at` time in each bundle's metadata, then by
    /// tag. Tags alone do not order saves made within the same second.
    pub fn versions(&self, name: &str) -> Result<Vec<String>> {
        let dir = self.root.join(name);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut versions = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| Error::io(&dir, e))? {
            let entry = entry.map_err(|e| Error::io(&dir, e))?;
            let path = entry.path();
            if !path.join(METADATA_FILE).is_file() {
                continue;
            }
            if let Some(v) = entry.file_name().to_str() {
                let created = match read_metadata(&path) {
                    Ok(meta) => chrono::DateTime::parse_from_rfc3339(&meta.created_at).ok(),
                    Err(e) => {
                        log::warn!("Unreadable bundle metadata in {}: {}", path.display(), e);
                        None
                    }
                };
                versions.push((created, v.to_string()));
            }
        }
        versions.sort();
        Ok(versions.into_iter().map(|(_, v)| v).collect())
    }

    /// Every saved bundle, sorted by service name, then oldest first.
    pub fn list(&self) -> Result<Vec<BundleInfo>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(|e| Error::io(&self.root, e))? {
            let entry = entry.map_err(|e| Error::io(&self.root, e))?;
            if entry.path().is_dir() {
                if let Some(n) = entry.file_name().to_str() {
                    names.push(n.to_string());
                }
            }
        }
        names.sort();

        let mut out = Vec::new();
        for name in names {
            for version in self.versions(&name)? {
                out.push(BundleInfo {
                    path: self.bundle_dir(&name, &version),
                    tag: BundleTag::new(name.clone(), version),
                });
            }
        }
        Ok(out)
    }

    /// Directory of the bundle addressed by `tag`.
    pub fn resolve(&self, tag: &BundleTag) -> Result<PathBuf> {
        let version = match &tag.version {
            Some(v) => v.clone(),
            None => self
                .versions(&tag.name)?
                .pop()
                .ok_or_else(|| Error::BundleNotFound(tag.to_string()))?,
        };
        let dir = self.bundle_dir(&tag.name, &version);
        if !dir.join(METADATA_FILE).is_file() {
            return Err(Error::BundleNotFound(tag.to_string()));
        }
        Ok(dir)
    }

    pub fn load(&self, tag: &BundleTag) -> Result<IrisClassifier> {
        let dir = self.resolve(tag)?;
        let service = load_bundle(&dir)?;
        if service.name() != tag.name {
            return Err(Error::ServiceMismatch {
                expected: tag.name.clone(),
                found: service.name().to_string(),
            });
        }
        Ok(service)
    }

    /// Remove the bundle addressed by `tag` and return the removed directory.
    pub fn delete(&self, tag: &BundleTag) -> Result<PathBuf> {
        let dir = self.resolve(tag)?;
        fs::remove_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        log::info!("Deleted bundle {}", dir.display());
        Ok(dir)
    }
}

pub fn read_metadata<P: AsRef<Path>>(dir: P) -> Result<BundleMetadata> {
    read_json(&dir.as_ref().join(METADATA_FILE))
}

/// Load a packed service from a bundle directory.
pub fn load_bundle<P: AsRef<Path>>(dir: P) -> Result<IrisClassifier> {
    let dir = dir.as_ref();
    if !dir.join(METADATA_FILE).is_file() {
        return Err(Error::BundleNotFound(dir.display().to_string()));
    }
    let metadata = read_metadata(dir)?;
    let model: SvcClassifier =
        read_json(&dir.join(ARTIFACTS_DIR).join(format!("{}.json", MODEL_SLOT)))?;

    let mut service = IrisClassifier::from_spec(metadata.service);
    service.pack(MODEL_SLOT, model)?;
    if let Some(report) = metadata.training {
        service.set_training_report(report);
    }
    log::debug!("Loaded bundle {} from {}", metadata.version, dir.display());
    Ok(service)
}

/// Create `dir` (which must not exist) and fill it with `fill`. On failure
/// the directory is removed again.
fn write_new_dir<F>(dir: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    match fs::create_dir(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(Error::BundleExists(dir.to_path_buf()))
        }
        Err(e) => return Err(Error::io(dir, e)),
    }
    if let Err(e) = fill(dir) {
        if let Err(cleanup) = fs::remove_dir_all(dir) {
            log::warn!("Failed to remove partial bundle {}: {}", dir.display(), cleanup);
        }
        return Err(e);
    }
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    fs::write(path, json).map_err(|e| Error::io(path, e))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    Ok(serde_json::from_slice(&bytes)?)
}
