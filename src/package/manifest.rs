//! File-backed packages read from TOML manifests.
//!
//! ```toml
//! [pkg]
//! name = "hw/bsp/nrf52dk"
//! type = "bsp"
//!
//! [defs.UART_BAUD]
//! value = 115200
//! description = "Console baud rate"
//!
//! [vals]
//! LOG_LEVEL = 1
//!
//! [vals_if.BLE]
//! BLE_MAX_CONN = 4
//! ```

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use syscfg_tier::Tier;
use tracing::debug;
use walkdir::WalkDir;

use super::{FeatureSet, Package, SettingDef};
use crate::resolve::value::ScalarValue;

/// Default manifest file name
pub const DEFAULT_MANIFEST_NAME: &str = "pkg.toml";

/// Paths never searched for manifests
const DEFAULT_EXCLUDES: &[&str] = &[".git", ".git/**", "**/.git", "**/.git/**"];

/// Manifest loading errors
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("{path}: missing [pkg] name")]
    MissingName { path: PathBuf },

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid exclude pattern: {0}")]
    Glob(#[from] globset::Error),
}

#[derive(Debug, Deserialize)]
struct RawPkg {
    name: Option<String>,
    #[serde(rename = "type")]
    type_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDef {
    value: Option<ScalarValue>,
    description: Option<String>,
    #[serde(rename = "type")]
    type_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    pkg: Option<RawPkg>,
    #[serde(default)]
    injected: BTreeMap<String, ScalarValue>,
    #[serde(default)]
    defs: BTreeMap<String, RawDef>,
    #[serde(default)]
    vals: BTreeMap<String, ScalarValue>,
    #[serde(default)]
    defs_if: BTreeMap<String, BTreeMap<String, RawDef>>,
    #[serde(default)]
    vals_if: BTreeMap<String, BTreeMap<String, ScalarValue>>,
}

impl RawDef {
    fn into_def(self) -> SettingDef {
        SettingDef {
            value: self
                .value
                .map(|v| v.to_setting_string())
                .unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            type_token: self.type_token,
        }
    }
}

fn render_values(values: BTreeMap<String, ScalarValue>) -> BTreeMap<String, String> {
    values
        .into_iter()
        .map(|(k, v)| (k, v.to_setting_string()))
        .collect()
}

fn convert_defs(defs: BTreeMap<String, RawDef>) -> BTreeMap<String, SettingDef> {
    defs.into_iter().map(|(k, d)| (k, d.into_def())).collect()
}

/// A package loaded from a manifest file.
#[derive(Debug, Clone)]
pub struct ManifestPackage {
    name: String,
    tier: Tier,
    path: PathBuf,
    injected: BTreeMap<String, String>,
    defs: BTreeMap<String, SettingDef>,
    vals: BTreeMap<String, String>,
    defs_if: BTreeMap<String, BTreeMap<String, SettingDef>>,
    vals_if: BTreeMap<String, BTreeMap<String, String>>,
}

impl ManifestPackage {
    /// Parse manifest text. `path` is used for diagnostics only.
    pub fn parse(contents: &str, path: &Path) -> Result<Self, ManifestError> {
        let raw: RawManifest = toml::from_str(contents).map_err(|e| ManifestError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let pkg = raw.pkg.ok_or_else(|| ManifestError::MissingName {
            path: path.to_path_buf(),
        })?;
        let name = pkg
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ManifestError::MissingName {
                path: path.to_path_buf(),
            })?;
        let tier = Tier::normalize(pkg.type_token.as_deref().unwrap_or_default());

        Ok(Self {
            name,
            tier,
            path: path.to_path_buf(),
            injected: render_values(raw.injected),
            defs: convert_defs(raw.defs),
            vals: render_values(raw.vals),
            defs_if: raw
                .defs_if
                .into_iter()
                .map(|(feature, defs)| (feature, convert_defs(defs)))
                .collect(),
            vals_if: raw
                .vals_if
                .into_iter()
                .map(|(feature, vals)| (feature, render_values(vals)))
                .collect(),
        })
    }

    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let contents = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, path)
    }

    /// Manifest file this package was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Unconditional entries, then every block whose feature is truthy, in
/// ascending feature order.
fn select<V: Clone>(
    base: &BTreeMap<String, V>,
    conditional: &BTreeMap<String, BTreeMap<String, V>>,
    features: &FeatureSet,
) -> BTreeMap<String, V> {
    let mut out = base.clone();
    for (feature, block) in conditional {
        if features.contains(feature) {
            out.extend(block.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }
    out
}

impl Package for ManifestPackage {
    fn name(&self) -> &str {
        &self.name
    }

    fn tier(&self) -> Tier {
        self.tier
    }

    fn definitions(&self, features: &FeatureSet) -> BTreeMap<String, SettingDef> {
        select(&self.defs, &self.defs_if, features)
    }

    fn overrides(&self, features: &FeatureSet) -> BTreeMap<String, String> {
        select(&self.vals, &self.vals_if, features)
    }

    fn injected_settings(&self) -> BTreeMap<String, String> {
        self.injected.clone()
    }
}

fn build_excludes(extra: &[String]) -> Result<GlobSet, ManifestError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in DEFAULT_EXCLUDES {
        builder.add(Glob::new(pattern)?);
    }
    for pattern in extra {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Find and load every manifest named `manifest_name` under `root`.
///
/// The walk is sorted by file name so the returned order is stable.
/// Paths matching `exclude` (relative to `root`) are skipped along with
/// everything beneath them.
pub fn discover(
    root: &Path,
    manifest_name: &str,
    exclude: &[String],
) -> Result<Vec<ManifestPackage>, ManifestError> {
    let excludes = build_excludes(exclude)?;
    let mut packages = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        .into_iter()
        .filter_entry(|entry| match entry.path().strip_prefix(root) {
            Ok(rel) => rel.as_os_str().is_empty() || !excludes.is_match(rel),
            Err(_) => true,
        });

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || entry.file_name() != manifest_name {
            continue;
        }

        let package = ManifestPackage::load(entry.path())?;
        debug!(
            package = package.name(),
            tier = %package.tier(),
            path = %entry.path().display(),
            "loaded manifest"
        );
        packages.push(package);
    }

    Ok(packages)
}
