//! Typed view of the merged configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::package::FeatureSet;
use crate::resolve::value::ScalarValue;

/// Settings that drive one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Root under which `include/syscfg/syscfg.h` is written
    pub target_root: PathBuf,

    /// Declared API names
    pub apis: Vec<String>,

    /// Initial truthy feature seed
    pub features: Vec<String>,

    /// Global injected settings
    pub injected: BTreeMap<String, ScalarValue>,

    pub fail_on_ambiguity: bool,

    /// File name of package manifests
    pub manifest_name: String,

    /// Extra glob patterns excluded from manifest discovery
    pub exclude: Vec<String>,
}

impl ToolSettings {
    /// `target_root` joined onto `project` unless already absolute.
    pub fn target_root_in(&self, project: &Path) -> PathBuf {
        if self.target_root.is_absolute() {
            self.target_root.clone()
        } else {
            project.join(&self.target_root)
        }
    }

    /// Injected settings rendered as setting values.
    pub fn injected_values(&self) -> BTreeMap<String, String> {
        self.injected
            .iter()
            .map(|(name, value)| (name.clone(), value.to_setting_string()))
            .collect()
    }

    pub fn feature_seed(&self) -> FeatureSet {
        self.features.iter().cloned().collect()
    }
}
