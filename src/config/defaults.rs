//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};

use crate::package::DEFAULT_MANIFEST_NAME;

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Output root, relative to the project (default: "target")
    pub target_root: String,

    /// Abort when same-tier conflicts remain (default: true)
    pub fail_on_ambiguity: bool,

    /// Manifest file name (default: "pkg.toml")
    pub manifest_name: String,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            target_root: "target".to_string(),
            fail_on_ambiguity: true,
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "target_root": self.target_root,
            "apis": [],
            "features": [],
            "injected": {},
            "fail_on_ambiguity": self.fail_on_ambiguity,
            "manifest_name": self.manifest_name,
            "exclude": []
        })
    }
}
