//! Package collaborators.
//!
//! A package contributes setting definitions, value overrides and injected
//! settings. Manifest parsing and feature-conditional selection live behind
//! the [`Package`] trait; the resolver only ever sees already-selected maps.

mod manifest;

pub use manifest::{discover, ManifestError, ManifestPackage, DEFAULT_MANIFEST_NAME};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use syscfg_tier::{Tier, Tiered};

/// Names of features that currently evaluate truthy.
pub type FeatureSet = BTreeSet<String>;

/// A setting definition as contributed by a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingDef {
    /// Default value
    pub value: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Kind token (`raw`, `task_priority`, `interrupt_priority`); None means raw
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_token: Option<String>,
}

impl SettingDef {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_type(mut self, token: impl Into<String>) -> Self {
        self.type_token = Some(token.into());
        self
    }
}

/// A configuration-contributing package.
pub trait Package {
    /// Package name, e.g. `hw/bsp/nrf52dk`.
    fn name(&self) -> &str;

    /// Priority tier.
    fn tier(&self) -> Tier;

    /// Setting definitions visible under the given feature set.
    fn definitions(&self, features: &FeatureSet) -> BTreeMap<String, SettingDef>;

    /// Value overrides visible under the given feature set.
    fn overrides(&self, features: &FeatureSet) -> BTreeMap<String, String>;

    /// Settings this package injects into its own feature evaluation.
    fn injected_settings(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

/// Position of a package in the caller-supplied package list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageId(pub usize);

/// Opaque provenance handle for a package.
///
/// Two references are equal when they carry the same [`PackageId`]; name and
/// tier are carried along for diagnostics and ambiguity checks only.
#[derive(Debug, Clone, Serialize)]
pub struct PackageRef {
    id: PackageId,
    tier: Tier,
    name: String,
}

impl PackageRef {
    pub fn new(id: PackageId, tier: Tier, name: impl Into<String>) -> Self {
        Self {
            id,
            tier,
            name: name.into(),
        }
    }

    pub fn id(&self) -> PackageId {
        self.id
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for PackageRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PackageRef {}

/// A supplied package paired with its provenance handle.
pub(crate) struct Member<'a> {
    pub(crate) reference: PackageRef,
    pub(crate) package: &'a dyn Package,
}

impl Tiered for Member<'_> {
    fn name(&self) -> &str {
        self.reference.name()
    }

    fn tier(&self) -> Tier {
        self.reference.tier()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_ref_compares_by_identity() {
        let a = PackageRef::new(PackageId(0), Tier::Lib, "sys/log");
        let b = PackageRef::new(PackageId(0), Tier::App, "renamed");
        let c = PackageRef::new(PackageId(1), Tier::Lib, "sys/log");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_setting_def_builder() {
        let def = SettingDef::new("any")
            .with_description("Shell task priority")
            .with_type("task_priority");
        assert_eq!(def.value, "any");
        assert_eq!(def.type_token.as_deref(), Some("task_priority"));
        assert_eq!(def.description, "Shell task priority");
    }
}
