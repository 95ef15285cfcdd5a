//! Shared test fixtures
//!
//! - `TestPackage`: an in-memory package with optional feature-gated overrides
//! - `ProjectTree`: a temporary project directory populated with manifests

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use syscfg::{FeatureSet, Package, SettingDef, Tier};
use tempfile::TempDir;

/// In-memory package built with chained setters.
#[derive(Debug, Clone)]
pub struct TestPackage {
    pub name: String,
    pub tier: Tier,
    pub defs: BTreeMap<String, SettingDef>,
    pub vals: BTreeMap<String, String>,
    pub vals_if: BTreeMap<String, BTreeMap<String, String>>,
    pub injected: BTreeMap<String, String>,
}

impl TestPackage {
    pub fn new(name: &str, tier: Tier) -> Self {
        Self {
            name: name.to_string(),
            tier,
            defs: BTreeMap::new(),
            vals: BTreeMap::new(),
            vals_if: BTreeMap::new(),
            injected: BTreeMap::new(),
        }
    }

    pub fn def(mut self, name: &str, value: &str) -> Self {
        self.defs.insert(name.to_string(), SettingDef::new(value));
        self
    }

    pub fn def_typed(mut self, name: &str, value: &str, token: &str) -> Self {
        self.defs
            .insert(name.to_string(), SettingDef::new(value).with_type(token));
        self
    }

    pub fn val(mut self, name: &str, value: &str) -> Self {
        self.vals.insert(name.to_string(), value.to_string());
        self
    }

    pub fn val_if(mut self, feature: &str, name: &str, value: &str) -> Self {
        self.vals_if
            .entry(feature.to_string())
            .or_default()
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn inject(mut self, name: &str, value: &str) -> Self {
        self.injected.insert(name.to_string(), value.to_string());
        self
    }
}

impl Package for TestPackage {
    fn name(&self) -> &str {
        &self.name
    }

    fn tier(&self) -> Tier {
        self.tier
    }

    fn definitions(&self, _features: &FeatureSet) -> BTreeMap<String, SettingDef> {
        self.defs.clone()
    }

    fn overrides(&self, features: &FeatureSet) -> BTreeMap<String, String> {
        let mut vals = self.vals.clone();
        for (feature, block) in &self.vals_if {
            if features.contains(feature) {
                vals.extend(block.clone());
            }
        }
        vals
    }

    fn injected_settings(&self) -> BTreeMap<String, String> {
        self.injected.clone()
    }
}

/// Borrow a slice of packages as trait objects.
pub fn as_dyn(packages: &[TestPackage]) -> Vec<&dyn Package> {
    packages.iter().map(|p| p as &dyn Package).collect()
}

/// Temporary project directory.
pub struct ProjectTree {
    dir: TempDir,
}

impl ProjectTree {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `<root>/<rel>/pkg.toml`.
    pub fn manifest(&self, rel: &str, contents: &str) -> &Self {
        self.file(&format!("{}/pkg.toml", rel), contents)
    }

    pub fn file(&self, rel: &str, contents: &str) -> &Self {
        let path = self.dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
        self
    }

    pub fn header_path(&self) -> PathBuf {
        self.dir.path().join("target/include/syscfg/syscfg.h")
    }

    pub fn read_header(&self) -> String {
        fs::read_to_string(self.header_path()).unwrap()
    }
}

/// A small but complete board project: one library per tier plus a
/// conditional override gated on an injected BSP setting.
pub fn blinky_project() -> ProjectTree {
    let tree = ProjectTree::new();
    tree.manifest(
        "kernel/os",
        r#"
[pkg]
name = "kernel/os"

[defs.OS_MAIN_STACK_SIZE]
value = 1024
description = "Main task stack, in words"

[defs.OS_MAIN_TASK_PRIO]
value = "any"
type = "task_priority"

[defs.OS_CLI]
value = 0
"#,
    )
    .manifest(
        "sys/log",
        r#"
[pkg]
name = "sys/log"

[defs.LOG_LEVEL]
value = 0

[defs.LOG_CLI]
value = "MYNEWT_VAL_OS_CLI"

[defs.LOG_HAS_SHELL]
value = "MYNEWT_PKG_SYS_SHELL"

[defs.LOG_TASK_PRIO]
value = "any"
type = "task_priority"
"#,
    )
    .manifest(
        "hw/bsp/nrf52dk",
        r#"
[pkg]
name = "hw/bsp/nrf52dk"
type = "bsp"

[injected]
BSP_NRF52 = 1

[defs.UART_IRQ_PRIO]
value = 3
type = "interrupt_priority"

[vals]
OS_MAIN_STACK_SIZE = 768

[vals_if.BSP_NRF52]
LOG_LEVEL = 1
"#,
    )
    .manifest(
        "apps/blinky",
        r#"
[pkg]
name = "apps/blinky"
type = "app"

[vals]
LOG_LEVEL = 2
OS_CLI = true
UNDEFINED_KNOB = 5
"#,
    );
    tree
}
