//! Configuration resolution.
//!
//! A [`Resolution`] is built fresh from the complete package set on every
//! run:
//! 1. Injected settings are installed from the built-in source
//! 2. Tiers are merged lowest priority first (definitions, then overrides)
//! 3. Symbolic references are resolved against a fresh roster
//! 4. Same-tier conflicts are collected as ambiguities
//!
//! Priority allocation and the second resolver pass happen at emission time
//! via [`Resolution::finalize`].

mod ambiguity;
mod merge;
mod priority;
mod roster;
mod setting;
pub mod value;

pub use ambiguity::Ambiguity;
pub use priority::{PriorityClass, PRIO_ANY};
pub use roster::Roster;
pub use setting::{Point, Setting, SettingKind, Source, BUILTIN_SOURCE};

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use syscfg_tier::classify;
use tracing::{debug, warn};

use crate::error::SyscfgError;
use crate::package::{FeatureSet, Member, Package, PackageId, PackageRef};
use crate::symbol::is_setting_symbol;
use value::{normalize_value, value_is_true};

/// Inputs to one resolution.
#[derive(Default)]
pub struct ResolveInput<'a> {
    /// Every package taking part in the build
    pub packages: Vec<&'a dyn Package>,

    /// Declared API names
    pub apis: Vec<String>,

    /// Settings injected by the caller, attributed to the built-in source
    pub injected: BTreeMap<String, String>,

    /// Initial truthy feature seed
    pub features: FeatureSet,
}

impl<'a> ResolveInput<'a> {
    pub fn new(packages: Vec<&'a dyn Package>) -> Self {
        Self {
            packages,
            ..Default::default()
        }
    }

    pub fn from_packages(packages: &[&'a dyn Package]) -> Self {
        Self::new(packages.to_vec())
    }

    pub fn with_apis(mut self, apis: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.apis.extend(apis.into_iter().map(|a| a.into()));
        self
    }

    pub fn with_injected(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.injected.insert(name.into(), value.into());
        self
    }

    pub fn with_features(mut self, features: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.features.extend(features.into_iter().map(|f| f.into()));
        self
    }
}

/// The resolved configuration of one build.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Resolution {
    /// Settings by name
    pub settings: BTreeMap<String, Setting>,

    /// Overrides of undefined settings, by name
    pub orphans: BTreeMap<String, Vec<Point>>,

    /// Same-tier conflicts, sorted by setting name
    pub ambiguities: Vec<Ambiguity>,

    /// Symbol table from the most recent resolver pass
    #[serde(skip)]
    pub roster: Roster,

    #[serde(skip)]
    declared_packages: Vec<String>,

    #[serde(skip)]
    declared_apis: Vec<String>,
}

impl Resolution {
    /// Merge all packages and run the first resolver pass.
    pub fn resolve(input: &ResolveInput<'_>) -> Result<Self, SyscfgError> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for package in &input.packages {
            if !seen.insert(package.name()) {
                return Err(SyscfgError::DuplicatePackage {
                    package: package.name().to_string(),
                });
            }
        }

        let mut res = Resolution {
            declared_packages: input.packages.iter().map(|p| p.name().to_string()).collect(),
            declared_apis: input.apis.clone(),
            ..Default::default()
        };

        let mut seed = input.features.clone();
        merge::install_injected(&mut res, &input.injected, &mut seed);

        let members: Vec<Member<'_>> = input
            .packages
            .iter()
            .enumerate()
            .map(|(i, package)| Member {
                reference: PackageRef::new(PackageId(i), package.tier(), package.name()),
                package: *package,
            })
            .collect();

        let tiers = classify(members.iter());
        for (tier, tier_members) in tiers.iter() {
            debug!(
                tier = %tier,
                packages = ?tier_members.iter().map(|m| m.reference.name()).collect::<Vec<_>>(),
                "merging tier"
            );
            merge::merge_tier(&mut res, tier_members, &seed)?;
        }

        res.fixup()?;
        res.ambiguities = ambiguity::detect(&res.settings);

        Ok(res)
    }

    /// Rebuild the roster from current values and substitute symbolic
    /// references. Re-running on resolved values changes nothing.
    pub fn fixup(&mut self) -> Result<(), SyscfgError> {
        self.roster = Roster::build(&self.settings, &self.declared_packages, &self.declared_apis);
        roster::fixup(&mut self.settings, &self.roster)
    }

    /// Allocate task and interrupt priorities, then run the second resolver
    /// pass so references to allocated priorities see their numerals.
    ///
    /// Raw settings whose last authored value names another setting are
    /// re-resolved from that reference rather than from the first pass's
    /// result. Priority settings keep their allocated value.
    pub fn finalize(&mut self) -> Result<(), SyscfgError> {
        priority::allocate(&mut self.settings, &PriorityClass::TASK)?;
        priority::allocate(&mut self.settings, &PriorityClass::INTERRUPT)?;

        for setting in self.settings.values_mut() {
            if setting.kind == SettingKind::Raw && is_setting_symbol(setting.unfixed_value()) {
                setting.value = setting.unfixed_value().to_string();
            }
        }
        self.fixup()
    }

    /// Names of settings whose current value is truthy.
    pub fn features(&self) -> FeatureSet {
        self.settings
            .iter()
            .filter(|(_, s)| s.is_true())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Feature set a package sees: the global truthy set plus the package's
    /// own truthy injected settings. Global names win on collision.
    pub fn features_for_package(&self, package: &dyn Package, seed: &FeatureSet) -> FeatureSet {
        let mut features = self.features();
        features.extend(seed.iter().cloned());

        for (name, value) in package.injected_settings() {
            if features.contains(&name) {
                warn!(
                    setting = %name,
                    package = package.name(),
                    "Attempt to override syscfg setting with injected feature"
                );
            } else if value_is_true(&normalize_value(&value)) {
                features.insert(name);
            }
        }

        features
    }

    pub fn get(&self, name: &str) -> Option<&Setting> {
        self.settings.get(name)
    }

    /// Last authored value of a setting.
    pub fn unfixed_value(&self, name: &str) -> Option<&str> {
        self.settings.get(name).map(Setting::unfixed_value)
    }

    /// Settings grouped by the label of their definer, names sorted.
    pub fn entries_by_package(&self) -> BTreeMap<String, Vec<&Setting>> {
        let mut groups: BTreeMap<String, Vec<&Setting>> = BTreeMap::new();
        for setting in self.settings.values() {
            groups
                .entry(setting.definer().source.label().to_string())
                .or_default()
                .push(setting);
        }
        groups
    }

    /// Final `name -> value` map.
    pub fn values(&self) -> BTreeMap<&str, &str> {
        self.settings
            .iter()
            .map(|(name, s)| (name.as_str(), s.value.as_str()))
            .collect()
    }

    /// SHA-256 of the canonical JSON of [`Resolution::values`].
    pub fn resolution_key(&self) -> Result<String, serde_json::Error> {
        let jcs_bytes = serde_json_canonicalizer::to_vec(&self.values())?;
        let mut hasher = Sha256::new();
        hasher.update(&jcs_bytes);
        Ok(hex::encode(hasher.finalize()))
    }

    pub fn declared_packages(&self) -> &[String] {
        &self.declared_packages
    }

    pub fn declared_apis(&self) -> &[String] {
        &self.declared_apis
    }

    /// Turn a non-empty ambiguity list into a single error.
    pub fn detect_errors(&self) -> Result<(), SyscfgError> {
        if self.ambiguities.is_empty() {
            return Ok(());
        }
        Err(SyscfgError::Ambiguous {
            ambiguities: self.ambiguities.clone(),
        })
    }

    /// Debug-log every setting with its history, then warn about orphans.
    pub fn log_summary(&self) {
        debug!("syscfg settings ({} entries):", self.settings.len());
        for setting in self.settings.values() {
            debug!("    {}", setting.history_text());
        }

        for (name, points) in &self.orphans {
            let points: Vec<String> = points.iter().map(Point::text).collect();
            warn!(
                "ignoring override of undefined setting {} [{}]",
                name,
                points.join(", ")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::SettingDef;
    use syscfg_tier::Tier;

    struct TestPkg {
        name: &'static str,
        tier: Tier,
        defs: Vec<(&'static str, &'static str)>,
        vals: Vec<(&'static str, &'static str)>,
        injected: Vec<(&'static str, &'static str)>,
    }

    impl TestPkg {
        fn new(name: &'static str, tier: Tier) -> Self {
            Self {
                name,
                tier,
                defs: Vec::new(),
                vals: Vec::new(),
                injected: Vec::new(),
            }
        }
    }

    impl Package for TestPkg {
        fn name(&self) -> &str {
            self.name
        }

        fn tier(&self) -> Tier {
            self.tier
        }

        fn definitions(&self, _features: &FeatureSet) -> BTreeMap<String, SettingDef> {
            self.defs
                .iter()
                .map(|(k, v)| (k.to_string(), SettingDef::new(*v)))
                .collect()
        }

        fn overrides(&self, _features: &FeatureSet) -> BTreeMap<String, String> {
            self.vals
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        }

        fn injected_settings(&self) -> BTreeMap<String, String> {
            self.injected
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        }
    }

    #[test]
    fn test_features_for_package_adds_truthy_injected() {
        let mut lib = TestPkg::new("lib/a", Tier::Lib);
        lib.defs.push(("ON", "1"));
        lib.defs.push(("OFF", "0"));
        let mut other = TestPkg::new("lib/b", Tier::Lib);
        other.injected.push(("LOCAL", "1"));
        other.injected.push(("LOCAL_OFF", "0"));
        other.injected.push(("ON", "0"));

        let input = ResolveInput::from_packages(&[&lib]);
        let res = Resolution::resolve(&input).unwrap();
        let seed: FeatureSet = ["SEED".to_string()].into_iter().collect();

        let features = res.features_for_package(&other, &seed);
        assert!(features.contains("ON"));
        assert!(features.contains("SEED"));
        assert!(features.contains("LOCAL"));
        assert!(!features.contains("LOCAL_OFF"));
        assert!(!features.contains("OFF"));
    }

    #[test]
    fn test_entries_by_package_groups_by_definer() {
        let mut lib = TestPkg::new("lib/a", Tier::Lib);
        lib.defs.push(("B", "1"));
        lib.defs.push(("A", "1"));
        let mut app = TestPkg::new("apps/x", Tier::App);
        app.vals.push(("A", "2"));

        let input = ResolveInput::from_packages(&[&lib, &app]).with_injected("INJ", "1");
        let res = Resolution::resolve(&input).unwrap();
        let groups = res.entries_by_package();

        let keys: Vec<&String> = groups.keys().collect();
        assert_eq!(keys, vec!["built-in", "lib/a"]);
        let lib_names: Vec<&str> = groups["lib/a"].iter().map(|s| s.name.as_str()).collect();
        assert_eq!(lib_names, vec!["A", "B"]);
    }

    #[test]
    fn test_detect_errors_aggregates() {
        let mut def = TestPkg::new("lib/def", Tier::Lib);
        def.defs.push(("BAR", "0"));
        let mut a = TestPkg::new("lib/a", Tier::Lib);
        a.vals.push(("BAR", "1"));
        let mut b = TestPkg::new("lib/b", Tier::Lib);
        b.vals.push(("BAR", "2"));

        let input = ResolveInput::from_packages(&[&def, &a, &b]);
        let res = Resolution::resolve(&input).unwrap();
        let err = res.detect_errors().unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Syscfg ambiguities detected:"));
        assert!(msg.contains("BAR [lib/a:1, lib/b:2]"));
    }

    #[test]
    fn test_resolution_key_is_stable() {
        let mut lib = TestPkg::new("lib/a", Tier::Lib);
        lib.defs.push(("A", "1"));
        let input = ResolveInput::from_packages(&[&lib]);

        let first = Resolution::resolve(&input).unwrap().resolution_key().unwrap();
        let second = Resolution::resolve(&input).unwrap().resolution_key().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn test_unfixed_value_after_fixup() {
        let mut lib = TestPkg::new("lib/a", Tier::Lib);
        lib.defs.push(("HAS_LOG", "MYNEWT_PKG_SYS_LOG"));
        let log = TestPkg::new("sys/log", Tier::Lib);

        let input = ResolveInput::from_packages(&[&lib, &log]);
        let res = Resolution::resolve(&input).unwrap();
        assert_eq!(res.get("HAS_LOG").unwrap().value, "1");
        assert_eq!(res.unfixed_value("HAS_LOG"), Some("MYNEWT_PKG_SYS_LOG"));
    }

    #[test]
    fn test_duplicate_package_name_rejected() {
        let mut first = TestPkg::new("lib/a", Tier::Lib);
        first.defs.push(("A", "1"));
        let mut second = TestPkg::new("lib/a", Tier::Lib);
        second.vals.push(("A", "2"));

        let input = ResolveInput::from_packages(&[&first, &second]);
        let err = Resolution::resolve(&input).unwrap_err();
        assert!(matches!(err, SyscfgError::DuplicatePackage { ref package } if package == "lib/a"));
        assert_eq!(err.code(), "DUPLICATE_PACKAGE");
    }
}
