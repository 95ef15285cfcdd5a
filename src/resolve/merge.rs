//! Tiered merge of setting definitions and value overrides.
//!
//! Within one tier every package's definitions are installed before any
//! override is applied, so a package may override a default defined by a
//! sibling in the same tier. Across tiers a later (higher-priority) append
//! always wins because tiers are visited in ascending order.

use std::collections::BTreeMap;
use tracing::debug;

use super::setting::{Point, Setting, SettingKind, Source};
use super::value::value_is_true;
use super::Resolution;
use crate::error::SyscfgError;
use crate::package::{FeatureSet, Member};

/// Description attached to caller-injected settings.
pub const INJECTED_DESCRIPTION: &str = "Injected setting";

/// Install caller-injected settings from the built-in source. Truthy ones
/// join the global feature seed.
pub(crate) fn install_injected(
    res: &mut Resolution,
    injected: &BTreeMap<String, String>,
    seed: &mut FeatureSet,
) {
    for (name, raw) in injected {
        let point = Point::new(raw, Source::Builtin);
        if value_is_true(&point.value) {
            seed.insert(name.clone());
        }
        res.settings.insert(
            name.clone(),
            Setting::new(name, INJECTED_DESCRIPTION, SettingKind::Raw, point),
        );
    }
}

/// Merge one tier: the definition pass over every member, then the
/// override pass over every member.
pub(crate) fn merge_tier(
    res: &mut Resolution,
    members: &[&Member<'_>],
    seed: &FeatureSet,
) -> Result<(), SyscfgError> {
    for member in members {
        apply_definitions(res, member, seed)?;
    }
    for member in members {
        apply_overrides(res, member, seed);
    }
    Ok(())
}

fn apply_definitions(
    res: &mut Resolution,
    member: &Member<'_>,
    seed: &FeatureSet,
) -> Result<(), SyscfgError> {
    let features = res.features_for_package(member.package, seed);
    let package = member.reference.name();

    for (name, def) in member.package.definitions(&features) {
        let kind = match def.type_token.as_deref() {
            None => SettingKind::Raw,
            Some(token) => {
                SettingKind::from_token(token).ok_or_else(|| SyscfgError::UnknownSettingType {
                    setting: name.clone(),
                    type_token: token.to_string(),
                    package: package.to_string(),
                })?
            }
        };

        if let Some(existing) = res.settings.get(&name) {
            return Err(SyscfgError::DuplicateSetting {
                setting: name,
                package: package.to_string(),
                first_definer: existing.definer().source.label().to_string(),
            });
        }

        let point = Point::new(&def.value, Source::Package(member.reference.clone()));
        let setting = Setting::new(&name, &def.description, kind, point);
        res.settings.insert(name, setting);
    }

    Ok(())
}

fn apply_overrides(res: &mut Resolution, member: &Member<'_>, seed: &FeatureSet) {
    let features = res.features_for_package(member.package, seed);

    for (name, value) in member.package.overrides(&features) {
        let point = Point::new(&value, Source::Package(member.reference.clone()));
        match res.settings.get_mut(&name) {
            Some(setting) => setting.append(point),
            None => {
                debug!(
                    setting = %name,
                    package = member.reference.name(),
                    "override targets undefined setting"
                );
                res.orphans.entry(name).or_default().push(point);
            }
        }
    }
}
