//! Task and interrupt priority allocation.
//!
//! Settings of a priority kind hold either an explicit number or the
//! literal `any`. Explicit values are validated; `any` settings receive
//! consecutive values above the highest explicit one, in name order.

use std::collections::BTreeMap;

use super::setting::{Setting, SettingKind};
use super::value::{is_unsigned_int_literal, parse_int_no_octal};
use crate::error::SyscfgError;

/// Value requesting automatic assignment.
pub const PRIO_ANY: &str = "any";

/// Allocation rules for one priority kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityClass {
    pub kind: SettingKind,
    pub max: u64,
    pub allow_duplicates: bool,
}

impl PriorityClass {
    /// Task priorities. The last 16 values are reserved for the system
    /// (sanity, idle); two tasks may not share a priority.
    pub const TASK: PriorityClass = PriorityClass {
        kind: SettingKind::TaskPriority,
        max: 0xef,
        allow_duplicates: false,
    };

    /// Interrupt priorities. The range is hardware dependent and shared
    /// priorities are legitimate.
    pub const INTERRUPT: PriorityClass = PriorityClass {
        kind: SettingKind::InterruptPriority,
        max: 0xffff_ffff,
        allow_duplicates: true,
    };
}

/// Assign a concrete decimal value to every setting of the class's kind.
pub(crate) fn allocate(
    settings: &mut BTreeMap<String, Setting>,
    class: &PriorityClass,
) -> Result<(), SyscfgError> {
    let mut explicit: BTreeMap<String, u64> = BTreeMap::new();
    let mut auto: Vec<String> = Vec::new();
    // priority value => setting that claimed it
    let mut claimed: BTreeMap<u64, &Setting> = BTreeMap::new();

    for (name, setting) in settings.iter().filter(|(_, s)| s.kind == class.kind) {
        if setting.value == PRIO_ANY {
            auto.push(name.clone());
            continue;
        }

        let parsed = parse_int_no_octal(&setting.value).and_then(|p| u64::try_from(p).ok());
        let prio = match parsed {
            Some(prio) => prio,
            // Well-formed but too wide for an integer.
            None if is_unsigned_int_literal(&setting.value) => u64::MAX,
            None => {
                return Err(SyscfgError::InvalidPriorityValue {
                    setting: name.clone(),
                    value: setting.value.clone(),
                    package: setting.definer().source.label().to_string(),
                })
            }
        };

        if prio > class.max {
            return Err(SyscfgError::PriorityExceedsMax {
                setting: name.clone(),
                value: setting.value.clone(),
                max: class.max,
                package: setting.most_recent().source.label().to_string(),
            });
        }

        if !class.allow_duplicates {
            if let Some(first) = claimed.get(&prio) {
                return Err(SyscfgError::PriorityCollision {
                    first: first.name.clone(),
                    second: name.clone(),
                    first_package: first.definer().source.label().to_string(),
                    second_package: setting.definer().source.label().to_string(),
                    value: setting.value.clone(),
                });
            }
        }

        claimed.insert(prio, setting);
        explicit.insert(name.clone(), prio);
    }

    let mut highest = explicit.values().copied().max().unwrap_or(0);

    let mut assigned: Vec<(String, u64)> = Vec::with_capacity(auto.len());
    for name in auto {
        let prio = highest + 1;
        if prio > class.max {
            let package = settings
                .get(&name)
                .map(|s| s.most_recent().source.label().to_string())
                .unwrap_or_default();
            return Err(SyscfgError::PriorityExceedsMax {
                setting: name,
                value: prio.to_string(),
                max: class.max,
                package,
            });
        }
        highest = prio;
        assigned.push((name, prio));
    }

    for (name, prio) in explicit.into_iter().chain(assigned) {
        if let Some(setting) = settings.get_mut(&name) {
            setting.value = prio.to_string();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{PackageId, PackageRef};
    use crate::resolve::setting::{Point, Source};
    use syscfg_tier::Tier;

    fn prio_settings(kind: SettingKind, pairs: &[(&str, &str)]) -> BTreeMap<String, Setting> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, (name, value))| {
                let source = Source::Package(PackageRef::new(
                    PackageId(i),
                    Tier::Lib,
                    format!("pkg/{}", name.to_lowercase()),
                ));
                (
                    name.to_string(),
                    Setting::new(name, "", kind, Point::new(value, source)),
                )
            })
            .collect()
    }

    #[test]
    fn test_auto_assignment_in_name_order() {
        let mut s = prio_settings(
            SettingKind::TaskPriority,
            &[("C", "any"), ("A", "any"), ("B", "any")],
        );
        allocate(&mut s, &PriorityClass::TASK).unwrap();

        assert_eq!(s["A"].value, "1");
        assert_eq!(s["B"].value, "2");
        assert_eq!(s["C"].value, "3");
    }

    #[test]
    fn test_auto_starts_above_highest_explicit() {
        let mut s = prio_settings(
            SettingKind::TaskPriority,
            &[("LOW", "2"), ("HIGH", "0x10"), ("X", "any"), ("Y", "any")],
        );
        allocate(&mut s, &PriorityClass::TASK).unwrap();

        assert_eq!(s["HIGH"].value, "16");
        assert_eq!(s["LOW"].value, "2");
        assert_eq!(s["X"].value, "17");
        assert_eq!(s["Y"].value, "18");
    }

    #[test]
    fn test_task_collision() {
        let mut s = prio_settings(SettingKind::TaskPriority, &[("A", "5"), ("B", "5")]);
        let err = allocate(&mut s, &PriorityClass::TASK).unwrap_err();

        match err {
            SyscfgError::PriorityCollision {
                first,
                second,
                first_package,
                second_package,
                value,
            } => {
                assert_eq!(first, "A");
                assert_eq!(second, "B");
                assert_eq!(first_package, "pkg/a");
                assert_eq!(second_package, "pkg/b");
                assert_eq!(value, "5");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_interrupt_duplicates_allowed() {
        let mut s = prio_settings(SettingKind::InterruptPriority, &[("A", "5"), ("B", "5")]);
        allocate(&mut s, &PriorityClass::INTERRUPT).unwrap();
        assert_eq!(s["A"].value, "5");
        assert_eq!(s["B"].value, "5");
    }

    #[test]
    fn test_invalid_value() {
        let mut s = prio_settings(SettingKind::TaskPriority, &[("A", "high")]);
        let err = allocate(&mut s, &PriorityClass::TASK).unwrap_err();
        assert!(matches!(err, SyscfgError::InvalidPriorityValue { .. }));

        let mut s = prio_settings(SettingKind::TaskPriority, &[("A", "-1")]);
        let err = allocate(&mut s, &PriorityClass::TASK).unwrap_err();
        assert!(matches!(err, SyscfgError::InvalidPriorityValue { .. }));
    }

    #[test]
    fn test_explicit_exceeds_max() {
        let mut s = prio_settings(SettingKind::TaskPriority, &[("A", "240")]);
        let err = allocate(&mut s, &PriorityClass::TASK).unwrap_err();
        assert!(matches!(err, SyscfgError::PriorityExceedsMax { max: 0xef, .. }));
    }

    #[test]
    fn test_overflowing_literal_exceeds_max() {
        for value in ["99999999999999999999", "0x10000000000000000"] {
            let mut s = prio_settings(SettingKind::InterruptPriority, &[("A", value)]);
            let err = allocate(&mut s, &PriorityClass::INTERRUPT).unwrap_err();
            match err {
                SyscfgError::PriorityExceedsMax {
                    value: reported,
                    max,
                    package,
                    ..
                } => {
                    assert_eq!(reported, value);
                    assert_eq!(max, 0xffff_ffff);
                    assert_eq!(package, "pkg/a");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_auto_overflow() {
        let mut s = prio_settings(SettingKind::TaskPriority, &[("A", "239"), ("B", "any")]);
        let err = allocate(&mut s, &PriorityClass::TASK).unwrap_err();
        match err {
            SyscfgError::PriorityExceedsMax { setting, value, .. } => {
                assert_eq!(setting, "B");
                assert_eq!(value, "240");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_other_kinds_untouched() {
        let mut s = prio_settings(SettingKind::Raw, &[("A", "any")]);
        allocate(&mut s, &PriorityClass::TASK).unwrap();
        allocate(&mut s, &PriorityClass::INTERRUPT).unwrap();
        assert_eq!(s["A"].value, "any");
    }

    #[test]
    fn test_interrupt_max_is_u32() {
        let mut s = prio_settings(
            SettingKind::InterruptPriority,
            &[("A", "0xffffffff"), ("B", "any")],
        );
        let err = allocate(&mut s, &PriorityClass::INTERRUPT).unwrap_err();
        assert!(matches!(err, SyscfgError::PriorityExceedsMax { .. }));
    }
}
