//! Same-tier conflict detection.

use serde::Serialize;
use std::collections::BTreeMap;

use super::setting::{Point, Setting};

/// A setting whose most recent values came from unordered packages of one
/// tier and disagree.
#[derive(Debug, Clone, Serialize)]
pub struct Ambiguity {
    pub setting: String,

    /// The conflicting run, oldest first
    pub points: Vec<Point>,
}

impl Ambiguity {
    /// `NAME [pkg:val, pkg:val]`
    pub fn text(&self) -> String {
        let points: Vec<String> = self.points.iter().map(Point::text).collect();
        format!("{} [{}]", self.setting, points.join(", "))
    }

    pub(crate) fn render_all(ambiguities: &[Ambiguity]) -> String {
        let mut s = String::from("Syscfg ambiguities detected:");
        for a in ambiguities {
            s.push_str("\n    ");
            s.push_str(&a.text());
        }
        s
    }
}

/// The trailing same-tier run of a setting's overrides, if it conflicts.
///
/// Pairs are inspected from the newest backwards. The defining point is not
/// part of the scan: a default exists to be overridden. The scan stops at
/// a built-in point or a tier boundary.
fn ambiguous_run(setting: &Setting) -> Option<&[Point]> {
    let history = setting.history();
    let n = history.len();
    let mut start = n.saturating_sub(1);
    let mut differs = false;

    for i in (2..n).rev() {
        let cur = &history[i - 1];
        let next = &history[i];

        if cur.source.is_builtin() || next.source.is_builtin() {
            break;
        }
        if cur.source.tier() != next.source.tier() {
            break;
        }
        if cur.value != next.value {
            differs = true;
        }
        start = i - 1;
    }

    if differs && n - start >= 2 {
        Some(&history[start..])
    } else {
        None
    }
}

/// Collect at most one ambiguity per setting, in name order.
pub(crate) fn detect(settings: &BTreeMap<String, Setting>) -> Vec<Ambiguity> {
    settings
        .values()
        .filter_map(|setting| {
            ambiguous_run(setting).map(|run| Ambiguity {
                setting: setting.name.clone(),
                points: run.to_vec(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{PackageId, PackageRef};
    use crate::resolve::setting::{SettingKind, Source};
    use syscfg_tier::Tier;

    fn src(id: usize, tier: Tier, name: &str) -> Source {
        Source::Package(PackageRef::new(PackageId(id), tier, name))
    }

    fn setting(points: Vec<(&str, Source)>) -> Setting {
        let mut iter = points.into_iter();
        let (v, s) = iter.next().unwrap();
        let mut setting = Setting::new("BAR", "", SettingKind::Raw, Point::new(v, s));
        for (v, s) in iter {
            setting.append(Point::new(v, s));
        }
        setting
    }

    fn detect_one(s: Setting) -> Vec<Ambiguity> {
        let mut map = BTreeMap::new();
        map.insert(s.name.clone(), s);
        detect(&map)
    }

    #[test]
    fn test_same_tier_conflict() {
        let s = setting(vec![
            ("0", src(0, Tier::Lib, "lib/def")),
            ("1", src(1, Tier::Lib, "lib/a")),
            ("2", src(2, Tier::Lib, "lib/b")),
        ]);
        let found = detect_one(s);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text(), "BAR [lib/a:1, lib/b:2]");
    }

    #[test]
    fn test_same_tier_agreement_is_fine() {
        let s = setting(vec![
            ("0", src(0, Tier::Lib, "lib/def")),
            ("1", src(1, Tier::Lib, "lib/a")),
            ("1", src(2, Tier::Lib, "lib/b")),
        ]);
        assert!(detect_one(s).is_empty());
    }

    #[test]
    fn test_cross_tier_override_is_intentional() {
        let s = setting(vec![
            ("0", src(0, Tier::Lib, "lib/def")),
            ("1", src(1, Tier::Lib, "lib/a")),
            ("2", src(2, Tier::App, "apps/x")),
        ]);
        assert!(detect_one(s).is_empty());
    }

    #[test]
    fn test_single_same_tier_override_of_default() {
        let s = setting(vec![
            ("0", src(0, Tier::Lib, "lib/def")),
            ("1", src(1, Tier::Lib, "lib/a")),
        ]);
        assert!(detect_one(s).is_empty());
    }

    #[test]
    fn test_scan_stops_at_tier_boundary() {
        // The Lib conflict is buried under a Bsp override and a Bsp
        // conflict; only the trailing Bsp run is reported.
        let s = setting(vec![
            ("0", src(0, Tier::Lib, "lib/def")),
            ("1", src(1, Tier::Lib, "lib/a")),
            ("2", src(2, Tier::Lib, "lib/b")),
            ("3", src(3, Tier::Bsp, "bsp/x")),
            ("4", src(4, Tier::Bsp, "bsp/y")),
        ]);
        let found = detect_one(s);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text(), "BAR [bsp/x:3, bsp/y:4]");
    }

    #[test]
    fn test_builtin_stops_scan() {
        let s = setting(vec![
            ("0", Source::Builtin),
            ("1", src(1, Tier::Lib, "lib/a")),
            ("2", src(2, Tier::Lib, "lib/b")),
        ]);
        let found = detect_one(s);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].points.len(), 2);
    }

    #[test]
    fn test_run_reported_chronologically() {
        let s = setting(vec![
            ("0", src(0, Tier::Target, "t/def")),
            ("a", src(1, Tier::Target, "t/1")),
            ("b", src(2, Tier::Target, "t/2")),
            ("b", src(3, Tier::Target, "t/3")),
        ]);
        let found = detect_one(s);
        let labels: Vec<&str> = found[0].points.iter().map(|p| p.source.label()).collect();
        assert_eq!(labels, vec!["t/1", "t/2", "t/3"]);
    }
}
