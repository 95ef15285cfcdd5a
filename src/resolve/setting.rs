//! Settings and their provenance history.

use serde::{Deserialize, Serialize};
use syscfg_tier::Tier;

use super::value::{normalize_value, value_is_true};
use crate::package::PackageRef;

/// Source label of points with no owning package.
pub const BUILTIN_SOURCE: &str = "built-in";

/// Who authored an application point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "package", rename_all = "snake_case")]
pub enum Source {
    /// Injected by the caller
    Builtin,
    /// Contributed by a package
    Package(PackageRef),
}

impl Source {
    pub fn label(&self) -> &str {
        match self {
            Source::Builtin => BUILTIN_SOURCE,
            Source::Package(p) => p.name(),
        }
    }

    pub fn tier(&self) -> Option<Tier> {
        match self {
            Source::Builtin => None,
            Source::Package(p) => Some(p.tier()),
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Source::Builtin)
    }
}

/// One application of a value to a setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Point {
    pub value: String,
    pub source: Source,
}

impl Point {
    pub fn new(value: &str, source: Source) -> Self {
        Self {
            value: normalize_value(value),
            source,
        }
    }

    /// `source:value`, as used in diagnostics.
    pub fn text(&self) -> String {
        format!("{}:{}", self.source.label(), self.value)
    }
}

/// Setting kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingKind {
    #[default]
    Raw,
    TaskPriority,
    InterruptPriority,
}

impl SettingKind {
    /// Parse a definition's type token. `None` for unrecognized tokens.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "raw" => Some(SettingKind::Raw),
            "task_priority" => Some(SettingKind::TaskPriority),
            "interrupt_priority" => Some(SettingKind::InterruptPriority),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKind::Raw => "raw",
            SettingKind::TaskPriority => "task_priority",
            SettingKind::InterruptPriority => "interrupt_priority",
        }
    }
}

/// A named configuration value with its authorship trail.
///
/// `history` is never empty and only ever grows. `value` tracks the last
/// history point until the resolver or allocator replaces it with a
/// computed value; the history itself is never rewritten.
#[derive(Debug, Clone, Serialize)]
pub struct Setting {
    pub name: String,
    pub value: String,
    pub description: String,
    pub kind: SettingKind,
    history: Vec<Point>,
}

impl Setting {
    pub(crate) fn new(name: &str, description: &str, kind: SettingKind, first: Point) -> Self {
        Self {
            name: name.to_string(),
            value: first.value.clone(),
            description: normalize_value(description),
            kind,
            history: vec![first],
        }
    }

    pub(crate) fn append(&mut self, point: Point) {
        self.value = point.value.clone();
        self.history.push(point);
    }

    pub fn history(&self) -> &[Point] {
        &self.history
    }

    /// The point that defined the setting.
    pub fn definer(&self) -> &Point {
        &self.history[0]
    }

    /// The most recently applied point.
    pub fn most_recent(&self) -> &Point {
        &self.history[self.history.len() - 1]
    }

    /// Last authored value, ignoring resolver and allocator substitutions.
    pub fn unfixed_value(&self) -> &str {
        &self.most_recent().value
    }

    pub fn is_overridden(&self) -> bool {
        self.history.len() > 1
    }

    pub fn is_true(&self) -> bool {
        value_is_true(&self.value)
    }

    /// `NAME=value [src:val, ...]`
    pub fn history_text(&self) -> String {
        let points: Vec<String> = self.history.iter().map(Point::text).collect();
        format!("{}={} [{}]", self.name, self.value, points.join(", "))
    }
}
