//! Priority tiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Override priority class of a package.
///
/// Variants are declared in ascending priority order, so the derived `Ord`
/// matches merge order: a `Target` value always beats a `Lib` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Libraries, SDKs, compilers and anything unrecognized.
    Lib,
    /// Board support packages.
    Bsp,
    /// Unit-test packages (used when no app is present).
    Unittest,
    /// The application.
    App,
    /// The build target.
    Target,
}

/// Error returned by the strict `FromStr` parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown package type: '{0}'")]
pub struct UnknownTier(pub String);

impl Tier {
    /// All tiers, lowest priority first.
    pub const ALL: [Tier; 5] = [Tier::Lib, Tier::Bsp, Tier::Unittest, Tier::App, Tier::Target];

    /// Lowercase token for this tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Lib => "lib",
            Tier::Bsp => "bsp",
            Tier::Unittest => "unittest",
            Tier::App => "app",
            Tier::Target => "target",
        }
    }

    /// Lenient parse: any token that is not one of the five tiers
    /// (e.g. `sdk`, `compiler`, or garbage) is treated as `Lib`.
    pub fn normalize(token: &str) -> Tier {
        token.parse().unwrap_or(Tier::Lib)
    }

    /// Position of this tier in [`Tier::ALL`].
    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl FromStr for Tier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lib" => Ok(Tier::Lib),
            "bsp" => Ok(Tier::Bsp),
            "unittest" => Ok(Tier::Unittest),
            "app" => Ok(Tier::App),
            "target" => Ok(Tier::Target),
            _ => Err(UnknownTier(s.to_string())),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
