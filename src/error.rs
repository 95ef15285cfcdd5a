//! Resolution errors.

use std::io;
use std::path::PathBuf;

use crate::resolve::Ambiguity;

/// Errors raised while resolving or emitting a configuration.
///
/// Everything except `Ambiguous` aborts the resolution before any header is
/// written. `Ambiguous` is only produced by [`crate::Resolution::detect_errors`].
#[derive(Debug, thiserror::Error)]
pub enum SyscfgError {
    #[error("setting {setting} specifies invalid type: {type_token} (package {package})")]
    UnknownSettingType {
        setting: String,
        type_token: String,
        package: String,
    },

    #[error("setting {setting} redefined by {package} (first defined by {first_definer})")]
    DuplicateSetting {
        setting: String,
        package: String,
        first_definer: String,
    },

    #[error("package {package} supplied more than once")]
    DuplicatePackage { package: String },

    #[error("Syscfg cycle detected for setting {setting}: {}", .chain.join(" <==> "))]
    CyclicReference { setting: String, chain: Vec<String> },

    #[error("invalid priority value: setting={setting} value={value} pkg={package}")]
    InvalidPriorityValue {
        setting: String,
        value: String,
        package: String,
    },

    #[error(
        "invalid priority value: value too great (> {max}); setting={setting} value={value} pkg={package}"
    )]
    PriorityExceedsMax {
        setting: String,
        value: String,
        max: u64,
        package: String,
    },

    #[error(
        "duplicate priority value: setting1={first} setting2={second} pkg1={first_package} pkg2={second_package} value={value}"
    )]
    PriorityCollision {
        first: String,
        second: String,
        first_package: String,
        second_package: String,
        value: String,
    },

    #[error("{}", Ambiguity::render_all(.ambiguities))]
    Ambiguous { ambiguities: Vec<Ambiguity> },

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SyscfgError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SyscfgError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short machine-readable code for the error class.
    pub fn code(&self) -> &'static str {
        match self {
            SyscfgError::UnknownSettingType { .. } => "UNKNOWN_SETTING_TYPE",
            SyscfgError::DuplicateSetting { .. } => "DUPLICATE_SETTING",
            SyscfgError::DuplicatePackage { .. } => "DUPLICATE_PACKAGE",
            SyscfgError::CyclicReference { .. } => "CYCLIC_REFERENCE",
            SyscfgError::InvalidPriorityValue { .. } => "INVALID_PRIORITY_VALUE",
            SyscfgError::PriorityExceedsMax { .. } => "PRIORITY_EXCEEDS_MAX",
            SyscfgError::PriorityCollision { .. } => "PRIORITY_COLLISION",
            SyscfgError::Ambiguous { .. } => "AMBIGUOUS",
            SyscfgError::Io { .. } => "IO",
        }
    }
}
