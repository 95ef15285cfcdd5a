//! syscfg - configuration resolution for firmware builds
//!
//! Many packages contribute setting definitions and value overrides. This
//! crate merges them tier by tier into one conflict-checked configuration,
//! resolves symbolic references, allocates task and interrupt priorities,
//! and emits the result as `include/syscfg/syscfg.h`.

pub mod config;
pub mod error;
pub mod header;
pub mod logging;
pub mod package;
pub mod pipeline;
pub mod resolve;
pub mod symbol;

pub use config::{ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig, ToolSettings};
pub use error::SyscfgError;
pub use header::{ensure_written, header_path, render_header, WriteOutcome};
pub use package::{FeatureSet, ManifestPackage, Package, PackageId, PackageRef, SettingDef};
pub use pipeline::{Pipeline, PipelineConfig, PipelineError, PipelineReport};
pub use resolve::{
    Ambiguity, Point, PriorityClass, Resolution, ResolveInput, Roster, Setting, SettingKind,
    Source,
};
pub use syscfg_tier::Tier;
