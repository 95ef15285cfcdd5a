//! Tool configuration
//!
//! Layers, lowest precedence first:
//! 1. Built-in defaults
//! 2. Project config (`<project>/syscfg.toml`)
//! 3. CLI flags

mod defaults;
mod effective;
mod merge;
mod settings;

pub use defaults::BuiltinDefaults;
pub use effective::{ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig, PROJECT_CONFIG_FILE};
pub use merge::{deep_merge, merge_layers};
pub use settings::ToolSettings;
