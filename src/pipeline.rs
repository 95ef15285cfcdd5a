//! Pipeline orchestration
//!
//! One generation run:
//! - Load tool configuration (defaults, project file, CLI)
//! - Discover and load package manifests
//! - Resolve, log the summary, check ambiguities
//! - Allocate priorities, emit the header, write it if it changed

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ConfigError, ConfigSource, EffectiveConfig, ToolSettings, PROJECT_CONFIG_FILE};
use crate::error::SyscfgError;
use crate::header::{ensure_written, header_path, render_header};
use crate::package::{discover, ManifestError, ManifestPackage, Package};
use crate::resolve::{Ambiguity, Point, Resolution, ResolveInput};

/// Schema identifier of the run report
pub const REPORT_SCHEMA_ID: &str = "syscfg/report@1";

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("{0}")]
    Resolution(#[from] SyscfgError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Config(_) => 1,
            PipelineError::Serialization(_) => 1,
            PipelineError::Manifest(_) => 2,
            PipelineError::Resolution(SyscfgError::Ambiguous { .. }) => 4,
            PipelineError::Resolution(SyscfgError::Io { .. }) => 5,
            PipelineError::Resolution(_) => 3,
        }
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory searched for manifests and `syscfg.toml`
    pub project_root: PathBuf,

    /// Highest-precedence configuration layer, built from CLI flags
    pub cli_overrides: Option<serde_json::Value>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            cli_overrides: None,
        }
    }
}

impl PipelineConfig {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            cli_overrides: None,
        }
    }

    pub fn with_overrides(mut self, overrides: serde_json::Value) -> Self {
        self.cli_overrides = Some(overrides);
        self
    }

    pub fn project_config_path(&self) -> PathBuf {
        self.project_root.join(PROJECT_CONFIG_FILE)
    }
}

/// Outcome of a generation run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub schema_id: String,
    pub created_at: DateTime<Utc>,
    pub project_root: PathBuf,
    pub header_path: PathBuf,

    /// False when the existing header already matched
    pub written: bool,

    pub header_sha256: String,

    /// SHA-256 of the canonical JSON of the final settings map
    pub resolution_key: String,

    pub package_count: usize,
    pub setting_count: usize,
    pub orphans: BTreeMap<String, Vec<Point>>,
    pub ambiguities: Vec<Ambiguity>,
    pub config_sources: Vec<ConfigSource>,
}

impl PipelineReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Pipeline execution context
pub struct Pipeline {
    config: PipelineConfig,
    effective: Option<EffectiveConfig>,
    settings: Option<ToolSettings>,
    packages: Vec<ManifestPackage>,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            effective: None,
            settings: None,
            packages: Vec::new(),
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.config.project_root
    }

    /// Merge the configuration layers. Subsequent calls reuse the result.
    pub fn load_config(&mut self) -> PipelineResult<&ToolSettings> {
        if self.settings.is_none() {
            let project_path = self.config.project_config_path();
            let effective =
                EffectiveConfig::build(Some(&project_path), self.config.cli_overrides.clone())?;
            self.settings = Some(effective.settings()?);
            self.effective = Some(effective);
        }
        self.settings
            .as_ref()
            .ok_or_else(|| ConfigError::Validation("settings not loaded".to_string()).into())
    }

    /// Discover manifests under the project root.
    pub fn load_packages(&mut self) -> PipelineResult<usize> {
        let settings = self.load_config()?.clone();
        self.packages = discover(
            &self.config.project_root,
            &settings.manifest_name,
            &settings.exclude,
        )?;
        info!(
            count = self.packages.len(),
            root = %self.config.project_root.display(),
            "discovered packages"
        );
        Ok(self.packages.len())
    }

    pub fn packages(&self) -> &[ManifestPackage] {
        &self.packages
    }

    fn settings(&self) -> PipelineResult<&ToolSettings> {
        self.settings
            .as_ref()
            .ok_or_else(|| ConfigError::Validation("settings not loaded".to_string()).into())
    }

    /// Resolve the loaded packages and enforce the ambiguity policy.
    /// Priorities are not yet allocated.
    pub fn resolve(&self) -> PipelineResult<Resolution> {
        let settings = self.settings()?;
        let packages: Vec<&dyn Package> = self.packages.iter().map(|p| p as &dyn Package).collect();

        let mut input = ResolveInput::new(packages).with_apis(settings.apis.iter().cloned());
        input.injected = settings.injected_values();
        input.features = settings.feature_seed();

        let res = Resolution::resolve(&input)?;
        res.log_summary();

        if settings.fail_on_ambiguity {
            res.detect_errors()?;
        } else {
            for ambiguity in &res.ambiguities {
                warn!("ambiguous setting {}", ambiguity.text());
            }
        }

        Ok(res)
    }

    /// Load everything and produce a finalized resolution without writing.
    pub fn show(&mut self) -> PipelineResult<Resolution> {
        self.load_packages()?;
        let mut res = self.resolve()?;
        res.finalize()?;
        Ok(res)
    }

    /// Render the header a run would write, without touching disk.
    pub fn preview(&mut self) -> PipelineResult<String> {
        let res = self.show()?;
        Ok(render_header(&res))
    }

    /// Execute the full pipeline.
    pub fn run(&mut self) -> PipelineResult<PipelineReport> {
        self.load_packages()?;
        let mut res = self.resolve()?;

        let target_root = self.settings()?.target_root_in(&self.config.project_root);
        let outcome = ensure_written(&mut res, &target_root)?;
        let resolution_key = res.resolution_key()?;

        if outcome.written {
            info!(path = %outcome.path.display(), "wrote header");
        } else {
            info!(path = %outcome.path.display(), "header up to date");
        }

        Ok(PipelineReport {
            schema_id: REPORT_SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            project_root: self.config.project_root.clone(),
            header_path: outcome.path,
            written: outcome.written,
            header_sha256: outcome.sha256,
            resolution_key,
            package_count: self.packages.len(),
            setting_count: res.settings.len(),
            orphans: res.orphans.clone(),
            ambiguities: res.ambiguities.clone(),
            config_sources: self
                .effective
                .as_ref()
                .map(|e| e.sources.clone())
                .unwrap_or_default(),
        })
    }

    /// Where a run would write the header.
    pub fn header_path(&mut self) -> PipelineResult<PathBuf> {
        let project = self.config.project_root.clone();
        let root = self.load_config()?.target_root_in(&project);
        Ok(header_path(&root))
    }
}
