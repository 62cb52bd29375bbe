//! Host settings for quickscan: analyzer tuning and the default log filter,
//! loaded from the environment, a config file, or built-in defaults.
#![allow(missing_docs)]

use anyhow::{Context, anyhow};
use quickscan_core::AnalyzerSettings;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub const CONFIG_PATH_VAR: &str = "QUICKSCAN_CONFIG_PATH";
pub const CONFIG_JSON_VAR: &str = "QUICKSCAN_CONFIG_JSON";

const DEFAULT_LOG_FILTER: &str = "info,scan::analyzer=info";

/// Source that produced the settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SettingsSource {
    #[default]
    Default,
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

/// Top-level host settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScannerSettings {
    /// Cool-down after a failed analysis pass and the capture resolution
    /// requested from the camera. Shorter cool-downs retry sooner but keep a
    /// failing engine busier.
    pub analyzer: AnalyzerSettings,
    /// `EnvFilter` directives used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            analyzer: AnalyzerSettings::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ScannerSettings {
    /// Load settings using environment variables.
    /// Evaluation order:
    /// 1) `$QUICKSCAN_CONFIG_PATH` (TOML or JSON file),
    /// 2) `$QUICKSCAN_CONFIG_JSON` (inline JSON),
    /// 3) the first default file found in the working directory,
    /// 4) defaults.
    pub fn load_from_env() -> anyhow::Result<(Self, SettingsSource)> {
        let base = env::current_dir()
            .context("failed to resolve the working directory")?;
        Self::load_with(|name| env::var(name).ok(), &base)
    }

    /// [`load_from_env`](Self::load_from_env) with an injectable variable
    /// lookup and base directory for the default files.
    pub fn load_with(
        lookup: impl Fn(&str) -> Option<String>,
        base: &Path,
    ) -> anyhow::Result<(Self, SettingsSource)> {
        let (settings, source) = Self::resolve(lookup, base)?;
        settings.validate().with_context(|| {
            format!("invalid quickscan settings from {source:?}")
        })?;
        tracing::debug!(?source, "quickscan settings loaded");
        Ok((settings, source))
    }

    fn resolve(
        lookup: impl Fn(&str) -> Option<String>,
        base: &Path,
    ) -> anyhow::Result<(Self, SettingsSource)> {
        if let Some(path_str) = lookup(CONFIG_PATH_VAR)
            && !path_str.trim().is_empty()
        {
            let path = PathBuf::from(path_str);
            let settings = Self::load_from_file(&path)?;
            return Ok((settings, SettingsSource::EnvPath(path)));
        }

        if let Some(raw) = lookup(CONFIG_JSON_VAR)
            && !raw.trim().is_empty()
        {
            let parsed = Self::parse_json(&raw)
                .with_context(|| format!("failed to parse {CONFIG_JSON_VAR}"))?;
            return Ok((parsed, SettingsSource::EnvInline));
        }

        if let Some(path) = Self::find_default_file(base) {
            let settings = Self::load_from_file(&path)?;
            return Ok((settings, SettingsSource::File(path)));
        }

        Ok((Self::default(), SettingsSource::Default))
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path).with_context(|| {
            format!("failed to read quickscan settings from {}", path.display())
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::parse_json(&contents).with_context(|| {
                format!("invalid quickscan settings {}", path.display())
            }),
            Some("toml") | Some("tml") => {
                toml::from_str(&contents).map_err(|err| {
                    anyhow!(
                        "invalid quickscan settings {}: {}",
                        path.display(),
                        err
                    )
                })
            }
            _ => Self::parse_from_str(&contents, &path.display().to_string()),
        }
    }

    pub fn parse_from_str(
        contents: &str,
        origin: &str,
    ) -> anyhow::Result<Self> {
        toml::from_str(contents).or_else(|toml_err| {
            serde_json::from_str(contents).map_err(|json_err| {
                anyhow!(
                    "failed to parse quickscan settings {}: toml error: {}; json error: {}",
                    origin,
                    toml_err,
                    json_err
                )
            })
        })
    }

    pub fn parse_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw)
            .map_err(|err| anyhow!("invalid quickscan settings json: {err}"))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.analyzer.validate()?;
        if self.log_filter.trim().is_empty() {
            return Err(anyhow!("log_filter must not be empty"));
        }
        Ok(())
    }

    fn find_default_file(base: &Path) -> Option<PathBuf> {
        const CANDIDATES: &[&str] = &[
            "quickscan.toml",
            "quickscan.json",
            "config/quickscan.toml",
            "config/quickscan.json",
        ];

        CANDIDATES
            .iter()
            .map(|candidate| base.join(candidate))
            .find(|path| path.exists())
    }
}
