// src/core/config_manager.rs
//! Configuration: environment variables layered over an optional `cvbuilder.toml`

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_log;

pub const CONFIG_FILE_NAME: &str = "cvbuilder.toml";

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_AI_TIMEOUT_SECS: u64 = 60;
const DEFAULT_TYPST_BIN: &str = "typst";

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub ai: AiConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub typst_bin: String,
    pub workspace_dir: PathBuf,
    pub output_dir: PathBuf,
}

/// On-disk shape of `cvbuilder.toml`; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub ai: FileAiConfig,
    pub export: FileExportConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileAiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileExportConfig {
    pub typst_bin: Option<String>,
    pub workspace_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl ConfigManager {
    /// Load from the process environment and `./cvbuilder.toml` if present
    pub fn load() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        Self::load_from(&cwd.join(CONFIG_FILE_NAME))
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let file = Self::read_file(config_path)?;
        let base_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::resolve(file, &base_dir, |key| std::env::var(key).ok())
    }

    fn read_file(path: &Path) -> Result<FileConfig> {
        if !path.exists() {
            app_log!(debug, "No config file at {}, using defaults", path.display());
            return Ok(FileConfig::default());
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let file: FileConfig = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        app_log!(info, "Loaded configuration from {}", path.display());
        Ok(file)
    }

    /// Merge file values with environment lookups; the environment wins
    pub fn resolve(
        file: FileConfig,
        base_dir: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let api_key = non_empty("GEMINI_API_KEY")
            .or_else(|| non_empty("API_KEY"))
            .or(file.ai.api_key);

        let timeout_seconds = match non_empty("AI_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("AI_TIMEOUT_SECS must be a number of seconds: {}", raw))?,
            None => file.ai.timeout_seconds.unwrap_or(DEFAULT_AI_TIMEOUT_SECS),
        };

        let ai = AiConfig {
            api_key,
            model: non_empty("GEMINI_MODEL")
                .or(file.ai.model)
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            base_url: non_empty("GEMINI_API_URL")
                .or(file.ai.base_url)
                .unwrap_or_else(|| DEFAULT_GEMINI_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout_seconds,
        };

        let export = ExportConfig {
            typst_bin: non_empty("TYPST_BIN")
                .or(file.export.typst_bin)
                .unwrap_or_else(|| DEFAULT_TYPST_BIN.to_string()),
            workspace_dir: non_empty("CVBUILDER_WORKSPACE")
                .map(PathBuf::from)
                .or(file.export.workspace_dir)
                .map(|p| Self::normalize_path(base_dir, &p))
                .unwrap_or_else(|| std::env::temp_dir().join("cvbuilder")),
            output_dir: non_empty("CVBUILDER_OUTPUT")
                .map(PathBuf::from)
                .or(file.export.output_dir)
                .map(|p| Self::normalize_path(base_dir, &p))
                .unwrap_or_else(|| base_dir.join("out")),
        };

        Ok(Self { ai, export })
    }

    fn normalize_path(base: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        }
    }

    /// Ensure the workspace and output directories exist
    pub async fn ensure_directories(&self) -> Result<()> {
        use crate::core::FsOps;

        FsOps::ensure_dir_exists(&self.export.workspace_dir).await?;
        FsOps::ensure_dir_exists(&self.export.output_dir).await?;
        Ok(())
    }
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
