//! Editor configuration (hugs.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Name of the optional config file in the site directory
pub const CONFIG_FILE: &str = "hugs.yml";

/// Main editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Posts directory, relative to the site directory
    pub content_dir: String,
    pub port: u16,
    pub ip: String,
    /// Commit every saved post to git
    pub commit_on_save: bool,
    pub git: GitConfig,
    pub preview: PreviewConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            content_dir: "content/post".to_string(),
            port: 8080,
            ip: "localhost".to_string(),
            commit_on_save: true,
            git: GitConfig::default(),
            preview: PreviewConfig::default(),
        }
    }
}

/// Git integration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    pub program: String,
    /// Kill git invocations that run longer than this. Unbounded when unset.
    pub timeout_secs: Option<u64>,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            timeout_secs: None,
        }
    }
}

impl GitConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Local preview server (`hugo server -D`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub enabled: bool,
    pub command: String,
    pub args: Vec<String>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            command: "hugo".to_string(),
            args: vec!["server".to_string(), "-D".to_string()],
        }
    }
}

impl EditorConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        let config: EditorConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config {:?}", path))?;
        Ok(config)
    }

    /// Load `hugs.yml` from the site directory, falling back to defaults
    pub fn load_or_default<P: AsRef<Path>>(site_dir: P) -> Result<Self> {
        let path = site_dir.as_ref().join(CONFIG_FILE);
        if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}
