//! hugs-rs: a local web editor for Hugo blog posts
//!
//! Lists, edits and creates the markdown posts of a Hugo site, commits every
//! save to git and can run `hugo server` alongside for previews.

pub mod commands;
pub mod config;
pub mod content;
pub mod logging;
pub mod preview;
pub mod server;
pub mod templates;
pub mod vcs;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// The editor application for one site
#[derive(Debug, Clone)]
pub struct Hugs {
    /// Editor configuration
    pub config: config::EditorConfig,
    /// Site directory, also the git repository root
    pub base_dir: PathBuf,
    /// Directory holding the posts
    pub content_dir: PathBuf,
}

impl Hugs {
    /// Create a new instance from a site directory, reading `hugs.yml` if present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let config = config::EditorConfig::load_or_default(base_dir.as_ref())?;
        Ok(Self::with_config(base_dir, config))
    }

    /// Create an instance with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::EditorConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let content_dir = base_dir.join(&config.content_dir);
        Self {
            config,
            base_dir,
            content_dir,
        }
    }

    /// Post store over the content directory
    pub fn store(&self) -> content::PostStore {
        content::PostStore::new(&self.content_dir)
    }

    /// Git bridge for the site repository
    pub fn git(&self) -> vcs::GitBridge {
        vcs::GitBridge::from_config(&self.base_dir, &self.config.git)
    }

    /// Create a new draft post
    pub fn new_post(&self, title: &str) -> Result<content::Post> {
        commands::new::run(self, title)
    }

    /// Run the editor server until interrupted
    pub async fn serve(&self) -> Result<()> {
        server::start(self).await
    }
}
