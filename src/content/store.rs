//! Post store - reads and writes posts in the content directory
//!
//! Every operation goes straight to the filesystem. There is no locking:
//! two saves of the same post race and the last write wins.

use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::error::{ContentError, Result};
use super::post::{is_valid_identifier, POST_EXTENSION};
use super::Post;

/// Flat directory of `*.md` posts
#[derive(Debug, Clone)]
pub struct PostStore {
    dir: PathBuf,
}

impl PostStore {
    /// Create a store over an existing directory
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// The content directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a post file, after checking the identifier stays inside the directory
    pub fn path_of(&self, identifier: &str) -> Result<PathBuf> {
        if !is_valid_identifier(identifier) {
            return Err(ContentError::InvalidIdentifier(identifier.to_string()));
        }
        Ok(self.dir.join(identifier))
    }

    /// Load all posts, in directory order.
    ///
    /// A single unreadable or unparseable post fails the whole listing.
    pub fn list(&self) -> Result<Vec<Post>> {
        tracing::debug!("Listing posts in {:?}", self.dir);

        let entries = fs::read_dir(&self.dir).map_err(|e| ContentError::io(&self.dir, e))?;
        let mut posts = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| ContentError::io(&self.dir, e))?;
            let path = entry.path();
            if !path.is_file() || !is_markdown_file(&path) {
                continue;
            }

            let identifier = entry.file_name().to_string_lossy().into_owned();
            let post = self.load_path(&path, &identifier).map_err(|e| {
                tracing::error!("Failed to read post {}: {}", identifier, e);
                ContentError::Post {
                    identifier: identifier.clone(),
                    source: Box::new(e),
                }
            })?;
            posts.push(post);
        }

        tracing::debug!("Found {} posts", posts.len());
        Ok(posts)
    }

    /// Load a single post by filename
    pub fn load(&self, identifier: &str) -> Result<Post> {
        let path = self.path_of(identifier)?;
        self.load_path(&path, identifier)
    }

    /// Load a post together with its raw file contents, as the editor shows it
    pub fn load_with_source(&self, identifier: &str) -> Result<(Post, String)> {
        let source = self.read_source(identifier)?;
        let post = Post::from_source(&source, Some(identifier))?;
        Ok((post, source))
    }

    /// Raw file contents
    pub fn read_source(&self, identifier: &str) -> Result<String> {
        let path = self.path_of(identifier)?;
        fs::read_to_string(&path).map_err(|e| ContentError::io(path, e))
    }

    fn load_path(&self, path: &Path, identifier: &str) -> Result<Post> {
        tracing::debug!("Reading post {:?}", path);
        let content = fs::read_to_string(path).map_err(|e| ContentError::io(path, e))?;
        Post::from_source(&content, Some(identifier))
    }

    /// Create a draft skeleton for `title`, dated today.
    ///
    /// Refuses to overwrite an existing file with the same derived name.
    pub fn create_new(&self, title: &str) -> Result<Post> {
        let mut post = Post::new(title, Local::now().naive_local());
        post.draft = true;

        tracing::info!("Creating new post {:?} in {:?}", title, self.dir);
        let path = self.path_of(&post.identifier)?;

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => ContentError::AlreadyExists(post.identifier.clone()),
                _ => ContentError::io(&path, e),
            })?;
        file.write_all(post.to_source().as_bytes())
            .map_err(|e| ContentError::io(&path, e))?;

        Ok(post)
    }

    /// Serialize a post and overwrite its file
    pub fn save(&self, post: &Post) -> Result<()> {
        tracing::debug!(
            "Saving post {} (draft: {}) in {:?}",
            post.identifier,
            post.draft,
            self.dir
        );
        self.write(&post.identifier, &post.to_source())
    }

    /// Overwrite a post file with raw editor content, byte for byte
    pub fn save_source(&self, identifier: &str, content: &str) -> Result<()> {
        tracing::debug!("Saving raw source of {} in {:?}", identifier, self.dir);
        self.write(identifier, content)
    }

    fn write(&self, identifier: &str, content: &str) -> Result<()> {
        let path = self.path_of(identifier)?;
        fs::write(&path, content).map_err(|e| ContentError::io(path, e))
    }
}

/// Check if a file is a markdown post
fn is_markdown_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(POST_EXTENSION))
        .unwrap_or(false)
}
