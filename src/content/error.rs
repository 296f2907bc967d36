//! Errors raised while reading, parsing or writing posts

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from the front-matter codec and the post store
#[derive(Debug, Error)]
pub enum ContentError {
    /// The post file does not exist
    #[error("post not found: {}", .0.display())]
    NotFound(PathBuf),

    /// No non-empty `title` in the metadata block
    #[error("title not found in content")]
    MissingTitle,

    /// A `date` key whose value matches none of the accepted formats
    #[error("invalid date format: {0:?}")]
    InvalidDate(String),

    /// `create_new` refused to overwrite an existing post
    #[error("post already exists: {0}")]
    AlreadyExists(String),

    /// A filename that is empty, escapes the content directory or is not markdown
    #[error("invalid post filename: {0:?}")]
    InvalidIdentifier(String),

    /// A post in a listing failed to load
    #[error("reading post {identifier}: {source}")]
    Post {
        identifier: String,
        #[source]
        source: Box<ContentError>,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ContentError {
    /// Wrap an I/O error, mapping `NotFound` to [`ContentError::NotFound`]
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => ContentError::NotFound(path),
            _ => ContentError::Io { path, source },
        }
    }

    /// Whether this error stems from bad caller input rather than the filesystem
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ContentError::MissingTitle | ContentError::InvalidIdentifier(_)
        )
    }
}

pub type Result<T, E = ContentError> = std::result::Result<T, E>;
