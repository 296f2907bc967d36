//! Post model

use chrono::NaiveDateTime;
use serde::Serialize;

use super::error::{ContentError, Result};
use super::FrontMatter;

/// File extension of every post
pub const POST_EXTENSION: &str = ".md";

/// A blog post backed by a single markdown file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    /// Post title, copied verbatim from the metadata block
    pub title: String,

    /// Publication date, if the metadata block carries one
    pub date: Option<NaiveDateTime>,

    /// Whether the post is a draft
    pub draft: bool,

    /// Post tags, in source order
    pub tags: Vec<String>,

    /// Raw markdown after the metadata block
    pub body: String,

    /// Storage filename, e.g. `my-post.md`
    pub identifier: String,
}

impl Post {
    /// Create a post with a freshly derived identifier
    pub fn new(title: impl Into<String>, date: NaiveDateTime) -> Self {
        let title = title.into();
        let identifier = identifier_for(&title);
        Self {
            title,
            date: Some(date),
            draft: false,
            tags: Vec::new(),
            body: String::new(),
            identifier,
        }
    }

    /// Parse a post from its source text.
    ///
    /// `identifier` is the file the text came from; pass `None` when the text
    /// did not come from disk and let the caller fill it in.
    pub fn from_source(content: &str, identifier: Option<&str>) -> Result<Self> {
        let (fm, body) = FrontMatter::parse(content)?;
        if fm.title.is_empty() {
            return Err(ContentError::MissingTitle);
        }

        Ok(Self {
            title: fm.title,
            date: fm.date,
            draft: fm.draft,
            tags: fm.tags,
            body: body.to_string(),
            identifier: identifier.unwrap_or_default().to_string(),
        })
    }

    /// Serialize back to the on-disk format
    pub fn to_source(&self) -> String {
        let fm = FrontMatter {
            title: self.title.clone(),
            date: self.date,
            draft: self.draft,
            tags: self.tags.clone(),
        };
        fm.render() + &self.body
    }

    /// Publication date formatted as `YYYY-MM-DD`, empty when unset
    pub fn date_string(&self) -> String {
        self.date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

/// Derive a storage filename from a title.
///
/// Lowercases, turns spaces into hyphens and drops `'` and `"`. Every other
/// character is kept, so `Hello World!` becomes `hello-world!.md`.
pub fn identifier_for(title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .filter(|c| *c != '\'' && *c != '"')
        .map(|c| if c == ' ' { '-' } else { c })
        .collect();
    format!("{}{}", slug, POST_EXTENSION)
}

/// Order posts newest first; undated posts go last, ties by title
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.title.cmp(&b.title)));
}

/// Check that a caller-supplied filename names a post inside the content directory
pub fn is_valid_identifier(identifier: &str) -> bool {
    !identifier.is_empty()
        && identifier.len() > POST_EXTENSION.len()
        && identifier.ends_with(POST_EXTENSION)
        && !identifier.contains(['/', '\\', '\0'])
}
