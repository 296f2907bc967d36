//! Content module - handles posts, front-matter and markdown preview

mod error;
pub mod frontmatter;
mod markdown;
mod post;
pub mod store;

pub use error::ContentError;
pub use frontmatter::FrontMatter;
pub use markdown::MarkdownRenderer;
pub use post::{identifier_for, is_valid_identifier, sort_newest_first, Post, POST_EXTENSION};
pub use store::PostStore;
