//! Create a new post

use anyhow::{bail, Result};

use crate::content::Post;
use crate::Hugs;

/// Create a draft post named after `title`, dated today
pub fn create_post(hugs: &Hugs, title: &str) -> Result<Post> {
    let title = title.trim();
    if title.is_empty() {
        bail!("Title is required");
    }

    let post = hugs.store().create_new(title)?;
    tracing::info!("Created new post {}", post.identifier);
    Ok(post)
}

/// Run the new command
pub fn run(hugs: &Hugs, title: &str) -> Result<Post> {
    let post = create_post(hugs, title)?;
    println!("Created: {:?}", hugs.content_dir.join(&post.identifier));
    Ok(post)
}
