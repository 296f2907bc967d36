//! List posts

use anyhow::Result;

use crate::content::{sort_newest_first, Post};
use crate::Hugs;

/// Load all posts, newest first
pub fn sorted_posts(hugs: &Hugs) -> Result<Vec<Post>> {
    let mut posts = hugs.store().list()?;
    sort_newest_first(&mut posts);
    Ok(posts)
}

/// Print one line per post
pub fn run(hugs: &Hugs) -> Result<()> {
    let posts = sorted_posts(hugs)?;
    println!("Posts ({}):", posts.len());
    for post in posts {
        let marker = if post.draft { " (draft)" } else { "" };
        println!(
            "  {} - {}{} [{}]",
            post.date_string(),
            post.title,
            marker,
            post.identifier
        );
    }
    Ok(())
}
