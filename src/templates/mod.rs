//! Editor pages rendered with Tera
//!
//! All templates are embedded in the binary. Autoescaping stays on for every
//! `.html` template since post titles and sources are user text.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::content::Post;

/// Template renderer with the embedded editor pages
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all editor templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("editor/layout.html")),
            ("index.html", include_str!("editor/index.html")),
            ("edit.html", include_str!("editor/edit.html")),
            ("new.html", include_str!("editor/new.html")),
        ])?;

        tera.register_filter("truncate_chars", truncate_chars_filter);
        tera.register_filter("date_format", date_format_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// Post list
    pub fn index(&self, posts: &[Post], has_unpushed: bool) -> Result<String> {
        let rows: Vec<PostRow> = posts.iter().map(PostRow::from).collect();
        let mut context = Context::new();
        context.insert("posts", &rows);
        context.insert("has_unpushed", &has_unpushed);
        self.render("index.html", &context)
    }

    /// Editor for one post. `source` is the raw file, `preview` rendered HTML.
    pub fn edit(&self, post: &Post, source: &str, preview: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("post", &PostRow::from(post));
        context.insert("source", source);
        context.insert("preview", preview);
        self.render("edit.html", &context)
    }

    /// New post form
    pub fn new_post(&self) -> Result<String> {
        self.render("new.html", &Context::new())
    }
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };

    if s.chars().count() <= length {
        Ok(tera::Value::String(s))
    } else {
        let truncated: String = s.chars().take(length).collect();
        Ok(tera::Value::String(format!("{}…", truncated.trim_end())))
    }
}

/// Tera filter: reformat a `YYYY-MM-DD` date
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "YYYY-MM-DD".to_string(),
    };

    // "LL" is the long form, e.g. "May 30, 2023"
    if format == "LL" {
        if let Ok(date) = chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
            return Ok(tera::Value::String(date.format("%B %d, %Y").to_string()));
        }
    }

    Ok(tera::Value::String(s))
}

/// A post as the templates see it
#[derive(Debug, Clone, Serialize)]
pub struct PostRow {
    pub title: String,
    pub identifier: String,
    pub date: String,
    pub draft: bool,
    pub tags: Vec<String>,
    pub excerpt: Option<String>,
}

impl From<&Post> for PostRow {
    fn from(post: &Post) -> Self {
        let excerpt = post
            .body
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string);

        Self {
            title: post.title.clone(),
            identifier: post.identifier.clone(),
            date: post.date_string(),
            draft: post.draft,
            tags: post.tags.clone(),
            excerpt,
        }
    }
}
