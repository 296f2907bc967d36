//! Front-matter parsing and serialization
//!
//! A post file starts with an optional metadata block:
//!
//! ```text
//! ---
//! title: Hello World
//! date: 2024-01-15
//! draft: true
//! tags: [rust, hugo]
//! ---
//!
//! Post body...
//! ```
//!
//! The block is a flat list of `key: value` lines, not YAML. Only `title`,
//! `date`, `draft` and `tags` are understood; anything else is ignored.

use chrono::{NaiveDate, NaiveDateTime};

use super::error::{ContentError, Result};

/// Line that opens and closes the metadata block
const DELIMITER: &str = "---";

/// Accepted `date` formats, tried in order
const DATE_FORMATS: [&str; 4] = [
    "%Y-%m-%d",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%SZ",
];

/// What an unset date serializes to
const ZERO_DATE: &str = "0001-01-01";

/// Metadata read from (or written to) a post's front-matter block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    /// Verbatim title, quote characters included. Empty when absent.
    pub title: String,
    pub date: Option<NaiveDateTime>,
    pub draft: bool,
    pub tags: Vec<String>,
}

/// Location of the metadata block inside a source text
struct Block<'a> {
    /// Lines between the delimiters
    meta: &'a str,
    /// Byte offset where `meta` starts
    meta_start: usize,
    /// Byte offset of the closing delimiter, or end of input when unterminated
    meta_end: usize,
    /// Text after the closing delimiter and its separator line
    body: &'a str,
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, body)
    ///
    /// Content without an opening `---` line yields default metadata and the
    /// whole input as body. A missing title is not an error at this level;
    /// see [`super::Post::from_source`].
    pub fn parse(content: &str) -> Result<(Self, &str)> {
        let Some(block) = locate(content) else {
            return Ok((FrontMatter::default(), content));
        };

        let mut fm = FrontMatter::default();
        for (key, value) in block.meta.lines().filter_map(key_value) {
            match key {
                "title" => fm.title = value.to_string(),
                "date" => fm.date = Some(parse_date(value)?),
                "draft" => fm.draft = value == "true",
                "tags" => fm.tags = parse_tags(value),
                _ => {}
            }
        }

        Ok((fm, block.body))
    }

    /// Find the title without interpreting any other key
    pub fn extract_title(content: &str) -> Result<String> {
        locate(content)
            .and_then(|block| {
                block
                    .meta
                    .lines()
                    .filter_map(key_value)
                    .find(|(key, value)| *key == "title" && !value.is_empty())
                    .map(|(_, value)| value.to_string())
            })
            .ok_or(ContentError::MissingTitle)
    }

    /// Render the metadata block, including the empty line that separates it from the body
    pub fn render(&self) -> String {
        let date = self
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| ZERO_DATE.to_string());

        let mut out = format!(
            "{}\ntitle: {}\ndate: {}\ndraft: {}\n",
            DELIMITER, self.title, date, self.draft
        );
        if !self.tags.is_empty() {
            out.push_str(&format!("tags: [{}]\n", self.tags.join(", ")));
        }
        out.push_str(DELIMITER);
        out.push_str("\n\n");
        out
    }
}

/// Set the `draft` key of a raw source, leaving every other byte untouched.
///
/// An existing `draft:` line is replaced; otherwise one is appended to the
/// block. Content without a metadata block is returned unchanged.
pub fn set_draft(content: &str, draft: bool) -> String {
    let Some(block) = locate(content) else {
        return content.to_string();
    };
    let line = format!("draft: {}", draft);

    let mut offset = block.meta_start;
    for raw in block.meta.split_inclusive('\n') {
        let text = raw.trim_end_matches(['\n', '\r']);
        if matches!(key_value(text), Some(("draft", _))) {
            let end = offset + text.len();
            return format!("{}{}{}", &content[..offset], line, &content[end..]);
        }
        offset += raw.len();
    }

    let (head, tail) = content.split_at(block.meta_end);
    if head.ends_with('\n') {
        format!("{}{}\n{}", head, line, tail)
    } else {
        format!("{}\n{}{}", head, line, tail)
    }
}

/// Find the metadata block. `None` when the first line is not a delimiter.
fn locate(content: &str) -> Option<Block<'_>> {
    let mut lines = content.split_inclusive('\n');
    let first = lines.next()?;
    if !is_delimiter(first) {
        return None;
    }

    let meta_start = first.len();
    let mut offset = meta_start;
    for line in lines {
        if is_delimiter(line) {
            let rest = &content[offset + line.len()..];
            // The blank line written after the block belongs to the block
            let body = rest
                .strip_prefix("\r\n")
                .or_else(|| rest.strip_prefix('\n'))
                .unwrap_or(rest);
            return Some(Block {
                meta: &content[meta_start..offset],
                meta_start,
                meta_end: offset,
                body,
            });
        }
        offset += line.len();
    }

    // Unterminated: everything after the opening line is metadata
    Some(Block {
        meta: &content[meta_start..],
        meta_start,
        meta_end: content.len(),
        body: "",
    })
}

fn is_delimiter(line: &str) -> bool {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);
    line == DELIMITER
}

/// Split a metadata line on its first colon
fn key_value(line: &str) -> Option<(&str, &str)> {
    line.split_once(':')
        .map(|(key, value)| (key.trim(), value.trim()))
}

/// Parse a date value against [`DATE_FORMATS`]
fn parse_date(value: &str) -> Result<NaiveDateTime> {
    for fmt in DATE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(dt);
        }
        // Date-only formats don't satisfy NaiveDateTime
        if let Some(dt) = NaiveDate::parse_from_str(value, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return Ok(dt);
        }
    }

    tracing::debug!("Invalid date format: {:?}", value);
    Err(ContentError::InvalidDate(value.to_string()))
}

/// Parse `[a, b]` or `a, b` into trimmed tags
fn parse_tags(value: &str) -> Vec<String> {
    let value = value.strip_prefix('[').unwrap_or(value);
    let value = value.strip_suffix(']').unwrap_or(value).trim();
    if value.is_empty() {
        return Vec::new();
    }
    value.split(',').map(|tag| tag.trim().to_string()).collect()
}
