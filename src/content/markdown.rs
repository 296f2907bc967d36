//! Markdown preview with syntax highlighting

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

const DEFAULT_THEME: &str = "InspiredGitHub";

/// Renders post bodies to HTML for the editor's preview pane
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
}

/// Fenced or indented code block being collected
struct CodeBlock {
    lang: Option<String>,
    code: String,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_theme(DEFAULT_THEME)
    }

    /// Create with a specific syntect theme
    pub fn with_theme(theme: &str) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: theme.to_string(),
        }
    }

    /// Render markdown to HTML.
    ///
    /// The body is expected without its front-matter block.
    pub fn render(&self, markdown: &str) -> String {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES;
        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        let mut block: Option<CodeBlock> = None;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                        _ => None,
                    };
                    block = Some(CodeBlock {
                        lang,
                        code: String::new(),
                    });
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some(done) = block.take() {
                        let highlighted = self.highlight_code(&done.code, done.lang.as_deref());
                        events.push(Event::Html(CowStr::from(highlighted)));
                    }
                }
                Event::Text(text) if block.is_some() => {
                    if let Some(open) = block.as_mut() {
                        open.code.push_str(&text);
                    }
                }
                event if block.is_none() => events.push(event),
                // Anything else inside a code block is dropped
                _ => {}
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let lang = lang.unwrap_or("text");

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let highlighted = self
            .theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next())
            .and_then(|theme| {
                highlighted_html_for_string(code, &self.syntax_set, syntax, theme).ok()
            });

        match highlighted {
            Some(html) => format!(r#"<div class="highlight language-{}">{}</div>"#, lang, html),
            None => format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                lang,
                tera::escape_html(code)
            ),
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}
