//! Editor web server
//!
//! Each request runs one post store operation and renders a page or
//! redirects. Nothing is cached between requests: every handler goes to the
//! filesystem, so concurrent saves of one post race and the last one wins.

mod error;

pub use error::ServerError;

use anyhow::{bail, Result};
use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
    routing::{get, post},
    Form, Router,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::content::frontmatter::set_draft;
use crate::content::{
    is_valid_identifier, sort_newest_first, FrontMatter, MarkdownRenderer, PostStore,
};
use crate::preview::PreviewServer;
use crate::templates::TemplateRenderer;
use crate::vcs::{commit_message, GitBridge};
use crate::Hugs;

/// Characters escaped in a single URL path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Server state
pub struct AppState {
    pub store: PostStore,
    pub templates: TemplateRenderer,
    pub markdown: MarkdownRenderer,
    pub git: GitBridge,
    /// Commit each save through `git`
    pub commit_on_save: bool,
}

impl AppState {
    pub fn new(hugs: &Hugs) -> Result<Self> {
        Ok(Self {
            store: hugs.store(),
            templates: TemplateRenderer::new()?,
            markdown: MarkdownRenderer::new(),
            git: hugs.git(),
            commit_on_save: hugs.config.commit_on_save,
        })
    }

    /// Path of a post relative to the repository root, as `git add` wants it
    fn repo_path(&self, identifier: &str) -> PathBuf {
        let dir = self.store.dir();
        dir.strip_prefix(self.git.repo_dir())
            .unwrap_or(dir)
            .join(identifier)
    }
}

#[derive(Debug, Deserialize)]
struct NewPostForm {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct SaveForm {
    #[serde(default)]
    filename: String,
    #[serde(default)]
    content: String,
    /// Checkbox: `on` when ticked, absent otherwise
    draft: Option<String>,
}

/// Create the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/edit/", get(edit_without_filename))
        .route("/edit/:identifier", get(edit))
        .route("/new", get(new_form).post(create))
        .route("/save", post(save))
        .route("/push", get(push))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the editor server
pub async fn start(hugs: &Hugs) -> Result<()> {
    if !hugs.content_dir.is_dir() {
        tracing::error!("Content directory not found: {:?}", hugs.content_dir);
        bail!("content directory not found: {:?}", hugs.content_dir);
    }

    if hugs.config.preview.enabled {
        let preview = PreviewServer::from_config(&hugs.base_dir, &hugs.config.preview);
        match preview.spawn() {
            Ok(_) => tracing::info!("Preview server started at http://localhost:1313/"),
            Err(e) => tracing::error!("Failed to start preview server: {}", e),
        }
    }

    let state = Arc::new(AppState::new(hugs)?);
    let app = router(state);

    // Parse address - handle "localhost" specially
    let ip = hugs.config.ip.as_str();
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, hugs.config.port).parse()?;

    tracing::info!("Using content directory {:?}", hugs.content_dir);
    tracing::info!("Starting server at http://{}:{}", ip, hugs.config.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}

/// GET / - list all posts, newest first
async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, ServerError> {
    let mut posts = state
        .store
        .list()
        .map_err(|e| ServerError::internal("Error reading posts", e))?;
    sort_newest_first(&mut posts);

    let has_unpushed = state.git.has_unpushed_changes().await;
    tracing::debug!("Unpushed changes: {}", has_unpushed);

    let html = state
        .templates
        .index(&posts, has_unpushed)
        .map_err(ServerError::template)?;
    Ok(Html(html))
}

/// GET /edit/ - no filename given
async fn edit_without_filename() -> ServerError {
    ServerError::BadRequest("Filename is required".to_string())
}

/// GET /edit/{identifier} - editor for one post
async fn edit(
    State(state): State<Arc<AppState>>,
    Path(identifier): Path<String>,
) -> Result<Html<String>, ServerError> {
    if identifier.is_empty() {
        return Err(ServerError::BadRequest("Filename is required".to_string()));
    }
    if !is_valid_identifier(&identifier) {
        return Err(ServerError::BadRequest(format!(
            "Invalid filename: {}",
            identifier
        )));
    }

    let (post, source) = state
        .store
        .load_with_source(&identifier)
        .map_err(|e| ServerError::internal("Error reading post", e))?;

    let preview = state.markdown.render(&post.body);
    let html = state
        .templates
        .edit(&post, &source, &preview)
        .map_err(ServerError::template)?;
    Ok(Html(html))
}

/// GET /new - new post form
async fn new_form(State(state): State<Arc<AppState>>) -> Result<Html<String>, ServerError> {
    let html = state.templates.new_post().map_err(ServerError::template)?;
    Ok(Html(html))
}

/// POST /new - create a draft and open it in the editor
async fn create(
    State(state): State<Arc<AppState>>,
    Form(form): Form<NewPostForm>,
) -> Result<Redirect, ServerError> {
    let title = form.title.trim();
    if title.is_empty() {
        return Err(ServerError::BadRequest("Title is required".to_string()));
    }

    let post = state
        .store
        .create_new(title)
        .map_err(|e| ServerError::content("Error creating post", e))?;
    tracing::info!("Created new post {}", post.identifier);

    let location = format!(
        "/edit/{}",
        utf8_percent_encode(&post.identifier, PATH_SEGMENT)
    );
    Ok(Redirect::to(&location))
}

/// POST /save - write the editor content verbatim, then commit it
async fn save(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SaveForm>,
) -> Result<Redirect, ServerError> {
    let filename = form.filename;
    if filename.is_empty() {
        return Err(ServerError::BadRequest("Filename is required".to_string()));
    }
    if !is_valid_identifier(&filename) {
        return Err(ServerError::BadRequest(format!(
            "Invalid filename: {}",
            filename
        )));
    }

    // An unticked box clears a draft flag but never adds one
    let draft = form.draft.is_some();
    let was_draft = FrontMatter::parse(&form.content)
        .map(|(fm, _)| fm.draft)
        .unwrap_or(false);
    let content = if draft || was_draft {
        set_draft(&form.content, draft)
    } else {
        form.content
    };
    let title = FrontMatter::extract_title(&content)
        .map_err(|e| ServerError::content("Error saving post", e))?;

    state
        .store
        .save_source(&filename, &content)
        .map_err(|e| ServerError::content("Error saving post", e))?;
    tracing::info!("Post saved: {}", filename);

    if state.commit_on_save {
        let path = state.repo_path(&filename);
        if let Err(e) = state
            .git
            .stage_and_commit(&path, &commit_message(&title, draft))
            .await
        {
            tracing::warn!("Failed to commit changes to git: {}", e);
        }
    }

    Ok(Redirect::to("/"))
}

/// GET /push - push committed posts upstream
async fn push(State(state): State<Arc<AppState>>) -> Result<Redirect, ServerError> {
    state
        .git
        .push()
        .await
        .map_err(|e| ServerError::internal("Error pushing changes", e))?;
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EditorConfig, GitConfig};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    /// A site directory with an empty `content/post` and no usable git
    fn test_site() -> (TempDir, Hugs) {
        test_site_with_git(GitConfig {
            program: "hugs-test-no-git".to_string(),
            timeout_secs: None,
        })
    }

    fn test_site_with_git(git: GitConfig) -> (TempDir, Hugs) {
        let dir = TempDir::new().unwrap();
        let config = EditorConfig {
            git,
            ..Default::default()
        };
        let hugs = Hugs::with_config(dir.path(), config);
        fs::create_dir_all(&hugs.content_dir).unwrap();
        (dir, hugs)
    }

    fn app(hugs: &Hugs) -> Router {
        router(Arc::new(AppState::new(hugs).unwrap()))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn form_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    #[tokio::test]
    async fn test_index_lists_posts() {
        let (_dir, hugs) = test_site();
        fs::write(
            hugs.content_dir.join("older.md"),
            "---\ntitle: Older Post\ndate: 2023-01-01\n---\n\nold",
        )
        .unwrap();
        fs::write(
            hugs.content_dir.join("newer.md"),
            "---\ntitle: Newer Post\ndate: 2024-06-01\ndraft: true\n---\n\nnew",
        )
        .unwrap();

        let response = app(&hugs).oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        let newer = html.find("Newer Post").unwrap();
        let older = html.find("Older Post").unwrap();
        assert!(newer < older);
        assert!(html.contains("/edit/newer.md"));
        // git is unavailable, so the push link stays visible
        assert!(html.contains(r#"href="/push""#));
    }

    #[tokio::test]
    async fn test_index_fails_on_broken_post() {
        let (_dir, hugs) = test_site();
        fs::write(hugs.content_dir.join("good.md"), "---\ntitle: Good\n---\n").unwrap();
        fs::write(hugs.content_dir.join("broken-one.md"), "---\ndate: 2024-01-01\n---\n").unwrap();

        let response = app(&hugs).oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let html = body_text(response).await;
        assert!(html.contains("Error reading posts"));
        assert!(html.contains("broken-one.md"));
    }

    #[tokio::test]
    async fn test_edit_renders_editor() {
        let (_dir, hugs) = test_site();
        let source = "---\ntitle: Hello\ndate: 2024-01-15\n---\n\n# Heading\n\n```rust\nfn main() {}\n```\n";
        fs::write(hugs.content_dir.join("hello.md"), source).unwrap();

        let response = app(&hugs)
            .oneshot(get_request("/edit/hello.md"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains(r#"value="hello.md""#));
        assert!(html.contains("<textarea"));
        assert!(html.contains("title: Hello"));
        assert!(html.contains("<h1>Heading</h1>"));
        assert!(html.contains("highlight language-rust"));
    }

    #[tokio::test]
    async fn test_edit_missing_post_is_server_error() {
        let (_dir, hugs) = test_site();

        let response = app(&hugs)
            .oneshot(get_request("/edit/missing.md"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let html = body_text(response).await;
        assert!(html.contains("Error reading post"));
        assert!(html.contains("not found"));
        assert!(!html.contains("<textarea"));
    }

    #[tokio::test]
    async fn test_edit_without_filename() {
        let (_dir, hugs) = test_site();
        let response = app(&hugs).oneshot(get_request("/edit/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_edit_rejects_non_post_filename() {
        let (_dir, hugs) = test_site();
        let response = app(&hugs)
            .oneshot(get_request("/edit/..%2Fhugs.yml"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_new_form() {
        let (_dir, hugs) = test_site();
        let response = app(&hugs).oneshot(get_request("/new")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains(r#"name="title""#));
    }

    #[tokio::test]
    async fn test_create_redirects_to_editor() {
        let (_dir, hugs) = test_site();

        let response = app(&hugs)
            .oneshot(form_request("/new", "title=Hello+World%21"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/edit/hello-world!.md");

        let written = fs::read_to_string(hugs.content_dir.join("hello-world!.md")).unwrap();
        assert!(written.starts_with("---\ntitle: Hello World!\ndate: "));
        assert!(written.ends_with("draft: true\n---\n\n"));
    }

    #[tokio::test]
    async fn test_create_encodes_location() {
        let (_dir, hugs) = test_site();

        let response = app(&hugs)
            .oneshot(form_request("/new", "title=What%3F+100%25"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/edit/what%3F-100%25.md");
        assert!(hugs.content_dir.join("what?-100%.md").exists());
    }

    #[tokio::test]
    async fn test_dotted_identifiers_round_trip() {
        let (_dir, hugs) = test_site();

        let response = app(&hugs)
            .oneshot(form_request("/new", "title=.NET+Tips"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/edit/.net-tips.md");

        fs::write(hugs.content_dir.join(".hidden.md"), "---\ntitle: Hidden\n---\n").unwrap();
        let response = app(&hugs).oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("/edit/.hidden.md"));
        assert!(html.contains("/edit/.net-tips.md"));

        for uri in ["/edit/.hidden.md", "/edit/.net-tips.md"] {
            let response = app(&hugs).oneshot(get_request(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_create_without_title() {
        let (_dir, hugs) = test_site();

        for body in ["title=", "title=+++", ""] {
            let response = app(&hugs).oneshot(form_request("/new", body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{:?}", body);
        }
        assert_eq!(fs::read_dir(&hugs.content_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_create_existing_post_conflicts() {
        let (_dir, hugs) = test_site();
        let path = hugs.content_dir.join("taken.md");
        fs::write(&path, "---\ntitle: Taken\n---\n\nkeep me").unwrap();

        let response = app(&hugs)
            .oneshot(form_request("/new", "title=Taken"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(fs::read_to_string(&path).unwrap().ends_with("keep me"));
    }

    #[tokio::test]
    async fn test_save_without_repository() {
        let (_dir, hugs) = test_site();

        let response = app(&hugs)
            .oneshot(form_request(
                "/save",
                "filename=a.md&content=---%0Atitle: X%0A---%0A%0Abody",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");

        let written = fs::read_to_string(hugs.content_dir.join("a.md")).unwrap();
        assert_eq!(written, "---\ntitle: X\n---\n\nbody");
    }

    #[tokio::test]
    async fn test_save_as_draft() {
        let (_dir, hugs) = test_site();

        let response = app(&hugs)
            .oneshot(form_request(
                "/save",
                "filename=a.md&draft=on&content=---%0Atitle: X%0Adraft: false%0A---%0A%0Abody",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let written = fs::read_to_string(hugs.content_dir.join("a.md")).unwrap();
        assert_eq!(written, "---\ntitle: X\ndraft: true\n---\n\nbody");
    }

    #[tokio::test]
    async fn test_save_unticked_draft_publishes() {
        let (_dir, hugs) = test_site();

        let response = app(&hugs)
            .oneshot(form_request(
                "/save",
                "filename=a.md&content=---%0Atitle: X%0Adraft: true%0A---%0A%0Abody",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let written = fs::read_to_string(hugs.content_dir.join("a.md")).unwrap();
        assert_eq!(written, "---\ntitle: X\ndraft: false\n---\n\nbody");
    }

    #[tokio::test]
    async fn test_save_validation() {
        let (_dir, hugs) = test_site();

        let cases = [
            "content=---%0Atitle: X%0A---%0A",
            "filename=&content=---%0Atitle: X%0A---%0A",
            "filename=..%2Fescape.md&content=---%0Atitle: X%0A---%0A",
            "filename=a.md&content=no+front+matter",
            "filename=a.md&content=---%0Adate: 2024-01-01%0A---%0A",
        ];
        for body in cases {
            let response = app(&hugs).oneshot(form_request("/save", body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", body);
        }
        assert!(!hugs.content_dir.join("a.md").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_save_commits_relative_path() {
        use std::os::unix::fs::PermissionsExt;

        let scripts = TempDir::new().unwrap();
        let log = scripts.path().join("calls.log");
        let git = scripts.path().join("fake-git");
        fs::write(&git, format!("#!/bin/sh\necho \"$@\" >> {:?}\n", log)).unwrap();
        fs::set_permissions(&git, fs::Permissions::from_mode(0o755)).unwrap();

        let (_dir, hugs) = test_site_with_git(GitConfig {
            program: git.to_string_lossy().into_owned(),
            timeout_secs: None,
        });

        let response = app(&hugs)
            .oneshot(form_request(
                "/save",
                "filename=a.md&content=---%0Atitle: My Post%0A---%0A",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let calls = fs::read_to_string(&log).unwrap();
        assert_eq!(
            calls,
            "add -- content/post/a.md\ncommit -m Updated post 'My Post'\n"
        );
    }

    #[tokio::test]
    async fn test_save_skips_commit_when_disabled() {
        let (_dir, mut hugs) = test_site();
        hugs.config.commit_on_save = false;

        let response = app(&hugs)
            .oneshot(form_request(
                "/save",
                "filename=b.md&content=---%0Atitle: B%0A---%0A",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(hugs.content_dir.join("b.md").exists());
    }

    #[tokio::test]
    async fn test_push_failure_is_server_error() {
        let (_dir, hugs) = test_site();
        let response = app(&hugs).oneshot(get_request("/push")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("Error pushing changes"));
    }

    #[tokio::test]
    async fn test_start_requires_content_dir() {
        let dir = TempDir::new().unwrap();
        let hugs = Hugs::with_config(dir.path(), EditorConfig::default());
        assert!(start(&hugs).await.is_err());
    }
}
