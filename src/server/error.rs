//! Error responses for the editor

use std::fmt::Display;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::content::ContentError;

/// Request failures, each carrying the message shown to the user
#[derive(Debug, Error)]
pub enum ServerError {
    /// Missing or invalid form field / path segment
    #[error("{0}")]
    BadRequest(String),

    /// The post to create already exists
    #[error("{0}")]
    Conflict(String),

    /// Filesystem, parse, template or git failure
    #[error("{0}")]
    Internal(String),
}

impl ServerError {
    /// Wrap any failure as a 500 with a short context prefix
    pub fn internal(context: &str, err: impl Display) -> Self {
        ServerError::Internal(format!("{}: {}", context, err))
    }

    /// Classify a content error raised while executing a request
    pub fn content(context: &str, err: ContentError) -> Self {
        match err {
            ContentError::AlreadyExists(_) => {
                ServerError::Conflict(format!("{}: {}", context, err))
            }
            err if err.is_validation() => ServerError::BadRequest(err.to_string()),
            err => ServerError::internal(context, err),
        }
    }

    pub fn template(err: anyhow::Error) -> Self {
        ServerError::internal("Error rendering template", err)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Conflict(_) => StatusCode::CONFLICT,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("Rejected request: {}", self);
        }

        let html = format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Error {code} - hugs</title>
</head>
<body>
    <h1>{code} {reason}</h1>
    <p class="error">{message}</p>
    <p><a href="/">Back to posts</a></p>
</body>
</html>"#,
            code = status.as_u16(),
            reason = status.canonical_reason().unwrap_or("Error"),
            message = tera::escape_html(&self.to_string()),
        );

        (status, Html(html)).into_response()
    }
}
