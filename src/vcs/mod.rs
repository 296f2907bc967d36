//! Git integration - stages, commits and pushes saved posts
//!
//! Everything here shells out to the `git` binary in the site directory.
//! Callers on the save path treat failures as warnings: the post is already
//! on disk by the time a commit is attempted.

use std::borrow::Cow;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;

use crate::config::GitConfig;

/// Errors from git invocations
#[derive(Debug, Error)]
pub enum VcsError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` failed ({status}): {stderr}")]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("`{command}` timed out after {timeout:?}")]
    TimedOut { command: String, timeout: Duration },
}

/// Runs git commands against one repository
#[derive(Debug, Clone)]
pub struct GitBridge {
    program: String,
    repo_dir: PathBuf,
    timeout: Option<Duration>,
}

impl GitBridge {
    /// Bridge using `git` from `PATH` with no deadline
    pub fn new<P: AsRef<Path>>(repo_dir: P) -> Self {
        Self::from_config(repo_dir, &GitConfig::default())
    }

    pub fn from_config<P: AsRef<Path>>(repo_dir: P, config: &GitConfig) -> Self {
        Self {
            program: config.program.clone(),
            repo_dir: repo_dir.as_ref().to_path_buf(),
            timeout: config.timeout(),
        }
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// `git add <path>` followed by `git commit -m <message>`
    pub async fn stage_and_commit(&self, path: &Path, message: &str) -> Result<(), VcsError> {
        tracing::debug!("Committing {:?} to git: {}", path, message);

        self.run([OsStr::new("add"), OsStr::new("--"), path.as_os_str()])
            .await?;
        self.run(["commit", "-m", message]).await?;

        tracing::info!("Committed {:?}", path);
        Ok(())
    }

    /// `git push` to the configured upstream
    pub async fn push(&self) -> Result<(), VcsError> {
        tracing::info!("Pushing changes from {:?}", self.repo_dir);
        self.run(["push"]).await?;
        tracing::info!("Pushed changes to remote repository");
        Ok(())
    }

    /// Whether HEAD has commits its upstream lacks.
    ///
    /// Any failure (no upstream, not a repository, git missing) counts as
    /// "yes" so the push link stays visible.
    pub async fn has_unpushed_changes(&self) -> bool {
        match self.run(["log", "@{u}..HEAD", "--oneline"]).await {
            Ok(output) => !output.stdout.iter().all(u8::is_ascii_whitespace),
            Err(e) => {
                tracing::debug!("Checking for unpushed changes failed, assuming some: {}", e);
                true
            }
        }
    }

    async fn run<I, S>(&self, args: I) -> Result<Output, VcsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<_> = args
            .into_iter()
            .map(|a| a.as_ref().to_os_string())
            .collect();
        let command = std::iter::once(Cow::Borrowed(self.program.as_str()))
            .chain(args.iter().map(|a| a.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ");

        let mut cmd = Command::new(&self.program);
        cmd.args(&args)
            .current_dir(&self.repo_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, cmd.output())
                .await
                .map_err(|_| VcsError::TimedOut {
                    command: command.clone(),
                    timeout,
                })?,
            None => cmd.output().await,
        }
        .map_err(|source| VcsError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(VcsError::Failed {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output)
    }
}

/// Commit message for a saved post
pub fn commit_message(title: &str, draft: bool) -> String {
    if draft {
        format!("Updated draft '{}'", title)
    } else {
        format!("Updated post '{}'", title)
    }
}
