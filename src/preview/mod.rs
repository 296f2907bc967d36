//! Local preview server supervision
//!
//! Runs `hugo server -D` (or whatever is configured) next to the editor and
//! relays its output to the log. It shares nothing with request handling.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::config::PreviewConfig;

/// A preview server process that has not been started yet
#[derive(Debug, Clone)]
pub struct PreviewServer {
    command: String,
    args: Vec<String>,
    dir: PathBuf,
}

/// Which pipe a relayed line came from
#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

impl PreviewServer {
    pub fn new<P: AsRef<Path>>(dir: P, command: &str, args: &[&str]) -> Self {
        Self {
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn from_config<P: AsRef<Path>>(dir: P, config: &PreviewConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Start the process.
    ///
    /// Standard output and standard error are each relayed line by line on
    /// their own task. The returned handle resolves once the process has
    /// exited and both pipes are drained. The process is killed if that
    /// handle's task is dropped, e.g. at runtime shutdown.
    pub fn spawn(&self) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
        tracing::info!("Starting {} in {:?}", self.command, self.dir);

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let label = self.command.clone();
        let stdout = child.stdout.take().map(|out| relay(out, label.clone(), Stream::Stdout));
        let stderr = child.stderr.take().map(|err| relay(err, label.clone(), Stream::Stderr));

        Ok(tokio::spawn(async move {
            let status = child.wait().await;
            for reader in [stdout, stderr].into_iter().flatten() {
                let _ = reader.await;
            }

            match &status {
                Ok(s) if s.success() => tracing::info!("{} exited", label),
                Ok(s) => tracing::error!("{} exited with {}", label, s),
                Err(e) => tracing::error!("Failed waiting for {}: {}", label, e),
            }
            status
        }))
    }
}

/// Forward every line of a pipe to the log
fn relay<R>(pipe: R, source: String, stream: Stream) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(pipe).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match stream {
                    Stream::Stdout => tracing::info!(source = %source, "{}", line),
                    Stream::Stderr => tracing::error!(source = %source, "{}", line),
                },
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Error reading {} output: {}", source, e);
                    break;
                }
            }
        }
    })
}
