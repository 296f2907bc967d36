//! CLI entry point for hugs-rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::util::SubscriberInitExt;

use hugs_rs::config::EditorConfig;
use hugs_rs::Hugs;

#[derive(Parser)]
#[command(name = "hugs-rs")]
#[command(version)]
#[command(about = "A local web editor for Hugo blog posts", long_about = None)]
struct Cli {
    /// Set the site directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Posts directory, relative to the site directory
    #[arg(long, global = true)]
    content_dir: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the editor server (the default)
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// IP address to bind to
        #[arg(short, long)]
        ip: Option<String>,

        /// Also run `hugo server -D` for previews
        #[arg(short = 's', long)]
        hugo_server: bool,

        /// Save posts without committing them
        #[arg(long)]
        no_commit: bool,
    },

    /// Create a new draft post
    New {
        /// Title of the new post
        title: String,
    },

    /// List posts, newest first
    List,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    hugs_rs::logging::subscriber(cli.debug).init();

    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    let mut config = EditorConfig::load_or_default(&base_dir)?;
    if let Some(content_dir) = cli.content_dir {
        config.content_dir = content_dir;
    }

    let command = cli.command.unwrap_or(Commands::Server {
        port: None,
        ip: None,
        hugo_server: false,
        no_commit: false,
    });

    match command {
        Commands::Server {
            port,
            ip,
            hugo_server,
            no_commit,
        } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(ip) = ip {
                config.ip = ip;
            }
            if hugo_server {
                config.preview.enabled = true;
            }
            if no_commit {
                config.commit_on_save = false;
            }

            let hugs = Hugs::with_config(&base_dir, config);
            hugs.serve().await?;
        }

        Commands::New { title } => {
            let hugs = Hugs::with_config(&base_dir, config);
            tracing::info!("Creating new post with title: {}", title);
            hugs.new_post(&title)?;
        }

        Commands::List => {
            let hugs = Hugs::with_config(&base_dir, config);
            hugs_rs::commands::list::run(&hugs)?;
        }

        Commands::Version => {
            println!("hugs-rs version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
