//! Drive CLI: store local files through an upload session.
//!
//! Configuration comes from a TOML file (default `drive.toml`) with
//! `DRIVE_`-prefixed environment overrides.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use drive_cli::{init_tracing, mime_from_name};
use drive_core::{load_config, ErrorMetadata};
use drive_services::{Drive, InboundFile, Storage, TransformEngine};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "drive", about = "Stage, transform and store uploaded files")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = "drive.toml")]
    config: PathBuf,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a file, applying profiles (the configured defaults when none are given)
    Store {
        /// Path to the file to store; it is copied, never moved
        file: PathBuf,
        /// Profile to apply; repeat to apply several in order
        #[arg(long = "profile", value_name = "NAME")]
        profiles: Vec<String>,
        /// Appended to the file name before the extension
        #[arg(long)]
        suffix: Option<String>,
        /// MIME type of the file; guessed from the extension by default
        #[arg(long)]
        mime: Option<String>,
    },
    /// List configured profiles
    Profiles,
    /// Validate the configuration and connect to the disk
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    match cli.command {
        Commands::Store {
            file,
            profiles,
            suffix,
            mime,
        } => {
            let drive = Drive::from_config(config).await?;

            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .context("File path has no file name")?;
            let mime = mime.unwrap_or_else(|| mime_from_name(&name).to_string());

            // Staging moves the inbound file, so hand it a private copy.
            let scratch = tempfile::tempdir().context("Failed to create scratch directory")?;
            let upload = scratch.path().join("upload");
            let size = tokio::fs::copy(&file, &upload)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let inbound = InboundFile::new(upload, name, mime, size);
            match drive.store(inbound, &profiles, suffix.as_deref()).await {
                Ok(Some(path)) => println!("{path}"),
                Ok(None) => bail!("File could not be written to its destination; try again"),
                Err(e) => {
                    tracing::debug!(
                        error_code = e.error_code(),
                        recoverable = e.is_recoverable(),
                        "Store failed"
                    );
                    return Err(e.into());
                }
            }
        }
        Commands::Profiles => {
            config.validate()?;
            for (name, profile) in &config.profiles {
                let steps: Vec<String> = profile
                    .operations
                    .iter()
                    .map(|step| format!("{}{}", step.name, serde_json::Value::from(step.params.clone())))
                    .collect();
                let supported = if TransformEngine::supports(profile.content_type) {
                    ""
                } else {
                    " (not transformed)"
                };
                println!(
                    "{name} [{}]{supported}: {}",
                    profile.content_type,
                    steps.join(" -> ")
                );
            }
            for (content_type, names) in &config.default_profiles {
                println!("default {content_type}: {}", names.join(", "));
            }
        }
        Commands::Check => {
            let drive = Drive::from_config(config).await?;
            println!("ok ({} disk)", drive.storage().driver());
        }
    }

    Ok(())
}
