//! CLI for the Ospry image service.

mod commands;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use ospry_core::{config, Client, FormatOptions, ImageFormat};
use std::path::PathBuf;

use commands::{
    run_delete, run_download, run_format, run_metadata, run_update, run_upload, Update,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ospry")]
#[command(about = "Ospry image service client: signed URLs, uploads, metadata", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/ospry/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Formatting flags shared by `format` and `download`.
#[derive(Debug, Clone, Default, Args)]
pub struct FormatArgs {
    /// Target format: jpeg (jpg), png, gif, bmp. Empty string removes it.
    #[arg(long, value_parser = parse_format)]
    pub format: Option<String>,
    /// Maximum width in pixels; 0 removes an existing bound.
    #[arg(long, value_name = "PX", allow_negative_numbers = true)]
    pub max_width: Option<i64>,
    /// Maximum height in pixels; 0 removes an existing bound.
    #[arg(long, value_name = "PX", allow_negative_numbers = true)]
    pub max_height: Option<i64>,
    /// Sign the URL, valid for this many seconds from now.
    #[arg(long, value_name = "SECS")]
    pub expire_seconds: Option<i64>,
    /// Sign the URL, valid until this RFC 3339 time.
    #[arg(long, value_name = "TIME", value_parser = parse_time)]
    pub expire_at: Option<DateTime<Utc>>,
}

/// Checks the name early but keeps the raw string so `""` still means removal.
fn parse_format(s: &str) -> Result<String, String> {
    if s.is_empty() || s.parse::<ImageFormat>().is_ok() {
        return Ok(s.to_string());
    }
    let names: Vec<&str> = ImageFormat::ALL.iter().map(|f| f.as_str()).collect();
    Err(format!("expected one of {} (or jpg)", names.join(", ")))
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected RFC 3339 time (e.g. 2024-01-01T00:00:00Z): {}", e))
}

impl From<FormatArgs> for FormatOptions {
    fn from(a: FormatArgs) -> Self {
        FormatOptions {
            format: a.format,
            max_width: a.max_width,
            max_height: a.max_height,
            expire_at: a.expire_at,
            expire_after_secs: a.expire_seconds,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Print a formatted (and, with an expiry, signed) download URL.
    Format {
        /// Image URL as returned by the service, possibly already formatted.
        url: String,
        #[command(flatten)]
        opts: FormatArgs,
    },

    /// Upload an image file.
    Upload {
        path: PathBuf,
        /// Name stored with the image (default: the file name).
        #[arg(long)]
        filename: Option<String>,
        /// Make the image private.
        #[arg(long)]
        private: bool,
    },

    /// Download an image, optionally converted/resized.
    Download {
        url: String,
        /// Output file.
        #[arg(short, long, value_name = "PATH")]
        out: PathBuf,
        #[command(flatten)]
        opts: FormatArgs,
    },

    /// Show metadata for one or more images.
    Metadata {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Claim uploaded images.
    Claim {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Make images private.
    MakePrivate {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Make images public.
    MakePublic {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Delete images.
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = match &cli.config {
            Some(path) => config::load_from(path)?,
            None => config::load_or_init()?,
        };
        let key = cfg.resolve_api_key()?;
        let client = Client::from_config(&cfg, key).context("build client")?;
        tracing::debug!(server_url = %client.server_url(), "client ready");

        match cli.command {
            CliCommand::Format { url, opts } => run_format(&client, &url, opts.into())?,
            CliCommand::Upload {
                path,
                filename,
                private,
            } => run_upload(&client, &path, filename, private).await?,
            CliCommand::Download { url, out, opts } => {
                run_download(&client, &url, &out, opts.into()).await?
            }
            CliCommand::Metadata { ids } => run_metadata(&client, ids).await?,
            CliCommand::Claim { ids } => run_update(&client, Update::Claim, ids).await?,
            CliCommand::MakePrivate { ids } => {
                run_update(&client, Update::MakePrivate, ids).await?
            }
            CliCommand::MakePublic { ids } => run_update(&client, Update::MakePublic, ids).await?,
            CliCommand::Delete { ids } => run_delete(&client, ids).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
