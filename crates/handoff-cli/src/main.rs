//! Handoff CLI: drive both sides of a handoff from a terminal.
//!
//! Set HANDOFF_API_URL (default http://localhost:4000) or pass --api-url.

use anyhow::Context;
use clap::{Parser, Subcommand};
use handoff_cli::{init_tracing, parse_kind, token_from_arg};
use handoff_client::{HandoffClient, SessionKind};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "handoff", about = "Cross-device media handoff CLI")]
struct Cli {
    /// Base URL of the handoff API
    #[arg(
        long,
        global = true,
        env = "HANDOFF_API_URL",
        default_value = "http://localhost:4000"
    )]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a new handoff session and print its link
    Issue {
        /// Session kind: image, video or mixed
        #[arg(long, value_parser = parse_kind, default_value = "mixed")]
        kind: SessionKind,
        /// External record the results belong to
        #[arg(long)]
        owner_ref: Option<String>,
    },
    /// Check once whether files have been uploaded into a session
    Status {
        /// Token or handoff link
        token: String,
    },
    /// Write the session's QR code as SVG
    Qr {
        /// Token or handoff link
        token: String,
        /// Output file; prints to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Resolve a handoff link as the receiving device
    Resolve {
        /// Token or handoff link
        token: String,
    },
    /// Upload files into a handoff session
    Send {
        /// Token or handoff link
        token: String,
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Upload files directly, without a session
    Batch {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let client = HandoffClient::new(cli.api_url).context("Failed to create API client")?;

    match cli.command {
        Commands::Issue { kind, owner_ref } => {
            let response = client.issue(kind, owner_ref).await?;
            print_json(&response)?;
        }
        Commands::Status { token } => {
            let response = client.status(token_from_arg(&token)).await?;
            print_json(&response)?;
        }
        Commands::Qr { token, output } => {
            let svg = client.qr_svg(token_from_arg(&token)).await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, svg)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    print_json(&serde_json::json!({ "written": path }))?;
                }
                None => println!("{}", svg),
            }
        }
        Commands::Resolve { token } => {
            let response = client.resolve(token_from_arg(&token)).await?;
            print_json(&response)?;
        }
        Commands::Send { token, files } => {
            let response = client
                .upload_to_session(token_from_arg(&token), &files)
                .await?;
            eprintln!("{}", response.summary);
            print_json(&response)?;
        }
        Commands::Batch { files } => {
            let response = client.upload_batch(&files).await?;
            print_json(&response)?;
        }
    }

    Ok(())
}
