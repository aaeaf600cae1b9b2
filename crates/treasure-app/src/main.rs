// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Treasure Log: report a found object by email.
//
// Entry point. Initialises logging, reads configuration from the environment,
// and runs one of the subcommands.

mod services;
mod state;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use clap::{Parser, Subcommand};
use treasure_bridge::{FilePhotoSource, FixedPosition, PhotoSource, platform_bridge};
use treasure_core::error::{Result, TreasureError};
use treasure_core::human_errors::{HumanError, humanize_error};
use treasure_core::types::SubmissionState;
use treasure_core::{AppConfig, RelayConfig};
use treasure_image::ImageCompressor;
use treasure_mail::{ResendClient, build_transport, relay};

use services::controller::SubmissionController;

#[derive(Debug, Parser)]
#[command(name = "treasure-log", version, about = "Report a found object by email")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send one report through the configured transport.
    Send {
        /// Recipient address.
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Photo to attach (any format the decoder understands).
        #[arg(long)]
        photo: Option<PathBuf>,
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },
    /// Compress a photo the way a report would and write the JPEG.
    Compress {
        #[arg(long)]
        photo: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Run the email relay server.
    Relay,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::debug!(?cli, "Treasure Log starting");

    let outcome = match cli.command {
        Command::Send {
            email,
            description,
            photo,
            lat,
            lon,
        } => {
            let position = lat.zip(lon).map(|(lat, lon)| FixedPosition::new(lat, lon));
            send(email, description, photo, position).await
        }
        Command::Compress { photo, out } => compress(photo, &out).await,
        Command::Relay => run_relay().await,
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            print_notice(&humanize_error(&e));
            ExitCode::FAILURE
        }
    }
}

async fn send(
    email: String,
    description: String,
    photo: Option<PathBuf>,
    position: Option<FixedPosition>,
) -> Result<ExitCode> {
    let config = AppConfig::from_env()?;
    let transport = build_transport(&config)?;
    let compressor = ImageCompressor::new(config.compression.clone())?;
    let session = SubmissionController::spawn(transport, compressor);

    session.set_email(email).await?;
    session.set_description(description).await?;

    if let Some(path) = photo {
        if let Some(raw) = FilePhotoSource::new(path).capture_photo()? {
            session.attach_photo(raw).await?;
            let settled = session
                .wait_for(|s| s.form.image.is_some() || s.notice.is_some())
                .await?;
            if let Some(notice) = settled.notice {
                print_notice(&notice);
                session.shutdown().await;
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    match position {
        Some(fixed) => session.locate(&fixed).await?,
        None => {
            let bridge = platform_bridge();
            tracing::debug!(platform = bridge.platform_name(), "asking platform for position");
            session.locate(bridge.as_ref()).await?;
            if let Some(notice) = session.snapshot().notice {
                // Location is optional; say so and carry on.
                print_notice(&notice);
            }
        }
    }

    session.submit().await?;
    if session.is_busy() {
        eprintln!("Sending report...");
    }
    let settled = session.wait_for(|s| !s.busy()).await?;
    session.shutdown().await;

    match settled.state {
        SubmissionState::Succeeded(recipient) => {
            println!("Treasure report sent to {recipient}");
            Ok(ExitCode::SUCCESS)
        }
        SubmissionState::Failed(reason) => {
            tracing::debug!(%reason, "report not sent");
            if let Some(notice) = settled.notice {
                print_notice(&notice);
            }
            Ok(ExitCode::FAILURE)
        }
        other => Err(TreasureError::Transport(format!("unexpected session state {other:?}"))),
    }
}

async fn compress(photo: PathBuf, out: &Path) -> Result<ExitCode> {
    let config = AppConfig::from_env()?;
    let compressor = ImageCompressor::new(config.compression)?;
    let Some(raw) = FilePhotoSource::new(photo).capture_photo()? else {
        return Ok(ExitCode::FAILURE);
    };
    let (input_width, input_height, input_size) = (raw.width, raw.height, raw.declared_size);

    let image = tokio::task::spawn_blocking(move || compressor.compress(&raw))
        .await
        .map_err(|e| TreasureError::Encode(e.to_string()))??;
    let jpeg = STANDARD
        .decode(&image.data)
        .map_err(|e| TreasureError::Encode(e.to_string()))?;
    std::fs::write(out, &jpeg)?;

    println!(
        "{input_width}x{input_height} ({input_size} bytes) -> {}x{} at quality {:.2}: {} bytes JPEG, {} bytes encoded",
        image.width,
        image.height,
        image.quality,
        jpeg.len(),
        image.encoded_size
    );
    Ok(ExitCode::SUCCESS)
}

async fn run_relay() -> Result<ExitCode> {
    let config = RelayConfig::from_env()?;
    let provider = ResendClient::from_config(&config, Duration::from_secs(30))?;
    relay::serve(&config, Arc::new(provider)).await?;
    Ok(ExitCode::SUCCESS)
}

fn print_notice(notice: &HumanError) {
    eprintln!("{}", notice.message);
    if !notice.suggestion.is_empty() {
        eprintln!("  {}", notice.suggestion);
    }
}
