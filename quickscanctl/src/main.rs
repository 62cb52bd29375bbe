use std::{fs, io, path::Path};

use anyhow::{Context, Result};
use clap::Parser;
use quickscan_config::ScannerSettings;
use quickscan_core::{
    RequestPayload, decode_request, decode_response_json, encode_request,
};
use quickscanctl::{
    Script,
    cli::{Cli, Command, PayloadKind},
    simulate,
};
use serde::Serialize;
use tracing_subscriber::{
    EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (mut settings, source) = ScannerSettings::load_from_env()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
    tracing::debug!(?source, "settings resolved");

    match cli.command {
        Command::Simulate {
            script,
            cooldown_ms,
            pretty,
        } => {
            if let Some(cooldown_ms) = cooldown_ms {
                settings.analyzer.failure_cooldown_ms = cooldown_ms;
                settings.analyzer.validate()?;
            }
            let script = Script::load(&script)?;
            let report = simulate(&script, &settings.analyzer).await?;
            print_json(&report, pretty)?;
        }
        Command::Request(args) => {
            let config = args.to_config()?;
            print_json(&encode_request(&config), args.pretty)?;
        }
        Command::Decode { kind, file, pretty } => {
            let raw = read_input(file.as_deref())?;
            match kind {
                PayloadKind::Request => {
                    let payload = RequestPayload::from_json(&raw)
                        .context("failed to parse request payload")?;
                    let config = decode_request(Some(&payload));
                    print_json(&encode_request(&config), pretty)?;
                }
                PayloadKind::Response => {
                    let outcome = decode_response_json(&raw);
                    tracing::info!(summary = %outcome.summary(), "decoded response");
                    print_json(&outcome, pretty)?;
                }
            }
        }
    }

    Ok(())
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => io::read_to_string(io::stdin()).context("failed to read stdin"),
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}
