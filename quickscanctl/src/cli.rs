use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Args, Parser, Subcommand, ValueEnum};
use quickscan_model::{BarcodeFormat, ScanConfig};

#[derive(Debug, Parser)]
#[command(
    name = "quickscanctl",
    about = "Quickscan scan sessions and payload tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a scripted scan session and print its outcome and response
    Simulate {
        /// Scan script (JSON)
        #[arg(long)]
        script: PathBuf,
        /// Override the failure cool-down from the loaded settings
        #[arg(long)]
        cooldown_ms: Option<u64>,
        #[arg(long)]
        pretty: bool,
    },
    /// Build a request payload from flags
    Request(RequestArgs),
    /// Decode a request or response payload (reads stdin without --file)
    Decode {
        #[arg(long, value_enum, default_value = "response")]
        kind: PayloadKind,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PayloadKind {
    Request,
    Response,
}

#[derive(Debug, Clone, Args)]
pub struct RequestArgs {
    /// Format names such as qr_code or ean-13; repeat or comma separate.
    /// Defaults to every format.
    #[arg(long = "format", value_delimiter = ',')]
    pub formats: Vec<String>,
    #[arg(long)]
    pub torch: bool,
    #[arg(long)]
    pub close_button: bool,
    #[arg(long)]
    pub front_camera: bool,
    /// Width to height ratio of the scan frame
    #[arg(long)]
    pub frame_ratio: Option<f32>,
    /// Label of the alternate action; enables it
    #[arg(long)]
    pub action_text: Option<String>,
    #[arg(long)]
    pub no_haptic: bool,
    #[arg(long)]
    pub pretty: bool,
}

impl RequestArgs {
    pub fn to_config(&self) -> anyhow::Result<ScanConfig> {
        let formats = self
            .formats
            .iter()
            .map(|name| {
                BarcodeFormat::from_name(name)
                    .ok_or_else(|| anyhow!("unknown barcode format '{name}'"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let mut builder = ScanConfig::builder()
            .show_torch_toggle(self.torch)
            .show_close_button(self.close_button)
            .use_front_camera(self.front_camera)
            .haptic_on_success(!self.no_haptic);
        if !formats.is_empty() {
            builder = builder.formats(formats);
        }
        if let Some(ratio) = self.frame_ratio {
            builder = builder.horizontal_frame_ratio(ratio);
        }
        if let Some(text) = &self.action_text {
            builder = builder.text_action(true, text.clone());
        }

        builder
            .build()
            .map_err(|err| anyhow!("invalid scan request: {err}"))
    }
}
