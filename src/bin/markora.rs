//! # Command-Line Tool
//!
//! Watermark and inspect image files without running the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin markora -- embed --input photo.png --text "alice" --output marked.png
//! cargo run --bin markora -- detect --input marked.png
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;
use std::fs;

use markora::common::config::MarkoraConfig;
use markora::common::logging::init_logger;
use markora::processing::{raster, MarkerPolicy};

/// Command-line arguments for the markora tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (TOML format)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Embed a watermark into an image
    Embed {
        /// Image to watermark
        #[arg(short, long)]
        input: String,

        /// Text to embed; the marker is appended automatically
        #[arg(short, long)]
        text: String,

        /// Where to write the watermarked image; its extension picks the format
        #[arg(short, long)]
        output: String,
    },
    /// Report whether an image carries a watermark
    Detect {
        /// Image to inspect
        #[arg(short, long)]
        input: String,
    },
}

fn main() -> anyhow::Result<()> {
    init_logger();

    let args = Args::parse();
    let config = MarkoraConfig::load(args.config.as_deref())?;
    let policy = MarkerPolicy::new(config.watermark.detector_config());

    match args.command {
        Command::Embed {
            input,
            text,
            output,
        } => {
            let bytes = fs::read(&input).with_context(|| format!("reading {}", input))?;
            let decoded = raster::decode_image(&bytes)?;
            let marked = policy.watermark(&decoded.grid, &text)?;

            let format = raster::resolve_format(Some(&output), decoded.format);
            let encoded = raster::encode_image(&marked, format)?;
            if encoded.format != format {
                info!("Wrote {:?} instead of {:?}", encoded.format, format);
            }

            fs::write(&output, &encoded.bytes).with_context(|| format!("writing {}", output))?;
            info!("✅ Watermarked {} -> {}", input, output);
        }
        Command::Detect { input } => {
            let bytes = fs::read(&input).with_context(|| format!("reading {}", input))?;
            let decoded = raster::decode_image(&bytes)?;
            println!("{}", policy.detect(&decoded.grid));
        }
    }

    Ok(())
}
