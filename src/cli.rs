//! CLI commands implementation.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Settings;
use crate::docwriter::{DocumentWriter, DocxWriter};
use crate::layout::{build_page_blocks, CellBox};
use crate::models::ReceiptImage;
use crate::ocr::{OcrEngine, TesseractEngine};
use crate::pipeline::{group_by_label, resolve_date};
use crate::server;

#[derive(Parser)]
#[command(name = "receiptsort")]
#[command(about = "Sort receipt images by OCR-detected date into a printable document")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Run the upload/progress/download HTTP service
    Serve {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value = "8000", env = "PORT")]
        port: u16,
    },

    /// Process a directory of receipt images into one document
    Process {
        /// Directory containing receipt images
        dir: PathBuf,
        /// Output document path
        #[arg(short, long, default_value = "sorted_receipts.docx")]
        output: PathBuf,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => {
            let addr: SocketAddr = format!("{host}:{port}").parse()?;
            server::serve(settings, addr).await
        }
        Commands::Process { dir, output } => {
            tokio::task::spawn_blocking(move || process_directory(&settings, &dir, &output))
                .await?
        }
    }
}

/// Extensions scanned in batch mode, lowercase.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "tif", "tiff"];

/// Batch mode: same pipeline as the server, driven from the terminal.
fn process_directory(settings: &Settings, dir: &Path, output: &Path) -> anyhow::Result<()> {
    let images = scan_images(dir)?;
    if images.is_empty() {
        anyhow::bail!("no image files found in {}", dir.display());
    }

    let engine = TesseractEngine::new(settings.ocr_language.clone());
    if !engine.is_available() {
        println!("{} {}", style("warning:").yellow().bold(), engine.availability_hint());
    }

    println!(
        "Processing {} receipt(s) from {}",
        style(images.len()).cyan(),
        style(dir.display()).cyan()
    );

    let bar = ProgressBar::new(images.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut assignments = Vec::with_capacity(images.len());
    for receipt in images {
        bar.set_message(receipt.name.clone());
        let decision = match image::open(&receipt.path) {
            Ok(decoded) => resolve_date(&engine, &decoded, &receipt.name),
            Err(e) => {
                bar.println(format!(
                    "{} cannot read {}: {}",
                    style("error:").red().bold(),
                    receipt.name,
                    e
                ));
                crate::models::DateDecision::Unknown
            }
        };
        bar.println(format!("  {} -> {}", receipt.name, style(decision.label()).green()));
        assignments.push((receipt, decision));
        bar.inc(1);
    }
    bar.finish_and_clear();

    let groups = group_by_label(assignments);
    println!("Found {} date group(s)", style(groups.len()).cyan());

    let blocks = build_page_blocks(&groups, CellBox::from_settings(settings));
    let writer = DocxWriter::new(settings.cell_width_px, settings.cell_height_px);
    writer.write(&blocks, output)?;

    println!("{} wrote {}", style("done:").green().bold(), output.display());
    Ok(())
}

/// Collect image files from a directory, sorted by filename.
fn scan_images(dir: &Path) -> anyhow::Result<Vec<ReceiptImage>> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {}", dir.display(), e))?
    {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
        if !is_image {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        images.push(ReceiptImage::new(name, path));
    }
    images.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(images)
}
