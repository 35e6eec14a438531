//! mermaid-export - Export a rendered diagram preview to SVG or PNG.
//!
//! # Usage
//!
//! ```bash
//! mermaid-export preview.xhtml
//! mermaid-export --format svg --filename flow preview.xhtml
//! mermaid-export --bare-svg --out-dir exports diagram.svg
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use mermaid_export::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use mermaid_export::export::{ExportFormat, Exporter, preview_container};
use mermaid_export::perf;
use mermaid_export::platform::{
    FileDownloader, HttpFetcher, ResvgRasterizer, UsvgBounds, system_fonts,
};
use mermaid_export::svg::parse_document;

/// Export a rendered diagram preview to SVG or PNG
#[derive(Parser, Debug)]
#[command(name = "mermaid-export", version, about, long_about = None)]
struct Cli {
    /// Preview snapshot (XHTML/XML) containing the rendered diagram
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Treat FILE as a standalone SVG instead of a preview snapshot
    #[arg(long)]
    bare_svg: bool,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<ExportFormat>,

    /// Output file name, without extension
    #[arg(long)]
    filename: Option<String>,

    /// Directory downloads are written to
    #[arg(short, long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Raster pixel density
    #[arg(long)]
    scale: Option<f64>,

    /// Space around the content box, in user units
    #[arg(long)]
    padding: Option<f64>,

    /// Give up on a remote image after this many seconds (default: wait forever)
    #[arg(long, value_name = "SECS")]
    fetch_timeout: Option<u64>,

    /// Log stage timings
    #[arg(long)]
    perf: bool,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if let Some(scale) = cli.scale {
        if !(scale.is_finite() && scale > 0.0) {
            anyhow::bail!("--scale must be a positive number, got {scale}");
        }
    }
    if let Some(padding) = cli.padding {
        if !(padding.is_finite() && padding >= 0.0) {
            anyhow::bail!("--padding must be zero or positive, got {padding}");
        }
    }

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);
    init_logging(effective.perf);
    perf::set_enabled(effective.perf);

    if !cli.file.exists() {
        anyhow::bail!("File not found: {}", cli.file.display());
    }
    let markup = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;
    let document = parse_document(&markup)
        .with_context(|| format!("Failed to parse {}", cli.file.display()))?;

    let options = effective.export_options();
    let container = if cli.bare_svg {
        preview_container(document, &options.container_class)
    } else {
        document
    };

    let fonts = system_fonts();
    let fetcher = HttpFetcher::new(effective.fetch_timeout()).context("Failed to build HTTP client")?;
    let downloader = Arc::new(FileDownloader::new(
        effective.out_dir.clone().unwrap_or_else(|| PathBuf::from(".")),
    ));
    let exporter = Exporter::new(
        Arc::new(UsvgBounds::new(Arc::clone(&fonts))),
        Arc::new(fetcher),
        Arc::new(ResvgRasterizer::new(fonts)),
        downloader.clone(),
    )
    .with_options(options);

    exporter.export_image(
        Some(&container),
        effective.format.unwrap_or_default(),
        effective.filename.as_deref(),
    );

    if let Some(message) = exporter.state().export_error() {
        anyhow::bail!("Export failed: {message}");
    }
    for path in downloader.saved() {
        println!("{}", path.display());
    }
    Ok(())
}

fn init_logging(perf: bool) {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());
    if perf {
        if let Ok(directive) = "perf=info".parse() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
