//! # Periprint CLI
//!
//! Command-line interface for printing text labels.
//!
//! ## Usage
//!
//! ```bash
//! # Print a 90mm label, font size fitted automatically
//! periprint print "Hello world"
//!
//! # Bold, 40mm long
//! periprint print --bold --height-mm 40 "Pantry"
//!
//! # Save a PNG preview instead of printing
//! periprint preview --png label.png "Hello world"
//!
//! # Render and encode without a printer, keeping the bytes
//! periprint print --dry-run --output job.bin "Hello world"
//!
//! # Feed one line
//! periprint feed
//! ```
//!
//! Set `RUST_LOG=debug` to see layout decisions and link traffic.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use log::{info, warn};

use periprint::{
    PeriprintError, Printer, PrinterConfig, Settings, StyleSpec,
    raster::{FontBook, GlyphRasterizer, Rasterizer},
    render::{self, Preview},
    transport::{Connector, MemoryConnector},
};

/// Periprint - PeriPage T02 label printer utility
#[derive(Parser, Debug)]
#[command(name = "periprint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON settings file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory of extra .ttf/.otf fonts
    #[arg(long, global = true, value_name = "DIR")]
    font_dir: Option<PathBuf>,

    /// Bluetooth name prefix of the printer
    #[arg(long, global = true)]
    name_prefix: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a text label
    Print {
        #[command(flatten)]
        label: LabelArgs,

        /// Encode the job without a printer
        #[arg(long)]
        dry_run: bool,

        /// Write the transmitted bytes here (dry run only)
        #[arg(long, value_name = "FILE", requires = "dry_run")]
        output: Option<PathBuf>,
    },

    /// Save a PNG preview of a label
    Preview {
        #[command(flatten)]
        label: LabelArgs,

        /// Output PNG path
        #[arg(long, value_name = "FILE")]
        png: PathBuf,
    },

    /// Feed the paper by one line
    Feed {
        /// Encode the command without a printer
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Args, Debug)]
struct LabelArgs {
    /// Text to print. Newlines start a new line.
    text: String,

    /// Label length in millimetres
    #[arg(long, conflicts_with = "height_px")]
    height_mm: Option<f32>,

    /// Label length in pixel rows
    #[arg(long)]
    height_px: Option<u32>,

    /// Font family
    #[arg(long)]
    font: Option<String>,

    /// Font size in pixels (default: fit to label)
    #[arg(long)]
    size: Option<u32>,

    #[arg(long)]
    bold: bool,

    #[arg(long)]
    italic: bool,

    #[arg(long)]
    underline: bool,
}

impl LabelArgs {
    fn style(&self, base: &StyleSpec) -> StyleSpec {
        let mut style = base.clone();
        if let Some(family) = &self.font {
            style = style.family(family.clone());
        }
        if let Some(size) = self.size {
            style = style.size(size);
        }
        if self.bold {
            style = style.bold();
        }
        if self.italic {
            style = style.italic();
        }
        if self.underline {
            style = style.underline();
        }
        style
    }

    fn height(&self, settings: &Settings) -> u32 {
        let config = PrinterConfig::T02;
        self.height_px
            .unwrap_or_else(|| config.mm_to_dots(self.height_mm.unwrap_or(settings.height_mm)))
    }

    fn text(&self) -> Result<&str, PeriprintError> {
        if self.text.trim().is_empty() {
            return Err(PeriprintError::Layout(
                "Please enter some text to print".to_string(),
            ));
        }
        Ok(&self.text)
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), PeriprintError> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(dir) = cli.font_dir {
        settings.font_dir = Some(dir);
    }
    if let Some(prefix) = cli.name_prefix {
        settings.transport.name_prefix = prefix;
    }
    settings.validate()?;

    match cli.command {
        Commands::Preview { label, png } => {
            let text = label.text()?;
            let height = label.height(&settings);
            let raster = load_fonts(&settings)?;
            let rendered = render::render_text(
                &raster,
                text,
                PrinterConfig::T02.width_dots,
                height,
                &label.style(&settings.style),
                false,
            )?;
            Preview::encode(&rendered.image)?.save(&png)?;
            println!(
                "Saved {}x{} preview at {}px to {}",
                rendered.image.width(),
                height,
                rendered.layout.font_size,
                png.display()
            );
        }

        Commands::Print {
            label,
            dry_run,
            output,
        } => {
            let text = label.text()?;
            let height = label.height(&settings);
            let style = label.style(&settings.style);
            let raster = load_fonts(&settings)?;

            if dry_run {
                let mem = dry_run_connector(&settings);
                let mut printer = Printer::new(mem.clone(), raster, settings.transport.clone())?;
                print_label(&mut printer, text, height, &style).await?;
                report_dry_run(&mem, output.as_deref())?;
            } else {
                print_on_device(&settings, raster, text, height, &style).await?;
            }
        }

        Commands::Feed { dry_run } => {
            if dry_run {
                let mem = dry_run_connector(&settings);
                let mut printer =
                    Printer::new(mem.clone(), NoFonts, settings.transport.clone())?;
                printer.connect().await?;
                printer.feed_paper().await?;
                report_dry_run(&mem, None)?;
            } else {
                feed_on_device(&settings).await?;
            }
        }
    }

    Ok(())
}

/// Builtin DejaVu Sans plus whatever the font directory holds.
fn load_fonts(settings: &Settings) -> Result<GlyphRasterizer, PeriprintError> {
    let mut book = FontBook::builtin()?;
    if let Some(dir) = &settings.font_dir {
        let loaded = book.add_dir(dir).map_err(|e| {
            PeriprintError::Config(format!("Cannot load fonts from {}: {}", dir.display(), e))
        })?;
        if loaded == 0 {
            warn!("No .ttf or .otf fonts in {}", dir.display());
        }
    }
    if let Some(family) = &settings.fallback_family {
        book.set_fallback_family(family)?;
    }
    info!(
        "Fonts: {} (fallback {})",
        book.families().join(", "),
        book.fallback_family().unwrap_or("none")
    );
    Ok(GlyphRasterizer::new(book))
}

async fn print_label<C: Connector, R: Rasterizer>(
    printer: &mut Printer<C, R>,
    text: &str,
    height: u32,
    style: &StyleSpec,
) -> Result<(), PeriprintError> {
    printer.connect().await?;
    println!("Printing {}x{} label...", printer.config().width_dots, height);
    printer.print_text(text, height, style).await?;
    println!("Printed successfully!");
    printer.disconnect().await
}

fn dry_run_connector(settings: &Settings) -> MemoryConnector {
    let name = format!("{}_DRYRUN", settings.transport.name_prefix);
    MemoryConnector::with_devices(&[name.as_str()])
}

fn report_dry_run(mem: &MemoryConnector, output: Option<&Path>) -> Result<(), PeriprintError> {
    let bytes = mem.bytes();
    println!(
        "Dry run: {} bytes in {} packet(s)",
        bytes.len(),
        mem.chunks().len()
    );
    if let Some(path) = output {
        fs::write(path, &bytes)?;
        println!("Saved to {}", path.display());
    }
    Ok(())
}

/// Stand-in rasterizer for commands that never draw text.
struct NoFonts;

impl Rasterizer for NoFonts {
    fn measure_width(&self, _: &str, _: &periprint::style::FontSpec) -> periprint::Result<f32> {
        Err(PeriprintError::Layout("No fonts loaded".to_string()))
    }

    fn draw_text(
        &self,
        _: &mut image::RgbaImage,
        _: &str,
        _: f32,
        _: f32,
        _: &periprint::style::FontSpec,
    ) -> periprint::Result<()> {
        Err(PeriprintError::Layout("No fonts loaded".to_string()))
    }
}

#[cfg(feature = "ble")]
async fn print_on_device(
    settings: &Settings,
    raster: GlyphRasterizer,
    text: &str,
    height: u32,
    style: &StyleSpec,
) -> Result<(), PeriprintError> {
    use periprint::transport::ble::BleConnector;

    let connector = BleConnector::new(settings.transport.scan_timeout()).await?;
    let mut printer = Printer::new(connector, raster, settings.transport.clone())?;
    print_label(&mut printer, text, height, style).await
}

#[cfg(feature = "ble")]
async fn feed_on_device(settings: &Settings) -> Result<(), PeriprintError> {
    use periprint::transport::ble::BleConnector;

    let connector = BleConnector::new(settings.transport.scan_timeout()).await?;
    let mut printer = Printer::new(connector, NoFonts, settings.transport.clone())?;
    printer.connect().await?;
    printer.feed_paper().await?;
    printer.disconnect().await
}

#[cfg(not(feature = "ble"))]
async fn print_on_device(
    _: &Settings,
    _: GlyphRasterizer,
    _: &str,
    _: u32,
    _: &StyleSpec,
) -> Result<(), PeriprintError> {
    Err(no_bluetooth())
}

#[cfg(not(feature = "ble"))]
async fn feed_on_device(_: &Settings) -> Result<(), PeriprintError> {
    Err(no_bluetooth())
}

#[cfg(not(feature = "ble"))]
fn no_bluetooth() -> PeriprintError {
    PeriprintError::Config("Built without Bluetooth support, use --dry-run".to_string())
}
