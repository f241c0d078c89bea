//! Inkmap CLI
//!
//! Renders a JSON map document to a PNG image.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use owo_colors::OwoColorize;

use inkmap_common::warning::clear_warnings;
use inkmap_compose::{LayerDescriptor, RenderReport, ZOrderCompositor};
use inkmap_raster::{Canvas, CanvasSink};
use inkmap_source::PropertySource;
use inkmap_style::{LayerStyle, MapSpec};

/// Inkmap — render a vector map document to a PNG image
#[derive(Parser, Debug)]
#[command(name = "inkmap")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Render a map document next to its data files
    inkmap ./city.map.json

    # Choose the output path
    inkmap ./city.map.json -o renders/city.png
"#)]
struct Cli {
    /// Path to the JSON map document
    #[arg(value_name = "MAP")]
    map: PathBuf,

    /// Output PNG file
    #[arg(short, long, default_value = "map.png", value_name = "FILE")]
    output: PathBuf,

    /// Override the canvas width from the map document
    #[arg(long, value_name = "PIXELS")]
    width: Option<u32>,

    /// Override the canvas height from the map document
    #[arg(long, value_name = "PIXELS")]
    height: Option<u32>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    clear_warnings();

    let text = fs::read_to_string(&cli.map)
        .with_context(|| format!("failed to read map document '{}'", cli.map.display()))?;
    let spec: MapSpec = serde_json::from_str(&text)
        .with_context(|| format!("'{}' is not a valid map document", cli.map.display()))?;

    // Layer source paths resolve relative to the map document itself, so
    // a map directory stays relocatable.
    let base = cli.map.parent().unwrap_or_else(|| Path::new("."));
    let layers = load_layers(&spec, base)?;

    let width = cli.width.unwrap_or(spec.width);
    let height = cli.height.unwrap_or(spec.height);
    let canvas = Canvas::new(width, height, spec.background)?;
    let mut sink = CanvasSink::new(canvas);
    let mut compositor = ZOrderCompositor::new(&layers)?;
    let report = compositor.render(&mut sink)?;

    sink.into_canvas().save_png(&cli.output)?;
    print_summary(&report, &cli.output);

    // Recoverable per-feature failures still produce an image; signal
    // them through the exit code so scripts can notice.
    if report.failures.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Open every layer's property file and pair it with its style.
fn load_layers(spec: &MapSpec, base: &Path) -> Result<Vec<LayerDescriptor>> {
    let mut layers = Vec::with_capacity(spec.layers.len());
    for layer in &spec.layers {
        let path = base.join(&layer.source);
        let source = PropertySource::from_path(&path)
            .with_context(|| format!("failed to load layer '{}'", layer.name))?;
        let style = LayerStyle {
            symbolizer: Some(layer.symbolizer.clone()),
            options: layer.options.clone(),
        };
        layers.push(LayerDescriptor::new(&layer.name, Box::new(source), style));
    }
    Ok(layers)
}

/// One-line render summary, plus a line per recoverable failure.
fn print_summary(report: &RenderReport, output: &Path) {
    if report.failures.is_empty() {
        println!(
            "{} {} feature(s) -> {}",
            "rendered".green(),
            report.painted,
            output.display()
        );
    } else {
        println!(
            "{} {} feature(s), {} failure(s) -> {}",
            "rendered".yellow(),
            report.painted,
            report.failures.len(),
            output.display()
        );
        for failure in &report.failures {
            eprintln!(
                "  {} layer '{}', feature '{}': {}",
                "failed:".red(),
                failure.layer,
                failure.feature,
                failure.error
            );
        }
    }
}
