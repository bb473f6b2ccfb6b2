//! FDL CLI - Bridge interface for host applications
//!
//! Commands: validate, recompute, ensure, export, derive, new-id, slug, sensors
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 on validation failure

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;

use fdl_core::{
    catalog::SensorCatalog,
    geometry::{derive_decision, describe_decision, ensure_decisions, recompute_all_decisions},
    io::load_value,
    model::{AspectRatio, Canvas, Dimensions, FdlDocument, FramingIntent},
    pipeline::{ExportOptions, ExportPipeline},
    validation::validate_json,
    generate_document_id, generate_element_id,
};

#[derive(Parser)]
#[command(name = "fdl-cli")]
#[command(about = "FDL CLI - Framing Decision List geometry and validation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to sensor catalog directory
    #[arg(short, long, default_value = "sensors")]
    catalog_dir: PathBuf,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an .fdl file
    Validate {
        file: PathBuf,
    },

    /// Recompute every framing decision from current intents and canvases
    Recompute {
        file: PathBuf,
        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create missing decisions for every intent on every canvas
    Ensure {
        file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Recompute, validate and write an export-ready .fdl
    Export {
        file: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Keep decisions exactly as stored
        #[arg(long)]
        no_recompute: bool,
        #[arg(long)]
        compact: bool,
    },

    /// Derive one framing decision
    Derive {
        /// Canvas size, e.g. 1920x1080
        #[arg(long, value_parser = parse_dimensions)]
        canvas: Dimensions,
        /// Intent aspect ratio, e.g. 4:3
        #[arg(long, value_parser = parse_aspect_ratio)]
        aspect: AspectRatio,
        /// Protection percentage
        #[arg(long)]
        protection: Option<f64>,
        #[arg(long)]
        squeeze: Option<f64>,
    },

    /// Print a fresh document UUID
    NewId,

    /// Slugify a label into an element id
    Slug {
        label: String,
    },

    /// List catalog manufacturers, models or modes
    Sensors {
        manufacturer: Option<String>,
        model: Option<String>,
    },
}

fn parse_pair(text: &str, separator: char) -> Result<(u32, u32), String> {
    let (a, b) = text
        .split_once(separator)
        .ok_or_else(|| format!("expected <width>{}<height>", separator))?;
    let a = a.trim().parse().map_err(|e| format!("{}: {}", a, e))?;
    let b = b.trim().parse().map_err(|e| format!("{}: {}", b, e))?;
    Ok((a, b))
}

fn parse_dimensions(text: &str) -> Result<Dimensions, String> {
    parse_pair(text, 'x').map(|(w, h)| Dimensions::new(w, h))
}

fn parse_aspect_ratio(text: &str) -> Result<AspectRatio, String> {
    parse_pair(text, ':').map(|(w, h)| AspectRatio::new(w, h))
}

fn emit<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn fail(error: impl std::fmt::Display) -> ExitCode {
    let output = serde_json::json!({
        "success": false,
        "error": error.to_string(),
    });
    println!("{}", output);
    ExitCode::FAILURE
}

fn write_or_emit(document: &FdlDocument, output: Option<&Path>) -> ExitCode {
    match output {
        Some(path) => match document.save(path) {
            Ok(()) => emit(&serde_json::json!({"success": true, "output": path})),
            Err(e) => fail(e),
        },
        None => emit(document),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    match cli.command {
        Commands::Validate { file } => {
            let value = match load_value(&file) {
                Ok(v) => v,
                Err(e) => return fail(e),
            };
            let report = validate_json(&value);
            let code = emit(&report);
            if report.is_valid {
                code
            } else {
                ExitCode::from(2)  // Validation failure
            }
        }

        Commands::Recompute { file, output } => match FdlDocument::load(&file) {
            Ok(doc) => write_or_emit(&recompute_all_decisions(&doc), output.as_deref()),
            Err(e) => fail(e),
        },

        Commands::Ensure { file, output } => match FdlDocument::load(&file) {
            Ok(doc) => write_or_emit(&ensure_decisions(&doc), output.as_deref()),
            Err(e) => fail(e),
        },

        Commands::Export { file, output, no_recompute, compact } => {
            let pipeline = ExportPipeline::new(ExportOptions {
                recompute_decisions: !no_recompute,
                pretty: !compact,
            });
            let text = match std::fs::read_to_string(&file) {
                Ok(t) => t,
                Err(e) => return fail(e),
            };
            match pipeline.finalize_json(&text) {
                Ok(exported) => {
                    if let Err(e) = std::fs::write(&output, &exported.json) {
                        return fail(e);
                    }
                    emit(&serde_json::json!({
                        "success": true,
                        "output": output,
                        "digest": exported.digest,
                        "engine_version": exported.engine_version,
                    }))
                }
                Err(e) => {
                    let _ = fail(e);
                    ExitCode::from(2)  // Export refused
                }
            }
        }

        Commands::Derive { canvas, aspect, protection, squeeze } => {
            let mut intent = FramingIntent::new(generate_element_id(&format!("{}_{}", aspect.width, aspect.height)), aspect);
            if let Some(p) = protection {
                intent = intent.with_protection(p);
            }
            let mut canvas = Canvas::new("canvas", canvas);
            if let Some(s) = squeeze {
                canvas = canvas.with_anamorphic_squeeze(s);
            }
            match derive_decision(&intent, &canvas) {
                Ok(decision) => emit(&serde_json::json!({
                    "decision": decision,
                    "summary": describe_decision(&canvas, &decision),
                })),
                Err(e) => fail(e),
            }
        }

        Commands::NewId => {
            println!("{}", generate_document_id());
            ExitCode::SUCCESS
        }

        Commands::Slug { label } => {
            println!("{}", generate_element_id(&label));
            ExitCode::SUCCESS
        }

        Commands::Sensors { manufacturer, model } => {
            let catalog = match SensorCatalog::load_from_dir(&cli.catalog_dir) {
                Ok(c) => c,
                Err(e) => return fail(format!("Failed to load sensor catalog: {}", e)),
            };
            match (manufacturer, model) {
                (None, _) => emit(&catalog.manufacturers()),
                (Some(m), None) => match catalog.models(&m) {
                    Some(models) => emit(&models),
                    None => fail(format!("Unknown manufacturer: {}", m)),
                },
                (Some(m), Some(model)) => match catalog.modes(&m, &model) {
                    Some(modes) => emit(&modes),
                    None => fail(format!("Unknown camera: {} {}", m, model)),
                },
            }
        }
    }
}
