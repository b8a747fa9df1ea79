use clap::{Args, Parser, Subcommand};
use imgkit::background::{self, CommandRemover};
use imgkit::config::{self, AppConfig};
use imgkit::editor::{EditorSettings, export};
use imgkit::imaging::{self, CompressConfig, Rotation, RustBackend};
use imgkit::pdf::{self, ScaleMode};
use imgkit::scene::Scene;
use imgkit::{naming, output};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("IMGKIT_ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("IMGKIT_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "imgkit")]
#[command(about = "Image utilities: logo compositing, resize, PDF scaling, background removal")]
#[command(long_about = "\
Image utilities: logo compositing, resize, PDF scaling, background removal

Commands write into the --output directory:

  compose scene.toml        → watermarked-image.png
  resize photo.png ...      → processed_photo.jpg ...
  pdf-scale report.pdf      → compressed_report.pdf
  remove-bg product.jpg     → transparent-image.png

A scene file places logo layers over a base image:

  base = \"photo.jpg\"
  canvas_width = 800          # optional, defaults to the base width

  [[layer]]
  path = \"logo.png\"
  x = 20.0                    # optional, defaults to centered
  y = 20.0
  width = 160.0               # optional
  rotation = -15.0            # optional, degrees

Settings are read from imgkit.toml in the working directory, or --config.
Run 'imgkit gen-config' to generate a documented config file.
Set RUST_LOG=debug for diagnostics.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (defaults to ./imgkit.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(long, default_value = ".", global = true)]
    output: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a scene of logo layers over a base image to PNG
    Compose {
        /// Scene file (TOML)
        scene: PathBuf,
    },
    /// Resize, rotate and compress images to JPEG under a size limit
    Resize(ResizeArgs),
    /// Scale the content of every PDF page
    PdfScale(PdfArgs),
    /// Remove an image background with the configured external program
    RemoveBg {
        /// PNG or JPEG image
        file: PathBuf,
    },
    /// Print a stock imgkit.toml with all options documented
    GenConfig,
}

#[derive(Args)]
struct ResizeArgs {
    /// Images to process
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Longer edge as a percentage of the original (clamped to 10-100)
    #[arg(long)]
    percent: Option<u32>,

    /// JPEG quality (1-100)
    #[arg(long)]
    quality: Option<u32>,

    /// Output size ceiling in megabytes
    #[arg(long)]
    max_size_mb: Option<f64>,

    /// Clockwise rotation: 0, 90, 180 or 270
    #[arg(long, default_value = "0", value_parser = parse_rotation)]
    rotate: Rotation,

    /// Print one JSON object per file instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct PdfArgs {
    /// PDF document
    file: PathBuf,

    /// Content scale as a percentage (clamped to 10-100)
    #[arg(long)]
    percent: Option<u32>,

    /// Also shrink the page size, not only the content
    #[arg(long)]
    page: bool,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

fn parse_rotation(value: &str) -> Result<Rotation, String> {
    value
        .parse::<u32>()
        .ok()
        .and_then(Rotation::from_degrees)
        .ok_or_else(|| format!("'{value}' is not one of 0, 90, 180, 270"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Compose { scene } => {
            let config = load_app_config(cli.config.as_deref())?;
            let settings = EditorSettings::from_config(&config.editor)?;
            let editor = Scene::load(&scene, &settings)?;
            let path = cli.output.join(naming::COMPOSE_FILE_NAME);
            export::save_png(&editor, &path)?;
            output::print_compose_output(&editor, &path);
        }
        Command::Resize(args) => {
            let mut config = load_app_config(cli.config.as_deref())?;
            if let Some(percent) = args.percent {
                config.resize.percent = config::clamp_percent(percent);
            }
            if let Some(quality) = args.quality {
                config.resize.quality = quality;
            }
            if let Some(max_size_mb) = args.max_size_mb {
                config.resize.max_size_mb = max_size_mb;
            }
            config.validate()?;
            init_thread_pool(&config.processing);

            let compress = CompressConfig::from_resize_config(&config.resize, args.rotate);
            let results =
                imaging::compress_files(&RustBackend::new(), &args.files, &cli.output, &compress);

            let mut failed = 0;
            for (i, (source, result)) in results.iter().enumerate() {
                match result {
                    Ok(report) if args.json => output::print_json(&output::compress_report_json(report)),
                    Ok(report) => output::print_compress_report(i + 1, report),
                    Err(e) => {
                        failed += 1;
                        output::print_compress_error(i + 1, source, e);
                    }
                }
            }
            if failed > 0 {
                return Err(format!("{failed} of {} images failed", results.len()).into());
            }
        }
        Command::PdfScale(args) => {
            let mut config = load_app_config(cli.config.as_deref())?;
            if let Some(percent) = args.percent {
                config.pdf.percent = config::clamp_percent(percent);
            }
            config.validate()?;
            let mode = if args.page {
                ScaleMode::Page
            } else {
                ScaleMode::Content
            };
            let report = pdf::scale_pdf_file(&args.file, &cli.output, config.pdf.percent, mode)?;
            if args.json {
                output::print_json(&output::pdf_report_json(&report));
            } else {
                output::print_pdf_report(&report);
            }
        }
        Command::RemoveBg { file } => {
            let config = load_app_config(cli.config.as_deref())?;
            let remover = CommandRemover::from_config(&config.background)?;
            let report = background::remove_background_file(&remover, &file, &cli.output)?;
            output::print_remove_output(&report);
        }
    }

    Ok(())
}

/// Diagnostics go to stderr; stdout carries results only.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// An explicit `--config` must exist; the implicit `./imgkit.toml` may not.
fn load_app_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) if !path.exists() => {
            Err(format!("config file not found: {}", path.display()).into())
        }
        Some(path) => Ok(config::load_config(path)?),
        None => Ok(config::load_config(Path::new(config::CONFIG_FILE_NAME))?),
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Never more threads than available cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
