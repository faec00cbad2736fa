#![deny(unsafe_code)]
//! CLI binary for the halftone engine.
//!
//! Subcommands:
//! - `render <input>`: screen an image and write a PNG
//! - `svg <input>`: export the halftone dots as SVG
//! - `patterns`: print available patterns and color modes

mod error;

use clap::{Args, Parser, Subcommand};
use error::CliError;
use halftone_core::{ColorMode, Pattern, Raster, Settings};
use halftone_render::{snapshot, vector, Backend, Halftoner};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

/// Largest accepted source image, in pixels per side.
const MAX_DIMENSION: u32 = 4000;

#[derive(Parser)]
#[command(name = "halftone", about = "Print-style halftone renderer")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Raise log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Screen an image and write the composited PNG.
    Render {
        /// Source image (PNG or JPEG).
        input: PathBuf,

        /// Output file path.
        #[arg(short, long, default_value = "out.png")]
        output: PathBuf,

        /// Upscale the finished image 2x for print.
        #[arg(long)]
        print: bool,

        /// Also write each separation plate into this directory.
        #[arg(long)]
        plates: Option<PathBuf>,

        /// Screening backend (field, grid).
        #[arg(long)]
        backend: Option<String>,

        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Export the halftone dots as an SVG document.
    Svg {
        /// Source image (PNG or JPEG).
        input: PathBuf,

        /// Output file path.
        #[arg(short, long, default_value = "out.svg")]
        output: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// List available patterns and color modes.
    Patterns,
}

#[derive(Args)]
struct SettingsArgs {
    /// Settings snapshot as a JSON file; flags below override it.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Pattern name (circle, square, gooey, ...).
    #[arg(short, long)]
    pattern: Option<String>,

    /// Color mode (cmyk, mono, duotone, tritone).
    #[arg(short, long)]
    mode: Option<String>,

    /// Screen frequency in cells across the image width, for every channel.
    #[arg(short, long)]
    frequency: Option<f64>,

    /// Dot size percentage, for every channel.
    #[arg(short, long)]
    size: Option<f64>,

    /// Leave the page transparent instead of paper.
    #[arg(long)]
    transparent: bool,
}

impl SettingsArgs {
    fn resolve(&self) -> Result<Settings, CliError> {
        let mut settings = match &self.settings {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .map_err(|e| CliError::Io(format!("reading {}: {e}", path.display())))?;
                Settings::from_json(&json)?
            }
            None => Settings::default(),
        };
        if let Some(name) = &self.pattern {
            settings.pattern = Pattern::from_name(name);
        }
        if let Some(name) = &self.mode {
            settings.color_mode = ColorMode::from_name(name)?;
        }
        if let Some(frequency) = self.frequency {
            settings.set_global_frequency(frequency);
        }
        if let Some(size) = self.size {
            settings.set_global_size(size);
        }
        if self.transparent {
            settings.transparent_bg = true;
        }
        settings.validate()?;
        Ok(settings)
    }
}

/// Decodes `path` into a source raster, rejecting oversize images.
fn load_image(path: &Path) -> Result<Raster, CliError> {
    let img = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(io) => CliError::Io(format!("reading {}: {io}", path.display())),
        other => CliError::Input(format!("cannot decode {}: {other}", path.display())),
    })?;
    let (width, height) = (img.width(), img.height());
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(CliError::Input(format!(
            "{} is {width}x{height}; images are limited to {MAX_DIMENSION}px per side",
            path.display()
        )));
    }
    log::info!("loaded {} ({width}x{height})", path.display());
    Ok(snapshot::from_image(img.to_rgba8())?)
}

fn print_json(value: &serde_json::Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Patterns => {
            let patterns = Pattern::names();
            let modes: Vec<_> = ColorMode::ALL.iter().map(|m| m.name()).collect();
            if cli.json {
                print_json(&serde_json::json!({
                    "patterns": patterns,
                    "color_modes": modes,
                }))?;
            } else {
                println!("Patterns:");
                for (id, name) in patterns.iter().enumerate() {
                    println!("  {id:>2}  {name}");
                }
                println!("Color modes:");
                println!("  {}", modes.join(", "));
            }
        }
        Command::Render {
            input,
            output,
            print,
            plates,
            backend,
            settings,
        } => {
            let settings = settings.resolve()?;
            let mut session = Halftoner::new(load_image(&input)?);
            if let Some(name) = backend {
                session = session.with_backend(Backend::from_name(&name).map_err(|e| CliError::Input(e.to_string()))?);
            }

            let screened = session.render_plates(&settings)?;
            let mut written = Vec::new();
            if let Some(dir) = &plates {
                fs::create_dir_all(dir).map_err(|e| CliError::Io(format!("creating {}: {e}", dir.display())))?;
                for plate in &screened {
                    let path = dir.join(format!("{}.png", plate.label));
                    snapshot::write_plate_png(plate, &path)?;
                    written.push(path.display().to_string());
                }
            }

            let mut raster = session.composite(&screened, &settings)?;
            if print {
                raster = snapshot::upscale_for_print(&raster)?;
            }
            snapshot::write_png(&raster, &output)?;

            if cli.json {
                print_json(&serde_json::json!({
                    "input": input.display().to_string(),
                    "output": output.display().to_string(),
                    "width": raster.width(),
                    "height": raster.height(),
                    "pattern": settings.pattern.name(),
                    "color_mode": settings.color_mode.name(),
                    "backend": session.backend().name(),
                    "plates": written,
                }))?;
            } else {
                eprintln!(
                    "rendered {} ({}, {}, {}x{}) -> {}",
                    input.display(),
                    settings.pattern,
                    settings.color_mode,
                    raster.width(),
                    raster.height(),
                    output.display()
                );
            }
        }
        Command::Svg {
            input,
            output,
            settings,
        } => {
            let settings = settings.resolve()?;
            let session = Halftoner::new(load_image(&input)?);
            let document = session.export_svg(&settings)?;
            vector::write_svg(&document, &output)?;

            if cli.json {
                print_json(&serde_json::json!({
                    "input": input.display().to_string(),
                    "output": output.display().to_string(),
                    "pattern": settings.pattern.name(),
                    "color_mode": settings.color_mode.name(),
                    "bytes": document.len(),
                }))?;
            } else {
                eprintln!("exported {} -> {}", input.display(), output.display());
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> SettingsArgs {
        SettingsArgs {
            settings: None,
            pattern: None,
            mode: None,
            frequency: None,
            size: None,
            transparent: false,
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_render_flags() {
        let cli = Cli::try_parse_from([
            "halftone", "render", "in.png", "-o", "x.png", "--pattern", "star", "--frequency", "30", "--print",
        ])
        .unwrap();
        match cli.command {
            Command::Render {
                output, print, settings, ..
            } => {
                assert_eq!(output, PathBuf::from("x.png"));
                assert!(print);
                assert_eq!(settings.pattern.as_deref(), Some("star"));
                assert_eq!(settings.frequency, Some(30.0));
            }
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn flags_override_defaults() {
        let mut a = args();
        a.pattern = Some("hex".into());
        a.mode = Some("mono".into());
        a.frequency = Some(20.0);
        a.transparent = true;
        let s = a.resolve().unwrap();
        assert_eq!(s.pattern, Pattern::Hex);
        assert_eq!(s.color_mode, ColorMode::Mono);
        assert_eq!(s.channels.magenta.frequency, 20.0);
        assert!(s.transparent_bg);
    }

    #[test]
    fn unknown_mode_is_an_input_error() {
        let mut a = args();
        a.mode = Some("sepia".into());
        assert_eq!(a.resolve().err().map(|e| e.exit_code()), Some(12));
    }

    #[test]
    fn settings_file_is_read_then_overridden() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        fs::write(&path, r#"{"pattern": "ring", "global_size": 80, "transparent_bg": true}"#).unwrap();
        let mut a = args();
        a.settings = Some(path);
        a.pattern = Some("cross".into());
        let s = a.resolve().unwrap();
        assert_eq!(s.pattern, Pattern::Cross);
        assert!(s.transparent_bg);
        assert!(s.channels.iter().all(|(_, c)| c.size == 80.0));
    }

    #[test]
    fn missing_settings_file_is_io_error() {
        let mut a = args();
        a.settings = Some(PathBuf::from("/nonexistent/settings.json"));
        assert_eq!(a.resolve().err().map(|e| e.exit_code()), Some(11));
    }

    #[test]
    fn oversize_image_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        image::RgbaImage::new(MAX_DIMENSION + 1, 1).save(&path).unwrap();
        assert_eq!(load_image(&path).err().map(|e| e.exit_code()), Some(12));
    }

    #[test]
    fn garbage_image_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.png");
        fs::write(&path, b"not an image").unwrap();
        assert_eq!(load_image(&path).err().map(|e| e.exit_code()), Some(12));
    }

    #[test]
    fn loads_small_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("px.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255])).save(&path).unwrap();
        let raster = load_image(&path).unwrap();
        assert_eq!((raster.width(), raster.height()), (3, 2));
        assert_eq!(raster.rgba(2, 1), [10, 20, 30, 255]);
    }
}
