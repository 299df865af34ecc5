use clap::{Args, Parser, Subcommand};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_circle_mut;
use log::info;
use ridgeauth_cli::logger::init_with_level;
use ridgeauth_cli::AuthEngine;
use ridgeauth_core::{AuthLevel, Image, PipelineConfig, ThresholdTable};
use serde::Serialize;
use std::path::{Path, PathBuf};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

const EXIT_ACCEPT: i32 = 0;
const EXIT_DENY: i32 = 1;
const EXIT_ERROR: i32 = 2;

#[derive(Parser)]
#[command(name = "ridgeauth")]
#[command(about = "Fingerprint authentication via binary descriptor matching")]
#[command(version)]
struct Cli {
    /// Enable debug logging (includes the deny-reason taxonomy).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a reference fingerprint, then authenticate a probe against it.
    Verify(VerifyArgs),

    /// Run the pipeline on one image and write a keypoint overlay.
    Inspect(InspectArgs),
}

#[derive(Debug, Clone, Args)]
struct VerifyArgs {
    /// Reference fingerprint image to register.
    #[arg(long)]
    reference: PathBuf,

    /// Authentication level the reference is registered under (1-3).
    #[arg(long)]
    level: u8,

    /// Probe fingerprint image to authenticate.
    #[arg(long)]
    probe: PathBuf,

    /// Level claimed for the probe; defaults to the registered level.
    #[arg(long)]
    claim: Option<u8>,

    /// TOML file overriding the per-level threshold table.
    #[arg(long)]
    thresholds: Option<PathBuf>,

    /// Write a machine-readable decision report (JSON).
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct InspectArgs {
    /// Input fingerprint image.
    image: PathBuf,

    /// Output path for the keypoint overlay.
    #[arg(long, default_value = "keypoints.png")]
    out: PathBuf,
}

#[derive(Serialize)]
struct DecisionReport<'a> {
    accepted: bool,
    message: &'a str,
    registered_level: u8,
    claimed_level: u8,
}

fn load_grayscale(path: &Path) -> CliResult<(Image, usize, usize)> {
    let img = image::open(path)
        .map_err(|e| format!("cannot open {}: {}", path.display(), e))?
        .to_luma8();
    let (w, h) = img.dimensions();
    Ok((img.into_raw(), w as usize, h as usize))
}

/// Load the per-level threshold table, falling back to the built-in defaults
/// when no override file is given. The file is TOML with one section per
/// level:
///
/// ```toml
/// [level1]
/// min_correspondences = 30
/// max_mean_distance = 40.0
///
/// [level2]
/// min_correspondences = 50
/// max_mean_distance = 30.0
///
/// [level3]
/// min_correspondences = 70
/// max_mean_distance = 20.0
/// ```
///
/// All three sections and both fields are required.
fn load_thresholds(path: Option<&Path>) -> CliResult<ThresholdTable> {
    match path {
        None => Ok(ThresholdTable::default()),
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
            let table = toml::from_str(&text)
                .map_err(|e| format!("invalid threshold table {}: {}", path.display(), e))?;
            Ok(table)
        }
    }
}

fn run_verify(args: &VerifyArgs) -> CliResult<i32> {
    let level = AuthLevel::try_from(args.level)?;
    let claimed = match args.claim {
        Some(raw) => AuthLevel::try_from(raw)?,
        None => level,
    };
    let thresholds = load_thresholds(args.thresholds.as_deref())?;

    let mut engine = AuthEngine::new(PipelineConfig::default(), thresholds);

    let (reference, rw, rh) = load_grayscale(&args.reference)?;
    let outcome = engine.register(&reference, rw, rh, level)?;
    println!("{}", outcome);
    if !outcome.is_success() {
        return Ok(EXIT_ERROR);
    }

    let (probe, pw, ph) = load_grayscale(&args.probe)?;
    let decision = engine.authenticate(&probe, pw, ph, claimed)?;
    println!("{}", decision.message());

    if let Some(json_path) = &args.json {
        let report = DecisionReport {
            accepted: decision.is_accept(),
            message: decision.message(),
            registered_level: level.as_u8(),
            claimed_level: claimed.as_u8(),
        };
        std::fs::write(json_path, serde_json::to_string_pretty(&report)?)?;
        info!("decision report written to {}", json_path.display());
    }

    Ok(if decision.is_accept() { EXIT_ACCEPT } else { EXIT_DENY })
}

fn run_inspect(args: &InspectArgs) -> CliResult<i32> {
    let engine = AuthEngine::with_defaults();
    let (raw, w, h) = load_grayscale(&args.image)?;
    let keypoints = engine.keypoints(&raw, w, h)?;
    println!("Detected {} keypoints", keypoints.len());

    let luma = image::GrayImage::from_raw(w as u32, h as u32, raw)
        .ok_or("image buffer size mismatch")?;
    let mut overlay: RgbaImage = image::DynamicImage::ImageLuma8(luma).into_rgba8();
    for kp in &keypoints {
        draw_hollow_circle_mut(
            &mut overlay,
            (kp.x as i32, kp.y as i32),
            3,
            Rgba([255, 0, 0, 255]),
        );
    }
    overlay.save(&args.out)?;
    println!("Saved overlay as {}", args.out.display());

    Ok(EXIT_ACCEPT)
}


fn main() {
    let cli = Cli::parse();
    init_with_level(if cli.verbose { log::Level::Debug } else { log::Level::Info });

    let result = match &cli.command {
        Commands::Verify(args) => run_verify(args),
        Commands::Inspect(args) => run_inspect(args),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(EXIT_ERROR);
        }
    }
}
