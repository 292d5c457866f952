use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fitrs::catalog::ProductCatalog;
use fitrs::config::{self, Config};
use fitrs::dimensions::GlassesDimensions;
use fitrs::detection::PersonDetection;
use fitrs::sprites::SpriteCache;
use fitrs::tryon::{FrameStatus, TryOn, TryOnRequest};
use fitrs::{LandmarkSet, ProductKind};
use image::RgbImage;
use log::{info, warn};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "fitrs")]
#[command(
    version,
    about = "Virtual try-on - fit glasses and hats to a face at real-world scale"
)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a product onto a frame
    Tryon {
        /// Input frame
        #[arg(short, long)]
        image: PathBuf,
        /// Landmark JSON from the face landmark detector
        #[arg(short, long)]
        landmarks: PathBuf,
        #[arg(long, default_value = "glasses")]
        product_type: String,
        #[arg(long, default_value = "classic_aviator")]
        product_id: String,
        /// Draw measurement markers and text onto the output
        #[arg(long)]
        show_measurements: bool,
        /// Where to write the composited frame
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Report facial measurements and recommended sizes
    Measure {
        #[arg(short, long)]
        image: PathBuf,
        #[arg(short, long)]
        landmarks: PathBuf,
    },
    /// Raw measurements and scaling numbers for tuning the calibration
    Debug {
        #[arg(short, long)]
        image: PathBuf,
        #[arg(short, long)]
        landmarks: PathBuf,
    },
    /// Place glasses with custom dimensions to check a sprite's sizing
    Calibrate {
        #[arg(short, long)]
        image: PathBuf,
        #[arg(short, long)]
        landmarks: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value = "current_glasses")]
        product_id: String,
        #[arg(long, default_value_t = 135.0)]
        frame_width_mm: f32,
        #[arg(long, default_value_t = 50.0)]
        frame_height_mm: f32,
        #[arg(long, default_value_t = 58.0)]
        lens_width_mm: f32,
        #[arg(long, default_value_t = 40.0)]
        lens_height_mm: f32,
        #[arg(long, default_value_t = 18.0)]
        bridge_width_mm: f32,
        #[arg(long, default_value_t = 140.0)]
        temple_length_mm: f32,
    },
    /// List catalog products and their dimensions
    Products,
    /// Open config file in editor
    Config,
}

/// Detector output for one frame.
#[derive(Debug, Default, Deserialize)]
struct FrameInput {
    #[serde(flatten)]
    landmarks: LandmarkSet,
    #[serde(default)]
    persons: Vec<PersonDetection>,
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Tryon {
            image,
            landmarks,
            product_type,
            product_id,
            show_measurements,
            output,
        } => {
            let request = TryOnRequest {
                product_type: ProductKind::parse(&product_type),
                product_id,
                show_measurements,
            };
            tryon(&cfg, &image, &landmarks, &request, &output)
        }
        Commands::Measure { image, landmarks } => measure(&cfg, &image, &landmarks),
        Commands::Debug { image, landmarks } => debug(&cfg, &image, &landmarks),
        Commands::Calibrate {
            image,
            landmarks,
            output,
            product_id,
            frame_width_mm,
            frame_height_mm,
            lens_width_mm,
            lens_height_mm,
            bridge_width_mm,
            temple_length_mm,
        } => {
            let custom = GlassesDimensions {
                frame_width_mm,
                frame_height_mm,
                lens_width_mm,
                lens_height_mm,
                bridge_width_mm,
                temple_length_mm,
            };
            calibrate(&cfg, &image, &landmarks, &output, &product_id, custom)
        }
        Commands::Products => products(&cfg),
        Commands::Config => open_config(cli.config.as_deref()),
    }
}

fn session(cfg: &Config) -> Result<TryOn<SpriteCache>> {
    let catalog = ProductCatalog::load_or_builtin(cfg.catalog.as_deref())
        .context("Failed to load product catalog")?;
    info!(
        "Catalog: {} product(s), sprites from {}",
        catalog.len(),
        cfg.sprite_dir.display()
    );
    let sprites = SpriteCache::new(&cfg.sprite_dir, &catalog);
    Ok(TryOn::new(catalog, sprites, cfg.tuning.clone()))
}

fn load_frame(path: &Path) -> Result<RgbImage> {
    let img = image::open(path).with_context(|| format!("Failed to read image {}", path.display()))?;
    Ok(img.to_rgb8())
}

fn load_input(path: &Path) -> Result<FrameInput> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading landmarks at {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing landmarks {}", path.display()))
}

fn landmarks_of(input: &FrameInput) -> Option<&LandmarkSet> {
    (!input.landmarks.is_empty()).then_some(&input.landmarks)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn tryon(
    cfg: &Config,
    image: &Path,
    landmarks: &Path,
    request: &TryOnRequest,
    output: &Path,
) -> Result<()> {
    let session = session(cfg)?;
    let mut frame = load_frame(image)?;
    let input = load_input(landmarks)?;

    info!(
        "Fitting {}/{} onto {}x{} frame",
        request.product_type,
        request.product_id,
        frame.width(),
        frame.height()
    );

    let response = session.process(&mut frame, landmarks_of(&input), &input.persons, request);
    match response.status {
        FrameStatus::Applied => info!("✓ Product applied"),
        FrameStatus::NoFace => warn!("No face in frame, writing original image"),
        FrameStatus::NotApplied => warn!("Product could not be placed, writing original image"),
    }

    frame
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Wrote {}", output.display());

    print_json(&response)
}

fn measure(cfg: &Config, image: &Path, landmarks: &Path) -> Result<()> {
    let session = session(cfg)?;
    let frame = load_frame(image)?;
    let input = load_input(landmarks)?;

    let response = session.measure_only(landmarks_of(&input), frame.dimensions());
    if let Some(err) = &response.error {
        warn!("Could not measure face: {}", err);
    }
    print_json(&response)
}

fn debug(cfg: &Config, image: &Path, landmarks: &Path) -> Result<()> {
    let session = session(cfg)?;
    let frame = load_frame(image)?;
    let input = load_input(landmarks)?;

    let response =
        session.debug_measurements(landmarks_of(&input), &input.persons, frame.dimensions());
    if let Some(err) = &response.error {
        warn!("Could not measure face: {}", err);
    }
    print_json(&response)
}

fn calibrate(
    cfg: &Config,
    image: &Path,
    landmarks: &Path,
    output: &Path,
    product_id: &str,
    custom: GlassesDimensions,
) -> Result<()> {
    let session = session(cfg)?;
    let mut frame = load_frame(image)?;
    let input = load_input(landmarks)?;

    let response = session.calibrate(&mut frame, landmarks_of(&input), product_id, custom);
    if let Some(err) = &response.error {
        warn!("{}", err);
    }

    frame
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Wrote {}", output.display());

    print_json(&response)
}

fn products(cfg: &Config) -> Result<()> {
    let catalog = ProductCatalog::load_or_builtin(cfg.catalog.as_deref())
        .context("Failed to load product catalog")?;
    print_json(&catalog)
}

fn open_config(path: Option<&Path>) -> Result<()> {
    let config_path = path.unwrap_or(config::CONFIG_PATH.as_path());
    if !config_path.exists() {
        config::save_config(&Config::default(), Some(config_path))
            .context("Failed to write default config")?;
    }
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    info!("Opening config file: {:?}", config_path);

    let status = std::process::Command::new(editor)
        .arg(config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status");
    }

    Ok(())
}
