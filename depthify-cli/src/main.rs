//! depthify CLI: turn a segmented RGBA image into a colored mesh.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use depthify_algorithms::{classify_signals, measure_signals, ClassifierConfig, SpatialOutlierConfig};
use depthify_core::{MaskedImage, ObjectClass, ObjectProfile, ProfileSelection, DEFAULT_ALPHA_THRESHOLD};
use depthify_reconstruction::{DepthPipeline, PipelineConfig};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "depthify")]
#[command(about = "Synthesize depth for a segmented object and reconstruct a colored mesh")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full reconstruction on one image.
    Convert(ConvertArgs),

    /// Print the classifier signals and the detected object class.
    Classify {
        /// Segmented RGBA image; alpha marks the object.
        #[arg(long)]
        image: PathBuf,

        /// Pixels with alpha above this value are foreground.
        #[arg(long, default_value_t = DEFAULT_ALPHA_THRESHOLD)]
        alpha_threshold: u8,
    },
}

#[derive(Debug, Clone, Args)]
struct ConvertArgs {
    /// Segmented RGBA image; alpha marks the object.
    #[arg(long)]
    image: PathBuf,

    /// Object type preset, or `auto` to classify the image.
    #[arg(long, default_value = "auto")]
    object_type: String,

    /// Custom object profile (JSON). Overrides --object-type.
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Pipeline configuration (JSON). Missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable spatial outlier removal before meshing.
    #[arg(long)]
    high_quality: bool,

    /// Pixels with alpha above this value are foreground.
    #[arg(long, default_value_t = DEFAULT_ALPHA_THRESHOLD)]
    alpha_threshold: u8,

    /// Write the filtered point cloud as an x,y,z,r,g,b table.
    #[arg(long)]
    points: Option<PathBuf>,

    /// Write the mesh as JSON.
    #[arg(long)]
    mesh: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert(args) => run_convert(&args),
        Commands::Classify { image, alpha_threshold } => run_classify(&image, alpha_threshold),
    }
}

fn load_image(path: &Path, alpha_threshold: u8) -> Result<MaskedImage> {
    tracing::info!("Loading image: {}", path.display());
    let image = depthify_io::load_masked_image_with_threshold(path, alpha_threshold)
        .with_context(|| format!("Failed to open image {}", path.display()))?;
    tracing::info!(
        "Image size: {}x{}, {} foreground pixels",
        image.width(),
        image.height(),
        image.mask().count()
    );
    Ok(image)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {} {}", what, path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid {} {}", what, path.display()))
}

fn profile_selection(args: &ConvertArgs) -> Result<ProfileSelection> {
    if let Some(path) = &args.profile {
        let profile: ObjectProfile = read_json(path, "profile")?;
        profile.validate().with_context(|| format!("Invalid profile {}", path.display()))?;
        return Ok(ProfileSelection::Custom(profile));
    }

    let selection = ProfileSelection::from_label(&args.object_type);
    if let ProfileSelection::Preset(class) = &selection {
        if args.object_type.parse::<ObjectClass>().is_err() {
            tracing::warn!("Unknown object type '{}', using '{}'", args.object_type, class);
        }
    }
    Ok(selection)
}

// ── convert ────────────────────────────────────────────────────────────

fn run_convert(args: &ConvertArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => read_json::<PipelineConfig>(path, "config")?,
        None => PipelineConfig::default(),
    };
    if args.high_quality {
        config.outliers.spatial.get_or_insert_with(SpatialOutlierConfig::default);
    }

    let selection = profile_selection(args)?;
    let image = load_image(&args.image, args.alpha_threshold)?;

    let pipeline = DepthPipeline::new(config);
    let result = pipeline.run(&image, &selection).context("Reconstruction failed")?;

    tracing::info!(
        "Profile '{}'{}; {} points, {} faces",
        result.profile.profile.name,
        if result.profile.detected { " (detected)" } else { "" },
        result.cloud.len(),
        result.mesh.face_count()
    );

    if let Some(path) = &args.points {
        depthify_io::write_point_cloud(&result.cloud, path)
            .with_context(|| format!("Failed to write points {}", path.display()))?;
        tracing::info!("Points written to {}", path.display());
    }

    if let Some(path) = &args.mesh {
        depthify_io::write_mesh(&result.mesh, path)
            .with_context(|| format!("Failed to write mesh {}", path.display()))?;
        tracing::info!("Mesh written to {}", path.display());
    }

    if args.points.is_none() && args.mesh.is_none() {
        tracing::warn!("No --points or --mesh output requested; results discarded");
    }

    Ok(())
}

// ── classify ───────────────────────────────────────────────────────────

fn run_classify(path: &Path, alpha_threshold: u8) -> Result<()> {
    let image = load_image(path, alpha_threshold)?;
    let config = ClassifierConfig::default();

    let Some(signals) = measure_signals(&image, &config) else {
        bail!("{} has no foreground pixels", path.display());
    };

    println!("depthify object classification");
    println!("  color variance:    {:.2}", signals.color_variance);
    println!("  edge density:      {:.4}", signals.edge_density);
    println!("  shape complexity:  {:.2}", signals.shape_complexity);
    println!("  class:             {}", classify_signals(&signals, &config));

    Ok(())
}
