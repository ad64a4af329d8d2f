use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use kmeans_palette::Quantizer;
use stitchpal::api;
use stitchpal::assets::AssetLoader;
use stitchpal::models::{AppConfig, QuantizeQuery};
use stitchpal::server;
use stitchpal::services::{image_loader, parse_reference_table, OutputFormat, QuantizeOutcome};

#[derive(Parser)]
#[command(name = "stitchpal")]
#[command(about = "Palette reduction service: shrink an image to K representative colors")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Quantize an image file directly (no server needed)
    Quantize {
        /// Input image (any format the server accepts)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file; `.png`, `.jpg` or `.jpeg` selects the encoding
        #[arg(short, long)]
        output: PathBuf,

        /// Max thumbnail dimension
        #[arg(short, long)]
        size: Option<u32>,

        /// Number of palette colors (K)
        #[arg(short, long)]
        colors: Option<usize>,

        /// Built-in reference palette to snap colors to (e.g. "dmc")
        #[arg(short, long, conflicts_with = "reference_file")]
        reference: Option<String>,

        /// Reference palette CSV file to snap colors to
        #[arg(long)]
        reference_file: Option<PathBuf>,

        /// Clusterer seed (overrides config)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// List built-in reference palettes
    Palettes,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stitchpal API",
        description = "Palette reduction: k-means color quantization with optional reference palette snapping",
        version = "0.1.0",
        license(name = "MIT")
    ),
    paths(
        api::handle_quantize,
        api::handle_palette,
        api::handle_list_palettes,
    ),
    components(schemas(
        api::UploadForm,
        api::PaletteResponse,
        api::PaletteColor,
        api::PaletteListResponse,
        OutputFormat,
    )),
    tags(
        (name = "Quantize", description = "Palette reduction of uploaded images"),
        (name = "Palettes", description = "Built-in reference palettes")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Quantize {
            input,
            output,
            size,
            colors,
            reference,
            reference_file,
            seed,
        }) => {
            run_quantize_command(
                &input,
                &output,
                size,
                colors,
                reference,
                reference_file,
                seed,
            )
            .await
        }
        Some(Commands::Palettes) => {
            init_cli_tracing();
            for name in AssetLoader::from_env().list_palettes() {
                println!("{name}");
            }
            Ok(())
        }
        Some(Commands::Serve) | None => run_server().await,
    }
}

/// Minimal logging for CLI commands
fn init_cli_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stitchpal=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();
}

/// Quantize a file directly and print the resulting palette
async fn run_quantize_command(
    input: &Path,
    output: &Path,
    size: Option<u32>,
    colors: Option<usize>,
    reference: Option<String>,
    reference_file: Option<PathBuf>,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    init_cli_tracing();

    let format = output
        .extension()
        .and_then(|e| e.to_str())
        .and_then(OutputFormat::from_extension)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Cannot infer output format from {}; use .png, .jpg or .jpeg",
                output.display()
            )
        })?;

    let asset_loader = Arc::new(AssetLoader::from_env());
    let mut config = AppConfig::load_from_assets(&asset_loader);
    if let Some(seed) = seed {
        config.clustering.seed = seed;
    }
    let state = server::create_app_state_with_config(config, asset_loader)?;
    let service = state.quantizer;

    let params = service.params(&QuantizeQuery {
        size,
        colors,
        reference,
        format: Some(format),
        ..Default::default()
    })?;

    let table = match (reference_file, &params.reference) {
        (Some(path), _) => {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
            Some(Arc::new(parse_reference_table(&text)?))
        }
        (None, Some(spec)) => Some(service.references().resolve(spec).await?),
        (None, None) => None,
    };

    let bytes = std::fs::read(input)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", input.display()))?;
    let pixels = image_loader::load_pixels(&bytes, params.size)?;
    let image = Quantizer::new(params.colors)
        .options(state.config.clustering.to_options())
        .quantize(&pixels, table.as_deref())?;

    let outcome = QuantizeOutcome {
        image,
        reference: table,
    };
    let encoded = service.render(&outcome, params.format).await?;
    std::fs::write(output, &encoded)?;

    let labels = outcome.reference_labels();
    for (i, (hex, count)) in outcome
        .palette_hex()
        .into_iter()
        .zip(outcome.image.color_counts())
        .enumerate()
    {
        match labels.as_ref().map(|l| l[i].as_str()) {
            Some(label) => println!("{hex}  {count:>7}  {label}"),
            None => println!("{hex}  {count:>7}"),
        }
    }

    eprintln!(
        "Wrote {}x{} {} to {} ({} bytes)",
        outcome.image.width(),
        outcome.image.height(),
        params.format.content_type(),
        output.display(),
        encoded.len()
    );

    Ok(())
}

async fn run_server() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stitchpal=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let asset_loader = Arc::new(AssetLoader::from_env());

    // Log asset sources
    tracing::info!(
        config = %asset_loader
            .config_file()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "embedded".to_string()),
        palettes = %asset_loader
            .palettes_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "embedded".to_string()),
        "Asset sources configured"
    );

    let state = server::create_app_state(asset_loader)?;

    // OpenAPI documentation is production only
    let app = server::build_router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Stitchpal server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
