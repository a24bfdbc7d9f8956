use anyhow::{bail, Context};
use brandmark::config::Config;
use brandmark::session::EditorSession;
use brandmark::watermark::{IngestMode, LoadOutcome};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Brandmark - composite a brand watermark onto a product mockup
#[derive(Parser, Debug)]
#[command(name = "brandmark")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Catalog label, image path or http(s) URL of the product mockup
    #[arg(short, long)]
    product: Option<String>,

    /// Watermark file (image, SVG or .txt)
    #[arg(short, long)]
    watermark: Option<PathBuf>,

    /// Watermark opacity (0.0 - 1.0)
    #[arg(long)]
    opacity: Option<f32>,

    /// Watermark width as a fraction of the canvas width (0.1 - 0.9)
    #[arg(long)]
    scale: Option<f32>,

    /// Horizontal anchor (0.0 = left, 1.0 = right)
    #[arg(long)]
    anchor_x: Option<f32>,

    /// Vertical anchor (0.0 = top, 1.0 = bottom)
    #[arg(long)]
    anchor_y: Option<f32>,

    /// Directory the result is written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Upload the result after saving it
    #[arg(long)]
    submit: bool,

    /// Use the unprotected upload endpoint
    #[arg(long, requires = "submit")]
    no_scan_protection: bool,

    /// Override the ingestion mode from the configuration
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Restricted,
    Permissive,
}

impl From<ModeArg> for IngestMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Restricted => IngestMode::Restricted,
            ModeArg::Permissive => IngestMode::Permissive,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(mode) = args.mode {
        config.ingest.mode = mode.into();
    }

    brandmark::logging::init_subscriber(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::info!(
        config_file = ?args.config,
        canvas = %format!("{}x{}", config.canvas.width, config.canvas.height),
        products = config.products.len(),
        mode = ?config.ingest.mode,
        "Configuration loaded"
    );

    let mut session = EditorSession::new(config)?;

    let product = match args.product.clone() {
        Some(product) => product,
        None => match session.products().first() {
            Some(entry) => entry.label.clone(),
            None => bail!("No product given and the catalog is empty"),
        },
    };
    let ticket = if session.products().iter().any(|p| p.label == product) {
        session.select_product(&product)?
    } else {
        session.set_product_source(&product)?
    };
    if session.load(ticket).await != LoadOutcome::Ready {
        bail!("Product '{}' could not be loaded", product);
    }

    if let Some(path) = &args.watermark {
        session.ingest_path(path).await?;
    }
    if let Some(opacity) = args.opacity {
        session.set_opacity(opacity);
    }
    if let Some(scale) = args.scale {
        session.set_scale(scale);
    }
    if args.anchor_x.is_some() || args.anchor_y.is_some() {
        let current = session.state().transform().anchor();
        session.set_anchor(
            args.anchor_x.unwrap_or(current.x),
            args.anchor_y.unwrap_or(current.y),
        );
    }

    if let Some(message) = session.preview_status().message() {
        tracing::info!("{}", message);
    }

    let path = session.download(&args.output_dir).await?;
    println!("{}", path.display());

    if args.submit {
        let scan = session.submit(!args.no_scan_protection).await?;
        println!("{}", scan.pretty());
    }

    Ok(())
}
