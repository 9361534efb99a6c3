use clap::Parser;
use emoticart::camera::{CameraManager, WebcamOpener};
use emoticart::config::KioskConfig;
use emoticart::error::{KioskError, Result};
use emoticart::kiosk::Kiosk;
use emoticart::perception::ModelPerception;
use emoticart::ui::KioskApp;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Emotion-aware shopping kiosk
#[derive(Debug, Parser)]
#[command(name = "emoticart", version, about)]
struct Cli {
    /// Configuration file (TOML); defaults apply when it does not exist
    #[arg(short, long, default_value = "emoticart.toml")]
    config: PathBuf,

    /// Camera index, overrides the configuration
    #[arg(long)]
    camera: Option<u32>,

    /// Product catalog CSV, overrides the configuration
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Print the available cameras and exit
    #[arg(long)]
    list_cameras: bool,
}

/// Initializes the logging system (file only, no console output)
fn init_logging(log_path: &Path, default_filter: &str) -> Result<()> {
    let log_file = std::fs::File::create(log_path)?;

    let file_layer = fmt::layer()
        .with_writer(Arc::new(log_file))
        .with_ansi(false);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| KioskError::Config(format!("Invalid log filter {default_filter:?}: {e}")))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.list_cameras {
        for (idx, name) in CameraManager::list_devices()?.iter().enumerate() {
            println!("{idx}: {name}");
        }
        return Ok(());
    }

    let mut config = KioskConfig::load_or_default(&cli.config)?;
    if let Some(index) = cli.camera {
        config.camera.index = index;
    }
    if let Some(catalog) = cli.catalog {
        config.catalog.path = catalog;
    }

    init_logging(&config.logging.file, &config.logging.filter)?;
    info!("Starting EmotiCart with {:?}", config);

    let perception = ModelPerception::load(&config.models)?;
    let kiosk = Kiosk::new(WebcamOpener::new(config.camera.clone()), perception);
    let catalog_path = config.catalog.path.clone();

    let result = eframe::run_native(
        "EmotiCart",
        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([1280.0, 960.0])
                .with_title("EmotiCart: Smart Shopping Experience"),
            ..Default::default()
        },
        Box::new(move |_cc| Ok(Box::new(KioskApp::new(kiosk, catalog_path)))),
    );

    if let Err(e) = result {
        error!("Application error: {}", e);
    }

    Ok(())
}
