//! Storage Manager - web UI for household collectibles
//!
//! Serves the item tables under the data directory and the converted
//! photos under the image directory until interrupted.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use storage_manager::{ImageProcessor, Inventory};

/// Household collectibles tracker backed by CSV tables
#[derive(Parser, Debug)]
#[command(name = "storage_manager")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory holding figures.csv, clothing.csv and goods.csv
    #[arg(short, long, default_value_t = default_dir("data"))]
    data_dir: String,

    /// Directory for uploaded and converted images
    #[arg(short, long, default_value_t = default_dir("images"))]
    image_dir: String,

    /// Address to bind the web UI to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port for the web UI
    #[arg(short, long, default_value_t = 7334)]
    port: u16,

    /// Long-edge limit in pixels for converted images
    #[arg(long, default_value_t = storage_manager::image_processor::DEFAULT_MAX_EDGE)]
    max_image_edge: u32,
}

/// Returns a default directory: ~/.local/share/storage_manager/<name>
fn default_dir(name: &str) -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("storage_manager")
        .join(name)
        .to_string_lossy()
        .to_string()
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let data_dir = PathBuf::from(&args.data_dir);
    let image_dir = PathBuf::from(&args.image_dir);

    log::info!("Starting storage_manager...");
    log::info!("Data directory: {}", data_dir.display());
    log::info!("Image directory: {}", image_dir.display());

    for dir in [&data_dir, &image_dir] {
        if !dir.exists() {
            if let Err(e) = std::fs::create_dir_all(dir) {
                log::error!("Failed to create directory {}: {}", dir.display(), e);
                std::process::exit(1);
            }
            log::info!("Created directory: {}", dir.display());
        }
    }

    let images = ImageProcessor::new(&image_dir).with_max_edge(args.max_image_edge);
    let inventory = Arc::new(Inventory::new(&data_dir, images));

    match inventory.summary() {
        Ok(summary) => log::info!(
            "Loaded {} items ({:?})",
            summary.total,
            summary.counts
        ),
        Err(e) => log::warn!("Failed to read item tables: {}", e),
    }

    let addr = format!("{}:{}", args.host, args.port);
    if let Err(e) = storage_manager::web::serve(inventory, &image_dir, &addr).await {
        log::error!("Web server error: {}", e);
        std::process::exit(1);
    }
}
