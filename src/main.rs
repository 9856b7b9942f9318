use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use eframe::egui;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use serprate_explorer::app::ExplorerApp;
use serprate_explorer::config::ExplorerConfig;
use serprate_explorer::data::store::{FileSource, SeriesStore};
use serprate_explorer::state::session::Session;

#[derive(Parser, Debug)]
#[command(name = "serprate-explorer")]
#[command(about = "Linked multi-panel viewer for environmental time series")]
#[command(version)]
struct Cli {
    /// Path to a JSON configuration file. Built-in datasets are used if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory the dataset sources are resolved against.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory exported images are written to.
    #[arg(long)]
    export_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ExplorerConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ExplorerConfig::default(),
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = cli.export_dir {
        config.export_dir = dir;
    }

    tracing::info!(
        "Loading {} datasets from {}",
        config.datasets.len(),
        config.data_dir.display()
    );
    let (store, failures) = SeriesStore::load(&FileSource::new(&config.data_dir), &config.datasets);
    let selection = config.startup_selection(&store.names());
    let session = Session::new(store, &selection);
    let failures: Vec<String> = failures.iter().map(ToString::to_string).collect();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(config.title.clone())
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 600.0]),
        renderer: eframe::Renderer::Wgpu,
        ..Default::default()
    };

    let title = config.title.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| Ok(Box::new(ExplorerApp::new(cc, session, config, failures)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {e}"))?;

    Ok(())
}
