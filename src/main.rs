mod ai;
mod app;
mod arcade;
mod care;
mod clock;
mod config;
mod input;
mod logging;
mod model;
mod project;
mod render;
mod storage;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "Look after your pets, then beat the computer at paddle ball")]
struct Cli {
    /// whose pets to load from the roster
    #[arg(long)]
    owner: Option<String>,

    /// seed for the arcade opponent and serves
    #[arg(long)]
    seed: Option<u64>,

    /// frame rate cap
    #[arg(long)]
    fps: Option<u32>,

    /// monochrome output
    #[arg(long)]
    no_color: bool,

    /// directory for settings, roster and log
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// roster file to use instead of the one in the data dir
    #[arg(long)]
    store: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut paths = config::project_paths(cli.data_dir.as_deref())?;
    if let Some(store) = cli.store {
        paths.roster_path = store;
    }

    // First run writes the defaults so there is a file to edit.
    let mut settings = config::load_settings(&paths.settings_path);
    if !paths.settings_path.exists() {
        config::save_settings_atomic(&paths.settings_path, &settings)?;
    }

    // Flags apply to this run only.
    if let Some(owner) = cli.owner {
        settings.owner_id = owner;
    }
    if let Some(seed) = cli.seed {
        settings.seed = seed;
    }
    if let Some(fps) = cli.fps {
        settings.fps_cap = fps;
    }
    if cli.no_color {
        settings.enable_color = false;
    }

    logging::init(&paths.log_path, &settings.log_filter)?;
    info!(
        roster = %paths.roster_path.display(),
        seed = settings.seed,
        "petplay starting"
    );

    app::run(settings, &paths)
}
