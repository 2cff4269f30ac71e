//! # Tilebound Main Entry Point
//!
//! Parses the command line, loads the save and start room, sets up macroquad
//! rendering and runs the scene loop.

use clap::Parser;
use log::{error, info};
use macroquad::prelude::*;
use std::path::PathBuf;
use tilebound::{
    GameConfig, GameState, InputHandler, MacroquadDisplay, SceneManager, TileboundResult,
};

/// Command line arguments for Tilebound.
#[derive(Parser, Debug)]
#[command(name = "tilebound")]
#[command(about = "A top-down tile-based action/adventure game with persistent rooms")]
#[command(version)]
struct Args {
    /// JSON settings file; command line flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding rooms.json
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Directory room files are resolved against
    #[arg(long)]
    rooms_dir: Option<PathBuf>,

    /// Directory textures are loaded from
    #[arg(long)]
    assets_dir: Option<PathBuf>,

    /// Grid cell edge length in pixels
    #[arg(long)]
    tile_size: Option<f32>,

    /// Random seed for enemy wandering
    #[arg(short, long)]
    seed: Option<u64>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    /// Builds the session config from the settings file and flags.
    fn game_config(&self) -> TileboundResult<GameConfig> {
        let mut config = match &self.config {
            Some(path) => GameConfig::load_from_file(path)?,
            None => GameConfig::default(),
        };
        if let Some(dir) = &self.save_dir {
            config.save_dir = dir.clone();
        }
        if let Some(dir) = &self.rooms_dir {
            config.rooms_dir = dir.clone();
        }
        if let Some(dir) = &self.assets_dir {
            config.assets_dir = dir.clone();
        }
        if let Some(tile_size) = self.tile_size {
            config.tile_size = tile_size;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        Ok(config)
    }
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Tilebound".to_string(),
        window_width: 1280,
        window_height: 720,
        high_dpi: true,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    info!("Starting Tilebound v{}", tilebound::VERSION);
    if let Err(err) = run_game(&args).await {
        error!("{}", err);
        std::process::exit(1);
    }
}

/// Initializes env_logger, letting `RUST_LOG` override the flag.
fn initialize_logging(log_level: &str) {
    env_logger::Builder::new()
        .parse_filters(log_level)
        .parse_default_env()
        .format_target(false)
        .init();
}

async fn run_game(args: &Args) -> TileboundResult<()> {
    let config = args.game_config()?;
    info!(
        "Loading save from {} and rooms from {}",
        config.save_dir.display(),
        config.rooms_dir.display()
    );

    let game_state = GameState::open(config)?;
    let images = game_state.world.catalog().image_refs();
    let display = MacroquadDisplay::new(
        &game_state.config().assets_dir,
        &images,
        game_state.config().tile_size,
    )
    .await?;

    let mut scenes = SceneManager::new(game_state, display, InputHandler::new());
    scenes.run().await?;
    info!("Game loop ended");
    Ok(())
}
