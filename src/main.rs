use anyhow::{Context, Result};
use signage_player::cache::AssetCache;
use signage_player::fetch::{Fetcher, HttpProber};
use signage_player::kiosk::{FullscreenController, LoggingButton};
use signage_player::player::Player;
use signage_player::playlist::Playlist;
use signage_player::settings::AppConfig;
use signage_player::surface::HeadlessSurface;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .context("Invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();
    tracing::debug!("Loaded configuration: {:?}", config);

    let playlist = Playlist::load(&config.playlist)?;

    let fetcher = Fetcher::new(config.base_url.as_deref(), config.probe_timeout())?;
    let cache = Arc::new(AssetCache::new(&config.cache_dir)?);
    let surface = HeadlessSurface::new(fetcher.clone(), cache);
    let prober = Arc::new(HttpProber::new(fetcher));

    // No pointer on a headless host; the sender only keeps the button alive.
    let (_button_tx, button_rx) = mpsc::unbounded_channel();
    let controller = FullscreenController::new(
        LoggingButton,
        playlist.meta.show_fullscreen_button,
        config.kiosk.clone(),
        button_rx,
    );
    tokio::spawn(controller.run());

    let (player, handle) = Player::new(playlist, surface, prober);
    let task = tokio::spawn(player.run());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received in state {:?}", handle.state());
    handle.stop();
    task.await.context("Player task failed")?;

    Ok(())
}
