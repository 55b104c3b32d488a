use anyhow::Result;
use log::{info, warn};
use std::env;
use std::path::Path;

use chatsieve::classifier::emotes::{load_channel_emotes, EmoteCatalog};
use chatsieve::config::ConfigManager;
use chatsieve::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables and initialize logging
    dotenv::dotenv().ok();
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting chatsieve v{}", env!("CARGO_PKG_VERSION"));

    let config_dir = env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let manager = ConfigManager::new(Path::new(&config_dir));
    let rules_config = manager.load_rules().await?;
    let vocabulary = manager.load_vocabulary().await?;

    let twitch_config = TwitchConfig::from_env()?;

    // The viewer identity allow-lists @-mentions of themselves and keeps
    // their own messages out of the spam stream
    let viewer = env::var("VIEWER_USERNAME").unwrap_or_default();
    if viewer.is_empty() {
        warn!("VIEWER_USERNAME not set - mention allow-listing covers the channel only");
    }

    // Emote catalog for the first configured channel; a failed load degrades
    // to an empty catalog so emote tokens fall through as plain text
    let catalog = match load_channel_emotes(&twitch_config.channels[0]).await {
        Ok(catalog) => catalog,
        Err(e) => {
            warn!("Failed to load emote catalog: {}", e);
            EmoteCatalog::new()
        }
    };

    let mut splitter = ChatSplitter::new(
        viewer,
        vocabulary,
        rules_config.bot_names.clone(),
        rules_config.toggles(),
        catalog,
    );
    splitter
        .add_connection(Box::new(TwitchConnection::new(twitch_config)))
        .await;
    splitter.start().await?;

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C, shutting down...");
    splitter.shutdown().await?;
    Ok(())
}
