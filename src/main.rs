#![allow(missing_docs)]

//! Bot entry point: configuration, logging, store, adapter wiring.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::Bot;
use tracing::{info, warn};

use anonsbot::channel::Channel;
use anonsbot::config::BotConfig;
use anonsbot::dispatch::Router;
use anonsbot::engine::Conversation;
use anonsbot::moderation::Moderation;
use anonsbot::store::EventStore;
use anonsbot::telegram::TelegramChannel;
use anonsbot::types::ChatRef;
use anonsbot::{health, logging, telegram};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = BotConfig::load().context("failed to load configuration")?;
    let _logging_guard = logging::init(Path::new("logs"), &config.log_level.0)?;

    info!("anonsbot starting");

    let token = config
        .telegram
        .bot_token
        .clone()
        .context("bot token is not configured (ANONSBOT_BOT_TOKEN)")?;

    let store = Arc::new(
        EventStore::open(Path::new(&config.store.database_path))
            .await
            .context("failed to open event store")?,
    );
    info!(path = %config.store.database_path, "event store opened");

    let bot = Bot::new(token);
    let channel: Arc<dyn Channel> = Arc::new(TelegramChannel::new(bot.clone()));

    let conversation = Conversation::new(
        Arc::clone(&store),
        Arc::clone(&channel),
        config.limits.clone(),
    );
    let moderation = Moderation::new(
        Arc::clone(&store),
        Arc::clone(&channel),
        ChatRef(config.telegram.moderation_chat_id),
        ChatRef(config.telegram.channel_id),
    );
    let router = Arc::new(Router::new(store, channel, conversation, moderation));

    // Liveness probe; shares nothing with the bot.
    let health_port = config.health.port;
    tokio::spawn(async move {
        if let Err(e) = health::serve(health_port).await {
            warn!(error = %e, "health server exited");
        }
    });

    telegram::run_bot(bot, router).await
}
