mod config;
mod discord_log;
mod relocator;

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use serenity::Client;
use serenity::all::{Context, EventHandler, GatewayIntents, Message, Ready};
use serenity::http::Http;
use tracing::{debug, error, info, warn};
use tracing_subscriber::prelude::*;

use config::Config;
use relocator::{DiscordClient, Outcome, RelocatorConfig, SupportRelocator, to_trigger_event};

/// Serenity event handler that hands every message to the relocator.
struct Handler {
    config: RelocatorConfig,
    /// Built once the bot's own user id is known.
    relocator: OnceLock<Arc<SupportRelocator>>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Connected as {} ({})", ready.user.name, ready.user.id);
        let api = Arc::new(DiscordClient::new(ctx.http.clone()));
        let relocator = SupportRelocator::new(self.config.clone(), api, ready.user.id.get());
        if self.relocator.set(Arc::new(relocator)).is_err() {
            debug!("Gateway resumed, keeping existing relocator");
        }
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        let Some(relocator) = self.relocator.get().cloned() else {
            warn!("Message {} arrived before ready, dropping", msg.id);
            return;
        };
        let event = to_trigger_event(&msg);

        tokio::spawn(async move {
            match relocator.handle_message(event).await {
                Outcome::Relocated(r) => info!(
                    "✅ Moved {} message(s) into \"{}\" (thread {}, {} chars, {} attachments, {} skipped)",
                    r.moved_message_ids.len(),
                    r.title,
                    r.thread_id,
                    r.characters,
                    r.attachments,
                    r.skipped_attachments
                ),
                Outcome::Failed(e) => debug!("Relocation failed: {e}"),
                Outcome::Rejected | Outcome::SelfReference | Outcome::Ignored => {}
            }
        });
    }
}

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "postmover.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("postmover.log"))
        .expect("Failed to open log file");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    let registry = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        );

    if let Some(ops_channel_id) = config.ops_channel_id {
        let http = Arc::new(Http::new(&config.discord_bot_token));
        let discord_layer = discord_log::DiscordLogLayer::new(http, ops_channel_id);
        registry.with(discord_layer).init();
    } else {
        registry.init();
    }

    info!("🚀 Starting postmover...");
    info!("Loaded config from {config_path}");
    info!(
        "Watching channel {} -> forum {} (role {}, log {})",
        config.origin_channel_id,
        config.support_forum_id,
        config.authorized_role_id,
        config.log_channel_id
    );

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;
    let handler = Handler {
        config: config.relocator_config(),
        relocator: OnceLock::new(),
    };

    let mut client = match Client::builder(&config.discord_bot_token, intents)
        .event_handler(handler)
        .await
    {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create Discord client: {e}");
            std::process::exit(1);
        }
    };

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down");
            shard_manager.shutdown_all().await;
        }
    });

    if let Err(e) = client.start().await {
        error!("Discord client error: {e}");
    }
}
