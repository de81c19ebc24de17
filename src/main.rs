// This is the entry point of the QR guard bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (the QR reading API)
// - `discord/` = Discord-specific adapters (commands, events)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::moderation::{ModerationConfig, QrModerationService};
use crate::discord::commands::presence;
use crate::discord::moderation::qr_handler;
use crate::discord::{Data, Error};
use crate::infra::scanner::qr_reader_client::DEFAULT_READ_ENDPOINT;
use crate::infra::scanner::HttpScanOracle;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Fallback token file for local runs, shaped like `{"TOKEN": "..."}`.
const LOCAL_ENV_FILE: &str = "env.json";

/// Event handler for non-command Discord events.
/// Every new message goes through QR moderation.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            qr_handler::handle_new_message(ctx, framework, new_message, data).await;
        }
        serenity::FullEvent::Ready { data_about_bot } => {
            tracing::info!("Logged in as {}", data_about_bot.user.tag());
        }
        _ => {}
    }

    Ok(())
}

/// Read the bot token: `DISCORD_TOKEN`, then `TOKEN`, then the local env file.
fn load_token(env_file: &Path) -> anyhow::Result<String> {
    if let Some(token) = ["DISCORD_TOKEN", "TOKEN"]
        .iter()
        .find_map(|key| std::env::var(key).ok())
    {
        return Ok(token);
    }

    token_from_file(env_file)
}

/// Read `TOKEN` out of a JSON env file.
fn token_from_file(env_file: &Path) -> anyhow::Result<String> {
    let raw = std::fs::read_to_string(env_file).with_context(|| {
        format!(
            "Missing DISCORD_TOKEN environment variable and no {} to fall back on",
            env_file.display()
        )
    })?;
    let values: HashMap<String, String> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON object of strings", env_file.display()))?;

    values
        .get("TOKEN")
        .cloned()
        .with_context(|| format!("{} has no TOKEN entry", env_file.display()))
}

/// Build the scan oracle from `QR_SCANNER_URL` / `QR_SCANNER_TIMEOUT_SECS`.
fn build_scanner() -> anyhow::Result<HttpScanOracle> {
    let endpoint =
        std::env::var("QR_SCANNER_URL").unwrap_or_else(|_| DEFAULT_READ_ENDPOINT.to_string());
    let timeout_secs = std::env::var("QR_SCANNER_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(15);

    HttpScanOracle::new(endpoint, Duration::from_secs(timeout_secs))
        .context("Failed to create QR scanner client")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let token = load_token(Path::new(LOCAL_ENV_FILE))?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================

    let scanner = build_scanner()?;
    let moderation = Arc::new(QrModerationService::new(
        scanner,
        ModerationConfig::default(),
    ));

    let data = Data {
        moderation,
        started_at: chrono::Utc::now(),
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGE_REACTIONS; // Rescan requests

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![discord::commands::about::about()],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("Bot is starting up...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!("Commands registered");
                presence::on_ready(ctx);
                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running bot")?;
    Ok(())
}
