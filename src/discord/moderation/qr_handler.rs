// Discord-specific QR handling - hands every guild message to the core pipeline.

use super::serenity_platform::SerenityPlatform;
use crate::core::identity::mentions_bot;
use crate::core::moderation::ModerationState;
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;

/// Latency of the shard that delivered the event, if it has heartbeated yet.
async fn shard_latency(
    framework: poise::FrameworkContext<'_, Data, Error>,
    shard_id: serenity::ShardId,
) -> Option<Duration> {
    let shard_manager = framework.shard_manager();
    let runners = shard_manager.runners.lock().await;
    runners.get(&shard_id).and_then(|runner| runner.latency)
}

/// Start moderating a freshly created message.
///
/// The pipeline can sit in its rescan window for minutes, so it runs on its
/// own task and this returns right away.
pub async fn handle_new_message(
    ctx: &serenity::Context,
    framework: poise::FrameworkContext<'_, Data, Error>,
    msg: &serenity::Message,
    data: &Data,
) {
    // Cheap pre-filter; the core repeats these checks on the snapshot.
    let bot_id = ctx.cache.current_user().id;
    if msg.guild_id.is_none() || msg.author.id == bot_id {
        return;
    }

    // Only the status panel shows latency.
    let latency = if mentions_bot(&msg.content, bot_id.get()) {
        shard_latency(framework, ctx.shard_id).await
    } else {
        None
    };
    let platform = Arc::new(SerenityPlatform::new(ctx, data.started_at, latency));
    let inspected = platform.inspect(msg);
    let moderation = Arc::clone(&data.moderation);

    tokio::spawn(async move {
        let message_id = inspected.message_id;
        match moderation.handle_message(platform, inspected).await {
            Some(report) if report.state == ModerationState::Bypassed => {
                tracing::trace!(message_id, "Author can manage messages, skipped scan");
            }
            Some(report) => {
                tracing::debug!(
                    message_id,
                    first_pass = ?report.first_pass,
                    rescan = ?report.rescan,
                    state = ?report.state,
                    "QR moderation finished"
                );
            }
            None => {}
        }
    });
}
