use crate::core::moderation::StatusPanel;
use crate::discord::about_panel::build_about_embed;
use crate::discord::{Context, Error};

/// Show what this bot does plus uptime, server count and ping.
#[poise::command(slash_command, prefix_command)]
pub async fn about(ctx: Context<'_>) -> Result<(), Error> {
    let (bot_name, avatar_url, guild_count) = {
        let cache = ctx.cache();
        let me = cache.current_user();
        (me.name.clone(), me.avatar_url(), cache.guild_count())
    };

    let panel = StatusPanel {
        bot_name,
        uptime: chrono::Utc::now() - ctx.data().started_at,
        guild_count,
        latency: Some(ctx.ping().await),
    };

    ctx.send(poise::CreateReply::default().embed(build_about_embed(&panel, avatar_url)))
        .await?;
    Ok(())
}
