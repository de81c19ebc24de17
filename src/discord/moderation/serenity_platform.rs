// serenity-backed implementation of the core `ModerationPlatform` port.
//
// Translates between Discord types and the plain snapshots the core works
// with. One instance is built per inbound message and moved into its task.

use crate::core::moderation::{
    AttachmentRef, EmbedRef, InspectedMessage, ModerationPlatform, PlatformError, ReactionEvent,
    StatusPanel,
};
use crate::discord::about_panel::build_about_embed;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;

pub struct SerenityPlatform {
    http: Arc<serenity::Http>,
    cache: Arc<serenity::Cache>,
    shard: serenity::ShardMessenger,
    bot_id: serenity::UserId,
    started_at: DateTime<Utc>,
    latency: Option<Duration>,
}

impl SerenityPlatform {
    pub fn new(
        ctx: &serenity::Context,
        started_at: DateTime<Utc>,
        latency: Option<Duration>,
    ) -> Self {
        Self {
            http: ctx.http.clone(),
            cache: ctx.cache.clone(),
            shard: ctx.shard.clone(),
            bot_id: ctx.cache.current_user().id,
            started_at,
            latency,
        }
    }

    pub fn inspect(&self, msg: &serenity::Message) -> InspectedMessage {
        inspect_message(msg, &self.cache)
    }
}

/// Snapshot a serenity message into the core's view of it.
pub fn inspect_message(msg: &serenity::Message, cache: &Arc<serenity::Cache>) -> InspectedMessage {
    let can_manage = msg
        .author_permissions(cache)
        .is_some_and(|p| p.manage_messages());

    InspectedMessage {
        message_id: msg.id.get(),
        channel_id: msg.channel_id.get(),
        guild_id: msg.guild_id.map(|g| g.get()),
        author_id: msg.author.id.get(),
        author_tag: msg.author.tag(),
        author_can_manage_messages: can_manage,
        attachments: msg
            .attachments
            .iter()
            .map(|a| AttachmentRef { url: a.url.clone() })
            .collect(),
        embeds: msg
            .embeds
            .iter()
            .map(|e| EmbedRef {
                // Link previews put the page in `url`; bare image embeds may only
                // carry the image itself.
                url: e
                    .url
                    .clone()
                    .or_else(|| e.image.as_ref().map(|i| i.url.clone()))
                    .or_else(|| e.thumbnail.as_ref().map(|t| t.url.clone())),
            })
            .collect(),
        content: msg.content.clone(),
    }
}

fn platform_error(err: serenity::Error) -> PlatformError {
    match &err {
        serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(resp))
            if resp.status_code.as_u16() == 403 =>
        {
            PlatformError::MissingPermission(resp.error.message.clone())
        }
        _ => PlatformError::Request(err.to_string()),
    }
}

#[async_trait]
impl ModerationPlatform for SerenityPlatform {
    fn bot_user_id(&self) -> u64 {
        self.bot_id.get()
    }

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), PlatformError> {
        serenity::ChannelId::new(channel_id)
            .delete_message(&self.http, serenity::MessageId::new(message_id))
            .await
            .map_err(platform_error)
    }

    async fn send_text(&self, channel_id: u64, content: &str) -> Result<u64, PlatformError> {
        serenity::ChannelId::new(channel_id)
            .say(&self.http, content)
            .await
            .map(|m| m.id.get())
            .map_err(platform_error)
    }

    async fn send_status_panel(
        &self,
        channel_id: u64,
        panel: &StatusPanel,
    ) -> Result<u64, PlatformError> {
        let avatar_url = self.cache.current_user().avatar_url();
        let embed = build_about_embed(panel, avatar_url);

        serenity::ChannelId::new(channel_id)
            .send_message(&self.http, serenity::CreateMessage::new().embed(embed))
            .await
            .map(|m| m.id.get())
            .map_err(platform_error)
    }

    async fn add_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &str,
    ) -> Result<(), PlatformError> {
        self.http
            .create_reaction(
                serenity::ChannelId::new(channel_id),
                serenity::MessageId::new(message_id),
                &serenity::ReactionType::Unicode(emoji.to_string()),
            )
            .await
            .map_err(platform_error)
    }

    async fn await_one_reaction(
        &self,
        message: &InspectedMessage,
        timeout: Duration,
    ) -> Option<ReactionEvent> {
        serenity::ReactionCollector::new(&self.shard)
            .message_id(serenity::MessageId::new(message.message_id))
            .timeout(timeout)
            .next()
            .await
            .map(|reaction| ReactionEvent {
                user_id: reaction.user_id.map(|u| u.get()),
                emoji: reaction.emoji.to_string(),
            })
    }

    async fn refresh_message(
        &self,
        message: &InspectedMessage,
    ) -> Result<InspectedMessage, PlatformError> {
        let fresh = self
            .http
            .get_message(
                serenity::ChannelId::new(message.channel_id),
                serenity::MessageId::new(message.message_id),
            )
            .await
            .map_err(platform_error)?;

        let mut inspected = inspect_message(&fresh, &self.cache);
        // Messages fetched over HTTP carry no guild or member data.
        inspected.guild_id = message.guild_id;
        inspected.author_can_manage_messages = message.author_can_manage_messages;
        Ok(inspected)
    }

    async fn status_snapshot(&self) -> StatusPanel {
        StatusPanel {
            bot_name: self.cache.current_user().name.clone(),
            uptime: Utc::now() - self.started_at,
            guild_count: self.cache.guild_count(),
            latency: self.latency,
        }
    }
}
