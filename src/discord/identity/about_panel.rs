// Embed shown when someone tags the bot or runs `/about`.

use crate::core::moderation::StatusPanel;
use poise::serenity_prelude as serenity;

pub fn build_about_embed(panel: &StatusPanel, avatar_url: Option<String>) -> serenity::CreateEmbed {
    let mut author = serenity::CreateEmbedAuthor::new(&panel.bot_name);
    let mut embed = serenity::CreateEmbed::new()
        .title(format!("About {}", panel.bot_name))
        .color(0x5865F2) // Blurple
        .description(
            "I find QR codes in messages and delete them! You must give me the \
             __Manage Messages__ permission so that I can do my job most effectively.",
        )
        .timestamp(serenity::Timestamp::now())
        .field("Statistics", panel.statistics_text(), false);

    if let Some(avatar_url) = avatar_url {
        author = author.icon_url(&avatar_url);
        embed = embed.thumbnail(avatar_url);
    }

    embed.author(author)
}
