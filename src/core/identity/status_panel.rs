// Self-identification helpers.
//
// The Discord layer turns a `StatusPanel` into an embed; everything here is
// plain formatting so it can be tested without a gateway connection.

use crate::core::moderation::StatusPanel;

/// Whether a message body references the bot (raw ID or `<@id>` mention).
pub fn mentions_bot(content: &str, bot_id: u64) -> bool {
    content.contains(&bot_id.to_string())
}

/// Format an uptime like `1 days 2 hours 3 minutes 4 seconds`.
pub fn format_uptime(uptime: chrono::Duration) -> String {
    let total = uptime.num_seconds().max(0);
    let seconds = total % 60;
    let minutes = (total / 60) % 60;
    let hours = (total / 3600) % 24;
    let days = total / 86400;

    format!(
        "{} days {} hours {} minutes {} seconds",
        days, hours, minutes, seconds
    )
}

/// `1 server`, `3 servers`.
pub fn server_label(count: usize) -> String {
    if count == 1 {
        format!("{} server", count)
    } else {
        format!("{} servers", count)
    }
}

impl StatusPanel {
    /// Body of the "Statistics" field.
    pub fn statistics_text(&self) -> String {
        let ping = match self.latency {
            Some(latency) => format!("{}ms", latency.as_millis()),
            None => "unknown".to_string(),
        };

        format!(
            "Uptime {}\nProtecting {}\nPing: {}",
            format_uptime(self.uptime),
            server_label(self.guild_count),
            ping
        )
    }
}
