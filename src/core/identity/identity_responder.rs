// Replies to "who are you?" mentions with a short-lived status panel.
// Runs beside moderation and never affects its outcome.

use crate::core::moderation::{schedule_expiry, ModerationPlatform};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Post the status panel in `channel_id` and delete it after `ttl`.
pub fn spawn_identification<P: ModerationPlatform + 'static>(
    platform: Arc<P>,
    channel_id: u64,
    ttl: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let panel = platform.status_snapshot().await;

        match platform.send_status_panel(channel_id, &panel).await {
            Ok(panel_id) => {
                schedule_expiry(platform, channel_id, panel_id, ttl);
            }
            Err(e) => tracing::warn!(channel_id, "Failed to send status panel: {}", e),
        }
    })
}
