// A single-use listening window for manual rescans.
//
// Each message that survives the first pass gets one of these, owned by the
// task handling that message. Waiting consumes the window, so a message can
// never be re-triggered through the same handle.

use super::moderation_models::{InspectedMessage, ReactionEvent};
use super::moderation_service::ModerationPlatform;
use std::time::Duration;
use tokio::time::Instant;

/// How a rescan window closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowClose {
    /// Someone reacted before the deadline
    Triggered {
        message: InspectedMessage,
        event: ReactionEvent,
    },
    /// Deadline passed with no qualifying reaction
    TimedOut,
}

#[derive(Debug)]
pub struct RescanWindow {
    message: InspectedMessage,
    deadline: Instant,
}

impl RescanWindow {
    pub fn open(message: InspectedMessage, duration: Duration) -> Self {
        Self {
            message,
            deadline: Instant::now() + duration,
        }
    }

    pub fn message(&self) -> &InspectedMessage {
        &self.message
    }

    /// Wait for the first reaction not added by `bot_id`.
    pub async fn wait<P: ModerationPlatform + ?Sized>(
        self,
        platform: &P,
        bot_id: u64,
    ) -> WindowClose {
        loop {
            let remaining = self.deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return WindowClose::TimedOut;
            }

            match platform.await_one_reaction(&self.message, remaining).await {
                Some(event) if event.user_id == Some(bot_id) => continue,
                Some(event) => {
                    return WindowClose::Triggered {
                        message: self.message,
                        event,
                    }
                }
                None => return WindowClose::TimedOut,
            }
        }
    }
}
