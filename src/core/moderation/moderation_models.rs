// QR moderation domain models - data structures for the scanning pipeline.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer converts serenity messages into these snapshots.

use std::time::Duration;

/// Verdict for a single scanned URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanVerdict {
    Clean,
    Flagged,
}

impl From<bool> for ScanVerdict {
    fn from(found_qr: bool) -> Self {
        if found_qr {
            ScanVerdict::Flagged
        } else {
            ScanVerdict::Clean
        }
    }
}

/// Result of one moderation pass over a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationOutcome {
    /// Author had Manage Messages - nothing was scanned
    Bypassed,
    /// Flagged content was found and removed
    Deleted,
    /// Media was scanned and nothing was flagged
    Clean,
    /// The message carried no attachments or embeds at all
    NotApplicable,
}

impl ModerationOutcome {
    pub fn is_deleted(self) -> bool {
        self == ModerationOutcome::Deleted
    }
}

/// Terminal state of a message after the whole pipeline ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationState {
    Bypassed,
    Deleted,
    /// Listening window closed without a reaction
    RescanTimedOut,
    /// Second pass found a QR code
    RescanDeleted,
    /// Second pass was clean and the verified marker was applied
    RescanVerified,
    /// Second pass was clean but there was nothing to mark as verified
    RescanUnverified,
}

/// What happened to a message, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModerationReport {
    pub first_pass: ModerationOutcome,
    pub rescan: Option<ModerationOutcome>,
    pub state: ModerationState,
}

/// A file uploaded with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub url: String,
}

/// A rich embed on a message. Link previews without a resolvable URL carry `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedRef {
    pub url: Option<String>,
}

/// Immutable snapshot of an inbound message at processing time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectedMessage {
    pub message_id: u64,
    pub channel_id: u64,
    /// `None` for direct messages
    pub guild_id: Option<u64>,
    pub author_id: u64,
    pub author_tag: String,
    /// Whether the author holds Manage Messages in this channel
    pub author_can_manage_messages: bool,
    pub attachments: Vec<AttachmentRef>,
    pub embeds: Vec<EmbedRef>,
    pub content: String,
}

impl InspectedMessage {
    /// True if there is anything a verified marker could vouch for.
    pub fn has_media(&self) -> bool {
        !self.attachments.is_empty() || !self.embeds.is_empty()
    }
}

/// A reaction event delivered while a rescan window is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionEvent {
    pub user_id: Option<u64>,
    pub emoji: String,
}

/// Numbers shown on the self-identification panel.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusPanel {
    pub bot_name: String,
    pub uptime: chrono::Duration,
    pub guild_count: usize,
    pub latency: Option<Duration>,
}

/// Tunables for the moderation pipeline.
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    /// How long a message listens for a rescan reaction (seconds)
    pub rescan_window_secs: u64,
    /// Lifetime of a deletion notice (seconds)
    pub notice_ttl_secs: u64,
    /// Lifetime of an identification panel (seconds)
    pub panel_ttl_secs: u64,
    /// Reaction applied after a clean manual rescan
    pub verified_marker: String,
    /// Posted when the bot cannot delete a flagged message
    pub missing_permission_text: String,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            rescan_window_secs: 300, // 5 minutes
            notice_ttl_secs: 10,
            panel_ttl_secs: 20,
            verified_marker: "✅".to_string(),
            missing_permission_text: "(Hey mods! I need perms to delete that!)".to_string(),
        }
    }
}

impl ModerationConfig {
    pub fn rescan_window(&self) -> Duration {
        Duration::from_secs(self.rescan_window_secs)
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_secs(self.notice_ttl_secs)
    }

    pub fn panel_ttl(&self) -> Duration {
        Duration::from_secs(self.panel_ttl_secs)
    }
}
