// QR moderation service - core business logic for the scanning pipeline.
//
// This service handles:
// - Permission bypass (Manage Messages skips everything)
// - Sequential URL scanning, first flagged item wins
// - Deleting flagged messages and posting a self-expiring notice
// - The manual rescan window opened for messages that passed
//
// NO Discord dependencies here - the platform is reached through a port.

use super::content_extractor::{extract, ScanPlan};
use super::moderation_models::{
    InspectedMessage, ModerationConfig, ModerationOutcome, ModerationReport, ModerationState,
    ReactionEvent, ScanVerdict, StatusPanel,
};
use super::notice::compose_notice;
use super::rescan::{RescanWindow, WindowClose};
use crate::core::identity::{mentions_bot, spawn_identification};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

// ============================================================================
// ERRORS
// ============================================================================

/// Failure while asking the oracle about a URL. Always degraded to Clean.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Scanner returned status {0}")]
    Status(u16),

    #[error("Could not decode scanner response: {0}")]
    Decode(String),
}

/// Failure of a chat-platform call (delete, send, react, fetch).
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Missing permission: {0}")]
    MissingPermission(String),

    #[error("Request failed: {0}")]
    Request(String),
}

// ============================================================================
// PORTS
// ============================================================================

/// Decides whether the image behind a URL contains a QR code.
#[async_trait]
pub trait ScanOracle: Send + Sync {
    async fn scan(&self, url: &str) -> Result<bool, ScanError>;
}

/// Everything the pipeline needs from the chat platform.
#[async_trait]
pub trait ModerationPlatform: Send + Sync {
    /// The bot's own user ID.
    fn bot_user_id(&self) -> u64;

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), PlatformError>;

    /// Post plain text. Returns the new message's ID.
    async fn send_text(&self, channel_id: u64, content: &str) -> Result<u64, PlatformError>;

    /// Post the self-identification panel. Returns the new message's ID.
    async fn send_status_panel(
        &self,
        channel_id: u64,
        panel: &StatusPanel,
    ) -> Result<u64, PlatformError>;

    async fn add_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &str,
    ) -> Result<(), PlatformError>;

    /// Wait for one reaction on `message`. `None` means the timeout elapsed.
    async fn await_one_reaction(
        &self,
        message: &InspectedMessage,
        timeout: Duration,
    ) -> Option<ReactionEvent>;

    /// Re-read a message so late link previews are visible to a rescan.
    async fn refresh_message(
        &self,
        message: &InspectedMessage,
    ) -> Result<InspectedMessage, PlatformError>;

    /// Current uptime, guild count and latency.
    async fn status_snapshot(&self) -> StatusPanel;
}

/// Delete a bot-authored message after `ttl`. Failures are swallowed.
pub fn schedule_expiry<P: ModerationPlatform + 'static>(
    platform: Arc<P>,
    channel_id: u64,
    message_id: u64,
    ttl: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(ttl).await;
        if let Err(e) = platform.delete_message(channel_id, message_id).await {
            tracing::debug!(channel_id, message_id, "Expired message already gone: {}", e);
        }
    })
}

/// DMs and the bot's own messages are never moderated.
pub fn should_ignore(message: &InspectedMessage, bot_id: u64) -> bool {
    message.guild_id.is_none() || message.author_id == bot_id
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// QR moderation service.
pub struct QrModerationService<O: ScanOracle> {
    oracle: O,
    config: ModerationConfig,
}

impl<O: ScanOracle> QrModerationService<O> {
    /// Create a new moderation service around the given oracle.
    pub fn new(oracle: O, config: ModerationConfig) -> Self {
        Self { oracle, config }
    }

    /// Run one moderation pass over a message.
    ///
    /// URLs are scanned one at a time in order; the first flagged URL deletes
    /// the message and stops the scan. An oracle failure counts as clean.
    pub async fn evaluate<P: ModerationPlatform + 'static>(
        &self,
        platform: &Arc<P>,
        message: &InspectedMessage,
    ) -> ModerationOutcome {
        if message.author_can_manage_messages {
            return ModerationOutcome::Bypassed;
        }

        let plan = extract(message);
        if plan == ScanPlan::NotApplicable {
            return ModerationOutcome::NotApplicable;
        }

        for url in plan.urls() {
            let verdict = match self.oracle.scan(url).await {
                Ok(found) => ScanVerdict::from(found),
                Err(e) => {
                    tracing::warn!(
                        message_id = message.message_id,
                        "QR scan failed for {}, treating as clean: {}",
                        url,
                        e
                    );
                    ScanVerdict::Clean
                }
            };

            if verdict == ScanVerdict::Flagged {
                self.remove_and_notify(platform, message).await;
                return ModerationOutcome::Deleted;
            }
        }

        ModerationOutcome::Clean
    }

    /// Delete a flagged message and post a notice that expires on its own.
    async fn remove_and_notify<P: ModerationPlatform + 'static>(
        &self,
        platform: &Arc<P>,
        message: &InspectedMessage,
    ) {
        let channel_id = message.channel_id;

        let removed = match platform
            .delete_message(channel_id, message.message_id)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(channel_id, "Failed to delete QR message: {}", e);
                false
            }
        };

        if !removed {
            if let Err(e) = platform
                .send_text(channel_id, &self.config.missing_permission_text)
                .await
            {
                tracing::debug!(channel_id, "Failed to ask for delete permission: {}", e);
            }
        }

        let notice = compose_notice(&mut rand::thread_rng(), message.author_id);
        match platform.send_text(channel_id, &notice).await {
            Ok(notice_id) => {
                schedule_expiry(
                    Arc::clone(platform),
                    channel_id,
                    notice_id,
                    self.config.notice_ttl(),
                );
            }
            Err(e) => tracing::warn!(channel_id, "Failed to send QR notice: {}", e),
        }

        if removed {
            tracing::info!(
                user_id = message.author_id,
                "Deleted a QR code from user: {}",
                message.author_tag
            );
        } else {
            tracing::info!(
                user_id = message.author_id,
                "Found a QR code from user {} but could not delete it",
                message.author_tag
            );
        }
    }

    /// Full pipeline for one inbound message.
    ///
    /// Returns `None` for messages that are ignored outright. Otherwise this
    /// may wait for the whole rescan window, so callers should spawn it.
    pub async fn handle_message<P: ModerationPlatform + 'static>(
        &self,
        platform: Arc<P>,
        message: InspectedMessage,
    ) -> Option<ModerationReport> {
        let bot_id = platform.bot_user_id();
        if should_ignore(&message, bot_id) {
            return None;
        }

        if mentions_bot(&message.content, bot_id) {
            spawn_identification(
                Arc::clone(&platform),
                message.channel_id,
                self.config.panel_ttl(),
            );
        }

        let first_pass = self.evaluate(&platform, &message).await;
        let (rescan, state) = match first_pass {
            ModerationOutcome::Bypassed => (None, ModerationState::Bypassed),
            ModerationOutcome::Deleted => (None, ModerationState::Deleted),
            ModerationOutcome::Clean | ModerationOutcome::NotApplicable => {
                self.listen_for_rescan(&platform, message, bot_id).await
            }
        };

        Some(ModerationReport {
            first_pass,
            rescan,
            state,
        })
    }

    /// Open the rescan window and run the second pass if someone reacts.
    async fn listen_for_rescan<P: ModerationPlatform + 'static>(
        &self,
        platform: &Arc<P>,
        message: InspectedMessage,
        bot_id: u64,
    ) -> (Option<ModerationOutcome>, ModerationState) {
        let window = RescanWindow::open(message, self.config.rescan_window());
        tracing::debug!(
            message_id = window.message().message_id,
            "Listening for rescan reactions"
        );

        let (snapshot, event) = match window.wait(platform.as_ref(), bot_id).await {
            WindowClose::Triggered { message, event } => (message, event),
            WindowClose::TimedOut => return (None, ModerationState::RescanTimedOut),
        };

        tracing::debug!(
            message_id = snapshot.message_id,
            emoji = %event.emoji,
            "Rescan requested"
        );

        let current = match platform.refresh_message(&snapshot).await {
            Ok(fresh) => fresh,
            Err(e) => {
                tracing::debug!(
                    message_id = snapshot.message_id,
                    "Could not refresh message, rescanning snapshot: {}",
                    e
                );
                snapshot
            }
        };

        let outcome = self.evaluate(platform, &current).await;
        if outcome.is_deleted() {
            return (Some(outcome), ModerationState::RescanDeleted);
        }

        if !current.has_media() {
            return (Some(outcome), ModerationState::RescanUnverified);
        }

        if let Err(e) = platform
            .add_reaction(
                current.channel_id,
                current.message_id,
                &self.config.verified_marker,
            )
            .await
        {
            tracing::warn!(
                message_id = current.message_id,
                "Failed to add verified marker: {}",
                e
            );
        }

        (Some(outcome), ModerationState::RescanVerified)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::moderation_models::{AttachmentRef, EmbedRef};
    use dashmap::{DashMap, DashSet};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    const BOT_ID: u64 = 999;
    const CHANNEL_ID: u64 = 10;
    const MESSAGE_ID: u64 = 500;

    /// Oracle answering from a fixed table. Unknown URLs are clean.
    struct MockOracle {
        verdicts: HashMap<String, Result<bool, ()>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockOracle {
        fn new(verdicts: &[(&str, Result<bool, ()>)]) -> Self {
            Self {
                verdicts: verdicts
                    .iter()
                    .map(|(url, v)| (url.to_string(), *v))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ScanOracle for MockOracle {
        async fn scan(&self, url: &str) -> Result<bool, ScanError> {
            self.calls.lock().unwrap().push(url.to_string());
            match self.verdicts.get(url) {
                Some(Ok(found)) => Ok(*found),
                Some(Err(())) => Err(ScanError::Http("connection reset".to_string())),
                None => Ok(false),
            }
        }
    }

    /// In-memory platform recording every side effect.
    struct MockPlatform {
        next_id: AtomicU64,
        deleted: DashSet<u64>,
        delete_attempts: DashMap<u64, u32>,
        sent: DashMap<u64, String>,
        panels: DashSet<u64>,
        reactions: DashMap<u64, Vec<String>>,
        delete_fails: bool,
        expiry_delete_fails: bool,
        send_fails: bool,
        react_fails: bool,
        reaction_after: Option<Duration>,
        reaction_user: Option<u64>,
        refreshed: Option<InspectedMessage>,
    }

    impl MockPlatform {
        fn new() -> Self {
            Self {
                next_id: AtomicU64::new(1000),
                deleted: DashSet::new(),
                delete_attempts: DashMap::new(),
                sent: DashMap::new(),
                panels: DashSet::new(),
                reactions: DashMap::new(),
                delete_fails: false,
                expiry_delete_fails: false,
                send_fails: false,
                react_fails: false,
                reaction_after: None,
                reaction_user: Some(7),
                refreshed: None,
            }
        }

        fn sent_texts(&self) -> Vec<String> {
            self.sent.iter().map(|e| e.value().clone()).collect()
        }

        fn reactions_on(&self, message_id: u64) -> Vec<String> {
            self.reactions
                .get(&message_id)
                .map(|r| r.clone())
                .unwrap_or_default()
        }

        fn attempts_on(&self, message_id: u64) -> u32 {
            self.delete_attempts
                .get(&message_id)
                .map(|n| *n)
                .unwrap_or(0)
        }
    }

    #[async_trait]
    impl ModerationPlatform for MockPlatform {
        fn bot_user_id(&self) -> u64 {
            BOT_ID
        }

        async fn delete_message(
            &self,
            _channel_id: u64,
            message_id: u64,
        ) -> Result<(), PlatformError> {
            *self.delete_attempts.entry(message_id).or_insert(0) += 1;
            if self.delete_fails && message_id == MESSAGE_ID {
                return Err(PlatformError::MissingPermission(
                    "MANAGE_MESSAGES".to_string(),
                ));
            }
            if self.expiry_delete_fails && message_id != MESSAGE_ID {
                return Err(PlatformError::Request("Unknown Message".to_string()));
            }
            self.deleted.insert(message_id);
            Ok(())
        }

        async fn send_text(&self, _channel_id: u64, content: &str) -> Result<u64, PlatformError> {
            if self.send_fails {
                return Err(PlatformError::MissingPermission("SEND_MESSAGES".to_string()));
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.sent.insert(id, content.to_string());
            Ok(id)
        }

        async fn send_status_panel(
            &self,
            _channel_id: u64,
            _panel: &StatusPanel,
        ) -> Result<u64, PlatformError> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.panels.insert(id);
            Ok(id)
        }

        async fn add_reaction(
            &self,
            _channel_id: u64,
            message_id: u64,
            emoji: &str,
        ) -> Result<(), PlatformError> {
            if self.react_fails {
                return Err(PlatformError::MissingPermission("ADD_REACTIONS".to_string()));
            }
            self.reactions
                .entry(message_id)
                .or_insert_with(Vec::new)
                .push(emoji.to_string());
            Ok(())
        }

        async fn await_one_reaction(
            &self,
            _message: &InspectedMessage,
            timeout: Duration,
        ) -> Option<ReactionEvent> {
            match self.reaction_after {
                Some(delay) if delay < timeout => {
                    tokio::time::sleep(delay).await;
                    Some(ReactionEvent {
                        user_id: self.reaction_user,
                        emoji: "👀".to_string(),
                    })
                }
                _ => {
                    tokio::time::sleep(timeout).await;
                    None
                }
            }
        }

        async fn refresh_message(
            &self,
            _message: &InspectedMessage,
        ) -> Result<InspectedMessage, PlatformError> {
            self.refreshed
                .clone()
                .ok_or_else(|| PlatformError::Request("Unknown Message".to_string()))
        }

        async fn status_snapshot(&self) -> StatusPanel {
            StatusPanel {
                bot_name: "QR Guard".to_string(),
                uptime: chrono::Duration::seconds(5),
                guild_count: 1,
                latency: None,
            }
        }
    }

    fn message_with(attachments: &[&str], embeds: &[Option<&str>]) -> InspectedMessage {
        InspectedMessage {
            message_id: MESSAGE_ID,
            channel_id: CHANNEL_ID,
            guild_id: Some(1),
            author_id: 42,
            author_tag: "sneaky#0001".to_string(),
            author_can_manage_messages: false,
            attachments: attachments
                .iter()
                .map(|u| AttachmentRef { url: u.to_string() })
                .collect(),
            embeds: embeds
                .iter()
                .map(|u| EmbedRef {
                    url: u.map(str::to_string),
                })
                .collect(),
            content: "look at this".to_string(),
        }
    }

    fn service(oracle: MockOracle) -> QrModerationService<MockOracle> {
        QrModerationService::new(oracle, ModerationConfig::default())
    }

    #[tokio::test]
    async fn test_bypass_never_scans_or_deletes() {
        let svc = service(MockOracle::new(&[("qr.png", Ok(true))]));
        let platform = Arc::new(MockPlatform::new());
        let mut msg = message_with(&["qr.png"], &[]);
        msg.author_can_manage_messages = true;

        let report = svc.handle_message(Arc::clone(&platform), msg).await.unwrap();

        assert_eq!(report.state, ModerationState::Bypassed);
        assert!(svc.oracle.calls().is_empty());
        assert!(platform.deleted.is_empty());
    }

    #[tokio::test]
    async fn test_only_attachments_scanned_when_both_present() {
        let svc = service(MockOracle::new(&[("https://qr.link", Ok(true))]));
        let platform = Arc::new(MockPlatform::new());
        let msg = message_with(&["a.png", "b.png"], &[Some("https://qr.link")]);

        let outcome = svc.evaluate(&platform, &msg).await;

        assert_eq!(outcome, ModerationOutcome::Clean);
        assert_eq!(svc.oracle.calls(), vec!["a.png", "b.png"]);
    }

    #[tokio::test]
    async fn test_first_flagged_url_stops_scan() {
        let svc = service(MockOracle::new(&[("2.png", Ok(true)), ("3.png", Ok(true))]));
        let platform = Arc::new(MockPlatform::new());
        let msg = message_with(&["1.png", "2.png", "3.png", "4.png"], &[]);

        let outcome = svc.evaluate(&platform, &msg).await;

        assert_eq!(outcome, ModerationOutcome::Deleted);
        assert_eq!(svc.oracle.calls(), vec!["1.png", "2.png"]);
        assert!(platform.deleted.contains(&MESSAGE_ID));
    }

    #[tokio::test]
    async fn test_embed_urls_scanned_and_missing_urls_skipped() {
        let svc = service(MockOracle::new(&[("https://qr.link", Ok(true))]));
        let platform = Arc::new(MockPlatform::new());
        let msg = message_with(&[], &[None, Some("https://qr.link")]);

        let outcome = svc.evaluate(&platform, &msg).await;

        assert_eq!(outcome, ModerationOutcome::Deleted);
        assert_eq!(svc.oracle.calls(), vec!["https://qr.link"]);
    }

    #[tokio::test]
    async fn test_oracle_failures_degrade_to_clean() {
        let svc = service(MockOracle::new(&[("a.png", Err(())), ("b.png", Err(()))]));
        let platform = Arc::new(MockPlatform::new());
        let msg = message_with(&["a.png", "b.png"], &[]);

        let outcome = svc.evaluate(&platform, &msg).await;

        assert_eq!(outcome, ModerationOutcome::Clean);
        assert_eq!(svc.oracle.calls().len(), 2);
        assert!(platform.deleted.is_empty());
    }

    #[tokio::test]
    async fn test_no_media_is_not_applicable() {
        let svc = service(MockOracle::new(&[]));
        let platform = Arc::new(MockPlatform::new());
        let msg = message_with(&[], &[]);

        let outcome = svc.evaluate(&platform, &msg).await;

        assert_eq!(outcome, ModerationOutcome::NotApplicable);
        assert!(svc.oracle.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flagged_message_deleted_with_expiring_notice() {
        let svc = service(MockOracle::new(&[("qr.png", Ok(true))]));
        let platform = Arc::new(MockPlatform::new());
        let msg = message_with(&["qr.png"], &[]);

        let report = svc.handle_message(Arc::clone(&platform), msg).await.unwrap();

        assert_eq!(report.state, ModerationState::Deleted);
        assert!(platform.deleted.contains(&MESSAGE_ID));
        let notices = platform.sent_texts();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].contains("<@42>"));

        let notice_id = *platform.sent.iter().next().unwrap().key();
        tokio::time::sleep(Duration::from_secs(9)).await;
        assert!(!platform.deleted.contains(&notice_id));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(platform.deleted.contains(&notice_id));

        assert!(platform.reactions.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_failure_asks_mods_for_permission() {
        let svc = service(MockOracle::new(&[("qr.png", Ok(true))]));
        let mut platform = MockPlatform::new();
        platform.delete_fails = true;
        let platform = Arc::new(platform);
        let msg = message_with(&["qr.png"], &[]);

        let outcome = svc.evaluate(&platform, &msg).await;

        assert_eq!(outcome, ModerationOutcome::Deleted);
        let texts = platform.sent_texts();
        assert_eq!(texts.len(), 2);
        assert!(texts
            .iter()
            .any(|t| t == "(Hey mods! I need perms to delete that!)"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaction_rescan_marks_clean_message_verified() {
        let svc = service(MockOracle::new(&[]));
        let mut platform = MockPlatform::new();
        platform.reaction_after = Some(Duration::from_secs(50));
        let platform = Arc::new(platform);
        let msg = message_with(&["cat.png"], &[]);

        let report = svc.handle_message(Arc::clone(&platform), msg).await.unwrap();

        assert_eq!(report.first_pass, ModerationOutcome::Clean);
        assert_eq!(report.rescan, Some(ModerationOutcome::Clean));
        assert_eq!(report.state, ModerationState::RescanVerified);
        assert_eq!(platform.reactions_on(MESSAGE_ID), vec!["✅"]);
        assert_eq!(svc.oracle.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_times_out_without_reaction() {
        let svc = service(MockOracle::new(&[]));
        let platform = Arc::new(MockPlatform::new());
        let msg = message_with(&["cat.png"], &[]);

        let started = tokio::time::Instant::now();
        let report = svc.handle_message(Arc::clone(&platform), msg).await.unwrap();

        assert_eq!(report.state, ModerationState::RescanTimedOut);
        assert_eq!(report.rescan, None);
        assert!(started.elapsed() >= Duration::from_secs(300));
        assert!(platform.reactions.is_empty());
        assert_eq!(svc.oracle.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bot_reactions_do_not_trigger_rescan() {
        let svc = service(MockOracle::new(&[]));
        let mut platform = MockPlatform::new();
        platform.reaction_after = Some(Duration::from_secs(120));
        platform.reaction_user = Some(BOT_ID);
        let platform = Arc::new(platform);
        let msg = message_with(&["cat.png"], &[]);

        let report = svc.handle_message(Arc::clone(&platform), msg).await.unwrap();

        assert_eq!(report.state, ModerationState::RescanTimedOut);
        assert_eq!(svc.oracle.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rescan_sees_late_embed_and_deletes() {
        let svc = service(MockOracle::new(&[("https://qr.link", Ok(true))]));
        let mut platform = MockPlatform::new();
        platform.reaction_after = Some(Duration::from_secs(5));
        platform.refreshed = Some(message_with(&[], &[Some("https://qr.link")]));
        let platform = Arc::new(platform);
        let msg = message_with(&[], &[]);

        let report = svc.handle_message(Arc::clone(&platform), msg).await.unwrap();

        assert_eq!(report.first_pass, ModerationOutcome::NotApplicable);
        assert_eq!(report.state, ModerationState::RescanDeleted);
        assert!(platform.deleted.contains(&MESSAGE_ID));
        assert!(platform.reactions.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rescan_without_media_adds_no_marker() {
        let svc = service(MockOracle::new(&[]));
        let mut platform = MockPlatform::new();
        platform.reaction_after = Some(Duration::from_secs(5));
        let platform = Arc::new(platform);
        let msg = message_with(&[], &[]);

        let report = svc.handle_message(Arc::clone(&platform), msg).await.unwrap();

        assert_eq!(report.state, ModerationState::RescanUnverified);
        assert!(platform.reactions.is_empty());
        assert!(svc.oracle.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mention_posts_panel_alongside_deletion() {
        let svc = service(MockOracle::new(&[("qr.png", Ok(true))]));
        let platform = Arc::new(MockPlatform::new());
        let mut msg = message_with(&["qr.png"], &[]);
        msg.content = format!("hey <@{}> check this out", BOT_ID);

        let report = svc.handle_message(Arc::clone(&platform), msg).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(report.state, ModerationState::Deleted);
        assert!(platform.deleted.contains(&MESSAGE_ID));
        assert_eq!(platform.panels.len(), 1);
        assert_eq!(platform.sent.len(), 1);
        let panel_id = *platform.panels.iter().next().unwrap();
        let notice_id = *platform.sent.iter().next().unwrap().key();

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(platform.deleted.contains(&notice_id));
        assert!(!platform.deleted.contains(&panel_id));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(platform.deleted.contains(&panel_id));
    }

    #[tokio::test]
    async fn test_dms_and_own_messages_ignored() {
        let svc = service(MockOracle::new(&[("qr.png", Ok(true))]));
        let platform = Arc::new(MockPlatform::new());

        let mut dm = message_with(&["qr.png"], &[]);
        dm.guild_id = None;
        assert!(svc.handle_message(Arc::clone(&platform), dm).await.is_none());

        let mut own = message_with(&["qr.png"], &[]);
        own.author_id = BOT_ID;
        assert!(svc.handle_message(Arc::clone(&platform), own).await.is_none());

        assert!(svc.oracle.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_notice_and_fallback_sends_are_swallowed() {
        let svc = service(MockOracle::new(&[("qr.png", Ok(true))]));
        let mut platform = MockPlatform::new();
        platform.delete_fails = true;
        platform.send_fails = true;
        let platform = Arc::new(platform);
        let msg = message_with(&["qr.png"], &[]);

        let report = svc.handle_message(Arc::clone(&platform), msg).await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(report.state, ModerationState::Deleted);
        assert!(platform.sent.is_empty());
        // Only the one failed attempt on the flagged message; no notice to expire.
        assert_eq!(platform.attempts_on(MESSAGE_ID), 1);
        assert_eq!(platform.delete_attempts.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_delete_failure_attempted_once() {
        let svc = service(MockOracle::new(&[("qr.png", Ok(true))]));
        let mut platform = MockPlatform::new();
        platform.expiry_delete_fails = true;
        let platform = Arc::new(platform);
        let mut msg = message_with(&["qr.png"], &[]);
        msg.content = format!("<@{}>", BOT_ID);

        let report = svc.handle_message(Arc::clone(&platform), msg).await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(report.state, ModerationState::Deleted);
        let notice_id = *platform.sent.iter().next().unwrap().key();
        let panel_id = *platform.panels.iter().next().unwrap();
        assert_eq!(platform.attempts_on(notice_id), 1);
        assert_eq!(platform.attempts_on(panel_id), 1);
        assert!(!platform.deleted.contains(&notice_id));
        assert!(!platform.deleted.contains(&panel_id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_verified_marker_still_reports_verified() {
        let svc = service(MockOracle::new(&[]));
        let mut platform = MockPlatform::new();
        platform.reaction_after = Some(Duration::from_secs(50));
        platform.react_fails = true;
        let platform = Arc::new(platform);
        let msg = message_with(&["cat.png"], &[]);

        let report = svc.handle_message(Arc::clone(&platform), msg).await.unwrap();

        assert_eq!(report.state, ModerationState::RescanVerified);
        assert!(platform.reactions.is_empty());
        assert!(platform.deleted.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_oracle_error_then_hit_deletes_on_hit() {
        let svc = service(MockOracle::new(&[
            ("broken.png", Err(())),
            ("qr.png", Ok(true)),
            ("after.png", Ok(true)),
        ]));
        let platform = Arc::new(MockPlatform::new());
        let msg = message_with(&["broken.png", "qr.png", "after.png"], &[]);

        let outcome = svc.evaluate(&platform, &msg).await;

        assert_eq!(outcome, ModerationOutcome::Deleted);
        assert_eq!(svc.oracle.calls(), vec!["broken.png", "qr.png"]);
        assert_eq!(platform.attempts_on(MESSAGE_ID), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oracle_error_alone_never_flags() {
        let svc = service(MockOracle::new(&[("broken.png", Err(()))]));
        let platform = Arc::new(MockPlatform::new());
        let msg = message_with(&["broken.png"], &[]);

        let outcome = svc.evaluate(&platform, &msg).await;

        assert_eq!(outcome, ModerationOutcome::Clean);
        assert_eq!(platform.attempts_on(MESSAGE_ID), 0);
        assert!(platform.sent.is_empty());
    }
}
