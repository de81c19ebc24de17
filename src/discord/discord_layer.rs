// Discord layer - commands and event handlers.

use crate::core::moderation::QrModerationService;
use crate::infra::scanner::HttpScanOracle;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "identity/about_panel.rs"]
pub mod about_panel;

#[path = "moderation/mod.rs"]
pub mod moderation;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared state handed to every command and event.
pub struct Data {
    pub moderation: Arc<QrModerationService<HttpScanOracle>>,
    pub started_at: DateTime<Utc>,
}
