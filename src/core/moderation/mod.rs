// Core moderation module - QR code detection pipeline.
// Pure domain logic; the Discord layer supplies the platform port.

pub mod content_extractor;
pub mod moderation_models;
pub mod moderation_service;
pub mod notice;
pub mod rescan;

pub use moderation_models::*;
pub use moderation_service::*;
