// Self-identification: the status panel posted when someone mentions the bot.

pub mod identity_responder;
pub mod status_panel;

pub use identity_responder::spawn_identification;
pub use status_panel::mentions_bot;
