// Discord side of QR moderation: the platform adapter and the message hook.

pub mod qr_handler;
pub mod serenity_platform;
