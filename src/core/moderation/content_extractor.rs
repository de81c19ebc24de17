// Decides which part of a message gets scanned.
//
// Attachments win outright: embeds are only looked at when a message has no
// attachments at all, even if every attachment turns out clean.

use super::moderation_models::InspectedMessage;

/// Which collection of a message will be scanned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanPlan {
    /// Scan attachment URLs in upload order
    Attachments(Vec<String>),
    /// Scan embed URLs in order; embeds without a URL are skipped
    Embeds(Vec<String>),
    /// Nothing to scan
    NotApplicable,
}

impl ScanPlan {
    /// URLs to hand to the oracle, in scan order.
    pub fn urls(&self) -> &[String] {
        match self {
            ScanPlan::Attachments(urls) | ScanPlan::Embeds(urls) => urls,
            ScanPlan::NotApplicable => &[],
        }
    }
}

/// Build the scan plan for a message.
pub fn extract(message: &InspectedMessage) -> ScanPlan {
    if !message.attachments.is_empty() {
        return ScanPlan::Attachments(
            message.attachments.iter().map(|a| a.url.clone()).collect(),
        );
    }

    if !message.embeds.is_empty() {
        return ScanPlan::Embeds(
            message
                .embeds
                .iter()
                .filter_map(|e| e.url.clone())
                .collect(),
        );
    }

    ScanPlan::NotApplicable
}
