use serde::Serialize;

use crate::categorizer::{Category, ListStatus};

/// Summary of one email handled by a scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailSummary {
    pub email_id: i64,
    pub sender: String,
    pub subject: String,
    pub links_found: usize,
    pub category: Category,
    pub list_status: ListStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanReport {
    /// False when the mailbox could not be reached; all counters are then zero.
    pub connected: bool,
    pub total_scanned: usize,
    pub emails_with_links: usize,
    pub total_links_found: usize,
    pub errors: usize,
    pub skipped_whitelisted: usize,
    pub blacklisted: usize,
    pub emails: Vec<EmailSummary>,
}

/// Outcome of one link in an unsubscribe run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnsubscribeDetail {
    pub link_id: i64,
    pub url: String,
    pub success: bool,
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnsubscribeReport {
    pub total_attempted: usize,
    pub successful: usize,
    pub failed: usize,
    pub details: Vec<UnsubscribeDetail>,
}
