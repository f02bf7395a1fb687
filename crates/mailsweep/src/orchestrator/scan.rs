use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::categorizer::{Category, ListStatus, SenderLists};
use crate::db::DatabaseError;
use crate::db::email_repo::{self, NewEmail};
use crate::db::history_repo::{self, OperationKind, OperationStatus};
use crate::db::link_repo;
use crate::db::list_repo::{self, PatternList};
use crate::email::{EmailError, ImapClient, MailSource, ParsedEmail};
use crate::error::{MailsweepError, Result};
use crate::extract;

use super::progress::{Progress, ProgressReporter, Stage};
use super::report::{EmailSummary, ScanReport};
use super::Orchestrator;

/// Failure of one message, with the stored email it concerns when known.
struct ItemError {
    email_id: Option<i64>,
    source: MailsweepError,
}

impl From<EmailError> for ItemError {
    fn from(err: EmailError) -> Self {
        Self {
            email_id: None,
            source: err.into(),
        }
    }
}

impl From<DatabaseError> for ItemError {
    fn from(err: DatabaseError) -> Self {
        Self {
            email_id: None,
            source: err.into(),
        }
    }
}

impl Orchestrator {
    /// Scans the configured IMAP mailbox.
    ///
    /// Missing credentials are reported as a configuration error before
    /// anything is stored.
    pub async fn scan_mailbox(&self, progress: &dyn ProgressReporter) -> Result<ScanReport> {
        self.config.validate()?;
        let mut client = ImapClient::from_config(&self.config)?;
        self.scan(&mut client, self.config.scan_limit(), progress).await
    }

    /// Scans `source`, handling at most `limit` of the most recent
    /// matching messages.
    pub async fn scan<S: MailSource>(
        &self,
        source: &mut S,
        limit: Option<usize>,
        progress: &dyn ProgressReporter,
    ) -> Result<ScanReport> {
        let span = info_span!("scan", mailbox = %self.config.imap.mailbox, limit = ?limit);
        self.run_scan(source, limit, progress).instrument(span).await
    }

    async fn run_scan<S: MailSource>(
        &self,
        source: &mut S,
        limit: Option<usize>,
        progress: &dyn ProgressReporter,
    ) -> Result<ScanReport> {
        let mut report = ScanReport::default();

        if let Err(e) = source.connect().await {
            error!("Failed to connect to mailbox: {}", e);
            self.log_operation(
                OperationKind::Scan,
                None,
                OperationStatus::Failed,
                &format!("Failed to connect to mailbox: {}", e),
            );
            return Ok(report);
        }
        report.connected = true;

        let result = self.scan_connected(source, limit, progress, &mut report).await;

        if let Err(e) = source.disconnect().await {
            warn!("Failed to disconnect from mailbox: {}", e);
        }
        result?;

        info!(
            scanned = report.total_scanned,
            with_links = report.emails_with_links,
            links = report.total_links_found,
            errors = report.errors,
            "Scan finished"
        );
        Ok(report)
    }

    async fn scan_connected<S: MailSource>(
        &self,
        source: &mut S,
        limit: Option<usize>,
        progress: &dyn ProgressReporter,
        report: &mut ScanReport,
    ) -> Result<()> {
        let lists = SenderLists::new(
            list_repo::patterns(&self.db, PatternList::Whitelist)?,
            list_repo::patterns(&self.db, PatternList::Blacklist)?,
        );

        let ids = match source.search(&self.config.imap.search_criteria, limit).await {
            Ok(ids) => ids,
            Err(e) => {
                error!("Mailbox search failed: {}", e);
                report.errors += 1;
                self.log_operation(
                    OperationKind::Scan,
                    None,
                    OperationStatus::Error,
                    &format!("Mailbox search failed: {}", e),
                );
                return Ok(());
            }
        };

        let total = ids.len();
        info!("Found {} matching messages", total);

        for (index, id) in ids.into_iter().enumerate() {
            let message = match self.scan_one(source, id, &lists).await {
                Ok(summary) => {
                    report.total_scanned += 1;
                    match summary.list_status {
                        ListStatus::Whitelisted => report.skipped_whitelisted += 1,
                        ListStatus::Blacklisted => report.blacklisted += 1,
                        ListStatus::Unlisted => {}
                    }
                    if summary.links_found > 0 {
                        report.emails_with_links += 1;
                        report.total_links_found += summary.links_found;
                    }
                    let message = format!("{} ({} links)", summary.sender, summary.links_found);
                    report.emails.push(summary);
                    message
                }
                Err(item) => {
                    report.errors += 1;
                    error!("Failed to process message {}: {}", id, item.source);
                    self.log_operation(
                        OperationKind::Scan,
                        item.email_id,
                        OperationStatus::Error,
                        &format!("Failed to process message {}: {}", id, item.source),
                    );
                    format!("message {} failed", id)
                }
            };

            progress.report(Progress {
                stage: Stage::Scan,
                current: index + 1,
                total,
                message,
            });
        }

        Ok(())
    }

    async fn scan_one<S: MailSource>(
        &self,
        source: &mut S,
        id: u32,
        lists: &SenderLists,
    ) -> std::result::Result<EmailSummary, ItemError> {
        let raw = source.fetch(id).await?;
        let parsed = ParsedEmail::parse(&raw)?;

        let list_status = lists.check(&parsed.sender);
        let category = self.categorizer.categorize(&parsed.sender, &parsed.subject);

        let email_id = email_repo::find_or_create(
            &self.db,
            &NewEmail {
                message_id: &parsed.message_id,
                sender: &parsed.sender,
                subject: &parsed.subject,
                received_date: parsed.received_date,
                category,
            },
        )?;

        self.record_email(email_id, &parsed, category, list_status)
            .map(|links_found| EmailSummary {
                email_id,
                sender: parsed.sender.clone(),
                subject: parsed.subject.clone(),
                links_found,
                category,
                list_status,
            })
            .map_err(|e| ItemError {
                email_id: Some(email_id),
                source: e,
            })
    }

    /// Stores the classification and links of a message and returns the
    /// number of links found in it.
    fn record_email(
        &self,
        email_id: i64,
        parsed: &ParsedEmail,
        category: Category,
        list_status: ListStatus,
    ) -> Result<usize> {
        email_repo::update_category(&self.db, email_id, category)?;

        if list_status == ListStatus::Whitelisted {
            debug!("Skipping links of whitelisted sender {}", parsed.sender);
            let has_links = link_repo::count_for_email(&self.db, email_id)? > 0;
            email_repo::mark_processed(&self.db, email_id, has_links)?;
            history_repo::log(
                &self.db,
                OperationKind::Scan,
                Some(email_id),
                OperationStatus::Success,
                &format!("Skipped whitelisted sender {}", parsed.sender),
            )?;
            return Ok(0);
        }

        let links = extract::merge_links(
            parsed.html_parts.as_slice(),
            parsed.list_unsubscribe.as_deref(),
        );
        for url in &links {
            link_repo::insert(&self.db, email_id, url)?;
        }

        let has_links = link_repo::count_for_email(&self.db, email_id)? > 0;
        email_repo::mark_processed(&self.db, email_id, has_links)?;

        let mut details = format!(
            "Found {} unsubscribe link(s) from {}",
            links.len(),
            parsed.sender
        );
        if list_status == ListStatus::Blacklisted {
            details.push_str(" (blacklisted sender)");
        }
        history_repo::log(
            &self.db,
            OperationKind::Scan,
            Some(email_id),
            OperationStatus::Success,
            &details,
        )?;

        debug!("{}", details);
        Ok(links.len())
    }
}
